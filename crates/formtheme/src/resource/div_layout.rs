//! The built-in `form_div_layout` theme.
//!
//! Plain HTML with one `<div>` per row. It defines the generic `form_*`
//! blocks every view type falls back to, plus widgets for the common field
//! types. Themes usually extend it and override a handful of blocks.
//!
//! Blocks delegate to helper blocks through `form_block`, so overriding
//! `widget_attributes` changes the attributes of every input at once.

use std::sync::Arc;

use super::jinja::MiniJinjaResource;
use super::ResourceRef;
use crate::error::RenderError;

/// Name of the built-in theme.
pub const FORM_DIV_LAYOUT: &str = "form_div_layout";

const BLOCKS: &[(&str, &str)] = &[
    // Widgets
    (
        "form_widget",
        "{% if compound %}{{ form_block(form, 'form_widget_compound') }}\
         {% else %}{{ form_block(form, 'form_widget_simple') }}{% endif %}",
    ),
    (
        "form_widget_simple",
        "<input type=\"{{ type|default('text') }}\"{{ form_block(form, 'widget_attributes') }}\
         {% if value is defined and value is not none and value != '' %} value=\"{{ value }}\"{% endif %} />",
    ),
    (
        "form_widget_compound",
        "<div{{ form_block(form, 'widget_container_attributes') }}>\
         {% if form.parent is none %}{{ form_errors(form) }}{% endif %}\
         {{ form_block(form, 'form_rows') }}{{ form_rest(form) }}</div>",
    ),
    (
        "form_rows",
        "{% for child in form %}{% if not child.rendered %}{{ form_row(child) }}{% endif %}{% endfor %}",
    ),
    (
        "textarea_widget",
        "<textarea{{ form_block(form, 'widget_attributes') }}>{{ value }}</textarea>",
    ),
    (
        "checkbox_widget",
        "<input type=\"checkbox\"{{ form_block(form, 'widget_attributes') }}\
         {% if value is defined and value is not none %} value=\"{{ value }}\"{% endif %}\
         {% if checked %} checked=\"checked\"{% endif %} />",
    ),
    (
        "radio_widget",
        "<input type=\"radio\"{{ form_block(form, 'widget_attributes') }}\
         {% if value is defined and value is not none %} value=\"{{ value }}\"{% endif %}\
         {% if checked %} checked=\"checked\"{% endif %} />",
    ),
    (
        "choice_widget",
        "{% if expanded %}{{ form_block(form, 'choice_widget_expanded') }}\
         {% else %}{{ form_block(form, 'choice_widget_collapsed') }}{% endif %}",
    ),
    (
        "choice_widget_expanded",
        "<div{{ form_block(form, 'widget_container_attributes') }}>\
         {% for child in form %}{{ form_widget(child) }}{{ form_label(child) }}{% endfor %}</div>",
    ),
    (
        "choice_widget_collapsed",
        "<select{{ form_block(form, 'widget_attributes') }}{% if multiple %} multiple=\"multiple\"{% endif %}>\
         {% if placeholder is defined and placeholder is not none %}<option value=\"\"\
         {% if required and not value %} selected=\"selected\"{% endif %}>{{ placeholder }}</option>{% endif %}\
         {% for choice in choices %}<option value=\"{{ choice.value }}\"\
         {% if choice.value == value or (multiple and choice.value in value) %} selected=\"selected\"{% endif %}>\
         {{ choice.label }}</option>{% endfor %}</select>",
    ),
    (
        "email_widget",
        "{{ form_block(form, 'form_widget_simple', {'type': type|default('email')}) }}",
    ),
    (
        "password_widget",
        "{{ form_block(form, 'form_widget_simple', {'type': type|default('password'), 'value': none}) }}",
    ),
    (
        "hidden_widget",
        "{{ form_block(form, 'form_widget_simple', {'type': type|default('hidden')}) }}",
    ),
    (
        "integer_widget",
        "{{ form_block(form, 'form_widget_simple', {'type': type|default('number')}) }}",
    ),
    (
        "url_widget",
        "{{ form_block(form, 'form_widget_simple', {'type': type|default('url')}) }}",
    ),
    (
        "search_widget",
        "{{ form_block(form, 'form_widget_simple', {'type': type|default('search')}) }}",
    ),
    (
        "tel_widget",
        "{{ form_block(form, 'form_widget_simple', {'type': type|default('tel')}) }}",
    ),
    (
        "button_widget",
        "<button type=\"{{ type|default('button') }}\"{{ form_block(form, 'button_attributes') }}>\
         {% if label %}{{ label }}{% else %}{{ name|humanize }}{% endif %}</button>",
    ),
    (
        "submit_widget",
        "{{ form_block(form, 'button_widget', {'type': type|default('submit')}) }}",
    ),
    (
        "reset_widget",
        "{{ form_block(form, 'button_widget', {'type': type|default('reset')}) }}",
    ),
    // Labels
    (
        "form_label",
        "{% if label is not false %}<label{% if not compound %} for=\"{{ id }}\"{% endif %}\
         {{ label_attr|attrs }}>{% if label %}{{ label }}{% else %}{{ name|humanize }}{% endif %}</label>{% endif %}",
    ),
    ("button_label", ""),
    // Help and errors
    (
        "form_help",
        "{% if help %}<p id=\"{{ id }}_help\" class=\"help-text\">{{ help }}</p>{% endif %}",
    ),
    (
        "form_errors",
        "{% if errors %}<ul>{% for error in errors %}<li>{{ error }}</li>{% endfor %}</ul>{% endif %}",
    ),
    // Rows
    (
        "form_row",
        "<div{{ row_attr|attrs }}>{{ form_label(form) }}{{ form_errors(form) }}\
         {% if help %}{{ form_widget(form, {'attr': {'aria-describedby': id ~ '_help'}}) }}\
         {% else %}{{ form_widget(form) }}{% endif %}{{ form_help(form) }}</div>",
    ),
    (
        "button_row",
        "<div{{ row_attr|attrs }}>{{ form_widget(form) }}</div>",
    ),
    ("hidden_row", "{{ form_widget(form) }}"),
    ("repeated_row", "{{ form_block(form, 'form_rows') }}"),
    // Form tags
    (
        "form",
        "{{ form_start(form) }}{{ form_widget(form) }}{{ form_end(form) }}",
    ),
    (
        "form_start",
        "{% set method = (method|default('post'))|upper %}\
         <form name=\"{{ name }}\" method=\"{{ method|lower if method in ['GET', 'POST'] else 'post' }}\"\
         {% if action %} action=\"{{ action }}\"{% endif %}{{ attr|attrs }}\
         {% if multipart %} enctype=\"multipart/form-data\"{% endif %}>\
         {% if method not in ['GET', 'POST'] %}<input type=\"hidden\" name=\"_method\" value=\"{{ method }}\" />{% endif %}",
    ),
    ("form_end", "</form>"),
    // Attribute helpers
    (
        "widget_attributes",
        " id=\"{{ id }}\" name=\"{{ full_name }}\"{% if disabled %} disabled=\"disabled\"{% endif %}\
         {% if required %} required=\"required\"{% endif %}{{ attr|attrs }}",
    ),
    (
        "widget_container_attributes",
        "{% if id %} id=\"{{ id }}\"{% endif %}{{ attr|attrs }}",
    ),
    (
        "button_attributes",
        " id=\"{{ id }}\" name=\"{{ full_name }}\"{% if disabled %} disabled=\"disabled\"{% endif %}{{ attr|attrs }}",
    ),
];

/// Builds the built-in `form_div_layout` theme.
///
/// # Example
///
/// ```rust
/// use formtheme::{form_div_layout, TemplateResource};
///
/// let layout = form_div_layout().unwrap();
/// assert!(layout.defines_block("form_row"));
/// ```
pub fn form_div_layout() -> Result<ResourceRef, RenderError> {
    let resource = MiniJinjaResource::from_blocks(FORM_DIV_LAYOUT, BLOCKS.iter().copied())?;
    Ok(Arc::new(resource))
}
