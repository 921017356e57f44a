//! Settings controls: rendering host values into them and reading the form
//! back when the user applies it.

use serde_json::Value;
use tracing::debug;

use crate::coerce;
use crate::document::{Document, WidgetId};
use crate::events::{SettingsForm, SettingsPatch};
use crate::registry::{WidgetRegistry, settings_element_id};

const EMPTY_TEXT: &str = "—";

const ON_CLASS: &str = "bg-primary";
const OFF_CLASS: &str = "bg-surface-dark";
const KNOB_ON: &str = "translate-x-7";
const KNOB_OFF: &str = "translate-x-1";

/// Render only the keys present in `patch`.
pub fn render(doc: &mut Document, registry: &WidgetRegistry, patch: &SettingsPatch) {
    for (key, value) in patch {
        let control = registry
            .settings_control(key)
            .or_else(|| doc.element_by_id(&settings_element_id(key)));

        match control {
            Some(control) => apply_value(doc, control, key, value),
            None => debug!(%key, "no control for settings key"),
        }
    }
}

fn apply_value(doc: &mut Document, control: WidgetId, key: &str, value: &Value) {
    if doc.attr(control, "role") == Some("switch") {
        set_switch_state(doc, control, coerce::truthy(value), key);
        return;
    }

    let tag = doc.tag(control).unwrap_or_default().to_string();
    let is_range = doc.attr(control, "type") == Some("range");

    match tag.as_str() {
        "select" => {
            let raw = coerce::display(value);
            let options = doc.options(control);
            if options.is_empty() || options.contains(&raw) {
                doc.set_value(control, &raw);
            } else {
                debug!(%key, value = %raw, "value is not one of the select options");
            }
        }
        "input" if is_range => {
            doc.set_value(control, &coerce::format_number(coerce::to_number(value)));
        }
        "input" | "textarea" => {
            let text = if value.is_null() {
                String::new()
            } else {
                coerce::display(value)
            };
            doc.set_value(control, &text);
        }
        _ => {
            let text = match value {
                Value::Null => EMPTY_TEXT.to_string(),
                Value::String(s) if s.is_empty() => EMPTY_TEXT.to_string(),
                other => coerce::display(other),
            };
            doc.set_text(control, &text);
        }
    }
}

/// Label shown next to a switch for the given state.
pub fn toggle_message(key: &str, on: bool) -> &'static str {
    let (yes, no) = match key {
        "show_cursor" => ("Visible", "Hidden"),
        "developer_mode" | "radio_enabled" | "obd_enabled" => ("Enabled", "Disabled"),
        "position_bottom_right" => ("Bottom-right", "Top-left"),
        _ => ("On", "Off"),
    };
    if on { yes } else { no }
}

pub fn set_switch_state(doc: &mut Document, widget: WidgetId, on: bool, key: &str) {
    doc.set_attr(widget, "aria-checked", if on { "true" } else { "false" });
    doc.toggle_class(widget, ON_CLASS, on);
    doc.toggle_class(widget, OFF_CLASS, !on);

    if let Some(knob) = doc.first_descendant_with_attr(widget, "data-toggle-knob") {
        doc.toggle_class(knob, KNOB_ON, on);
        doc.toggle_class(knob, KNOB_OFF, !on);
    }

    if let Some(label) = doc.first_with_attr_value("data-toggle-label", key) {
        doc.set_text(label, toggle_message(key, on));
    }
}

pub fn is_switch_on(doc: &Document, widget: WidgetId) -> bool {
    doc.attr(widget, "aria-checked") == Some("true")
}

/// Flip a switch locally. The host only hears about it on apply.
pub fn toggle_switch(doc: &mut Document, widget: WidgetId, key: &str) {
    let on = !is_switch_on(doc, widget);
    set_switch_state(doc, widget, on, key);
}

pub fn read_form(doc: &Document, registry: &WidgetRegistry) -> SettingsForm {
    let select = |key: &str| registry.settings_control(key).map(|control| doc.value(control));
    let switch = |key: &str| {
        registry
            .settings_control(key)
            .is_some_and(|control| is_switch_on(doc, control))
    };
    let text = |key: &str| {
        registry
            .settings_control(key)
            .map(|control| doc.value(control).trim().to_string())
            .unwrap_or_default()
    };

    SettingsForm {
        theme: select("theme"),
        ui_render_mode: select("ui_render_mode"),
        ui_scale_mode: select("ui_scale_mode"),
        window_resolution: select("window_resolution"),
        show_cursor: switch("show_cursor"),
        position_bottom_right: switch("position_bottom_right"),
        developer_mode: switch("developer_mode"),
        radio_enabled: switch("radio_enabled"),
        radio_type: select("radio_type"),
        last_fm_station: text("last_fm_station"),
        radio_i2c_address: text("radio_i2c_address"),
        obd_enabled: switch("obd_enabled"),
        obd_port: text("obd_port"),
        obd_baudrate: text("obd_baudrate"),
    }
}
