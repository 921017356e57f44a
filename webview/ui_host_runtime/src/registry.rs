//! Logical widget names and their resolution against the current tree.

use std::collections::{BTreeMap, HashMap};

use crate::document::{Document, WidgetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaPanel {
    Home,
    Music,
}

impl MediaPanel {
    pub const ALL: [MediaPanel; 2] = [MediaPanel::Home, MediaPanel::Music];

    fn prefix(self) -> &'static str {
        match self {
            MediaPanel::Home => "home",
            MediaPanel::Music => "music",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MediaField {
    Art,
    Title,
    Artist,
    Album,
    Progress,
    Status,
    Source,
}

impl MediaField {
    pub const ALL: [MediaField; 7] = [
        MediaField::Art,
        MediaField::Title,
        MediaField::Artist,
        MediaField::Album,
        MediaField::Progress,
        MediaField::Status,
        MediaField::Source,
    ];

    fn suffix(self) -> &'static str {
        match self {
            MediaField::Art => "art",
            MediaField::Title => "title",
            MediaField::Artist => "artist",
            MediaField::Album => "album",
            MediaField::Progress => "progress",
            MediaField::Status => "status",
            MediaField::Source => "source",
        }
    }
}

/// Every widget the front-end addresses by a stable element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Widget {
    App,
    Nav,
    Main,
    HeaderTitle,
    Clock,
    SettingsClock,
    BluetoothPill,
    VolumeMute,
    VolumeSlider,
    MediaPrevious,
    MediaPlay,
    MediaNext,
    OpenBluetooth,
    OpenWifi,
    RestartApp,
    Reboot,
    Quit,
    ApplySettings,
    RadioStatus,
    ObdStatus,
    LibraryList,
    LibraryCount,
    Media(MediaPanel, MediaField),
}

impl Widget {
    const FIXED: [Widget; 22] = [
        Widget::App,
        Widget::Nav,
        Widget::Main,
        Widget::HeaderTitle,
        Widget::Clock,
        Widget::SettingsClock,
        Widget::BluetoothPill,
        Widget::VolumeMute,
        Widget::VolumeSlider,
        Widget::MediaPrevious,
        Widget::MediaPlay,
        Widget::MediaNext,
        Widget::OpenBluetooth,
        Widget::OpenWifi,
        Widget::RestartApp,
        Widget::Reboot,
        Widget::Quit,
        Widget::ApplySettings,
        Widget::RadioStatus,
        Widget::ObdStatus,
        Widget::LibraryList,
        Widget::LibraryCount,
    ];

    pub fn all() -> Vec<Widget> {
        let media = MediaPanel::ALL.into_iter().flat_map(|panel| {
            MediaField::ALL
                .into_iter()
                .map(move |field| Widget::Media(panel, field))
        });
        Self::FIXED.into_iter().chain(media).collect()
    }

    pub fn element_id(self) -> String {
        let fixed = match self {
            Widget::App => "app",
            Widget::Nav => "nav",
            Widget::Main => "main",
            Widget::HeaderTitle => "header-title",
            Widget::Clock => "clock",
            Widget::SettingsClock => "settings-clock",
            Widget::BluetoothPill => "bluetooth-pill",
            Widget::VolumeMute => "volume-mute",
            Widget::VolumeSlider => "volume-slider",
            Widget::MediaPrevious => "media-previous",
            Widget::MediaPlay => "media-play",
            Widget::MediaNext => "media-next",
            Widget::OpenBluetooth => "open-bluetooth",
            Widget::OpenWifi => "open-wifi",
            Widget::RestartApp => "restart-app",
            Widget::Reboot => "reboot-system",
            Widget::Quit => "quit-app",
            Widget::ApplySettings => "settings-apply",
            Widget::RadioStatus => "radio-status",
            Widget::ObdStatus => "obd-status",
            Widget::LibraryList => "library-list",
            Widget::LibraryCount => "library-count",
            Widget::Media(panel, field) => {
                return format!("{}-{}", panel.prefix(), field.suffix());
            }
        };
        fixed.to_string()
    }
}

/// Settings keys with a dedicated control, in form order.
pub const SETTINGS_KEYS: [&str; 14] = [
    "theme",
    "ui_render_mode",
    "ui_scale_mode",
    "window_resolution",
    "show_cursor",
    "position_bottom_right",
    "developer_mode",
    "radio_enabled",
    "radio_type",
    "last_fm_station",
    "radio_i2c_address",
    "obd_enabled",
    "obd_port",
    "obd_baudrate",
];

pub fn settings_element_id(key: &str) -> String {
    format!("settings-{key}")
}

/// A widget carrying a declarative `data-*` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTarget {
    pub widget: WidgetId,
    pub value: String,
    pub apply_settings: bool,
}

/// Mapping from logical names to the widgets currently in the tree.
///
/// Rebuilt wholesale by [`WidgetRegistry::resolve`]; never patched.
#[derive(Debug, Clone, Default)]
pub struct WidgetRegistry {
    widgets: HashMap<Widget, WidgetId>,
    settings: BTreeMap<String, WidgetId>,
    navigate: Vec<ActionTarget>,
    system_actions: Vec<ActionTarget>,
    dialogs: Vec<ActionTarget>,
}

impl WidgetRegistry {
    pub fn resolve(doc: &Document) -> Self {
        let widgets = Widget::all()
            .into_iter()
            .filter_map(|widget| {
                doc.element_by_id(&widget.element_id())
                    .map(|id| (widget, id))
            })
            .collect();

        let mut settings: BTreeMap<String, WidgetId> = SETTINGS_KEYS
            .iter()
            .filter_map(|key| {
                doc.element_by_id(&settings_element_id(key))
                    .map(|id| (key.to_string(), id))
            })
            .collect();
        if let Some(slider) = doc.element_by_id(&Widget::VolumeSlider.element_id()) {
            settings.insert("volume".to_string(), slider);
        }

        Self {
            widgets,
            settings,
            navigate: action_targets(doc, "data-navigate"),
            system_actions: action_targets(doc, "data-system-action"),
            dialogs: action_targets(doc, "data-open-dialog"),
        }
    }

    pub fn get(&self, widget: Widget) -> Option<WidgetId> {
        self.widgets.get(&widget).copied()
    }

    /// Control for a known settings key; `volume` maps to the volume slider.
    pub fn settings_control(&self, key: &str) -> Option<WidgetId> {
        self.settings.get(key).copied()
    }

    pub fn settings_controls(&self) -> impl Iterator<Item = (&str, WidgetId)> {
        self.settings.iter().map(|(key, id)| (key.as_str(), *id))
    }

    pub fn navigate_targets(&self) -> &[ActionTarget] {
        &self.navigate
    }

    pub fn system_action_targets(&self) -> &[ActionTarget] {
        &self.system_actions
    }

    pub fn dialog_targets(&self) -> &[ActionTarget] {
        &self.dialogs
    }

    pub fn resolved_count(&self) -> usize {
        self.widgets.len()
    }
}

fn action_targets(doc: &Document, attr: &str) -> Vec<ActionTarget> {
    doc.elements_with_attr(attr)
        .into_iter()
        .filter_map(|widget| {
            let value = doc.attr(widget, attr)?.trim();
            if value.is_empty() {
                return None;
            }
            Some(ActionTarget {
                widget,
                value: value.to_string(),
                apply_settings: doc.attr(widget, "data-apply-settings") == Some("true"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHELL: &str = r#"<html>
  <h1 id="header-title">Car</h1>
  <input id="volume-slider" type="range"/>
  <section id="screen-home" data-partial="home"/>
  <button data-system-action="reboot" data-apply-settings="true">Save and reboot</button>
  <button data-open-dialog="">Nothing</button>
</html>"#;

    #[test]
    fn absent_widgets_resolve_to_none() {
        let doc = Document::parse(SHELL).expect("parse");
        let registry = WidgetRegistry::resolve(&doc);

        assert!(registry.get(Widget::HeaderTitle).is_some());
        assert_eq!(registry.get(Widget::MediaPlay), None);
        assert_eq!(registry.settings_control("radio_enabled"), None);
        assert_eq!(
            registry.settings_control("volume"),
            registry.get(Widget::VolumeSlider)
        );
    }

    #[test]
    fn resolve_picks_up_injected_widgets() {
        let mut doc = Document::parse(SHELL).expect("parse");
        let before = WidgetRegistry::resolve(&doc);
        let region = doc.element_by_id("screen-home").expect("region");

        doc.set_inner_markup(
            region,
            r#"<h2 id="home-title">x</h2><button id="media-play">p</button>"#,
        )
        .expect("inject");
        let after = WidgetRegistry::resolve(&doc);

        assert_eq!(before.get(Widget::Media(MediaPanel::Home, MediaField::Title)), None);
        assert!(after.get(Widget::Media(MediaPanel::Home, MediaField::Title)).is_some());
        assert!(after.get(Widget::MediaPlay).is_some());
        assert!(after.resolved_count() > before.resolved_count());
    }

    #[test]
    fn declarative_actions_skip_empty_values() {
        let doc = Document::parse(SHELL).expect("parse");
        let registry = WidgetRegistry::resolve(&doc);

        assert_eq!(registry.system_action_targets().len(), 1);
        assert_eq!(registry.system_action_targets()[0].value, "reboot");
        assert!(registry.system_action_targets()[0].apply_settings);
        assert!(registry.dialog_targets().is_empty());
    }

    #[test]
    fn media_widgets_use_panel_prefixed_ids() {
        assert_eq!(
            Widget::Media(MediaPanel::Music, MediaField::Progress).element_id(),
            "music-progress"
        );
        assert_eq!(Widget::Reboot.element_id(), "reboot-system");
        assert_eq!(Widget::all().len(), 22 + 14);
    }
}
