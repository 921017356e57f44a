use crate::coerce;
use crate::document::{Document, WidgetId};
use crate::events::{BluetoothStatus, Library, ServiceStatus, TrackDuration, VolumeStatus};
use crate::registry::{Widget, WidgetRegistry};

use super::{format_time, status_line};

pub fn render_volume(doc: &mut Document, registry: &WidgetRegistry, volume: &VolumeStatus) {
    if let (Some(slider), Some(level)) = (registry.get(Widget::VolumeSlider), volume.level) {
        doc.set_value(slider, &coerce::format_number(level));
    }

    if let Some(mute) = registry.get(Widget::VolumeMute) {
        let icon = if volume.muted { "volume_off" } else { "volume_up" };
        doc.clear_children(mute);
        doc.append_element(mute, "span", &[("class", "material-symbols-outlined")], icon);
        doc.set_attr(mute, "data-muted", if volume.muted { "true" } else { "false" });
    }
}

pub fn render_bluetooth(doc: &mut Document, registry: &WidgetRegistry, bluetooth: &BluetoothStatus) {
    let Some(pill) = registry.get(Widget::BluetoothPill) else {
        return;
    };

    doc.toggle_class(pill, "pill--online", bluetooth.connected);
    doc.toggle_class(pill, "pill--offline", !bluetooth.connected);
    doc.set_text(pill, &bluetooth_label(bluetooth));
}

pub fn bluetooth_label(bluetooth: &BluetoothStatus) -> String {
    if !bluetooth.connected {
        return "Bluetooth offline".to_string();
    }

    let device = bluetooth.device.as_deref().unwrap_or("Connected");
    match bluetooth.battery {
        Some(battery) => format!("{device} • {}%", coerce::format_number(battery)),
        None => device.to_string(),
    }
}

pub fn render_service(doc: &mut Document, target: Option<WidgetId>, service: &ServiceStatus) {
    if let Some(target) = target {
        doc.set_text(target, &status_line(service.status.as_deref()));
    }
}

pub fn render_clock(doc: &mut Document, registry: &WidgetRegistry, value: &str) {
    for widget in [Widget::Clock, Widget::SettingsClock] {
        if let Some(clock) = registry.get(widget) {
            doc.set_text(clock, value);
        }
    }
}

pub fn render_theme(doc: &mut Document, registry: &WidgetRegistry, theme: &str) {
    if let Some(app) = registry.get(Widget::App) {
        doc.set_attr(app, "data-theme", theme);
    }
}

pub fn render_library(doc: &mut Document, registry: &WidgetRegistry, library: &Library) {
    if let Some(count) = registry.get(Widget::LibraryCount) {
        let label = match library.tracks.len() {
            1 => "1 track".to_string(),
            n => format!("{n} tracks"),
        };
        doc.set_text(count, &label);
    }

    let Some(list) = registry.get(Widget::LibraryList) else {
        return;
    };

    doc.clear_children(list);
    if library.tracks.is_empty() {
        doc.append_element(list, "li", &[("class", "library-empty")], "No tracks found");
        return;
    }

    for track in &library.tracks {
        let Some(row) = doc.append_element(
            list,
            "li",
            &[("class", "library-track"), ("data-track-id", track.key.as_str())],
            "",
        ) else {
            continue;
        };

        let duration = match &track.duration {
            Some(TrackDuration::Millis(ms)) => format_time(Some(*ms)),
            Some(TrackDuration::Text(text)) => text.clone(),
            None => "--".to_string(),
        };

        doc.append_element(row, "span", &[("class", "track-title")], &track.title);
        doc.append_element(
            row,
            "span",
            &[("class", "track-artist")],
            track.artist.as_deref().unwrap_or("--"),
        );
        doc.append_element(row, "span", &[("class", "track-duration")], &duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Track;

    const SHELL: &str = r#"<html>
  <div id="app" data-theme="dark">
    <span id="clock"/>
    <span id="bluetooth-pill" class="pill pill--offline">Bluetooth offline</span>
    <button id="volume-mute"/>
    <input id="volume-slider" type="range" value="10"/>
    <p id="radio-status"/>
    <span id="library-count"/>
    <ul id="library-list"/>
  </div>
</html>"#;

    fn setup() -> (Document, WidgetRegistry) {
        let doc = Document::parse(SHELL).expect("parse");
        let registry = WidgetRegistry::resolve(&doc);
        (doc, registry)
    }

    fn text_of(doc: &Document, id: &str) -> String {
        doc.element_by_id(id)
            .map(|widget| doc.text_content(widget))
            .unwrap_or_default()
    }

    #[test]
    fn volume_sets_slider_and_mute_icon() {
        let (mut doc, registry) = setup();

        render_volume(
            &mut doc,
            &registry,
            &VolumeStatus {
                level: Some(65.0),
                muted: true,
            },
        );

        let slider = registry.get(Widget::VolumeSlider).expect("slider");
        assert_eq!(doc.value(slider), "65");
        assert_eq!(text_of(&doc, "volume-mute"), "volume_off");
        let mute = registry.get(Widget::VolumeMute).expect("mute");
        assert_eq!(doc.attr(mute, "data-muted"), Some("true"));
    }

    #[test]
    fn non_numeric_level_leaves_slider_alone() {
        let (mut doc, registry) = setup();

        render_volume(&mut doc, &registry, &VolumeStatus::default());

        let slider = registry.get(Widget::VolumeSlider).expect("slider");
        assert_eq!(doc.value(slider), "10");
        assert_eq!(text_of(&doc, "volume-mute"), "volume_up");
    }

    #[test]
    fn bluetooth_label_includes_battery_when_connected() {
        let (mut doc, registry) = setup();
        let status = BluetoothStatus {
            connected: true,
            device: Some("Pixel 8".to_string()),
            battery: Some(80.0),
        };

        render_bluetooth(&mut doc, &registry, &status);

        let pill = registry.get(Widget::BluetoothPill).expect("pill");
        assert!(doc.has_class(pill, "pill--online"));
        assert!(!doc.has_class(pill, "pill--offline"));
        assert_eq!(doc.text_content(pill), "Pixel 8 • 80%");
    }

    #[test]
    fn bluetooth_label_defaults() {
        let connected = BluetoothStatus {
            connected: true,
            ..BluetoothStatus::default()
        };
        assert_eq!(bluetooth_label(&connected), "Connected");
        assert_eq!(bluetooth_label(&BluetoothStatus::default()), "Bluetooth offline");
    }

    #[test]
    fn service_status_uses_dash_fallback() {
        let (mut doc, registry) = setup();

        render_service(&mut doc, registry.get(Widget::RadioStatus), &ServiceStatus::default());

        assert_eq!(text_of(&doc, "radio-status"), "Status: --");
    }

    #[test]
    fn library_lists_tracks_and_count() {
        let (mut doc, registry) = setup();
        let library = Library {
            tracks: vec![Track {
                key: "t1".to_string(),
                title: "Night Drive".to_string(),
                artist: None,
                duration: Some(TrackDuration::Millis(65_000.0)),
            }],
        };

        render_library(&mut doc, &registry, &library);

        assert_eq!(text_of(&doc, "library-count"), "1 track");
        assert_eq!(text_of(&doc, "library-list"), "Night Drive -- 01:05");

        render_library(&mut doc, &registry, &Library::default());
        assert_eq!(text_of(&doc, "library-list"), "No tracks found");
        assert_eq!(text_of(&doc, "library-count"), "0 tracks");
    }

    #[test]
    fn clock_and_theme_write_through_registry() {
        let (mut doc, registry) = setup();

        render_clock(&mut doc, &registry, "12:30");
        render_theme(&mut doc, &registry, "light");

        assert_eq!(text_of(&doc, "clock"), "12:30");
        let app = registry.get(Widget::App).expect("app");
        assert_eq!(doc.attr(app, "data-theme"), Some("light"));
    }
}
