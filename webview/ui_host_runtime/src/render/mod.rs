//! Snapshot → tree rendering.
//!
//! Render functions only touch the tree. They run against whatever subset of
//! widgets the registry currently resolves, so they are safe to call before
//! any fragment has loaded.

pub mod media;
pub mod settings;
pub mod status;

use crate::document::Document;
use crate::registry::{Widget, WidgetRegistry};
use crate::snapshot::{Snapshot, SnapshotCache};

pub const PLACEHOLDER_ART: &str = "assets/media/album_placeholder.svg";

/// Render one snapshot. For settings, only the keys in the snapshot are
/// touched.
pub fn apply(doc: &mut Document, registry: &WidgetRegistry, snapshot: &Snapshot, default_art: &str) {
    match snapshot {
        Snapshot::Volume(volume) => status::render_volume(doc, registry, volume),
        Snapshot::Bluetooth(bluetooth) => status::render_bluetooth(doc, registry, bluetooth),
        Snapshot::Radio(radio) => status::render_service(doc, registry.get(Widget::RadioStatus), radio),
        Snapshot::Obd(obd) => status::render_service(doc, registry.get(Widget::ObdStatus), obd),
        Snapshot::Media(media) => media::render(doc, registry, media, default_art),
        Snapshot::Settings(patch) => settings::render(doc, registry, patch),
        Snapshot::Library(library) => status::render_library(doc, registry, library),
    }
}

/// Render every cached snapshot, in domain order.
pub fn reapply(doc: &mut Document, registry: &WidgetRegistry, cache: &SnapshotCache, default_art: &str) {
    for snapshot in cache.iter() {
        apply(doc, registry, snapshot, default_art);
    }
}

/// `mm:ss` from milliseconds. Minutes do not roll over into hours.
pub fn format_time(ms: Option<f64>) -> String {
    let Some(ms) = ms.filter(|ms| ms.is_finite() && *ms > 0.0) else {
        return "00:00".to_string();
    };

    let total_seconds = (ms / 1000.0).floor() as u64;
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

pub fn format_source(source: Option<&str>) -> String {
    let Some(source) = source.filter(|s| !s.is_empty()) else {
        return "No source".to_string();
    };

    let mut chars = source.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "No source".to_string(),
    }
}

pub fn status_line(value: Option<&str>) -> String {
    format!("Status: {}", value.filter(|v| !v.is_empty()).unwrap_or("--"))
}
