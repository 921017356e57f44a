//! Typed host events.
//!
//! Inbound payloads are decoded once, here, with per-field defaults; render
//! code never looks at raw JSON except for the open-ended settings map.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::coerce;
use crate::navigation::Screen;

/// Open-ended settings update, key by key.
pub type SettingsPatch = Map<String, Value>;

/// Decode a payload struct. Anything that is not an object yields defaults.
pub fn decode_payload<T: DeserializeOwned + Default>(payload: &Value) -> T {
    T::deserialize(payload).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct VolumeStatus {
    #[serde(deserialize_with = "coerce::loose_number")]
    pub level: Option<f64>,
    #[serde(deserialize_with = "coerce::loose_flag")]
    pub muted: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct BluetoothStatus {
    #[serde(deserialize_with = "coerce::loose_flag")]
    pub connected: bool,
    #[serde(deserialize_with = "coerce::loose_text")]
    pub device: Option<String>,
    #[serde(deserialize_with = "coerce::loose_number")]
    pub battery: Option<f64>,
}

/// Single-line status shared by the radio and OBD domains.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServiceStatus {
    #[serde(deserialize_with = "coerce::loose_text")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MediaStatus {
    #[serde(deserialize_with = "coerce::loose_text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "coerce::loose_text")]
    pub artist: Option<String>,
    #[serde(deserialize_with = "coerce::loose_text")]
    pub album: Option<String>,
    #[serde(deserialize_with = "coerce::loose_text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "coerce::loose_number")]
    pub position: Option<f64>,
    #[serde(deserialize_with = "coerce::loose_number")]
    pub duration: Option<f64>,
    #[serde(deserialize_with = "coerce::loose_text")]
    pub source: Option<String>,
    #[serde(deserialize_with = "coerce::loose_text")]
    pub art: Option<String>,
}

impl MediaStatus {
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("stopped")
    }

    pub fn is_playing(&self) -> bool {
        self.status.as_deref() == Some("playing")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub key: String,
    pub title: String,
    pub artist: Option<String>,
    /// Milliseconds when the host sends a number, raw text otherwise.
    pub duration: Option<TrackDuration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackDuration {
    Millis(f64),
    Text(String),
}

/// One library entry as the host sends it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackEntry {
    #[serde(deserialize_with = "coerce::loose_text")]
    id: Option<String>,
    #[serde(deserialize_with = "coerce::loose_text")]
    filename: Option<String>,
    #[serde(deserialize_with = "coerce::loose_text")]
    title: Option<String>,
    #[serde(deserialize_with = "coerce::loose_text")]
    artist: Option<String>,
    #[serde(deserialize_with = "loose_duration")]
    duration: Option<TrackDuration>,
}

impl TrackEntry {
    /// Keyed by id, then filename, then list position.
    fn into_track(self, index: usize) -> Track {
        let key = self
            .id
            .or_else(|| self.filename.clone())
            .unwrap_or_else(|| index.to_string());
        let title = self
            .title
            .or(self.filename)
            .unwrap_or_else(|| key.clone());

        Track {
            key,
            title,
            artist: self.artist,
            duration: self.duration,
        }
    }
}

fn loose_duration<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<TrackDuration>, D::Error> {
    let duration = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64().map(TrackDuration::Millis),
        other => coerce::text(Some(&other)).map(TrackDuration::Text),
    };
    Ok(duration)
}

fn loose_tracks<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Track>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let items = value.as_array().map(Vec::as_slice).unwrap_or_default();

    Ok(items
        .iter()
        .enumerate()
        .map(|(index, item)| decode_payload::<TrackEntry>(item).into_track(index))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Library {
    #[serde(deserialize_with = "loose_tracks")]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScreenEntry {
    #[serde(deserialize_with = "coerce::loose_text")]
    id: Option<String>,
    #[serde(deserialize_with = "coerce::loose_text")]
    title: Option<String>,
}

/// Entries without an id are skipped; the title defaults to the id.
fn loose_screens<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<Screen>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let items = value.as_array().map(Vec::as_slice).unwrap_or_default();

    Ok(Some(
        items
            .iter()
            .filter_map(|item| {
                let entry = decode_payload::<ScreenEntry>(item);
                let id = entry.id?;
                let title = entry.title.unwrap_or_else(|| id.clone());
                Some(Screen::new(id, title))
            })
            .collect(),
    ))
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct InitPayload {
    /// `None` when the host did not send a screen list at all.
    #[serde(deserialize_with = "loose_screens")]
    pub screens: Option<Vec<Screen>>,
    #[serde(deserialize_with = "coerce::loose_text")]
    pub active: Option<String>,
    #[serde(deserialize_with = "coerce::loose_text")]
    pub theme: Option<String>,
    #[serde(deserialize_with = "coerce::loose_section")]
    pub volume: Option<VolumeStatus>,
    #[serde(deserialize_with = "coerce::loose_section")]
    pub bluetooth: Option<BluetoothStatus>,
    #[serde(deserialize_with = "coerce::loose_section")]
    pub radio: Option<ServiceStatus>,
    #[serde(deserialize_with = "coerce::loose_section")]
    pub obd: Option<ServiceStatus>,
    #[serde(deserialize_with = "coerce::loose_section")]
    pub media: Option<MediaStatus>,
    #[serde(deserialize_with = "coerce::loose_section")]
    pub settings: Option<SettingsPatch>,
}

pub fn settings_patch(payload: &Value) -> SettingsPatch {
    payload.as_object().cloned().unwrap_or_default()
}

/// Everything the host can push, one variant per event name.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Init(InitPayload),
    Navigation { screen: Option<String> },
    Clock { value: Option<String> },
    Volume(VolumeStatus),
    Bluetooth(BluetoothStatus),
    Radio(ServiceStatus),
    Obd(ServiceStatus),
    Media(MediaStatus),
    Settings(SettingsPatch),
    LibraryUpdate(Library),
}

impl InboundEvent {
    /// Decode a named host event. Unknown names yield `None`.
    pub fn decode(name: &str, payload: &Value) -> Option<Self> {
        let event = match name {
            "init" => InboundEvent::Init(decode_payload(payload)),
            "navigation" => InboundEvent::Navigation {
                screen: coerce::text(payload.get("screen")),
            },
            "clock" => InboundEvent::Clock {
                value: coerce::text(payload.get("value")),
            },
            "volume" => InboundEvent::Volume(decode_payload(payload)),
            "bluetooth_status" => InboundEvent::Bluetooth(decode_payload(payload)),
            "radio_status" => InboundEvent::Radio(decode_payload(payload)),
            "obd_status" => InboundEvent::Obd(decode_payload(payload)),
            "media" => InboundEvent::Media(decode_payload(payload)),
            "settings" => InboundEvent::Settings(settings_patch(payload)),
            "library_update" => InboundEvent::LibraryUpdate(decode_payload(payload)),
            _ => return None,
        };

        Some(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaAction {
    Previous,
    PlayPause,
    Next,
}

impl MediaAction {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaAction::Previous => "previous",
            MediaAction::PlayPause => "play_pause",
            MediaAction::Next => "next",
        }
    }
}

/// Values read back from the settings controls when the user applies them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SettingsForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_render_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_scale_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_resolution: Option<String>,
    pub show_cursor: bool,
    pub position_bottom_right: bool,
    pub developer_mode: bool,
    pub radio_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radio_type: Option<String>,
    pub last_fm_station: String,
    pub radio_i2c_address: String,
    pub obd_enabled: bool,
    pub obd_port: String,
    pub obd_baudrate: String,
}

/// Everything the front-end can tell the host.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    Navigate { screen: String },
    Ready,
    SetVolume { value: f64 },
    ToggleMute,
    MediaControl { action: MediaAction },
    OpenDialog { target: String },
    SystemAction { action: String },
    ApplySettings(SettingsForm),
    LibraryRequest,
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::Navigate { .. } => "navigate",
            OutboundEvent::Ready => "ready",
            OutboundEvent::SetVolume { .. } => "set_volume",
            OutboundEvent::ToggleMute => "toggle_mute",
            OutboundEvent::MediaControl { .. } => "media_control",
            OutboundEvent::OpenDialog { .. } => "open_dialog",
            OutboundEvent::SystemAction { .. } => "system_action",
            OutboundEvent::ApplySettings(_) => "apply_settings",
            OutboundEvent::LibraryRequest => "library_request",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            OutboundEvent::Navigate { screen } => json!({ "screen": screen }),
            OutboundEvent::Ready | OutboundEvent::ToggleMute | OutboundEvent::LibraryRequest => {
                json!({})
            }
            OutboundEvent::SetVolume { value } => json!({ "value": coerce::number_value(*value) }),
            OutboundEvent::MediaControl { action } => json!({ "action": action.as_str() }),
            OutboundEvent::OpenDialog { target } => json!({ "target": target }),
            OutboundEvent::SystemAction { action } => json!({ "action": action }),
            OutboundEvent::ApplySettings(form) => {
                serde_json::to_value(form).unwrap_or_else(|_| json!({}))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_names_are_not_decoded() {
        assert_eq!(InboundEvent::decode("weather", &json!({})), None);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let event = InboundEvent::decode("media", &json!({})).expect("media decodes");
        let InboundEvent::Media(media) = event else {
            panic!("expected media, got {event:?}");
        };

        assert_eq!(media, MediaStatus::default());
        assert_eq!(media.status_label(), "stopped");
        assert!(!media.is_playing());
    }

    #[test]
    fn non_numeric_volume_level_is_dropped() {
        let volume: VolumeStatus = decode_payload(&json!({ "level": "loud", "muted": 1 }));
        assert_eq!(volume.level, None);
        assert!(volume.muted);
    }

    #[test]
    fn init_keeps_absent_and_empty_screen_lists_apart() {
        let without: InitPayload = decode_payload(&json!({ "active": "home" }));
        assert_eq!(without.screens, None);
        assert_eq!(without.active.as_deref(), Some("home"));

        let with: InitPayload = decode_payload(&json!({
            "screens": [{ "id": "home", "title": "Home" }, { "title": "no id" }, { "id": "obd" }],
            "volume": null,
            "media": { "status": "playing" }
        }));
        assert_eq!(
            with.screens,
            Some(vec![Screen::new("home", "Home"), Screen::new("obd", "obd")])
        );
        assert_eq!(with.volume, None);
        assert!(with.media.is_some_and(|media| media.is_playing()));
    }

    #[test]
    fn library_tracks_fall_back_to_filename() {
        let library: Library = decode_payload(&json!({
            "tracks": [
                { "filename": "road.mp3", "duration": "" },
                { "id": "t2", "title": "Night Drive", "artist": "Synth", "duration": 65000 }
            ]
        }));

        assert_eq!(library.tracks[0].key, "road.mp3");
        assert_eq!(library.tracks[0].title, "road.mp3");
        assert_eq!(library.tracks[0].duration, None);
        assert_eq!(library.tracks[1].duration, Some(TrackDuration::Millis(65000.0)));
    }

    #[test]
    fn wrongly_shaped_payloads_fall_back_to_defaults() {
        let volume: VolumeStatus = decode_payload(&json!("loud"));
        assert_eq!(volume, VolumeStatus::default());

        let bluetooth: BluetoothStatus = decode_payload(&json!({
            "connected": "yes",
            "device": 7,
            "battery": "80",
            "extra": true
        }));
        assert!(bluetooth.connected);
        assert_eq!(bluetooth.device.as_deref(), Some("7"));
        assert_eq!(bluetooth.battery, None);

        let init: InitPayload = decode_payload(&json!({
            "screens": "home",
            "radio": "on",
            "settings": 0
        }));
        assert_eq!(init.screens, Some(Vec::new()));
        assert_eq!(init.radio, Some(ServiceStatus::default()));
        assert_eq!(init.settings, None);

        let library: Library = decode_payload(&json!({ "tracks": [null, { "id": "a" }] }));
        assert_eq!(library.tracks[0].key, "0");
        assert_eq!(library.tracks[1].title, "a");
    }

    #[test]
    fn outbound_payloads_use_wire_names() {
        let event = OutboundEvent::MediaControl {
            action: MediaAction::PlayPause,
        };
        assert_eq!(event.name(), "media_control");
        assert_eq!(event.payload(), json!({ "action": "play_pause" }));

        let volume = OutboundEvent::SetVolume { value: 42.0 };
        assert_eq!(volume.payload(), json!({ "value": 42 }));
    }

    #[test]
    fn settings_form_omits_missing_selects() {
        let form = SettingsForm {
            theme: Some("dark".to_string()),
            radio_enabled: true,
            obd_port: "/dev/ttyUSB0".to_string(),
            ..SettingsForm::default()
        };
        let payload = OutboundEvent::ApplySettings(form).payload();

        assert_eq!(payload["theme"], "dark");
        assert_eq!(payload["radio_enabled"], true);
        assert_eq!(payload["obd_port"], "/dev/ttyUSB0");
        assert!(payload.get("ui_render_mode").is_none());
        assert_eq!(payload["last_fm_station"], "");
    }
}
