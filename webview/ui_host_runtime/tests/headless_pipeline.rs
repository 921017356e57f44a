use std::path::PathBuf;

use infotainment_ui_runtime::bridge::RecordingSink;
use infotainment_ui_runtime::fragments::{DirectorySource, FragmentSource};
use infotainment_ui_runtime::registry::{MediaField, MediaPanel, Widget};
use infotainment_ui_runtime::serde_json::json;
use infotainment_ui_runtime::{Document, FrontEnd, InteractionKind};

fn assets() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../assets")
}

async fn boot(source: &DirectorySource) -> FrontEnd {
    let shell = source.fetch("index.xhtml").await.expect("shell readable");
    FrontEnd::new(Document::parse(&shell).expect("shell parses"))
}

fn text_of(front_end: &FrontEnd, id: &str) -> String {
    let doc = front_end.document();
    doc.element_by_id(id)
        .map(|widget| doc.text_content(widget))
        .unwrap_or_default()
}

#[tokio::test]
async fn shipped_assets_load_and_render_cached_state() {
    let source = DirectorySource::new(assets());
    let mut front_end = boot(&source).await;
    let sink = RecordingSink::default();
    front_end.attach_host(Box::new(sink.clone()));

    front_end.dispatch(
        "init",
        Some(json!({
            "active": "home",
            "media": { "title": "Night Drive", "status": "playing", "position": 65000, "duration": 200000 },
            "bluetooth": { "connected": true, "device": "Pixel 8", "battery": 80 }
        })),
    );
    assert!(sink.names().is_empty());

    let report = front_end.load_fragments(&source).await;

    assert!(report.failed.is_empty(), "failed: {:?}", report.failed);
    assert_eq!(report.injected.len(), 6);
    assert_eq!(sink.names(), vec!["ready"]);

    assert_eq!(text_of(&front_end, "media-play"), "⏸");
    assert_eq!(text_of(&front_end, "home-title"), "Night Drive");
    assert_eq!(text_of(&front_end, "music-progress"), "01:05 / 03:20");
    assert_eq!(text_of(&front_end, "bluetooth-pill"), "Pixel 8 • 80%");

    let art = front_end
        .registry()
        .get(Widget::Media(MediaPanel::Music, MediaField::Art))
        .expect("music art");
    assert_eq!(
        front_end.document().attr(art, "src"),
        Some("assets/media/album_placeholder.svg")
    );
}

#[tokio::test]
async fn library_round_trip_through_the_music_screen() {
    let source = DirectorySource::new(assets());
    let mut front_end = boot(&source).await;
    let sink = RecordingSink::default();
    front_end.load_fragments(&source).await;
    front_end.attach_host(Box::new(sink.clone()));
    sink.clear();

    let browse = front_end
        .registry()
        .navigate_targets()
        .iter()
        .find(|target| target.value == "library")
        .map(|target| target.widget)
        .expect("browse button");
    assert!(front_end.binder().is_bound(browse, InteractionKind::Click));

    assert!(front_end.interact("nav-library", InteractionKind::Click, None));
    assert_eq!(sink.names(), vec!["navigate", "library_request"]);
    assert_eq!(text_of(&front_end, "header-title"), "Library");

    front_end.dispatch(
        "library_update",
        Some(json!({
            "tracks": [
                { "id": "a", "title": "Night Drive", "artist": "Synth", "duration": 65000 },
                { "filename": "road.mp3", "duration": "4:10" }
            ]
        })),
    );

    assert_eq!(text_of(&front_end, "library-count"), "2 tracks");
    assert_eq!(
        text_of(&front_end, "library-list"),
        "Night Drive Synth 01:05 road.mp3 -- 4:10"
    );
}

#[tokio::test]
async fn settings_form_reflects_host_values_and_local_toggles() {
    let source = DirectorySource::new(assets());
    let mut front_end = boot(&source).await;
    front_end.load_fragments(&source).await;
    let sink = RecordingSink::default();
    front_end.attach_host(Box::new(sink.clone()));
    sink.clear();

    front_end.dispatch(
        "settings",
        Some(json!({ "theme": "light", "radio_enabled": true, "obd_port": "/dev/ttyACM0" })),
    );
    front_end.interact("settings-developer_mode", InteractionKind::Click, None);
    front_end.interact("settings-apply", InteractionKind::Click, None);

    let events = sink.events();
    assert_eq!(sink.names(), vec!["apply_settings"]);
    let form = &events[0].1;
    assert_eq!(form["theme"], "light");
    assert_eq!(form["radio_enabled"], true);
    assert_eq!(form["developer_mode"], true);
    assert_eq!(form["obd_enabled"], false);
    assert_eq!(form["obd_port"], "/dev/ttyACM0");
    assert_eq!(form["window_resolution"], "800x480");

    let label = front_end
        .document()
        .first_with_attr_value("data-toggle-label", "developer_mode")
        .expect("label");
    assert_eq!(front_end.document().text_content(label), "Enabled");
}

#[tokio::test]
async fn missing_fragments_become_placeholders_and_ready_still_fires() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::copy(assets().join("index.xhtml"), dir.path().join("index.xhtml")).expect("copy shell");
    std::fs::create_dir(dir.path().join("screens")).expect("mkdir");
    std::fs::copy(
        assets().join("screens/home.html"),
        dir.path().join("screens/home.html"),
    )
    .expect("copy home");

    let source = DirectorySource::new(dir.path());
    let mut front_end = boot(&source).await;
    let sink = RecordingSink::default();
    front_end.attach_host(Box::new(sink.clone()));

    let report = front_end.load_fragments(&source).await;

    assert_eq!(report.injected, vec!["home"]);
    assert_eq!(report.failed.len(), 5);
    assert_eq!(text_of(&front_end, "screen-obd"), "Unable to load obd.html");
    assert_eq!(sink.names(), vec!["ready"]);
}
