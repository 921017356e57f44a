//! The front-end context: one object owning the tree and every piece of
//! state derived from it.

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::binder::{Binder, InteractionKind, Reaction};
use crate::bridge::{HostBridge, HostSink, ReadyGate};
use crate::coerce;
use crate::document::{Document, WidgetId};
use crate::events::{InboundEvent, InitPayload, MediaAction, OutboundEvent};
use crate::fragments::{self, FragmentReport, FragmentResult, FragmentSource, FragmentTask};
use crate::navigation::{NavigationOrigin, Navigator};
use crate::registry::{Widget, WidgetRegistry};
use crate::render::{self, PLACEHOLDER_ART, settings, status};
use crate::snapshot::{Snapshot, SnapshotCache};

/// Why the set of widgets in the tree may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopologyChange {
    Startup,
    FragmentsLoaded,
    ScreensReplaced,
}

pub struct FrontEnd {
    document: Document,
    registry: WidgetRegistry,
    binder: Binder,
    navigator: Navigator,
    snapshots: SnapshotCache,
    bridge: HostBridge,
    readiness: ReadyGate,
    default_art: String,
}

impl FrontEnd {
    pub fn new(document: Document) -> Self {
        let mut front_end = Self {
            document,
            registry: WidgetRegistry::default(),
            binder: Binder::default(),
            navigator: Navigator::default(),
            snapshots: SnapshotCache::default(),
            bridge: HostBridge::default(),
            readiness: ReadyGate::default(),
            default_art: PLACEHOLDER_ART.to_string(),
        };

        // No host is attached yet, so anything owed here would be dropped.
        let screens = Navigator::discover(&front_end.document);
        let _owed = front_end
            .navigator
            .replace_screens(screens, None, &mut front_end.document);
        front_end.topology_changed(TopologyChange::Startup);
        front_end
    }

    pub fn with_default_art(mut self, default_art: impl Into<String>) -> Self {
        self.default_art = default_art.into();
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn snapshots(&self) -> &SnapshotCache {
        &self.snapshots
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    pub fn is_ready(&self) -> bool {
        self.readiness.is_signalled()
    }

    /// The host channel is up. Emits `ready` if fragments already settled.
    pub fn attach_host(&mut self, sink: Box<dyn HostSink>) {
        self.bridge.attach(sink);
        if self.readiness.channel_established() {
            self.announce_ready();
        }
    }

    pub fn fragment_tasks(&self) -> Vec<FragmentTask> {
        fragments::pending_tasks(&self.document)
    }

    /// Inject a settled fragment batch. Emits `ready` if the host channel is
    /// already up.
    pub fn finish_fragments(&mut self, results: Vec<FragmentResult>) -> FragmentReport {
        let report = fragments::inject_all(&mut self.document, results);
        self.topology_changed(TopologyChange::FragmentsLoaded);

        if self.readiness.fragments_settled() {
            self.announce_ready();
        }
        report
    }

    pub async fn load_fragments(&mut self, source: &dyn FragmentSource) -> FragmentReport {
        let results = fragments::fetch_all(source, self.fragment_tasks()).await;
        self.finish_fragments(results)
    }

    /// Single inbound entry point. Unknown names are logged and ignored.
    pub fn dispatch(&mut self, name: &str, payload: Option<Value>) {
        let payload = payload.unwrap_or_else(|| json!({}));
        match InboundEvent::decode(name, &payload) {
            Some(event) => self.handle(event),
            None => info!(event = name, "ignoring unknown host event"),
        }
    }

    pub fn handle(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::Init(init) => self.handle_init(init),
            InboundEvent::Navigation { screen: Some(screen) } => {
                self.request_navigation(&screen, NavigationOrigin::Host);
            }
            InboundEvent::Navigation { screen: None } => debug!("navigation event without screen"),
            InboundEvent::Clock { value: Some(value) } => {
                status::render_clock(&mut self.document, &self.registry, &value);
            }
            InboundEvent::Clock { value: None } => debug!("clock event without value"),
            InboundEvent::Volume(volume) => self.apply_snapshot(Snapshot::Volume(volume)),
            InboundEvent::Bluetooth(bluetooth) => {
                self.apply_snapshot(Snapshot::Bluetooth(bluetooth));
            }
            InboundEvent::Radio(radio) => self.apply_snapshot(Snapshot::Radio(radio)),
            InboundEvent::Obd(obd) => self.apply_snapshot(Snapshot::Obd(obd)),
            InboundEvent::Media(media) => self.apply_snapshot(Snapshot::Media(media)),
            InboundEvent::Settings(patch) => self.apply_snapshot(Snapshot::Settings(patch)),
            InboundEvent::LibraryUpdate(library) => {
                self.apply_snapshot(Snapshot::Library(library));
            }
        }
    }

    /// A user interaction on the element with DOM id `target`. For `input`
    /// and `change` the control takes `value` first, as a browser would.
    ///
    /// Returns `false` when no such element exists.
    pub fn interact(&mut self, target: &str, kind: InteractionKind, value: Option<&str>) -> bool {
        let Some(widget) = self.document.element_by_id(target) else {
            warn!(target, ?kind, "interaction on unknown element");
            return false;
        };

        if let (InteractionKind::Input | InteractionKind::Change, Some(value)) = (kind, value) {
            self.document.set_value(widget, value);
        }

        let reactions = self.binder.trigger(&self.document, widget, kind);
        self.apply_reactions(reactions);
        true
    }

    /// User-originated navigation, as from a nav button.
    pub fn navigate(&mut self, screen: &str) {
        self.request_navigation(screen, NavigationOrigin::User);
    }

    pub fn reapply_snapshots(&mut self) {
        render::reapply(
            &mut self.document,
            &self.registry,
            &self.snapshots,
            &self.default_art,
        );
    }

    fn handle_init(&mut self, init: InitPayload) {
        match init.screens {
            Some(screens) => {
                let owed = self.navigator.replace_screens(
                    screens,
                    init.active.as_deref(),
                    &mut self.document,
                );
                self.topology_changed(TopologyChange::ScreensReplaced);
                for event in &owed {
                    self.bridge.send(event);
                }
            }
            None => {
                if let Some(active) = init.active.as_deref() {
                    self.request_navigation(active, NavigationOrigin::Host);
                }
            }
        }

        if let Some(theme) = init.theme.as_deref() {
            status::render_theme(&mut self.document, &self.registry, theme);
        }

        // Same order as a reapply, so the live streams win over settings.
        let sections = [
            init.settings.map(Snapshot::Settings),
            init.volume.map(Snapshot::Volume),
            init.bluetooth.map(Snapshot::Bluetooth),
            init.radio.map(Snapshot::Radio),
            init.obd.map(Snapshot::Obd),
            init.media.map(Snapshot::Media),
        ];
        for snapshot in sections.into_iter().flatten() {
            self.apply_snapshot(snapshot);
        }
    }

    fn request_navigation(&mut self, screen: &str, origin: NavigationOrigin) {
        let owed = self.navigator.request(screen, origin, &mut self.document);
        for event in &owed {
            self.bridge.send(event);
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.record(&snapshot);
        render::apply(
            &mut self.document,
            &self.registry,
            &snapshot,
            &self.default_art,
        );
    }

    fn announce_ready(&self) {
        info!("front-end ready");
        self.bridge.send(&OutboundEvent::Ready);
    }

    /// Re-resolve, re-bind, re-render. The only place the registry and the
    /// binding table change.
    fn topology_changed(&mut self, change: TopologyChange) {
        self.registry = WidgetRegistry::resolve(&self.document);
        let pruned = self.binder.prune(&self.document);
        self.bind_controls();
        self.reapply_snapshots();

        debug!(
            ?change,
            widgets = self.registry.resolved_count(),
            bindings = self.binder.len(),
            pruned,
            "content topology changed"
        );
    }

    fn bind_controls(&mut self) {
        let registry = &self.registry;
        let binder = &mut self.binder;
        let document = &self.document;

        binder.bind_once(
            registry.get(Widget::VolumeSlider),
            InteractionKind::Input,
            "volume",
            |doc, widget| {
                vec![Reaction::Emit(OutboundEvent::SetVolume {
                    value: coerce::parse_number(&doc.value(widget)),
                })]
            },
        );

        let clicks = [
            (Widget::VolumeMute, "mute", OutboundEvent::ToggleMute),
            (
                Widget::MediaPrevious,
                "media-previous",
                OutboundEvent::MediaControl {
                    action: MediaAction::Previous,
                },
            ),
            (
                Widget::MediaPlay,
                "media-play",
                OutboundEvent::MediaControl {
                    action: MediaAction::PlayPause,
                },
            ),
            (
                Widget::MediaNext,
                "media-next",
                OutboundEvent::MediaControl {
                    action: MediaAction::Next,
                },
            ),
            (
                Widget::OpenBluetooth,
                "open-bluetooth",
                OutboundEvent::OpenDialog {
                    target: "bluetooth".to_string(),
                },
            ),
            (
                Widget::OpenWifi,
                "open-wifi",
                OutboundEvent::OpenDialog {
                    target: "wifi".to_string(),
                },
            ),
            (
                Widget::RestartApp,
                "restart-app",
                OutboundEvent::SystemAction {
                    action: "restart_app".to_string(),
                },
            ),
            (
                Widget::Reboot,
                "reboot",
                OutboundEvent::SystemAction {
                    action: "reboot".to_string(),
                },
            ),
            (
                Widget::Quit,
                "quit",
                OutboundEvent::SystemAction {
                    action: "quit".to_string(),
                },
            ),
        ];
        for (widget, marker, event) in clicks {
            binder.bind_once(registry.get(widget), InteractionKind::Click, marker, move |_, _| {
                vec![Reaction::Emit(event.clone())]
            });
        }

        binder.bind_once(
            registry.get(Widget::ApplySettings),
            InteractionKind::Click,
            "apply-settings",
            |_, _| vec![Reaction::ApplySettings],
        );

        for target in registry.system_action_targets() {
            let action = target.value.clone();
            let apply_first = target.apply_settings;
            binder.bind_once(
                Some(target.widget),
                InteractionKind::Click,
                format!("system-action:{action}"),
                move |_, _| {
                    let mut reactions = Vec::with_capacity(2);
                    if apply_first {
                        reactions.push(Reaction::ApplySettings);
                    }
                    reactions.push(Reaction::Emit(OutboundEvent::SystemAction {
                        action: action.clone(),
                    }));
                    reactions
                },
            );
        }

        for target in registry.dialog_targets() {
            let dialog = target.value.clone();
            binder.bind_once(
                Some(target.widget),
                InteractionKind::Click,
                format!("open-dialog:{dialog}"),
                move |_, _| {
                    vec![Reaction::Emit(OutboundEvent::OpenDialog {
                        target: dialog.clone(),
                    })]
                },
            );
        }

        for target in registry.navigate_targets() {
            let screen = target.value.clone();
            binder.bind_once(
                Some(target.widget),
                InteractionKind::Click,
                format!("navigate:{screen}"),
                move |_, _| vec![Reaction::Navigate(screen.clone())],
            );
        }

        let switches: Vec<(String, WidgetId)> = registry
            .settings_controls()
            .filter(|(_, control)| document.attr(*control, "role") == Some("switch"))
            .map(|(key, control)| (key.to_string(), control))
            .collect();
        for (key, control) in switches {
            binder.bind_once(
                Some(control),
                InteractionKind::Click,
                format!("switch:{key}"),
                move |_, widget| {
                    vec![Reaction::ToggleSwitch {
                        widget,
                        key: key.clone(),
                    }]
                },
            );
        }
    }

    fn apply_reactions(&mut self, reactions: Vec<Reaction>) {
        for reaction in reactions {
            match reaction {
                Reaction::Emit(event) => self.bridge.send(&event),
                Reaction::Navigate(screen) => self.navigate(&screen),
                Reaction::ApplySettings => {
                    let form = settings::read_form(&self.document, &self.registry);
                    self.bridge.send(&OutboundEvent::ApplySettings(form));
                }
                Reaction::ToggleSwitch { widget, key } => {
                    settings::toggle_switch(&mut self.document, widget, &key);
                }
            }
        }
    }
}
