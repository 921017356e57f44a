//! Exactly-once listener attachment.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, trace};

use crate::document::{Document, WidgetId};
use crate::events::OutboundEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    #[default]
    Click,
    Input,
    Change,
}

/// What a listener asks the front-end to do. Listeners only describe
/// effects; the front-end carries them out after the listener returns.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    Emit(OutboundEvent),
    Navigate(String),
    ApplySettings,
    ToggleSwitch { widget: WidgetId, key: String },
}

pub type Handler = Box<dyn Fn(&Document, WidgetId) -> Vec<Reaction>>;

struct Binding {
    marker: String,
    handler: Handler,
}

/// Binding table keyed by `(widget, interaction kind)`.
///
/// Widgets are never reused, so a replaced widget starts with no bindings;
/// bindings of widgets that left the tree are dropped by [`Binder::prune`].
#[derive(Default)]
pub struct Binder {
    bindings: HashMap<(WidgetId, InteractionKind), Binding>,
}

impl Binder {
    /// Attach `handler` unless the widget is absent or already has a listener
    /// for `kind`. Returns whether the handler was attached.
    pub fn bind_once<F>(
        &mut self,
        widget: Option<WidgetId>,
        kind: InteractionKind,
        marker: impl Into<String>,
        handler: F,
    ) -> bool
    where
        F: Fn(&Document, WidgetId) -> Vec<Reaction> + 'static,
    {
        let Some(widget) = widget else {
            return false;
        };

        let marker = marker.into();
        if let Some(existing) = self.bindings.get(&(widget, kind)) {
            if existing.marker != marker {
                debug!(
                    %widget,
                    ?kind,
                    bound = %existing.marker,
                    skipped = %marker,
                    "widget already has a listener for this interaction"
                );
            }
            return false;
        }

        trace!(%widget, ?kind, %marker, "binding listener");
        self.bindings.insert(
            (widget, kind),
            Binding {
                marker,
                handler: Box::new(handler),
            },
        );
        true
    }

    pub fn is_bound(&self, widget: WidgetId, kind: InteractionKind) -> bool {
        self.bindings.contains_key(&(widget, kind))
    }

    pub fn marker(&self, widget: WidgetId, kind: InteractionKind) -> Option<&str> {
        self.bindings
            .get(&(widget, kind))
            .map(|binding| binding.marker.as_str())
    }

    /// Drop bindings whose widget is gone. Returns how many were dropped.
    pub fn prune(&mut self, doc: &Document) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|(widget, _), _| doc.contains(*widget));
        before - self.bindings.len()
    }

    /// Run the listeners for an interaction on `target`, bubbling from the
    /// target up through its ancestors.
    pub fn trigger(&self, doc: &Document, target: WidgetId, kind: InteractionKind) -> Vec<Reaction> {
        doc.ancestors_inclusive(target)
            .into_iter()
            .filter_map(|widget| {
                self.bindings
                    .get(&(widget, kind))
                    .map(|binding| (binding.handler)(doc, widget))
            })
            .flatten()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    const SHELL: &str = r#"<html>
  <button id="volume-mute"><span id="icon">volume_up</span></button>
  <section id="region"><button id="media-play">p</button></section>
</html>"#;

    fn toggle_mute(_: &Document, _: WidgetId) -> Vec<Reaction> {
        vec![Reaction::Emit(OutboundEvent::ToggleMute)]
    }

    #[test]
    fn second_bind_is_a_no_op() {
        let doc = Document::parse(SHELL).expect("parse");
        let mute = doc.element_by_id("volume-mute");
        let mut binder = Binder::default();

        assert!(binder.bind_once(mute, InteractionKind::Click, "mute", toggle_mute));
        assert!(!binder.bind_once(mute, InteractionKind::Click, "mute", toggle_mute));
        assert_eq!(binder.len(), 1);

        let target = mute.expect("mute present");
        let mut emitted = Vec::new();
        emitted.extend(binder.trigger(&doc, target, InteractionKind::Click));
        emitted.extend(binder.trigger(&doc, target, InteractionKind::Click));
        assert_eq!(emitted.len(), 2);
    }

    #[test]
    fn different_marker_does_not_add_a_second_listener() {
        let doc = Document::parse(SHELL).expect("parse");
        let mute = doc.element_by_id("volume-mute");
        let mut binder = Binder::default();

        binder.bind_once(mute, InteractionKind::Click, "mute", toggle_mute);
        let attached = binder.bind_once(mute, InteractionKind::Click, "system-action", toggle_mute);

        assert!(!attached);
        assert_eq!(
            binder.marker(mute.expect("mute"), InteractionKind::Click),
            Some("mute")
        );
    }

    #[test]
    fn absent_widget_is_ignored() {
        let mut binder = Binder::default();
        assert!(!binder.bind_once(None, InteractionKind::Click, "mute", toggle_mute));
        assert!(binder.is_empty());
    }

    #[test]
    fn kinds_are_bound_independently() {
        let doc = Document::parse(SHELL).expect("parse");
        let mute = doc.element_by_id("volume-mute");
        let mut binder = Binder::default();

        binder.bind_once(mute, InteractionKind::Click, "mute", toggle_mute);
        assert!(binder.bind_once(mute, InteractionKind::Input, "mute-input", toggle_mute));
    }

    #[test]
    fn clicks_bubble_from_children() {
        let doc = Document::parse(SHELL).expect("parse");
        let mut binder = Binder::default();
        binder.bind_once(doc.element_by_id("volume-mute"), InteractionKind::Click, "mute", toggle_mute);

        let icon = doc.element_by_id("icon").expect("icon");
        assert_eq!(
            binder.trigger(&doc, icon, InteractionKind::Click),
            vec![Reaction::Emit(OutboundEvent::ToggleMute)]
        );
        assert!(binder.trigger(&doc, icon, InteractionKind::Input).is_empty());
    }

    #[test]
    fn replaced_widgets_are_pruned_and_rebindable() {
        let mut doc = Document::parse(SHELL).expect("parse");
        let mut binder = Binder::default();
        let calls = Rc::new(Cell::new(0));

        let counter = calls.clone();
        binder.bind_once(doc.element_by_id("media-play"), InteractionKind::Click, "play", move |_, _| {
            counter.set(counter.get() + 1);
            Vec::new()
        });

        let region = doc.element_by_id("region").expect("region");
        doc.set_inner_markup(region, r#"<button id="media-play">p</button>"#)
            .expect("inject");
        assert_eq!(binder.prune(&doc), 1);

        let counter = calls.clone();
        let fresh = doc.element_by_id("media-play");
        assert!(binder.bind_once(fresh, InteractionKind::Click, "play", move |_, _| {
            counter.set(counter.get() + 1);
            Vec::new()
        }));

        binder.trigger(&doc, fresh.expect("fresh"), InteractionKind::Click);
        assert_eq!(calls.get(), 1);
    }
}
