//! Outbound half of the host channel and the `ready` join.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{SyncSender, TrySendError};

use serde_json::{Value, json};
use tracing::{debug, trace, warn};

use crate::events::OutboundEvent;
use crate::protocol::{UiEnvelope, event_envelope};

/// Where outbound events go once the host channel exists.
pub trait HostSink {
    fn deliver(&self, name: &str, payload: Value);
}

/// Sink feeding the stdout writer thread. Never blocks: a full queue drops
/// the event and counts it.
pub struct ChannelSink {
    tx: SyncSender<UiEnvelope>,
    queue_capacity: usize,
    dropped: AtomicU64,
}

impl ChannelSink {
    pub fn new(tx: SyncSender<UiEnvelope>, queue_capacity: usize) -> Self {
        Self {
            tx,
            queue_capacity,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl HostSink for ChannelSink {
    fn deliver(&self, name: &str, payload: Value) {
        match self.tx.try_send(event_envelope(name, payload)) {
            Ok(()) => {}
            Err(TrySendError::Full(_envelope)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 || dropped.is_power_of_two() {
                    warn!(
                        cap = self.queue_capacity,
                        dropped, "ui outbound queue full; dropping events"
                    );
                }
            }
            Err(TrySendError::Disconnected(_envelope)) => {
                warn!(event = name, "host writer gone; event not delivered");
            }
        }
    }
}

/// In-memory sink that keeps every delivered event. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    log: Rc<RefCell<Vec<(String, Value)>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<(String, Value)> {
        self.log.borrow().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.log.borrow().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl HostSink for RecordingSink {
    fn deliver(&self, name: &str, payload: Value) {
        self.log.borrow_mut().push((name.to_string(), payload));
    }
}

#[derive(Default)]
pub struct HostBridge {
    sink: Option<Box<dyn HostSink>>,
}

impl HostBridge {
    pub fn attach(&mut self, sink: Box<dyn HostSink>) {
        self.sink = Some(sink);
    }

    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    /// Forward to the host. Without a channel the event is dropped; nothing
    /// is queued for later.
    pub fn emit(&self, name: &str, payload: Option<Value>) {
        let Some(sink) = &self.sink else {
            debug!(event = name, "no host channel; dropping event");
            return;
        };

        trace!(event = name, "emit");
        sink.deliver(name, payload.unwrap_or_else(|| json!({})));
    }

    pub fn send(&self, event: &OutboundEvent) {
        self.emit(event.name(), Some(event.payload()));
    }
}

/// Join of "host channel established" and "fragment batch settled".
#[derive(Debug, Default)]
pub struct ReadyGate {
    channel: bool,
    fragments: bool,
    signalled: bool,
}

impl ReadyGate {
    /// Returns `true` exactly once: on the call that completes the join.
    pub fn channel_established(&mut self) -> bool {
        self.channel = true;
        self.fire()
    }

    pub fn fragments_settled(&mut self) -> bool {
        self.fragments = true;
        self.fire()
    }

    pub fn is_signalled(&self) -> bool {
        self.signalled
    }

    fn fire(&mut self) -> bool {
        if self.signalled || !(self.channel && self.fragments) {
            return false;
        }
        self.signalled = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn detached_bridge_drops_silently() {
        let bridge = HostBridge::default();
        bridge.emit("navigate", Some(json!({ "screen": "home" })));
        assert!(!bridge.is_attached());
    }

    #[test]
    fn missing_payload_becomes_empty_object() {
        let sink = RecordingSink::default();
        let mut bridge = HostBridge::default();
        bridge.attach(Box::new(sink.clone()));

        bridge.emit("toggle_mute", None);
        bridge.send(&OutboundEvent::Navigate {
            screen: "music".to_string(),
        });

        assert_eq!(
            sink.events(),
            vec![
                ("toggle_mute".to_string(), json!({})),
                ("navigate".to_string(), json!({ "screen": "music" })),
            ]
        );
    }

    #[test]
    fn channel_sink_drops_when_queue_is_full() {
        let (tx, rx) = mpsc::sync_channel(1);
        let sink = ChannelSink::new(tx, 1);

        sink.deliver("ready", json!({}));
        sink.deliver("toggle_mute", json!({}));

        assert_eq!(sink.dropped(), 1);
        match rx.try_recv().expect("first envelope queued") {
            UiEnvelope::Event { name, .. } => assert_eq!(name, "ready"),
        }
    }

    #[test]
    fn ready_gate_fires_once_in_either_order() {
        let mut gate = ReadyGate::default();
        assert!(!gate.fragments_settled());
        assert!(gate.channel_established());
        assert!(!gate.channel_established());
        assert!(!gate.fragments_settled());

        let mut gate = ReadyGate::default();
        assert!(!gate.channel_established());
        assert!(gate.fragments_settled());
        assert!(gate.is_signalled());
    }
}
