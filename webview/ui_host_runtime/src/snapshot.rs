//! Last-known host state per status domain.

use std::collections::BTreeMap;

use crate::events::{
    BluetoothStatus, Library, MediaStatus, ServiceStatus, SettingsPatch, VolumeStatus,
};

/// Status domains, in the order snapshots are reapplied.
///
/// Settings go first: its `volume` key shares the slider with the live
/// volume stream, and the stream must have the last word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Domain {
    Settings,
    Volume,
    Bluetooth,
    Radio,
    Obd,
    Media,
    Library,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Volume(VolumeStatus),
    Bluetooth(BluetoothStatus),
    Radio(ServiceStatus),
    Obd(ServiceStatus),
    Media(MediaStatus),
    Settings(SettingsPatch),
    Library(Library),
}

impl Snapshot {
    pub fn domain(&self) -> Domain {
        match self {
            Snapshot::Volume(_) => Domain::Volume,
            Snapshot::Bluetooth(_) => Domain::Bluetooth,
            Snapshot::Radio(_) => Domain::Radio,
            Snapshot::Obd(_) => Domain::Obd,
            Snapshot::Media(_) => Domain::Media,
            Snapshot::Settings(_) => Domain::Settings,
            Snapshot::Library(_) => Domain::Library,
        }
    }
}

/// Copies of the last payload per domain.
///
/// `record` never keeps the caller's value: it stores its own copy, so later
/// changes to the caller's data cannot leak into the cache. Settings arrive
/// one changed field at a time and are merged rather than replaced.
#[derive(Debug, Clone, Default)]
pub struct SnapshotCache {
    entries: BTreeMap<Domain, Snapshot>,
}

impl SnapshotCache {
    pub fn record(&mut self, snapshot: &Snapshot) {
        if let Snapshot::Settings(patch) = snapshot {
            if let Some(Snapshot::Settings(stored)) = self.entries.get_mut(&Domain::Settings) {
                for (key, value) in patch {
                    stored.insert(key.clone(), value.clone());
                }
                return;
            }
        }

        self.entries.insert(snapshot.domain(), snapshot.clone());
    }

    pub fn get(&self, domain: Domain) -> Option<&Snapshot> {
        self.entries.get(&domain)
    }

    /// Stored snapshots in reapply order.
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.values()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
