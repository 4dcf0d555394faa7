//! Client-side view of the loaded spool and the profile catalog.
//!
//! Three writers feed the store without coordination: the startup snapshot, push
//! messages, and command responses. Every entry point runs to completion before
//! the next one starts, so the last applied write wins per field.

use serde::Serialize;

use crate::model::{ProfileCatalog, Snapshot, Spool, SpoolPatch, format_remaining};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpoolField {
    RemainingWeight,
    CapacityWeight,
    FilamentType,
    ColorHex,
    Manufacturer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Snapshot,
    Push,
    Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    SpoolFieldChanged(SpoolField),
    FormattedRemainingChanged(String),
    ProfilesReplaced { count: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent, &StateStore)>;

pub struct StateStore {
    spool: Spool,
    formatted_remaining: String,
    profiles: ProfileCatalog,
    revision: u64,
    last_source: Option<UpdateSource>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Default for StateStore {
    fn default() -> Self {
        let spool = Spool::default();
        let formatted_remaining = format_remaining(spool.remaining_weight_g);
        Self {
            spool,
            formatted_remaining,
            profiles: ProfileCatalog::default(),
            revision: 0,
            last_source: None,
            listeners: Vec::new(),
            next_subscription: 1,
        }
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("spool", &self.spool)
            .field("formatted_remaining", &self.formatted_remaining)
            .field("profiles", &self.profiles)
            .field("revision", &self.revision)
            .field("last_source", &self.last_source)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchOutcome {
    /// Fields the patch carried, whether or not their value changed.
    pub applied: Vec<SpoolField>,
    /// Fields whose value actually changed.
    pub changed: Vec<SpoolField>,
}

/// Serializable view handed to bindings and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshotView<'a> {
    pub spool: &'a Spool,
    pub formatted_remaining: &'a str,
    pub profiles: Vec<crate::model::Profile>,
    pub revision: u64,
    pub last_source: Option<UpdateSource>,
}

impl StateStore {
    #[must_use]
    pub fn spool(&self) -> &Spool {
        &self.spool
    }

    #[must_use]
    pub fn formatted_remaining(&self) -> &str {
        &self.formatted_remaining
    }

    #[must_use]
    pub fn profiles(&self) -> &ProfileCatalog {
        &self.profiles
    }

    /// Monotonic count of applied updates. Ordering metadata only; it never gates a write.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn last_source(&self) -> Option<UpdateSource> {
        self.last_source
    }

    #[must_use]
    pub fn view(&self) -> StoreSnapshotView<'_> {
        StoreSnapshotView {
            spool: &self.spool,
            formatted_remaining: &self.formatted_remaining,
            profiles: self.profiles.rows().collect(),
            revision: self.revision,
            last_source: self.last_source,
        }
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&StoreEvent, &StateStore) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.saturating_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        before != self.listeners.len()
    }

    /// Overwrites every spool field. Profiles are replaced only when the snapshot carries them.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> Vec<SpoolField> {
        let spool = snapshot.spool();
        let patch = SpoolPatch {
            remaining_weight_g: Some(spool.remaining_weight_g),
            capacity_weight_g: Some(spool.capacity_weight_g),
            filament_type: Some(spool.filament_type),
            color_hex: Some(spool.color_hex),
            manufacturer: Some(spool.manufacturer),
        };
        let outcome = self.write_fields(&patch, UpdateSource::Snapshot);
        if let Some(profiles) = snapshot.profiles.as_ref() {
            self.install_profiles(profiles.clone());
        }
        tracing::debug!(
            revision = self.revision,
            changed = outcome.changed.len(),
            "applied spool snapshot"
        );
        outcome.changed
    }

    /// Overwrites only the fields present in `patch`.
    pub fn apply_patch(&mut self, patch: &SpoolPatch, source: UpdateSource) -> PatchOutcome {
        let outcome = self.write_fields(patch, source);
        tracing::debug!(
            revision = self.revision,
            ?source,
            applied = outcome.applied.len(),
            changed = outcome.changed.len(),
            "applied spool patch"
        );
        outcome
    }

    /// Installs `profiles` verbatim, keeping its key order.
    pub fn replace_profiles(&mut self, profiles: ProfileCatalog, source: UpdateSource) {
        self.bump_revision(source);
        self.install_profiles(profiles);
    }

    fn install_profiles(&mut self, profiles: ProfileCatalog) {
        let count = profiles.len();
        self.profiles = profiles;
        self.emit(&StoreEvent::ProfilesReplaced { count });
    }

    fn write_fields(&mut self, patch: &SpoolPatch, source: UpdateSource) -> PatchOutcome {
        self.bump_revision(source);
        let mut outcome = PatchOutcome::default();

        if let Some(value) = patch.remaining_weight_g {
            outcome.applied.push(SpoolField::RemainingWeight);
            if !same_number(self.spool.remaining_weight_g, value) {
                self.spool.remaining_weight_g = value;
                outcome.changed.push(SpoolField::RemainingWeight);
            }
        }
        if let Some(value) = patch.capacity_weight_g {
            outcome.applied.push(SpoolField::CapacityWeight);
            if !same_number(self.spool.capacity_weight_g, value) {
                self.spool.capacity_weight_g = value;
                outcome.changed.push(SpoolField::CapacityWeight);
            }
        }
        if let Some(value) = patch.filament_type.as_ref() {
            outcome.applied.push(SpoolField::FilamentType);
            if self.spool.filament_type != *value {
                self.spool.filament_type.clone_from(value);
                outcome.changed.push(SpoolField::FilamentType);
            }
        }
        if let Some(value) = patch.color_hex.as_ref() {
            outcome.applied.push(SpoolField::ColorHex);
            if self.spool.color_hex != *value {
                self.spool.color_hex.clone_from(value);
                outcome.changed.push(SpoolField::ColorHex);
            }
        }
        if let Some(value) = patch.manufacturer.as_ref() {
            outcome.applied.push(SpoolField::Manufacturer);
            if self.spool.manufacturer != *value {
                self.spool.manufacturer.clone_from(value);
                outcome.changed.push(SpoolField::Manufacturer);
            }
        }

        // Derived value is settled before any listener runs.
        let formatted_changed = outcome.changed.contains(&SpoolField::RemainingWeight)
            && self.recompute_formatted_remaining();

        for field in &outcome.changed {
            self.emit(&StoreEvent::SpoolFieldChanged(*field));
        }
        if formatted_changed {
            let formatted = self.formatted_remaining.clone();
            self.emit(&StoreEvent::FormattedRemainingChanged(formatted));
        }
        outcome
    }

    fn recompute_formatted_remaining(&mut self) -> bool {
        let formatted = format_remaining(self.spool.remaining_weight_g);
        if formatted == self.formatted_remaining {
            return false;
        }
        self.formatted_remaining = formatted;
        true
    }

    fn bump_revision(&mut self, source: UpdateSource) {
        self.revision = self.revision.saturating_add(1);
        self.last_source = Some(source);
    }

    fn emit(&mut self, event: &StoreEvent) {
        if self.listeners.is_empty() {
            return;
        }
        let mut listeners = std::mem::take(&mut self.listeners);
        for (_, listener) in &mut listeners {
            listener(event, self);
        }
        self.listeners = listeners;
    }
}

// Bit equality so that NaN -> NaN is not reported as a change forever.
fn same_number(current: f64, incoming: f64) -> bool {
    current.to_bits() == incoming.to_bits()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::SpoolAttributes;

    fn seeded_store() -> StateStore {
        let mut store = StateStore::default();
        store.apply_patch(
            &SpoolPatch {
                remaining_weight_g: Some(100.0),
                capacity_weight_g: Some(1000.0),
                filament_type: Some("PLA".to_string()),
                color_hex: Some("#fff".to_string()),
                manufacturer: Some("A".to_string()),
            },
            UpdateSource::Snapshot,
        );
        store
    }

    fn record_events(store: &mut StateStore) -> Rc<RefCell<Vec<StoreEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        store.subscribe(move |event, _| sink.borrow_mut().push(event.clone()));
        events
    }

    #[test]
    fn patch_only_touches_present_fields() {
        let mut store = seeded_store();
        let before = store.spool().clone();

        let outcome = store.apply_patch(
            &SpoolPatch {
                remaining_weight_g: Some(80.0),
                ..SpoolPatch::default()
            },
            UpdateSource::Push,
        );

        assert_eq!(outcome.applied, vec![SpoolField::RemainingWeight]);
        assert_eq!(
            *store.spool(),
            Spool {
                remaining_weight_g: 80.0,
                ..before
            }
        );
    }

    #[test]
    fn empty_string_in_patch_still_overwrites() {
        let mut store = seeded_store();
        store.apply_patch(
            &SpoolPatch {
                manufacturer: Some(String::new()),
                ..SpoolPatch::default()
            },
            UpdateSource::Push,
        );
        assert_eq!(store.spool().manufacturer, "");
    }

    #[test]
    fn derived_remaining_recomputes_synchronously() {
        let mut store = seeded_store();
        let events = record_events(&mut store);

        store.apply_patch(
            &SpoolPatch {
                remaining_weight_g: Some(7.532),
                ..SpoolPatch::default()
            },
            UpdateSource::Push,
        );

        assert_eq!(store.formatted_remaining(), "7.5g");
        assert_eq!(
            *events.borrow(),
            vec![
                StoreEvent::SpoolFieldChanged(SpoolField::RemainingWeight),
                StoreEvent::FormattedRemainingChanged("7.5g".to_string()),
            ]
        );
    }

    #[test]
    fn derived_remaining_skips_event_when_rendering_is_unchanged() {
        let mut store = seeded_store();
        let events = record_events(&mut store);

        store.apply_patch(
            &SpoolPatch {
                remaining_weight_g: Some(100.04),
                ..SpoolPatch::default()
            },
            UpdateSource::Push,
        );

        assert_eq!(store.formatted_remaining(), "100.0g");
        assert_eq!(
            *events.borrow(),
            vec![StoreEvent::SpoolFieldChanged(SpoolField::RemainingWeight)]
        );
    }

    #[test]
    fn listeners_observe_the_updated_store() {
        let mut store = seeded_store();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        store.subscribe(move |event, store| {
            if matches!(event, StoreEvent::SpoolFieldChanged(SpoolField::ColorHex)) {
                *sink.borrow_mut() = Some(store.spool().color_hex.clone());
            }
        });

        store.apply_patch(
            &SpoolPatch {
                color_hex: Some("#ff8800".to_string()),
                ..SpoolPatch::default()
            },
            UpdateSource::Push,
        );

        assert_eq!(seen.borrow().as_deref(), Some("#ff8800"));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut store = seeded_store();
        let events = Rc::new(RefCell::new(0_usize));
        let sink = Rc::clone(&events);
        let id = store.subscribe(move |_, _| *sink.borrow_mut() += 1);

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.replace_profiles(ProfileCatalog::default(), UpdateSource::Command);
        assert_eq!(*events.borrow(), 0);
    }

    #[test]
    fn stale_snapshot_after_push_wins_because_it_applied_last() {
        let mut store = StateStore::default();
        store.apply_patch(
            &SpoolPatch {
                remaining_weight_g: Some(640.0),
                ..SpoolPatch::default()
            },
            UpdateSource::Push,
        );
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"remaining_g":700,"spool_capacity_g":1000,"filament_type":"PLA","manufacturer":"A"}"#,
        )
        .expect("decode snapshot");

        store.apply_snapshot(&snapshot);

        assert_eq!(store.spool().remaining_weight_g, 700.0);
        assert_eq!(store.last_source(), Some(UpdateSource::Snapshot));
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn snapshot_without_profiles_keeps_existing_catalog() {
        let mut store = StateStore::default();
        store.replace_profiles(
            ProfileCatalog::from_iter([("Keep".to_string(), SpoolAttributes::default())]),
            UpdateSource::Command,
        );
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"remaining_g":1,"spool_capacity_g":2}"#).expect("decode");

        store.apply_snapshot(&snapshot);

        assert_eq!(store.profiles().names(), vec!["Keep"]);
    }

    #[test]
    fn remaining_may_exceed_capacity() {
        let mut store = seeded_store();
        store.apply_patch(
            &SpoolPatch {
                remaining_weight_g: Some(1500.0),
                ..SpoolPatch::default()
            },
            UpdateSource::Push,
        );
        assert_eq!(store.spool().remaining_weight_g, 1500.0);
        assert_eq!(store.formatted_remaining(), "1500.0g");
    }
}
