//! The panel's view model: one store, one draft, and the collaborators that
//! feed them.
//!
//! State sits behind a `RefCell` and every operation takes `&self`, matching a
//! single-threaded host where callbacks run to completion one at a time. No
//! borrow is held across an `.await` or a surface call.

use std::cell::RefCell;

use serde::Serialize;
use serde_json::Value;

use crate::command::{CommandError, CommandTransport};
use crate::draft::{Draft, ValidationError};
use crate::form::FormController;
use crate::profiles::{ProfileLookupError, ProfileManager};
use crate::push::{PushOutcome, PushReconciler};
use crate::store::{StateStore, StoreEvent, StoreSnapshotView, SubscriptionId};
use crate::surface::PanelSurface;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] ProfileLookupError),
    #[error("{command} failed: {error}")]
    Command {
        command: &'static str,
        #[source]
        error: CommandError,
    },
}

#[derive(Debug, Default)]
pub struct PanelState {
    pub store: StateStore,
    pub draft: Draft,
}

#[derive(Debug, Serialize)]
pub struct PanelStateView<'a> {
    #[serde(flatten)]
    pub store: StoreSnapshotView<'a>,
    pub draft: &'a Draft,
}

pub struct Panel<T, S> {
    state: RefCell<PanelState>,
    transport: T,
    surface: S,
    push: PushReconciler,
}

impl<T, S> Panel<T, S>
where
    T: CommandTransport,
    S: PanelSurface,
{
    pub fn new(namespace: impl Into<String>, transport: T, surface: S) -> Self {
        Self {
            state: RefCell::new(PanelState::default()),
            transport,
            surface,
            push: PushReconciler::new(namespace),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// One-shot startup fetch. A failure leaves the defaults in place.
    pub async fn load_snapshot(&self) -> Result<(), CommandError> {
        match self.transport.fetch_snapshot().await {
            Ok(snapshot) => {
                let changed = self.state.borrow_mut().store.apply_snapshot(&snapshot);
                tracing::info!(
                    changed = changed.len(),
                    profiles = snapshot.profiles.as_ref().map_or(0, |profiles| profiles.len()),
                    "loaded initial spool snapshot"
                );
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "initial spool snapshot failed");
                Err(error)
            }
        }
    }

    pub fn handle_push(&self, plugin: &str, body: &Value) -> PushOutcome {
        let mut state = self.state.borrow_mut();
        self.push.handle_message(&mut state.store, plugin, body)
    }

    pub fn profiles(&self) -> ProfileManager<'_, T, S> {
        ProfileManager {
            state: &self.state,
            transport: &self.transport,
            surface: &self.surface,
        }
    }

    pub fn form(&self) -> FormController<'_, T, S> {
        FormController {
            state: &self.state,
            transport: &self.transport,
            surface: &self.surface,
        }
    }

    /// Listeners run while the store is mutably borrowed and must not call back
    /// into the panel.
    pub fn subscribe(
        &self,
        listener: impl FnMut(&StoreEvent, &StateStore) + 'static,
    ) -> SubscriptionId {
        self.state.borrow_mut().store.subscribe(listener)
    }

    pub fn with_state<R>(&self, read: impl FnOnce(&PanelState) -> R) -> R {
        read(&self.state.borrow())
    }

    pub fn state_json(&self) -> Result<String, serde_json::Error> {
        self.with_state(|state| {
            serde_json::to_string(&PanelStateView {
                store: state.store.view(),
                draft: &state.draft,
            })
        })
    }
}
