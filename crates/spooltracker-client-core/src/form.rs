use std::cell::RefCell;

use crate::command::{CommandRequest, CommandResponse, CommandTransport};
use crate::draft::{DraftEdit, DraftReaction};
use crate::panel::{PanelError, PanelState};
use crate::profiles::{ProfileManager, reject_invalid, report_command_failure};
use crate::surface::{Notice, PanelSurface};

pub const SPOOL_LOADED: &str = "New spool loaded successfully";
const LOAD_FAILED: &str = "Failed to load new spool";

/// Drives the "new spool" dialog and the draft behind it.
pub struct FormController<'a, T, S> {
    pub(crate) state: &'a RefCell<PanelState>,
    pub(crate) transport: &'a T,
    pub(crate) surface: &'a S,
}

impl<T, S> FormController<'_, T, S>
where
    T: CommandTransport,
    S: PanelSurface,
{
    /// Sends `load_new_spool` for the draft. The dialog closes only on success;
    /// the store is left for the backend's next push to update.
    pub async fn submit_new_spool(&self) -> Result<(), PanelError> {
        let prepared = {
            let state = self.state.borrow();
            state
                .draft
                .fields
                .positive_capacity()
                .map(|capacity| state.draft.fields.to_attributes(capacity))
        };
        let attributes = match prepared {
            Ok(attributes) => attributes,
            Err(error) => return Err(reject_invalid(self.surface, error)),
        };
        let capacity = attributes.capacity_weight_g;

        let result = self
            .transport
            .send_command(&CommandRequest::LoadNewSpool(attributes))
            .await
            .and_then(CommandResponse::into_result);

        match result {
            Ok(_) => {
                tracing::info!(capacity, "new spool loaded");
                self.surface.hide_entry_dialog();
                self.surface.notify(Notice::success(SPOOL_LOADED));
                Ok(())
            }
            Err(error) => Err(report_command_failure(
                self.surface,
                "load_new_spool",
                LOAD_FAILED,
                error,
            )),
        }
    }

    /// Restores every draft field to its default. Never called implicitly.
    pub fn reset_form(&self) {
        let color = {
            let mut state = self.state.borrow_mut();
            state.draft.reset();
            state.draft.fields.color_hex.clone()
        };
        self.surface.refresh_color_preview(&color);
    }

    /// Shows the entry dialog with whatever the draft currently holds.
    pub fn open_entry_dialog(&self) {
        let color = self.state.borrow().draft.fields.color_hex.clone();
        self.surface.refresh_color_preview(&color);
        self.surface.show_entry_dialog();
    }

    pub fn edit(&self, edit: DraftEdit) -> Result<(), PanelError> {
        let reaction = self.state.borrow_mut().draft.apply(edit);
        match reaction {
            Some(DraftReaction::RefreshColorPreview(color)) => {
                self.surface.refresh_color_preview(&color);
                Ok(())
            }
            Some(DraftReaction::LoadProfile(name)) => self.profiles().load_profile(&name).map(drop),
            None => Ok(()),
        }
    }

    pub fn select_profile(&self, name: impl Into<String>) -> Result<(), PanelError> {
        self.edit(DraftEdit::SelectedProfile(name.into()))
    }

    pub fn set_color(&self, color_hex: impl Into<String>) {
        let reaction = self
            .state
            .borrow_mut()
            .draft
            .apply(DraftEdit::Color(color_hex.into()));
        if let Some(DraftReaction::RefreshColorPreview(color)) = reaction {
            self.surface.refresh_color_preview(&color);
        }
    }

    fn profiles(&self) -> ProfileManager<'_, T, S> {
        ProfileManager {
            state: self.state,
            transport: self.transport,
            surface: self.surface,
        }
    }
}
