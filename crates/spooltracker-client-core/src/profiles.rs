use std::cell::RefCell;

use crate::command::{
    CommandError, CommandRequest, CommandResponse, CommandTransport, DeleteProfileData,
    SaveProfileData,
};
use crate::draft::{Draft, DraftFields, ValidationError};
use crate::model::{Profile, ProfileCatalog};
use crate::panel::{PanelError, PanelState};
use crate::store::UpdateSource;
use crate::surface::{Notice, PanelSurface};

pub const PROFILE_SAVED: &str = "Profile saved successfully";
pub const PROFILE_DELETED: &str = "Profile deleted successfully";
const SAVE_FAILED: &str = "Failed to save profile";
const DELETE_FAILED: &str = "Failed to delete profile";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileLookupError {
    #[error("Profile not found: {name}")]
    NotFound { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined the confirmation prompt.
    Cancelled,
}

/// Save/delete commands and the selection-driven profile load.
pub struct ProfileManager<'a, T, S> {
    pub(crate) state: &'a RefCell<PanelState>,
    pub(crate) transport: &'a T,
    pub(crate) surface: &'a S,
}

impl<T, S> ProfileManager<'_, T, S>
where
    T: CommandTransport,
    S: PanelSurface,
{
    /// Saves the draft as a named profile. The catalog in the response replaces
    /// the local one; only the draft's profile name is cleared.
    pub async fn save_profile(&self) -> Result<(), PanelError> {
        let prepared = prepare_save(&self.state.borrow().draft);
        let data = match prepared {
            Ok(data) => data,
            Err(error) => return Err(reject_invalid(self.surface, error)),
        };
        let name = data.name.clone();

        let result = self
            .transport
            .send_command(&CommandRequest::SaveProfile(data))
            .await
            .and_then(CommandResponse::into_result)
            .and_then(require_profiles);

        match result {
            Ok(profiles) => {
                {
                    let mut state = self.state.borrow_mut();
                    state.store.replace_profiles(profiles, UpdateSource::Command);
                    state.draft.profile_name.clear();
                }
                tracing::info!(profile = %name, "profile saved");
                self.surface.notify(Notice::success(PROFILE_SAVED));
                Ok(())
            }
            Err(error) => Err(report_command_failure(
                self.surface,
                "save_profile",
                SAVE_FAILED,
                error,
            )),
        }
    }

    /// Deletes the selected profile after an interactive confirmation.
    pub async fn delete_profile(&self) -> Result<DeleteOutcome, PanelError> {
        let name = self
            .state
            .borrow()
            .draft
            .selected_profile_name()
            .to_string();
        if name.is_empty() {
            return Err(reject_invalid(self.surface, ValidationError::NoProfileSelected));
        }

        if !self.surface.confirm(&delete_prompt(&name)).await {
            tracing::debug!(profile = %name, "profile delete cancelled");
            return Ok(DeleteOutcome::Cancelled);
        }

        let result = self
            .transport
            .send_command(&CommandRequest::DeleteProfile(DeleteProfileData {
                name: name.clone(),
            }))
            .await
            .and_then(CommandResponse::into_result)
            .and_then(require_profiles);

        match result {
            Ok(profiles) => {
                {
                    let mut state = self.state.borrow_mut();
                    state.store.replace_profiles(profiles, UpdateSource::Command);
                    // Cleared directly: an empty selection must not trigger a load.
                    state.draft.set_selected_profile_name(String::new());
                }
                tracing::info!(profile = %name, "profile deleted");
                self.surface.notify(Notice::success(PROFILE_DELETED));
                Ok(DeleteOutcome::Deleted)
            }
            Err(error) => Err(report_command_failure(
                self.surface,
                "delete_profile",
                DELETE_FAILED,
                error,
            )),
        }
    }

    /// Copies the named profile into the draft. An empty name is a no-op.
    pub fn load_profile(&self, name: &str) -> Result<Option<Profile>, PanelError> {
        let loaded = {
            let mut state = self.state.borrow_mut();
            let PanelState { store, draft } = &mut *state;
            load_profile_into_draft(store.profiles(), name, &mut draft.fields)
        };

        match loaded {
            Ok(Some(profile)) => {
                tracing::debug!(profile = %profile.name, "profile loaded into draft");
                self.surface
                    .refresh_color_preview(&profile.attributes.color_hex);
                Ok(Some(profile))
            }
            Ok(None) => Ok(None),
            Err(error) => {
                tracing::warn!(%error, "profile lookup failed");
                self.surface.notify(Notice::error(error.to_string()));
                Err(PanelError::NotFound(error))
            }
        }
    }
}

/// Looks `name` up by exact match and copies its attributes into `fields`.
///
/// Only the editable attributes are reachable from here, so a load triggered by a
/// selection change can never write the selection back.
pub fn load_profile_into_draft(
    catalog: &ProfileCatalog,
    name: &str,
    fields: &mut DraftFields,
) -> Result<Option<Profile>, ProfileLookupError> {
    if name.is_empty() {
        return Ok(None);
    }
    let profile = catalog
        .get(name)
        .ok_or_else(|| ProfileLookupError::NotFound {
            name: name.to_string(),
        })?;
    fields.fill_from(&profile.attributes);
    Ok(Some(profile))
}

#[must_use]
pub fn delete_prompt(name: &str) -> String {
    format!("Are you sure you want to delete the profile '{name}'?")
}

fn prepare_save(draft: &Draft) -> Result<SaveProfileData, ValidationError> {
    let name = draft.profile_name_for_save()?;
    let capacity = draft
        .fields
        .capacity()
        .filter(|capacity| capacity.is_finite())
        .ok_or(ValidationError::InvalidCapacity)?;
    Ok(SaveProfileData {
        name,
        attributes: draft.fields.to_attributes(capacity),
    })
}

fn require_profiles(profiles: Option<ProfileCatalog>) -> Result<ProfileCatalog, CommandError> {
    profiles.ok_or_else(|| CommandError::Decode {
        message: "response is missing the profile catalog".to_string(),
    })
}

pub(crate) fn reject_invalid<S: PanelSurface>(surface: &S, error: ValidationError) -> PanelError {
    tracing::debug!(%error, "rejected invalid form input");
    surface.notify(Notice::error(error.to_string()));
    PanelError::Validation(error)
}

pub(crate) fn report_command_failure<S: PanelSurface>(
    surface: &S,
    command: &'static str,
    fallback: &str,
    error: CommandError,
) -> PanelError {
    tracing::warn!(command, %error, "command failed");
    surface.notify(Notice::error(error.user_message(fallback)));
    PanelError::Command { command, error }
}
