use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{ProfileCatalog, Snapshot, SpoolAttributes};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveProfileData {
    pub name: String,
    #[serde(flatten)]
    pub attributes: SpoolAttributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteProfileData {
    pub name: String,
}

/// Request envelope: `{"command": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", content = "data", rename_all = "snake_case")]
pub enum CommandRequest {
    SaveProfile(SaveProfileData),
    DeleteProfile(DeleteProfileData),
    LoadNewSpool(SpoolAttributes),
}

impl CommandRequest {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SaveProfile(_) => "save_profile",
            Self::DeleteProfile(_) => "delete_profile",
            Self::LoadNewSpool(_) => "load_new_spool",
        }
    }
}

/// Response envelope shared by all three commands.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CommandResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub profiles: Option<ProfileCatalog>,
}

impl CommandResponse {
    /// Splits an explicit `success: false` off into [`CommandError::Rejected`].
    pub fn into_result(self) -> Result<Option<ProfileCatalog>, CommandError> {
        if self.success {
            Ok(self.profiles)
        } else {
            Err(CommandError::Rejected {
                message: self.error,
            })
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Decodes an HTTP response body for `status`.
///
/// Non-2xx bodies carrying an `error` string become [`CommandError::Rejected`];
/// anything else off the 2xx range is a transport failure.
pub fn decode_response_body<T: DeserializeOwned>(status: u16, raw: &str) -> Result<T, CommandError> {
    if !(200..=299).contains(&status) {
        let parsed: ErrorBody = serde_json::from_str(raw).unwrap_or_default();
        return Err(match parsed.error {
            Some(message) => CommandError::Rejected {
                message: Some(message),
            },
            None => CommandError::Transport {
                message: format!("request failed with status {status}"),
            },
        });
    }

    serde_json::from_str(raw).map_err(|error| CommandError::Decode {
        message: format!("invalid response body: {error}"),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("{message}")]
    Transport { message: String },
    #[error("{}", .message.as_deref().unwrap_or("request rejected"))]
    Rejected { message: Option<String> },
    #[error("{message}")]
    Decode { message: String },
    #[error("request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

impl CommandError {
    /// Notification text: the server's own message when it sent one, otherwise
    /// `fallback`, with transport detail appended.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected {
                message: Some(message),
            } if !message.trim().is_empty() => message.clone(),
            Self::Rejected { .. } => fallback.to_string(),
            Self::Transport { .. } | Self::Decode { .. } | Self::Timeout { .. } => {
                format!("{fallback}: {self}")
            }
        }
    }
}

/// Boundary to the backend's plugin command endpoint.
///
/// Implementations report `success: false` bodies as `Ok` and leave the split to
/// [`CommandResponse::into_result`]; HTTP error statuses carrying an `error`
/// field map to [`CommandError::Rejected`].
#[async_trait(?Send)]
pub trait CommandTransport {
    async fn send_command(&self, request: &CommandRequest)
    -> Result<CommandResponse, CommandError>;

    async fn fetch_snapshot(&self) -> Result<Snapshot, CommandError>;
}
