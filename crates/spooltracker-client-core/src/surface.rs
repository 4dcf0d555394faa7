use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A toast for the host's notification surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: &'static str,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            title: "Success",
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            title: "Error",
            text: text.into(),
        }
    }
}

/// The UI collaborators the panel drives but does not own.
#[async_trait(?Send)]
pub trait PanelSurface {
    fn notify(&self, notice: Notice);

    /// Interactive yes/no prompt. `false` cancels the pending operation.
    async fn confirm(&self, prompt: &str) -> bool;

    fn show_entry_dialog(&self);

    fn hide_entry_dialog(&self);

    fn refresh_color_preview(&self, color_hex: &str);
}
