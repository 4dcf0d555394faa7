use serde::Serialize;
use spooltracker_client_core::EnforcerStats;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PanelDiagnostics {
    pub(super) phase: String,
    pub(super) detail: String,
    pub(super) config_source: String,
    pub(super) host_registered: bool,
    pub(super) snapshot_loaded: bool,
    pub(super) order: Option<EnforcerStats>,
    pub(super) store_revision: u64,
    pub(super) push_messages: u64,
    pub(super) push_malformed: u64,
    pub(super) command_total: u64,
    pub(super) command_failures: u64,
    pub(super) last_command: Option<String>,
    pub(super) last_command_latency_ms: Option<u64>,
    pub(super) last_error: Option<String>,
}

impl Default for PanelDiagnostics {
    fn default() -> Self {
        Self {
            phase: "idle".to_string(),
            detail: "spool tracker panel not started".to_string(),
            config_source: "default".to_string(),
            host_registered: false,
            snapshot_loaded: false,
            order: None,
            store_revision: 0,
            push_messages: 0,
            push_malformed: 0,
            command_total: 0,
            command_failures: 0,
            last_command: None,
            last_command_latency_ms: None,
            last_error: None,
        }
    }
}
