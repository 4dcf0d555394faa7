use serde::{Deserialize, Serialize};

pub const DEFAULT_PLUGIN_ID: &str = "spooltracker";
pub const DEFAULT_API_BASE_URL: &str = "/api/";
pub const DEFAULT_RETRY_PERIOD_MS: u32 = 300;
pub const DEFAULT_RETRY_MAX_TICKS: u32 = 34;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    #[error("retry period must be greater than zero")]
    ZeroRetryPeriod,
    #[error("unknown log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("invalid panel config: {message}")]
    Parse { message: String },
}

/// Host-supplied settings. Every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub plugin_id: String,
    pub api_base_url: String,
    pub anchor_id: String,
    pub subject_id: String,
    pub container_id: String,
    pub dialog_id: String,
    pub color_preview_id: String,
    pub retry_period_ms: u32,
    pub retry_max_ticks: u32,
    /// `0` disables the request timeout.
    pub request_timeout_ms: u32,
    pub log_level: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            plugin_id: DEFAULT_PLUGIN_ID.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            anchor_id: "state_wrapper".to_string(),
            subject_id: "sidebar_plugin_spooltracker_wrapper".to_string(),
            container_id: "sidebar".to_string(),
            dialog_id: "new_spool_dialog".to_string(),
            color_preview_id: "color_preview".to_string(),
            retry_period_ms: DEFAULT_RETRY_PERIOD_MS,
            retry_max_ticks: DEFAULT_RETRY_MAX_TICKS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            log_level: "info".to_string(),
        }
    }
}

impl PanelConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|error| ConfigError::Parse {
            message: error.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("plugin_id", &self.plugin_id),
            ("api_base_url", &self.api_base_url),
            ("anchor_id", &self.anchor_id),
            ("subject_id", &self.subject_id),
            ("container_id", &self.container_id),
            ("dialog_id", &self.dialog_id),
            ("color_preview_id", &self.color_preview_id),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyField { field });
            }
        }
        if self.retry_period_ms == 0 {
            return Err(ConfigError::ZeroRetryPeriod);
        }
        self.level()?;
        Ok(())
    }

    /// `<api_base_url>plugin/<plugin_id>` with exactly one slash at the join.
    #[must_use]
    pub fn command_endpoint(&self) -> String {
        format!(
            "{}/plugin/{}",
            self.api_base_url.trim().trim_end_matches('/'),
            self.plugin_id.trim()
        )
    }

    pub fn level(&self) -> Result<tracing::Level, ConfigError> {
        self.log_level
            .trim()
            .parse::<tracing::Level>()
            .map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })
    }

    #[must_use]
    pub fn request_timeout_ms(&self) -> Option<u32> {
        (self.request_timeout_ms > 0).then_some(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_stock_sidebar() {
        let config = PanelConfig::default();
        assert_eq!(config.command_endpoint(), "/api/plugin/spooltracker");
        assert_eq!(config.retry_period_ms * config.retry_max_ticks, 10_200);
        assert_eq!(config.level(), Ok(tracing::Level::INFO));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config = PanelConfig::from_json(
            r#"{"api_base_url":"https://printer.local/api","request_timeout_ms":0,"log_level":"debug"}"#,
        )
        .expect("valid config");

        assert_eq!(
            config.command_endpoint(),
            "https://printer.local/api/plugin/spooltracker"
        );
        assert_eq!(config.request_timeout_ms(), None);
        assert_eq!(config.anchor_id, "state_wrapper");
        assert_eq!(config.level(), Ok(tracing::Level::DEBUG));
    }

    #[test]
    fn validate_rejects_blank_ids_and_zero_period() {
        let error = PanelConfig::from_json(r#"{"subject_id":"  "}"#).expect_err("blank id");
        assert_eq!(error, ConfigError::EmptyField { field: "subject_id" });

        let error = PanelConfig::from_json(r#"{"retry_period_ms":0}"#).expect_err("zero period");
        assert_eq!(error, ConfigError::ZeroRetryPeriod);

        let error = PanelConfig::from_json(r#"{"log_level":"loud"}"#).expect_err("bad level");
        assert!(matches!(error, ConfigError::InvalidLogLevel { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let error = PanelConfig::from_json("[1,2]").expect_err("not an object");
        assert!(matches!(error, ConfigError::Parse { .. }));
    }
}
