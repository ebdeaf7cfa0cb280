use std::sync::OnceLock;

use crate::error::CoreError;

/// Date formats accepted by date attributes when nothing else is configured.
///
/// RFC 3339 timestamps are always accepted in addition to these.
pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// Default tracing filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "attrisuite_core=info";

/// Output format of the tracing subscriber installed by
/// [`crate::telemetry::init_tracing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Engine configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// `chrono` format strings a date value may match.
    pub date_formats: Vec<String>,
    /// Fallback tracing filter directive.
    pub log_filter: String,
    pub log_format: LogFormat,
    /// Whether audit entries for sensitive attributes store redacted values.
    pub redact_audit_values: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_format: LogFormat::default(),
            redact_audit_values: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment (and a `.env` file, if
    /// present) with defaults.
    ///
    /// | Env Var                   | Default                          |
    /// |---------------------------|----------------------------------|
    /// | `ATTRISUITE_DATE_FORMATS` | [`DEFAULT_DATE_FORMATS`], comma separated |
    /// | `ATTRISUITE_LOG`          | `attrisuite_core=info`           |
    /// | `ATTRISUITE_LOG_FORMAT`   | `pretty` (or `json`)             |
    /// | `ATTRISUITE_REDACT_AUDIT` | `true`                           |
    pub fn from_env() -> Result<Self, CoreError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Used by [`from_env`](Self::from_env); tests pass a closure over a map
    /// instead of touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("ATTRISUITE_DATE_FORMATS") {
            config.date_formats = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(filter) = lookup("ATTRISUITE_LOG") {
            config.log_filter = filter;
        }

        if let Some(raw) = lookup("ATTRISUITE_LOG_FORMAT") {
            config.log_format = match raw.trim().to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(CoreError::Config(format!(
                        "ATTRISUITE_LOG_FORMAT must be pretty or json, got '{raw}'"
                    )))
                }
            };
        }

        if let Some(raw) = lookup("ATTRISUITE_REDACT_AUDIT") {
            config.redact_audit_values = parse_bool(&raw).ok_or_else(|| {
                CoreError::Config(format!(
                    "ATTRISUITE_REDACT_AUDIT must be true or false, got '{raw}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make every date invalid or leave
    /// logging without a filter.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.date_formats.is_empty() {
            return Err(CoreError::Config(
                "at least one date format is required".to_string(),
            ));
        }
        if self.date_formats.iter().any(|f| f.trim().is_empty()) {
            return Err(CoreError::Config("date formats must not be blank".to_string()));
        }
        if self.log_filter.trim().is_empty() {
            return Err(CoreError::Config("log filter must not be blank".to_string()));
        }
        Ok(())
    }
}

/// Shared default configuration for attributes validated outside a manager.
pub(crate) fn defaults() -> &'static EngineConfig {
    static DEFAULTS: OnceLock<EngineConfig> = OnceLock::new();
    DEFAULTS.get_or_init(EngineConfig::default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
