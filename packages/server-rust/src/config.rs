use serde::Deserialize;

use crate::formatter::FormatterRef;
use crate::redact::DEFAULT_REDACTED_STRING;

/// Options for one request logger, injected at construction.
#[derive(Debug, Clone)]
pub struct RequestLogConfig {
    /// Include the (redacted) request body as `params`.
    pub log_parameters: bool,
    /// Which formatter renders the payload.
    pub formatter: FormatterRef,
    /// Dotted paths redacted from `params`.
    pub blacklist: Vec<String>,
    /// Replacement for redacted values.
    pub redacted_string: String,
    /// Methods the tower layer does not log.
    pub ignore_methods: Vec<String>,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            log_parameters: false,
            formatter: FormatterRef::default(),
            blacklist: Vec::new(),
            redacted_string: DEFAULT_REDACTED_STRING.to_string(),
            ignore_methods: Vec::new(),
        }
    }
}

impl RequestLogConfig {
    #[must_use]
    pub fn with_log_parameters(mut self, enabled: bool) -> Self {
        self.log_parameters = enabled;
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: FormatterRef) -> Self {
        self.formatter = formatter;
        self
    }

    #[must_use]
    pub fn with_blacklist<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_redacted_string(mut self, redacted: impl Into<String>) -> Self {
        self.redacted_string = redacted.into();
        self
    }

    #[must_use]
    pub fn with_ignore_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_methods = methods.into_iter().map(Into::into).collect();
        self
    }

    /// Whether calls to `method` are skipped by the tower layer.
    #[must_use]
    pub fn ignores(&self, method: &str) -> bool {
        self.ignore_methods.iter().any(|m| m == method)
    }
}

// ---------------------------------------------------------------------------
// RequestLogSettings
// ---------------------------------------------------------------------------

/// Serialized form of [`RequestLogConfig`], as read from a settings file.
///
/// Only symbolic formatter names can be expressed here; type and instance
/// references are set in code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestLogSettings {
    pub log_parameters: bool,
    pub formatter: String,
    pub blacklist: Vec<String>,
    pub redacted_string: String,
    pub ignore_methods: Vec<String>,
}

impl Default for RequestLogSettings {
    fn default() -> Self {
        Self {
            log_parameters: false,
            formatter: "plain".to_string(),
            blacklist: Vec::new(),
            redacted_string: DEFAULT_REDACTED_STRING.to_string(),
            ignore_methods: Vec::new(),
        }
    }
}

/// Errors from parsing [`RequestLogSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid request log settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl RequestLogSettings {
    /// Parse settings from a JSON document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed JSON, wrong types, or unknown keys.
    pub fn from_json_str(input: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(input)?)
    }

    #[must_use]
    pub fn into_config(self) -> RequestLogConfig {
        RequestLogConfig {
            log_parameters: self.log_parameters,
            formatter: FormatterRef::Named(self.formatter),
            blacklist: self.blacklist,
            redacted_string: self.redacted_string,
            ignore_methods: self.ignore_methods,
        }
    }
}

impl From<RequestLogSettings> for RequestLogConfig {
    fn from(settings: RequestLogSettings) -> Self {
        settings.into_config()
    }
}
