//! Writer configuration, populated from environment variables.

use ldview::{ApplicationMode, RdfXmlSerializer, RedactionPolicy};
use thiserror::Error;

/// A configuration variable held a value that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{var}: {message}")]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

/// Runtime configuration for an [`HtmlWriter`](crate::HtmlWriter).
///
/// All fields have defaults, so a writer can be built with zero
/// configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `LDVIEW_MODE` | `admin` | `admin` or `end-user` |
/// | `LDVIEW_REDACTION` | `standard` | `standard` or `disabled` |
/// | `LDVIEW_ALLOW_BAD_IRIS` | `true` | Serialize malformed IRIs instead of failing |
/// | `LDVIEW_TITLE` | `Linked Data` | Page title for the built-in stylesheet |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    pub mode: ApplicationMode,
    pub redaction: RedactionPolicy,
    pub allow_bad_iris: bool,
    pub title: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            mode: ApplicationMode::Admin,
            redaction: RedactionPolicy::Standard,
            allow_bad_iris: true,
            title: "Linked Data".into(),
        }
    }
}

impl WriterConfig {
    /// Populate config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Populate config from `lookup`, applying defaults where it returns
    /// `None`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mode = match lookup("LDVIEW_MODE") {
            Some(v) => v.parse().map_err(|message| ConfigError {
                var: "LDVIEW_MODE",
                message,
            })?,
            None => defaults.mode,
        };

        let redaction = match lookup("LDVIEW_REDACTION") {
            Some(v) => v.parse().map_err(|message| ConfigError {
                var: "LDVIEW_REDACTION",
                message,
            })?,
            None => defaults.redaction,
        };

        let allow_bad_iris = match lookup("LDVIEW_ALLOW_BAD_IRIS") {
            Some(v) => parse_flag(&v).ok_or_else(|| ConfigError {
                var: "LDVIEW_ALLOW_BAD_IRIS",
                message: format!("expected true or false, got {v:?}"),
            })?,
            None => defaults.allow_bad_iris,
        };

        let title = lookup("LDVIEW_TITLE")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(defaults.title);

        Ok(Self {
            mode,
            redaction,
            allow_bad_iris,
            title,
        })
    }

    pub fn serializer(&self) -> RdfXmlSerializer {
        if self.allow_bad_iris {
            RdfXmlSerializer::permissive()
        } else {
            RdfXmlSerializer::strict()
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// --- tests -------------------------------------------------------------------
