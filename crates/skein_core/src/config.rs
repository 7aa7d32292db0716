//! Workspace configuration.
//!
//! [`SkeinConfig`] is the deserialized form of a host's configuration file.
//! It carries the component root directory used to derive resource paths
//! and the tracing settings.
//!
//! ```
//! use skein_core::SkeinConfig;
//!
//! let config = SkeinConfig::from_json_str(r#"{
//!     "components_root": "ui",
//!     "tracing": { "level": "debug", "format": "json" }
//! }"#).unwrap();
//!
//! assert_eq!(config.paths().markup_path("widgets", "card"), "./ui/widgets/card/card.html");
//! ```

use crate::tracing_setup::{TracingConfig, TracingFormat};
use serde::Deserialize;
use std::str::FromStr;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Default directory holding component sources.
pub const DEFAULT_COMPONENTS_ROOT: &str = "web-components";

/// Errors produced while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured log level is not a known level.
    #[error("unknown log level '{0}'")]
    UnknownLevel(String),

    /// The filter directives do not parse.
    #[error("invalid env_filter '{filter}': {reason}")]
    InvalidFilter {
        /// The rejected directives.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// The component root is empty.
    #[error("components_root must not be empty")]
    EmptyRoot,
}

/// Tracing section of [`SkeinConfig`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingSection {
    /// Level name (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// Output format.
    pub format: TracingFormat,
    /// Optional per-target filter directives.
    pub env_filter: Option<String>,
    /// Whether span enter/exit events are logged.
    pub span_events: bool,
}

impl Default for TracingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: TracingFormat::default(),
            env_filter: None,
            span_events: false,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SkeinConfig {
    /// Directory, relative to the served root, that contains component folders.
    pub components_root: String,
    /// Logging settings.
    pub tracing: TracingSection,
}

impl Default for SkeinConfig {
    fn default() -> Self {
        Self {
            components_root: DEFAULT_COMPONENTS_ROOT.to_string(),
            tracing: TracingSection::default(),
        }
    }
}

impl SkeinConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is malformed, names an unknown
    /// log level or an unparsable filter, or has an empty component root.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that serde cannot.
    ///
    /// # Errors
    ///
    /// See [`from_json_str`](Self::from_json_str).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.components_root.trim().is_empty() {
            return Err(ConfigError::EmptyRoot);
        }
        self.level()?;
        if let Some(filter) = &self.tracing.env_filter {
            EnvFilter::try_new(filter).map_err(|err| ConfigError::InvalidFilter {
                filter: filter.clone(),
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }

    /// Validates the tracing section and installs the global subscriber.
    ///
    /// Returns `Ok(false)` if a subscriber was already installed.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate). Nothing is installed on error.
    pub fn install_tracing(&self) -> Result<bool, ConfigError> {
        self.validate()?;
        Ok(self.tracing_config()?.install())
    }

    /// Parsed log level.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLevel`] for unrecognized names.
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(&self.tracing.level)
            .map_err(|_| ConfigError::UnknownLevel(self.tracing.level.clone()))
    }

    /// Builds the tracing configuration described by this document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLevel`] for unrecognized level names.
    pub fn tracing_config(&self) -> Result<TracingConfig, ConfigError> {
        let mut config = TracingConfig::new()
            .with_level(self.level()?)
            .with_format(self.tracing.format)
            .with_span_events(self.tracing.span_events);
        if let Some(filter) = &self.tracing.env_filter {
            config = config.with_env_filter(filter.clone());
        }
        Ok(config)
    }

    /// Path derivation rules for this root.
    #[must_use]
    pub fn paths(&self) -> ComponentPaths {
        ComponentPaths::new(self.components_root.clone())
    }
}

/// Derives resource paths for a component from its type and name.
///
/// Components live at `./{root}/{type}/{name}/` with one file per resource
/// kind, each named after the component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentPaths {
    root: String,
}

impl Default for ComponentPaths {
    fn default() -> Self {
        Self::new(DEFAULT_COMPONENTS_ROOT)
    }
}

impl ComponentPaths {
    /// Creates path rules rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            root: root.trim_matches('/').to_string(),
        }
    }

    /// The component root directory.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Path of the component's markup template.
    #[must_use]
    pub fn markup_path(&self, kind: &str, name: &str) -> String {
        self.file(kind, name, "html")
    }

    /// Path of the component's style sheet.
    #[must_use]
    pub fn style_path(&self, kind: &str, name: &str) -> String {
        self.file(kind, name, "css")
    }

    /// Path of the module defining the component's presenter.
    #[must_use]
    pub fn module_path(&self, kind: &str, name: &str) -> String {
        self.file(kind, name, "js")
    }

    fn file(&self, kind: &str, name: &str, extension: &str) -> String {
        format!("./{}/{kind}/{name}/{name}.{extension}", self.root)
    }
}
