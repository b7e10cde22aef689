//! Session configuration
//!
//! Every section falls back to defaults, so an empty file is a valid
//! configuration:
//!
//! ```toml
//! [review]
//! page_size = 20
//!
//! [sandbox.limits]
//! max_steps = 200000
//!
//! [sandbox.module_aliases]
//! seaborn = "plt"
//! ```

use crate::error::ConfigError;
use indexmap::IndexMap;
use quire_queue::{QueueSchema, DEFAULT_IDENTIFIER_FIELD, DEFAULT_REQUIRED_FIELDS};
use quire_sandbox::{ExecutionLimits, Sandbox, DEFAULT_MODULE_ALIASES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuireConfig {
    pub review: ReviewConfig,
    pub analysis: AnalysisConfig,
    pub sandbox: SandboxConfig,
}

impl QuireConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With review settings
    #[inline]
    #[must_use]
    pub fn with_review(mut self, review: ReviewConfig) -> Self {
        self.review = review;
        self
    }

    /// With sandbox settings
    #[inline]
    #[must_use]
    pub fn with_sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Parse and check a TOML document
    ///
    /// # Errors
    /// Returns `Parse` for malformed TOML and `Invalid` for out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns `Io` when the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    /// Returns `Invalid` if a value has no TOML form
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.review.page_size == 0 {
            return Err(ConfigError::Invalid(
                "review.page_size must be at least 1".to_string(),
            ));
        }
        if self.sandbox.limits.max_steps == 0 {
            return Err(ConfigError::Invalid(
                "sandbox.limits.max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Review workflow settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Records per list page
    pub page_size: usize,
    /// Columns an upload must carry
    pub required_fields: Vec<String>,
    /// Column shown as the record label in lists
    pub identifier_field: Option<String>,
    /// Download name (without extension) of the full export
    pub export_file_stem: String,
    /// Sheet name of exports
    pub export_sheet: String,
}

impl ReviewConfig {
    /// Create default review settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With page size
    #[inline]
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// With required fields
    #[must_use]
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Queue schema these settings describe
    #[must_use]
    pub fn schema(&self) -> QueueSchema {
        QueueSchema::new()
            .with_required_fields(self.required_fields.iter().cloned())
            .with_identifier_field(self.identifier_field.clone())
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            required_fields: DEFAULT_REQUIRED_FIELDS.iter().map(|s| (*s).to_string()).collect(),
            identifier_field: Some(DEFAULT_IDENTIFIER_FIELD.to_string()),
            export_file_stem: "output_check".to_string(),
            export_sheet: "전체문제".to_string(),
        }
    }
}

/// Analysis workflow settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Download name (without extension) of the merged table
    pub merged_file_stem: String,
    /// Sheet name of the merged download
    pub merged_sheet: String,
    /// Sampling temperature passed to the text generator
    pub temperature: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            merged_file_stem: "merged_result".to_string(),
            merged_sheet: "병합데이터".to_string(),
            temperature: 0.5,
        }
    }
}

/// Sandbox settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub limits: ExecutionLimits,
    /// Importable module path to bound name
    pub module_aliases: IndexMap<String, String>,
}

impl SandboxConfig {
    /// With limits
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sandbox these settings describe
    #[must_use]
    pub fn sandbox(&self) -> Sandbox {
        Sandbox::new()
            .with_limits(self.limits)
            .with_module_aliases(self.module_aliases.clone())
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            limits: ExecutionLimits::default(),
            module_aliases: DEFAULT_MODULE_ALIASES
                .iter()
                .map(|(path, name)| ((*path).to_string(), (*name).to_string()))
                .collect(),
        }
    }
}
