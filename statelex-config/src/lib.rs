//! Shared configuration loader for statelex.
//!
//! `defaults/statelex.default.toml` is embedded into the binary so the documented defaults
//! and the runtime defaults cannot drift apart. Callers layer user files and single-key
//! overrides on top through [`Loader`] before deserializing into [`StatelexConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

pub use config::ConfigError as Error;

const DEFAULT_TOML: &str = include_str!("../defaults/statelex.default.toml");

/// Top-level configuration consumed by statelex applications.
#[derive(Debug, Clone, Deserialize)]
pub struct StatelexConfig {
    pub tokenizer: TokenizerConfig,
    pub output: OutputConfig,
}

/// Engine limits applied on top of a rule table's own options.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenizerConfig {
    pub max_stack_depth: usize,
    pub max_delegate_depth: usize,
    /// `None` keeps the table's own setting.
    #[serde(default)]
    pub reset_on_newline: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. from a command line flag.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<StatelexConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<StatelexConfig, ConfigError> {
    Loader::new().build()
}
