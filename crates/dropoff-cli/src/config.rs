//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use dropoff_core::{AnalysisConfig, DEFAULT_BUCKET_WIDTH_MINUTES, DEFAULT_TIMESTAMP_FORMAT};

use crate::cli::{BucketArgs, InputArgs};

/// Default name of the column holding session ranges.
pub const DEFAULT_SESSIONS_COLUMN: &str = "Sessions";

/// Default name of the column holding user identifiers.
pub const DEFAULT_USER_COLUMN: &str = "User Name";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Width of each time bucket in minutes.
    pub bucket_width_minutes: u32,

    /// Format of both timestamps in a session range.
    pub timestamp_format: String,

    /// Input column holding `start - end` ranges.
    pub sessions_column: String,

    /// Input column holding user identifiers. Optional in the input.
    pub user_column: String,

    /// Whether to compute the users-present column by default.
    pub users_present: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket_width_minutes: DEFAULT_BUCKET_WIDTH_MINUTES,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            sessions_column: DEFAULT_SESSIONS_COLUMN.to_string(),
            user_column: DEFAULT_USER_COLUMN.to_string(),
            users_present: false,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (DROPOFF_*)
        figment = figment.merge(Env::prefixed("DROPOFF_"));

        figment.extract()
    }

    /// Applies input-related command-line overrides.
    #[must_use]
    pub fn with_input_args(mut self, args: &InputArgs) -> Self {
        if let Some(column) = &args.sessions_column {
            self.sessions_column.clone_from(column);
        }
        if let Some(column) = &args.user_column {
            self.user_column.clone_from(column);
        }
        if let Some(format) = &args.timestamp_format {
            self.timestamp_format.clone_from(format);
        }
        self
    }

    /// Applies bucketing command-line overrides.
    #[must_use]
    pub fn with_bucket_args(mut self, args: &BucketArgs) -> Self {
        if let Some(width) = args.width {
            self.bucket_width_minutes = width;
        }
        if args.presence {
            self.users_present = true;
        }
        self
    }

    /// The engine settings carried by this configuration.
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            bucket_width_minutes: self.bucket_width_minutes,
            timestamp_format: self.timestamp_format.clone(),
            users_present: self.users_present,
        }
    }
}

/// Returns the platform-specific config directory for dropoff.
///
/// On Linux: `~/.config/dropoff`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("dropoff"))
}
