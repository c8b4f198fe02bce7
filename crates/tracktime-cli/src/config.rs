//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the session log database.
    pub database_path: PathBuf,

    /// Minutes between autosaves of an open session. Zero disables autosave.
    pub autosave_minutes: u64,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("tracktime.db"),
            autosave_minutes: 1,
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

        // Load from environment variables (TRACKTIME_*)
        figment = figment.merge(Env::prefixed("TRACKTIME_"));

        figment.extract()
    }

    /// Autosave period as a [`std::time::Duration`].
    pub const fn autosave_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.autosave_minutes.saturating_mul(60))
    }
}

/// Returns the platform-specific config directory for tracktime.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tracktime"))
}

/// Returns the platform-specific data directory for tracktime.
///
/// On Linux: `~/.local/share/tracktime`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tracktime"))
}
