//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use ttr_db::ActivePolicy;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Directory backup copies are written to.
    pub backup_dir: PathBuf,

    /// When true (the default), starting a task stops whatever else is
    /// running; when false, distinct tasks may run concurrently.
    pub single_active: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("backup_dir", &self.backup_dir)
            .field("single_active", &self.single_active)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("ttr.db"),
            backup_dir: data_dir.join("backups"),
            single_active: true,
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

        // Load from environment variables (TTR_*)
        figment = figment.merge(Env::prefixed("TTR_"));

        figment.extract()
    }

    /// The active-session policy this configuration selects.
    pub const fn active_policy(&self) -> ActivePolicy {
        if self.single_active {
            ActivePolicy::Exclusive
        } else {
            ActivePolicy::PerTask
        }
    }
}

/// Returns the platform-specific config directory for ttr.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ttr"))
}

/// Returns the platform-specific data directory for ttr.
///
/// On Linux: `~/.local/share/ttr`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("ttr"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_data_path_ends_with_ttr() {
        let path = dirs_data_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "ttr");
    }

    #[test]
    fn test_default_config_uses_data_dir() {
        let config = Config::default();
        let data_dir = dirs_data_path().unwrap();
        assert_eq!(config.database_path, data_dir.join("ttr.db"));
        assert_eq!(config.backup_dir, data_dir.join("backups"));
    }

    #[test]
    fn test_default_policy_is_exclusive() {
        let config = Config::default();
        assert!(config.single_active);
        assert_eq!(config.active_policy(), ActivePolicy::Exclusive);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config_file = temp.path().join("config.toml");
        std::fs::write(
            &config_file,
            "database_path = \"/tmp/elsewhere.db\"\nsingle_active = false\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&config_file)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/elsewhere.db"));
        assert_eq!(config.active_policy(), ActivePolicy::PerTask);
    }
}
