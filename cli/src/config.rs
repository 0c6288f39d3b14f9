//! CLI configuration file.
//!
//! # Example YAML
//!
//! ```yaml
//! database: /home/ann/contacts_db/contacts.db
//! display_style: tabular
//! ```
//!
//! Both keys are optional. Flags given on the command line win over the file.

use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How records are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    /// One JSON object per record.
    #[default]
    Dict,
    /// Pipe-delimited table with a header row.
    Tabular,
}

/// Errors raised while loading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Settings read from `config.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Database file, or `:memory:`.
    pub database: PathBuf,
    /// Default output style for `find` and `list`.
    pub display_style: DisplayStyle,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            display_style: DisplayStyle::default(),
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads `path` if given, otherwise the default config file if present.
    ///
    /// An explicitly named file must exist; a missing default file yields
    /// the built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load(path),
                _ => Ok(Self::default()),
            },
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

/// `~/contacts_db/contacts.db`, or a relative `contacts_db/contacts.db`
/// when no home directory is known.
pub fn default_database_path() -> PathBuf {
    home_dir()
        .unwrap_or_default()
        .join("contacts_db")
        .join("contacts.db")
}

/// `~/.config/contacts/config.yml`.
pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".config").join("contacts").join("config.yml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "database: /tmp/x.db\ndisplay_style: tabular\n").unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.database, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.display_style, DisplayStyle::Tabular);
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "display_style: dict\n").unwrap();

        let config = CliConfig::load(&path).unwrap();
        assert_eq!(config.database, default_database_path());
        assert_eq!(config.display_style, DisplayStyle::Dict);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = CliConfig::resolve(Some(&dir.path().join("nope.yml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_bad_style_is_yaml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "display_style: fancy\n").unwrap();
        let err = CliConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_default_database_path_shape() {
        assert!(default_database_path().ends_with("contacts_db/contacts.db"));
    }
}
