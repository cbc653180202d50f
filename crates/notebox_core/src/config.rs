//! Runtime configuration for embedding the note core.
//!
//! # Responsibility
//! - Collect database and logging settings from the environment.
//! - Turn settings into a ready note store and active logging.
//!
//! # Invariants
//! - Missing settings fall back to defaults; only malformed ones are errors.
//! - Without `db_path` the store is a private in-memory database.

use crate::logging::{
    default_log_level, init_logging, normalize_level, normalize_log_dir, LoggingError,
};
use crate::repo::note_store::RepoError;
use crate::repo::sqlite_note_store::SqliteNoteStore;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "NOTEBOX_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "NOTEBOX_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "NOTEBOX_LOG_DIR";

#[derive(Debug)]
pub enum ConfigError {
    Logging(LoggingError),
    Store(RepoError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging config: {err}"),
            Self::Store(err) => write!(f, "store config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<LoggingError> for ConfigError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<RepoError> for ConfigError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// SQLite file; `None` selects an in-memory database.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute log directory; `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads `NOTEBOX_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(ENV_DB_PATH).map(PathBuf::from),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level)?;
        if let Some(dir) = &self.log_dir {
            normalize_log_dir(&dir.to_string_lossy())?;
        }
        Ok(())
    }

    /// Starts file logging when a log directory is configured.
    ///
    /// Returns whether logging is active after the call.
    pub fn init_logging(&self) -> Result<bool, ConfigError> {
        match &self.log_dir {
            Some(dir) => {
                init_logging(&self.log_level, &dir.to_string_lossy())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Opens the configured database and wraps it in a note store.
    pub fn open_store(&self) -> Result<SqliteNoteStore, ConfigError> {
        let store = match &self.db_path {
            Some(path) => SqliteNoteStore::open(path)?,
            None => SqliteNoteStore::open_in_memory()?,
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_LOG_LEVEL};
    use crate::logging::default_log_level;
    use crate::repo::note_store::{NewNote, NoteStore};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_values_fall_back_to_defaults() {
        let config = CoreConfig::from_lookup(lookup_from(&[(ENV_DB_PATH, "  ")]));
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.log_level, default_log_level());
    }

    #[test]
    fn lookup_values_are_trimmed_and_applied() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, " /var/lib/notebox/notes.db "),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_DIR, "/var/log/notebox"),
        ]));
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/notebox/notes.db"))
        );
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/notebox")));
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_bad_level_and_relative_dir() {
        let config = CoreConfig {
            log_level: "loud".to_string(),
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Logging(_))));

        let config = CoreConfig {
            log_dir: Some(PathBuf::from("logs")),
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Logging(_))));
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: CoreConfig = serde_json::from_str(r#"{"log_level":"trace"}"#).unwrap();
        assert_eq!(config.log_level, "trace");
        assert_eq!(config.db_path, None);
    }

    #[test]
    fn logging_stays_off_without_dir() {
        assert!(!CoreConfig::default().init_logging().unwrap());
    }

    #[test]
    fn open_store_uses_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        let config = CoreConfig {
            db_path: Some(path.clone()),
            ..CoreConfig::default()
        };

        let store = config.open_store().unwrap();
        store
            .create(&NewNote {
                title: "t".to_string(),
                content: "c".to_string(),
                owner: "u1".to_string(),
            })
            .unwrap();
        drop(store);

        assert!(path.exists());
    }
}
