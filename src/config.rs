// Persisted settings: saved credentials and the bulk pacing delay.
//
// Settings live in a small JSON file (`config.json` in the working directory
// unless overridden). A file that is missing or unreadable simply means
// "nothing saved yet"; the workflow prompts for whatever is absent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default settings file name, resolved against the working directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Contents of the settings file. Key names are kept compatible with files
/// written by earlier versions of the tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub password: String,
    /// Seconds to wait after each bulk submission. Zero or negative means
    /// unset; older files may hold negative values.
    #[serde(default, rename = "sleeptime")]
    pub sleep_time: i64,
}

impl Settings {
    /// Saved `(account, password)`, if both are non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if self.account.is_empty() || self.password.is_empty() {
            None
        } else {
            Some((self.account.as_str(), self.password.as_str()))
        }
    }

    pub fn pacing(&self) -> Option<u64> {
        u64::try_from(self.sleep_time).ok().filter(|secs| *secs > 0)
    }
}

/// Storage backend for [`Settings`].
pub trait ConfigStore {
    fn load(&self) -> Result<Settings, ConfigError>;
    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError>;

    /// Current settings, or defaults when nothing can be loaded.
    fn load_or_default(&self) -> Settings {
        match self.load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!(error = %e, "no usable settings, starting empty");
                Settings::default()
            }
        }
    }

    fn save_credentials(&mut self, account: &str, password: &str) -> Result<(), ConfigError> {
        let mut settings = self.load_or_default();
        settings.account = account.to_string();
        settings.password = password.to_string();
        self.save(&settings)
    }

    fn save_pacing(&mut self, seconds: u64) -> Result<(), ConfigError> {
        let mut settings = self.load_or_default();
        settings.sleep_time = i64::try_from(seconds).unwrap_or(i64::MAX);
        self.save(&settings)
    }

    /// Blank the saved credentials, keeping the pacing delay.
    fn clear_credentials(&mut self) -> Result<(), ConfigError> {
        self.save_credentials("", "")
    }
}

/// [`ConfigStore`] backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl ConfigStore for JsonFileStore {
    fn load(&self) -> Result<Settings, ConfigError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&mut self, settings: &Settings) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(settings).map_err(|source| ConfigError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        restrict_permissions(&self.path).map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

// The file holds a plaintext password.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// In-memory store that counts writes.
    #[derive(Debug, Default)]
    pub struct MemoryStore {
        pub settings: Option<Settings>,
        pub saves: usize,
    }

    impl MemoryStore {
        pub fn with(settings: Settings) -> Self {
            Self {
                settings: Some(settings),
                saves: 0,
            }
        }
    }

    impl ConfigStore for MemoryStore {
        fn load(&self) -> Result<Settings, ConfigError> {
            self.settings.clone().ok_or_else(|| ConfigError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "empty"),
            })
        }

        fn save(&mut self, settings: &Settings) -> Result<(), ConfigError> {
            self.settings = Some(settings.clone());
            self.saves += 1;
            Ok(())
        }
    }
}
