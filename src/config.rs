use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::media::downsample::REDUCED_MAX_EDGE;
use crate::state::data::CompanyInfo;

const APP_DIR: &str = "storm-report";
const CONFIG_FILE: &str = "config.json";

pub const ENV_OUTPUT_DIR: &str = "STORM_REPORT_OUTPUT_DIR";
pub const ENV_OUTBOX_DIR: &str = "STORM_REPORT_OUTBOX_DIR";
pub const ENV_REDUCED_EDGE: &str = "STORM_REPORT_REDUCED_EDGE";

/// Application configuration.
///
/// Loaded from `config.json` in the user's config directory:
/// - Linux: ~/.config/storm-report/config.json
/// - macOS: ~/Library/Application Support/storm-report/config.json
/// - Windows: %APPDATA%\storm-report\config.json
///
/// Every field is optional in the file. Environment overrides:
///
/// | Env Var                     | Default                         |
/// |-----------------------------|---------------------------------|
/// | `STORM_REPORT_OUTPUT_DIR`   | `<data_dir>/storm-report/reports` |
/// | `STORM_REPORT_OUTBOX_DIR`   | `<data_dir>/storm-report/outbox`  |
/// | `STORM_REPORT_REDUCED_EDGE` | `1280`                          |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Where downloaded reports are written
    pub output_dir: PathBuf,
    /// Where e-mails are spooled for the mailer
    pub outbox_dir: PathBuf,
    /// Longest edge of the reduced photo variant, in pixels
    pub reduced_max_edge: u32,
    /// Letterhead printed on every report cover
    pub company: Option<CompanyInfo>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let base = data_dir();
        Self {
            output_dir: base.join("reports"),
            outbox_dir: base.join("outbox"),
            reduced_max_edge: REDUCED_MAX_EDGE,
            company: None,
        }
    }
}

impl AppConfig {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from `path`. A missing file gives the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Apply overrides, looking each variable up with `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_OUTPUT_DIR).filter(|v| !v.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_OUTBOX_DIR).filter(|v| !v.trim().is_empty()) {
            self.outbox_dir = PathBuf::from(dir);
        }
        if let Some(value) = lookup(ENV_REDUCED_EDGE) {
            self.reduced_max_edge = match value.trim().parse::<u32>() {
                Ok(edge) if edge > 0 => edge,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: ENV_REDUCED_EDGE,
                        value,
                    })
                }
            };
        }
        Ok(())
    }
}

/// Path of the config file, if the platform has a config directory
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

fn data_dir() -> PathBuf {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}
