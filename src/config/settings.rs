use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "picker.toml";
const ENV_PREFIX: &str = "PICKER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No configuration directory available on this platform")]
    NoConfigDir,
}

// =============================================================================
// Settings sections
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Root of the rendering service, e.g. `http://localhost:3000/`
    pub base_url: String,
    /// Deployment requires a login before any catalog call
    pub auth_required: bool,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/".to_string(),
            auth_required: false,
            timeout_ms: 30_000,
            user_agent: format!("{}/{}", crate::APP_NAME, crate::VERSION),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupSettings {
    /// Actor selected once the catalog has loaded
    pub default_actor: String,
}

impl Default for StartupSettings {
    fn default() -> Self {
        Self {
            default_actor: "follower".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Quiet period before a text edit is committed
    pub debounce_ms: u64,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self { debounce_ms: 500 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Client-side mirror of the service's public-deployment limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    pub enabled: bool,
    pub max_overlay_skins: usize,
    pub max_scale: f64,
    pub max_start_time: f64,
    pub max_text_len: usize,
    pub max_text_size: u32,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_overlay_skins: 10,
            max_scale: 3.0,
            max_start_time: 30.0,
            max_text_len: 100,
            max_text_size: 200,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerSettings {
    pub server: ServerSettings,
    pub startup: StartupSettings,
    pub input: InputSettings,
    pub logging: LoggingSettings,
    pub limits: LimitSettings,
}

// =============================================================================
// Loading and saving
// =============================================================================

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "actor-picker", "actor-picker")
        .map(|proj| proj.config_dir().join(CONFIG_FILE))
}

impl PickerSettings {
    /// Layer defaults, the platform config file, an explicit file and
    /// `PICKER__SECTION__KEY` environment variables, in that order.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = toml::to_string(&PickerSettings::default())?;

        let mut builder = Config::builder()
            .add_source(File::from_str(&defaults, FileFormat::Toml));

        if let Some(path) = default_config_path() {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path.to_path_buf()).format(FileFormat::Toml).required(true));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true))
            .build()?
            .try_deserialize::<PickerSettings>()?;

        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.to_path_buf()).format(FileFormat::Toml).required(true))
            .build()?
            .try_deserialize::<PickerSettings>()?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = default_config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PickerSettings::default();
        assert_eq!(settings.input.debounce_ms, 500);
        assert!(!settings.server.auth_required);
        assert_eq!(settings.startup.default_actor, "follower");
        assert!(!settings.limits.enabled);
        assert_eq!(settings.limits.max_overlay_skins, 10);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picker.toml");
        fs::write(&path, "[server]\nauth_required = true\n").unwrap();

        let settings = PickerSettings::load_from_file(&path).unwrap();
        assert!(settings.server.auth_required);
        assert_eq!(settings.server.base_url, "http://localhost:3000/");
        assert_eq!(settings.input.debounce_ms, 500);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("picker.toml");

        let mut settings = PickerSettings::default();
        settings.startup.default_actor = "ratau".to_string();
        settings.limits.enabled = true;
        settings.save_to(&path).unwrap();

        let loaded = PickerSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }
}
