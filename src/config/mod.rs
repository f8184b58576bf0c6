pub mod settings;

// Re-export commonly used types
pub use settings::{
    ConfigError, InputSettings, LimitSettings, LoggingSettings, PickerSettings,
    ServerSettings, StartupSettings, default_config_path,
};
