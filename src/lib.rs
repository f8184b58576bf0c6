// actor-picker: interactive actor/skin/animation picker for a sprite rendering service

pub mod app;
pub mod catalog;
pub mod config;
pub mod networking;
pub mod request;
pub mod selection;
pub mod utils;

// Re-export commonly used types for convenience
pub use app::{PickerController, PickerError, RenderOutput};
pub use config::PickerSettings;
pub use networking::{Collaborator, HttpCollaborator, NetworkError, SessionGuard};
pub use request::{OutputMode, RenderRequest, RequestComposer};
pub use selection::{Selection, SelectionState};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
