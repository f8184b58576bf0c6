//! Rendering service networking
//!
//! This module covers everything that talks to the rendering service: the
//! collaborator trait and its HTTP implementation, plus the authentication
//! layer that guards every call.

pub mod auth;
pub mod client;

// Re-export main types for convenience
pub use auth::{GuardState, LoginForm, SessionEvent, SessionGuard};
pub use client::{Collaborator, HttpCollaborator};

// Error types
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum NetworkError {
    #[error("Session expired (HTTP 401)")]
    Unauthorized,

    #[error("Login rejected: {message}")]
    LoginRejected { message: String },

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Transport error: {reason}")]
    Transport { reason: String },

    #[error("Response decode failed: {reason}")]
    Decode { reason: String },

    #[error("Collaborator calls are suspended until login succeeds")]
    Suspended,
}

/// Recovery class of a collaborator failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401 from a data call; re-prompt login, keep in-session state
    AuthExpired,
    /// 401 from the login call itself
    LoginRejected,
    /// Anything else; the client is reloaded
    OtherCollaboratorFailure,
}

impl NetworkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetworkError::Unauthorized | NetworkError::Suspended => ErrorKind::AuthExpired,
            NetworkError::LoginRejected { .. } => ErrorKind::LoginRejected,
            NetworkError::HttpStatus { status: 401, .. } => ErrorKind::AuthExpired,
            _ => ErrorKind::OtherCollaboratorFailure,
        }
    }

    pub fn is_auth_expired(&self) -> bool {
        self.kind() == ErrorKind::AuthExpired
    }
}

pub type NetworkResult<T> = Result<T, NetworkError>;

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NetworkError::Decode { reason: err.to_string() }
        } else {
            NetworkError::Transport { reason: err.to_string() }
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::Decode { reason: err.to_string() }
    }
}
