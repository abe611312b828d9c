// ── Core error types ──
//
// User-facing errors from univent-core. Consumers never see HTTP status
// codes or JSON parse failures directly; the `From<univent_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::session::Role;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach UniVent at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Capability errors ────────────────────────────────────────────
    #[error("Access denied: role {role} cannot check in attendees")]
    AccessDenied { role: Role },

    #[error("Permission denied by the server: {message}")]
    Forbidden { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("No event selected for check-in")]
    MissingEvent,

    // ── Check-in session errors ──────────────────────────────────────
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("Camera unavailable: {reason}")]
    CameraUnavailable { reason: String },

    #[error("Scanner error: {message}")]
    Scanner { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<univent_api::Error> for CoreError {
    fn from(err: univent_api::Error) -> Self {
        match err {
            univent_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            univent_api::Error::MissingToken => CoreError::AuthenticationFailed {
                message: "no session token -- log in first".into(),
            },
            univent_api::Error::Forbidden { message } => CoreError::Forbidden { message },
            univent_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            univent_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            univent_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            univent_api::Error::NotFound { resource } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: resource,
            },
            univent_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            univent_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
