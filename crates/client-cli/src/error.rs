use reqwest::StatusCode;
use thiserror::Error;

use crate::validation::FieldErrors;

/// Everything that can go wrong talking to the portal backend.
///
/// Rejections keep the backend's own message, when it sent one, so views
/// can show it verbatim.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Rejected locally, nothing was sent
    #[error("{0}")]
    Validation(FieldErrors),

    /// 401 - no session, or the session expired
    #[error("{}", .0.as_deref().unwrap_or("Not authenticated"))]
    Unauthorized(Option<String>),

    /// 403 - signed in but not allowed
    #[error("{}", .0.as_deref().unwrap_or("Access denied"))]
    Forbidden(Option<String>),

    #[error("{} (status {status})", .message.as_deref().unwrap_or("Request failed"))]
    Backend { status: u16, message: Option<String> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl PortalError {
    /// Build the error for a non-success response
    pub fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => PortalError::Unauthorized(message),
            StatusCode::FORBIDDEN => PortalError::Forbidden(message),
            _ => PortalError::Backend {
                status: status.as_u16(),
                message,
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            PortalError::Unauthorized(_) => Some(401),
            PortalError::Forbidden(_) => Some(403),
            PortalError::Backend { status, .. } => Some(*status),
            PortalError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The backend's message if it sent one
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            PortalError::Unauthorized(m) | PortalError::Forbidden(m) => m.as_deref(),
            PortalError::Backend { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Message fit for the user: validation text or the backend's message
    /// verbatim, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            PortalError::Validation(errors) => errors.to_string(),
            other => other.backend_message().unwrap_or(fallback).to_string(),
        }
    }
}
