//! Error types for mesh construction and backend operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised while building a soft-body mesh.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Source image has a zero or non-finite dimension.
    EmptyImage { width: f32, height: f32 },
    /// The stage the mesh is laid out on has no area.
    EmptyView { width: f32, height: f32 },
    /// A spring referenced a node that does not exist.
    NodeOutOfBounds { index: usize, count: usize },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::EmptyImage { width, height } => {
                write!(f, "image has no area ({}x{})", width, height)
            }
            MeshError::EmptyView { width, height } => {
                write!(f, "view has no area ({}x{})", width, height)
            }
            MeshError::NodeOutOfBounds { index, count } => {
                write!(f, "node index {} out of bounds (count: {})", index, count)
            }
        }
    }
}

impl std::error::Error for MeshError {}

/// Errors from the score/media stores and the checks that run before them.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend URL or key was never configured.
    NotConfigured,
    /// A required field was empty.
    MissingField(&'static str),
    /// No record with this id.
    NotFound(u64),
    /// Object storage refused the write (e.g. the path already exists).
    StorageConflict(String),
    /// The remote answered with an error payload.
    Remote { status: u16, code: String },
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NotConfigured => write!(f, "backend not configured"),
            BackendError::MissingField(name) => write!(f, "missing required field: {}", name),
            BackendError::NotFound(id) => write!(f, "record {} not found", id),
            BackendError::StorageConflict(path) => write!(f, "object already exists: {}", path),
            BackendError::Remote { status, code } => {
                write!(f, "remote error {} ({})", code, status)
            }
        }
    }
}

impl std::error::Error for BackendError {}

/// Error codes returned by the media signing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignError {
    NotFound,
    PasswordRequired,
    InvalidPassword,
    SignFailed,
    BadRequest,
}

impl SignError {
    /// HTTP status the endpoint answers with
    pub fn status(&self) -> u16 {
        match self {
            SignError::NotFound => 404,
            SignError::PasswordRequired => 401,
            SignError::InvalidPassword => 403,
            SignError::SignFailed => 500,
            SignError::BadRequest => 400,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignError::NotFound => "not_found",
            SignError::PasswordRequired => "password_required",
            SignError::InvalidPassword => "invalid_password",
            SignError::SignFailed => "sign_failed",
            SignError::BadRequest => "bad_request",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "not_found" => Some(SignError::NotFound),
            "password_required" => Some(SignError::PasswordRequired),
            "invalid_password" => Some(SignError::InvalidPassword),
            "sign_failed" => Some(SignError::SignFailed),
            "bad_request" => Some(SignError::BadRequest),
            _ => None,
        }
    }
}

impl fmt::Display for SignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for SignError {}

impl From<SignError> for BackendError {
    fn from(err: SignError) -> Self {
        BackendError::Remote {
            status: err.status(),
            code: err.as_str().to_string(),
        }
    }
}
