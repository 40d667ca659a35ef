//! Signed-URL endpoint for protected media
//!
//! Takes `{"id": .., "password": ..}`, checks the row's password digest if
//! the row is protected, and answers `{"url": .., "expiresIn": ..}` or
//! `{"error": "<code>"}` with the matching status.

use serde::{Deserialize, Serialize};

use super::media::{MediaStore, password_digest};
use crate::error::{BackendError, SignError};

/// Link lifetime when nothing is configured
pub const DEFAULT_TTL_SECS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignRequest {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl SignRequest {
    /// Trims the password and drops it when blank
    pub fn new(id: u64, password: Option<&str>) -> Self {
        Self {
            id,
            password: password.map(str::trim).filter(|p| !p.is_empty()).map(String::from),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignResponse {
    pub url: String,
    #[serde(rename = "expiresIn")]
    pub expires_in: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: SignError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignConfig {
    pub ttl_secs: u32,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl SignConfig {
    /// From an environment-style value such as `ACCESS_TTL`; anything that
    /// is not a positive integer falls back to the default
    pub fn from_env_value(value: Option<&str>) -> Self {
        let ttl_secs = value
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|ttl| *ttl > 0)
            .unwrap_or(DEFAULT_TTL_SECS);
        Self { ttl_secs }
    }
}

pub fn handle_sign<S: MediaStore + ?Sized>(
    store: &S,
    request: &SignRequest,
    config: &SignConfig,
) -> Result<SignResponse, SignError> {
    let row = store.get(request.id).ok_or(SignError::NotFound)?;

    if row.is_protected {
        let password = request.password.as_deref().map(str::trim).unwrap_or("");
        if password.is_empty() {
            return Err(SignError::PasswordRequired);
        }
        let stored = row.password_hash.as_deref().unwrap_or("");
        if !stored.eq_ignore_ascii_case(&password_digest(password)) {
            return Err(SignError::InvalidPassword);
        }
    }

    let url = store.sign(&row.key(), config.ttl_secs)?;
    Ok(SignResponse {
        url,
        expires_in: config.ttl_secs,
    })
}

/// Full request/response cycle on JSON bodies: `(status, body)`
pub fn handle_sign_json<S: MediaStore + ?Sized>(
    store: &S,
    body: &str,
    config: &SignConfig,
) -> (u16, String) {
    let result = serde_json::from_str::<SignRequest>(body)
        .map_err(|_| SignError::BadRequest)
        .and_then(|request| {
            log::debug!(
                "Sign request for {} (password: {})",
                request.id,
                request.password.is_some()
            );
            handle_sign(store, &request, config)
        });

    let encoded = match &result {
        Ok(response) => serde_json::to_string(response).map(|json| (200, json)),
        Err(error) => serde_json::to_string(&ErrorBody { error: *error }).map(|json| (error.status(), json)),
    };
    match encoded {
        Ok(reply) => reply,
        Err(err) => {
            log::error!("Failed to encode sign response: {}", err);
            (500, format!("{{\"error\":\"{}\"}}", SignError::SignFailed))
        }
    }
}

/// Caller side: the signed URL, or the endpoint's error code
pub fn parse_sign_response(status: u16, body: &str) -> Result<String, BackendError> {
    if (200..300).contains(&status) {
        if let Ok(response) = serde_json::from_str::<SignResponse>(body) {
            return Ok(response.url);
        }
    }
    let code = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| "unknown".to_string());
    match SignError::from_code(&code) {
        Some(known) => Err(known.into()),
        None => {
            log::warn!("Unrecognized sign error {:?} ({})", code, status);
            Err(BackendError::Remote { status, code })
        }
    }
}
