// SPDX-License-Identifier: Apache-2.0

//! JSON body handling for `POST /_admin/jwt/revoke` (§4.5, §6): exactly
//! `jti` (non-empty string) and `exp` (non-negative integer, seconds).

use titan_core::revocation::RevocationEntry;

#[derive(Debug)]
pub enum RevokeError {
    InvalidJson(String),
    MissingJti,
    MissingExp,
}

impl RevokeError {
    pub fn message(&self) -> String {
        match self {
            RevokeError::InvalidJson(e) => format!("invalid JSON: {e}"),
            RevokeError::MissingJti => {
                "missing or invalid 'jti' field (must be a non-empty string)".to_string()
            }
            RevokeError::MissingExp => {
                "missing or invalid 'exp' field (must be a non-negative integer, seconds since epoch)"
                    .to_string()
            }
        }
    }
}

/// Parse a revoke request body into a [`RevocationEntry`]. `jti` must
/// be a non-empty string (§3: "non-empty byte string"); `exp` must be
/// representable as `u64`.
pub fn parse_revoke_body(body: &str) -> Result<RevocationEntry, RevokeError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| RevokeError::InvalidJson(e.to_string()))?;

    let jti = value
        .get("jti")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(RevokeError::MissingJti)?;

    let exp = value
        .get("exp")
        .and_then(|v| v.as_u64())
        .ok_or(RevokeError::MissingExp)?;

    Ok(RevocationEntry::new(jti, exp))
}
