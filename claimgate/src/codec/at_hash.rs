//! Access token binding through the `at_hash` claim.
//!
//! `at_hash` is the base64url (unpadded) encoding of the left half of the
//! access token's digest, using the SHA-2 variant matching the signing
//! algorithm's bit size.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::Algorithm;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::SignatureError;

/// Claim name carrying the access token hash.
pub const AT_HASH: &str = "at_hash";

/// Compute `at_hash` for `access_token` under `algorithm`.
#[must_use]
pub fn compute(access_token: &str, algorithm: Algorithm) -> String {
    let digest = match algorithm {
        Algorithm::HS384 | Algorithm::RS384 | Algorithm::PS384 | Algorithm::ES384 => {
            Sha384::digest(access_token.as_bytes()).to_vec()
        }
        Algorithm::HS512 | Algorithm::RS512 | Algorithm::PS512 | Algorithm::EdDSA => {
            Sha512::digest(access_token.as_bytes()).to_vec()
        }
        _ => Sha256::digest(access_token.as_bytes()).to_vec(),
    };
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}

/// Check a decoded payload's `at_hash` against `access_token`.
///
/// A token without `at_hash` passes only when no access token is expected.
pub fn verify(
    payload: &Map<String, Value>,
    access_token: Option<&str>,
    algorithm: Algorithm,
) -> Result<(), SignatureError> {
    match (payload.get(AT_HASH), access_token) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(SignatureError::MissingAtHash),
        (Some(_), None) => Err(SignatureError::AccessTokenRequired),
        (Some(claimed), Some(access_token)) => {
            if claimed.as_str() == Some(compute(access_token, algorithm).as_str()) {
                Ok(())
            } else {
                Err(SignatureError::AtHashMismatch)
            }
        }
    }
}
