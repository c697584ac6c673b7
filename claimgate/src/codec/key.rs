//! Key material for signing and verifying tokens.
//!
//! # Invariants
//! - HMAC secrets are never empty when used.
//! - Key bytes never appear in `Debug` output.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use crate::error::SignatureError;

/// Algorithm families that share a key format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Hmac,
    Rsa,
    Ec,
    Ed,
}

impl Family {
    #[allow(unreachable_patterns)]
    const fn of(algorithm: Algorithm) -> Option<Self> {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Some(Self::Hmac),
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => Some(Self::Rsa),
            Algorithm::ES256 | Algorithm::ES384 => Some(Self::Ec),
            Algorithm::EdDSA => Some(Self::Ed),
            _ => None,
        }
    }

    fn of_checked(algorithm: Algorithm) -> Result<Self, SignatureError> {
        Self::of(algorithm).ok_or_else(|| {
            SignatureError::InvalidKey(format!("unsupported algorithm {algorithm:?}"))
        })
    }
}

/// A signing/verification key.
#[derive(Clone)]
pub enum KeyMaterial {
    /// Shared secret for the HMAC family (HS256, HS384, HS512).
    Secret(Vec<u8>),
    /// PEM-encoded keys for the RSA, ECDSA and EdDSA families. Without a
    /// private key the material can only verify.
    Pem {
        private: Option<Vec<u8>>,
        public: Vec<u8>,
    },
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secret(_) => f.debug_tuple("Secret").field(&"[REDACTED]").finish(),
            Self::Pem { private, .. } => f
                .debug_struct("Pem")
                .field("private", &private.as_ref().map(|_| "[REDACTED]"))
                .field("public", &"[..]")
                .finish(),
        }
    }
}

impl KeyMaterial {
    pub fn secret(secret: impl Into<Vec<u8>>) -> Self {
        Self::Secret(secret.into())
    }

    /// A private/public PEM pair, able to sign and verify.
    pub fn pem_pair(private: impl Into<Vec<u8>>, public: impl Into<Vec<u8>>) -> Self {
        Self::Pem {
            private: Some(private.into()),
            public: public.into(),
        }
    }

    /// A public PEM key, able to verify only.
    pub fn public_pem(public: impl Into<Vec<u8>>) -> Self {
        Self::Pem {
            private: None,
            public: public.into(),
        }
    }

    pub(crate) fn encoding_key(&self, algorithm: Algorithm) -> Result<EncodingKey, SignatureError> {
        let family = Family::of_checked(algorithm)?;
        match (self, family) {
            (Self::Secret(secret), Family::Hmac) => {
                non_empty(secret)?;
                Ok(EncodingKey::from_secret(secret))
            }
            (Self::Pem { private: None, .. }, Family::Rsa | Family::Ec | Family::Ed) => Err(
                SignatureError::InvalidKey("no private key available for signing".to_owned()),
            ),
            (Self::Pem { private: Some(pem), .. }, Family::Rsa) => {
                EncodingKey::from_rsa_pem(pem).map_err(invalid_key)
            }
            (Self::Pem { private: Some(pem), .. }, Family::Ec) => {
                EncodingKey::from_ec_pem(pem).map_err(invalid_key)
            }
            (Self::Pem { private: Some(pem), .. }, Family::Ed) => {
                EncodingKey::from_ed_pem(pem).map_err(invalid_key)
            }
            _ => Err(mismatch(algorithm)),
        }
    }

    pub(crate) fn decoding_key(&self, algorithm: Algorithm) -> Result<DecodingKey, SignatureError> {
        let family = Family::of_checked(algorithm)?;
        match (self, family) {
            (Self::Secret(secret), Family::Hmac) => {
                non_empty(secret)?;
                Ok(DecodingKey::from_secret(secret))
            }
            (Self::Pem { public, .. }, Family::Rsa) => {
                DecodingKey::from_rsa_pem(public).map_err(invalid_key)
            }
            (Self::Pem { public, .. }, Family::Ec) => {
                DecodingKey::from_ec_pem(public).map_err(invalid_key)
            }
            (Self::Pem { public, .. }, Family::Ed) => {
                DecodingKey::from_ed_pem(public).map_err(invalid_key)
            }
            _ => Err(mismatch(algorithm)),
        }
    }
}

impl From<&str> for KeyMaterial {
    fn from(secret: &str) -> Self {
        Self::secret(secret)
    }
}

impl From<String> for KeyMaterial {
    fn from(secret: String) -> Self {
        Self::secret(secret)
    }
}

impl From<&[u8]> for KeyMaterial {
    fn from(secret: &[u8]) -> Self {
        Self::secret(secret)
    }
}

fn non_empty(secret: &[u8]) -> Result<(), SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::InvalidKey(
            "secret must be non-empty".to_owned(),
        ));
    }
    Ok(())
}

#[allow(clippy::needless_pass_by_value)]
fn invalid_key(error: jsonwebtoken::errors::Error) -> SignatureError {
    SignatureError::InvalidKey(error.to_string())
}

fn mismatch(algorithm: Algorithm) -> SignatureError {
    SignatureError::InvalidKey(format!("key type does not match algorithm {algorithm:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_builds_hmac_keys() {
        let key = KeyMaterial::from("mykey");
        assert!(key.encoding_key(Algorithm::HS256).is_ok());
        assert!(key.decoding_key(Algorithm::HS512).is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let key = KeyMaterial::secret(Vec::<u8>::new());
        let result = key.encoding_key(Algorithm::HS256);
        assert!(matches!(
            result,
            Err(SignatureError::InvalidKey(message)) if message == "secret must be non-empty"
        ));
    }

    #[test]
    fn test_secret_with_rsa_algorithm_is_mismatch() {
        let key = KeyMaterial::from("mykey");
        assert!(matches!(
            key.encoding_key(Algorithm::RS256),
            Err(SignatureError::InvalidKey(_))
        ));
        assert!(matches!(
            key.decoding_key(Algorithm::ES256),
            Err(SignatureError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_public_pem_cannot_sign() {
        let key = KeyMaterial::public_pem("-----BEGIN PUBLIC KEY-----");
        let result = key.encoding_key(Algorithm::RS256);
        assert!(matches!(
            result,
            Err(SignatureError::InvalidKey(message)) if message == "no private key available for signing"
        ));
    }

    #[test]
    fn test_invalid_pem_rejected() {
        let key = KeyMaterial::pem_pair("not a pem", "not a pem");
        assert!(matches!(
            key.encoding_key(Algorithm::RS256),
            Err(SignatureError::InvalidKey(_))
        ));
        assert!(matches!(
            key.decoding_key(Algorithm::RS256),
            Err(SignatureError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_pem_with_hmac_algorithm_is_mismatch() {
        let key = KeyMaterial::public_pem("irrelevant");
        assert!(matches!(
            key.decoding_key(Algorithm::HS256),
            Err(SignatureError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", KeyMaterial::from("super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("REDACTED"));
    }
}
