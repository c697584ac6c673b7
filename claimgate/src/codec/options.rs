//! Options relayed to the signing primitive.
//!
//! Apart from `access_token`, the codec never reads these itself. They are
//! translated one-to-one into a `jsonwebtoken` [`Header`] when issuing and a
//! [`Validation`] when decoding.

use jsonwebtoken::{Algorithm, Header, Validation};

/// Pass-through configuration for the signing primitive.
///
/// The defaults match `jsonwebtoken`'s own, except that no registered claim
/// is required: a payload only has to carry `exp` if the schema or these
/// options ask for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoOptions {
    /// `kid` header parameter for issued tokens.
    pub kid: Option<String>,
    /// `typ` header parameter for issued tokens.
    pub typ: Option<String>,
    /// `cty` header parameter for issued tokens.
    pub cty: Option<String>,
    /// Check the signature when decoding. Disable only in tests.
    pub verify_signature: bool,
    pub validate_exp: bool,
    pub validate_nbf: bool,
    /// Reject tokens carrying an `aud` claim when `audience` is unset.
    pub validate_aud: bool,
    /// Clock skew tolerance, in seconds, for `exp` and `nbf`.
    pub leeway: u64,
    pub audience: Option<Vec<String>>,
    pub issuer: Option<Vec<String>>,
    pub subject: Option<String>,
    /// Registered claims (`exp`, `nbf`, `aud`, `iss`, `sub`) that must be
    /// present.
    pub required_spec_claims: Vec<String>,
    /// Access token bound to the token through an `at_hash` claim. Written
    /// when issuing, checked when verifying.
    pub access_token: Option<String>,
}

impl Default for CryptoOptions {
    fn default() -> Self {
        Self {
            kid: None,
            typ: Some("JWT".to_owned()),
            cty: None,
            verify_signature: true,
            validate_exp: true,
            validate_nbf: false,
            validate_aud: true,
            leeway: 60,
            audience: None,
            issuer: None,
            subject: None,
            required_spec_claims: Vec::new(),
            access_token: None,
        }
    }
}

impl CryptoOptions {
    #[must_use]
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Decode without checking the signature.
    #[must_use]
    pub const fn without_signature_verification(mut self) -> Self {
        self.verify_signature = false;
        self
    }

    #[must_use]
    pub fn with_audience<S: Into<String>>(mut self, audience: impl IntoIterator<Item = S>) -> Self {
        self.audience = Some(audience.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_issuer<S: Into<String>>(mut self, issuer: impl IntoIterator<Item = S>) -> Self {
        self.issuer = Some(issuer.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn require<S: Into<String>>(mut self, claims: impl IntoIterator<Item = S>) -> Self {
        self.required_spec_claims
            .extend(claims.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    #[must_use]
    pub const fn with_leeway(mut self, seconds: u64) -> Self {
        self.leeway = seconds;
        self
    }

    pub(crate) fn header(&self, algorithm: Algorithm) -> Header {
        let mut header = Header::new(algorithm);
        header.typ.clone_from(&self.typ);
        header.kid.clone_from(&self.kid);
        header.cty.clone_from(&self.cty);
        header
    }

    pub(crate) fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims(&self.required_spec_claims);
        validation.validate_exp = self.validate_exp;
        validation.validate_nbf = self.validate_nbf;
        validation.validate_aud = self.validate_aud;
        validation.leeway = self.leeway;
        if let Some(audience) = &self.audience {
            validation.set_audience(audience);
        }
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(issuer);
        }
        validation.sub.clone_from(&self.subject);
        if !self.verify_signature {
            validation.insecure_disable_signature_validation();
        }
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_header_is_typed_jwt() {
        let header = CryptoOptions::default().header(Algorithm::HS256);
        assert_eq!(header.typ.as_deref(), Some("JWT"));
        assert_eq!(header.alg, Algorithm::HS256);
        assert!(header.kid.is_none());
    }

    #[test]
    fn test_header_relays_kid() {
        let header = CryptoOptions::default()
            .with_kid("key-1")
            .header(Algorithm::HS384);
        assert_eq!(header.kid.as_deref(), Some("key-1"));
        assert_eq!(header.alg, Algorithm::HS384);
    }

    #[test]
    fn test_default_validation_requires_no_claims() {
        let validation = CryptoOptions::default().validation(Algorithm::HS256);
        assert!(validation.required_spec_claims.is_empty());
        assert_eq!(validation.algorithms, vec![Algorithm::HS256]);
        assert!(validation.validate_exp);
        assert_eq!(validation.leeway, 60);
    }

    #[test]
    fn test_validation_relays_knobs() {
        let options = CryptoOptions::default()
            .with_issuer(["issuer-a"])
            .with_subject("alice")
            .require(["exp"])
            .with_leeway(0);
        let validation = options.validation(Algorithm::HS512);

        assert!(validation.required_spec_claims.contains("exp"));
        assert_eq!(validation.sub.as_deref(), Some("alice"));
        assert!(validation
            .iss
            .as_ref()
            .is_some_and(|iss| iss.contains("issuer-a")));
        assert_eq!(validation.leeway, 0);
    }
}
