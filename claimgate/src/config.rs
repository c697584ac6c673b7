//! Server configuration module.
//!
//! This module provides configuration loading for the claimgate server from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `CLAIMGATE_SECRET`: HMAC secret tokens are verified with (required)
//! - `CLAIMGATE_SCHEMA_PATH`: JSON schema definition file (required)
//! - `CLAIMGATE_HEADER_NAME`: Header carrying the token (default: `jwt`)
//! - `CLAIMGATE_ALGORITHM`: `HS256`, `HS384` or `HS512` (default: `HS256`)
//! - `CLAIMGATE_LISTEN_PORT`: Port to listen on (default: `3000`)
//! - `CLAIMGATE_REJECTION_FORMAT`: `text` or `json` (default: `text`)
//!
//! # Invariants
//!
//! - `secret` is never empty
//! - `algorithm` is always in the HMAC family
//! - `listen_port` is always a valid port number

use std::path::PathBuf;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

/// How rejections are encoded by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectionFormat {
    /// `text/plain` body with the reason.
    #[default]
    Text,
    /// `{"bad_token": "<reason>"}`.
    Json,
}

/// Server configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()`, every invariant listed on the module
/// holds.
#[derive(Clone)]
pub struct ServerConfig {
    /// Shared secret for token verification.
    pub secret: Vec<u8>,
    /// Path of the schema definition tokens must satisfy.
    pub schema_path: PathBuf,
    /// Header carrying the token.
    pub header_name: String,
    pub algorithm: Algorithm,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
    pub rejection_format: RejectionFormat,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("secret", &"[REDACTED]")
            .field("schema_path", &self.schema_path)
            .field("header_name", &self.header_name)
            .field("algorithm", &self.algorithm)
            .field("listen_port", &self.listen_port)
            .field("rejection_format", &self.rejection_format)
            .finish()
    }
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 3000;
    /// Default token header.
    pub const DEFAULT_HEADER_NAME: &'static str = "jwt";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `CLAIMGATE_SECRET` or `CLAIMGATE_SCHEMA_PATH` is not set or is empty
    /// - any optional variable is set to an invalid value
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = required(&lookup, "CLAIMGATE_SECRET")?.into_bytes();
        let schema_path = PathBuf::from(required(&lookup, "CLAIMGATE_SCHEMA_PATH")?);
        let header_name = lookup("CLAIMGATE_HEADER_NAME")
            .unwrap_or_else(|| Self::DEFAULT_HEADER_NAME.to_owned());
        let algorithm = Self::load_algorithm(&lookup)?;
        let listen_port = Self::load_listen_port(&lookup)?;
        let rejection_format = Self::load_rejection_format(&lookup)?;

        Ok(Self {
            secret,
            schema_path,
            header_name,
            algorithm,
            listen_port,
            rejection_format,
        })
    }

    /// Load the signing algorithm. Only the HMAC family fits a shared secret.
    fn load_algorithm(lookup: &impl Fn(&str) -> Option<String>) -> Result<Algorithm, ConfigError> {
        let Some(value) = lookup("CLAIMGATE_ALGORITHM") else {
            return Ok(Algorithm::HS256);
        };
        match Algorithm::from_str(&value) {
            Ok(algorithm @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => {
                Ok(algorithm)
            }
            _ => Err(ConfigError::InvalidValue {
                name: "CLAIMGATE_ALGORITHM".to_owned(),
                message: format!("'{value}' is not one of HS256, HS384, HS512"),
            }),
        }
    }

    /// Load the listen port from environment.
    ///
    /// Returns the default if not set.
    fn load_listen_port(lookup: &impl Fn(&str) -> Option<String>) -> Result<u16, ConfigError> {
        match lookup("CLAIMGATE_LISTEN_PORT") {
            Some(value) => match value.parse::<u16>() {
                Ok(port) if port > 0 => Ok(port),
                _ => Err(ConfigError::InvalidValue {
                    name: "CLAIMGATE_LISTEN_PORT".to_owned(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                }),
            },
            None => Ok(Self::DEFAULT_PORT),
        }
    }

    fn load_rejection_format(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<RejectionFormat, ConfigError> {
        match lookup("CLAIMGATE_REJECTION_FORMAT").as_deref() {
            None | Some("text") => Ok(RejectionFormat::Text),
            Some("json") => Ok(RejectionFormat::Json),
            Some(other) => Err(ConfigError::InvalidValue {
                name: "CLAIMGATE_REJECTION_FORMAT".to_owned(),
                message: format!("'{other}' is not one of text, json"),
            }),
        }
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String, ConfigError> {
    let value = lookup(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_owned()))?;
    if value.is_empty() {
        return Err(ConfigError::InvalidValue {
            name: name.to_owned(),
            message: "must not be empty".to_owned(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("CLAIMGATE_SECRET", "mykey"),
        ("CLAIMGATE_SCHEMA_PATH", "/etc/claimgate/schema.json"),
    ];

    #[test]
    fn test_default_values() {
        let config = load(&REQUIRED).expect("valid config");
        assert_eq!(config.secret, b"mykey");
        assert_eq!(config.header_name, "jwt");
        assert_eq!(config.algorithm, Algorithm::HS256);
        assert_eq!(config.listen_port, ServerConfig::DEFAULT_PORT);
        assert_eq!(config.rejection_format, RejectionFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("CLAIMGATE_HEADER_NAME", "x-token"),
            ("CLAIMGATE_ALGORITHM", "HS512"),
            ("CLAIMGATE_LISTEN_PORT", "8080"),
            ("CLAIMGATE_REJECTION_FORMAT", "json"),
        ]);
        let config = load(&vars).expect("valid config");
        assert_eq!(config.header_name, "x-token");
        assert_eq!(config.algorithm, Algorithm::HS512);
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.rejection_format, RejectionFormat::Json);
    }

    #[test]
    fn test_missing_secret() {
        let result = load(&[("CLAIMGATE_SCHEMA_PATH", "schema.json")]);
        assert_eq!(
            result.map(|_| ()),
            Err(ConfigError::MissingEnvVar("CLAIMGATE_SECRET".to_owned()))
        );
    }

    #[test]
    fn test_empty_secret() {
        let result = load(&[("CLAIMGATE_SECRET", ""), ("CLAIMGATE_SCHEMA_PATH", "s.json")]);
        assert!(matches!(result, Err(ConfigError::InvalidValue { name, .. }) if name == "CLAIMGATE_SECRET"));
    }

    #[test]
    fn test_asymmetric_algorithm_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("CLAIMGATE_ALGORITHM", "RS256"));
        assert!(matches!(load(&vars), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_invalid_port() {
        for port in ["0", "65536", "http"] {
            let mut vars = REQUIRED.to_vec();
            vars.push(("CLAIMGATE_LISTEN_PORT", port));
            assert!(matches!(load(&vars), Err(ConfigError::InvalidValue { .. })));
        }
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::MissingEnvVar("TEST_VAR".to_string());
        assert_eq!(
            error.to_string(),
            "missing required environment variable: TEST_VAR"
        );
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = load(&REQUIRED).expect("valid config");
        assert!(!format!("{config:?}").contains("mykey"));
    }
}
