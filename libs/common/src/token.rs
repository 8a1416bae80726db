//! Access token claims and verification shared by the services
//!
//! The auth service signs RS256 tokens with its private key; every service
//! verifies them with the public key loaded here.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Employee ID
    pub sub: Uuid,
    /// Employee role (`root`, `hr`, `hr_manager`, `accountant`, `employee`)
    pub role: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Errors raised while loading keys or verifying tokens
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("{0} environment variable not set")]
    MissingKey(&'static str),

    #[error("Failed to read key file {path}: {source}")]
    KeyFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Resolve key material that is either inline PEM or a path to a PEM file.
///
/// Relative paths are tried from the working directory first, then from the
/// workspace root.
pub fn resolve_key_material(value: &str) -> Result<String, TokenError> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    std::fs::read_to_string(value)
        .or_else(|_| {
            let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push("../..");
            path.push(value);
            std::fs::read_to_string(path)
        })
        .map(|pem| pem.trim().to_string())
        .map_err(|source| TokenError::KeyFile {
            path: value.to_string(),
            source,
        })
}

/// Verifies RS256 access tokens
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from a PEM encoded RSA public key
    pub fn from_public_key(pem: &str) -> Result<Self, TokenError> {
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// Build a verifier from `JWT_PUBLIC_KEY` (inline PEM or file path)
    pub fn from_env() -> Result<Self, TokenError> {
        let raw = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| TokenError::MissingKey("JWT_PUBLIC_KEY"))?;
        let pem = resolve_key_material(&raw)?;
        Self::from_public_key(&pem)
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_pem_is_returned_verbatim() {
        let pem = "-----BEGIN PUBLIC KEY-----\nabc\n-----END PUBLIC KEY-----";
        assert_eq!(resolve_key_material(pem).unwrap(), pem);
    }

    #[test]
    fn missing_key_file_is_reported() {
        let result = resolve_key_material("keys/does-not-exist.pem");
        assert!(matches!(result, Err(TokenError::KeyFile { .. })));
    }

    #[test]
    fn garbage_public_key_is_rejected() {
        let result = TokenVerifier::from_public_key("not a key");
        assert!(matches!(result, Err(TokenError::Jwt(_))));
    }
}
