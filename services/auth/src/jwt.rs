//! JWT service for access token generation
//!
//! Tokens are signed with RS256. Verification goes through the shared
//! `common::token::TokenVerifier` so both services accept the same tokens.

use anyhow::Result;
use common::token::{Claims, TokenVerifier, resolve_key_material};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use policy::models::Role;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Private key for signing tokens
    pub private_key: String,
    /// Public key for verifying tokens
    pub public_key: String,
    /// Access token expiration time in seconds (default: 8 hours, one shift)
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY`: Private key (PEM) or path to the private key file
    /// - `JWT_PUBLIC_KEY`: Public key (PEM) or path to the public key file
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 28800)
    pub fn from_env() -> Result<Self> {
        let private_key = std::env::var("JWT_PRIVATE_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PRIVATE_KEY environment variable not set"))?;
        let public_key = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(28_800);

        Ok(JwtConfig {
            private_key: resolve_key_material(&private_key)?,
            public_key: resolve_key_material(&public_key)?,
            access_token_expiry,
        })
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    verifier: TokenVerifier,
    access_token_expiry: u64,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key.as_bytes())?;
        let verifier = TokenVerifier::from_public_key(&config.public_key)?;

        Ok(JwtService {
            encoding_key,
            verifier,
            access_token_expiry: config.access_token_expiry,
        })
    }

    /// Generate an access token for an employee
    pub fn generate_access_token(&self, employee_id: Uuid, role: Role) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: employee_id,
            role: role.as_str().to_string(),
            iat: now,
            exp: now + self.access_token_expiry,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    pub fn access_token_expiry(&self) -> u64 {
        self.access_token_expiry
    }
}
