/// Shared JWT module for newsletter services
///
/// Session tokens are HS256-signed with a shared secret (`JWT_SECRET`). The same
/// token is returned in the login response body and in the `token` cookie, and is
/// accepted from either location by the auth middleware.
///
/// ## Usage
///
/// ```rust
/// use crypto_core::jwt::JwtSigner;
/// use uuid::Uuid;
///
/// let signer = JwtSigner::new("a-long-random-secret-at-least-32-bytes", 24).unwrap();
/// let token = signer.issue(Uuid::new_v4(), "user").unwrap();
/// assert!(signer.validate(&token).is_ok());
/// ```
use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// JWT algorithm used for session tokens
const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Minimum secret length accepted by [`JwtSigner::new`]
pub const MIN_SECRET_LEN: usize = 16;

// ============================================================================
// Data Structures
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Role of the user at issuance ("user" or "admin")
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Parse the subject into a user id
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
    }
}

// ============================================================================
// Signer
// ============================================================================

/// Issues and validates session tokens with a single shared secret.
///
/// Cheap to clone; the keys are derived once at construction.
#[derive(Clone)]
pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl std::fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSigner")
            .field("secret", &"[REDACTED]")
            .field("expiry_hours", &self.expiry.num_hours())
            .finish()
    }
}

impl JwtSigner {
    /// Build a signer from a shared secret and a token lifetime in hours.
    ///
    /// ## Errors
    ///
    /// Returns error if the secret is shorter than [`MIN_SECRET_LEN`] or the
    /// lifetime is not positive.
    pub fn new(secret: &str, expiry_hours: i64) -> Result<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(anyhow!(
                "JWT secret must be at least {MIN_SECRET_LEN} bytes (got {})",
                secret.len()
            ));
        }
        if expiry_hours <= 0 {
            return Err(anyhow!("JWT expiry must be positive (got {expiry_hours}h)"));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours),
        })
    }

    /// Generate a new session token for a user
    pub fn issue(&self, user_id: Uuid, role: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + self.expiry).timestamp(),
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| anyhow!("Failed to generate session token: {e}"))
    }

    /// Validate and decode a token
    ///
    /// ## Errors
    ///
    /// Returns error if:
    /// - Token signature is invalid
    /// - Token is expired
    /// - Token format is malformed
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| anyhow!("Token validation failed: {e}"))
    }

    /// Token lifetime in seconds
    pub fn expires_in(&self) -> i64 {
        self.expiry.num_seconds()
    }
}

// ============================================================================
// Tests
// ============================================================================
