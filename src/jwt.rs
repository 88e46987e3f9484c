//! JWT token issuance and verification.
//!
//! Both access and refresh tokens are stateless HS256 tokens signed with a
//! single process-wide secret. Validity is determined solely by signature
//! and expiry; there is no server-side revocation list.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default access token lifetime: 1 minute.
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 60;

/// Default refresh token lifetime: 30 days.
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Signed token payload. The `userId` field name is part of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User UUID
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Token lifetimes. Policy, not constants: both are CLI-configurable.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            access_ttl_secs: DEFAULT_ACCESS_TTL_SECS,
            refresh_ttl_secs: DEFAULT_REFRESH_TTL_SECS,
        }
    }
}

/// Time source for token issuance and expiry checks.
/// Injected so the expiry boundary is testable with a fixed clock.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in seconds.
    fn now(&self) -> u64;
}

/// Wall-clock time source used in production.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        // A pre-epoch system clock yields 0; tokens then fail verification.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    policy: TokenPolicy,
    clock: Arc<dyn Clock>,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and policy.
    pub fn new(secret: &[u8], policy: TokenPolicy) -> Self {
        Self::with_clock(secret, policy, Arc::new(SystemClock))
    }

    /// Create a JWT configuration with an explicit time source.
    pub fn with_clock(secret: &[u8], policy: TokenPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Sign a token for a user with the given lifetime.
    pub fn issue(&self, user_id: &str, ttl_secs: u64) -> Result<String, JwtError> {
        let now = self.clock.now();
        let claims = Claims {
            user_id: user_id.to_string(),
            iat: now,
            exp: now + ttl_secs,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)
    }

    /// Issue a short-lived access token.
    pub fn issue_access_token(&self, user_id: &str) -> Result<String, JwtError> {
        self.issue(user_id, self.policy.access_ttl_secs)
    }

    /// Issue a long-lived refresh token.
    pub fn issue_refresh_token(&self, user_id: &str) -> Result<String, JwtError> {
        self.issue(user_id, self.policy.refresh_ttl_secs)
    }

    /// Verify signature and expiry, returning the decoded claims.
    ///
    /// Expiry is checked against the injected clock rather than
    /// jsonwebtoken's internal validation. `Decoding` and `Expired` stay
    /// distinct for diagnostics; callers collapse both to 401.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(JwtError::Decoding)?;

        if self.clock.now() >= token_data.claims.exp {
            return Err(JwtError::Expired);
        }

        Ok(token_data.claims)
    }
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Bad signature or malformed token
    Decoding(jsonwebtoken::errors::Error),
    /// Token past its embedded expiry
    Expired,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::Expired => write!(f, "Token expired"),
        }
    }
}

impl std::error::Error for JwtError {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed time source for expiry boundary tests.
    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    const SECRET: &[u8] = b"test-secret-key-for-testing";

    #[test]
    fn test_issue_and_verify_round_trip() {
        let config = JwtConfig::new(SECRET, TokenPolicy::default());

        let token = config.issue_access_token("uuid-123").unwrap();
        let claims = config.verify(&token).unwrap();

        assert_eq!(claims.user_id, "uuid-123");
        assert_eq!(claims.exp - claims.iat, DEFAULT_ACCESS_TTL_SECS);
    }

    #[test]
    fn test_refresh_token_uses_refresh_ttl() {
        let policy = TokenPolicy {
            access_ttl_secs: 60,
            refresh_ttl_secs: 3600,
        };
        let config = JwtConfig::new(SECRET, policy);

        let token = config.issue_refresh_token("uuid-123").unwrap();
        let claims = config.verify(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued_at = 1_000_000;
        let issuer = JwtConfig::with_clock(
            SECRET,
            TokenPolicy::default(),
            Arc::new(FixedClock(issued_at)),
        );
        let token = issuer.issue("uuid-123", 60).unwrap();

        // One second before expiry: still valid.
        let verifier = JwtConfig::with_clock(
            SECRET,
            TokenPolicy::default(),
            Arc::new(FixedClock(issued_at + 59)),
        );
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.user_id, "uuid-123");

        // At expiry: rejected.
        let verifier = JwtConfig::with_clock(
            SECRET,
            TokenPolicy::default(),
            Arc::new(FixedClock(issued_at + 60)),
        );
        assert!(matches!(verifier.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let config = JwtConfig::new(SECRET, TokenPolicy::default());

        assert!(matches!(
            config.verify("not-a-token"),
            Err(JwtError::Decoding(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config1 = JwtConfig::new(b"secret-1", TokenPolicy::default());
        let config2 = JwtConfig::new(b"secret-2", TokenPolicy::default());

        let token = config1.issue_access_token("uuid-123").unwrap();
        assert!(matches!(
            config2.verify(&token),
            Err(JwtError::Decoding(_))
        ));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let config = JwtConfig::new(SECRET, TokenPolicy::default());

        let mut token = config.issue_access_token("uuid-123").unwrap();
        token.push('x');

        assert!(config.verify(&token).is_err());
    }
}
