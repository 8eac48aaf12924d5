use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{AuthError, Result, VerifyError};
use crate::model::Role;

/// Default token lifetime: one hour
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

/// Process-wide HMAC secret shared by issuer and verifier
#[derive(Clone)]
pub struct SigningSecret(String);

impl SigningSecret {
    /// Wrap a secret, rejecting an empty or blank value
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AuthError::Configuration(
                "token signing secret is not set".to_string(),
            ));
        }
        Ok(Self(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (principal ID)
    pub sub: String,
    /// Principal role, absent for tokens minted without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Unique token ID
    pub jti: String,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

/// Claims embedded next to the subject
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraClaims {
    pub role: Option<Role>,
    pub name: Option<String>,
}

impl ExtraClaims {
    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Claims {
    /// Create claims for `subject` valid for `ttl` from `issued_at`.
    /// Fails when the expiry falls outside the representable time range.
    pub fn new(
        subject: String,
        extra: ExtraClaims,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<Self> {
        let expires_at = issued_at.checked_add_signed(ttl).ok_or_else(|| {
            AuthError::Configuration(format!(
                "token lifetime of {}s overflows the expiry time",
                ttl.num_seconds()
            ))
        })?;

        Ok(Self {
            sub: subject,
            role: extra.role,
            name: extra.name,
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// A token is valid only while `now` is strictly before its expiry
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == Some(role)
    }
}

/// Mints signed, time-bounded bearer tokens
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &SigningSecret, ttl_seconds: i64) -> Result<Self> {
        if ttl_seconds <= 0 {
            return Err(AuthError::Configuration(format!(
                "token lifetime must be positive, got {ttl_seconds}s"
            )));
        }

        let ttl = Duration::try_seconds(ttl_seconds).ok_or_else(|| {
            AuthError::Configuration(format!("token lifetime of {ttl_seconds}s is out of range"))
        })?;

        Ok(Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token valid for the configured lifetime from now
    pub fn issue(&self, subject: &str, extra: ExtraClaims) -> Result<String> {
        self.issue_at(subject, extra, Utc::now(), self.ttl)
    }

    /// Issue a token with an explicit issue time and lifetime
    pub fn issue_at(
        &self,
        subject: &str,
        extra: ExtraClaims,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<String> {
        let claims = Claims::new(subject.to_string(), extra, issued_at, ttl)?;

        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::Configuration(format!("token signing failed: {e}")))
    }
}

/// Validates bearer tokens without touching any store
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `verify_at`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token against the current time
    pub fn verify(&self, token: &str) -> std::result::Result<Claims, VerifyError> {
        self.verify_at(token, Utc::now())
    }

    /// Validate a token against `now`.
    /// The signature is checked before the expiry.
    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Claims, VerifyError> {
        if token.is_empty() {
            return Err(VerifyError::Missing);
        }

        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => VerifyError::BadSignature,
                ErrorKind::ExpiredSignature => VerifyError::Expired,
                _ => VerifyError::Malformed,
            })?
            .claims;

        if claims.is_expired_at(now) {
            return Err(VerifyError::Expired);
        }

        Ok(claims)
    }
}

/// Pull the token out of an `Authorization` header value.
/// The scheme word must be exactly `Bearer`.
pub fn extract_bearer(header: Option<&str>) -> std::result::Result<&str, VerifyError> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(VerifyError::Missing)
}
