//! Session token minting and verification.
//!
//! A session token is a compact HS256 JWT: `header.payload.signature`, each
//! segment base64url-encoded, the signature an HMAC-SHA256 over
//! `header.payload` keyed with the process-wide session secret. Nothing is
//! stored server-side; the token alone proves the session.

use chrono::{DateTime, Utc};
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
use serde::Serialize;

use komikai_core::clock::SharedClock;

/// Canonical session lifetime in seconds (7 days). Also the cookie Max-Age.
pub const SESSION_TTL_SECS: i64 = 604_800;

/// `iss` claim stamped on every session token.
pub const SESSION_ISSUER: &str = "komikai";

/// Identity carried by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub email: String,
    pub name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Why a token could not be minted or was rejected.
///
/// Only the auth service sees these when minting. Verification folds every
/// variant into `None` (see [`SessionSigner::verify`]).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("session secret not configured")]
    MissingSecret,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("token encoding failed")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

/// JWT claims payload of a session token.
///
/// | Field  | Meaning                                   |
/// |--------|-------------------------------------------|
/// | `sub`  | normalized email (identity)               |
/// | `name` | display name shown in the UI              |
/// | `iat`  | issued-at, seconds since the UNIX epoch   |
/// | `exp`  | expiry, seconds since the UNIX epoch      |
/// | `iss`  | always [`SESSION_ISSUER`]                 |
///
/// [`Serialize`] requires the **`USE_ONLY_IN_AUTH_SERVICE`** feature; only the
/// auth service mints sessions.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test), derive(Serialize))]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

struct SigningKeys {
    #[cfg_attr(not(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test)), allow(dead_code))]
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Mints and verifies session tokens with the process-wide secret.
///
/// Built once at startup. Without a secret the signer fails closed: every
/// token is rejected and nothing can be minted.
pub struct SessionSigner {
    keys: Option<SigningKeys>,
    clock: SharedClock,
}

impl SessionSigner {
    /// An absent or empty secret leaves the signer unconfigured.
    pub fn new(secret: Option<&str>, clock: SharedClock) -> Self {
        let keys = secret.filter(|s| !s.is_empty()).map(|s| SigningKeys {
            encoding: EncodingKey::from_secret(s.as_bytes()),
            decoding: DecodingKey::from_secret(s.as_bytes()),
        });
        if keys.is_none() {
            tracing::warn!("session secret not configured, every session token will be rejected");
        }
        Self { keys, clock }
    }

    pub fn is_configured(&self) -> bool {
        self.keys.is_some()
    }

    /// Verify a token and return its identity.
    ///
    /// `None` for any failure: missing secret, wrong segment count, bad
    /// signature, undecodable payload, non-string identity, or expiry. The
    /// reason is only logged at debug level.
    pub fn verify(&self, token: &str) -> Option<SessionInfo> {
        match self.decode_session(token) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::debug!(reason = %e, "session token rejected");
                None
            }
        }
    }

    fn decode_session(&self, token: &str) -> Result<SessionInfo, AuthError> {
        let keys = self.keys.as_ref().ok_or(AuthError::MissingSecret)?;
        if token.split('.').count() != 3 {
            return Err(AuthError::Malformed);
        }

        let claims = decode::<SessionClaims>(token, &keys.decoding, &validation())
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Malformed,
            })?
            .claims;

        // `exp == now` counts as expired so a zero-lifetime token is never valid.
        if claims.exp <= self.clock.now().timestamp() {
            return Err(AuthError::Expired);
        }

        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(AuthError::Malformed)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::Malformed)?;
        Ok(SessionInfo {
            email: claims.sub,
            name: claims.name,
            issued_at,
            expires_at,
        })
    }

    /// Mint a token for `email` valid for `ttl` from now.
    ///
    /// `exp` is whole seconds, rounded up for a positive `ttl`; a zero `ttl`
    /// yields a token that is already expired.
    ///
    /// Requires the `USE_ONLY_IN_AUTH_SERVICE` feature.
    #[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
    pub fn create(&self, email: &str, name: &str, ttl: Duration) -> Result<String, AuthError> {
        self.create_with_expiry(email, name, ttl).map(|(token, _)| token)
    }

    /// Like [`create`](Self::create), also returning the `exp` instant.
    #[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
    pub fn create_with_expiry(
        &self,
        email: &str,
        name: &str,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let keys = self.keys.as_ref().ok_or(AuthError::MissingSecret)?;
        let now = self.clock.now();
        let iat = now.timestamp();
        // Claims carry whole seconds; round a positive expiry up so a token
        // minted mid-second still lives at least `ttl`.
        let exp = if ttl > Duration::zero() {
            let expires = now + ttl;
            expires.timestamp() + i64::from(expires.timestamp_subsec_nanos() > 0)
        } else {
            iat
        };
        let claims = SessionClaims {
            sub: email.to_owned(),
            name: name.to_owned(),
            iat,
            exp,
            iss: SESSION_ISSUER.to_owned(),
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::new(Algorithm::HS256),
            &claims,
            &keys.encoding,
        )
        .map_err(AuthError::Encoding)?;
        let expires_at = DateTime::from_timestamp(exp, 0).unwrap_or(now + ttl);
        Ok((token, expires_at))
    }
}

/// HS256 only, `sub` + `exp` required, issuer pinned. Expiry is checked
/// against the injected clock instead of the library's wall-clock check.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation
}
