use std::sync::Arc;

use komikai_auth_types::token::{SessionInfo, SessionSigner};

use crate::domain::repository::RateLimiter;
use crate::domain::types::RateScope;
use crate::error::AuthServiceError;

// ── Authorize ────────────────────────────────────────────────────────────────

/// Resolve the session behind a request token.
pub struct AuthorizeUseCase {
    pub signer: Arc<SessionSigner>,
}

impl AuthorizeUseCase {
    /// A missing token and an invalid one both yield `Unauthenticated`.
    pub fn execute(&self, token: Option<&str>) -> Result<SessionInfo, AuthServiceError> {
        token
            .and_then(|t| self.signer.verify(t))
            .ok_or(AuthServiceError::Unauthenticated)
    }
}

// ── AuthorizeProcessing ──────────────────────────────────────────────────────

/// Authorize a processing request and count it against `process:<email>`.
pub struct AuthorizeProcessingUseCase<R: RateLimiter> {
    pub signer: Arc<SessionSigner>,
    pub limiter: R,
}

impl<R: RateLimiter> AuthorizeProcessingUseCase<R> {
    pub fn execute(&self, token: Option<&str>) -> Result<SessionInfo, AuthServiceError> {
        let session = AuthorizeUseCase {
            signer: Arc::clone(&self.signer),
        }
        .execute(token)?;

        let key = RateScope::Process.key(&session.email);
        if !self.limiter.check(&key) {
            return Err(AuthServiceError::RateLimited(self.limiter.info(&key)));
        }
        Ok(session)
    }
}
