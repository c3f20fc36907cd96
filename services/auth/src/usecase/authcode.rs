use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::RngExt;

use komikai_auth_types::token::{SESSION_TTL_SECS, SessionSigner};

use crate::domain::repository::{CodeMailer, CodeStore, RateLimiter, UserDirectory};
use crate::domain::types::{
    FALLBACK_DISPLAY_NAME, RateScope, VERIFICATION_CODE_LEN, VERIFICATION_CODE_TTL_SECS,
};
use crate::error::AuthServiceError;

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..VERIFICATION_CODE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Trim and lower-case an email so it can be used as an identity key.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Loose shape check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Exactly six ASCII digits.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == VERIFICATION_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Configured name, else the email's local part, else a generic fallback.
pub fn resolve_display_name<U: UserDirectory>(users: &U, email: &str) -> String {
    users
        .display_name(email)
        .or_else(|| {
            email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_owned())
}

// ── RequestCode (login) ──────────────────────────────────────────────────────

pub struct RequestCodeInput {
    pub email: String,
}

pub struct RequestCodeUseCase<U, C, R, M>
where
    U: UserDirectory,
    C: CodeStore,
    R: RateLimiter,
    M: CodeMailer,
{
    pub users: U,
    pub codes: C,
    pub limiter: R,
    pub mailer: M,
}

impl<U, C, R, M> RequestCodeUseCase<U, C, R, M>
where
    U: UserDirectory,
    C: CodeStore,
    R: RateLimiter,
    M: CodeMailer,
{
    /// Returns the normalized email the code was sent to.
    pub async fn execute(&self, input: RequestCodeInput) -> Result<String, AuthServiceError> {
        // 1. Normalize + shape check → 400
        let email = normalize_email(&input.email);
        if !is_valid_email(&email) {
            return Err(AuthServiceError::InvalidEmail);
        }

        // 2. Allow-list → 403
        if !self.users.is_allowed(&email) {
            return Err(AuthServiceError::UserNotAllowed);
        }

        // 3. Login quota → 429
        let key = RateScope::Login.key(&email);
        if !self.limiter.check(&key) {
            return Err(AuthServiceError::RateLimited(self.limiter.info(&key)));
        }

        // 4. Issue (replacing any earlier code) and hand to the mailer
        let code = generate_code();
        self.codes
            .issue(&email, &code, Duration::seconds(VERIFICATION_CODE_TTL_SECS));
        self.mailer.send_login_code(&email, &code).await?;

        Ok(email)
    }
}

// ── VerifyCode ───────────────────────────────────────────────────────────────

pub struct VerifyCodeInput {
    pub email: String,
    pub code: String,
}

#[derive(Debug)]
pub struct VerifyCodeOutput {
    pub email: String,
    pub name: String,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct VerifyCodeUseCase<U, C>
where
    U: UserDirectory,
    C: CodeStore,
{
    pub users: U,
    pub codes: C,
    pub signer: Arc<SessionSigner>,
}

impl<U, C> VerifyCodeUseCase<U, C>
where
    U: UserDirectory,
    C: CodeStore,
{
    pub fn execute(&self, input: VerifyCodeInput) -> Result<VerifyCodeOutput, AuthServiceError> {
        let email = normalize_email(&input.email);
        let code = input.code.trim();

        // Unknown user, malformed code and wrong/expired code look the same.
        if !self.users.is_allowed(&email) || !is_valid_code(code) {
            return Err(AuthServiceError::InvalidCode);
        }
        if !self.codes.consume(&email, code) {
            return Err(AuthServiceError::InvalidCode);
        }

        let name = resolve_display_name(&self.users, &email);
        let (session_token, expires_at) = self
            .signer
            .create_with_expiry(&email, &name, Duration::seconds(SESSION_TTL_SECS))
            .map_err(|e| AuthServiceError::Internal(e.into()))?;

        tracing::info!(email = %email, "session issued");
        Ok(VerifyCodeOutput {
            email,
            name,
            session_token,
            expires_at,
        })
    }
}
