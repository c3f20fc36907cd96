use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use komikai_auth_types::token::SessionSigner;
use komikai_core::clock::{SharedClock, SystemClock};

use crate::config::AuthConfig;
use crate::domain::repository::{CodeMailer, RateLimiter, Sweep};
use crate::domain::types::{
    CODE_SWEEP_INTERVAL_SECS, RATE_LIMIT_SWEEP_INTERVAL_SECS, RateLimiterStatus,
};
use crate::infra::code_store::MemoryCodeStore;
use crate::infra::rate_limit::MemoryRateLimiter;
use crate::infra::sweeper::{SweeperHandle, spawn_sweeper};
use crate::infra::users::AllowedUsers;
use crate::usecase::authcode::{RequestCodeUseCase, VerifyCodeUseCase};
use crate::usecase::session::{AuthorizeProcessingUseCase, AuthorizeUseCase};

/// Owner of all auth state, created once at process start and handed to the
/// request layer. Clones share the same stores.
#[derive(Clone)]
pub struct AuthCore {
    clock: SharedClock,
    signer: Arc<SessionSigner>,
    users: Arc<AllowedUsers>,
    codes: MemoryCodeStore,
    limiter: MemoryRateLimiter,
    sweep_enabled: bool,
}

/// Running background sweepers; dropping this stops them.
pub struct Sweepers {
    pub codes: SweeperHandle,
    pub rate_limits: SweeperHandle,
}

/// Diagnostic snapshot for a status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    pub active_codes: usize,
    pub rate_limit: RateLimiterStatus,
}

impl AuthCore {
    /// Build from environment configuration with the wall clock.
    pub fn init(config: &AuthConfig) -> anyhow::Result<Self> {
        let users = AllowedUsers::from_path(&config.allowed_users_path)?;
        let core = Self::new(users, config.session_secret.as_deref(), SystemClock::shared())
            .with_sweep_enabled(config.sweep_enabled);
        tracing::info!(
            users = core.users.len(),
            signing = core.signer.is_configured(),
            sweep_enabled = core.sweep_enabled,
            "auth core initialized"
        );
        Ok(core)
    }

    pub fn new(users: AllowedUsers, session_secret: Option<&str>, clock: SharedClock) -> Self {
        Self {
            signer: Arc::new(SessionSigner::new(session_secret, Arc::clone(&clock))),
            users: Arc::new(users),
            codes: MemoryCodeStore::new(Arc::clone(&clock)),
            limiter: MemoryRateLimiter::new(Arc::clone(&clock)),
            clock,
            sweep_enabled: true,
        }
    }

    pub fn with_sweep_enabled(mut self, enabled: bool) -> Self {
        self.sweep_enabled = enabled;
        self
    }

    pub fn clock(&self) -> SharedClock {
        Arc::clone(&self.clock)
    }

    pub fn signer(&self) -> Arc<SessionSigner> {
        Arc::clone(&self.signer)
    }

    pub fn users(&self) -> Arc<AllowedUsers> {
        Arc::clone(&self.users)
    }

    pub fn code_store(&self) -> MemoryCodeStore {
        self.codes.clone()
    }

    pub fn rate_limiter(&self) -> MemoryRateLimiter {
        self.limiter.clone()
    }

    pub fn request_code<M: CodeMailer>(
        &self,
        mailer: M,
    ) -> RequestCodeUseCase<Arc<AllowedUsers>, MemoryCodeStore, MemoryRateLimiter, M> {
        RequestCodeUseCase {
            users: self.users(),
            codes: self.code_store(),
            limiter: self.rate_limiter(),
            mailer,
        }
    }

    pub fn verify_code(&self) -> VerifyCodeUseCase<Arc<AllowedUsers>, MemoryCodeStore> {
        VerifyCodeUseCase {
            users: self.users(),
            codes: self.code_store(),
            signer: self.signer(),
        }
    }

    pub fn authorize(&self) -> AuthorizeUseCase {
        AuthorizeUseCase {
            signer: self.signer(),
        }
    }

    pub fn authorize_processing(&self) -> AuthorizeProcessingUseCase<MemoryRateLimiter> {
        AuthorizeProcessingUseCase {
            signer: self.signer(),
            limiter: self.rate_limiter(),
        }
    }

    /// Spawn both sweepers, or `None` when sweeping is disabled.
    pub fn start_sweepers(&self) -> Option<Sweepers> {
        if !self.sweep_enabled {
            tracing::info!("background sweepers disabled");
            return None;
        }
        Some(Sweepers {
            codes: spawn_sweeper(
                self.code_store(),
                Duration::from_secs(CODE_SWEEP_INTERVAL_SECS),
                "codes",
            ),
            rate_limits: spawn_sweeper(
                self.rate_limiter(),
                Duration::from_secs(RATE_LIMIT_SWEEP_INTERVAL_SECS),
                "rate_limits",
            ),
        })
    }

    /// Sweep expired codes, then report code and rate-limit counts.
    pub fn status(&self) -> AuthStatus {
        self.codes.sweep();
        AuthStatus {
            active_codes: self.codes.len(),
            rate_limit: self.limiter.status(),
        }
    }
}
