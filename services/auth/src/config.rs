use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use komikai_core::config::Config;

/// Auth core configuration loaded from environment variables.
///
/// Rate-limit windows and quotas are fixed per scope and not configurable.
#[derive(Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing session tokens. Env var: `SESSION_SECRET`.
    /// Absent or empty means every session is rejected.
    #[serde(default)]
    pub session_secret: Option<String>,
    /// JSON allow-list of users. Env var: `ALLOWED_USERS_PATH`.
    #[serde(default = "default_allowed_users_path")]
    pub allowed_users_path: PathBuf,
    /// Run the background sweepers. Env var: `SWEEP_ENABLED`.
    #[serde(default = "default_sweep_enabled")]
    pub sweep_enabled: bool,
}

fn default_allowed_users_path() -> PathBuf {
    PathBuf::from("data/allowed-users.json")
}

fn default_sweep_enabled() -> bool {
    true
}

impl Config for AuthConfig {}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = match self.session_secret.as_deref() {
            Some(s) if !s.is_empty() => "<redacted>",
            _ => "<unset>",
        };
        f.debug_struct("AuthConfig")
            .field("session_secret", &secret)
            .field("allowed_users_path", &self.allowed_users_path)
            .field("sweep_enabled", &self.sweep_enabled)
            .finish()
    }
}
