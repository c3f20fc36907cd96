use std::sync::{Arc, Mutex};

use komikai_auth::domain::repository::CodeMailer;
use komikai_auth::error::AuthServiceError;
use komikai_auth::infra::users::AllowedUsers;
use komikai_auth::state::AuthCore;
use komikai_core::clock::ManualClock;

pub const TEST_SECRET: &str = "integration-test-secret";

/// 2023-11-14T22:13:20Z
pub const TEST_EPOCH: i64 = 1_700_000_000;

pub const ANA: &str = "ana@example.com";
pub const BOB: &str = "bob@example.com";

// ── RecordingMailer ──────────────────────────────────────────────────────────

/// Keeps every `(email, code)` it was asked to deliver.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingMailer {
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl CodeMailer for RecordingMailer {
    async fn send_login_code(&self, email: &str, code: &str) -> Result<(), AuthServiceError> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_owned(), code.to_owned()));
        Ok(())
    }
}

// ── FailingMailer ────────────────────────────────────────────────────────────

pub struct FailingMailer;

impl CodeMailer for FailingMailer {
    async fn send_login_code(&self, _email: &str, _code: &str) -> Result<(), AuthServiceError> {
        Err(anyhow::anyhow!("smtp connection refused").into())
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// Ana has a configured name, Bob does not.
pub fn test_users() -> AllowedUsers {
    AllowedUsers::from_json(r#"{"Ana@Example.com": "Ana", "bob@example.com": ""}"#).unwrap()
}

pub fn test_core() -> (AuthCore, ManualClock) {
    let clock = ManualClock::at_timestamp(TEST_EPOCH);
    let core = AuthCore::new(test_users(), Some(TEST_SECRET), clock.shared());
    (core, clock)
}
