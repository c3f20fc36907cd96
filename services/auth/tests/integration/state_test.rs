use std::path::PathBuf;

use chrono::Duration;

use komikai_auth::config::AuthConfig;
use komikai_auth::domain::repository::{CodeStore, RateLimiter};
use komikai_auth::state::AuthCore;

use crate::helpers::{ANA, BOB, TEST_SECRET, test_core};

fn users_file(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("komikai-{}-{name}.json", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

fn config(path: PathBuf, sweep_enabled: bool) -> AuthConfig {
    AuthConfig {
        session_secret: Some(TEST_SECRET.to_owned()),
        allowed_users_path: path,
        sweep_enabled,
    }
}

#[test]
fn should_report_active_codes_and_limiter_entries() {
    let (core, clock) = test_core();
    core.code_store().issue(ANA, "111111", Duration::minutes(10));
    core.code_store().issue(BOB, "222222", Duration::minutes(1));
    core.rate_limiter().check("login:ana@example.com");

    let status = core.status();
    assert_eq!(status.active_codes, 2);
    assert_eq!(status.rate_limit.total_entries, 1);
    assert!(status.rate_limit.memory_estimate_bytes > 0);

    // Bob's code and the login window lapse; Ana's code is still live.
    clock.advance(Duration::seconds(90));
    let status = core.status();
    assert_eq!(status.active_codes, 1);
    assert_eq!(status.rate_limit.total_entries, 0);
    assert_eq!(status.rate_limit.memory_estimate_bytes, 0);
}

#[test]
fn should_serialize_status() {
    let (core, _clock) = test_core();

    let json = serde_json::to_value(core.status()).unwrap();

    assert_eq!(json["active_codes"], 0);
    assert_eq!(json["rate_limit"]["total_entries"], 0);
}

#[test]
fn should_share_stores_between_clones() {
    let (core, _clock) = test_core();
    let other = core.clone();

    core.code_store().issue(ANA, "135790", Duration::minutes(10));

    assert!(other.code_store().consume(ANA, "135790"));
    assert!(core.code_store().is_empty());
}

#[tokio::test]
async fn should_init_from_allowed_users_file() {
    let path = users_file("init", r#"["ana@example.com"]"#);

    let core = AuthCore::init(&config(path.clone(), true)).unwrap();

    assert_eq!(core.users().len(), 1);
    assert!(core.signer().is_configured());
    let sweepers = core.start_sweepers();
    assert!(sweepers.is_some());

    drop(sweepers);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn should_not_start_sweepers_when_disabled() {
    let path = users_file("nosweep", r#"{"ana@example.com": "Ana"}"#);

    let core = AuthCore::init(&config(path.clone(), false)).unwrap();

    assert!(core.start_sweepers().is_none());
    std::fs::remove_file(path).unwrap();
}

#[test]
fn should_fail_init_when_allowed_users_missing() {
    let path = std::env::temp_dir().join("komikai-does-not-exist.json");

    let result = AuthCore::init(&config(path, true));

    assert!(result.is_err());
}
