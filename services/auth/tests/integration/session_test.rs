use chrono::Duration;

use komikai_auth::domain::repository::CodeStore;
use komikai_auth::error::AuthServiceError;
use komikai_auth::state::AuthCore;
use komikai_auth::usecase::authcode::VerifyCodeInput;
use komikai_core::clock::ManualClock;

use crate::helpers::{ANA, TEST_EPOCH, test_core, test_users};

/// Sign Ana in through the code flow and return her session token.
fn sign_in(core: &AuthCore) -> String {
    core.code_store().issue(ANA, "246810", Duration::minutes(10));
    core.verify_code()
        .execute(VerifyCodeInput {
            email: ANA.to_owned(),
            code: "246810".to_owned(),
        })
        .unwrap()
        .session_token
}

#[test]
fn should_authorize_until_session_expires() {
    let (core, clock) = test_core();
    let token = sign_in(&core);

    let session = core.authorize().execute(Some(&token)).unwrap();
    assert_eq!(session.issued_at.timestamp(), TEST_EPOCH);
    assert_eq!(session.expires_at.timestamp(), TEST_EPOCH + 604_800);

    clock.advance(Duration::days(7) - Duration::seconds(1));
    assert!(core.authorize().execute(Some(&token)).is_ok());

    clock.advance(Duration::seconds(1));
    let expired = core.authorize().execute(Some(&token));
    assert!(
        matches!(expired, Err(AuthServiceError::Unauthenticated)),
        "expected Unauthenticated, got {expired:?}"
    );
}

#[test]
fn should_reject_missing_or_garbage_token() {
    let (core, _clock) = test_core();

    for token in [None, Some(""), Some("not-a-token"), Some("a.b.c")] {
        let result = core.authorize().execute(token);
        assert!(
            matches!(result, Err(AuthServiceError::Unauthenticated)),
            "{token:?}: expected Unauthenticated, got {result:?}"
        );
    }
}

#[test]
fn should_reject_token_signed_by_other_process() {
    let (core, _clock) = test_core();
    let token = sign_in(&core);

    let clock = ManualClock::at_timestamp(TEST_EPOCH);
    let other = AuthCore::new(test_users(), Some("another-secret"), clock.shared());

    assert!(matches!(
        other.authorize().execute(Some(&token)),
        Err(AuthServiceError::Unauthenticated)
    ));
}

#[test]
fn should_rate_limit_eleventh_processing_request() {
    let (core, clock) = test_core();
    let token = sign_in(&core);
    let uc = core.authorize_processing();

    for i in 0..10 {
        assert!(uc.execute(Some(&token)).is_ok(), "request {i} should pass");
    }
    let result = uc.execute(Some(&token));

    let Err(AuthServiceError::RateLimited(info)) = result else {
        panic!("expected RateLimited, got {result:?}");
    };
    assert_eq!(info.remaining, 0);
    assert!(info.blocked);
    assert_eq!(info.reset_at.timestamp(), TEST_EPOCH + 300);

    clock.advance(Duration::seconds(301));
    assert!(uc.execute(Some(&token)).is_ok());
}

#[test]
fn should_not_count_unauthenticated_processing_requests() {
    let (core, _clock) = test_core();

    let result = core.authorize_processing().execute(Some("forged"));

    assert!(matches!(result, Err(AuthServiceError::Unauthenticated)));
    assert_eq!(core.rate_limiter().tracked_keys(), 0);
}
