//! End-to-end session lifecycle tests against an in-memory principal store.

use std::sync::Arc;

use chrono::Utc;

use auth_core::{
    AuditStatus, AuthError, Config, InMemoryPrincipalStore, MemoryAuditSink, Role, SessionManager,
};

struct Harness {
    manager: SessionManager,
    audit: Arc<MemoryAuditSink>,
}

fn harness_with(config: Config) -> Harness {
    auth_core::telemetry::init_tracing();

    let mut store = InMemoryPrincipalStore::new();
    store.add_user("1", "alice", "password123", Role::Basic).unwrap();
    store.add_user("2", "bob", "password123", Role::Basic).unwrap();
    store.add_user("3", "charlie", "dependent123", Role::Dependent).unwrap();
    store.add_user("4", "dave", "admin123", Role::Admin).unwrap();

    let audit = Arc::new(MemoryAuditSink::new());
    let manager = SessionManager::new(&config, Arc::new(store), audit.clone()).unwrap();

    Harness { manager, audit }
}

fn harness() -> Harness {
    let mut config = Config::default();
    config.jwt_secret = "integration-test-secret".to_string();
    harness_with(config)
}

#[tokio::test]
async fn login_issues_decodable_pair_with_configured_ttls() {
    let h = harness();
    let pair = h.manager.login("alice", "password123").await.unwrap();
    assert_eq!(pair.token_type, "bearer");

    let claims = h.manager.verify_access(&pair.access_token).unwrap();
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.role, Role::Basic);

    let remaining = claims.exp - Utc::now().timestamp();
    assert!(remaining > 30 * 60 - 5 && remaining <= 30 * 60);
}

#[tokio::test]
async fn unknown_user_and_wrong_password_are_indistinguishable() {
    let h = harness();

    let unknown = h.manager.login("mallory", "password123").await.unwrap_err();
    let wrong = h.manager.login("alice", "wrong-password").await.unwrap_err();

    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert_eq!(unknown.public_message(), wrong.public_message());

    // The audit trail does distinguish them
    let events = h.audit.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].details, "User not found");
    assert_eq!(events[1].details, "Password mismatch");
}

#[tokio::test]
async fn refresh_rotates_and_is_single_use() {
    let h = harness();
    let pair = h.manager.login("alice", "password123").await.unwrap();

    let rotated = h.manager.refresh(&pair.refresh_token, "10.0.0.1").unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    // The spent token is rejected even though it has not expired
    let err = h.manager.refresh(&pair.refresh_token, "10.0.0.2").unwrap_err();
    assert!(matches!(
        err,
        AuthError::Blacklisted | AuthError::ReusedToken
    ));

    // The rotated-in token keeps working
    assert!(h.manager.refresh(&rotated.refresh_token, "10.0.0.3").is_ok());
}

#[tokio::test]
async fn logout_blacklists_access_and_detaches_refresh() {
    let h = harness();
    let pair = h.manager.login("alice", "password123").await.unwrap();

    let subject = h.manager.logout(&pair.access_token).unwrap();
    assert_eq!(subject, "alice");

    let err = h.manager.verify_access(&pair.access_token).unwrap_err();
    assert!(matches!(err, AuthError::Blacklisted));

    // The refresh token was detached, not blacklisted: it fails only the
    // stored-token match.
    let err = h.manager.refresh(&pair.refresh_token, "10.0.0.1").unwrap_err();
    assert!(matches!(err, AuthError::ReusedToken));
}

#[tokio::test]
async fn second_login_detaches_first_refresh_token() {
    let h = harness();
    let first = h.manager.login("alice", "password123").await.unwrap();
    let second = h.manager.login("alice", "password123").await.unwrap();

    let err = h.manager.refresh(&first.refresh_token, "10.0.0.1").unwrap_err();
    assert!(matches!(err, AuthError::ReusedToken));

    assert!(h.manager.refresh(&second.refresh_token, "10.0.0.2").is_ok());
}

#[tokio::test]
async fn token_signed_with_other_key_is_rejected() {
    let h = harness();
    let mut other_config = Config::default();
    other_config.jwt_secret = "a-completely-different-secret".to_string();
    let other = harness_with(other_config);

    let pair = other.manager.login("alice", "password123").await.unwrap();

    let err = h.manager.verify_access(&pair.access_token).unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));

    let err = h.manager.refresh(&pair.refresh_token, "10.0.0.1").unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn general_admission_honors_the_hundred_per_window_policy() {
    let h = harness();

    for i in 0..105 {
        let admitted = h.manager.admit("X");
        if i < 100 {
            assert!(admitted, "request {} should be admitted", i + 1);
        } else {
            assert!(!admitted, "request {} should be denied", i + 1);
        }
    }

    // One DENIED audit record per rejected request
    let denied = h
        .audit
        .events()
        .into_iter()
        .filter(|e| e.status == AuditStatus::Denied)
        .count();
    assert_eq!(denied, 5);
}

#[tokio::test]
async fn refresh_attempts_are_rate_limited_per_identifier() {
    let h = harness();

    for _ in 0..5 {
        let err = h.manager.refresh("garbage-token", "attacker").unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    let err = h.manager.refresh("garbage-token", "attacker").unwrap_err();
    assert!(matches!(err, AuthError::RateLimited));

    // Other identifiers are unaffected
    let err = h.manager.refresh("garbage-token", "bystander").unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}

#[tokio::test]
async fn concurrent_refresh_issues_exactly_one_new_pair() {
    let h = harness();
    let pair = h.manager.login("alice", "password123").await.unwrap();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|i| {
                let manager = &h.manager;
                let token = pair.refresh_token.clone();
                scope.spawn(move || manager.refresh(&token, &format!("caller-{i}")))
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    let ok_count = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok_count, 1, "exactly one concurrent refresh may succeed");

    for result in results {
        if let Err(err) = result {
            assert!(matches!(
                err,
                AuthError::ReusedToken | AuthError::Blacklisted
            ));
        }
    }
}

#[tokio::test]
async fn lifecycle_emits_one_audit_record_per_decision() {
    let h = harness();

    let pair = h.manager.login("alice", "password123").await.unwrap();
    h.manager.logout(&pair.access_token).unwrap();
    let _ = h.manager.verify_access(&pair.access_token);

    let events = h.audit.events();
    let actions: Vec<&str> = events.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec!["LOGIN", "LOGOUT", "BLACKLISTED_TOKEN"]);

    assert_eq!(events[0].status, AuditStatus::Success);
    assert_eq!(events[1].status, AuditStatus::Success);
    assert_eq!(events[2].status, AuditStatus::Failed);
    assert_eq!(events[2].user, "unknown");
}
