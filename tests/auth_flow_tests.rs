//! Auth state machine integration tests: login/logout/restore flows over a
//! real durable scope, covering both the happy paths and the failure and
//! stale-state edges.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tempfile::tempdir;

use edudesk::identity::{
    token, AuthManager, AuthPhase, DemoAuthProvider, FileScope, KeyValueScope, Role, SessionStore,
    AUTH_TOKEN_KEY, REMEMBER_KEY, USER_DATA_KEY,
};
use edudesk::tprintln;

fn manager_at(dir: &Path) -> AuthManager {
    let store = SessionStore::open(dir).expect("session store");
    AuthManager::new(store, Box::new(DemoAuthProvider::instant()))
}

fn read_state_file(dir: &Path) -> HashMap<String, String> {
    let text = std::fs::read_to_string(dir.join("session.json")).unwrap_or_else(|_| "{}".into());
    serde_json::from_str(&text).expect("state file is a JSON string map")
}

#[tokio::test]
async fn login_with_remember_persists_durably_and_restores_after_restart() -> Result<()> {
    let tmp = tempdir()?;
    let mgr = manager_at(tmp.path());

    let session = mgr.login("t@x.com", "p", Role::Teacher, true).await?;
    assert_eq!(session.user.role, Role::Teacher);
    assert!(session.is_authenticated);
    assert_eq!(mgr.snapshot().phase, AuthPhase::Authenticated);

    // Durable storage now holds matching user_data/auth_token/remember_me
    let state = read_state_file(tmp.path());
    assert_eq!(state.get(REMEMBER_KEY).map(String::as_str), Some("true"));
    assert_eq!(state.get(AUTH_TOKEN_KEY), Some(&session.token));
    let stored_user: serde_json::Value = serde_json::from_str(&state[USER_DATA_KEY])?;
    assert_eq!(stored_user["role"], "teacher");
    assert_eq!(stored_user["email"], "t@x.com");

    // Simulated process restart: a fresh store over the same directory
    let mgr2 = manager_at(tmp.path());
    let restored = mgr2.restore_session().expect("remembered session restores");
    assert_eq!(restored.user.email, "t@x.com");
    assert_eq!(restored.token, session.token);
    assert_eq!(mgr2.snapshot().phase, AuthPhase::Authenticated);
    Ok(())
}

#[tokio::test]
async fn ephemeral_session_is_gone_after_restart() -> Result<()> {
    let tmp = tempdir()?;
    let mgr = manager_at(tmp.path());
    mgr.login("t@x.com", "p", Role::Teacher, false).await?;
    // Live session works within the process
    assert!(mgr.has_role(&[Role::Teacher]));

    // Restart reads only durable storage: nothing to restore
    let mgr2 = manager_at(tmp.path());
    assert!(mgr2.restore_session().is_none());
    assert_eq!(mgr2.snapshot().phase, AuthPhase::Anonymous);
    Ok(())
}

#[tokio::test]
async fn expired_stored_token_is_discarded_and_storage_cleared() -> Result<()> {
    let tmp = tempdir()?;
    {
        // Craft a remembered session whose token expired one second ago
        let store = SessionStore::open(tmp.path())?;
        let user = edudesk::identity::User::new("u1", "Grace Lin", "teacher@school.edu", Role::Teacher);
        let now = chrono::Utc::now().timestamp();
        let stale = token::encode_claims(&token::Claims {
            sub: user.id.clone(),
            role: user.role,
            iat: now - token::TOKEN_TTL_SECS,
            exp: now - 1,
        });
        assert!(token::is_expired(&stale));
        store.persist(&user, &stale, true)?;
    }

    let mgr = manager_at(tmp.path());
    assert!(mgr.restore_session().is_none());
    assert_eq!(mgr.snapshot().phase, AuthPhase::Anonymous);

    // The store was cleared, not just skipped
    let state = read_state_file(tmp.path());
    tprintln!("state after discard: {:?}", state);
    assert!(!state.contains_key(AUTH_TOKEN_KEY));
    assert!(!state.contains_key(USER_DATA_KEY));
    assert!(!state.contains_key(REMEMBER_KEY));
    Ok(())
}

#[tokio::test]
async fn corrupt_user_data_clears_even_with_wellformed_token() -> Result<()> {
    let tmp = tempdir()?;
    {
        let scope = FileScope::open(tmp.path().join("session.json"))?;
        scope.set(REMEMBER_KEY, "true");
        scope.set(AUTH_TOKEN_KEY, &token::encode("u1", Role::Teacher));
        scope.set(USER_DATA_KEY, "{definitely not json");
    }

    let store = SessionStore::open(tmp.path())?;
    assert!(store.restore().is_none());
    let state = read_state_file(tmp.path());
    assert!(!state.contains_key(AUTH_TOKEN_KEY));
    assert!(!state.contains_key(USER_DATA_KEY));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn login_failure_records_error_and_auto_clears() -> Result<()> {
    let tmp = tempdir()?;
    let mgr = manager_at(tmp.path());

    let err = mgr.login("", "p", Role::Teacher, false).await.unwrap_err();
    assert_eq!(err.code_str(), "missing_credentials");
    let snap = mgr.snapshot();
    assert_eq!(snap.phase, AuthPhase::Anonymous);
    assert!(snap.error.as_deref().unwrap_or("").contains("missing_credentials"));

    // The banner auto-clears after the fixed timeout
    tokio::time::sleep(Duration::from_secs(edudesk::identity::ERROR_CLEAR_SECS + 1)).await;
    assert!(mgr.snapshot().error.is_none());
    Ok(())
}

#[tokio::test]
async fn clear_error_does_not_change_authentication_state() -> Result<()> {
    let tmp = tempdir()?;
    let mgr = manager_at(tmp.path());
    mgr.login("t@x.com", "p", Role::Teacher, false).await?;
    mgr.clear_error();
    assert_eq!(mgr.snapshot().phase, AuthPhase::Authenticated);
    assert!(mgr.has_role(&[Role::Teacher]));
    Ok(())
}

#[tokio::test]
async fn logout_is_unconditional_and_idempotent() -> Result<()> {
    let tmp = tempdir()?;
    let mgr = manager_at(tmp.path());
    mgr.login("t@x.com", "p", Role::Teacher, true).await?;
    mgr.logout();
    mgr.logout();
    assert_eq!(mgr.snapshot().phase, AuthPhase::Anonymous);
    assert!(mgr.session().is_none());
    // Nothing restorable after logout, even though the login was remembered
    let mgr2 = manager_at(tmp.path());
    assert!(mgr2.restore_session().is_none());
    Ok(())
}

#[tokio::test]
async fn update_user_switches_role_without_touching_the_token() -> Result<()> {
    let tmp = tempdir()?;
    let mgr = manager_at(tmp.path());
    let session = mgr.login("t@x.com", "p", Role::Teacher, true).await?;
    let original_token = session.token.clone();

    let preview = edudesk::identity::User::new(
        session.user.id.clone(),
        session.user.name.clone(),
        session.user.email.clone(),
        Role::Principal,
    );
    let updated = mgr.update_user(preview)?;
    assert_eq!(updated.user.role, Role::Principal);
    assert_eq!(updated.token, original_token);
    assert!(mgr.has_role(&[Role::Principal]));
    assert!(!mgr.has_role(&[Role::Teacher]));

    // Re-persisted under the previously recorded remember flag
    let mgr2 = manager_at(tmp.path());
    let restored = mgr2.restore_session().expect("still remembered");
    assert_eq!(restored.user.role, Role::Principal);
    assert_eq!(restored.token, original_token);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stale_in_flight_login_is_fenced_out() -> Result<()> {
    let tmp = tempdir()?;
    let store = SessionStore::open(tmp.path())?;
    let provider = DemoAuthProvider::with_latency(Duration::from_millis(50), Duration::ZERO);
    let mgr = AuthManager::new(store, Box::new(provider));

    // Two overlapping attempts: the first to start must not win over the
    // second, whichever order the validations resolve in.
    let first = mgr.login("first@x.com", "p", Role::Teacher, false);
    let second = mgr.login("second@x.com", "p", Role::Student, false);
    let (first_res, second_res) = tokio::join!(first, second);

    let err = first_res.unwrap_err();
    assert_eq!(err.code_str(), "auth");
    let winner = second_res?;
    assert_eq!(winner.user.email, "second@x.com");
    assert_eq!(mgr.session().map(|s| s.user.email), Some("second@x.com".to_string()));
    Ok(())
}
