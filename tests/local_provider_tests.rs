//! File-backed credential provider tests: Argon2 verification wired through
//! the auth manager, plus persistence of the users file across reopen.

use anyhow::Result;
use tempfile::tempdir;

use edudesk::identity::{
    AuthManager, AuthPhase, AuthProvider, LocalAuthProvider, Role, SessionStore,
};

#[tokio::test]
async fn valid_password_logs_in_and_wrong_password_is_rejected() -> Result<()> {
    let tmp = tempdir()?;
    let provider = LocalAuthProvider::open(tmp.path().join("users.json"))?;
    provider.upsert_user("grace@school.edu", Role::Teacher, "Grace Lin", "chalk-and-talk")?;

    let store = SessionStore::open(tmp.path())?;
    let mgr = AuthManager::new(store, Box::new(provider));

    let err = mgr
        .login("grace@school.edu", "wrong", Role::Teacher, false)
        .await
        .unwrap_err();
    assert_eq!(err.code_str(), "auth");
    assert_eq!(mgr.snapshot().phase, AuthPhase::Anonymous);

    let session = mgr
        .login("grace@school.edu", "chalk-and-talk", Role::Teacher, false)
        .await?;
    assert_eq!(session.user.name, "Grace Lin");
    assert!(session.user.has_permission("attendance.write"));
    Ok(())
}

#[tokio::test]
async fn unknown_account_and_role_mismatch_both_fail() -> Result<()> {
    let tmp = tempdir()?;
    let provider = LocalAuthProvider::open(tmp.path().join("users.json"))?;
    provider.upsert_user("grace@school.edu", Role::Teacher, "Grace Lin", "pw")?;

    let err = provider.validate("nobody@school.edu", "pw", Role::Teacher).await.unwrap_err();
    assert_eq!(err.code_str(), "auth");

    // Right email and password, wrong role
    let err = provider.validate("grace@school.edu", "pw", Role::Admin).await.unwrap_err();
    assert_eq!(err.code_str(), "auth");
    Ok(())
}

#[tokio::test]
async fn users_file_survives_reopen_and_upsert_replaces() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("users.json");
    {
        let provider = LocalAuthProvider::open(&path)?;
        provider.upsert_user("grace@school.edu", Role::Teacher, "Grace Lin", "old-pw")?;
        provider.upsert_user("grace@school.edu", Role::Teacher, "Grace Lin", "new-pw")?;
    }

    let provider = LocalAuthProvider::open(&path)?;
    // Only the latest password verifies after the upsert replaced the row
    assert!(provider.validate("grace@school.edu", "old-pw", Role::Teacher).await.is_err());
    let user = provider.validate("GRACE@SCHOOL.EDU", "new-pw", Role::Teacher).await?;
    assert_eq!(user.role, Role::Teacher);
    Ok(())
}
