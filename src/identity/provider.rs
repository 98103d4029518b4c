//! Credential providers.
//!
//! `DemoAuthProvider` reproduces the dashboard's demo-mode behavior: after a
//! simulated network delay it accepts any non-empty email/password pair,
//! handing back either a fixed demo account or a synthesized user of the
//! requested role. There is NO password verification here — demo mode only.
//! `LocalAuthProvider` is the production-shaped replacement seam: a users
//! file with Argon2 PHC hashes and real password verification.

use std::path::{Path, PathBuf};
use std::time::Duration;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};

use super::role::Role;
use super::user::User;

/// The injection seam between the auth state machine and whatever decides
/// that a credential pair is good.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn validate(&self, email: &str, password: &str, role: Role) -> AppResult<User>;
}

fn rand_u64() -> u64 {
    let mut buf = [0u8; 8];
    let _ = getrandom::getrandom(&mut buf);
    u64::from_le_bytes(buf)
}

/// Fixed demo accounts keyed by (email, role).
static DEMO_USERS: Lazy<Vec<User>> = Lazy::new(|| {
    vec![
        User::new("usr-admin", "Ava Sharma", "admin@school.edu", Role::Admin),
        User::new("usr-principal", "Daniel Okafor", "principal@school.edu", Role::Principal),
        User::new("usr-teacher", "Grace Lin", "teacher@school.edu", Role::Teacher),
        User::new("usr-student", "Tom Barker", "student@school.edu", Role::Student),
        User::new("usr-parent", "Maria Keller", "parent@school.edu", Role::Parent),
        User::new("usr-accountant", "Priya Nair", "accounts@school.edu", Role::Accountant),
    ]
});

/// Demo-mode credential check: ~1s of artificial latency, then success for
/// any non-empty inputs.
pub struct DemoAuthProvider {
    base_latency: Duration,
    jitter: Duration,
}

impl Default for DemoAuthProvider {
    fn default() -> Self {
        Self { base_latency: Duration::from_millis(800), jitter: Duration::from_millis(400) }
    }
}

impl DemoAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(base: Duration, jitter: Duration) -> Self {
        Self { base_latency: base, jitter }
    }

    /// Zero-latency variant for tests.
    pub fn instant() -> Self {
        Self::with_latency(Duration::ZERO, Duration::ZERO)
    }

    fn delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.base_latency;
        }
        let extra = rand_u64() % (self.jitter.as_millis() as u64 + 1);
        self.base_latency + Duration::from_millis(extra)
    }
}

#[async_trait]
impl AuthProvider for DemoAuthProvider {
    async fn validate(&self, email: &str, password: &str, role: Role) -> AppResult<User> {
        tokio::time::sleep(self.delay()).await;
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::missing_credentials("email and password are required"));
        }
        if let Some(user) = DEMO_USERS
            .iter()
            .find(|u| u.role == role && u.email.eq_ignore_ascii_case(email.trim()))
        {
            info!("auth.validate demo account {} role={}", user.email, role);
            return Ok(user.clone());
        }
        // Unknown pair: synthesize a fresh demo user of the requested role.
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: format!("Demo {}", role.label()),
            email: email.trim().to_string(),
            role,
            permissions: role.default_permissions().iter().map(|p| p.to_string()).collect(),
        };
        info!("auth.validate synthesized {} role={}", user.email, role);
        Ok(user)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalUser {
    id: String,
    name: String,
    email: String,
    role: Role,
    password_hash: String,
    #[serde(default)]
    permissions: Vec<String>,
}

fn hash_password(password: &str) -> AppResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|e| AppError::internal(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AppError::internal(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::internal(e.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

/// File-backed credential provider with real Argon2 verification. This is
/// what a non-demo deployment wires into the auth manager in place of
/// `DemoAuthProvider`.
pub struct LocalAuthProvider {
    path: PathBuf,
    users: RwLock<Vec<LocalUser>>,
}

impl LocalAuthProvider {
    /// Open (or create) the users file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();
        let users = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<Vec<LocalUser>>(&text)
                .map_err(|e| AppError::io(format!("users file {}: {}", path.display(), e)))?,
            Err(_) => Vec::new(),
        };
        Ok(Self { path, users: RwLock::new(users) })
    }

    fn save(&self, users: &[LocalUser]) -> AppResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let text = serde_json::to_string_pretty(users)
            .map_err(|e| AppError::internal(e.to_string()))?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    /// Create or replace the account for (email, role), hashing the password.
    pub fn upsert_user(&self, email: &str, role: Role, name: &str, password: &str) -> AppResult<()> {
        let phc = hash_password(password)?;
        let mut users = self.users.write();
        users.retain(|u| !(u.role == role && u.email.eq_ignore_ascii_case(email)));
        users.push(LocalUser {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            password_hash: phc,
            permissions: role.default_permissions().iter().map(|p| p.to_string()).collect(),
        });
        self.save(&users)
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn validate(&self, email: &str, password: &str, role: Role) -> AppResult<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::missing_credentials("email and password are required"));
        }
        let found = {
            let users = self.users.read();
            users
                .iter()
                .find(|u| u.role == role && u.email.eq_ignore_ascii_case(email.trim()))
                .cloned()
        };
        let Some(local) = found else {
            return Err(AppError::auth("invalid credentials"));
        };
        if !verify_password(&local.password_hash, password) {
            return Err(AppError::auth("invalid credentials"));
        }
        info!("auth.validate local account {} role={}", local.email, role);
        Ok(User {
            id: local.id,
            name: local.name,
            email: local.email,
            role: local.role,
            permissions: local.permissions,
        })
    }
}
