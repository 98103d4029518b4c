//!
//! Auth state machine
//! ------------------
//! Owns the single process-wide session and every transition on it:
//! `Anonymous -> Authenticating -> Authenticated`, back to `Anonymous` on
//! logout or failure. The store and credential provider are injected; there
//! are no ambient singletons. Consumers read owned snapshots and must not
//! assume the state is stable across an await point.
//!
//! Login attempts are fenced with a monotonic sequence number: a stale
//! in-flight validation that resolves after a newer attempt started is
//! discarded instead of overwriting the newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

use super::provider::AuthProvider;
use super::role::Role;
use super::store::SessionStore;
use super::token;
use super::user::User;

/// How long a recorded login failure stays in the error slot before the
/// banner auto-clears.
pub const ERROR_CLEAR_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// The current session. `is_authenticated` is carried explicitly so guard
/// decisions can be made on a detached copy of this struct alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub is_authenticated: bool,
}

/// Owned point-in-time copy of the machine state, safe to hold across
/// awaits and renders.
#[derive(Debug, Clone)]
pub struct AuthSnapshot {
    pub phase: AuthPhase,
    pub session: Option<Session>,
    pub error: Option<String>,
}

struct State {
    phase: AuthPhase,
    session: Option<Session>,
    error: Option<String>,
    /// The remember flag recorded at login, reused by `update_user`.
    remember: bool,
}

struct Inner {
    store: SessionStore,
    provider: Box<dyn AuthProvider>,
    state: RwLock<State>,
    login_seq: AtomicU64,
}

#[derive(Clone)]
pub struct AuthManager {
    inner: Arc<Inner>,
}

impl AuthManager {
    pub fn new(store: SessionStore, provider: Box<dyn AuthProvider>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                provider,
                state: RwLock::new(State {
                    phase: AuthPhase::Anonymous,
                    session: None,
                    error: None,
                    remember: false,
                }),
                login_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Startup restore: if the store holds a non-expired session, transition
    /// straight to Authenticated (no Authenticating phase — this is the
    /// restore transition, not a login). An expired or undecodable stored
    /// token clears the store and leaves the machine Anonymous.
    pub fn restore_session(&self) -> Option<Session> {
        let (user, tok) = self.inner.store.restore()?;
        if token::is_expired(&tok) {
            info!("stored session for {} has expired, discarding", user.email);
            self.inner.store.clear();
            return None;
        }
        let remember = self.inner.store.remembered();
        let session = Session { user, token: tok, is_authenticated: true };
        let mut st = self.inner.state.write();
        st.phase = AuthPhase::Authenticated;
        st.session = Some(session.clone());
        st.remember = remember;
        info!("session restored for {} ({})", session.user.email, session.user.role);
        Some(session)
    }

    /// Validate credentials, persist and transition to Authenticated. On
    /// failure the error is recorded for banner display (and auto-cleared
    /// after [`ERROR_CLEAR_SECS`]) and re-raised to the caller. There is no
    /// retry here.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: Role,
        remember: bool,
    ) -> AppResult<Session> {
        let attempt = self.inner.login_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut st = self.inner.state.write();
            st.phase = AuthPhase::Authenticating;
            st.session = None;
            st.error = None;
        }
        match self.inner.provider.validate(email, password, role).await {
            Ok(user) => {
                if self.inner.login_seq.load(Ordering::SeqCst) != attempt {
                    warn!("login for {} resolved after a newer attempt started, dropping", email);
                    return Err(AppError::auth("login superseded by a newer attempt"));
                }
                let tok = token::encode(&user.id, user.role);
                self.inner.store.persist(&user, &tok, remember)?;
                let session = Session { user, token: tok, is_authenticated: true };
                {
                    let mut st = self.inner.state.write();
                    st.phase = AuthPhase::Authenticated;
                    st.session = Some(session.clone());
                    st.error = None;
                    st.remember = remember;
                }
                info!("login ok for {} ({})", session.user.email, session.user.role);
                Ok(session)
            }
            Err(e) => {
                if self.inner.login_seq.load(Ordering::SeqCst) == attempt {
                    {
                        let mut st = self.inner.state.write();
                        st.phase = AuthPhase::Anonymous;
                        st.session = None;
                        st.error = Some(e.to_string());
                    }
                    self.spawn_error_clear(attempt);
                }
                warn!("login failed for {}: {}", email, e);
                Err(e)
            }
        }
    }

    fn spawn_error_clear(&self, attempt: u64) {
        let mgr = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(ERROR_CLEAR_SECS)).await;
            // Only clear if no newer attempt has produced fresher state.
            if mgr.inner.login_seq.load(Ordering::SeqCst) == attempt {
                mgr.inner.state.write().error = None;
            }
        });
    }

    /// Clear the store and drop the session. Unconditional, no server
    /// round-trip.
    pub fn logout(&self) {
        self.inner.store.clear();
        let mut st = self.inner.state.write();
        if let Some(s) = st.session.take() {
            info!("logout {}", s.user.email);
        }
        st.phase = AuthPhase::Anonymous;
        st.remember = false;
    }

    /// Demo-only role-switch/profile patch. Replaces the user in place and
    /// re-persists under the remember flag recorded at login; the token is
    /// untouched and NO re-authentication happens. This deliberately
    /// bypasses the normal login path so demo users can preview other
    /// dashboards — never expose it in a production authorization path.
    pub fn update_user(&self, new_user: User) -> AppResult<Session> {
        let mut st = self.inner.state.write();
        let remember = st.remember;
        let Some(session) = st.session.as_mut() else {
            return Err(AppError::auth("no active session to update"));
        };
        self.inner.store.persist(&new_user, &session.token, remember)?;
        warn!(
            "demo user switch: {} -> {} ({})",
            session.user.role, new_user.role, new_user.email
        );
        session.user = new_user;
        Ok(session.clone())
    }

    /// True if the current user carries the wildcard or the named permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        let st = self.inner.state.read();
        st.session
            .as_ref()
            .map(|s| s.user.has_permission(permission))
            .unwrap_or(false)
    }

    /// True iff the current user's role is a member of `roles`. Pass a
    /// one-element slice for a single-role check.
    pub fn has_role(&self, roles: &[Role]) -> bool {
        let st = self.inner.state.read();
        st.session
            .as_ref()
            .map(|s| roles.contains(&s.user.role))
            .unwrap_or(false)
    }

    /// Clear a recorded login failure without touching authentication state.
    pub fn clear_error(&self) {
        self.inner.state.write().error = None;
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        let st = self.inner.state.read();
        AuthSnapshot { phase: st.phase, session: st.session.clone(), error: st.error.clone() }
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.state.read().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.read().phase == AuthPhase::Authenticated
    }
}
