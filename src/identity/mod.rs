//! Central identity and session management for the edudesk dashboard.
//! Keep the public surface thin and split implementation across sub-modules.

mod role;
mod user;
pub mod token;
mod provider;
mod store;
mod auth;
mod guard;

pub use role::Role;
pub use user::User;
pub use provider::{AuthProvider, DemoAuthProvider, LocalAuthProvider};
pub use store::{FileScope, KeyValueScope, MemoryScope, SessionStore};
pub use store::{AUTH_TOKEN_KEY, REMEMBER_KEY, USER_DATA_KEY};
pub use auth::{AuthManager, AuthPhase, AuthSnapshot, Session, ERROR_CLEAR_SECS};
pub use guard::{decide, Access};
