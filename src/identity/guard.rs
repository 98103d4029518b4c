//! Routing-layer access gate. Pure and stateless: the shell (or any other
//! view router) calls [`decide`] before rendering a protected view and acts
//! on the verdict. No I/O, no side effects.

use super::auth::Session;
use super::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// No authenticated session: send the caller to the login flow.
    RedirectToLogin,
    /// Authenticated but lacking the role or a required permission.
    Deny,
}

/// Gate a view behind a role set and a permission list. An empty
/// `allowed_roles` admits every authenticated role; every entry of
/// `required_permissions` must pass.
pub fn decide(
    session: Option<&Session>,
    allowed_roles: &[Role],
    required_permissions: &[&str],
) -> Access {
    let Some(session) = session else {
        return Access::RedirectToLogin;
    };
    if !session.is_authenticated {
        return Access::RedirectToLogin;
    }
    if !allowed_roles.is_empty() && !allowed_roles.contains(&session.user.role) {
        return Access::Deny;
    }
    for permission in required_permissions {
        if !session.user.has_permission(permission) {
            return Access::Deny;
        }
    }
    Access::Allow
}
