use serde::{Deserialize, Serialize};

use super::role::Role;

/// A dashboard account as persisted in `user_data`. Permissions are plain
/// strings; the wildcard `*` grants everything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    pub fn new<S: Into<String>>(id: S, name: S, email: S, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            permissions: role.default_permissions().iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == "*" || p == permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_grants_everything() {
        let u = User::new("u1", "Ava", "admin@school.edu", Role::Admin);
        assert!(u.has_permission("students.read"));
        assert!(u.has_permission("anything.at.all"));
    }

    #[test]
    fn explicit_grants_only() {
        let u = User::new("u2", "Tom", "student@school.edu", Role::Student);
        assert!(u.has_permission("homework.read"));
        assert!(!u.has_permission("fees.write"));
    }

    #[test]
    fn permissions_survive_serde() {
        let u = User::new("u3", "Grace", "teacher@school.edu", Role::Teacher);
        let s = serde_json::to_string(&u).unwrap();
        let back: User = serde_json::from_str(&s).unwrap();
        assert_eq!(back, u);
        // Missing permissions field deserializes to an empty set
        let bare: User =
            serde_json::from_str(r#"{"id":"x","name":"X","email":"x@school.edu","role":"parent"}"#)
                .unwrap();
        assert!(bare.permissions.is_empty());
        assert!(!bare.has_permission("fees.read"));
    }
}
