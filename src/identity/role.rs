use serde::{Deserialize, Serialize};

/// The closed set of dashboard roles. Every account carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Principal,
    Teacher,
    Student,
    Parent,
    Accountant,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::Principal,
        Role::Teacher,
        Role::Student,
        Role::Parent,
        Role::Accountant,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Principal => "principal",
            Role::Teacher => "teacher",
            Role::Student => "student",
            Role::Parent => "parent",
            Role::Accountant => "accountant",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Principal => "Principal",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
            Role::Parent => "Parent",
            Role::Accountant => "Accountant",
        }
    }

    /// Hierarchy weight, admin highest. Part of the role table for display
    /// purposes only: no guard or permission check consults it, authorization
    /// is flat role-set matching throughout.
    pub fn weight(&self) -> u8 {
        match self {
            Role::Admin => 6,
            Role::Principal => 5,
            Role::Teacher => 4,
            Role::Accountant => 3,
            Role::Parent => 2,
            Role::Student => 1,
        }
    }

    pub fn outranks(&self, other: Role) -> bool {
        self.weight() > other.weight()
    }

    /// Case-insensitive parse of the wire/CLI spelling.
    pub fn parse(s: &str) -> Option<Role> {
        let s = s.trim();
        Role::ALL
            .iter()
            .copied()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
    }

    /// Default permission grants handed to users of this role. The wildcard
    /// `*` matches every permission check.
    pub fn default_permissions(&self) -> &'static [&'static str] {
        match self {
            Role::Admin => &["*"],
            Role::Principal => &[
                "students.read",
                "staff.read",
                "attendance.read",
                "fees.read",
                "homework.read",
                "exams.read",
                "notices.read",
                "notices.write",
            ],
            Role::Teacher => &[
                "students.read",
                "attendance.read",
                "attendance.write",
                "homework.read",
                "homework.write",
                "exams.read",
                "notices.read",
            ],
            Role::Student => &[
                "attendance.read",
                "homework.read",
                "exams.read",
                "notices.read",
            ],
            Role::Parent => &[
                "attendance.read",
                "fees.read",
                "homework.read",
                "exams.read",
                "notices.read",
            ],
            Role::Accountant => &[
                "students.read",
                "fees.read",
                "fees.write",
                "notices.read",
            ],
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_closed() {
        assert_eq!(Role::parse("teacher"), Some(Role::Teacher));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse(" Accountant "), Some(Role::Accountant));
        assert_eq!(Role::parse("janitor"), None);
    }

    #[test]
    fn admin_outranks_every_other_role() {
        for r in Role::ALL {
            if r != Role::Admin {
                assert!(Role::Admin.outranks(r), "admin should outrank {}", r);
            }
        }
        assert!(!Role::Student.outranks(Role::Teacher));
    }

    #[test]
    fn serde_spelling_round_trips() {
        for r in Role::ALL {
            let s = serde_json::to_string(&r).unwrap();
            assert_eq!(s, format!("\"{}\"", r.as_str()));
            let back: Role = serde_json::from_str(&s).unwrap();
            assert_eq!(back, r);
        }
    }
}
