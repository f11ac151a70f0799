use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "teacher" => Some(Role::Teacher),
            "student" => Some(Role::Student),
            "parent" => Some(Role::Parent),
            _ => None,
        }
    }
}

/// The signed-in user as reported by the identity provider.
///
/// Email and role are optional claims; callers must cope with either missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl Principal {
    pub fn new(id: impl Into<String>, email: Option<String>, role: Option<Role>) -> Self {
        Self {
            id: id.into(),
            email,
            role,
        }
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Some(Role::Teacher)
    }
}
