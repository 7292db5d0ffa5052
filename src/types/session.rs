//! Session types: role and current user

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::SchoolId;

/// Closed set of console roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Teacher, Role::Student];

    /// Display name as used by the backend
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        }
    }

    /// Numeric role id as issued by the backend
    pub fn id(&self) -> u8 {
        match self {
            Role::SuperAdmin => 1,
            Role::Admin => 2,
            Role::Teacher => 3,
            Role::Student => 4,
        }
    }

    /// Only a Super Admin may change a school's activation flag
    pub fn can_manage_schools(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "superadmin" | "1" => Ok(Role::SuperAdmin),
            "admin" | "2" => Ok(Role::Admin),
            "teacher" | "3" => Ok(Role::Teacher),
            "student" | "4" => Ok(Role::Student),
            _ => Err(format!(
                "Unknown role '{}'. Must be one of: Super Admin, Admin, Teacher, Student",
                s
            )),
        }
    }
}

/// The signed-in user. Read-only for the duration of a session and passed
/// explicitly into every role-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    pub role: Role,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<SchoolId>,
}

impl CurrentUser {
    pub fn new(role: Role) -> Self {
        Self {
            user_id: None,
            role,
            school_id: None,
        }
    }

    pub fn with_school(mut self, school_id: impl Into<SchoolId>) -> Self {
        self.school_id = Some(school_id.into());
        self
    }

    /// Call-site gate for activation transitions
    pub fn require_super_admin(&self, action: &str) -> Result<()> {
        if self.role.can_manage_schools() {
            Ok(())
        } else {
            Err(Error::PermissionDenied {
                role: self.role.to_string(),
                action: action.to_string(),
            })
        }
    }

    /// The school this user is affiliated with
    pub fn require_school(&self) -> Result<&SchoolId> {
        self.school_id
            .as_ref()
            .ok_or_else(|| Error::NoSchoolAffiliation {
                role: self.role.to_string(),
            })
    }
}

/// Resolve an optional session into a user, failing when nobody is signed in
pub fn require_user(user: Option<&CurrentUser>) -> Result<&CurrentUser> {
    user.ok_or(Error::Unauthenticated)
}
