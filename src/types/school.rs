//! School directory entities
//!
//! The wire format is tolerant: ids arrive as numbers or strings and several
//! fields carry backend column names (`contact_number`, `school_admin`,
//! `board_name`) that are accepted as aliases.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ─────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────

/// Opaque, stable school identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchoolId(String);

impl SchoolId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SchoolId {
    fn from(value: String) -> Self {
        SchoolId(value)
    }
}

impl From<&str> for SchoolId {
    fn from(value: &str) -> Self {
        SchoolId(value.to_string())
    }
}

impl fmt::Display for SchoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SchoolId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_opaque_id(deserializer).map(SchoolId)
    }
}

/// Accept an identifier encoded either as a JSON string or a JSON integer
fn deserialize_opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}

fn deserialize_optional_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_opaque_id")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|w| w.0))
}

fn default_true() -> bool {
    true
}

// ─────────────────────────────────────────────────────────────────
// Board
// ─────────────────────────────────────────────────────────────────

/// Curriculum board attached to a school. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    #[serde(alias = "board_id", deserialize_with = "deserialize_opaque_id")]
    pub id: String,

    #[serde(alias = "board_name")]
    pub name: String,
}

// ─────────────────────────────────────────────────────────────────
// School
// ─────────────────────────────────────────────────────────────────

/// One tenant institution.
///
/// `is_active` is the only authority for whether the school shows up in the
/// Active view. `teacher_count` and `student_count` are derived by the backend
/// and never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    #[serde(alias = "school_id")]
    pub id: SchoolId,

    pub name: String,

    #[serde(default)]
    pub address: String,

    #[serde(default, alias = "contact_number", deserialize_with = "null_as_empty")]
    pub phone: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,

    #[serde(
        default,
        alias = "school_admin",
        alias = "adminId",
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub admin_id: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub teacher_count: u64,

    #[serde(default)]
    pub student_count: u64,

    #[serde(default)]
    pub boards: Vec<Board>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl School {
    /// Look up a searchable text field by name
    pub fn text_field(&self, field: &str) -> Option<&str> {
        match field {
            "name" => Some(&self.name),
            "address" => Some(&self.address),
            "phone" | "contact_number" => Some(&self.phone),
            "email" => Some(&self.email),
            "id" => Some(self.id.as_str()),
            _ => None,
        }
    }

    /// Board names in their attached order
    pub fn board_names(&self) -> Vec<&str> {
        self.boards.iter().map(|b| b.name.as_str()).collect()
    }
}

/// A school before an identifier has been assigned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSchool {
    pub name: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,

    /// Board ids to attach on registration
    #[serde(default)]
    pub board_ids: Vec<String>,
}

impl NewSchool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            admin_id: None,
            board_ids: Vec::new(),
        }
    }

    /// Materialize the school once an identifier exists
    pub fn into_school(self, id: SchoolId) -> School {
        School {
            id,
            name: self.name,
            address: self.address,
            phone: self.phone,
            email: self.email,
            admin_id: self.admin_id,
            is_active: true,
            teacher_count: 0,
            student_count: 0,
            boards: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_school_from_backend_payload() {
        let json = r#"{
            "id": 7,
            "name": "Greenwood High",
            "address": "123 Education Lane",
            "contact_number": "+91 80 1234 5678",
            "email": null,
            "school_admin": 2,
            "is_active": false,
            "boards": [{"id": 1, "board_name": "CBSE"}]
        }"#;

        let school: School = serde_json::from_str(json).unwrap();
        assert_eq!(school.id, SchoolId::from("7"));
        assert_eq!(school.phone, "+91 80 1234 5678");
        assert_eq!(school.email, "");
        assert_eq!(school.admin_id.as_deref(), Some("2"));
        assert!(!school.is_active);
        assert_eq!(school.board_names(), vec!["CBSE"]);
        assert_eq!(school.teacher_count, 0);
    }

    #[test]
    fn test_school_defaults_to_active_when_flag_missing() {
        let school: School = serde_json::from_str(r#"{"id": "1", "name": "A"}"#).unwrap();
        assert!(school.is_active);
        assert!(school.admin_id.is_none());
    }

    #[test]
    fn test_text_field_lookup() {
        let school = NewSchool::new("Greenwood").into_school(SchoolId::from("1"));
        assert_eq!(school.text_field("name"), Some("Greenwood"));
        assert_eq!(school.text_field("id"), Some("1"));
        assert_eq!(school.text_field("motto"), None);
    }

    #[test]
    fn test_new_school_materializes_active() {
        let mut draft = NewSchool::new("Riverside");
        draft.board_ids = vec!["1".into()];
        let school = draft.into_school(SchoolId::from("99"));
        assert!(school.is_active);
        assert!(school.boards.is_empty());
        assert_eq!(school.id.as_str(), "99");
    }
}
