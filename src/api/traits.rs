//! Collaborator contracts
//!
//! The directory and home-summary services the console consumes. Reads fail
//! with `FetchFailed`, `FetchTimeout` or `MalformedResponse`; activation
//! writes fail with `TransitionFailed`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Board, CurrentUser, NewSchool, RoleSummary, School, SchoolId};

// ─────────────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────────────

/// Directory query result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolList {
    #[serde(default)]
    pub schools: Vec<School>,
}

/// Single-school lookup result
#[derive(Debug, Clone, Deserialize)]
pub struct SchoolEnvelope {
    pub school: School,
}

/// Board query result
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardList {
    #[serde(default)]
    pub boards: Vec<Board>,
}

/// Reply to a deactivate or reactivate request.
///
/// A reply without a non-empty message is not a confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionReply {
    #[serde(default)]
    pub message: Option<String>,
}

impl TransitionReply {
    pub fn confirmed(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// The confirmation message, if the server actually sent one
    pub fn confirmation(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────
// Traits
// ─────────────────────────────────────────────────────────────────

/// School directory service
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    /// Implementation name for logging
    fn name(&self) -> &'static str;

    /// Schools whose activation flag equals `is_active`, filtered server-side
    async fn list_by_status(&self, is_active: bool) -> Result<SchoolList>;

    /// Look up one school
    async fn get_by_id(&self, id: &SchoolId) -> Result<School>;

    /// Soft-delete: clears the activation flag, the school is kept
    async fn deactivate(&self, id: &SchoolId) -> Result<TransitionReply>;

    /// Sets the activation flag again
    async fn reactivate(&self, id: &SchoolId) -> Result<TransitionReply>;

    /// Register a new school
    async fn create(&self, draft: NewSchool) -> Result<School>;

    /// All curriculum boards
    async fn list_boards(&self) -> Result<Vec<Board>>;

    /// Boards attached to one school
    async fn boards_for_school(&self, id: &SchoolId) -> Result<Vec<Board>>;
}

/// Home summary service. The payload is scoped to `user`'s role; a remote
/// server derives the user from the bearer token.
#[async_trait]
pub trait SummaryApi: Send + Sync {
    async fn get_summary(&self, user: &CurrentUser) -> Result<RoleSummary>;
}
