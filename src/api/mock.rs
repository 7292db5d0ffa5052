//! In-memory API for tests and offline demos
//!
//! Holds a school list, applies transitions to it, and records how often each
//! operation was called. Failures and latency are switchable at runtime.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::{Board, CurrentUser, NewSchool, RoleSummary, School, SchoolId};

use super::{DirectoryApi, SchoolList, SummaryApi, TransitionReply};

// ─────────────────────────────────────────────────────────────────
// Mock Configuration
// ─────────────────────────────────────────────────────────────────

/// Switchable mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Simulated latency for active-list reads
    pub active_list_latency: Duration,

    /// Simulated latency for inactive-list reads
    pub inactive_list_latency: Duration,

    /// Simulated latency for the summary read
    pub summary_latency: Duration,

    pub fail_list: bool,
    pub fail_get_by_id: bool,
    pub fail_transition: bool,
    pub fail_summary: bool,
    pub fail_boards: bool,

    /// Reply to transitions without a message (and without applying them)
    pub omit_transition_message: bool,

    /// Return every school from list reads regardless of the requested flag
    pub ignore_status_filter: bool,
}

/// Track method call counts for verification
#[derive(Debug, Default, Clone)]
struct CallCounts {
    list_by_status: u32,
    get_by_id: u32,
    deactivate: u32,
    reactivate: u32,
    create: u32,
    list_boards: u32,
    boards_for_school: u32,
    get_summary: u32,
}

// ─────────────────────────────────────────────────────────────────
// MockApi
// ─────────────────────────────────────────────────────────────────

pub struct MockApi {
    config: RwLock<MockConfig>,
    schools: RwLock<Vec<School>>,
    boards: RwLock<Vec<Board>>,
    summary: RwLock<Option<RoleSummary>>,
    call_counts: RwLock<CallCounts>,
    next_id: RwLock<u64>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::with_schools(Vec::new())
    }

    pub fn with_schools(schools: Vec<School>) -> Self {
        Self {
            config: RwLock::new(MockConfig::default()),
            schools: RwLock::new(schools),
            boards: RwLock::new(Vec::new()),
            summary: RwLock::new(Some(RoleSummary::new())),
            call_counts: RwLock::new(CallCounts::default()),
            next_id: RwLock::new(1000),
        }
    }

    /// Replace the whole behavior configuration
    pub fn set_config(&self, config: MockConfig) {
        *self.config.write() = config;
    }

    /// Adjust the behavior configuration in place
    pub fn configure(&self, f: impl FnOnce(&mut MockConfig)) {
        f(&mut self.config.write());
    }

    pub fn set_summary(&self, summary: Option<RoleSummary>) {
        *self.summary.write() = summary;
    }

    pub fn set_boards(&self, boards: Vec<Board>) {
        *self.boards.write() = boards;
    }

    /// Current server-side copy of a school
    pub fn school(&self, id: &str) -> Option<School> {
        self.schools
            .read()
            .iter()
            .find(|s| s.id.as_str() == id)
            .cloned()
    }

    /// Get the number of times a method was called
    pub fn call_count(&self, method: &str) -> u32 {
        let counts = self.call_counts.read();
        match method {
            "list_by_status" => counts.list_by_status,
            "get_by_id" => counts.get_by_id,
            "deactivate" => counts.deactivate,
            "reactivate" => counts.reactivate,
            "create" => counts.create,
            "list_boards" => counts.list_boards,
            "boards_for_school" => counts.boards_for_school,
            "get_summary" => counts.get_summary,
            _ => 0,
        }
    }

    /// Reset all call counts
    pub fn reset_counts(&self) {
        *self.call_counts.write() = CallCounts::default();
    }

    async fn simulate_latency(delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn apply_transition(
        &self,
        id: &SchoolId,
        target: bool,
        action: &'static str,
        fail: bool,
    ) -> Result<TransitionReply> {
        let config = self.config.read().clone();
        if fail {
            return Err(Error::transition_failed(id.as_str(), action, "mock transition failure"));
        }
        if config.omit_transition_message {
            return Ok(TransitionReply::default());
        }

        let mut schools = self.schools.write();
        let school = schools
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| Error::transition_failed(id.as_str(), action, "HTTP 404: School not found"))?;
        school.is_active = target;

        Ok(TransitionReply::confirmed(if target {
            "School reactivated"
        } else {
            "School deactivated"
        }))
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryApi for MockApi {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_by_status(&self, is_active: bool) -> Result<SchoolList> {
        self.call_counts.write().list_by_status += 1;
        let config = self.config.read().clone();

        Self::simulate_latency(if is_active {
            config.active_list_latency
        } else {
            config.inactive_list_latency
        })
        .await;

        if config.fail_list {
            return Err(Error::fetch_failed("school list", "mock list failure"));
        }

        let schools = self
            .schools
            .read()
            .iter()
            .filter(|s| config.ignore_status_filter || s.is_active == is_active)
            .cloned()
            .collect();
        Ok(SchoolList { schools })
    }

    async fn get_by_id(&self, id: &SchoolId) -> Result<School> {
        self.call_counts.write().get_by_id += 1;
        if self.config.read().fail_get_by_id {
            return Err(Error::fetch_failed("school", "mock lookup failure"));
        }
        self.school(id.as_str())
            .ok_or_else(|| Error::fetch_failed("school", "HTTP 404: School not found"))
    }

    async fn deactivate(&self, id: &SchoolId) -> Result<TransitionReply> {
        self.call_counts.write().deactivate += 1;
        let fail = self.config.read().fail_transition;
        self.apply_transition(id, false, "deactivate", fail)
    }

    async fn reactivate(&self, id: &SchoolId) -> Result<TransitionReply> {
        self.call_counts.write().reactivate += 1;
        let fail = self.config.read().fail_transition;
        self.apply_transition(id, true, "reactivate", fail)
    }

    async fn create(&self, draft: NewSchool) -> Result<School> {
        self.call_counts.write().create += 1;
        let id = {
            let mut next = self.next_id.write();
            *next += 1;
            *next
        };
        let school = draft.into_school(SchoolId::from(id.to_string()));
        self.schools.write().push(school.clone());
        Ok(school)
    }

    async fn list_boards(&self) -> Result<Vec<Board>> {
        self.call_counts.write().list_boards += 1;
        if self.config.read().fail_boards {
            return Err(Error::fetch_failed("board list", "mock board failure"));
        }
        Ok(self.boards.read().clone())
    }

    async fn boards_for_school(&self, id: &SchoolId) -> Result<Vec<Board>> {
        self.call_counts.write().boards_for_school += 1;
        if self.config.read().fail_boards {
            return Err(Error::fetch_failed("school boards", "mock board failure"));
        }
        self.school(id.as_str())
            .map(|s| s.boards)
            .ok_or_else(|| Error::fetch_failed("school boards", "HTTP 404: School not found"))
    }
}

#[async_trait]
impl SummaryApi for MockApi {
    async fn get_summary(&self, _user: &CurrentUser) -> Result<RoleSummary> {
        self.call_counts.write().get_summary += 1;
        let config = self.config.read().clone();
        Self::simulate_latency(config.summary_latency).await;

        if config.fail_summary {
            return Err(Error::fetch_failed("dashboard summary", "mock summary failure"));
        }
        self.summary
            .read()
            .clone()
            .ok_or_else(|| Error::malformed("dashboard summary", "response has no data object"))
    }
}
