//! School directory service
//!
//! Owns the school list behind the directory view: which status filter is
//! selected, what the last accepted response contained, and whether the view
//! should offer a retry. Responses that arrive after a newer request was
//! issued are discarded.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::api::{DirectoryApi, SchoolList};
use crate::error::{Error, Result};
use crate::notify::{Notification, Notifier};
use crate::types::{Board, NewSchool, School, SchoolId};

use super::search::search;

// ─────────────────────────────────────────────────────────────────
// View state
// ─────────────────────────────────────────────────────────────────

/// Which half of the directory is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum StatusFilter {
    #[default]
    Active,
    Inactive,
}

impl StatusFilter {
    pub fn from_flag(is_active: bool) -> Self {
        if is_active {
            StatusFilter::Active
        } else {
            StatusFilter::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, StatusFilter::Active)
    }
}

/// Snapshot of the directory view
#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectoryView {
    pub filter: StatusFilter,

    pub schools: Vec<School>,

    /// A request for the current filter is in flight
    pub loading: bool,

    /// The last read failed; the list is empty and a retry should be offered
    pub fetch_failed: bool,

    /// Description of the last read failure
    pub last_error: Option<String>,

    /// Token of the most recently issued list request
    pub generation: u64,
}

/// What happened to a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response became the visible list
    Applied { count: usize },

    /// A newer request superseded this one
    Discarded,

    /// The read failed; the view now shows an empty list and a retry prompt
    Failed,
}

// ─────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────

pub struct SchoolDirectoryService {
    api: Arc<dyn DirectoryApi>,
    notifier: Arc<dyn Notifier>,
    view: RwLock<DirectoryView>,
}

impl SchoolDirectoryService {
    pub fn new(api: Arc<dyn DirectoryApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            view: RwLock::new(DirectoryView::default()),
        }
    }

    /// Copy of the current view state
    pub fn view(&self) -> DirectoryView {
        self.view.read().clone()
    }

    pub fn selected_filter(&self) -> StatusFilter {
        self.view.read().filter
    }

    // ─────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────

    /// Fetch schools with the given activation flag.
    ///
    /// Filtering happens on the server. Entries that still carry the wrong
    /// flag are dropped so the result never mixes the two states.
    #[instrument(skip(self), fields(api = self.api.name()))]
    pub async fn list_by_status(&self, is_active: bool) -> Result<SchoolList> {
        let list = self.api.list_by_status(is_active).await?;
        let received = list.schools.len();

        let schools: Vec<School> = list
            .schools
            .into_iter()
            .filter(|s| s.is_active == is_active)
            .collect();

        if schools.len() != received {
            warn!(
                dropped = received - schools.len(),
                "Server returned schools with the wrong activation flag"
            );
        }
        debug!(count = schools.len(), "School list fetched");

        Ok(SchoolList { schools })
    }

    /// Select a status filter and load its list
    pub async fn select_filter(&self, filter: StatusFilter) -> RefreshOutcome {
        self.view.write().filter = filter;
        self.refresh().await
    }

    /// Reload the list for the currently selected filter.
    ///
    /// On failure the visible list is cleared and `fetch_failed` is set; an
    /// error notification is sent. A response is only applied if no newer
    /// request was issued while it was in flight.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (filter, generation) = {
            let mut view = self.view.write();
            view.generation += 1;
            view.loading = true;
            (view.filter, view.generation)
        };

        let result = self.list_by_status(filter.is_active()).await;

        let mut view = self.view.write();
        if view.generation != generation || view.filter != filter {
            debug!(
                ?filter,
                generation,
                current = view.generation,
                "Discarding stale school list response"
            );
            return RefreshOutcome::Discarded;
        }
        view.loading = false;

        match result {
            Ok(list) => {
                let count = list.schools.len();
                view.schools = list.schools;
                view.fetch_failed = false;
                view.last_error = None;
                RefreshOutcome::Applied { count }
            }
            Err(e) => {
                warn!(error = %e.format_for_log(), ?filter, "School list fetch failed");
                view.schools.clear();
                view.fetch_failed = true;
                view.last_error = Some(e.to_string());
                drop(view);
                self.notifier
                    .notify(Notification::error("Failed to load schools", e.to_string()));
                RefreshOutcome::Failed
            }
        }
    }

    /// Search the visible list
    pub fn search_view<S: AsRef<str>>(&self, term: &str, fields: &[S]) -> Vec<School> {
        search(&self.view.read().schools, term, fields)
    }

    /// Look up one school
    pub async fn get_by_id(&self, id: &SchoolId) -> Result<School> {
        self.api.get_by_id(id).await.map_err(|e| {
            self.notifier
                .notify(Notification::error("Failed to load school", e.to_string()));
            e
        })
    }

    /// All boards, or the boards of one school
    pub async fn boards(&self, school: Option<&SchoolId>) -> Result<Vec<Board>> {
        let result = match school {
            Some(id) => self.api.boards_for_school(id).await,
            None => self.api.list_boards().await,
        };
        result.map_err(|e| {
            self.notifier
                .notify(Notification::error("Failed to load boards", e.to_string()));
            e
        })
    }

    // ─────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────

    /// Change a school's activation flag.
    ///
    /// Role checks belong to the caller. The server's confirmation message
    /// is returned; a reply without one counts as a failure. The visible list
    /// is untouched on failure and reloaded for the selected filter after
    /// success.
    #[instrument(skip(self), fields(api = self.api.name()))]
    pub async fn set_active(&self, id: &SchoolId, target_active: bool) -> Result<String> {
        let action = if target_active { "reactivate" } else { "deactivate" };

        let reply = if target_active {
            self.api.reactivate(id).await
        } else {
            self.api.deactivate(id).await
        };

        let message = match reply {
            Ok(reply) => match reply.confirmation() {
                Some(message) => message.to_string(),
                None => {
                    return Err(self.transition_failed(Error::transition_failed(
                        id.as_str(),
                        action,
                        "server did not confirm the change",
                    )))
                }
            },
            Err(e @ Error::TransitionFailed { .. }) => return Err(self.transition_failed(e)),
            Err(e) => {
                return Err(self.transition_failed(Error::transition_failed(
                    id.as_str(),
                    action,
                    e.to_string(),
                )))
            }
        };

        info!(school_id = %id, action, %message, "School transition confirmed");
        self.notifier.notify(Notification::success("Success", &message));

        self.refresh().await;
        Ok(message)
    }

    fn transition_failed(&self, e: Error) -> Error {
        warn!(error = %e.format_for_log(), "School transition failed");
        self.notifier
            .notify(Notification::error("Status change failed", e.to_string()));
        e
    }

    /// Register a school and reload the selected list
    pub async fn register(&self, draft: NewSchool) -> Result<School> {
        match self.api.create(draft).await {
            Ok(school) => {
                info!(school_id = %school.id, name = %school.name, "School registered");
                self.notifier.notify(Notification::success(
                    "School created",
                    format!("{} was registered", school.name),
                ));
                self.refresh().await;
                Ok(school)
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::error("Failed to create school", e.to_string()));
                Err(e)
            }
        }
    }
}
