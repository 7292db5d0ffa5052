//! Role dashboard aggregation
//!
//! Maps the loose home summary onto the caller's descriptor table. Missing,
//! null or non-numeric values fall back to the descriptor default, so a
//! dashboard always has a value for every metric. A failed fetch yields the
//! same defaults with `unavailable` set.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{DirectoryApi, SummaryApi};
use crate::error::{Error, Result};
use crate::notify::{Notification, Notifier};
use crate::types::{CurrentUser, Role, RoleSummary, School, SchoolId};

use super::descriptors::descriptors;

// ─────────────────────────────────────────────────────────────────
// Normalized output
// ─────────────────────────────────────────────────────────────────

/// One resolved metric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub key: &'static str,
    pub label: &'static str,
    pub link: &'static str,
    pub value: u64,

    /// The value came from the payload rather than the default
    pub reported: bool,
}

/// Metrics for one role, in descriptor order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedMetrics {
    pub role: Role,
    pub metrics: Vec<Metric>,

    /// The summary could not be fetched; values are defaults, not zeros
    /// reported by the server
    pub unavailable: bool,
}

impl NormalizedMetrics {
    /// Value of a metric by payload key
    pub fn value(&self, key: &str) -> Option<u64> {
        self.metrics.iter().find(|m| m.key == key).map(|m| m.value)
    }
}

/// Normalize a raw summary for `role`. `None` means the fetch failed.
pub fn summarize(role: Role, raw: Option<&RoleSummary>) -> NormalizedMetrics {
    let metrics = descriptors(role)
        .iter()
        .map(|d| {
            let reported = raw.and_then(|summary| summary.count(d.key));
            Metric {
                key: d.key,
                label: d.label,
                link: d.link,
                value: reported.unwrap_or(d.default),
                reported: reported.is_some(),
            }
        })
        .collect();

    NormalizedMetrics {
        role,
        metrics,
        unavailable: raw.is_none(),
    }
}

/// Contact card for the school an Admin manages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchoolCard {
    pub id: SchoolId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub boards: Vec<String>,
    pub is_active: bool,
}

impl From<School> for SchoolCard {
    fn from(school: School) -> Self {
        let boards = school.boards.into_iter().map(|b| b.name).collect();
        Self {
            id: school.id,
            name: school.name,
            address: school.address,
            phone: school.phone,
            email: school.email,
            boards,
            is_active: school.is_active,
        }
    }
}

/// Result of the Admin school join
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SchoolJoin {
    /// The role has no school card
    NotApplicable,
    Loaded(SchoolCard),
    /// The lookup failed or no affiliation is known
    Unavailable(String),
}

/// Everything the home page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub metrics: NormalizedMetrics,
    pub school: SchoolJoin,
    pub fetched_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────
// Aggregator
// ─────────────────────────────────────────────────────────────────

pub struct DashboardAggregator {
    summary_api: Arc<dyn SummaryApi>,
    directory_api: Arc<dyn DirectoryApi>,
    notifier: Arc<dyn Notifier>,
    snapshot: RwLock<Option<Dashboard>>,
}

impl DashboardAggregator {
    pub fn new(
        summary_api: Arc<dyn SummaryApi>,
        directory_api: Arc<dyn DirectoryApi>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            summary_api,
            directory_api,
            notifier,
            snapshot: RwLock::new(None),
        }
    }

    /// Last dashboard produced by [`load`](Self::load)
    pub fn snapshot(&self) -> Option<Dashboard> {
        self.snapshot.read().clone()
    }

    /// Fetch and normalize the dashboard for `user`.
    ///
    /// For an Admin the managed school is fetched alongside the summary.
    /// Either fetch may fail without affecting the other.
    pub async fn load(&self, user: &CurrentUser) -> Dashboard {
        let (summary, school) = tokio::join!(self.fetch_summary(user), self.fetch_school(user));

        let metrics = summarize(user.role, summary.as_ref());
        debug!(
            role = %user.role,
            unavailable = metrics.unavailable,
            "Dashboard metrics normalized"
        );

        let dashboard = Dashboard {
            metrics,
            school,
            fetched_at: Utc::now(),
        };
        *self.snapshot.write() = Some(dashboard.clone());
        dashboard
    }

    async fn fetch_summary(&self, user: &CurrentUser) -> Option<RoleSummary> {
        match self.summary_api.get_summary(user).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(error = %e.format_for_log(), "Dashboard summary unavailable");
                self.notifier.notify(Notification::error(
                    "Failed to load dashboard",
                    e.to_string(),
                ));
                None
            }
        }
    }

    async fn fetch_school(&self, user: &CurrentUser) -> SchoolJoin {
        if user.role != Role::Admin {
            return SchoolJoin::NotApplicable;
        }

        match self.admin_school(user).await {
            Ok(school) => SchoolJoin::Loaded(school.into()),
            Err(e) => {
                warn!(error = %e.format_for_log(), "Managed school unavailable");
                self.notifier.notify(Notification::error(
                    "Failed to load school details",
                    e.to_string(),
                ));
                SchoolJoin::Unavailable(e.to_string())
            }
        }
    }

    async fn admin_school(&self, user: &CurrentUser) -> Result<School> {
        let id = user.require_school()?;
        self.directory_api.get_by_id(id).await
    }
}
