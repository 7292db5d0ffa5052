//! School directory
//!
//! Status-filtered school list, the activate/deactivate state machine with
//! its confirmation gate, and text search.

mod search;
mod service;
mod transition;

pub use search::{search, Searchable, DEFAULT_SCHOOL_FIELDS};
pub use service::{DirectoryView, RefreshOutcome, SchoolDirectoryService, StatusFilter};
pub use transition::{PendingConfirmation, Transition};
