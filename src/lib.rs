//! School console core
//!
//! School directory lifecycle (listing by activation state, confirmation-gated
//! deactivate/reactivate, search) and role-scoped dashboard aggregation, over
//! a remote school management API or a local seed store.

pub mod api;
pub mod config;
pub mod dashboard;
pub mod directory;
pub mod error;
pub mod logging;
pub mod notify;
pub mod seed;
pub mod types;

pub use error::{Error, ErrorCode, Result};
