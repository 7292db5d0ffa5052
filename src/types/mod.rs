//! Type definitions for the school console
//!
//! Directory entities, session state and the loose home summary payload.

mod school;
mod session;
mod summary;

pub use school::*;
pub use session::*;
pub use summary::*;
