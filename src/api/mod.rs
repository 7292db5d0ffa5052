//! Collaborator APIs
//!
//! Contracts for the directory and home-summary services plus the concrete
//! clients: remote HTTP, seed-backed local, and an in-memory mock.

mod http;
mod local;
mod mock;
mod traits;

pub use http::{HttpApi, HttpApiConfig};
pub use local::LocalDirectory;
pub use mock::{MockApi, MockConfig};
pub use traits::*;
