//! # Reports Testing Utils
//!
//! Shared testing utilities for the facility reports workspace.
//!
//! ## Features
//!
//! - **Mock Record Store**: In-memory implementations of all repository traits,
//!   sharing one [`FaultInjector`] so any store operation can be made to fail, hang or stall
//! - **Mock Collaborators**: object store, notifier, authority check and alert sink
//!   doubles that record every call
//! - **Test Data Builders**: Utilities for creating test entities
//! - **Helpers**: call contexts and roster seeding
//!
//! Add this crate as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! reports-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod helpers;
pub mod mocks;

// Re-export commonly used items
pub use builders::*;
pub use helpers::*;
pub use mocks::*;
