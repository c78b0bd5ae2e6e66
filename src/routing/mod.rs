//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (method gate, prefix checks)
//!     → Return: Dispatch (static asset | raw resource | document)
//!               or MethodNotAllowed
//! ```
//!
//! # Design Decisions
//! - Fixed prefixes, no regex in the dispatch path
//! - Deterministic: same input always dispatches the same way
//! - Static prefix is checked before the resource prefix

pub mod router;

pub use router::{dispatch, Dispatch, MethodNotAllowed, RESOURCE_PREFIX, STATIC_PREFIX};
