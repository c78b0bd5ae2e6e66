//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, handler)
//!     → request.rs (request ID assigned and propagated)
//!     → routing::dispatch (static | resource | document)
//!     → assets / upstream + rewrite
//!     → response.rs (headers, error → status mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, MakeRequestUuid, X_REQUEST_ID};
pub use response::MirrorError;
pub use server::{AppState, HttpServer, ServerError};
