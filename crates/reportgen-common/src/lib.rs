//! Report Generation Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, logging, and error handling for the reportgen workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`CommonError`] and the crate [`Result`] alias
//! - **Logging**: tracing subscriber setup shared by the server and the worker
//! - **Types**: wire types exchanged between the API and the worker
//!   ([`JobMessage`](types::JobMessage)) and the derived
//!   [`ReportStatus`](types::ReportStatus)
//!
//! # Example
//!
//! ```no_run
//! use reportgen_common::types::JobMessage;
//! use uuid::Uuid;
//!
//! fn enqueue_body(user_id: Uuid, report_id: Uuid) -> reportgen_common::Result<String> {
//!     JobMessage::new(user_id, report_id).to_json()
//! }
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{CommonError, Result};
