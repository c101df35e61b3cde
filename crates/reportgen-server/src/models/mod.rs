//! Database models

pub mod report;

pub use report::{Report, ReportView};
