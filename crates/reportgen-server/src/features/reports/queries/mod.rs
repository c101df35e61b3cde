pub mod get;

pub use get::{GetReportError, GetReportQuery};
