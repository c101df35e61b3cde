pub mod create;

pub use create::{CreateReportCommand, CreateReportError};
