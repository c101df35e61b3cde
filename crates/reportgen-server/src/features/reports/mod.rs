//! Report submission and retrieval

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::reports_routes;

use std::sync::Arc;

use crate::db::ReportStore;
use crate::queue::MessageQueue;
use crate::reports::DownloadLinkResolver;

/// State shared by the report routes.
#[derive(Clone)]
pub struct ReportsState {
    pub reports: Arc<dyn ReportStore>,
    pub queue: Arc<dyn MessageQueue>,
    pub links: DownloadLinkResolver,
}
