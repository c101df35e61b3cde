//! Feature slices exposed under `/api/v1`
//!
//! Each feature follows the structure:
//! - `commands/` - write operations
//! - `queries/` - read operations
//! - `routes.rs` - HTTP route definitions

pub mod reports;

use axum::Router;

pub use reports::ReportsState;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub reports: ReportsState,
}

/// Creates the API router with all feature routes mounted
///
/// - `/reports` - report submission and retrieval
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest("/reports", reports::reports_routes().with_state(state.reports))
}
