//! Dashboard handler

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{AppError, AppState};
use dealbook_core::{DashboardOptions, DashboardReport, Snapshot};

/// Query parameters for the dashboard
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Target year (defaults to the configured year)
    pub year: Option<String>,
}

/// GET /api/dashboard - Year-end dashboard over the configured sources
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardReport>, AppError> {
    let mut config = state.config.clone();
    if let Some(year) = params.year.as_deref() {
        config.year = year
            .parse()
            .ok()
            .filter(|y| (1900..=9999).contains(y))
            .ok_or_else(|| AppError::bad_request("Invalid year (use YYYY)"))?;
    }

    let snapshot = Snapshot::load(&config.sources, &config).await?;
    let options = DashboardOptions::from_config(&config)?;

    Ok(Json(DashboardReport::build(&snapshot, &options)))
}
