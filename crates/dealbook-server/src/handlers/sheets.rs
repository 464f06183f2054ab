//! Sheet record handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::{AppError, AppState};
use dealbook_core::export::{query_records, records_key_for};
use dealbook_core::Error;

/// Query parameters for sheet records
#[derive(Debug, Deserialize)]
pub struct RecordsQuery {
    /// Exact payment status, e.g. "оплачено"
    pub status: Option<String>,
}

/// GET /api/sheets - List workbook sheets
pub async fn list_sheets(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.workbook.sheet_names()?))
}

/// GET /api/sheets/:sheet/records - Sheet records, optionally filtered by status
pub async fn sheet_records(
    State(state): State<Arc<AppState>>,
    Path(sheet): Path<String>,
    Query(params): Query<RecordsQuery>,
) -> Result<Response, AppError> {
    if sheet.is_empty() || sheet.starts_with('.') || sheet.contains(['/', '\\']) {
        return Err(AppError::bad_request("Invalid sheet name"));
    }

    let key = records_key_for(&sheet);
    let data = match state
        .workbook
        .sheet(&sheet)
        .and_then(|s| s.read(state.config.export.column_limit))
    {
        Ok(data) => data,
        Err(e @ Error::SheetNotFound(_)) => return Err(AppError::not_found(&e.to_string())),
        Err(Error::EmptyDataset(_)) => {
            let body = Json(serde_json::json!({ "error": "No data", key: [] }));
            return Ok((StatusCode::NOT_FOUND, body).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let response = query_records(
        data.records,
        params.status.as_deref(),
        &state.config.fields.payments.status,
        key,
        Utc::now(),
    );
    debug!(
        "Sheet \"{}\": {} of {} records",
        sheet, response.count, response.total_count
    );

    Ok(Json(response).into_response())
}
