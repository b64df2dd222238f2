use axum::{
    Json, Router,
    extract::{Query, State},
    response::Response,
    routing::get,
};
use serde::Deserialize;

use super::download;
use crate::app::SharedState;
use crate::downloader::{ExportFormat, Layout, Table};
use crate::error::AppError;
use crate::stats::{self, Categorized, Dashboard, ListWise};

/// Contacts per row in the dashboard export
pub const EXPORT_COLUMNS: usize = 10;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/data", get(data))
        .route("/handlecontacts", get(categorized))
        .route("/contactlist", get(contact_list))
        .route("/export", get(export))
}

pub async fn data(State(state): State<SharedState>) -> Result<Json<Dashboard>, AppError> {
    let contacts = state.db.contacts.all()?;
    Ok(Json(stats::dashboard(&contacts)))
}

pub async fn categorized(State(state): State<SharedState>) -> Result<Json<Categorized>, AppError> {
    let contacts = state.db.contacts.all()?;
    Ok(Json(stats::categorize(&contacts)))
}

pub async fn contact_list(State(state): State<SharedState>) -> Result<Json<ListWise>, AppError> {
    let contacts = state.db.contacts.all()?;
    Ok(Json(stats::list_wise(&contacts)))
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardExportQuery {
    pub list: Option<String>,
    pub format: Option<String>,
}

/// Download every contact (`list=all`, default) or the unique ones (`list=unique`)
pub async fn export(
    State(state): State<SharedState>,
    Query(query): Query<DashboardExportQuery>,
) -> Result<Response, AppError> {
    let format = ExportFormat::from_query(query.format.as_deref())?;
    let summary = stats::dashboard(&state.db.contacts.all()?);

    let (values, file_stem) = match query.list.as_deref().map(str::trim) {
        None | Some("") | Some("all") => (summary.contact_list, "contacts"),
        Some("unique") => (summary.unique_contact_list, "unique-contacts"),
        Some(other) => {
            return Err(AppError::validation(format!(
                "Unknown list '{other}', expected 'all' or 'unique'."
            )));
        }
    };

    let table = Table::from_values("Contacts", "Contact", &values, Layout::Grid(EXPORT_COLUMNS));
    download(&table, format, file_stem)
}
