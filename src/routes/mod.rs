//! HTTP handlers, one module per family of collections
//!
//! Contacts and emails share the seasoned handlers, links and PDFs share the
//! yearly ones. The marker types select the collection and its wording.
use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::downloader::{self, ExportFormat, Table};
use crate::error::AppError;
use crate::normalize;

pub mod dashboard;
pub mod pdfs;
pub mod seasoned;
pub mod yearly;

/// `?format=` query shared by every export route
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>,
}

impl ExportQuery {
    pub fn format(&self) -> Result<ExportFormat, AppError> {
        Ok(ExportFormat::from_query(self.format.as_deref())?)
    }
}

/// Normalise a required field, naming it in the 400 message when missing
pub(crate) fn required(value: Option<&str>, field: &str) -> Result<String, AppError> {
    normalize::optional_key_field(value)
        .ok_or_else(|| AppError::validation(format!("{field} is required.")))
}

/// Build a spreadsheet download response
pub(crate) fn download(
    table: &Table,
    format: ExportFormat,
    file_stem: &str,
) -> Result<Response, AppError> {
    let bytes = downloader::render(table, format)?;
    let disposition = format!("attachment; filename={file_stem}.{}", format.extension());

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
