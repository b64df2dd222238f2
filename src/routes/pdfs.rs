use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use log::info;

use super::yearly::{self, Pdfs};
use crate::app::SharedState;
use crate::error::AppError;
use crate::group::{AppendMode, Group, GroupKey, PdfEntry};
use crate::normalize;
use crate::uploads::{discard_upload, save_upload};

/// Largest accepted upload request
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Multipart field carrying the file
pub const FILE_FIELD: &str = "pdf";

pub fn router() -> Router<SharedState> {
    yearly::router::<Pdfs>("/getpdfs", "pdfs")
        .route("/append-pdfs", post(append_pdfs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

struct Upload {
    year: Option<String>,
    label: Option<String>,
    description: Option<String>,
    file: Option<(String, Bytes)>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut upload = Upload {
        year: None,
        label: None,
        description: None,
        file: None,
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "year" => upload.year = Some(field.text().await?),
            "label" => upload.label = Some(field.text().await?),
            "description" => upload.description = Some(field.text().await?),
            FILE_FIELD => {
                let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    upload.file = Some((file_name, bytes));
                }
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// Store one uploaded PDF and record it on an existing group
///
/// The group must exist before the file is written. If recording fails the
/// file is removed again.
pub async fn append_pdfs(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> Result<Json<Group<PdfEntry>>, AppError> {
    let upload = read_upload(multipart).await?;

    let (year, label, (file_name, bytes)) = match (
        normalize::optional_key_field(upload.year.as_deref()),
        normalize::optional_key_field(upload.label.as_deref()),
        upload.file,
    ) {
        (Some(year), Some(label), Some(file)) => (year, label, file),
        _ => {
            return Err(AppError::validation(
                "Year, label, and a PDF file are required.",
            ));
        }
    };

    let key = GroupKey::yearly(year, label);
    if state.db.pdfs.find(&key)?.is_none() {
        return Err(AppError::not_found(format!(
            "No document found for year {} with label '{}'.",
            key.year, key.label
        )));
    }

    let stored = save_upload(&state.upload_dir, &file_name, &bytes).await?;
    let entry = PdfEntry::new(
        stored.url.clone(),
        normalize::pdf_description(upload.description.as_deref()),
    );

    match state.db.pdfs.append(&key, vec![entry], AppendMode::Concat) {
        Ok(group) => {
            info!("Attached {} to pdfs {}", stored.file_name, key);
            Ok(Json(group))
        }
        Err(e) => {
            discard_upload(&stored).await;
            Err(e.into())
        }
    }
}
