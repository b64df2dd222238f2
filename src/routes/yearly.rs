//! Link and PDF handlers
//!
//! Both collections are keyed by (year, label). Adding values differs: links
//! arrive as JSON, PDFs as multipart uploads (see [`super::pdfs`]).
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post, put},
};
use log::info;
use serde::Deserialize;

use super::{ExportQuery, download, required};
use crate::app::SharedState;
use crate::downloader::Table;
use crate::error::AppError;
use crate::group::{AppendMode, Group, GroupFilter, GroupKey, GroupValue, PdfEntry};
use crate::normalize;
use crate::stats::{self, ItemStats};
use crate::store::{Collection, Database};

/// Selects one of the yearly collections
pub trait YearlyKind: Send + Sync + 'static {
    type Value: GroupValue;

    /// Plural noun used in messages and file names
    const NOUN: &'static str;
    /// Label given to the first group of a year when none is supplied
    const DEFAULT_LABEL: &'static str;

    fn collection(db: &Database) -> &Collection<Self::Value>;

    fn export_table(groups: &[Group<Self::Value>]) -> Table;
}

pub enum Links {}

impl YearlyKind for Links {
    type Value = String;

    const NOUN: &'static str = "links";
    const DEFAULT_LABEL: &'static str = "Edit this label";

    fn collection(db: &Database) -> &Collection<String> {
        &db.links
    }

    fn export_table(groups: &[Group<String>]) -> Table {
        Table::from_groups("Links", "Links", groups, false)
    }
}

pub enum Pdfs {}

impl YearlyKind for Pdfs {
    type Value = PdfEntry;

    const NOUN: &'static str = "pdfs";
    const DEFAULT_LABEL: &'static str = "EDIT THIS LABEL";

    fn collection(db: &Database) -> &Collection<PdfEntry> {
        &db.pdfs
    }

    fn export_table(groups: &[Group<PdfEntry>]) -> Table {
        Table::from_pdfs(groups)
    }
}

/// Body of `POST /add-year` and `POST /add-labels`
///
/// Existing clients send the values under `Links` or `pdfs`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "V: GroupValue"))]
pub struct YearBody<V> {
    pub year: Option<String>,
    pub label: Option<String>,
    #[serde(default = "Vec::new", alias = "Links", alias = "pdfs")]
    pub values: Vec<V>,
}

/// Body of `PUT /update` and `PUT /update-label`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameBody {
    pub year: Option<String>,
    pub old_label: Option<String>,
    pub new_label: Option<String>,
}

/// Body of `PUT /append-links`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendLinksBody {
    pub year: Option<String>,
    pub label: Option<String>,
    #[serde(default, alias = "values")]
    pub new_links: Vec<String>,
    #[serde(default)]
    pub dedup: bool,
}

pub fn router<K: YearlyKind>(all_path: &str, values_segment: &str) -> Router<SharedState> {
    Router::new()
        .route("/add-year", post(add_year::<K>))
        .route("/add-labels", post(add_label::<K>))
        .route("/update-label", put(update_label::<K>))
        .route("/unique-years", get(unique_years::<K>))
        .route(all_path, get(all::<K>))
        .route("/stats", get(summary::<K>))
        .route("/export", get(export::<K>))
        .route("/:year/labels", get(labels_for_year::<K>))
        .route(&format!("/:year/:label/{values_segment}"), get(values::<K>))
}

/// Router for links, including the JSON append route
pub fn links_router() -> Router<SharedState> {
    router::<Links>("/alllinks", "links")
        .route("/append-links", put(append_links))
        .route("/update", put(update_links))
}

/// Start a new year, 409 when the year already has groups
pub async fn add_year<K: YearlyKind>(
    State(state): State<SharedState>,
    Json(body): Json<YearBody<K::Value>>,
) -> Result<(StatusCode, Json<Group<K::Value>>), AppError> {
    let year = required(body.year.as_deref(), "Year")?;
    let label = normalize::optional_key_field(body.label.as_deref())
        .unwrap_or_else(|| K::DEFAULT_LABEL.to_string());

    let group = K::collection(&state.db).create_year(GroupKey::yearly(year, label), body.values)?;
    info!("Created {} year {}", K::NOUN, group.year);

    Ok((StatusCode::CREATED, Json(group)))
}

/// Add a label to a year, 409 when it already exists
pub async fn add_label<K: YearlyKind>(
    State(state): State<SharedState>,
    Json(body): Json<YearBody<K::Value>>,
) -> Result<(StatusCode, Json<Group<K::Value>>), AppError> {
    let (year, label) = match (
        normalize::optional_key_field(body.year.as_deref()),
        normalize::optional_key_field(body.label.as_deref()),
    ) {
        (Some(year), Some(label)) => (year, label),
        _ => return Err(AppError::validation("Year and label are required.")),
    };

    let group = K::collection(&state.db).create(GroupKey::yearly(year, label), body.values)?;
    info!("Created {} label {}", K::NOUN, group.key());

    Ok((StatusCode::CREATED, Json(group)))
}

fn rename_key(body: &RenameBody) -> Result<(GroupKey, String), AppError> {
    let key = GroupKey::yearly(
        required(body.year.as_deref(), "Year")?,
        required(body.old_label.as_deref(), "Old label")?,
    );
    let new_label = required(body.new_label.as_deref(), "New label")?;
    Ok((key, new_label))
}

/// Rename a label, 409 when the destination exists
pub async fn update_label<K: YearlyKind>(
    State(state): State<SharedState>,
    Json(body): Json<RenameBody>,
) -> Result<Json<Group<K::Value>>, AppError> {
    let (key, new_label) = rename_key(&body)?;

    let group = K::collection(&state.db).rename(&key, &new_label)?;
    info!("Renamed {} label {} to '{}'", K::NOUN, key, new_label);

    Ok(Json(group))
}

pub async fn unique_years<K: YearlyKind>(
    State(state): State<SharedState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(K::collection(&state.db).unique_years()?))
}

pub async fn all<K: YearlyKind>(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Group<K::Value>>>, AppError> {
    Ok(Json(K::collection(&state.db).all()?))
}

pub async fn summary<K: YearlyKind>(
    State(state): State<SharedState>,
) -> Result<Json<ItemStats>, AppError> {
    let groups = K::collection(&state.db).all()?;
    Ok(Json(stats::item_stats(&groups)))
}

pub async fn export<K: YearlyKind>(
    State(state): State<SharedState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = query.format()?;
    let groups = K::collection(&state.db).all()?;

    download(&K::export_table(&groups), format, K::NOUN)
}

/// Every group of a year, 404 when the year is unknown
pub async fn labels_for_year<K: YearlyKind>(
    State(state): State<SharedState>,
    Path(year): Path<String>,
) -> Result<Json<Vec<Group<K::Value>>>, AppError> {
    let year = required(Some(&year), "Year")?;

    let groups = K::collection(&state.db).list(&GroupFilter::all().year(year.clone()))?;
    if groups.is_empty() {
        return Err(AppError::not_found(format!("No labels found for year {year}.")));
    }

    Ok(Json(groups))
}

pub async fn values<K: YearlyKind>(
    State(state): State<SharedState>,
    Path((year, label)): Path<(String, String)>,
) -> Result<Json<Vec<K::Value>>, AppError> {
    let key = GroupKey::yearly(
        required(Some(&year), "Year")?,
        required(Some(&label), "Label")?,
    );

    let group = K::collection(&state.db).find(&key)?.ok_or_else(|| {
        AppError::not_found(format!(
            "No {} found for year {} with label '{}'.",
            K::NOUN,
            key.year,
            key.label
        ))
    })?;

    Ok(Json(group.values))
}

/// Append links to an existing group
pub async fn append_links(
    State(state): State<SharedState>,
    Json(body): Json<AppendLinksBody>,
) -> Result<Json<Group<String>>, AppError> {
    let key = GroupKey::yearly(
        required(body.year.as_deref(), "Year")?,
        required(body.label.as_deref(), "Label")?,
    );

    let group = state
        .db
        .links
        .append(&key, body.new_links, AppendMode::from_flag(body.dedup))?;

    Ok(Json(group))
}

/// Body of `PUT /update` for links
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLinksBody {
    pub year: Option<String>,
    pub old_label: Option<String>,
    pub new_label: Option<String>,
    #[serde(alias = "newLinks")]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub dedup: bool,
}

/// Append links and/or rename a label in one step
pub async fn update_links(
    State(state): State<SharedState>,
    Json(body): Json<UpdateLinksBody>,
) -> Result<Json<Group<String>>, AppError> {
    let key = GroupKey::yearly(
        required(body.year.as_deref(), "Year")?,
        required(body.old_label.as_deref(), "Old label")?,
    );
    let new_label = normalize::optional_key_field(body.new_label.as_deref());

    if new_label.is_none() && body.values.is_none() {
        return Err(AppError::validation("Nothing to update."));
    }

    let group = state.db.links.update(
        &key,
        new_label.as_deref(),
        body.values,
        AppendMode::from_flag(body.dedup),
    )?;

    Ok(Json(group))
}
