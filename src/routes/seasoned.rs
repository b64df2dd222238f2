//! Contact and email handlers
//!
//! Both collections are keyed by (year, season, label) and expose the same
//! routes. They differ only in what `POST /add` does to an existing group:
//! contacts replace the list, emails append to it.
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
use crate::group::{AppendMode, Group, GroupFilter, GroupKey};
use crate::normalize;
use crate::stats::{self, Dashboard};
use crate::store::{Collection, Database};

/// What `POST /add` does when the group already exists
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddMode {
    Replace,
    Append,
}

/// Selects one of the seasoned collections
pub trait SeasonedKind: Send + Sync + 'static {
    /// Plural noun used in messages and file names
    const NOUN: &'static str;
    /// Worksheet name and values column header of the export
    const SHEET: &'static str;
    const ADD_MODE: AddMode;

    fn collection(db: &Database) -> &Collection<String>;
}

pub enum Contacts {}

impl SeasonedKind for Contacts {
    const NOUN: &'static str = "contacts";
    const SHEET: &'static str = "Contacts";
    const ADD_MODE: AddMode = AddMode::Replace;

    fn collection(db: &Database) -> &Collection<String> {
        &db.contacts
    }
}

pub enum Emails {}

impl SeasonedKind for Emails {
    const NOUN: &'static str = "emails";
    const SHEET: &'static str = "Emails";
    const ADD_MODE: AddMode = AddMode::Append;

    fn collection(db: &Database) -> &Collection<String> {
        &db.emails
    }
}

/// Body of `POST /add`
///
/// Existing clients send the values under `contacts` or `emails`.
#[derive(Debug, Deserialize)]
pub struct AddBody {
    pub year: Option<String>,
    pub season: Option<String>,
    pub label: Option<String>,
    #[serde(default, alias = "contacts", alias = "emails")]
    pub values: Vec<String>,
}

/// Body of `POST /add-label`
#[derive(Debug, Deserialize)]
pub struct LabelBody {
    pub year: Option<String>,
    pub season: Option<String>,
    pub label: Option<String>,
}

/// Body of `PUT /update` and `PUT /update-label`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    pub year: Option<String>,
    pub season: Option<String>,
    pub old_label: Option<String>,
    pub new_label: Option<String>,
    #[serde(alias = "contacts", alias = "emails")]
    pub values: Option<Vec<String>>,
    #[serde(default)]
    pub dedup: bool,
}

fn key(
    year: Option<&str>,
    season: Option<&str>,
    label: Option<&str>,
    label_field: &str,
) -> Result<GroupKey, AppError> {
    Ok(GroupKey::new(
        required(year, "Year")?,
        Some(required(season, "Season")?),
        required(label, label_field)?,
    ))
}

pub fn router<K: SeasonedKind>(all_path: &str) -> Router<SharedState> {
    Router::new()
        .route("/add", post(add::<K>))
        .route("/add-label", post(add_label::<K>))
        .route("/update", put(update::<K>))
        .route("/update-label", put(update_label::<K>))
        .route("/season", get(seasons::<K>))
        .route(all_path, get(all::<K>))
        .route("/export", get(export::<K>))
        .route("/stats", get(summary::<K>))
        .route("/:year/:season", get(by_season::<K>))
        .route("/:year/:season/:label", get(by_label::<K>))
        .route("/:year/:season/:label/values", get(values::<K>))
}

/// Create a group or merge values into it
pub async fn add<K: SeasonedKind>(
    State(state): State<SharedState>,
    Json(body): Json<AddBody>,
) -> Result<(StatusCode, Json<Group<String>>), AppError> {
    let key = key(
        body.year.as_deref(),
        body.season.as_deref(),
        body.label.as_deref(),
        "Label",
    )?;
    let collection = K::collection(&state.db);

    let (group, created) = match K::ADD_MODE {
        AddMode::Replace => collection.upsert_replace(key, body.values)?,
        AddMode::Append => collection.upsert_append(key, body.values, AppendMode::Concat)?,
    };

    let status = if created {
        info!("Created {} group {}", K::NOUN, group.key());
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(group)))
}

/// Create an empty group, 409 when the label already exists
pub async fn add_label<K: SeasonedKind>(
    State(state): State<SharedState>,
    Json(body): Json<LabelBody>,
) -> Result<(StatusCode, Json<Group<String>>), AppError> {
    let key = key(
        body.year.as_deref(),
        body.season.as_deref(),
        body.label.as_deref(),
        "Label",
    )?;

    let group = K::collection(&state.db).create(key, Vec::new())?;
    info!("Created {} label {}", K::NOUN, group.key());

    Ok((StatusCode::CREATED, Json(group)))
}

/// Append values and/or rename a label
pub async fn update<K: SeasonedKind>(
    State(state): State<SharedState>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Group<String>>, AppError> {
    let key = key(
        body.year.as_deref(),
        body.season.as_deref(),
        body.old_label.as_deref(),
        "Old label",
    )?;
    let new_label = normalize::optional_key_field(body.new_label.as_deref());

    if new_label.is_none() && body.values.is_none() {
        return Err(AppError::validation("Nothing to update."));
    }

    let group = K::collection(&state.db).update(
        &key,
        new_label.as_deref(),
        body.values,
        AppendMode::from_flag(body.dedup),
    )?;

    Ok(Json(group))
}

/// Rename a label, 409 when the destination exists
pub async fn update_label<K: SeasonedKind>(
    State(state): State<SharedState>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<Group<String>>, AppError> {
    let key = key(
        body.year.as_deref(),
        body.season.as_deref(),
        body.old_label.as_deref(),
        "Old label",
    )?;
    let new_label = required(body.new_label.as_deref(), "New label")?;

    let group = K::collection(&state.db).rename(&key, &new_label)?;
    info!("Renamed {} label {} to '{}'", K::NOUN, key, new_label);

    Ok(Json(group))
}

pub async fn seasons<K: SeasonedKind>(
    State(state): State<SharedState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(K::collection(&state.db).distinct_seasons()?))
}

pub async fn all<K: SeasonedKind>(
    State(state): State<SharedState>,
) -> Result<Json<Vec<Group<String>>>, AppError> {
    Ok(Json(K::collection(&state.db).all()?))
}

pub async fn export<K: SeasonedKind>(
    State(state): State<SharedState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = query.format()?;
    let groups = K::collection(&state.db).all()?;
    let table = Table::from_groups(K::SHEET, K::SHEET, &groups, true);

    download(&table, format, K::NOUN)
}

pub async fn summary<K: SeasonedKind>(
    State(state): State<SharedState>,
) -> Result<Json<Dashboard>, AppError> {
    let groups = K::collection(&state.db).all()?;
    Ok(Json(stats::dashboard(&groups)))
}

/// Every group of a year and season; an empty list is not an error
pub async fn by_season<K: SeasonedKind>(
    State(state): State<SharedState>,
    Path((year, season)): Path<(String, String)>,
) -> Result<Json<Vec<Group<String>>>, AppError> {
    let filter = GroupFilter::all()
        .year(required(Some(&year), "Year")?)
        .season(required(Some(&season), "Season")?);

    Ok(Json(K::collection(&state.db).list(&filter)?))
}

pub async fn by_label<K: SeasonedKind>(
    State(state): State<SharedState>,
    Path((year, season, label)): Path<(String, String, String)>,
) -> Result<Json<Vec<Group<String>>>, AppError> {
    let key = key(Some(&year), Some(&season), Some(&label), "Label")?;
    let filter = GroupFilter::all()
        .year(key.year.clone())
        .season(key.season.clone().unwrap_or_default())
        .label(key.label.clone());

    let groups = K::collection(&state.db).list(&filter)?;
    if groups.is_empty() {
        return Err(AppError::not_found(format!(
            "No {} found for the specified year, season, and label",
            K::NOUN
        )));
    }

    Ok(Json(groups))
}

pub async fn values<K: SeasonedKind>(
    State(state): State<SharedState>,
    Path((year, season, label)): Path<(String, String, String)>,
) -> Result<Json<Vec<String>>, AppError> {
    let key = key(Some(&year), Some(&season), Some(&label), "Label")?;

    let group = K::collection(&state.db)
        .find(&key)?
        .ok_or_else(|| AppError::not_found(format!("No {} found for {key}", K::NOUN)))?;

    Ok(Json(group.values))
}
