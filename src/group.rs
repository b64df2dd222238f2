use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::normalize::{self, ValuePolicy};
use crate::season::Season;

/// Identity of a group inside its collection
///
/// Contacts and emails are keyed by (year, season, label). Links and PDFs have
/// no season and are keyed by (year, label).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub year: String,
    pub season: Option<String>,
    pub label: String,
}

impl GroupKey {
    pub fn new(year: impl Into<String>, season: Option<String>, label: impl Into<String>) -> Self {
        GroupKey {
            year: year.into(),
            season,
            label: label.into(),
        }
    }

    /// Key for a season-less collection
    pub fn yearly(year: impl Into<String>, label: impl Into<String>) -> Self {
        GroupKey::new(year, None, label)
    }

    /// Same year and season, different label
    pub fn with_label(&self, label: impl Into<String>) -> Self {
        GroupKey {
            year: self.year.clone(),
            season: self.season.clone(),
            label: label.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.season {
            Some(season) => write!(f, "{} / {} / '{}'", self.year, season, self.label),
            None => write!(f, "{} / '{}'", self.year, self.label),
        }
    }
}

/// Optional constraints used by [`crate::store::Collection::list`]
#[derive(Clone, Debug, Default)]
pub struct GroupFilter {
    pub year: Option<String>,
    pub season: Option<String>,
    pub label: Option<String>,
}

impl GroupFilter {
    pub fn all() -> Self {
        GroupFilter::default()
    }

    pub fn year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Same filter with every constraint trimmed
    pub fn trimmed(&self) -> GroupFilter {
        let trim = |field: &Option<String>| field.as_deref().map(|s| s.trim().to_string());
        GroupFilter {
            year: trim(&self.year),
            season: trim(&self.season),
            label: trim(&self.label),
        }
    }

        pub fn matches<V>(&self, group: &Group<V>) -> bool {
        self.year.as_ref().is_none_or(|year| *year == group.year)
            && self
                .season
                .as_ref()
                .is_none_or(|season| group.season.as_ref() == Some(season))
            && self.label.as_ref().is_none_or(|label| *label == group.label)
    }
}

/// How new values are merged into an existing list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AppendMode {
    /// Plain concatenation, duplicates allowed
    #[default]
    Concat,
    /// Skip values already stored or repeated within the batch
    Dedup,
}

impl AppendMode {
    pub fn from_flag(dedup: bool) -> Self {
        if dedup { AppendMode::Dedup } else { AppendMode::Concat }
    }
}

/// One stored document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group<V> {
    pub id: Uuid,
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    pub label: String,
    pub values: Vec<V>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<V: GroupValue> Group<V> {
    pub fn new(key: GroupKey, values: Vec<V>) -> Self {
        let now = Utc::now();
        Group {
            id: Uuid::new_v4(),
            year: key.year,
            season: key.season,
            label: key.label,
            values,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> GroupKey {
        GroupKey::new(self.year.clone(), self.season.clone(), self.label.clone())
    }

    pub fn is_key(&self, key: &GroupKey) -> bool {
        self.year == key.year && self.season == key.season && self.label == key.label
    }

    /// Season classification of this group; season-less groups are unclassified
    pub fn classify(&self) -> Season {
        self.season
            .as_deref()
            .map(Season::classify)
            .unwrap_or(Season::Unclassified)
    }

    /// Merge `values` into the list according to `mode`, returning how many were added
    pub fn append(&mut self, values: Vec<V>, mode: AppendMode) -> usize {
        let before = self.values.len();
        match mode {
            AppendMode::Concat => self.values.extend(values),
            AppendMode::Dedup => {
                for value in values {
                    if !self.values.iter().any(|v| v.identity() == value.identity()) {
                        self.values.push(value);
                    }
                }
            }
        }
        self.values.len() - before
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A PDF attached to a group
///
/// Both fields may be omitted on input: an entry without a url is dropped and
/// a missing description becomes the default one when the entry is stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfEntry {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
}

impl PdfEntry {
    pub fn new(url: impl Into<String>, description: impl Into<String>) -> Self {
        PdfEntry {
            url: url.into(),
            description: description.into(),
        }
    }
}

/// Values that can be stored in a group
pub trait GroupValue:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Apply the collection policy; `None` drops the value
    fn normalize(self, policy: ValuePolicy) -> Option<Self>;

    /// String used for deduplication and statistics
    fn identity(&self) -> &str;
}

impl GroupValue for String {
    fn normalize(self, policy: ValuePolicy) -> Option<Self> {
        policy.apply(&self)
    }

    fn identity(&self) -> &str {
        self
    }
}

impl GroupValue for PdfEntry {
    fn normalize(self, policy: ValuePolicy) -> Option<Self> {
        let url = policy.apply(&self.url)?;
        Some(PdfEntry {
            url,
            description: normalize::pdf_description(Some(&self.description)),
        })
    }

    fn identity(&self) -> &str {
        &self.url
    }
}
