//! # Document store
//!
//! Four independent collections (contacts, emails, links, PDFs), each a list of
//! [`Group`] documents.
//!
//! ## Implementation
//!
//! - Every collection sits behind its own `RwLock`
//! - Key fields are trimmed on every write and lookup; blank ones are rejected
//!   with [`StoreError::InvalidKey`]
//! - Check-then-write sequences (create, rename, update) run under one write
//!   lock, so "insert if absent" is atomic and appends never lose updates
//! - On disk a collection is one JSON file, rewritten after every mutation
//!   while the write lock is still held
//! - A mutation whose file write fails is rolled back in memory
//!
//! ## Layout
//!
//! ```text
//! <database dir>/
//!   contacts.json
//!   emails.json
//!   links.json
//!   pdfs.json
//! ```
use log::{debug, info};
use std::collections::HashSet;
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

use crate::group::{AppendMode, Group, GroupFilter, GroupKey, GroupValue, PdfEntry};
use crate::normalize::{self, ValuePolicy};

/// Scheme selecting the in-memory backend
pub const MEMORY_URL: &str = "memory:";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No group found for {0}")]
    NotFound(GroupKey),

    #[error("A group already exists for {0}")]
    Conflict(GroupKey),

    #[error("Year {0} already exists")]
    YearExists(String),

    #[error("Year, season and label must not be blank: {0}")]
    InvalidKey(GroupKey),

    #[error("Collection lock poisoned")]
    Poisoned,

    #[error("Invalid database url: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One collection of groups
pub struct Collection<V> {
    name: &'static str,
    policy: ValuePolicy,
    file: Option<PathBuf>,
    groups: RwLock<Vec<Group<V>>>,
}

impl<V: GroupValue> Collection<V> {
    /// Create an empty collection that lives only in memory
    pub fn in_memory(name: &'static str, policy: ValuePolicy) -> Self {
        Collection {
            name,
            policy,
            file: None,
            groups: RwLock::new(Vec::new()),
        }
    }

    /// Open the collection stored in `dir/<name>.json`, creating nothing until the first write
    pub fn open(dir: &Path, name: &'static str, policy: ValuePolicy) -> Result<Self, StoreError> {
        let file = dir.join(format!("{name}.json"));

        let groups: Vec<Group<V>> = if file.exists() {
            let data = fs::read_to_string(&file)?;
            if data.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&data)?
            }
        } else {
            Vec::new()
        };

        info!("Loaded {} {name} groups from {}", groups.len(), file.display());

        Ok(Collection {
            name,
            policy,
            file: Some(file),
            groups: RwLock::new(groups),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> ValuePolicy {
        self.policy
    }

    fn normalize(&self, values: Vec<V>) -> Vec<V> {
        values
            .into_iter()
            .filter_map(|value| value.normalize(self.policy))
            .collect()
    }

    fn read<R>(&self, f: impl FnOnce(&[Group<V>]) -> R) -> Result<R, StoreError> {
        let groups = self.groups.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&groups))
    }

    /// Run `f` under the write lock and persist the result
    ///
    /// `f` must finish all of its checks before touching the list: an `Err`
    /// from `f` is returned as-is without rollback.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut Vec<Group<V>>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut groups = self.groups.write().map_err(|_| StoreError::Poisoned)?;

        let Some(file) = &self.file else {
            return f(&mut *groups);
        };

        let snapshot = groups.clone();
        let result = f(&mut *groups)?;

        if let Err(e) = write_json(file, &groups) {
            *groups = snapshot;
            return Err(e);
        }

        debug!("Persisted {} {} groups", groups.len(), self.name);
        Ok(result)
    }

    pub fn find(&self, key: &GroupKey) -> Result<Option<Group<V>>, StoreError> {
        let key = clean_key(key)?;
        self.read(|groups| groups.iter().find(|g| g.is_key(&key)).cloned())
    }

    pub fn list(&self, filter: &GroupFilter) -> Result<Vec<Group<V>>, StoreError> {
        let filter = filter.trimmed();
        self.read(|groups| groups.iter().filter(|g| filter.matches(g)).cloned().collect())
    }

    pub fn all(&self) -> Result<Vec<Group<V>>, StoreError> {
        self.read(|groups| groups.to_vec())
    }

    /// Insert a new group, failing with [`StoreError::Conflict`] if the key is taken
    pub fn create(&self, key: GroupKey, values: Vec<V>) -> Result<Group<V>, StoreError> {
        let key = clean_key(&key)?;
        let values = self.normalize(values);
        self.mutate(|groups| {
            if groups.iter().any(|g| g.is_key(&key)) {
                return Err(StoreError::Conflict(key));
            }
            let group = Group::new(key, values);
            groups.push(group.clone());
            Ok(group)
        })
    }

    /// Insert the first group of a year, failing with [`StoreError::YearExists`]
    /// if any group already uses that year
    pub fn create_year(&self, key: GroupKey, values: Vec<V>) -> Result<Group<V>, StoreError> {
        let key = clean_key(&key)?;
        let values = self.normalize(values);
        self.mutate(|groups| {
            if groups.iter().any(|g| g.year == key.year) {
                return Err(StoreError::YearExists(key.year));
            }
            let group = Group::new(key, values);
            groups.push(group.clone());
            Ok(group)
        })
    }

    /// Overwrite the value list of an existing group
    pub fn replace(&self, key: &GroupKey, values: Vec<V>) -> Result<Group<V>, StoreError> {
        let key = clean_key(key)?;
        let values = self.normalize(values);
        self.mutate(|groups| {
            let group = position(groups, &key)?;
            groups[group].values = values;
            groups[group].touch();
            Ok(groups[group].clone())
        })
    }

    /// Append to the value list of an existing group
    pub fn append(
        &self,
        key: &GroupKey,
        values: Vec<V>,
        mode: AppendMode,
    ) -> Result<Group<V>, StoreError> {
        let key = clean_key(key)?;
        let values = self.normalize(values);
        self.mutate(|groups| {
            let group = position(groups, &key)?;
            groups[group].append(values, mode);
            groups[group].touch();
            Ok(groups[group].clone())
        })
    }

    /// Move a group to a new label within the same year (and season)
    pub fn rename(&self, key: &GroupKey, new_label: &str) -> Result<Group<V>, StoreError> {
        self.update(key, Some(new_label), None, AppendMode::Concat)
    }

    /// Append values and/or rename in one step
    ///
    /// Both the source lookup and the destination conflict check happen before
    /// anything is written, so a failed update leaves the collection untouched.
    pub fn update(
        &self,
        key: &GroupKey,
        new_label: Option<&str>,
        values: Option<Vec<V>>,
        mode: AppendMode,
    ) -> Result<Group<V>, StoreError> {
        let key = clean_key(key)?;
        let new_label = new_label
            .map(|label| {
                normalize::key_field(label)
                    .ok_or_else(|| StoreError::InvalidKey(key.with_label(label)))
            })
            .transpose()?;
        let values = values.map(|values| self.normalize(values));
        self.mutate(|groups| {
            let group = position(groups, &key)?;

            let target = new_label
                .filter(|label| *label != key.label)
                .map(|label| key.with_label(label));
            if let Some(target) = &target {
                if groups.iter().any(|g| g.is_key(target)) {
                    return Err(StoreError::Conflict(target.clone()));
                }
            }

            let entry = &mut groups[group];
            if let Some(target) = target {
                entry.label = target.label;
            }
            if let Some(values) = values {
                entry.append(values, mode);
            }
            entry.touch();
            Ok(entry.clone())
        })
    }

    /// Create the group or overwrite its values; the flag is `true` when created
    pub fn upsert_replace(
        &self,
        key: GroupKey,
        values: Vec<V>,
    ) -> Result<(Group<V>, bool), StoreError> {
        let key = clean_key(&key)?;
        let values = self.normalize(values);
        self.mutate(|groups| match groups.iter().position(|g| g.is_key(&key)) {
            Some(group) => {
                groups[group].values = values;
                groups[group].touch();
                Ok((groups[group].clone(), false))
            }
            None => {
                let group = Group::new(key, values);
                groups.push(group.clone());
                Ok((group, true))
            }
        })
    }

    /// Create the group or append to its values; the flag is `true` when created
    pub fn upsert_append(
        &self,
        key: GroupKey,
        values: Vec<V>,
        mode: AppendMode,
    ) -> Result<(Group<V>, bool), StoreError> {
        let key = clean_key(&key)?;
        let values = self.normalize(values);
        self.mutate(|groups| match groups.iter().position(|g| g.is_key(&key)) {
            Some(group) => {
                groups[group].append(values, mode);
                groups[group].touch();
                Ok((groups[group].clone(), false))
            }
            None => {
                let group = Group::new(key, values);
                groups.push(group.clone());
                Ok((group, true))
            }
        })
    }

    /// Distinct season strings in insertion order
    pub fn distinct_seasons(&self) -> Result<Vec<String>, StoreError> {
        self.read(|groups| {
            let mut seen = HashSet::new();
            groups
                .iter()
                .filter_map(|g| g.season.clone())
                .filter(|season| seen.insert(season.clone()))
                .collect()
        })
    }

    /// Distinct years, the most recently created group's year first
    pub fn unique_years(&self) -> Result<Vec<String>, StoreError> {
        self.read(|groups| {
            let mut sorted: Vec<&Group<V>> = groups.iter().rev().collect();
            sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let mut seen = HashSet::new();
            sorted
                .into_iter()
                .filter(|g| seen.insert(g.year.clone()))
                .map(|g| g.year.clone())
                .collect()
        })
    }
}

/// Trim every key field, rejecting blank ones
fn clean_key(key: &GroupKey) -> Result<GroupKey, StoreError> {
    let blank = || StoreError::InvalidKey(key.clone());

    Ok(GroupKey {
        year: normalize::key_field(&key.year).ok_or_else(blank)?,
        season: key
            .season
            .as_deref()
            .map(|season| normalize::key_field(season).ok_or_else(blank))
            .transpose()?,
        label: normalize::key_field(&key.label).ok_or_else(blank)?,
    })
}

fn position<V>(groups: &[Group<V>], key: &GroupKey) -> Result<usize, StoreError>
where
    V: GroupValue,
{
    groups
        .iter()
        .position(|g| g.is_key(key))
        .ok_or_else(|| StoreError::NotFound(key.clone()))
}

fn write_json<V: GroupValue>(file: &Path, groups: &[Group<V>]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(groups)?;
    let tmp = file.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, file)?;
    Ok(())
}

/// All four collections
pub struct Database {
    pub contacts: Collection<String>,
    pub emails: Collection<String>,
    pub links: Collection<String>,
    pub pdfs: Collection<PdfEntry>,
}

impl Database {
    pub fn in_memory() -> Self {
        Database {
            contacts: Collection::in_memory("contacts", ValuePolicy::StripAll),
            emails: Collection::in_memory("emails", ValuePolicy::StripAll),
            links: Collection::in_memory("links", ValuePolicy::Trim),
            pdfs: Collection::in_memory("pdfs", ValuePolicy::Trim),
        }
    }

    /// Open the database named by a connection string
    ///
    /// Accepts `memory:`, `file://<dir>` or a bare directory path. The
    /// directory is created when missing.
    ///
    /// # Errors
    /// * [`StoreError::InvalidUrl`] for a blank url
    /// * IO or parse errors while loading existing collection files
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }
        if url == MEMORY_URL {
            info!("Using in-memory database");
            return Ok(Database::in_memory());
        }

        let dir = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
        if dir.as_os_str().is_empty() {
            return Err(StoreError::InvalidUrl(url.to_string()));
        }
        create_dir_all(&dir)?;

        Ok(Database {
            contacts: Collection::open(&dir, "contacts", ValuePolicy::StripAll)?,
            emails: Collection::open(&dir, "emails", ValuePolicy::StripAll)?,
            links: Collection::open(&dir, "links", ValuePolicy::Trim)?,
            pdfs: Collection::open(&dir, "pdfs", ValuePolicy::Trim)?,
        })
    }
}
