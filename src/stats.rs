//! # Dashboard statistics
//!
//! Every summary here is a single pass over a snapshot of a collection. Nothing
//! is cached: the dashboard recomputes from scratch on each request.
//!
//! Season buckets only receive groups whose season classifies as spring or
//! fall. Unclassified groups still count towards the raw totals and unique
//! sets.
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

use crate::group::{Group, GroupValue};
use crate::season::Season;

/// Insertion-ordered set of strings
#[derive(Debug, Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, item: &str) -> bool {
        if self.seen.contains(item) {
            return false;
        }
        self.seen.insert(item.to_string());
        self.items.push(item.to_string());
        true
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SeasonCounts {
    pub spring: usize,
    pub fall: usize,
}

impl SeasonCounts {
    fn add(&mut self, season: Season, n: usize) {
        match season {
            Season::Spring => self.spring += n,
            Season::Fall => self.fall += n,
            Season::Unclassified => {}
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SeasonLabels {
    pub count: usize,
    pub labels: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct LabelsPerSeason {
    pub spring: SeasonLabels,
    pub fall: SeasonLabels,
}

/// Main dashboard summary over a seasoned collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_years: usize,
    pub total_spring: usize,
    pub total_fall: usize,
    pub total_contacts: usize,
    pub total_unique_contacts: usize,
    pub unique_contact_list: Vec<String>,
    pub contact_list: Vec<String>,
    pub total_labels: usize,
    pub contacts_per_year: BTreeMap<String, SeasonCounts>,
    pub labels_per_year: BTreeMap<String, LabelsPerSeason>,
}

/// Build the dashboard summary
///
/// # Arguments
/// * `groups` - Every group of the collection, in store order
///
/// # Returns
/// * `Dashboard` - Totals, unique sets and per-year/per-season breakdowns
pub fn dashboard<V: GroupValue>(groups: &[Group<V>]) -> Dashboard {
    let mut years = HashSet::new();
    let mut labels = HashSet::new();
    let mut unique = OrderedSet::default();
    let mut contact_list = Vec::new();
    let mut totals = SeasonCounts::default();
    let mut contacts_per_year: BTreeMap<String, SeasonCounts> = BTreeMap::new();
    let mut labels_per_year: BTreeMap<String, (OrderedSet, OrderedSet)> = BTreeMap::new();

    for group in groups {
        let season = group.classify();
        years.insert(group.year.as_str());
        if !group.label.is_empty() {
            labels.insert(group.label.as_str());
        }

        for value in &group.values {
            contact_list.push(value.identity().to_string());
            unique.insert(value.identity());
        }

        totals.add(season, group.values.len());
        contacts_per_year
            .entry(group.year.clone())
            .or_default()
            .add(season, group.values.len());

        let (spring, fall) = labels_per_year.entry(group.year.clone()).or_default();
        match season {
            Season::Spring => {
                spring.insert(&group.label);
            }
            Season::Fall => {
                fall.insert(&group.label);
            }
            Season::Unclassified => {}
        }
    }

    let labels_per_year = labels_per_year
        .into_iter()
        .map(|(year, (spring, fall))| {
            let per_season = LabelsPerSeason {
                spring: SeasonLabels {
                    count: spring.len(),
                    labels: spring.into_vec(),
                },
                fall: SeasonLabels {
                    count: fall.len(),
                    labels: fall.into_vec(),
                },
            };
            (year, per_season)
        })
        .collect();

    Dashboard {
        total_years: years.len(),
        total_spring: totals.spring,
        total_fall: totals.fall,
        total_contacts: contact_list.len(),
        total_unique_contacts: unique.len(),
        unique_contact_list: unique.into_vec(),
        contact_list,
        total_labels: labels.len(),
        contacts_per_year,
        labels_per_year,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonTotals {
    pub total: usize,
    pub total_unique: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearCategory {
    pub spring: SeasonTotals,
    pub fall: SeasonTotals,
    pub total_unique_per_year: usize,
}

/// Per-year, per-season totals and unique counts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Categorized {
    pub total_unique_contacts: usize,
    pub total_unique: Vec<String>,
    pub categorized_data: BTreeMap<String, YearCategory>,
}

pub fn categorize<V: GroupValue>(groups: &[Group<V>]) -> Categorized {
    #[derive(Default)]
    struct Acc {
        spring_total: usize,
        fall_total: usize,
        spring: HashSet<String>,
        fall: HashSet<String>,
    }

    let mut unique = OrderedSet::default();
    let mut per_year: BTreeMap<String, Acc> = BTreeMap::new();

    for group in groups {
        let acc = per_year.entry(group.year.clone()).or_default();
        let season = group.classify();

        for value in &group.values {
            let item = value.identity();
            unique.insert(item);
            match season {
                Season::Spring => {
                    acc.spring.insert(item.to_string());
                }
                Season::Fall => {
                    acc.fall.insert(item.to_string());
                }
                Season::Unclassified => {}
            }
        }

        match season {
            Season::Spring => acc.spring_total += group.values.len(),
            Season::Fall => acc.fall_total += group.values.len(),
            Season::Unclassified => {}
        }
    }

    let categorized_data = per_year
        .into_iter()
        .map(|(year, acc)| {
            let total_unique_per_year = acc.spring.union(&acc.fall).count();
            let category = YearCategory {
                spring: SeasonTotals {
                    total: acc.spring_total,
                    total_unique: acc.spring.len(),
                },
                fall: SeasonTotals {
                    total: acc.fall_total,
                    total_unique: acc.fall.len(),
                },
                total_unique_per_year,
            };
            (year, category)
        })
        .collect();

    Categorized {
        total_unique_contacts: unique.len(),
        total_unique: unique.into_vec(),
        categorized_data,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SeasonLists {
    pub spring: Vec<String>,
    pub fall: Vec<String>,
}

/// Every value split by year and season
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListWise {
    pub categorized_contacts: BTreeMap<String, SeasonLists>,
}

pub fn list_wise<V: GroupValue>(groups: &[Group<V>]) -> ListWise {
    let mut categorized_contacts: BTreeMap<String, SeasonLists> = BTreeMap::new();

    for group in groups {
        let lists = categorized_contacts.entry(group.year.clone()).or_default();
        let target = match group.classify() {
            Season::Spring => &mut lists.spring,
            Season::Fall => &mut lists.fall,
            Season::Unclassified => continue,
        };
        target.extend(group.values.iter().map(|v| v.identity().to_string()));
    }

    ListWise {
        categorized_contacts,
    }
}

/// Link and PDF statistics
///
/// For PDFs the counted item is the stored url.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    pub total_unique_years: usize,
    pub total_labels: usize,
    pub total_links: usize,
    pub total_unique_links: usize,
    pub total_links_list: Vec<String>,
    pub total_unique_links_list: Vec<String>,
}

pub fn item_stats<V: GroupValue>(groups: &[Group<V>]) -> ItemStats {
    let mut years = HashSet::new();
    let mut total_labels = 0;
    let mut links = Vec::new();
    let mut unique = OrderedSet::default();

    for group in groups {
        years.insert(group.year.as_str());
        if !group.label.is_empty() {
            total_labels += 1;
        }
        for value in &group.values {
            let item = value.identity();
            if item.is_empty() {
                continue;
            }
            links.push(item.to_string());
            unique.insert(item);
        }
    }

    ItemStats {
        total_unique_years: years.len(),
        total_labels,
        total_links: links.len(),
        total_unique_links: unique.len(),
        total_links_list: links,
        total_unique_links_list: unique.into_vec(),
    }
}
