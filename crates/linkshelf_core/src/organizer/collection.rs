//! Smart collection descriptors derived from activity and domain statistics.
//!
//! # Responsibility
//! - Build activity-based saved-view descriptors (recent/frequent/unread).
//! - Build per-domain descriptors from the user's top domains.
//! - Merge all descriptor sources into one name-deduplicated list.
//!
//! # Invariants
//! - A descriptor is only emitted when its bookmark count is positive.
//! - Descriptors are recomputed from scratch on every call; nothing is
//!   cached between requests.

use crate::model::bookmark::UserId;
use crate::organizer::catalog::{classify_host, host_of};
use crate::organizer::cluster::{build_clusters, TagCluster};
use crate::repo::bookmark_repo::RepoResult;
use crate::repo::organizer_store::OrganizerStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

const RECENT_WINDOW_DAYS: u32 = 7;
const FREQUENT_CLICK_MINIMUM: u32 = 5;
const TOP_DOMAIN_LIMIT: usize = 5;
const MS_PER_DAY: i64 = 86_400_000;

/// Origin of a smart collection descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Activity,
    Domain,
    TagCluster,
}

/// Saved-view filter configuration.
///
/// Shaped so serialization matches the filter objects the view layer
/// consumes; unset members are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_within_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count_minimum: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// One suggested saved view over the user's bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    /// Serialized as `type` to match external schema naming.
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub icon: String,
    pub color: String,
    pub filters: CollectionFilters,
    pub bookmark_count: u32,
    /// Topical category for domain-derived collections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub reason: String,
}

/// Builds the recent/frequent/unread activity descriptors.
///
/// Each descriptor is omitted entirely when its count is zero.
pub fn build_activity_collections<S: OrganizerStore>(
    store: &S,
    user: UserId,
    now_ms: i64,
) -> RepoResult<Vec<Collection>> {
    let mut collections = Vec::new();
    let window_start = now_ms - i64::from(RECENT_WINDOW_DAYS) * MS_PER_DAY;

    let recent = store.count_created_since(user, window_start)?;
    if recent > 0 {
        collections.push(Collection {
            name: "Recent Bookmarks".to_string(),
            kind: CollectionKind::Activity,
            icon: "clock".to_string(),
            color: "#f59e0b".to_string(),
            filters: CollectionFilters {
                added_within_days: Some(RECENT_WINDOW_DAYS),
                ..CollectionFilters::default()
            },
            bookmark_count: recent,
            category: None,
            reason: format!("{recent} bookmarks added in the last {RECENT_WINDOW_DAYS} days"),
        });
    }

    let frequent = store.count_clicked_more_than(user, FREQUENT_CLICK_MINIMUM)?;
    if frequent > 0 {
        collections.push(Collection {
            name: "Frequently Used".to_string(),
            kind: CollectionKind::Activity,
            icon: "trending-up".to_string(),
            color: "#10b981".to_string(),
            filters: CollectionFilters {
                click_count_minimum: Some(FREQUENT_CLICK_MINIMUM),
                ..CollectionFilters::default()
            },
            bookmark_count: frequent,
            category: None,
            reason: format!("{frequent} bookmarks you open often"),
        });
    }

    let unread = store.count_unread_before(user, window_start)?;
    if unread > 0 {
        collections.push(Collection {
            name: "Unread".to_string(),
            kind: CollectionKind::Activity,
            icon: "eye-off".to_string(),
            color: "#6b7280".to_string(),
            filters: CollectionFilters {
                unread: Some(true),
                ..CollectionFilters::default()
            },
            bookmark_count: unread,
            category: None,
            reason: format!("{unread} bookmarks you haven't opened yet"),
        });
    }

    Ok(collections)
}

/// Builds one descriptor per top domain, classified against the catalog.
pub fn build_domain_collections<S: OrganizerStore>(
    store: &S,
    user: UserId,
) -> RepoResult<Vec<Collection>> {
    let urls = store.bookmark_urls(user)?;

    let mut counts: HashMap<String, u32> = HashMap::new();
    for url in &urls {
        if let Some(domain) = host_of(url) {
            *counts.entry(domain).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_DOMAIN_LIMIT);

    let mut collections = Vec::new();
    for (domain, bookmark_count) in ranked {
        let classification = classify_host(&domain);
        collections.push(Collection {
            name: format!("{domain} Resources"),
            kind: CollectionKind::Domain,
            icon: "globe".to_string(),
            color: "#3b82f6".to_string(),
            filters: CollectionFilters {
                domain: Some(domain.clone()),
                ..CollectionFilters::default()
            },
            bookmark_count,
            category: Some(classification.category),
            reason: format!("{bookmark_count} bookmarks from {domain}"),
        });
    }

    Ok(collections)
}

/// Projects a tag cluster into a saved-view descriptor.
pub fn cluster_collection(cluster: &TagCluster) -> Collection {
    Collection {
        name: cluster.name.clone(),
        kind: CollectionKind::TagCluster,
        icon: "tag".to_string(),
        color: "#8b5cf6".to_string(),
        filters: CollectionFilters {
            tags: Some(cluster.rules.tags.clone()),
            ..CollectionFilters::default()
        },
        bookmark_count: cluster.bookmark_count,
        category: None,
        reason: cluster.reason.clone(),
    }
}

/// Builds the merged collection suggestion list.
///
/// Activity, domain and cluster descriptors are concatenated in that order
/// and deduplicated by name, first occurrence winning.
pub fn suggest_collections<S: OrganizerStore>(
    store: &S,
    user: UserId,
    now_ms: i64,
) -> RepoResult<Vec<Collection>> {
    let mut merged = build_activity_collections(store, user, now_ms)?;
    merged.extend(build_domain_collections(store, user)?);
    merged.extend(build_clusters(store, user)?.iter().map(cluster_collection));

    let mut seen: BTreeSet<String> = BTreeSet::new();
    merged.retain(|collection| seen.insert(collection.name.clone()));
    Ok(merged)
}
