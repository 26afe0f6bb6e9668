//! Thematic grouping of frequently used tags.
//!
//! # Responsibility
//! - Categorize tag names by keyword matching into a small fixed topic set.
//! - Emit clusters of co-occurring tags with distinct-bookmark counts.
//!
//! # Invariants
//! - A cluster always holds at least 2 distinct tags; singletons are dropped.
//! - Output is sorted by bookmark count descending, then name.

use crate::model::bookmark::UserId;
use crate::repo::bookmark_repo::RepoResult;
use crate::repo::organizer_store::OrganizerStore;
use serde::{Deserialize, Serialize};

const TOP_TAG_LIMIT: u32 = 100;
const MIN_CLUSTER_TAGS: usize = 2;

/// Fixed topic set for tag grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterCategory {
    Frontend,
    Devops,
    Language,
    Learning,
    Other,
}

impl ClusterCategory {
    /// All categories in stable grouping order.
    const ALL: [Self; 5] = [
        Self::Frontend,
        Self::Devops,
        Self::Language,
        Self::Learning,
        Self::Other,
    ];

    /// Display label used in cluster names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Frontend => "Frontend",
            Self::Devops => "DevOps",
            Self::Language => "Language",
            Self::Learning => "Learning",
            Self::Other => "Other",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Frontend => &["react", "vue", "angular", "svelte", "css", "frontend"],
            Self::Devops => &["docker", "k8s", "kubernetes", "devops", "terraform", "ansible"],
            Self::Language => &[
                "python",
                "javascript",
                "typescript",
                "java",
                "rust",
                "golang",
            ],
            Self::Learning => &["tutorial", "learning", "course", "guide", "howto"],
            Self::Other => &[],
        }
    }
}

/// Picks the topic for one tag name by keyword substring matching.
///
/// Categories are tried in declaration order, so a tag matching both
/// `frontend` and `language` keywords lands in frontend.
pub fn categorize_tag(name: &str) -> ClusterCategory {
    let lowered = name.to_lowercase();
    for category in ClusterCategory::ALL {
        if category
            .keywords()
            .iter()
            .any(|keyword| lowered.contains(keyword))
        {
            return category;
        }
    }
    ClusterCategory::Other
}

/// Tag-list rule describing which bookmarks a cluster covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRules {
    pub tags: Vec<String>,
}

/// One thematic group of at least 2 distinct tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCluster {
    /// `"{Category} Topics"`.
    pub name: String,
    pub category: ClusterCategory,
    /// Member tags in frequency order.
    pub tags: Vec<String>,
    /// Distinct bookmarks carrying any member tag.
    pub bookmark_count: u32,
    pub reason: String,
    pub rules: ClusterRules,
}

/// Groups the user's most used tags into thematic clusters.
pub fn build_clusters<S: OrganizerStore>(store: &S, user: UserId) -> RepoResult<Vec<TagCluster>> {
    let top = store.top_tags(user, TOP_TAG_LIMIT)?;

    let mut groups: Vec<(ClusterCategory, Vec<String>)> = ClusterCategory::ALL
        .iter()
        .map(|category| (*category, Vec::new()))
        .collect();
    for usage in top {
        let category = categorize_tag(&usage.name);
        if let Some((_, tags)) = groups.iter_mut().find(|(key, _)| *key == category) {
            if !tags.contains(&usage.name) {
                tags.push(usage.name);
            }
        }
    }

    let mut clusters = Vec::new();
    for (category, tags) in groups {
        if tags.len() < MIN_CLUSTER_TAGS {
            continue;
        }

        let bookmark_count = store.count_with_any_tag(user, &tags)?;
        clusters.push(TagCluster {
            name: format!("{} Topics", category.label()),
            category,
            reason: format!(
                "{} related tags across {} bookmarks",
                tags.len(),
                bookmark_count
            ),
            rules: ClusterRules { tags: tags.clone() },
            tags,
            bookmark_count,
        });
    }

    clusters.sort_by(|a, b| {
        b.bookmark_count
            .cmp(&a.bookmark_count)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(clusters)
}
