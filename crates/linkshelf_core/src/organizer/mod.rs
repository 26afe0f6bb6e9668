//! Smart organization engine: tag suggestions, clusters and collections.
//!
//! # Responsibility
//! - Score candidate tags for a URL from domain, activity and similarity
//!   signals.
//! - Derive thematic tag clusters and smart collection descriptors from
//!   store statistics.
//!
//! # Invariants
//! - The engine only reads from the store; it never mutates it.
//! - Nothing is cached between calls; every result is recomputed from live
//!   store state.
//! - A store failure degrades to the neutral result for the operation, never
//!   to an error surfaced by the facade.

use crate::model::bookmark::UserId;
use crate::organizer::catalog::{classify_host, host_of, CATEGORY_UNKNOWN};
use crate::repo::bookmark_repo::RepoResult;
use crate::repo::organizer_store::{OrganizerStore, TagUsage};
use log::warn;
use serde::{Deserialize, Serialize};

pub mod catalog;
pub mod cluster;
pub mod collection;
pub mod score;

/// Aggregate view of one domain within the user's bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Hostname with `www.` stripped; empty when the input had no host.
    pub domain: String,
    /// Catalog category of the domain.
    pub category: String,
    /// Active bookmarks whose URL contains the domain.
    pub bookmark_count: u32,
    /// Tag usage over those bookmarks, most used first.
    pub tag_distribution: Vec<TagUsage>,
}

impl DomainInfo {
    /// Neutral record returned for input without a usable host.
    pub fn unknown() -> Self {
        Self {
            domain: String::new(),
            category: CATEGORY_UNKNOWN.to_string(),
            bookmark_count: 0,
            tag_distribution: Vec::new(),
        }
    }
}

/// Collects category, bookmark count and tag distribution for the domain of
/// `input`, which may be a full URL or a bare hostname.
pub fn domain_info<S: OrganizerStore>(
    store: &S,
    user: UserId,
    input: &str,
) -> RepoResult<DomainInfo> {
    let domain = match host_of(input) {
        Some(host) => host,
        // Bare hostnames ("github.com") do not parse as absolute URLs.
        None => {
            let trimmed = input.trim().to_lowercase();
            let trimmed = trimmed.strip_prefix("www.").unwrap_or(&trimmed).to_string();
            if trimmed.is_empty() || trimmed.contains(['/', ' ', ':']) {
                return Ok(DomainInfo::unknown());
            }
            trimmed
        }
    };

    let classification = classify_host(&domain);
    Ok(DomainInfo {
        category: classification.category,
        bookmark_count: store.count_domain_bookmarks(user, &domain)?,
        tag_distribution: store.domain_tag_distribution(user, &domain)?,
        domain,
    })
}

/// Converts a store failure into the operation's neutral result.
///
/// This is the single place where the "errors degrade, never propagate"
/// contract of the engine is applied; the dropped error is logged so the
/// degradation stays observable.
pub(crate) fn neutral_on_error<T>(operation: &'static str, neutral: T, result: RepoResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!("event={operation} module=organizer status=degraded error={err}");
            neutral
        }
    }
}
