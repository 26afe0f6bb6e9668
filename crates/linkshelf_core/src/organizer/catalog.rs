//! Domain classification against a static category catalog.
//!
//! # Responsibility
//! - Map a URL to a topical category and seed tags.
//! - Own hostname extraction shared by scoring and domain statistics.
//!
//! # Invariants
//! - The catalog is loaded once and never mutated; concurrent reads need no
//!   synchronization.
//! - Classification never fails: unparseable input degrades to the unknown
//!   record, unmatched hosts degrade to a generic web record.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Category label for input that cannot be parsed as a URL.
pub const CATEGORY_UNKNOWN: &str = "unknown";
/// Category label for hosts absent from the catalog.
pub const CATEGORY_WEB: &str = "web";

const UNKNOWN_PRIORITY: f64 = 0.3;
const FALLBACK_PRIORITY: f64 = 0.6;

/// One immutable catalog row keyed by domain.
#[derive(Debug, Clone, Copy)]
struct CatalogEntry {
    category: &'static str,
    seed_tags: &'static [&'static str],
    priority: f64,
}

/// Classification outcome for one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainClassification {
    /// Topical category, e.g. `development` or the `web`/`unknown` fallbacks.
    pub category: String,
    /// Seed tags suggested for the domain; empty for unparseable input.
    pub tags: Vec<String>,
    /// Classification confidence in `[0, 1]`.
    pub priority: f64,
}

static CATALOG: Lazy<HashMap<&'static str, CatalogEntry>> = Lazy::new(|| {
    let mut table = HashMap::new();
    let mut seed = |domain, category, seed_tags, priority| {
        table.insert(
            domain,
            CatalogEntry {
                category,
                seed_tags,
                priority,
            },
        );
    };

    seed(
        "github.com",
        "development",
        &["github", "development", "code", "opensource", "repository"][..],
        0.95,
    );
    seed(
        "gitlab.com",
        "development",
        &["gitlab", "development", "code", "repository"][..],
        0.9,
    );
    seed(
        "stackoverflow.com",
        "development",
        &["stackoverflow", "programming", "development", "questions"][..],
        0.95,
    );
    seed(
        "crates.io",
        "development",
        &["rust", "crates", "packages", "opensource"][..],
        0.85,
    );
    seed(
        "npmjs.com",
        "development",
        &["npm", "javascript", "packages"][..],
        0.85,
    );
    seed(
        "developer.mozilla.org",
        "reference",
        &["mdn", "documentation", "web", "reference"][..],
        0.95,
    );
    seed(
        "docs.rs",
        "reference",
        &["rust", "documentation", "reference"][..],
        0.9,
    );
    seed(
        "docs.python.org",
        "reference",
        &["python", "documentation", "reference"][..],
        0.9,
    );
    seed(
        "wikipedia.org",
        "reference",
        &["wikipedia", "encyclopedia", "reference"][..],
        0.9,
    );
    seed(
        "freecodecamp.org",
        "learning",
        &["freecodecamp", "learning", "tutorial", "programming"][..],
        0.9,
    );
    seed(
        "coursera.org",
        "learning",
        &["coursera", "courses", "learning"][..],
        0.9,
    );
    seed(
        "udemy.com",
        "learning",
        &["udemy", "courses", "learning"][..],
        0.85,
    );
    seed(
        "kubernetes.io",
        "devops",
        &["kubernetes", "devops", "containers"][..],
        0.9,
    );
    seed(
        "docker.com",
        "devops",
        &["docker", "devops", "containers"][..],
        0.9,
    );
    seed(
        "aws.amazon.com",
        "cloud",
        &["aws", "cloud", "infrastructure"][..],
        0.9,
    );
    seed(
        "cloud.google.com",
        "cloud",
        &["gcp", "cloud", "infrastructure"][..],
        0.9,
    );
    seed(
        "azure.microsoft.com",
        "cloud",
        &["azure", "cloud", "infrastructure"][..],
        0.85,
    );
    seed(
        "reddit.com",
        "social",
        &["reddit", "community", "discussion"][..],
        0.8,
    );
    seed(
        "twitter.com",
        "social",
        &["twitter", "social", "discussion"][..],
        0.8,
    );
    seed(
        "news.ycombinator.com",
        "content",
        &["hackernews", "news", "tech"][..],
        0.85,
    );
    seed(
        "youtube.com",
        "content",
        &["youtube", "video", "content"][..],
        0.85,
    );
    seed(
        "medium.com",
        "content",
        &["medium", "blog", "articles"][..],
        0.8,
    );
    seed(
        "dev.to",
        "content",
        &["devto", "blog", "development"][..],
        0.8,
    );

    table
});

/// Extracts the lowercase hostname of `url` with a leading `www.` stripped.
///
/// Returns `None` for input that does not parse as an absolute URL or has no
/// host component.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        return None;
    }
    Some(host.to_string())
}

/// Classifies a URL into a topical category with seed tags.
///
/// Lookup order: exact hostname, then progressively shorter suffixes with
/// the leftmost label dropped (`docs.python.org` -> `python.org` -> `org`),
/// then the generic web fallback carrying the first hostname label.
pub fn classify(url: &str) -> DomainClassification {
    let Some(host) = host_of(url) else {
        return DomainClassification {
            category: CATEGORY_UNKNOWN.to_string(),
            tags: Vec::new(),
            priority: UNKNOWN_PRIORITY,
        };
    };

    classify_host(&host)
}

/// Classifies an already-extracted hostname (`www.` must be stripped).
pub fn classify_host(host: &str) -> DomainClassification {
    let mut candidate = host;
    loop {
        if let Some(entry) = CATALOG.get(candidate) {
            return DomainClassification {
                category: entry.category.to_string(),
                tags: entry.seed_tags.iter().map(|tag| (*tag).to_string()).collect(),
                priority: entry.priority,
            };
        }
        match candidate.find('.') {
            Some(dot) => candidate = &candidate[dot + 1..],
            None => break,
        }
    }

    let first_label = host.split('.').next().unwrap_or(host);
    DomainClassification {
        category: CATEGORY_WEB.to_string(),
        tags: vec![first_label.to_string()],
        priority: FALLBACK_PRIORITY,
    }
}
