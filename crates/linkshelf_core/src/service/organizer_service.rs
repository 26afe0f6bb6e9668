//! Smart organization use-case service.
//!
//! # Responsibility
//! - Wire a read-only store into the suggestion engine.
//! - Supply the clock and apply the neutral-degradation boundary, so callers
//!   always receive a well-typed result.
//!
//! # Invariants
//! - No method mutates the store.
//! - A store failure yields the neutral result for the operation (empty list,
//!   zero breakdown, unknown domain record), never an error.
//! - The `*_at` variants are pure functions of (store state, `now_ms`).

use crate::model::bookmark::UserId;
use crate::organizer::cluster::{build_clusters, TagCluster};
use crate::organizer::collection::{
    build_activity_collections, build_domain_collections, suggest_collections, Collection,
};
use crate::organizer::score::{
    assess_tag, suggest_tags, ScoreBreakdown, ScoreWeights, TagSuggestion,
};
use crate::organizer::{domain_info, neutral_on_error, DomainInfo};
use crate::repo::organizer_store::OrganizerStore;
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// Suggestion engine facade over a read-only store.
pub struct OrganizerService<S: OrganizerStore> {
    store: S,
}

impl<S: OrganizerStore> OrganizerService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Suggests up to `limit` tags for `url`, best first.
    ///
    /// Returns an empty list for unparseable URLs or store failures.
    pub fn suggest_tags(
        &self,
        user: UserId,
        url: &str,
        limit: Option<usize>,
    ) -> Vec<TagSuggestion> {
        self.suggest_tags_at(user, url, limit, ScoreWeights::default(), now_epoch_ms())
    }

    /// Clock- and weight-explicit variant of [`Self::suggest_tags`].
    pub fn suggest_tags_at(
        &self,
        user: UserId,
        url: &str,
        limit: Option<usize>,
        weights: ScoreWeights,
        now_ms: i64,
    ) -> Vec<TagSuggestion> {
        let limit = limit.unwrap_or(DEFAULT_SUGGESTION_LIMIT);
        neutral_on_error(
            "suggest_tags",
            Vec::new(),
            suggest_tags(&self.store, user, url, limit, weights, now_ms),
        )
    }

    /// Scores one candidate tag for `url` with the given weights.
    ///
    /// Returns the all-zero breakdown for unparseable URLs or store failures.
    pub fn score_tag(&self, user: UserId, url: &str, tag: &str, weights: ScoreWeights) -> ScoreBreakdown {
        self.score_tag_at(user, url, tag, weights, now_epoch_ms())
    }

    /// Clock-explicit variant of [`Self::score_tag`].
    pub fn score_tag_at(
        &self,
        user: UserId,
        url: &str,
        tag: &str,
        weights: ScoreWeights,
        now_ms: i64,
    ) -> ScoreBreakdown {
        neutral_on_error(
            "score_tag",
            ScoreBreakdown::default(),
            assess_tag(&self.store, user, url, tag, weights, now_ms)
                .map(|assessment| assessment.breakdown),
        )
    }

    /// Collects category, bookmark count and tag distribution for a domain.
    pub fn domain_info(&self, user: UserId, input: &str) -> DomainInfo {
        neutral_on_error(
            "domain_info",
            DomainInfo::unknown(),
            domain_info(&self.store, user, input),
        )
    }

    /// Groups the user's most used tags into thematic clusters.
    pub fn build_clusters(&self, user: UserId) -> Vec<TagCluster> {
        neutral_on_error(
            "build_clusters",
            Vec::new(),
            build_clusters(&self.store, user),
        )
    }

    /// Builds the recent/frequent/unread activity descriptors.
    pub fn activity_collections(&self, user: UserId) -> Vec<Collection> {
        self.activity_collections_at(user, now_epoch_ms())
    }

    /// Clock-explicit variant of [`Self::activity_collections`].
    pub fn activity_collections_at(&self, user: UserId, now_ms: i64) -> Vec<Collection> {
        neutral_on_error(
            "activity_collections",
            Vec::new(),
            build_activity_collections(&self.store, user, now_ms),
        )
    }

    /// Builds one descriptor per top domain.
    pub fn domain_collections(&self, user: UserId) -> Vec<Collection> {
        neutral_on_error(
            "domain_collections",
            Vec::new(),
            build_domain_collections(&self.store, user),
        )
    }

    /// Builds the merged, name-deduplicated collection suggestion list.
    pub fn suggest_collections(&self, user: UserId) -> Vec<Collection> {
        self.suggest_collections_at(user, now_epoch_ms())
    }

    /// Clock-explicit variant of [`Self::suggest_collections`].
    pub fn suggest_collections_at(&self, user: UserId, now_ms: i64) -> Vec<Collection> {
        neutral_on_error(
            "suggest_collections",
            Vec::new(),
            suggest_collections(&self.store, user, now_ms),
        )
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::OrganizerService;
    use crate::organizer::score::{ScoreBreakdown, ScoreWeights};
    use crate::organizer::testing::FakeStore;
    use crate::organizer::DomainInfo;

    #[test]
    fn failing_store_degrades_every_operation_to_neutral() {
        let store = FakeStore::failing();
        let user = store.user;
        let service = OrganizerService::new(store);

        assert!(service
            .suggest_tags(user, "https://github.com/rust-lang/rust", None)
            .is_empty());
        assert_eq!(
            service.score_tag(
                user,
                "https://github.com/rust-lang/rust",
                "rust",
                ScoreWeights::default()
            ),
            ScoreBreakdown::default()
        );
        assert_eq!(
            service.domain_info(user, "https://github.com/x"),
            DomainInfo::unknown()
        );
        assert!(service.build_clusters(user).is_empty());
        assert!(service.suggest_collections(user).is_empty());
    }
}
