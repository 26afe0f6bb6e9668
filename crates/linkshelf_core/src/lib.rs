//! Core domain logic for LinkShelf.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod organizer;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::bookmark::{Bookmark, BookmarkId, BookmarkValidationError, UserId};
pub use organizer::catalog::{classify, host_of, DomainClassification};
pub use organizer::cluster::{ClusterCategory, TagCluster};
pub use organizer::collection::{Collection, CollectionFilters, CollectionKind};
pub use organizer::score::{
    ScoreBreakdown, ScoreWeights, SignalSource, SourceFlags, TagSuggestion,
};
pub use organizer::DomainInfo;
pub use repo::bookmark_repo::{
    BookmarkListQuery, BookmarkRecord, BookmarkRepository, RepoError, RepoResult,
    SqliteBookmarkRepository,
};
pub use repo::organizer_store::{BookmarkDigest, OrganizerStore, SqliteOrganizerStore, TagUsage};
pub use service::bookmark_service::{BookmarkService, BookmarkServiceError};
pub use service::organizer_service::OrganizerService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
