//! Bookmark use-case service.
//!
//! # Responsibility
//! - Provide bookmark-specific create/get/list/tag/click APIs.
//! - Normalize and atomically replace bookmark tags.
//!
//! # Invariants
//! - Bookmark list is always sorted by `updated_at DESC, uuid ASC`.
//! - Tag names are normalized to lowercase and deduplicated.

use crate::model::bookmark::{Bookmark, BookmarkId, UserId};
use crate::repo::bookmark_repo::{
    normalize_bookmark_limit, normalize_tag, normalize_tags, BookmarkListQuery, BookmarkRecord,
    BookmarkRepository, RepoError, RepoResult,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for bookmark use-cases.
#[derive(Debug)]
pub enum BookmarkServiceError {
    /// Tag input contains empty values.
    InvalidTag(String),
    /// Target bookmark does not exist.
    BookmarkNotFound(BookmarkId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for BookmarkServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::BookmarkNotFound(bookmark_id) => {
                write!(f, "bookmark not found: {bookmark_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent bookmark state: {details}")
            }
        }
    }
}

impl Error for BookmarkServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BookmarkServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(bookmark_id) => Self::BookmarkNotFound(bookmark_id),
            other => Self::Repo(other),
        }
    }
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarksListResult {
    /// List items sorted by `updated_at DESC, uuid ASC`.
    pub items: Vec<BookmarkRecord>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Bookmark service facade over repository implementations.
pub struct BookmarkService<R: BookmarkRepository> {
    repo: R,
}

impl<R: BookmarkRepository> BookmarkService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Captures one bookmark for a user.
    pub fn add_bookmark(
        &self,
        user: UserId,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<BookmarkRecord, BookmarkServiceError> {
        let bookmark = Bookmark::new(user, url, title);
        let bookmark_id = self.repo.create_bookmark(&bookmark)?;
        self.repo
            .get_bookmark(bookmark_id)?
            .ok_or(BookmarkServiceError::InconsistentState(
                "created bookmark not found in read-back",
            ))
    }

    /// Captures one bookmark preserving an externally supplied creation time.
    ///
    /// Used by import paths; `created_at` is epoch milliseconds.
    pub fn import_bookmark(
        &self,
        user: UserId,
        url: impl Into<String>,
        title: impl Into<String>,
        created_at: i64,
    ) -> Result<BookmarkRecord, BookmarkServiceError> {
        let mut bookmark = Bookmark::new(user, url, title);
        bookmark.created_at = created_at;
        let bookmark_id = self.repo.create_bookmark(&bookmark)?;
        self.repo
            .get_bookmark(bookmark_id)?
            .ok_or(BookmarkServiceError::InconsistentState(
                "imported bookmark not found in read-back",
            ))
    }

    /// Gets one bookmark by stable ID.
    pub fn get_bookmark(&self, bookmark_id: BookmarkId) -> RepoResult<Option<BookmarkRecord>> {
        self.repo.get_bookmark(bookmark_id)
    }

    /// Lists bookmarks using optional single-tag filter and pagination.
    pub fn list_bookmarks(
        &self,
        user: UserId,
        tag: Option<String>,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<BookmarksListResult, BookmarkServiceError> {
        let normalized_tag = tag.and_then(|value| normalize_tag(value.as_str()));
        let applied_limit = normalize_bookmark_limit(limit);
        let query = BookmarkListQuery {
            tag: normalized_tag,
            limit: Some(applied_limit),
            offset,
        };
        let items = self.repo.list_bookmarks(user, &query)?;
        Ok(BookmarksListResult {
            items,
            applied_limit,
        })
    }

    /// Atomically replaces the full tag set for one bookmark.
    pub fn set_bookmark_tags(
        &mut self,
        bookmark_id: BookmarkId,
        tags: Vec<String>,
    ) -> Result<BookmarkRecord, BookmarkServiceError> {
        for tag in &tags {
            if tag.trim().is_empty() {
                return Err(BookmarkServiceError::InvalidTag(tag.clone()));
            }
        }

        let normalized = normalize_tags(&tags);
        self.repo.set_bookmark_tags(bookmark_id, &normalized)?;
        self.repo
            .get_bookmark(bookmark_id)?
            .ok_or(BookmarkServiceError::InconsistentState(
                "bookmark missing after tag replacement",
            ))
    }

    /// Records one visit to a bookmark.
    pub fn record_click(
        &self,
        bookmark_id: BookmarkId,
    ) -> Result<BookmarkRecord, BookmarkServiceError> {
        self.repo.record_click(bookmark_id)?;
        self.repo
            .get_bookmark(bookmark_id)?
            .ok_or(BookmarkServiceError::InconsistentState(
                "bookmark missing after click update",
            ))
    }

    /// Soft-deletes one bookmark by ID.
    pub fn delete_bookmark(&self, bookmark_id: BookmarkId) -> RepoResult<()> {
        self.repo.soft_delete_bookmark(bookmark_id)
    }

    /// Lists normalized tags known for one user.
    pub fn list_tags(&self, user: UserId) -> RepoResult<Vec<String>> {
        self.repo.list_tags(user)
    }
}
