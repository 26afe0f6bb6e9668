//! Bookmark domain model.
//!
//! # Responsibility
//! - Define the canonical bookmark record owned by the store.
//! - Provide lifecycle helpers for soft-delete and click tracking.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another bookmark.
//! - `is_deleted` is the source of truth for tombstone state.
//! - `url` is never blank for a persisted bookmark.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every bookmark record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type BookmarkId = Uuid;

/// Stable identifier of the owning user.
///
/// All store queries and suggestion computations are scoped to one owner.
pub type UserId = Uuid;

/// Validation failure for bookmark field invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkValidationError {
    /// URL is empty or whitespace-only.
    BlankUrl,
}

impl Display for BookmarkValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankUrl => write!(f, "bookmark url must not be blank"),
        }
    }
}

impl Error for BookmarkValidationError {}

/// Canonical domain record for one saved link.
///
/// `created_at` is epoch milliseconds; the suggestion engine relies on it for
/// recency windows, so import paths must preserve original creation times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Stable global ID used for linking and auditing.
    pub uuid: BookmarkId,
    /// Owning user; every query is scoped by this value.
    pub user_uuid: UserId,
    /// Full URL as captured; not normalized beyond trimming.
    pub url: String,
    /// Page title, possibly empty when capture had none.
    pub title: String,
    /// Number of recorded visits through the app.
    pub click_count: u32,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Soft delete tombstone to preserve history.
    pub is_deleted: bool,
}

impl Bookmark {
    /// Creates a new bookmark with a generated stable ID.
    ///
    /// `created_at` starts at 0 and is replaced by the store default on
    /// insert; callers needing an explicit time set the field directly.
    pub fn new(user_uuid: UserId, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), user_uuid, url, title)
    }

    /// Creates a new bookmark with a caller-provided stable ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        uuid: BookmarkId,
        user_uuid: UserId,
        url: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            uuid,
            user_uuid,
            url: url.into().trim().to_string(),
            title: title.into(),
            click_count: 0,
            created_at: 0,
            is_deleted: false,
        }
    }

    /// Checks field invariants prior to persistence.
    pub fn validate(&self) -> Result<(), BookmarkValidationError> {
        if self.url.trim().is_empty() {
            return Err(BookmarkValidationError::BlankUrl);
        }
        Ok(())
    }

    /// Marks this bookmark as softly deleted (tombstoned).
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
    }

    /// Clears the soft delete flag.
    pub fn restore(&mut self) {
        self.is_deleted = false;
    }

    /// Returns whether this bookmark should be considered visible/active.
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}
