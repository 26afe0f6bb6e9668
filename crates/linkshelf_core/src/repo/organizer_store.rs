//! Read-only query surface consumed by the suggestion engine.
//!
//! # Responsibility
//! - Expose exactly the aggregate queries the organizer needs, nothing more.
//! - Keep SQL details out of scoring/cluster/collection logic so the engine
//!   can be exercised against an in-memory fake.
//!
//! # Invariants
//! - Every query is scoped to one user and excludes soft-deleted rows.
//! - No method mutates the store.
//! - Tag membership is exact (association join), never substring matching.

use crate::model::bookmark::UserId;
use crate::repo::bookmark_repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};

/// One tag name with the number of distinct bookmarks carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUsage {
    pub name: String,
    pub bookmark_count: u32,
}

/// Minimal per-bookmark projection used by similarity sampling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkDigest {
    /// Full URL as captured.
    pub url: String,
    /// Tags, normalized to lowercase.
    pub tags: Vec<String>,
}

/// Read-only store contract for the suggestion engine.
///
/// Counting methods mirror the filters the engine scores on: URL substring
/// for domain affinity, creation-time windows for activity, click thresholds
/// for saved-view statistics.
pub trait OrganizerStore {
    /// Counts active bookmarks whose URL contains `domain` as a substring.
    fn count_domain_bookmarks(&self, user: UserId, domain: &str) -> RepoResult<u32>;
    /// Same as [`Self::count_domain_bookmarks`], restricted to bookmarks
    /// carrying `tag`.
    fn count_domain_bookmarks_with_tag(
        &self,
        user: UserId,
        domain: &str,
        tag: &str,
    ) -> RepoResult<u32>;
    /// Counts active bookmarks created at or after `since_ms`.
    fn count_created_since(&self, user: UserId, since_ms: i64) -> RepoResult<u32>;
    /// Same as [`Self::count_created_since`], restricted to bookmarks
    /// carrying `tag`.
    fn count_created_since_with_tag(
        &self,
        user: UserId,
        since_ms: i64,
        tag: &str,
    ) -> RepoResult<u32>;
    /// Counts active bookmarks with strictly more than `min_clicks` clicks.
    fn count_clicked_more_than(&self, user: UserId, min_clicks: u32) -> RepoResult<u32>;
    /// Counts never-clicked bookmarks created strictly before `created_before_ms`.
    fn count_unread_before(&self, user: UserId, created_before_ms: i64) -> RepoResult<u32>;
    /// Counts distinct active bookmarks carrying any of `tags`.
    fn count_with_any_tag(&self, user: UserId, tags: &[String]) -> RepoResult<u32>;
    /// Returns up to `limit` recent bookmark digests for similarity sampling.
    fn sample_digests(&self, user: UserId, limit: u32) -> RepoResult<Vec<BookmarkDigest>>;
    /// Returns the user's full tag vocabulary.
    fn tag_vocabulary(&self, user: UserId) -> RepoResult<Vec<String>>;
    /// Returns up to `limit` tags ordered by association count descending.
    fn top_tags(&self, user: UserId, limit: u32) -> RepoResult<Vec<TagUsage>>;
    /// Returns tag usage restricted to bookmarks whose URL contains `domain`.
    fn domain_tag_distribution(&self, user: UserId, domain: &str) -> RepoResult<Vec<TagUsage>>;
    /// Returns all active bookmark URLs for domain statistics.
    fn bookmark_urls(&self, user: UserId) -> RepoResult<Vec<String>>;
}

/// SQLite-backed read-only store for the suggestion engine.
pub struct SqliteOrganizerStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrganizerStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn count_query(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<u32> {
        let mut stmt = self.conn.prepare(sql)?;
        let count: i64 = stmt.query_row(params_from_iter(bind_values), |row| row.get(0))?;
        u32::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative count `{count}` from store")))
    }

    fn tag_usage_query(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<TagUsage>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut usage = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            let bookmark_count: i64 = row.get("bookmark_count")?;
            let bookmark_count = u32::try_from(bookmark_count).map_err(|_| {
                RepoError::InvalidData(format!("negative tag usage count `{bookmark_count}`"))
            })?;
            usage.push(TagUsage {
                name: name.to_lowercase(),
                bookmark_count,
            });
        }
        Ok(usage)
    }
}

impl OrganizerStore for SqliteOrganizerStore<'_> {
    fn count_domain_bookmarks(&self, user: UserId, domain: &str) -> RepoResult<u32> {
        self.count_query(
            "SELECT COUNT(*)
             FROM bookmarks
             WHERE user_uuid = ?1
               AND is_deleted = 0
               AND instr(url, ?2) > 0;",
            vec![
                Value::Text(user.to_string()),
                Value::Text(domain.to_string()),
            ],
        )
    }

    fn count_domain_bookmarks_with_tag(
        &self,
        user: UserId,
        domain: &str,
        tag: &str,
    ) -> RepoResult<u32> {
        self.count_query(
            "SELECT COUNT(*)
             FROM bookmarks
             WHERE user_uuid = ?1
               AND is_deleted = 0
               AND instr(url, ?2) > 0
               AND EXISTS (
                   SELECT 1
                   FROM bookmark_tags bt
                   INNER JOIN tags t ON t.id = bt.tag_id
                   WHERE bt.bookmark_uuid = bookmarks.uuid
                     AND t.name = ?3 COLLATE NOCASE
               );",
            vec![
                Value::Text(user.to_string()),
                Value::Text(domain.to_string()),
                Value::Text(tag.to_string()),
            ],
        )
    }

    fn count_created_since(&self, user: UserId, since_ms: i64) -> RepoResult<u32> {
        self.count_query(
            "SELECT COUNT(*)
             FROM bookmarks
             WHERE user_uuid = ?1
               AND is_deleted = 0
               AND created_at >= ?2;",
            vec![Value::Text(user.to_string()), Value::Integer(since_ms)],
        )
    }

    fn count_created_since_with_tag(
        &self,
        user: UserId,
        since_ms: i64,
        tag: &str,
    ) -> RepoResult<u32> {
        self.count_query(
            "SELECT COUNT(*)
             FROM bookmarks
             WHERE user_uuid = ?1
               AND is_deleted = 0
               AND created_at >= ?2
               AND EXISTS (
                   SELECT 1
                   FROM bookmark_tags bt
                   INNER JOIN tags t ON t.id = bt.tag_id
                   WHERE bt.bookmark_uuid = bookmarks.uuid
                     AND t.name = ?3 COLLATE NOCASE
               );",
            vec![
                Value::Text(user.to_string()),
                Value::Integer(since_ms),
                Value::Text(tag.to_string()),
            ],
        )
    }

    fn count_clicked_more_than(&self, user: UserId, min_clicks: u32) -> RepoResult<u32> {
        self.count_query(
            "SELECT COUNT(*)
             FROM bookmarks
             WHERE user_uuid = ?1
               AND is_deleted = 0
               AND click_count > ?2;",
            vec![
                Value::Text(user.to_string()),
                Value::Integer(i64::from(min_clicks)),
            ],
        )
    }

    fn count_unread_before(&self, user: UserId, created_before_ms: i64) -> RepoResult<u32> {
        self.count_query(
            "SELECT COUNT(*)
             FROM bookmarks
             WHERE user_uuid = ?1
               AND is_deleted = 0
               AND click_count = 0
               AND created_at < ?2;",
            vec![
                Value::Text(user.to_string()),
                Value::Integer(created_before_ms),
            ],
        )
    }

    fn count_with_any_tag(&self, user: UserId, tags: &[String]) -> RepoResult<u32> {
        if tags.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; tags.len()].join(", ");
        let sql = format!(
            "SELECT COUNT(DISTINCT bt.bookmark_uuid)
             FROM bookmark_tags bt
             INNER JOIN tags t ON t.id = bt.tag_id
             INNER JOIN bookmarks b ON b.uuid = bt.bookmark_uuid
             WHERE b.user_uuid = ?
               AND b.is_deleted = 0
               AND t.name IN ({placeholders});"
        );

        let mut bind_values: Vec<Value> = vec![Value::Text(user.to_string())];
        bind_values.extend(tags.iter().map(|tag| Value::Text(tag.to_lowercase())));
        self.count_query(&sql, bind_values)
    }

    fn sample_digests(&self, user: UserId, limit: u32) -> RepoResult<Vec<BookmarkDigest>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, url
             FROM bookmarks
             WHERE user_uuid = ?1
               AND is_deleted = 0
             ORDER BY updated_at DESC, uuid ASC
             LIMIT ?2;",
        )?;
        let mut rows = stmt.query(params![user.to_string(), i64::from(limit)])?;
        let mut digests = Vec::new();
        while let Some(row) = rows.next()? {
            let bookmark_uuid: String = row.get("uuid")?;
            let url: String = row.get("url")?;
            let tags = load_digest_tags(self.conn, &bookmark_uuid)?;
            digests.push(BookmarkDigest { url, tags });
        }
        Ok(digests)
    }

    fn tag_vocabulary(&self, user: UserId) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name
             FROM tags
             WHERE user_uuid = ?1
             ORDER BY name COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([user.to_string()])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get("name")?;
            names.push(value.to_lowercase());
        }
        Ok(names)
    }

    fn top_tags(&self, user: UserId, limit: u32) -> RepoResult<Vec<TagUsage>> {
        self.tag_usage_query(
            "SELECT t.name AS name, COUNT(DISTINCT bt.bookmark_uuid) AS bookmark_count
             FROM tags t
             INNER JOIN bookmark_tags bt ON bt.tag_id = t.id
             INNER JOIN bookmarks b ON b.uuid = bt.bookmark_uuid
             WHERE t.user_uuid = ?1
               AND b.is_deleted = 0
             GROUP BY t.id, t.name
             ORDER BY bookmark_count DESC, t.name COLLATE NOCASE ASC
             LIMIT ?2;",
            vec![
                Value::Text(user.to_string()),
                Value::Integer(i64::from(limit)),
            ],
        )
    }

    fn domain_tag_distribution(&self, user: UserId, domain: &str) -> RepoResult<Vec<TagUsage>> {
        self.tag_usage_query(
            "SELECT t.name AS name, COUNT(DISTINCT bt.bookmark_uuid) AS bookmark_count
             FROM tags t
             INNER JOIN bookmark_tags bt ON bt.tag_id = t.id
             INNER JOIN bookmarks b ON b.uuid = bt.bookmark_uuid
             WHERE t.user_uuid = ?1
               AND b.is_deleted = 0
               AND instr(b.url, ?2) > 0
             GROUP BY t.id, t.name
             ORDER BY bookmark_count DESC, t.name COLLATE NOCASE ASC;",
            vec![
                Value::Text(user.to_string()),
                Value::Text(domain.to_string()),
            ],
        )
    }

    fn bookmark_urls(&self, user: UserId) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT url
             FROM bookmarks
             WHERE user_uuid = ?1
               AND is_deleted = 0
             ORDER BY created_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([user.to_string()])?;
        let mut urls = Vec::new();
        while let Some(row) = rows.next()? {
            urls.push(row.get(0)?);
        }
        Ok(urls)
    }
}

fn load_digest_tags(conn: &Connection, bookmark_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM bookmark_tags bt
         INNER JOIN tags t ON t.id = bt.tag_id
         WHERE bt.bookmark_uuid = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([bookmark_uuid])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}
