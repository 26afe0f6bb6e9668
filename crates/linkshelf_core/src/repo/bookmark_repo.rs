//! Bookmark/tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `bookmarks` storage.
//! - Own tag-link replacement logic (`set_bookmark_tags`) with atomic
//!   semantics.
//!
//! # Invariants
//! - All read queries are constrained to `is_deleted=0` rows.
//! - `set_bookmark_tags` replaces the whole tag set in a single transaction.
//! - Tag names are normalized to lowercase before persistence.

use crate::db::DbError;
use crate::model::bookmark::{Bookmark, BookmarkId, BookmarkValidationError, UserId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const BOOKMARKS_DEFAULT_LIMIT: u32 = 20;
const BOOKMARKS_LIMIT_MAX: u32 = 100;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for bookmark persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(BookmarkValidationError),
    Db(DbError),
    NotFound(BookmarkId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "bookmark not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted bookmark data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<BookmarkValidationError> for RepoError {
    fn from(value: BookmarkValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read model for bookmark list/detail use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkRecord {
    /// Stable bookmark id.
    pub bookmark_id: BookmarkId,
    /// Owning user.
    pub user_uuid: UserId,
    /// Full URL as captured.
    pub url: String,
    /// Page title, possibly empty.
    pub title: String,
    /// Number of recorded visits.
    pub click_count: u32,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    /// Update timestamp in epoch milliseconds.
    pub updated_at: i64,
    /// Bookmark tags, normalized to lowercase.
    pub tags: Vec<String>,
}

/// Query options for bookmark list use-cases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkListQuery {
    /// Optional single-tag exact match filter.
    pub tag: Option<String>,
    /// Maximum rows to return. Defaults to 20 and clamps to 100.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for bookmark/tag CRUD operations.
pub trait BookmarkRepository {
    /// Creates one bookmark and returns its stable id.
    ///
    /// A `created_at` of 0 is replaced by the current time; any other value
    /// is preserved so import paths keep original creation times.
    fn create_bookmark(&self, bookmark: &Bookmark) -> RepoResult<BookmarkId>;
    /// Gets one active bookmark by id.
    fn get_bookmark(&self, bookmark_id: BookmarkId) -> RepoResult<Option<BookmarkRecord>>;
    /// Lists one user's bookmarks using single-tag filter + pagination.
    fn list_bookmarks(
        &self,
        user: UserId,
        query: &BookmarkListQuery,
    ) -> RepoResult<Vec<BookmarkRecord>>;
    /// Replaces all tags for the given bookmark in one transaction.
    fn set_bookmark_tags(&mut self, bookmark_id: BookmarkId, tags: &[String]) -> RepoResult<()>;
    /// Increments the click counter for one active bookmark.
    fn record_click(&self, bookmark_id: BookmarkId) -> RepoResult<()>;
    /// Soft-deletes one bookmark by id.
    fn soft_delete_bookmark(&self, bookmark_id: BookmarkId) -> RepoResult<()>;
    /// Returns all of one user's tags sorted by name.
    fn list_tags(&self, user: UserId) -> RepoResult<Vec<String>>;
}

/// SQLite-backed bookmark/tag repository.
pub struct SqliteBookmarkRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteBookmarkRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

const BOOKMARK_SELECT_SQL: &str = "SELECT
    uuid,
    user_uuid,
    url,
    title,
    click_count,
    created_at,
    updated_at
FROM bookmarks";

impl BookmarkRepository for SqliteBookmarkRepository<'_> {
    fn create_bookmark(&self, bookmark: &Bookmark) -> RepoResult<BookmarkId> {
        bookmark.validate()?;

        self.conn.execute(
            "INSERT INTO bookmarks (
                uuid,
                user_uuid,
                url,
                title,
                click_count,
                is_deleted,
                created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                CASE WHEN ?7 = 0 THEN (strftime('%s', 'now') * 1000) ELSE ?7 END
            );",
            params![
                bookmark.uuid.to_string(),
                bookmark.user_uuid.to_string(),
                bookmark.url.as_str(),
                bookmark.title.as_str(),
                i64::from(bookmark.click_count),
                bool_to_int(bookmark.is_deleted),
                bookmark.created_at,
            ],
        )?;

        Ok(bookmark.uuid)
    }

    fn get_bookmark(&self, bookmark_id: BookmarkId) -> RepoResult<Option<BookmarkRecord>> {
        let uuid = bookmark_id.to_string();
        let mut stmt = self.conn.prepare(&format!(
            "{BOOKMARK_SELECT_SQL}
             WHERE uuid = ?1
               AND is_deleted = 0;"
        ))?;

        let mut rows = stmt.query([uuid.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_bookmark_row(self.conn, row)?));
        }

        Ok(None)
    }

    fn list_bookmarks(
        &self,
        user: UserId,
        query: &BookmarkListQuery,
    ) -> RepoResult<Vec<BookmarkRecord>> {
        let mut sql = format!(
            "{BOOKMARK_SELECT_SQL}
             WHERE user_uuid = ?
               AND is_deleted = 0"
        );
        let mut bind_values: Vec<Value> = vec![Value::Text(user.to_string())];

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM bookmark_tags bt
                    INNER JOIN tags t ON t.id = bt.tag_id
                    WHERE bt.bookmark_uuid = bookmarks.uuid
                      AND t.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag.clone()));
        }

        sql.push_str(" ORDER BY updated_at DESC, uuid ASC");
        let limit = normalize_bookmark_limit(query.limit);
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut bookmarks = Vec::new();
        while let Some(row) = rows.next()? {
            bookmarks.push(parse_bookmark_row(self.conn, row)?);
        }

        Ok(bookmarks)
    }

    fn set_bookmark_tags(&mut self, bookmark_id: BookmarkId, tags: &[String]) -> RepoResult<()> {
        let bookmark_uuid = bookmark_id.to_string();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(user_uuid) = bookmark_owner_in_tx(&tx, bookmark_uuid.as_str())? else {
            return Err(RepoError::NotFound(bookmark_id));
        };

        tx.execute(
            "DELETE FROM bookmark_tags WHERE bookmark_uuid = ?1;",
            [bookmark_uuid.as_str()],
        )?;

        for tag in tags {
            tx.execute(
                "INSERT OR IGNORE INTO tags (user_uuid, name) VALUES (?1, ?2);",
                params![user_uuid.as_str(), tag.as_str()],
            )?;
            tx.execute(
                "INSERT INTO bookmark_tags (bookmark_uuid, tag_id)
                 SELECT ?1, id
                 FROM tags
                 WHERE user_uuid = ?2
                   AND name = ?3 COLLATE NOCASE;",
                params![bookmark_uuid.as_str(), user_uuid.as_str(), tag.as_str()],
            )?;
        }

        tx.execute(
            "UPDATE bookmarks
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [bookmark_uuid.as_str()],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn record_click(&self, bookmark_id: BookmarkId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE bookmarks
             SET
                click_count = click_count + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND is_deleted = 0;",
            [bookmark_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(bookmark_id));
        }

        Ok(())
    }

    fn soft_delete_bookmark(&self, bookmark_id: BookmarkId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE bookmarks
             SET
                is_deleted = 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [bookmark_id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(bookmark_id));
        }

        Ok(())
    }

    fn list_tags(&self, user: UserId) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name
             FROM tags
             WHERE user_uuid = ?1
             ORDER BY name COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([user.to_string()])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get("name")?;
            tags.push(value.to_lowercase());
        }
        Ok(tags)
    }
}

/// Normalizes list limit according to the bookmarks contract.
pub fn normalize_bookmark_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => BOOKMARKS_DEFAULT_LIMIT,
        Some(value) if value > BOOKMARKS_LIMIT_MAX => BOOKMARKS_LIMIT_MAX,
        Some(value) => value,
        None => BOOKMARKS_DEFAULT_LIMIT,
    }
}

/// Normalizes one tag value according to the tags contract.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes and deduplicates tag values.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        if let Some(value) = normalize_tag(tag) {
            unique.insert(value);
        }
    }
    unique.into_iter().collect()
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in bookmarks.{column}"))
    })
}

fn parse_bookmark_row(conn: &Connection, row: &Row<'_>) -> RepoResult<BookmarkRecord> {
    let uuid_text: String = row.get("uuid")?;
    let bookmark_id = parse_uuid(&uuid_text, "uuid")?;

    let user_text: String = row.get("user_uuid")?;
    let user_uuid = parse_uuid(&user_text, "user_uuid")?;

    let click_count: i64 = row.get("click_count")?;
    let click_count = u32::try_from(click_count).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid click_count value `{click_count}` in bookmarks.click_count"
        ))
    })?;

    let tags = load_tags_for_bookmark(conn, &uuid_text)?;
    Ok(BookmarkRecord {
        bookmark_id,
        user_uuid,
        url: row.get("url")?,
        title: row.get("title")?,
        click_count,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tags,
    })
}

fn load_tags_for_bookmark(conn: &Connection, bookmark_uuid: &str) -> RepoResult<Vec<String>> {
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

fn bookmark_owner_in_tx(tx: &Transaction<'_>, bookmark_uuid: &str) -> RepoResult<Option<String>> {
    let mut stmt = tx.prepare(
        "SELECT user_uuid
         FROM bookmarks
         WHERE uuid = ?1
           AND is_deleted = 0;",
    )?;
    let mut rows = stmt.query([bookmark_uuid])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(row.get("user_uuid")?));
    }
    Ok(None)
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
