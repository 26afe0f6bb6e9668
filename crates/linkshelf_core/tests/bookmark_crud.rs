use linkshelf_core::db::open_db_in_memory;
use linkshelf_core::{
    Bookmark, BookmarkService, BookmarkServiceError, RepoError, SqliteBookmarkRepository,
};
use rusqlite::params;
use uuid::Uuid;

#[test]
fn add_and_get_roundtrip() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let created = service
        .add_bookmark(user, "https://github.com/rust-lang/rust", "The Rust repo")
        .unwrap();
    assert_eq!(created.url, "https://github.com/rust-lang/rust");
    assert_eq!(created.title, "The Rust repo");
    assert_eq!(created.click_count, 0);
    assert!(created.tags.is_empty());
    assert!(created.created_at > 0);

    let loaded = service.get_bookmark(created.bookmark_id).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn add_bookmark_rejects_blank_url() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let err = service.add_bookmark(user, "   ", "no url").unwrap_err();
    assert!(matches!(
        err,
        BookmarkServiceError::Repo(RepoError::Validation(_))
    ));
}

#[test]
fn import_bookmark_preserves_creation_time() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    let imported = service
        .import_bookmark(user, "https://example.com/old", "", 1_600_000_000_000)
        .unwrap();
    assert_eq!(imported.created_at, 1_600_000_000_000);
}

#[test]
fn set_bookmark_tags_replaces_full_set_with_lowercase_normalization() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let mut service = BookmarkService::new(repo);
    let created = service
        .add_bookmark(user, "https://example.com/tagged", "")
        .unwrap();

    let after_first = service
        .set_bookmark_tags(
            created.bookmark_id,
            vec![
                "Rust".to_string(),
                "OPENSOURCE".to_string(),
                "rust".to_string(),
            ],
        )
        .unwrap();
    assert_eq!(
        after_first.tags,
        vec!["opensource".to_string(), "rust".to_string()]
    );

    let after_replace = service
        .set_bookmark_tags(created.bookmark_id, vec!["Reading".to_string()])
        .unwrap();
    assert_eq!(after_replace.tags, vec!["reading".to_string()]);
}

#[test]
fn set_bookmark_tags_rejects_blank_tag_values() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let mut service = BookmarkService::new(repo);
    let created = service
        .add_bookmark(user, "https://example.com/tagged", "")
        .unwrap();

    let err = service
        .set_bookmark_tags(created.bookmark_id, vec!["   ".to_string()])
        .unwrap_err();
    assert!(matches!(err, BookmarkServiceError::InvalidTag(_)));
}

#[test]
fn list_bookmarks_supports_single_tag_filter() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let mut service = BookmarkService::new(repo);

    let tagged = service
        .add_bookmark(user, "https://github.com/rust-lang/rust", "")
        .unwrap();
    let untagged = service
        .add_bookmark(user, "https://example.com/other", "")
        .unwrap();
    service
        .set_bookmark_tags(tagged.bookmark_id, vec!["Rust".to_string()])
        .unwrap();

    let filtered = service
        .list_bookmarks(user, Some("RUST".to_string()), Some(10), 0)
        .unwrap();
    assert_eq!(filtered.items.len(), 1);
    assert_eq!(filtered.items[0].bookmark_id, tagged.bookmark_id);
    assert_ne!(filtered.items[0].bookmark_id, untagged.bookmark_id);
}

#[test]
fn list_bookmarks_is_scoped_to_one_user() {
    let mut conn = open_db_in_memory().unwrap();
    let user_a = Uuid::new_v4();
    let user_b = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);

    service
        .add_bookmark(user_a, "https://example.com/a", "")
        .unwrap();
    service
        .add_bookmark(user_b, "https://example.com/b", "")
        .unwrap();

    let listed = service.list_bookmarks(user_a, None, Some(10), 0).unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].url, "https://example.com/a");
}

#[test]
fn list_bookmarks_limit_defaults_to_20_and_caps_at_100() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);
    for index in 0..120 {
        service
            .add_bookmark(user, format!("https://example.com/{index}"), "")
            .unwrap();
    }

    let defaulted = service.list_bookmarks(user, None, None, 0).unwrap();
    assert_eq!(defaulted.applied_limit, 20);
    assert_eq!(defaulted.items.len(), 20);

    let capped = service.list_bookmarks(user, None, Some(500), 0).unwrap();
    assert_eq!(capped.applied_limit, 100);
    assert_eq!(capped.items.len(), 100);
}

#[test]
fn record_click_increments_counter() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);
    let created = service
        .add_bookmark(user, "https://example.com/clicky", "")
        .unwrap();

    service.record_click(created.bookmark_id).unwrap();
    let after = service.record_click(created.bookmark_id).unwrap();
    assert_eq!(after.click_count, 2);
}

#[test]
fn soft_deleted_bookmarks_disappear_from_reads() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let service = BookmarkService::new(repo);
    let created = service
        .add_bookmark(user, "https://example.com/doomed", "")
        .unwrap();

    service.delete_bookmark(created.bookmark_id).unwrap();
    assert!(service.get_bookmark(created.bookmark_id).unwrap().is_none());
    assert!(service
        .list_bookmarks(user, None, Some(10), 0)
        .unwrap()
        .items
        .is_empty());

    // Row still exists as a tombstone.
    let tombstones: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookmarks WHERE uuid = ?1 AND is_deleted = 1;",
            params![created.bookmark_id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tombstones, 1);
}

#[test]
fn list_tags_returns_sorted_lowercase_names() {
    let mut conn = open_db_in_memory().unwrap();
    let user = Uuid::new_v4();
    let repo = SqliteBookmarkRepository::new(&mut conn);
    let mut service = BookmarkService::new(repo);

    let first = service
        .add_bookmark(user, "https://example.com/1", "")
        .unwrap();
    let second = service
        .add_bookmark(user, "https://example.com/2", "")
        .unwrap();
    service
        .set_bookmark_tags(first.bookmark_id, vec!["Zebra".to_string()])
        .unwrap();
    service
        .set_bookmark_tags(second.bookmark_id, vec!["apple".to_string()])
        .unwrap();

    let tags = service.list_tags(user).unwrap();
    assert_eq!(tags, vec!["apple".to_string(), "zebra".to_string()]);
}

#[test]
fn create_bookmark_validates_model_invariants() {
    let bookmark = Bookmark::new(Uuid::new_v4(), "", "blank");
    assert!(bookmark.validate().is_err());
}
