mod common;

use b2_booru::error::ErrorKind as BooruErrorKind;
use b2_booru::{Booru, Mime, Offset, PaginationType, Post, Tag, placeholder_url, search_from_start};
use b2_hydrus::HydrusBooru;
use b2_hydrus::error::ErrorKind;
use common::{Fixture, JPEG, PDF, PNG};
use sqlx::ConnectOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use tempfile::TempDir;

const A: i64 = 1;
const B: i64 = 2;
const C: i64 = 3;
const D: i64 = 4;
const E: i64 = 5;

/// Files `A{tag1,tag2}`, `B{tag1}`, `C{tag1,tag2,tag3}`, a PDF `D{tag1}` and
/// `E{big cat, character:samus aran}`.
async fn fixture() -> TempDir {
    let mut fixture = Fixture::new().await;
    fixture.tag(10, "tag1").await;
    fixture.tag(11, "tag2").await;
    fixture.tag(12, "tag3").await;
    fixture.tag(13, "big cat").await;
    fixture.tag(14, "character:samus aran").await;
    fixture.tag(15, "snake_case").await;
    fixture.file(A, 1000, PNG, &[10, 11]).await;
    fixture.file(B, 2000, JPEG, &[10]).await;
    fixture.file(C, 3000, PNG, &[10, 11, 12]).await;
    fixture.file(D, 4000, PDF, &[10]).await;
    fixture.file(E, 5000, PNG, &[13, 14, 15]).await;
    fixture.finish().await
}

async fn open(dir: &TempDir) -> HydrusBooru {
    HydrusBooru::open("hydrus", "Hydrus", dir.path()).await.unwrap()
}

fn tags(tags: &[&str]) -> Vec<String> {
    tags.iter().map(ToString::to_string).collect()
}

fn ids(posts: &[Post]) -> Vec<i64> {
    posts.iter().map(|post| post.id).collect()
}

#[tokio::test]
async fn test_search_requires_every_tag() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    let posts = booru.search(&tags(&["tag1", "tag2"]), &Offset::None).await.unwrap();
    assert_eq!(ids(&posts), vec![C, A]);
}

#[tokio::test]
async fn test_search_single_tag_skips_undisplayable_files() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    let posts = search_from_start(&booru, &tags(&["tag1"])).await.unwrap();
    assert_eq!(ids(&posts), vec![C, B, A]);
    assert_eq!(posts[1].mime, Mime::Jpeg);
}

#[tokio::test]
async fn test_repeated_tags_count_once() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    let posts = booru.search(&tags(&["tag2", "tag2"]), &Offset::None).await.unwrap();
    assert_eq!(ids(&posts), vec![C, A]);
}

#[tokio::test]
async fn test_unknown_tag_matches_nothing() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    assert!(booru.search(&tags(&["nonexistent"]), &Offset::None).await.unwrap().is_empty());
    assert!(booru.search(&tags(&["tag1", "nonexistent"]), &Offset::None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_underscores_search_as_spaces() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    assert_eq!(ids(&booru.search(&tags(&["big_cat"]), &Offset::None).await.unwrap()), vec![E]);
    assert_eq!(ids(&booru.search(&tags(&["big cat"]), &Offset::None).await.unwrap()), vec![E]);
    assert_eq!(ids(&booru.search(&tags(&["character:samus_aran"]), &Offset::None).await.unwrap()), vec![E]);
    // Stored with a real underscore, so it can never be found.
    assert!(booru.search(&tags(&["snake_case"]), &Offset::None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_initial_posts_newest_first() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    let posts = booru.initial_posts().await.unwrap();
    assert_eq!(ids(&posts), vec![E, C, B, A]);
    assert_eq!(posts[0].created_at.unix_timestamp(), 5000);
    assert_eq!(posts[0].size, E as u64 * 100);
    assert_eq!(posts[0].dimensions.map(|d| (d.width, d.height)), Some((640, 480)));

    let unfiltered = booru.search(&[], &Offset::None).await.unwrap();
    assert_eq!(ids(&unfiltered), ids(&posts));
}

#[tokio::test]
async fn test_identity() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    assert_eq!(booru.identity().name, "hydrus");
    assert_eq!(booru.identity().preferred_pagination(), PaginationType::None);
    let posts = booru.initial_posts().await.unwrap();
    assert_eq!(posts[0].global_id, booru.identity().global_id(E));
}

#[tokio::test]
async fn test_inconsistent_files_are_dropped() {
    let mut fixture = Fixture::new().await;
    fixture.tag(10, "tag1").await;
    fixture.file(A, 1000, PNG, &[10]).await;
    fixture.file(B, 2000, PNG, &[10]).await;
    fixture.file(C, 3000, PNG, &[10]).await;
    fixture.main("DELETE FROM files_info WHERE hash_id = 2").await;
    fixture.master("DELETE FROM hashes WHERE hash_id = 3").await;
    let dir = fixture.finish().await;
    let booru = open(&dir).await;

    let posts = booru.search(&tags(&["tag1"]), &Offset::None).await.unwrap();
    assert_eq!(ids(&posts), vec![A]);
    assert_eq!(ids(&booru.initial_posts().await.unwrap()), vec![A]);
}

#[tokio::test]
async fn test_tags_resolve_lazily() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    let posts = booru.search(&tags(&["big_cat"]), &Offset::None).await.unwrap();
    let expected = vec![Tag::plain("big cat"), Tag::plain("snake_case"), Tag::new(Some("character"), "samus aran")];
    assert_eq!(posts[0].tags().await, expected);
    // Memoized: a second access gives the same answer.
    assert_eq!(posts[0].tags().await, expected);
}

#[tokio::test]
async fn test_asset_urls() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    let posts = booru.search(&tags(&["tag2"]), &Offset::None).await.unwrap();
    let hash = Fixture::hash(C);
    let image = posts[0].image_url().to_file_path().unwrap();
    let thumbnail = posts[0].thumbnail_url().to_file_path().unwrap();
    assert!(image.ends_with(format!("client_files/f03/{hash}.png")));
    assert!(thumbnail.ends_with(format!("client_files/t03/{hash}.thumbnail")));
}

#[tokio::test]
async fn test_posts_outliving_the_backend() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    let posts = booru.initial_posts().await.unwrap();
    drop(booru);
    assert_eq!(posts[0].image_url(), placeholder_url());
    assert_eq!(posts[0].thumbnail_url(), placeholder_url());
    assert!(posts[0].tags().await.is_empty());
}

#[tokio::test]
async fn test_missing_database_file() {
    let dir = fixture().await;
    std::fs::remove_file(dir.path().join("client.caches.db")).unwrap();
    let err = HydrusBooru::open("hydrus", "Hydrus", dir.path()).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::MissingFile(path) if path.ends_with("client.caches.db")));
}

#[tokio::test]
async fn test_missing_tag_service() {
    let mut fixture = Fixture::new().await;
    fixture.main("DELETE FROM services WHERE service_id = 5").await;
    let dir = fixture.finish().await;
    let err = HydrusBooru::open("hydrus", "Hydrus", dir.path()).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::ServiceNotFound(_)));
}

#[tokio::test]
async fn test_missing_file_service_lists_nothing() {
    let mut fixture = Fixture::new().await;
    fixture.tag(10, "tag1").await;
    fixture.file(A, 1000, PNG, &[10]).await;
    fixture.main("DELETE FROM services WHERE service_id = 2").await;
    let dir = fixture.finish().await;
    let booru = open(&dir).await;
    assert!(booru.initial_posts().await.unwrap().is_empty());
    assert_eq!(ids(&booru.search(&tags(&["tag1"]), &Offset::None).await.unwrap()), vec![A]);
}

#[tokio::test]
async fn test_broken_database_fails_queries() {
    let dir = fixture().await;
    let booru = open(&dir).await;
    let mut conn = SqliteConnectOptions::new()
        .filename(dir.path().join("client.db"))
        .journal_mode(SqliteJournalMode::Delete)
        .connect()
        .await
        .unwrap();
    sqlx::query("DROP TABLE files_info").execute(&mut conn).await.unwrap();
    sqlx::Connection::close(conn).await.unwrap();

    let err = booru.initial_posts().await.unwrap_err();
    assert_eq!(*err, BooruErrorKind::QueryFailed);
    let err = booru.search(&tags(&["tag1"]), &Offset::None).await.unwrap_err();
    assert_eq!(*err, BooruErrorKind::QueryFailed);
}
