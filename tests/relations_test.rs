//! Integration tests for tag reconciliation and user lifecycle.

mod common;

use std::collections::HashSet;

use common::TestHarness;
use kb_core::{Error, TagId};
use kb_db::queries::{tags, users};
use kb_db::relation::{reconcile, set_user_tags, UserTags};

#[test]
fn update_m2m() {
    let h = TestHarness::new();
    let conn = h.conn();
    let tag_1 = tags::create_tag(&conn, "Tag 1").unwrap();
    let tag_2 = tags::create_tag(&conn, "Tag 2").unwrap();
    let tag_3 = tags::create_tag(&conn, "Tag 3").unwrap();
    let user = users::create_user(&conn, "John", "Doe").unwrap();
    tags::add_user_tags(&conn, user.id, &[tag_1.id, tag_2.id]).unwrap();

    let mut store = UserTags::new(&conn, user.id);
    reconcile(&mut store, [tag_2.id, tag_3.id]).unwrap();

    assert_eq!(tags::list_user_tags(&conn, user.id).unwrap(), vec![tag_2, tag_3]);
}

#[test]
fn set_user_tags_with_duplicates_and_reordering() {
    let h = TestHarness::new();
    let conn = h.conn();
    let ids: Vec<TagId> = (0..5)
        .map(|i| tags::create_tag(&conn, &format!("t{i}")).unwrap().id)
        .collect();
    let user = users::create_user(&conn, "Ada", "Lovelace").unwrap();

    let rounds: Vec<Vec<TagId>> = vec![
        vec![ids[0], ids[1], ids[1]],
        vec![ids[4], ids[3], ids[0], ids[3]],
        vec![],
        vec![ids[2]; 4],
        ids.iter().rev().copied().collect(),
    ];
    for desired in rounds {
        set_user_tags(&conn, user.id, &desired).unwrap();
        let expected: HashSet<TagId> = desired.iter().copied().collect();
        assert_eq!(tags::user_tag_ids(&conn, user.id).unwrap(), expected);
    }
}

#[test]
fn reconcile_leaves_untouched_members_alone() {
    let h = TestHarness::new();
    let conn = h.conn();
    let kept = tags::create_tag(&conn, "kept").unwrap();
    let user = users::create_user(&conn, "John", "Doe").unwrap();
    tags::add_user_tags(&conn, user.id, &[kept.id]).unwrap();
    let linked_at: String = conn
        .query_row(
            "SELECT created_at FROM user_tags WHERE tag_id = ?1",
            [kept.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();

    let fresh = tags::create_tag(&conn, "fresh").unwrap();
    let delta = set_user_tags(&conn, user.id, &[kept.id, fresh.id]).unwrap();
    assert_eq!(delta.added, vec![fresh.id]);
    assert!(delta.removed.is_empty());

    let still: String = conn
        .query_row(
            "SELECT created_at FROM user_tags WHERE tag_id = ?1",
            [kept.id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(linked_at, still);
}

#[test]
fn persistence_failure_is_surfaced() {
    let h = TestHarness::new();
    let conn = h.conn();
    let user = users::create_user(&conn, "John", "Doe").unwrap();
    let err = set_user_tags(&conn, user.id, &[TagId::new()]).unwrap_err();
    assert!(matches!(err, Error::Database { .. }));
}

#[test]
fn deleting_user_drops_memberships() {
    let h = TestHarness::new();
    let conn = h.conn();
    let tag = tags::create_tag(&conn, "t").unwrap();
    let user = users::create_user(&conn, "John", "Doe").unwrap();
    set_user_tags(&conn, user.id, &[tag.id]).unwrap();

    assert!(users::delete_user(&conn, user.id).unwrap());
    let left: i64 = conn
        .query_row("SELECT COUNT(*) FROM user_tags", [], |row| row.get(0))
        .unwrap();
    assert_eq!(left, 0);
}

#[test]
fn avatar_upload_is_bounded_by_config() {
    let h = TestHarness::new();
    let conn = h.conn();
    let user = users::create_user(&conn, "John", "Doe").unwrap();
    let path = h.path("github-logo.png");
    common::write_image(&path, 512, 512);

    let svc = h.avatars(100);
    let stored = svc
        .set_avatar(user.id, "github-logo.png", &std::fs::read(&path).unwrap())
        .unwrap();
    assert_eq!((stored.width, stored.height), (100, 100));

    let name = users::get_user(&conn, user.id).unwrap().unwrap().avatar.unwrap();
    let (prefix, rest) = name.split_at("avatars/github-logo_".len());
    assert_eq!(prefix, "avatars/github-logo_");
    let uuid = rest.strip_suffix(".png").unwrap();
    assert!(uuid.parse::<kb_core::UserId>().is_ok(), "{uuid} is not a uuid");
}
