use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::tests::helper;

#[tokio::test]
async fn test_submitted_note_is_pending_and_not_public() {
    let mut app = helper::setup_test_app().await;

    let author_token = helper::login_new_user(&mut app, "wanderer", "author").await;

    let note = helper::submit_note(&mut app, &author_token, "Alps").await;
    assert_eq!("pending", note.status);
    assert!(!note.is_deleted);

    // not in the public feed
    let (status_code, listing) = helper::list_public_notes(&mut app, "").await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(0, listing.total);

    // not publicly visible as a single note either
    let (status_code, _, error) = helper::single_public_note(&mut app, &note.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Note not found".to_string()), error);

    // but the author sees it in their own listing
    let (status_code, mine) = helper::list_my_notes(&mut app, &author_token).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(1, mine.total);
    assert_eq!(note.id, mine.data[0].id);

    // and can fetch it by ID while it is still pending
    let (status_code, own, _) = helper::single_note_as(&mut app, &author_token, &note.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("pending", own.unwrap().status);

    // another logged in user still gets nothing
    let other_token = helper::login_new_user(&mut app, "other", "author").await;
    let (status_code, _, _) = helper::single_note_as(&mut app, &other_token, &note.id).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
}

#[tokio::test]
async fn test_submit_validation() {
    let mut app = helper::setup_test_app().await;

    let author_token = helper::login_new_user(&mut app, "wanderer", "author").await;

    // empty title
    let (status_code, _, error) = helper::maybe_submit_note(
        &mut app,
        &author_token,
        "   ",
        "Some story",
        helper::single_image_media(),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("Title is required".to_string()), error);

    // media set without an image
    let (status_code, _, error) = helper::maybe_submit_note(
        &mut app,
        &author_token,
        "Alps",
        "Some story",
        json!([{ "type": "video", "url": "https://cdn.example.com/a.mp4" }]),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
    assert_eq!(Some("At least one image is required".to_string()), error);

    // title over the limit
    let (status_code, _, _) = helper::maybe_submit_note(
        &mut app,
        &author_token,
        &"x".repeat(51),
        "Some story",
        helper::single_image_media(),
    )
    .await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
}

#[tokio::test]
async fn test_submit_requires_authentication() {
    let mut app = helper::setup_test_app().await;

    let (status_code, _, _) = helper::maybe_submit_note(
        &mut app,
        "Bearer nope",
        "Alps",
        "Some story",
        helper::single_image_media(),
    )
    .await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
}

#[tokio::test]
async fn test_author_edits_pending_note() {
    let mut app = helper::setup_test_app().await;

    let author_token = helper::login_new_user(&mut app, "wanderer", "author").await;

    let note = helper::submit_note(&mut app, &author_token, "Alps").await;

    let (status_code, edited, _) = helper::maybe_edit_note(
        &mut app,
        &author_token,
        &note.id,
        json!({ "title": "Alps, revisited" }),
    )
    .await;
    assert_eq!(StatusCode::OK, status_code);

    let edited = edited.unwrap();
    assert_eq!("Alps, revisited", edited.title);
    assert_eq!("pending", edited.status);
    // untouched fields stay as they were
    assert_eq!(note.content, edited.content);
}

#[tokio::test]
async fn test_only_the_author_can_edit() {
    let mut app = helper::setup_test_app().await;

    let author_token = helper::login_new_user(&mut app, "wanderer", "author").await;
    let note = helper::submit_note(&mut app, &author_token, "Alps").await;

    let (status_code, _, _) = helper::maybe_register(&mut app, "stranger", "verysecret").await;
    assert_eq!(StatusCode::CREATED, status_code);
    let stranger_token = helper::login_as(&mut app, "stranger", "verysecret").await;

    let (status_code, _, _) = helper::maybe_edit_note(
        &mut app,
        &stranger_token,
        &note.id,
        json!({ "title": "Hijacked" }),
    )
    .await;
    assert_eq!(StatusCode::FORBIDDEN, status_code);
}

#[tokio::test]
async fn test_editing_a_reviewed_note_conflicts() {
    let mut app = helper::setup_test_app().await;

    let author_token = helper::login_new_user(&mut app, "wanderer", "author").await;
    let admin_token = helper::login(&mut app).await;

    let note = helper::submit_note(&mut app, &author_token, "Alps").await;

    let (status_code, _, _) = helper::maybe_approve_note(&mut app, &admin_token, &note.id).await;
    assert_eq!(StatusCode::OK, status_code);

    let (status_code, _, _) = helper::maybe_edit_note(
        &mut app,
        &author_token,
        &note.id,
        json!({ "title": "Too late" }),
    )
    .await;
    assert_eq!(StatusCode::CONFLICT, status_code);
}

#[tokio::test]
async fn test_public_feed_lists_only_approved() {
    let mut app = helper::setup_test_app().await;

    let author_token = helper::login_new_user(&mut app, "wanderer", "author").await;
    let admin_token = helper::login(&mut app).await;

    let alps = helper::submit_note(&mut app, &author_token, "Alps").await;
    let fjords = helper::submit_note(&mut app, &author_token, "Fjords").await;
    helper::submit_note(&mut app, &author_token, "Sahara").await;

    helper::maybe_approve_note(&mut app, &admin_token, &alps.id).await;
    helper::maybe_approve_note(&mut app, &admin_token, &fjords.id).await;

    let (status_code, listing) = helper::list_public_notes(&mut app, "").await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(2, listing.total);
    assert!(listing.data.contains(&alps.id));
    assert!(listing.data.contains(&fjords.id));

    // keyword filter narrows the feed, case-insensitive
    let (status_code, listing) = helper::list_public_notes(&mut app, "?keyword=fjo").await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(1, listing.total);
    assert_eq!(fjords.id, listing.data[0]);

    // an approved note is publicly fetchable
    let (status_code, note, _) = helper::single_public_note(&mut app, &alps.id).await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!("approved", note.unwrap().status);
}

#[tokio::test]
async fn test_public_feed_pagination() {
    let mut app = helper::setup_test_app().await;

    let author_token = helper::login_new_user(&mut app, "wanderer", "author").await;
    let admin_token = helper::login(&mut app).await;

    for index in 0..3 {
        let note = helper::submit_note(&mut app, &author_token, &format!("Trip {index}")).await;
        helper::maybe_approve_note(&mut app, &admin_token, &note.id).await;
    }

    let (status_code, listing) = helper::list_public_notes(&mut app, "?page=1&pageSize=2").await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(3, listing.total);
    assert_eq!(2, listing.data.len());

    let (status_code, listing) = helper::list_public_notes(&mut app, "?page=2&pageSize=2").await;
    assert_eq!(StatusCode::OK, status_code);
    assert_eq!(3, listing.total);
    assert_eq!(1, listing.data.len());
}

#[tokio::test]
async fn test_unknown_note_is_not_found() {
    let mut app = helper::setup_test_app().await;

    let (status_code, _, error) = helper::single_public_note(&mut app, &Uuid::new_v4()).await;
    assert_eq!(StatusCode::NOT_FOUND, status_code);
    assert_eq!(Some("Note not found".to_string()), error);
}
