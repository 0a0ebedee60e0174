use axum::http::StatusCode;

use crate::tests::helper;

// the in-process harness cannot carry a real protocol upgrade, so these
// tests only exercise the handshake guard in front of it

#[tokio::test]
async fn test_live_handshake_rejects_invalid_token() {
    let mut app = helper::setup_test_app().await;

    let status_code = helper::live_handshake(&mut app, "not-a-jwt").await;

    assert_eq!(StatusCode::FORBIDDEN, status_code);
}

#[tokio::test]
async fn test_live_handshake_accepts_valid_token() {
    let mut app = helper::setup_test_app().await;

    let access_token = helper::login(&mut app).await;
    let token = access_token.trim_start_matches("Bearer ");

    // authentication passes, the handshake itself cannot complete here
    let status_code = helper::live_handshake(&mut app, token).await;

    assert_eq!(StatusCode::BAD_REQUEST, status_code);
}

#[tokio::test]
async fn test_live_handshake_rejects_empty_token() {
    let mut app = helper::setup_test_app().await;

    let status_code = helper::live_handshake(&mut app, "").await;

    assert_eq!(StatusCode::FORBIDDEN, status_code);
}
