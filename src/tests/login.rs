use axum::Router;
use axum::body::Body;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use serde_json::json;
use tower::Service;

use crate::tests::helper;

#[tokio::test]
async fn test_login() {
    let mut app = helper::setup_test_app().await;

    let access_token = helper::login(&mut app).await;
    assert!(access_token.starts_with("Bearer "));

    let (status_code, user) = helper::current_user(&mut app, &access_token).await;
    assert_eq!(StatusCode::OK, status_code);

    let user = user.unwrap();
    assert_eq!("admin", user.username);
    assert_eq!("admin", user.role);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let mut app = helper::setup_test_app().await;

    let status_code = login_attempt(&mut app, "admin", "wrong").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);

    let status_code = login_attempt(&mut app, "nobody", "verysecret").await;
    assert_eq!(StatusCode::BAD_REQUEST, status_code);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let mut app = helper::setup_test_app().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/users/me")
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();

    assert_eq!(StatusCode::FORBIDDEN, response.status());
}

#[tokio::test]
async fn test_protected_route_with_garbage_token() {
    let mut app = helper::setup_test_app().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/users/me")
        .header("authorization", "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();

    assert_eq!(StatusCode::FORBIDDEN, response.status());
}

async fn login_attempt(app: &mut Router, username: &str, password: &str) -> StatusCode {
    let payload = json!({
        "username": username,
        "password": password,
    });

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/users/token")
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();

    let response = app.call(request).await.unwrap();

    response.status()
}
