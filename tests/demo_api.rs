//! End-to-end flow through the demo router: issue a token, use it, revoke it.

use std::net::SocketAddr;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use axum_tokenize::{
    RawOptions,
    app::{build_router, build_state},
    config::{AppEnv, Config, HttpSettings},
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn config(tokenize: RawOptions, cookie_secret: Option<&str>) -> Config {
    Config {
        addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        app_env: AppEnv::Development,
        http: HttpSettings::default(),
        tokenize,
        cookie_secret: cookie_secret.map(str::to_string),
        demo_accounts: vec!["meow".to_string(), "rawr".to_string()],
    }
}

fn router(tokenize: RawOptions, cookie_secret: Option<&str>) -> Router {
    let config = config(tokenize, cookie_secret);
    build_router(build_state(&config).unwrap(), &config.http)
}

async fn json_body(resp: Response<Body>) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn login(account_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/sessions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "account_id": account_id }).to_string()))
        .unwrap()
}

fn me(cookie: Option<&str>, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/v1/me");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }
    builder.body(Body::empty()).unwrap()
}

fn set_cookie_pair(resp: &Response<Body>) -> String {
    resp.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn login_then_me_then_reset() {
    let app = router(RawOptions::new("meow").with_auth(true), None);

    let resp = app.clone().oneshot(login("meow")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let token = json_body(resp).await["token"].as_str().unwrap().to_string();

    let resp = app.clone().oneshot(me(None, Some(&token))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["id"], "meow");

    // Token reset timestamps have one-second resolution
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let reset = Request::builder()
        .method("POST")
        .uri("/api/v1/me/reset")
        .header(header::AUTHORIZATION, &token)
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(reset).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.clone().oneshot(me(None, Some(&token))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"]["code"], "INVALID_TOKEN");

    let resp = app.clone().oneshot(login("meow")).await.unwrap();
    let fresh = json_body(resp).await["token"].as_str().unwrap().to_string();
    let resp = app.oneshot(me(None, Some(&fresh))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_account_cannot_log_in() {
    let app = router(RawOptions::new("meow").with_auth(true), None);
    let resp = app.clone().oneshot(login("nobody")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.oneshot(login("  ")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn issued_cookie_authenticates() {
    let app = router(RawOptions::new("meow").with_auth(true), None);

    let resp = app.clone().oneshot(login("rawr")).await.unwrap();
    let cookie = set_cookie_pair(&resp);
    assert!(cookie.starts_with("token="));

    let resp = app.oneshot(me(Some(&cookie), None)).await.unwrap();
    assert_eq!(json_body(resp).await["id"], "rawr");
}

#[tokio::test]
async fn signed_cookie_round_trip() {
    let raw = RawOptions::new("meow")
        .with_auth(true)
        .with_cookie_signed(json!(true));
    let app = router(raw, Some("cookie-secret"));

    let resp = app.clone().oneshot(login("meow")).await.unwrap();
    let cookie = set_cookie_pair(&resp);
    let token = json_body(resp).await["token"].as_str().unwrap().to_string();

    let resp = app.clone().oneshot(me(Some(&cookie), None)).await.unwrap();
    assert_eq!(json_body(resp).await["id"], "meow");

    // The bare token is not a validly signed cookie
    let resp = app
        .oneshot(me(Some(&format!("token={token}")), Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"]["code"], "NO_TOKEN");
}

#[tokio::test]
async fn signed_cookies_without_secret_fail_startup() {
    let raw = RawOptions::new("meow")
        .with_auth(true)
        .with_cookie_signed(json!(true));
    assert!(build_state(&config(raw, None)).is_err());
}

#[tokio::test]
async fn auth_disabled_does_not_mount_me() {
    let app = router(RawOptions::new("meow"), None);
    let resp = app.clone().oneshot(me(None, Some("anything"))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.oneshot(login("meow")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn signed_flag_with_cookie_disabled_needs_no_secret() {
    let raw = RawOptions::new("meow")
        .with_auth(true)
        .with_cookie(json!(false))
        .with_cookie_signed(json!(true));
    let app = router(raw, None);

    let resp = app.clone().oneshot(login("meow")).await.unwrap();
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    let token = json_body(resp).await["token"].as_str().unwrap().to_string();

    let resp = app.oneshot(me(None, Some(&token))).await.unwrap();
    assert_eq!(json_body(resp).await["id"], "meow");
}
