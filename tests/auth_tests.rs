mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tsundoku::config::SecurityConfig;
use tsundoku::services::{AuthService, SeaOrmAuthService};

use common::{TestApp, read_json, spawn_app};

const PASSWORD: &str = "correct horse battery";

async fn signup(app: &TestApp, email: &str) -> (StatusCode, Value) {
    app.send_json(
        "POST",
        "/api/auth/signup",
        None,
        json!({ "name": "Asuka", "email": email, "password": PASSWORD }),
    )
    .await
}

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, Value, Option<String>) {
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": email, "password": password }).to_string(),
                ))
                .unwrap(),
        )
        .await;

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);

    let (status, body) = read_json(response).await;
    (status, body, cookie)
}

async fn send_with_cookie(app: &TestApp, method: &str, uri: &str, cookie: &str) -> StatusCode {
    let response = app
        .send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    response.status()
}

#[tokio::test]
async fn test_signup_verify_login_with_session() {
    let app = spawn_app().await;

    let (status, body) = signup(&app, "  Asuka@Example.com ").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["email"], "asuka@example.com");
    assert_eq!(body["data"]["email_verified"], false);

    // Correct password, unverified account.
    let (status, body, _) = login(&app, "asuka@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let token = app.mailer.last_verification().expect("no verification mail");
    let (status, _) = app
        .send_json("POST", "/api/auth/verify-email", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Tokens are single use.
    let (status, _) = app
        .send_json("POST", "/api/auth/verify-email", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body, cookie) = login(&app, "ASUKA@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["api_key"].is_string());
    let cookie = cookie.expect("login did not set a session cookie");

    assert_eq!(
        send_with_cookie(&app, "GET", "/api/auth/me", &cookie).await,
        StatusCode::OK
    );

    assert_eq!(
        send_with_cookie(&app, "POST", "/api/auth/logout", &cookie).await,
        StatusCode::OK
    );
    assert_eq!(
        send_with_cookie(&app, "GET", "/api/auth/me", &cookie).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_signup_rejects_duplicates_and_bad_input() {
    let app = spawn_app().await;

    let (status, _) = signup(&app, "rei@example.com").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = signup(&app, "REI@example.com").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = signup(&app, "not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            "POST",
            "/api/auth/signup",
            None,
            json!({ "name": "Rei", "email": "short@example.com", "password": "abc" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = spawn_app().await;
    app.create_user("kaji@example.com").await;

    let (status, _, cookie) = login(&app, "kaji@example.com", "wrong password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());

    let (status, _, _) = login(&app, "nobody@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = spawn_app().await;
    app.create_user("misato@example.com").await;

    let (status, _) = app
        .send_json(
            "POST",
            "/api/auth/forgot-password",
            None,
            json!({ "email": "ghost@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for _ in 0..2 {
        let (status, _) = app
            .send_json(
                "POST",
                "/api/auth/forgot-password",
                None,
                json!({ "email": "misato@example.com" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    // A second request replaces the first token.
    let tokens: Vec<String> = app
        .mailer
        .resets
        .lock()
        .unwrap()
        .iter()
        .map(|(_, token)| token.clone())
        .collect();
    assert_eq!(tokens.len(), 2);

    let (status, _) = app
        .send_json(
            "POST",
            "/api/auth/reset-password",
            None,
            json!({ "token": tokens[0], "password": "a brand new password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            "POST",
            "/api/auth/reset-password",
            None,
            json!({ "token": tokens[1], "password": "a brand new password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send_json(
            "POST",
            "/api/auth/reset-password",
            None,
            json!({ "token": tokens[1], "password": "yet another password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = login(&app, "misato@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = login(&app, "misato@example.com", "a brand new password").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_regenerated_api_key_replaces_old_one() {
    let app = spawn_app().await;
    let old_key = app.create_user("gendo@example.com").await;

    let (status, body) = app.get("/api/auth/api-key", &old_key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["api_key"], old_key.as_str());

    let (status, body) = app
        .send_json("POST", "/api/auth/api-key/regenerate", Some(&old_key), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let new_key = body["data"]["api_key"].as_str().unwrap().to_string();
    assert_ne!(new_key, old_key);

    let (status, _) = app.get("/api/auth/me", &old_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/auth/me", &new_key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "gendo@example.com");
}

#[tokio::test]
async fn test_expired_tokens_are_rejected_and_deleted() {
    let app = spawn_app().await;
    let (status, _) = signup(&app, "shinji@example.com").await;
    assert_eq!(status, StatusCode::OK);

    let issued = Utc::now() - Duration::hours(30);
    let expired_at = Utc::now() - Duration::hours(1);
    app.state
        .store
        .insert_verification_token("shinji@example.com", "stale-verify", expired_at)
        .await
        .unwrap();

    let (status, body) = app
        .send_json(
            "POST",
            "/api/auth/verify-email",
            None,
            json!({ "token": "stale-verify" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Still unverified, and the row is gone: even a clock from before
    // expiry no longer finds it.
    let (status, _, _) = login(&app, "shinji@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let leftover = app
        .state
        .store
        .take_verification_token("stale-verify", issued)
        .await
        .unwrap();
    assert!(leftover.is_none());

    app.create_user("toji@example.com").await;
    app.state
        .store
        .replace_password_reset_token("toji@example.com", "stale-reset", expired_at)
        .await
        .unwrap();

    let (status, _) = app
        .send_json(
            "POST",
            "/api/auth/reset-password",
            None,
            json!({ "token": "stale-reset", "password": "a brand new password" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let leftover = app
        .state
        .store
        .take_password_reset_token("stale-reset", issued)
        .await
        .unwrap();
    assert!(leftover.is_none());

    let (status, _, _) = login(&app, "toji@example.com", PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_failed_verification_mail_frees_the_address() {
    let app = spawn_app().await;

    app.mailer.set_offline(true);
    let (status, body) = signup(&app, "kaworu@example.com").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);

    let user = app
        .state
        .store
        .get_user_by_email("kaworu@example.com")
        .await
        .unwrap();
    assert!(user.is_none());

    app.mailer.set_offline(false);
    let (status, body) = signup(&app, "kaworu@example.com").await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let token = app.mailer.last_verification().expect("no verification mail");
    let (status, _) = app
        .send_json("POST", "/api/auth/verify-email", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_token_survives_a_failed_hash() {
    let app = spawn_app().await;
    app.create_user("ritsuko@example.com").await;

    let (status, _) = app
        .send_json(
            "POST",
            "/api/auth/forgot-password",
            None,
            json!({ "email": "ritsuko@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = app.mailer.last_reset().expect("no reset mail");

    // Argon2 refuses a zero memory cost, so hashing fails.
    let broken = SeaOrmAuthService::new(
        app.state.store.clone(),
        app.mailer.clone(),
        SecurityConfig {
            argon2_memory_cost_kib: 0,
            ..SecurityConfig::default()
        },
    );
    assert!(
        broken
            .reset_password(&token, "a brand new password")
            .await
            .is_err()
    );

    // Too short: rejected before the token is looked at.
    let (status, _) = app
        .send_json(
            "POST",
            "/api/auth/reset-password",
            None,
            json!({ "token": token, "password": "short" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send_json(
            "POST",
            "/api/auth/reset-password",
            None,
            json!({ "token": token, "password": "a brand new password" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _, _) = login(&app, "ritsuko@example.com", "a brand new password").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_app_removes_its_database_on_drop() {
    let app = spawn_app().await;
    app.create_user("pen-pen@example.com").await;

    let path = app.db_path().expect("file-backed test database").to_path_buf();
    assert!(path.exists());

    drop(app);
    assert!(!path.exists());
}
