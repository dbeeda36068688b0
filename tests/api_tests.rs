mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;

use common::{read_json, spawn_app};

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let app = spawn_app().await;

    for uri in ["/api/entries", "/api/favorites", "/api/profile", "/api/auth/me"] {
        let response = app
            .send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await;
        let (status, body) = read_json(response).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["success"], false);
    }

    let (status, _) = app.get("/api/entries", "wrong-key").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send_json(
            "POST",
            "/api/favorites/anime/1/toggle",
            None,
            json!({ "title": "Cowboy Bebop" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bearer_api_key_is_accepted() {
    let app = spawn_app().await;
    let api_key = app.create_user("bearer@example.com").await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/auth/me")
                .header("Authorization", format!("Bearer {api_key}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let (status, body) = read_json(response).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "bearer@example.com");
    assert_eq!(body["data"]["email_verified"], true);
}

#[tokio::test]
async fn test_entry_lifecycle() {
    let app = spawn_app().await;
    let key = app.create_user("lifecycle@example.com").await;

    let (status, body) = app
        .send_json(
            "PUT",
            "/api/entries/anime/1",
            Some(&key),
            json!({ "title": "Cowboy Bebop", "total_units": 26 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "PLAN_TO_WATCH");
    assert_eq!(body["data"]["progress"], 0);
    assert_eq!(body["data"]["kind"], "ANIME");
    assert!(body["data"]["start_date"].is_null());

    // First progress on a planned entry starts it.
    let (status, body) = app
        .send_json(
            "POST",
            "/api/entries/anime/1/progress",
            Some(&key),
            json!({ "delta": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "WATCHING");
    assert_eq!(body["data"]["progress"], 1);
    assert!(body["data"]["start_date"].is_string());

    // Reaching the total completes it.
    let (status, body) = app
        .send_json(
            "PUT",
            "/api/entries/anime/1",
            Some(&key),
            json!({ "progress": 26 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "COMPLETED");
    assert!(body["data"]["end_date"].is_string());
    assert_eq!(body["data"]["title"], "Cowboy Bebop");

    let (status, body) = app.get("/api/entries/anime/1", &key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["entry"]["progress"], 26);
    assert_eq!(body["data"]["is_favorite"], false);

    let (status, _) = app.delete("/api/entries/anime/1", &key).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/entries/anime/1", &key).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["entry"].is_null());
}

#[tokio::test]
async fn test_progress_past_total_is_rejected_but_steps_clamp() {
    let app = spawn_app().await;
    let key = app.create_user("clamp@example.com").await;

    app.send_json(
        "PUT",
        "/api/entries/manga/2",
        Some(&key),
        json!({ "title": "Berserk", "progress": 8, "total_units": 10, "status": "READING" }),
    )
    .await;

    let (status, body) = app
        .send_json(
            "PUT",
            "/api/entries/manga/2",
            Some(&key),
            json!({ "progress": 11 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = app
        .send_json(
            "POST",
            "/api/entries/manga/2/progress",
            Some(&key),
            json!({ "delta": 5 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["progress"], 10);
    assert_eq!(body["data"]["status"], "COMPLETED");

    let (_, body) = app
        .send_json(
            "POST",
            "/api/entries/manga/2/progress",
            Some(&key),
            json!({ "delta": -50 }),
        )
        .await;
    assert_eq!(body["data"]["progress"], 0);
}

#[tokio::test]
async fn test_status_from_other_kind_is_rejected() {
    let app = spawn_app().await;
    let key = app.create_user("vocab@example.com").await;

    let (status, _) = app
        .send_json(
            "PUT",
            "/api/entries/anime/1",
            Some(&key),
            json!({ "title": "Cowboy Bebop", "status": "READING" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            "PUT",
            "/api/entries/manga/2",
            Some(&key),
            json!({ "title": "Berserk", "status": "PLAN_TO_WATCH" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            "PUT",
            "/api/entries/anime/1",
            Some(&key),
            json!({ "title": "Cowboy Bebop", "total_volumes": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_entry_is_not_found() {
    let app = spawn_app().await;
    let key = app.create_user("missing@example.com").await;

    let (status, body) = app.delete("/api/entries/anime/999", &key).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .send_json(
            "POST",
            "/api/entries/anime/999/progress",
            Some(&key),
            json!({ "delta": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_path_values_are_rejected() {
    let app = spawn_app().await;
    let key = app.create_user("paths@example.com").await;

    let (status, _) = app.get("/api/entries/novel/1", &key).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/entries/anime/0", &key).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_requests_get_the_error_envelope() {
    let app = spawn_app().await;
    let key = app.create_user("malformed@example.com").await;

    // Wrong field type: axum alone would answer 422 in plain text.
    let (status, body) = app
        .send_json(
            "PUT",
            "/api/entries/anime/1",
            Some(&key),
            json!({ "progress": "abc" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());

    let (status, body) = app.get("/api/entries/anime/abc", &key).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    for (content_type, payload) in [
        (Some("application/json"), "{not json"),
        (None, r#"{"delta": 1}"#),
    ] {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/entries/anime/1/progress")
            .header("X-Api-Key", &key);
        if let Some(content_type) = content_type {
            request = request.header("Content-Type", content_type);
        }
        let response = app
            .send(request.body(Body::from(payload)).unwrap())
            .await;
        let (status, body) = read_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{payload}");
        assert_eq!(body["success"], false, "{payload}");
    }

    // A broken body on the optional toggle payload is an error, not "no body".
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/favorites/anime/1/toggle")
                .header("X-Api-Key", &key)
                .header("Content-Type", "application/json")
                .body(Body::from("{\"title\": 5"))
                .unwrap(),
        )
        .await;
    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, body) = app.get("/api/entries/anime/1", &key).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_favorite"], false);
    assert!(body["data"]["entry"].is_null());
}

#[tokio::test]
async fn test_entries_are_scoped_to_user_and_filtered() {
    let app = spawn_app().await;
    let alice = app.create_user("alice@example.com").await;
    let bob = app.create_user("bob@example.com").await;

    app.send_json(
        "PUT",
        "/api/entries/anime/1",
        Some(&alice),
        json!({ "title": "Cowboy Bebop", "status": "WATCHING" }),
    )
    .await;
    app.send_json(
        "PUT",
        "/api/entries/manga/2",
        Some(&alice),
        json!({ "title": "Berserk", "status": "READING" }),
    )
    .await;
    app.send_json(
        "PUT",
        "/api/entries/anime/6",
        Some(&alice),
        json!({ "title": "Trigun", "status": "DROPPED" }),
    )
    .await;

    let (_, body) = app.get("/api/entries", &alice).await;
    let titles: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Trigun", "Berserk", "Cowboy Bebop"]);

    let (_, body) = app.get("/api/entries?kind=anime", &alice).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // In-progress matches both vocabularies when no kind is given.
    let (_, body) = app.get("/api/entries?status=WATCHING", &alice).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, _) = app.get("/api/entries?kind=manga&status=WATCHING", &alice).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/entries", &bob).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_favorite_toggle_flips_each_time() {
    let app = spawn_app().await;
    let key = app.create_user("fav@example.com").await;
    let snapshot = json!({ "title": "Cowboy Bebop", "image_url": "https://cdn.test/1.webp" });

    let mut actions = Vec::new();
    for _ in 0..3 {
        let (status, body) = app
            .send_json(
                "POST",
                "/api/favorites/anime/1/toggle",
                Some(&key),
                snapshot.clone(),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        actions.push(body["data"]["action"].as_str().unwrap().to_string());
    }
    assert_eq!(actions, vec!["added", "removed", "added"]);

    let (_, body) = app.get("/api/favorites", &key).await;
    let favorites = body["data"].as_array().unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0]["title"], "Cowboy Bebop");
    assert_eq!(favorites[0]["kind"], "ANIME");

    let (_, body) = app.get("/api/favorites?kind=manga", &key).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app.get("/api/entries/anime/1", &key).await;
    assert_eq!(body["data"]["is_favorite"], true);
    assert!(body["data"]["entry"].is_null());
}

#[tokio::test]
async fn test_profile_rename() {
    let app = spawn_app().await;
    let key = app.create_user("profile@example.com").await;

    let (status, body) = app
        .send_json("PUT", "/api/profile", Some(&key), json!({ "name": "  Misato  " }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Misato");

    let (status, _) = app
        .send_json("PUT", "/api/profile", Some(&key), json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.get("/api/profile", &key).await;
    assert_eq!(body["data"]["name"], "Misato");
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = spawn_app().await;

    let response = app
        .send(
            Request::builder()
                .uri("/api/system/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "alive");

    let response = app
        .send(
            Request::builder()
                .uri("/api/system/health/ready")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    let (status, body) = read_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["checks"]["database"], true);
}
