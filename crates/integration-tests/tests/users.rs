//! User endpoints through the HTTP API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use localbite_integration_tests::TestApp;

#[tokio::test]
async fn test_sign_in_is_an_upsert() {
    let app = TestApp::new();
    let first = app.sign_in("u1", "Amina", Some("cook")).await;
    assert_eq!(first["role"], "cook");
    assert_eq!(first["isVerified"], false);

    app.put("/users/u1", json!({ "locationLabel": "Sfax" })).await;

    let again = app
        .post(
            "/users",
            json!({ "uid": "u1", "fullName": "Amina B", "email": "amina@new.example", "role": "foodie" }),
        )
        .await;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["success"], true);
    assert_eq!(again.body["user"]["fullName"], "Amina B");
    assert_eq!(again.body["user"]["email"], "amina@new.example");
    assert_eq!(again.body["user"]["role"], "cook");
    assert_eq!(again.body["user"]["locationLabel"], "Sfax");
}

#[tokio::test]
async fn test_sign_in_validation() {
    let app = TestApp::new();

    let missing = app.post("/users", json!({ "uid": "u1", "fullName": "Amina" })).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["message"], "Missing fields");

    let bad_email = app
        .post("/users", json!({ "uid": "u1", "fullName": "Amina", "email": "amina" }))
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    assert!(app.get("/users").await.body["users"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_user_and_role_lookup() {
    let app = TestApp::new();
    app.sign_in("u1", "Amina", Some("admin")).await;

    let user = app.get("/users/u1").await;
    assert_eq!(user.status, StatusCode::OK);
    assert_eq!(user.body["users"]["uid"], "u1");

    let role = app.get("/users/role/u1@example.com").await;
    assert_eq!(role.body["success"], true);
    assert_eq!(role.body["role"], "admin");

    assert_eq!(app.get("/users/ghost").await.status, StatusCode::NOT_FOUND);
    assert_eq!(
        app.get("/users/role/ghost@example.com").await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new();
    app.sign_in("u1", "Amina", None).await;

    let updated = app
        .put(
            "/users/u1",
            json!({ "fullName": "", "locationLabel": "Tunis", "avatar": "https://img.example/a.png" }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["success"], true);
    assert_eq!(updated.body["users"]["fullName"], "Amina");
    assert_eq!(updated.body["users"]["locationLabel"], "Tunis");
    assert_eq!(updated.body["users"]["avatar"], "https://img.example/a.png");

    let missing = app.put("/users/ghost", json!({ "fullName": "X" })).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_directory_newest_first_and_filters() {
    let app = TestApp::new();
    app.sign_in("u1", "Amina", Some("cook")).await;
    app.sign_in("u2", "Karim", None).await;
    app.sign_in("u3", "Leila", Some("cook")).await;

    let all = app.get("/users").await;
    let uids: Vec<&str> = all.body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["uid"].as_str().unwrap())
        .collect();
    assert_eq!(uids, vec!["u3", "u2", "u1"]);

    let cooks = app.get("/users?role=cook").await;
    assert_eq!(cooks.body["users"].as_array().unwrap().len(), 2);

    let search = app.get("/users?search=kar").await;
    assert_eq!(search.body["users"][0]["uid"], "u2");

    let unverified = app.get("/users?verified=false").await;
    assert_eq!(unverified.body["users"].as_array().unwrap().len(), 3);

    let bad = app.get("/users?verified=maybe").await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_and_bulk_delete() {
    let app = TestApp::new();
    for uid in ["u1", "u2", "u3"] {
        app.sign_in(uid, uid, None).await;
    }

    let deleted = app.delete("/users/u1").await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "User deleted");
    assert_eq!(app.delete("/users/u1").await.status, StatusCode::NOT_FOUND);

    let bulk = app
        .post("/users/bulk-delete", json!({ "uids": ["u2", "u1", "u3"] }))
        .await;
    assert_eq!(bulk.status, StatusCode::OK);
    assert_eq!(bulk.body["success"], false);
    assert_eq!(bulk.body["deleted"], json!(["u2", "u3"]));
    assert_eq!(bulk.body["notFound"], json!(["u1"]));

    assert!(app.get("/users").await.body["users"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_leaves_reviews_and_requests() {
    let app = TestApp::new();
    app.sign_in("u1", "Amina", Some("cook")).await;
    app.post("/api/verify", json!({ "uid": "u1" })).await;
    app.post(
        "/reviews",
        json!({ "cookName": "Amina", "rating": 5, "comment": "Great" }),
    )
    .await;

    app.delete("/users/u1").await;

    assert_eq!(app.get("/api/verify/user/u1").await.status, StatusCode::OK);
    assert_eq!(app.get("/reviews/Amina").await.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.contains_key("x-request-id"));

    let app = app.as_caller("u1");
    let response = app
        .send(axum::http::Method::GET, "/users/ghost", None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.headers.contains_key("x-request-id"));
}
