//! Review endpoints through the HTTP API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use localbite_integration_tests::TestApp;

#[tokio::test]
async fn test_create_review() {
    let app = TestApp::new();

    let created = app
        .post(
            "/reviews",
            json!({ "cookName": "Amina", "rating": "4.5", "comment": "Lovely tajine" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["user"], "Guest");
    assert_eq!(created.body["rating"], 4.5);
    assert!(created.body["id"].is_string());
}

#[tokio::test]
async fn test_missing_fields_persist_nothing() {
    let app = TestApp::new();

    for body in [
        json!({ "cookName": "Amina", "rating": 4 }),
        json!({ "cookName": "Amina", "comment": "Nice" }),
        json!({ "rating": 4, "comment": "Nice" }),
    ] {
        let response = app.post("/reviews", body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body["message"], "Missing fields");
    }

    let bad_rating = app
        .post(
            "/reviews",
            json!({ "cookName": "Amina", "rating": "five", "comment": "Nice" }),
        )
        .await;
    assert_eq!(bad_rating.status, StatusCode::BAD_REQUEST);

    assert!(app.get("/reviews/Amina").await.body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_lookup_is_case_insensitive_and_literal() {
    let app = TestApp::new();
    for cook in ["Amina", "amina", "A.*", "Aminata"] {
        app.post(
            "/reviews",
            json!({ "cookName": cook, "user": "Karim", "rating": 5, "comment": "Good" }),
        )
        .await;
    }

    let found = app.get("/reviews/AMINA").await;
    let names: Vec<&str> = found
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["cookName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["amina", "Amina"]);

    let pattern = app.get("/reviews/A.*").await;
    assert_eq!(pattern.body.as_array().unwrap().len(), 1);
    assert_eq!(pattern.body[0]["cookName"], "A.*");
}

#[tokio::test]
async fn test_update_and_delete() {
    let app = TestApp::new();
    let created = app
        .post(
            "/reviews",
            json!({ "cookName": "Amina", "rating": 3, "comment": "Fine" }),
        )
        .await;
    let id = created.body["id"].as_str().unwrap().to_owned();

    let updated = app
        .put(&format!("/reviews/{id}"), json!({ "rating": 5 }))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["rating"], 5.0);
    assert_eq!(updated.body["comment"], "Fine");

    let deleted = app.delete(&format!("/reviews/{id}")).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Deleted successfully");

    assert_eq!(
        app.delete(&format!("/reviews/{id}")).await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.put(&format!("/reviews/{id}"), json!({ "comment": "x" }))
            .await
            .status,
        StatusCode::NOT_FOUND
    );
}
