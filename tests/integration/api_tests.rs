//! In-process HTTP tests against the memory backend

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{book, json_body, make_router, send};

#[tokio::test]
async fn test_health_check() {
    let app = make_router(vec![]);

    let response = send(&app, "GET", "/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");

    let response = send(&app, "GET", "/api/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["storage"], "memory");
}

#[tokio::test]
async fn test_list_books() {
    let app = make_router(vec![book("2", 2), book("1", 5)]);

    let response = send(&app, "GET", "/api/books", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let books = body.as_array().expect("array body");
    assert_eq!(books.len(), 2);
    assert_eq!(books[0]["id"], "1");
    assert_eq!(books[0]["quantity"], 5);
}

#[tokio::test]
async fn test_list_books_empty() {
    let app = make_router(vec![]);

    let response = send(&app, "GET", "/api/books", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_create_and_get_book() {
    let app = make_router(vec![]);

    let response = send(
        &app,
        "POST",
        "/api/books",
        Some(json!({ "id": "4", "title": "New Book", "author": "New Author", "quantity": 10 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    assert_eq!(created["id"], "4");

    let response = send(&app, "GET", "/api/books/4", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = json_body(response).await;
    assert_eq!(fetched["title"], "New Book");
    assert_eq!(fetched["author"], "New Author");
    assert_eq!(fetched["quantity"], 10);
}

#[tokio::test]
async fn test_create_book_generates_id() {
    let app = make_router(vec![]);

    let response = send(
        &app,
        "POST",
        "/api/books",
        Some(json!({ "title": "T", "author": "A", "quantity": 1 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = json_body(response).await;
    let id = created["id"].as_str().expect("string id");
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let response = send(&app, "GET", &format!("/api/books/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_book_malformed_body() {
    let app = make_router(vec![]);

    let response = send(&app, "POST", "/api/books", Some(json!({ "title": 42 }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_create_book_negative_quantity() {
    let app = make_router(vec![]);

    let response = send(
        &app,
        "POST",
        "/api/books",
        Some(json!({ "title": "T", "author": "A", "quantity": -1 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "GET", "/api/books", None).await;
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn test_create_book_duplicate_id() {
    let app = make_router(vec![book("1", 1)]);

    let response = send(
        &app,
        "POST",
        "/api/books",
        Some(json!({ "id": "1", "title": "T", "author": "A", "quantity": 9 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, "GET", "/api/books/1", None).await;
    assert_eq!(json_body(response).await["quantity"], 1);
}

#[tokio::test]
async fn test_get_book_not_found() {
    let app = make_router(vec![]);

    let response = send(&app, "GET", "/api/books/non-existent", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert_eq!(body["error"], "NoSuchBook");
}

#[tokio::test]
async fn test_update_book() {
    let app = make_router(vec![book("1", 3)]);

    let response = send(
        &app,
        "PUT",
        "/api/books/1",
        Some(json!({ "title": "Renamed", "quantity": 7 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/api/books/1", None).await;
    let body = json_body(response).await;
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["author"], "Author 1");
    assert_eq!(body["quantity"], 7);
}

#[tokio::test]
async fn test_update_book_not_found() {
    let app = make_router(vec![]);

    let response = send(&app, "PUT", "/api/books/9", Some(json!({ "title": "X" }))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_sequence() {
    let app = make_router(vec![]);

    let response = send(
        &app,
        "POST",
        "/api/books",
        Some(json!({ "id": "1", "title": "T", "author": "A", "quantity": 2 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app, "PATCH", "/api/checkout?id=1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["quantity"], 1);

    let response = send(&app, "PATCH", "/api/checkout?id=1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["quantity"], 0);

    let response = send(&app, "PATCH", "/api/checkout?id=1", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "BookNotAvailable");

    let response = send(&app, "GET", "/api/books/1", None).await;
    assert_eq!(json_body(response).await["quantity"], 0);
}

#[tokio::test]
async fn test_checkout_then_return_restores_quantity() {
    let app = make_router(vec![book("1", 10)]);

    let response = send(&app, "PATCH", "/api/checkout?id=1", None).await;
    assert_eq!(json_body(response).await["quantity"], 9);

    let response = send(&app, "PATCH", "/api/return?id=1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["quantity"], 10);
}

#[tokio::test]
async fn test_return_has_no_upper_bound() {
    let app = make_router(vec![book("1", 1)]);

    let response = send(&app, "PATCH", "/api/return?id=1", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["quantity"], 2);
}

#[tokio::test]
async fn test_missing_id_parameter() {
    let app = make_router(vec![book("1", 1)]);

    for uri in [
        "/api/checkout",
        "/api/return",
        "/api/checkout?id=",
        "/api/checkout?id=%20",
        "/api/return?id=%20%20",
        "/api/return?other=1",
    ] {
        let response = send(&app, "PATCH", uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(json_body(response).await["error"], "BadValue", "{}", uri);
    }

    let response = send(&app, "GET", "/api/books/1", None).await;
    assert_eq!(json_body(response).await["quantity"], 1);
}

#[tokio::test]
async fn test_malformed_query_string_is_json_error() {
    let app = make_router(vec![book("1", 1)]);

    for uri in ["/api/checkout?id=1&id=2", "/api/return?id=1&id=2"] {
        let response = send(&app, "PATCH", uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        let body = json_body(response).await;
        assert_eq!(body["error"], "BadValue", "{}", uri);
        assert_eq!(body["code"], 18);
    }

    let response = send(&app, "GET", "/api/books/1", None).await;
    assert_eq!(json_body(response).await["quantity"], 1);
}

#[tokio::test]
async fn test_checkout_and_return_unknown_book() {
    let app = make_router(vec![]);

    let response = send(&app, "PATCH", "/api/checkout?id=missing", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "PATCH", "/api/return?id=missing", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_checkouts_of_last_copy() {
    let app = make_router(vec![book("1", 1)]);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { send(&app, "PATCH", "/api/checkout?id=1", None).await.status() })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        match handle.await.expect("task completes") {
            StatusCode::OK => ok += 1,
            status => assert_eq!(status, StatusCode::BAD_REQUEST),
        }
    }
    assert_eq!(ok, 1);

    let response = send(&app, "GET", "/api/books/1", None).await;
    assert_eq!(json_body(response).await["quantity"], 0);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = make_router(vec![]);

    let response = send(&app, "GET", "/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["paths"]["/checkout"]["patch"].is_object());
}
