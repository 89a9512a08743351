// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API authentication and CORS tests.
//!
//! These tests verify that:
//! 1. Protected routes reject requests without a valid session cookie
//! 2. Protected routes accept requests with one
//! 3. CORS preflight requests only succeed for configured origins

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

mod common;

use common::{body_json, request, send, FRONTEND};

#[tokio::test]
async fn test_protected_route_rejects_missing_cookie() {
    let (app, _, backend) = common::create_test_app();

    let response = send(
        &app,
        request("PUT", "/api/users/me", Some(json!({ "bio": "hi" })), None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not authenticated");

    // The handler never ran.
    assert_eq!(backend.profile_update_count(), 0);
}

#[tokio::test]
async fn test_protected_route_rejects_unknown_token() {
    let (app, _, backend) = common::create_test_app();

    for cookie in ["auth_token=not-a-real-token", "auth_token="] {
        let response = send(
            &app,
            request(
                "PUT",
                "/api/users/me",
                Some(json!({ "bio": "hi" })),
                Some(cookie),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(backend.profile_update_count(), 0);
}

#[tokio::test]
async fn test_protected_route_accepts_session_cookie() {
    let (app, _, backend) = common::create_test_app();
    let (_, cookies) = common::signed_in(&app, "ann@example.com").await;

    let response = send(
        &app,
        request(
            "PUT",
            "/api/users/me",
            Some(json!({ "bio": "Bakes bread" })),
            Some(&cookies),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.profile_update_count(), 1);
}

#[tokio::test]
async fn test_recipe_creation_requires_session() {
    let (app, _, _) = common::create_test_app();

    let response = send(
        &app,
        request("POST", "/api/recipes", Some(json!({ "title": "Soup" })), None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Listing on the same path stays public.
    let response = send(&app, request("GET", "/api/recipes", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_routes() {
    let (app, _, _) = common::create_test_app();

    let response = send(&app, request("GET", "/", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Recipe API is running!");

    let response = send(&app, request("GET", "/health", None, None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_cors_preflight_allowed_origin() {
    let (app, _, _) = common::create_test_app();

    let response = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/api/favorites")
            .header(header::ORIGIN, FRONTEND)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        FRONTEND
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    for method in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(methods.contains(method), "missing {method} in {methods}");
    }
}

#[tokio::test]
async fn test_cors_unknown_origin_gets_no_allow_header() {
    let (app, _, _) = common::create_test_app();

    let preflight = send(
        &app,
        Request::builder()
            .method("OPTIONS")
            .uri("/api/recipes")
            .header(header::ORIGIN, "https://evil.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert!(preflight
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());

    let simple = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/api/recipes")
            .header(header::ORIGIN, "https://evil.example.com")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert!(simple
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_cors_headers_on_simple_request() {
    let (app, _, _) = common::create_test_app();

    let response = send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/health")
            .header(header::ORIGIN, FRONTEND)
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        FRONTEND
    );
}
