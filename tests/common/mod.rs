// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use recipe_api::config::Config;
use recipe_api::db::MemoryBackend;
use recipe_api::models::{CookingStep, Difficulty, Ingredient, Nutrition, Recipe};
use recipe_api::routes::create_router;
use recipe_api::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const FRONTEND: &str = "http://localhost:4200";

/// Create a test app backed by the in-memory store.
/// Returns the router, the shared state and the backend.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>, Arc<MemoryBackend>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>, Arc<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new());
    let state = Arc::new(AppState::new(
        config,
        backend.clone(),
        backend.clone(),
        backend.clone(),
        backend.clone(),
    ));

    (create_router(state.clone()), state, backend)
}

/// Send one request through a clone of the router.
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

/// Build a request with an optional JSON body and `Cookie` header.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, body: Option<Value>, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookies) = cookies {
        builder = builder.header(header::COOKIE, cookies);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

/// Value of a cookie from its `Set-Cookie` header.
#[allow(dead_code)]
pub fn cookie_value(headers: &[String], name: &str) -> String {
    let cookie = find_cookie(headers, name);
    let pair = cookie.split(';').next().unwrap();
    pair[name.len() + 1..].to_string()
}

/// `Cookie` request header replaying every cookie the response set.
#[allow(dead_code)]
pub fn cookie_header(headers: &[String]) -> String {
    headers
        .iter()
        .map(|value| value.split(';').next().unwrap().to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Sign up through the API and return the response.
#[allow(dead_code)]
pub async fn signup(app: &Router, email: &str, password: &str, full_name: &str) -> Response {
    send(
        app,
        request(
            "POST",
            "/api/auth/signup",
            Some(serde_json::json!({
                "email": email,
                "password": password,
                "full_name": full_name,
            })),
            None,
        ),
    )
    .await
}

/// Sign up and return `(user id, Cookie header)`.
#[allow(dead_code)]
pub async fn signed_in(app: &Router, email: &str) -> (String, String) {
    let response = signup(app, email, "pw123456", "Test Cook").await;
    assert_eq!(response.status(), 201);
    let cookies = cookie_header(&set_cookie_headers(&response));
    let body = body_json(response).await;
    (body["user"]["id"].as_str().unwrap().to_string(), cookies)
}

#[allow(dead_code)]
pub fn recipe(id: &str, title: &str, category: &str, difficulty: Difficulty, created_at: &str) -> Recipe {
    Recipe {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(format!("{title} for two")),
        image_url: None,
        author_id: None,
        category: Some(category.to_string()),
        difficulty: Some(difficulty),
        prep_time: Some(10),
        cook_time: Some(25),
        servings: Some(2),
        created_at: created_at.to_string(),
        updated_at: None,
    }
}

/// Seed a recipe with two ingredients, two steps and nutrition.
#[allow(dead_code)]
pub fn seed_recipe(backend: &MemoryBackend, recipe: Recipe) {
    let id = recipe.id.clone();
    let ingredients = vec![
        Ingredient {
            id: format!("{id}-i2"),
            recipe_id: id.clone(),
            name: "Salt".to_string(),
            amount: Some(1.0),
            unit: Some("tsp".to_string()),
            order_index: 2,
        },
        Ingredient {
            id: format!("{id}-i1"),
            recipe_id: id.clone(),
            name: "Flour".to_string(),
            amount: Some(200.0),
            unit: Some("g".to_string()),
            order_index: 1,
        },
    ];
    let steps = vec![
        CookingStep {
            id: format!("{id}-s2"),
            recipe_id: id.clone(),
            step_number: 2,
            instruction: "Bake".to_string(),
            duration: Some(25),
            image_url: None,
        },
        CookingStep {
            id: format!("{id}-s1"),
            recipe_id: id.clone(),
            step_number: 1,
            instruction: "Mix".to_string(),
            duration: Some(5),
            image_url: None,
        },
    ];
    let nutrition = Nutrition {
        id: format!("{id}-n"),
        recipe_id: id.clone(),
        calories: 420.0,
        protein: 12.0,
        carbs: 60.0,
        fat: 9.0,
        fiber: None,
        sugar: None,
    };

    backend.insert_recipe(recipe, ingredients, steps, Some(nutrition), Vec::new());
}
