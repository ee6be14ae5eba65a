#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use tower::ServiceExt;

use cinema_booking::models::{
    hall_model::NewHall,
    movie_model::{AgeRating, NewMovie},
};
use cinema_booking::store::MemoryStore;
use cinema_booking::{app, AppState};

/// Router over a fresh in-memory store, plus a handle on that store.
pub fn build_test_app() -> (Router, MemoryStore) {
    let store = MemoryStore::new();
    let state = AppState::new(Arc::new(store.clone()));
    (app(state), store)
}

pub fn test_state() -> (AppState, MemoryStore) {
    let store = MemoryStore::new();
    (AppState::new(Arc::new(store.clone())), store)
}

pub fn hall_a() -> NewHall {
    NewHall {
        name: "Hall A".into(),
        rows: 5,
        seats_per_row: 10,
    }
}

pub fn inception() -> NewMovie {
    NewMovie {
        title: "Inception".into(),
        description: "Dreams".into(),
        genre: "Sci-Fi".into(),
        duration_minutes: 148,
        release_date: NaiveDate::from_ymd_opt(2010, 7, 16).unwrap(),
        age_rating: AgeRating::Age12,
    }
}

async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    send(app, Method::DELETE, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::PUT, uri, Some(body)).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
