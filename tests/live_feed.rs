mod common;

use axum::extract::ws::Message;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::mpsc::unbounded_channel;

use cinema_booking::error::AppError;
use cinema_booking::websockets::dispatch;
use common::{build_test_app, hall_a, inception, post_json, test_state};

fn data(movie_id: &str, hall_id: &str, start_hours: i64, end_hours: i64) -> Value {
    let now = Utc::now();
    json!({
        "movie_id": movie_id,
        "hall_id": hall_id,
        "start_time": now + Duration::hours(start_hours),
        "end_time": now + Duration::hours(end_hours),
        "price": 9.5
    })
}

#[tokio::test]
async fn socket_actions_run_through_the_scheduler() {
    let (state, _) = test_state();
    let hall = state.halls.create(hall_a()).await.unwrap();
    let movie = state.movies.create(inception()).await.unwrap();
    let (hall_id, movie_id) = (hall.id.to_hex(), movie.id.to_hex());

    let created = dispatch(
        &state,
        "add_show_time",
        &json!({"action": "add_show_time", "data": data(&movie_id, &hall_id, 1, 3)}),
    )
    .await
    .unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["hall_name"], "Hall A");

    let err = dispatch(
        &state,
        "add_show_time",
        &json!({"action": "add_show_time", "data": data(&movie_id, &hall_id, 2, 4)}),
    )
    .await
    .unwrap_err();
    assert_eq!(err.parts().1, "SCHEDULE_CONFLICT");

    let updated = dispatch(
        &state,
        "update_show_time",
        &json!({"action": "update_show_time", "id": id, "data": data(&movie_id, &hall_id, 3, 5)}),
    )
    .await
    .unwrap();
    assert_eq!(updated["id"], id.as_str());

    let listed = dispatch(&state, "get_show_times", &json!({"action": "get_show_times"}))
        .await
        .unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let deleted = dispatch(&state, "delete_show_time", &json!({"action": "delete_show_time", "id": id}))
        .await
        .unwrap();
    assert_eq!(deleted["id"], id.as_str());
}

#[tokio::test]
async fn socket_rejects_unknown_actions_and_missing_ids() {
    let (state, _) = test_state();

    let err = dispatch(&state, "book_seat", &json!({"action": "book_seat"})).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = dispatch(&state, "delete_show_time", &json!({"action": "delete_show_time"}))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = dispatch(
        &state,
        "add_show_time",
        &json!({"action": "add_show_time", "data": {"movie_id": "x"}}),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn http_writes_are_broadcast_to_subscribers() {
    let (state, _) = test_state();
    let (client, mut inbox) = unbounded_channel();
    state.live.lock().await.subscribe(client);
    let app = cinema_booking::app(state.clone());

    let hall = state.halls.create(hall_a()).await.unwrap();
    let movie = state.movies.create(inception()).await.unwrap();
    let response = post_json(
        app,
        "/api/showtimes",
        data(&movie.id.to_hex(), &hall.id.to_hex(), 1, 3),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);

    match inbox.try_recv().unwrap() {
        Message::Text(text) => {
            let envelope: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(envelope["action_type"], "add_show_time");
            assert_eq!(envelope["status"], "success");
            assert_eq!(envelope["data"]["movie_title"], "Inception");
        }
        other => panic!("unexpected message {other:?}"),
    }
}

#[tokio::test]
async fn router_builds_without_subscribers() {
    let (app, _) = build_test_app();
    let response = common::get(app, "/api/showtimes").await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}
