mod common;

use axum::http::StatusCode;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde_json::json;

use cinema_booking::error::CinemaError;
use cinema_booking::models::{
    reservation_model::NewReservation,
    show_time_model::{NewShowTime, ShowTimeFilter},
};
use cinema_booking::store::{CinemaStore, MemoryStore};
use common::{body_json, build_test_app, delete, get, hall_a, inception, post_json, put_json, test_state};

async fn reserve(store: &MemoryStore, show_time_id: ObjectId, hall_id: ObjectId, seats: usize) {
    let seat_ids = store
        .hall_seats(hall_id)
        .await
        .unwrap()
        .into_iter()
        .take(seats)
        .map(|seat| seat.id)
        .collect();
    let mut tx = store.begin().await.unwrap();
    tx.insert_reservation(NewReservation {
        user_id: ObjectId::new(),
        show_time_id,
        seat_ids,
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();
}

fn screening(movie_id: ObjectId, hall_id: ObjectId, day: u32) -> NewShowTime {
    let start = Utc.with_ymd_and_hms(2031, 3, day, 18, 0, 0).unwrap();
    NewShowTime {
        movie_id,
        hall_id,
        start_time: start,
        end_time: start + Duration::hours(2),
        price: Decimal::new(1250, 2),
    }
}

#[tokio::test]
async fn creating_a_hall_generates_its_seat_grid() {
    let (app, store) = build_test_app();

    let response = post_json(
        app.clone(),
        "/api/halls",
        json!({"name": "Hall A", "rows": 5, "seats_per_row": 10}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let seats = body["seats"].as_array().unwrap();
    assert_eq!(seats.len(), 50);
    assert_eq!(seats[0], json!({"row_number": 1, "seat_number": 1}));
    assert_eq!(seats[49], json!({"row_number": 5, "seat_number": 10}));
    assert_eq!(store.seat_count().await, 50);

    let id = body["id"].as_str().unwrap();
    let fetched = body_json(get(app.clone(), &format!("/api/halls/{id}")).await).await;
    assert_eq!(fetched["name"], "Hall A");
    assert_eq!(fetched["seats"].as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn invalid_and_duplicate_halls_are_rejected() {
    let (app, _) = build_test_app();

    let response = post_json(app.clone(), "/api/halls", json!({"name": "", "rows": 5, "seats_per_row": 10})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_json(app.clone(), "/api/halls", json!({"name": "Hall A", "rows": 0, "seats_per_row": 10})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json!({"name": "Hall A", "rows": 5, "seats_per_row": 10});
    assert_eq!(post_json(app.clone(), "/api/halls", body.clone()).await.status(), StatusCode::CREATED);
    let response = post_json(app.clone(), "/api/halls", body).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "DUPLICATE_NAME");
}

#[tokio::test]
async fn oversized_halls_are_rejected_before_any_seat_is_created() {
    let (app, store) = build_test_app();

    let response = post_json(
        app.clone(),
        "/api/halls",
        json!({"name": "Hall A", "rows": u32::MAX, "seats_per_row": u32::MAX}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");

    let response = post_json(app.clone(), "/api/halls", json!({"name": "Hall A", "rows": 101, "seats_per_row": 1})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.seat_count().await, 0);

    let response = post_json(app.clone(), "/api/halls", json!({"name": "Hall A", "rows": 100, "seats_per_row": 100})).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = put_json(
        app.clone(),
        &format!("/api/halls/{id}"),
        json!({"name": "Hall A", "rows": 5, "seats_per_row": 1000}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.seat_count().await, 10_000);
}

#[tokio::test]
async fn hall_update_regenerates_grid_only_when_it_changes() {
    let (state, store) = test_state();
    let hall = state.halls.create(hall_a()).await.unwrap();
    let movie = state.movies.create(inception()).await.unwrap();
    let show_time = state.show_times.create(screening(movie.id, hall.id, 1)).await.unwrap();
    reserve(&store, show_time.id, hall.id, 3).await;

    // rename only: seats and reserved seats survive
    let mut renamed = hall_a();
    renamed.name = "Hall One".into();
    let updated = state.halls.update(hall.id, renamed).await.unwrap();
    assert_eq!(updated.name, "Hall One");
    assert_eq!(store.seat_count().await, 50);
    assert_eq!(store.reserved_seat_count().await, 3);

    // resize: old grid and its reserved seats are gone
    let mut resized = hall_a();
    resized.name = "Hall One".into();
    resized.rows = 2;
    resized.seats_per_row = 4;
    let updated = state.halls.update(hall.id, resized).await.unwrap();
    assert_eq!(updated.seats.len(), 8);
    assert_eq!(store.seat_count().await, 8);
    assert_eq!(store.reserved_seat_count().await, 0);
    // the reservation itself and the show time stay
    assert_eq!(store.reservation_count().await, 1);
    assert!(state.show_times.get(show_time.id).await.is_ok());
}

#[tokio::test]
async fn hall_cannot_take_another_halls_name() {
    let (state, _) = test_state();
    state.halls.create(hall_a()).await.unwrap();
    let mut other = hall_a();
    other.name = "Hall B".into();
    let hall_b = state.halls.create(other).await.unwrap();

    let err = state.halls.update(hall_b.id, hall_a()).await.unwrap_err();

    assert!(matches!(err, CinemaError::DuplicateName { .. }));
}

#[tokio::test]
async fn deleting_a_hall_leaves_no_orphans() {
    let (state, store) = test_state();
    let hall = state.halls.create(hall_a()).await.unwrap();
    let mut other = hall_a();
    other.name = "Hall B".into();
    let hall_b = state.halls.create(other).await.unwrap();
    let movie = state.movies.create(inception()).await.unwrap();
    let first = state.show_times.create(screening(movie.id, hall.id, 1)).await.unwrap();
    let second = state.show_times.create(screening(movie.id, hall.id, 2)).await.unwrap();
    let kept = state.show_times.create(screening(movie.id, hall_b.id, 1)).await.unwrap();
    reserve(&store, first.id, hall.id, 2).await;
    reserve(&store, second.id, hall.id, 1).await;
    reserve(&store, kept.id, hall_b.id, 4).await;

    state.halls.delete(hall.id).await.unwrap();

    assert!(matches!(
        state.halls.get(hall.id).await,
        Err(CinemaError::NotFound { .. })
    ));
    assert_eq!(store.seat_count().await, 50);
    assert_eq!(store.reservation_count().await, 1);
    assert_eq!(store.reserved_seat_count().await, 4);
    let remaining = state.show_times.list(ShowTimeFilter::All).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);

    // the movie no longer indexes the removed show times
    let movie_show_times = state.show_times.list(ShowTimeFilter::Movie(movie.id)).await.unwrap();
    assert_eq!(movie_show_times.len(), 1);
    assert_eq!(store.find_movie(movie.id).await.unwrap().unwrap().show_time_ids, vec![kept.id]);
}

#[tokio::test]
async fn deleting_a_hall_over_http_returns_no_content() {
    let (app, store) = build_test_app();
    let response = post_json(app.clone(), "/api/halls", json!({"name": "Hall A", "rows": 2, "seats_per_row": 2})).await;
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = delete(app.clone(), &format!("/api/halls/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.seat_count().await, 0);

    let response = delete(app.clone(), &format!("/api/halls/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_show_time_removes_its_reservations() {
    let (state, store) = test_state();
    let hall = state.halls.create(hall_a()).await.unwrap();
    let movie = state.movies.create(inception()).await.unwrap();
    let show_time = state.show_times.create(screening(movie.id, hall.id, 1)).await.unwrap();
    reserve(&store, show_time.id, hall.id, 2).await;

    state.show_times.delete(show_time.id).await.unwrap();

    assert_eq!(store.reservation_count().await, 0);
    assert!(store.find_hall(hall.id).await.unwrap().unwrap().show_time_ids.is_empty());
    assert!(store.find_movie(movie.id).await.unwrap().unwrap().show_time_ids.is_empty());
}

#[tokio::test]
async fn deleting_a_movie_cascades_to_its_show_times() {
    let (state, store) = test_state();
    let hall = state.halls.create(hall_a()).await.unwrap();
    let movie = state.movies.create(inception()).await.unwrap();
    let show_time = state.show_times.create(screening(movie.id, hall.id, 1)).await.unwrap();
    reserve(&store, show_time.id, hall.id, 1).await;

    state.movies.delete(movie.id).await.unwrap();

    assert!(state.show_times.list(ShowTimeFilter::All).await.unwrap().is_empty());
    assert_eq!(store.reservation_count().await, 0);
    assert_eq!(store.seat_count().await, 50);
    assert!(store.find_hall(hall.id).await.unwrap().unwrap().show_time_ids.is_empty());
}

#[tokio::test]
async fn movies_reject_duplicates_and_future_releases() {
    let (app, _) = build_test_app();
    let body = json!({
        "title": "Inception",
        "description": "Dreams within dreams",
        "genre": "Sci-Fi",
        "duration_minutes": 148,
        "release_date": "2010-07-16",
        "age_rating": "AGE_12"
    });
    let response = post_json(app.clone(), "/api/movies", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["age_rating"], "AGE_12");

    let response = post_json(app.clone(), "/api/movies", body.clone()).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let mut future = body;
    future["title"] = json!("Sequel");
    future["release_date"] = json!((Utc::now() + Duration::days(400)).date_naive());
    let response = post_json(app.clone(), "/api/movies", future).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let listed = body_json(get(app.clone(), "/api/movies").await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn movie_service_rejects_future_release_date() {
    let (state, _) = test_state();
    let mut draft = inception();
    draft.release_date = Utc::now().date_naive() + Duration::days(30);

    let err = state.movies.create(draft).await.unwrap_err();

    assert!(matches!(err, CinemaError::Validation(_)));
}

#[tokio::test]
async fn movie_lookup_by_unknown_id_is_not_found() {
    let (app, _) = build_test_app();
    let response = get(app.clone(), &format!("/api/movies/{}", ObjectId::new().to_hex())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = put_json(
        app.clone(),
        &format!("/api/halls/{}", ObjectId::new().to_hex()),
        json!({"name": "Hall Z", "rows": 1, "seats_per_row": 1}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn day_filter_uses_the_utc_day_of_start_time() {
    let (state, _) = test_state();
    let hall = state.halls.create(hall_a()).await.unwrap();
    let movie = state.movies.create(inception()).await.unwrap();
    let mut late = screening(movie.id, hall.id, 1);
    late.start_time = Utc.with_ymd_and_hms(2031, 3, 1, 23, 0, 0).unwrap();
    late.end_time = late.start_time + Duration::hours(2);
    state.show_times.create(late).await.unwrap();

    let first = NaiveDate::from_ymd_opt(2031, 3, 1).unwrap();
    let second = NaiveDate::from_ymd_opt(2031, 3, 2).unwrap();
    assert_eq!(state.show_times.list(ShowTimeFilter::Day(first)).await.unwrap().len(), 1);
    assert!(state.show_times.list(ShowTimeFilter::Day(second)).await.unwrap().is_empty());
}
