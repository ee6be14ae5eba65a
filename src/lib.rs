use axum::{extract::Extension, routing::get, Router};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod scheduling;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
pub mod websockets;

use controllers::{hall_controller::*, movie_controller::*, show_time_controller::*};
pub use state::AppState;
use websockets::websocket_handler;

/// The full HTTP + WebSocket surface. CORS is layered on by the caller.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/halls", get(load_halls).post(add_hall))
        .route(
            "/api/halls/:id",
            get(load_hall).put(update_hall).delete(delete_hall),
        )
        .route("/api/movies", get(load_movies).post(add_movie))
        .route("/api/movies/:id", get(load_movie).delete(delete_movie))
        .route("/api/showtimes", get(load_show_times).post(add_show_time))
        .route(
            "/api/showtimes/:id",
            get(fetch_show_time_by_id)
                .put(update_show_time)
                .delete(delete_show_time),
        )
        .route("/api/showtimes/movie/:movie_id", get(load_show_times_by_movie))
        .route("/api/showtimes/hall/:hall_id", get(load_show_times_by_hall))
        .route("/api/showtimes/date/:date", get(load_show_times_by_date))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}
