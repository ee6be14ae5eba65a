use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::models::show_time_model::{ShowTimeFilter, ShowTimeRequest, ShowTimeResponse};
use crate::state::AppState;
use crate::utils::parse_object_id;

pub async fn load_show_times(Extension(state): Extension<AppState>) -> AppResult<Json<Vec<ShowTimeResponse>>> {
    Ok(Json(state.show_times.list(ShowTimeFilter::All).await?))
}

pub async fn fetch_show_time_by_id(
    Path(id_str): Path<String>,
    Extension(state): Extension<AppState>,
) -> AppResult<Json<ShowTimeResponse>> {
    let id = parse_object_id(&id_str)?;
    Ok(Json(state.show_times.get(id).await?))
}

pub async fn load_show_times_by_movie(
    Path(movie_id): Path<String>,
    Extension(state): Extension<AppState>,
) -> AppResult<Json<Vec<ShowTimeResponse>>> {
    let movie_id = parse_object_id(&movie_id)?;
    Ok(Json(state.show_times.list(ShowTimeFilter::Movie(movie_id)).await?))
}

pub async fn load_show_times_by_hall(
    Path(hall_id): Path<String>,
    Extension(state): Extension<AppState>,
) -> AppResult<Json<Vec<ShowTimeResponse>>> {
    let hall_id = parse_object_id(&hall_id)?;
    Ok(Json(state.show_times.list(ShowTimeFilter::Hall(hall_id)).await?))
}

pub async fn load_show_times_by_date(
    Path(date): Path<String>,
    Extension(state): Extension<AppState>,
) -> AppResult<Json<Vec<ShowTimeResponse>>> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("'{date}' is not an ISO date")))?;
    Ok(Json(state.show_times.list(ShowTimeFilter::Day(date)).await?))
}

pub async fn add_show_time(
    Extension(state): Extension<AppState>,
    Json(request): Json<ShowTimeRequest>,
) -> AppResult<(StatusCode, Json<ShowTimeResponse>)> {
    let draft = request.into_new_show_time()?;
    let created = state.show_times.create(draft).await?;
    state
        .live
        .lock()
        .await
        .broadcast("add_show_time", "success", json!(created));
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_show_time(
    Path(id_str): Path<String>,
    Extension(state): Extension<AppState>,
    Json(request): Json<ShowTimeRequest>,
) -> AppResult<Json<ShowTimeResponse>> {
    let id = parse_object_id(&id_str)?;
    let draft = request.into_new_show_time()?;
    let updated = state.show_times.update(id, draft).await?;
    state
        .live
        .lock()
        .await
        .broadcast("update_show_time", "success", json!(updated));
    Ok(Json(updated))
}

pub async fn delete_show_time(
    Path(id_str): Path<String>,
    Extension(state): Extension<AppState>,
) -> AppResult<StatusCode> {
    let id = parse_object_id(&id_str)?;
    state.show_times.delete(id).await?;
    state.live.lock().await.broadcast(
        "delete_show_time",
        "success",
        json!({"message": "Show time deleted successfully", "id": id.to_hex()}),
    );
    Ok(StatusCode::NO_CONTENT)
}
