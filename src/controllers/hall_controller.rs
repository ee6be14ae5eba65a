use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use crate::error::AppResult;
use crate::models::hall_model::{HallRequest, HallResponse};
use crate::state::AppState;
use crate::utils::parse_object_id;

pub async fn load_halls(Extension(state): Extension<AppState>) -> AppResult<Json<Vec<HallResponse>>> {
    Ok(Json(state.halls.list().await?))
}

pub async fn load_hall(
    Path(id_str): Path<String>,
    Extension(state): Extension<AppState>,
) -> AppResult<Json<HallResponse>> {
    let hall_id = parse_object_id(&id_str)?;
    Ok(Json(state.halls.get(hall_id).await?))
}

pub async fn add_hall(
    Extension(state): Extension<AppState>,
    Json(request): Json<HallRequest>,
) -> AppResult<(StatusCode, Json<HallResponse>)> {
    request.validate()?;
    let hall = state.halls.create(request.into_new_hall()).await?;
    Ok((StatusCode::CREATED, Json(hall)))
}

pub async fn update_hall(
    Path(id_str): Path<String>,
    Extension(state): Extension<AppState>,
    Json(request): Json<HallRequest>,
) -> AppResult<Json<HallResponse>> {
    let hall_id = parse_object_id(&id_str)?;
    request.validate()?;
    Ok(Json(state.halls.update(hall_id, request.into_new_hall()).await?))
}

pub async fn delete_hall(
    Path(id_str): Path<String>,
    Extension(state): Extension<AppState>,
) -> AppResult<StatusCode> {
    let hall_id = parse_object_id(&id_str)?;
    state.halls.delete(hall_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
