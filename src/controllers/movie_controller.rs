use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use validator::Validate;

use crate::error::AppResult;
use crate::models::movie_model::{MovieRequest, MovieResponse};
use crate::state::AppState;
use crate::utils::parse_object_id;

pub async fn load_movies(Extension(state): Extension<AppState>) -> AppResult<Json<Vec<MovieResponse>>> {
    Ok(Json(state.movies.list().await?))
}

pub async fn load_movie(
    Path(id_str): Path<String>,
    Extension(state): Extension<AppState>,
) -> AppResult<Json<MovieResponse>> {
    let movie_id = parse_object_id(&id_str)?;
    Ok(Json(state.movies.get(movie_id).await?))
}

pub async fn add_movie(
    Extension(state): Extension<AppState>,
    Json(request): Json<MovieRequest>,
) -> AppResult<(StatusCode, Json<MovieResponse>)> {
    request.validate()?;
    let movie = state.movies.create(request.into_new_movie()).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn delete_movie(
    Path(id_str): Path<String>,
    Extension(state): Extension<AppState>,
) -> AppResult<StatusCode> {
    let movie_id = parse_object_id(&id_str)?;
    state.movies.delete(movie_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
