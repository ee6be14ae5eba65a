use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use super::show_time_service::{find_movie_or_err, remove_show_time};
use crate::error::{CinemaError, CinemaResult};
use crate::models::movie_model::{MovieResponse, NewMovie};
use crate::store::CinemaStore;

#[derive(Clone)]
pub struct MovieService {
    store: Arc<dyn CinemaStore>,
}

impl MovieService {
    pub fn new(store: Arc<dyn CinemaStore>) -> Self {
        MovieService { store }
    }

    pub async fn list(&self) -> CinemaResult<Vec<MovieResponse>> {
        let movies = self.store.list_movies().await?;
        Ok(movies.iter().map(MovieResponse::from).collect())
    }

    pub async fn get(&self, id: ObjectId) -> CinemaResult<MovieResponse> {
        self.store
            .find_movie(id)
            .await?
            .map(|movie| MovieResponse::from(&movie))
            .ok_or_else(|| CinemaError::not_found("Movie", id))
    }

    pub async fn create(&self, draft: NewMovie) -> CinemaResult<MovieResponse> {
        if draft.release_date > Utc::now().date_naive() {
            return Err(CinemaError::Validation(format!(
                "release date {} is in the future",
                draft.release_date
            )));
        }
        let mut tx = self.store.begin().await?;
        if tx.find_movie_by_title(&draft.title).await?.is_some() {
            return Err(CinemaError::DuplicateName {
                entity: "Movie",
                name: draft.title,
            });
        }
        let movie = tx.insert_movie(draft).await?;
        tx.commit().await?;

        tracing::info!(movie_id = %movie.id, title = %movie.title, "Movie created");
        Ok(MovieResponse::from(&movie))
    }

    /// Removes the movie together with all of its show times.
    pub async fn delete(&self, id: ObjectId) -> CinemaResult<()> {
        let mut tx = self.store.begin().await?;
        let movie = find_movie_or_err(tx.as_mut(), id).await?;
        let show_times = tx.movie_show_times(&movie).await?;
        for show_time in &show_times {
            remove_show_time(tx.as_mut(), show_time).await?;
        }
        tx.delete_movie(movie.id).await?;
        tx.commit().await?;

        tracing::info!(movie_id = %id, show_times = show_times.len(), "Movie deleted");
        Ok(())
    }
}
