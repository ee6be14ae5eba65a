use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::error::{CinemaError, CinemaResult};
use crate::models::{
    hall_model::Hall,
    movie_model::Movie,
    show_time_model::{NewShowTime, ShowTime, ShowTimeFilter, ShowTimeResponse},
};
use crate::scheduling::{validate_show_time, HallSchedule};
use crate::store::{CatalogTx, CinemaStore, Owner, StoreResult};

/// Creates, reschedules and cancels show times. Every mutation runs in a
/// single unit of work: resolve movie and hall, validate against the hall's
/// schedule, write, then keep the hall and movie indexes in step.
#[derive(Clone)]
pub struct ShowTimeService {
    store: Arc<dyn CinemaStore>,
}

pub(crate) async fn find_movie_or_err(tx: &mut dyn CatalogTx, id: ObjectId) -> CinemaResult<Movie> {
    tx.find_movie(id)
        .await?
        .ok_or_else(|| CinemaError::not_found("Movie", id))
}

pub(crate) async fn find_hall_or_err(tx: &mut dyn CatalogTx, id: ObjectId) -> CinemaResult<Hall> {
    tx.find_hall(id)
        .await?
        .ok_or_else(|| CinemaError::not_found("Cinema hall", id))
}

async fn find_show_time_or_err(tx: &mut dyn CatalogTx, id: ObjectId) -> CinemaResult<ShowTime> {
    tx.find_show_time(id)
        .await?
        .ok_or_else(|| CinemaError::not_found("Show time", id))
}

/// Deletes a show time (its reservations go with it) and drops it from the
/// hall and movie indexes.
pub(crate) async fn remove_show_time(tx: &mut dyn CatalogTx, show_time: &ShowTime) -> StoreResult<()> {
    tx.delete_show_time(show_time.id).await?;
    tx.detach_show_time(Owner::Hall(show_time.hall_id), show_time.id).await?;
    tx.detach_show_time(Owner::Movie(show_time.movie_id), show_time.id).await
}

fn view(show_time: &ShowTime, movie: &Movie, hall: &Hall) -> ShowTimeResponse {
    ShowTimeResponse {
        id: show_time.id,
        movie_id: movie.id,
        movie_title: movie.title.clone(),
        hall_id: hall.id,
        hall_name: hall.name.clone(),
        start_time: show_time.start_time,
        end_time: show_time.end_time,
        price: show_time.price,
        status: show_time.status_at(Utc::now()),
    }
}

impl ShowTimeService {
    pub fn new(store: Arc<dyn CinemaStore>) -> Self {
        ShowTimeService { store }
    }

    pub async fn list(&self, filter: ShowTimeFilter) -> CinemaResult<Vec<ShowTimeResponse>> {
        let show_times = self.store.list_show_times(filter).await?;
        let mut movies: HashMap<ObjectId, Movie> = HashMap::new();
        let mut halls: HashMap<ObjectId, Hall> = HashMap::new();
        let mut views = Vec::with_capacity(show_times.len());
        for show_time in &show_times {
            if !movies.contains_key(&show_time.movie_id) {
                let movie = self
                    .store
                    .find_movie(show_time.movie_id)
                    .await?
                    .ok_or_else(|| CinemaError::not_found("Movie", show_time.movie_id))?;
                movies.insert(movie.id, movie);
            }
            if !halls.contains_key(&show_time.hall_id) {
                let hall = self
                    .store
                    .find_hall(show_time.hall_id)
                    .await?
                    .ok_or_else(|| CinemaError::not_found("Cinema hall", show_time.hall_id))?;
                halls.insert(hall.id, hall);
            }
            views.push(view(
                show_time,
                &movies[&show_time.movie_id],
                &halls[&show_time.hall_id],
            ));
        }
        Ok(views)
    }

    pub async fn get(&self, id: ObjectId) -> CinemaResult<ShowTimeResponse> {
        let show_time = self
            .store
            .find_show_time(id)
            .await?
            .ok_or_else(|| CinemaError::not_found("Show time", id))?;
        let movie = self
            .store
            .find_movie(show_time.movie_id)
            .await?
            .ok_or_else(|| CinemaError::not_found("Movie", show_time.movie_id))?;
        let hall = self
            .store
            .find_hall(show_time.hall_id)
            .await?
            .ok_or_else(|| CinemaError::not_found("Cinema hall", show_time.hall_id))?;
        Ok(view(&show_time, &movie, &hall))
    }

    pub async fn create(&self, draft: NewShowTime) -> CinemaResult<ShowTimeResponse> {
        let mut tx = self.store.begin().await?;
        let movie = find_movie_or_err(tx.as_mut(), draft.movie_id).await?;
        let hall = find_hall_or_err(tx.as_mut(), draft.hall_id).await?;
        let schedule = HallSchedule::new(hall.clone(), tx.load_schedule(&hall).await?);

        if let Err(err) = validate_show_time(&schedule, draft.start_time, draft.end_time, None) {
            tracing::warn!(hall = %hall.name, start = %draft.start_time, end = %draft.end_time, error = %err, "Show time rejected");
            return Err(err);
        }

        let show_time = tx.insert_show_time(draft).await?;
        tx.attach_show_time(Owner::Hall(hall.id), show_time.id).await?;
        tx.attach_show_time(Owner::Movie(movie.id), show_time.id).await?;
        tx.commit().await?;

        tracing::info!(
            show_time_id = %show_time.id,
            hall = %hall.name,
            movie = %movie.title,
            start = %show_time.start_time,
            end = %show_time.end_time,
            "Show time scheduled"
        );
        Ok(view(&show_time, &movie, &hall))
    }

    /// Replaces every field of an existing show time. Moving it to another
    /// hall validates against the destination hall's schedule.
    pub async fn update(&self, id: ObjectId, draft: NewShowTime) -> CinemaResult<ShowTimeResponse> {
        let mut tx = self.store.begin().await?;
        let current = find_show_time_or_err(tx.as_mut(), id).await?;
        let movie = find_movie_or_err(tx.as_mut(), draft.movie_id).await?;
        let hall = find_hall_or_err(tx.as_mut(), draft.hall_id).await?;
        let schedule = HallSchedule::new(hall.clone(), tx.load_schedule(&hall).await?);

        if let Err(err) = validate_show_time(&schedule, draft.start_time, draft.end_time, Some(id)) {
            tracing::warn!(show_time_id = %id, hall = %hall.name, error = %err, "Show time update rejected");
            return Err(err);
        }

        let updated = ShowTime {
            id,
            movie_id: movie.id,
            hall_id: hall.id,
            start_time: draft.start_time,
            end_time: draft.end_time,
            price: draft.price,
        };
        tx.update_show_time(&updated).await?;
        if current.hall_id != updated.hall_id {
            tx.detach_show_time(Owner::Hall(current.hall_id), id).await?;
            tx.attach_show_time(Owner::Hall(updated.hall_id), id).await?;
        }
        if current.movie_id != updated.movie_id {
            tx.detach_show_time(Owner::Movie(current.movie_id), id).await?;
            tx.attach_show_time(Owner::Movie(updated.movie_id), id).await?;
        }
        tx.commit().await?;

        tracing::info!(show_time_id = %id, hall = %hall.name, start = %updated.start_time, end = %updated.end_time, "Show time rescheduled");
        Ok(view(&updated, &movie, &hall))
    }

    pub async fn delete(&self, id: ObjectId) -> CinemaResult<()> {
        let mut tx = self.store.begin().await?;
        let show_time = find_show_time_or_err(tx.as_mut(), id).await?;
        remove_show_time(tx.as_mut(), &show_time).await?;
        tx.commit().await?;
        tracing::info!(show_time_id = %id, "Show time cancelled");
        Ok(())
    }
}
