use std::sync::Arc;

use mongodb::bson::oid::ObjectId;

use super::show_time_service::{find_hall_or_err, remove_show_time};
use crate::error::{CinemaError, CinemaResult};
use crate::models::hall_model::{Hall, HallResponse, NewHall};
use crate::scheduling::generate_seats;
use crate::store::CinemaStore;

#[derive(Clone)]
pub struct HallService {
    store: Arc<dyn CinemaStore>,
}

impl HallService {
    pub fn new(store: Arc<dyn CinemaStore>) -> Self {
        HallService { store }
    }

    async fn response(&self, hall: &Hall) -> CinemaResult<HallResponse> {
        let seats = self.store.hall_seats(hall.id).await?;
        Ok(HallResponse::of(hall, &seats))
    }

    pub async fn list(&self) -> CinemaResult<Vec<HallResponse>> {
        let halls = self.store.list_halls().await?;
        let mut responses = Vec::with_capacity(halls.len());
        for hall in &halls {
            responses.push(self.response(hall).await?);
        }
        Ok(responses)
    }

    pub async fn get(&self, id: ObjectId) -> CinemaResult<HallResponse> {
        let hall = self
            .store
            .find_hall(id)
            .await?
            .ok_or_else(|| CinemaError::not_found("Cinema hall", id))?;
        self.response(&hall).await
    }

    pub async fn create(&self, draft: NewHall) -> CinemaResult<HallResponse> {
        let mut tx = self.store.begin().await?;
        if tx.find_hall_by_name(&draft.name).await?.is_some() {
            return Err(CinemaError::DuplicateName {
                entity: "Cinema hall",
                name: draft.name,
            });
        }
        let hall = tx.insert_hall(draft).await?;
        let seats = tx
            .insert_seats(hall.id, &generate_seats(hall.rows, hall.seats_per_row))
            .await?;
        tx.commit().await?;

        tracing::info!(hall_id = %hall.id, name = %hall.name, seats = seats.len(), "Cinema hall created");
        Ok(HallResponse::of(&hall, &seats))
    }

    /// Renames and resizes a hall. A change of rows or seats per row
    /// replaces the whole seat grid, dropping reserved seats of the old one.
    pub async fn update(&self, id: ObjectId, draft: NewHall) -> CinemaResult<HallResponse> {
        let mut tx = self.store.begin().await?;
        let mut hall = find_hall_or_err(tx.as_mut(), id).await?;
        if let Some(other) = tx.find_hall_by_name(&draft.name).await? {
            if other.id != id {
                return Err(CinemaError::DuplicateName {
                    entity: "Cinema hall",
                    name: draft.name,
                });
            }
        }

        let grid_changed = hall.rows != draft.rows || hall.seats_per_row != draft.seats_per_row;
        hall.name = draft.name;
        hall.rows = draft.rows;
        hall.seats_per_row = draft.seats_per_row;
        tx.update_hall(&hall).await?;

        if grid_changed {
            let removed = tx.delete_seats(hall.id).await?;
            let seats = tx
                .insert_seats(hall.id, &generate_seats(hall.rows, hall.seats_per_row))
                .await?;
            tracing::info!(hall_id = %hall.id, removed, created = seats.len(), "Seat grid regenerated");
        }
        tx.commit().await?;

        self.response(&hall).await
    }

    /// Removes the hall with its seats, show times and their reservations.
    pub async fn delete(&self, id: ObjectId) -> CinemaResult<()> {
        let mut tx = self.store.begin().await?;
        let hall = find_hall_or_err(tx.as_mut(), id).await?;
        let show_times = tx.load_schedule(&hall).await?;
        for show_time in &show_times {
            remove_show_time(tx.as_mut(), show_time).await?;
        }
        tx.delete_seats(hall.id).await?;
        tx.delete_hall(hall.id).await?;
        tx.commit().await?;

        tracing::info!(hall_id = %id, show_times = show_times.len(), "Cinema hall deleted");
        Ok(())
    }
}
