use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{CatalogTx, CinemaStore, Owner, StoreResult};
use crate::error::StoreError;
use crate::models::{
    hall_model::{Hall, NewHall, Seat},
    movie_model::{Movie, NewMovie},
    reservation_model::{NewReservation, Reservation, ReservationStatus, ReservedSeat},
    show_time_model::{NewShowTime, ShowTime, ShowTimeFilter},
};
use crate::scheduling::SeatPosition;

#[derive(Debug, Default, Clone)]
struct Tables {
    halls: HashMap<ObjectId, Hall>,
    seats: HashMap<ObjectId, Seat>,
    movies: HashMap<ObjectId, Movie>,
    show_times: HashMap<ObjectId, ShowTime>,
    reservations: HashMap<ObjectId, Reservation>,
}

impl Tables {
    fn show_times_by_ids(&self, ids: &[ObjectId]) -> Vec<ShowTime> {
        let mut show_times: Vec<ShowTime> = ids
            .iter()
            .filter_map(|id| self.show_times.get(id).cloned())
            .collect();
        show_times.sort_by_key(|s| s.start_time);
        show_times
    }

    fn index_of(&mut self, owner: Owner) -> Option<&mut Vec<ObjectId>> {
        match owner {
            Owner::Hall(id) => self.halls.get_mut(&id).map(|h| &mut h.show_time_ids),
            Owner::Movie(id) => self.movies.get_mut(&id).map(|m| &mut m.show_time_ids),
        }
    }
}

/// In-process store. A unit of work holds the catalog lock for its whole
/// lifetime and edits a copy that replaces the tables on commit, which makes
/// every transaction serializable.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of seat rows across all halls.
    pub async fn seat_count(&self) -> usize {
        self.tables.lock().await.seats.len()
    }

    /// Total number of reservation rows.
    pub async fn reservation_count(&self) -> usize {
        self.tables.lock().await.reservations.len()
    }

    /// Total number of reserved-seat rows across all reservations.
    pub async fn reserved_seat_count(&self) -> usize {
        self.tables
            .lock()
            .await
            .reservations
            .values()
            .map(|r| r.seats.len())
            .sum()
    }
}

#[async_trait]
impl CinemaStore for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn find_hall(&self, id: ObjectId) -> StoreResult<Option<Hall>> {
        Ok(self.tables.lock().await.halls.get(&id).cloned())
    }

    async fn find_movie(&self, id: ObjectId) -> StoreResult<Option<Movie>> {
        Ok(self.tables.lock().await.movies.get(&id).cloned())
    }

    async fn find_show_time(&self, id: ObjectId) -> StoreResult<Option<ShowTime>> {
        Ok(self.tables.lock().await.show_times.get(&id).cloned())
    }

    async fn list_halls(&self) -> StoreResult<Vec<Hall>> {
        let mut halls: Vec<Hall> = self.tables.lock().await.halls.values().cloned().collect();
        halls.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(halls)
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let mut movies: Vec<Movie> = self.tables.lock().await.movies.values().cloned().collect();
        movies.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(movies)
    }

    async fn list_show_times(&self, filter: ShowTimeFilter) -> StoreResult<Vec<ShowTime>> {
        let mut show_times: Vec<ShowTime> = self
            .tables
            .lock()
            .await
            .show_times
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        show_times.sort_by_key(|s| (s.start_time, s.id));
        Ok(show_times)
    }

    async fn hall_seats(&self, hall_id: ObjectId) -> StoreResult<Vec<Seat>> {
        let mut seats: Vec<Seat> = self
            .tables
            .lock()
            .await
            .seats
            .values()
            .filter(|s| s.hall_id == hall_id)
            .cloned()
            .collect();
        seats.sort_by_key(|s| (s.row_number, s.seat_number));
        Ok(seats)
    }

    async fn show_time_reservations(&self, show_time_id: ObjectId) -> StoreResult<Vec<Reservation>> {
        let mut reservations: Vec<Reservation> = self
            .tables
            .lock()
            .await
            .reservations
            .values()
            .filter(|r| r.show_time_id == show_time_id)
            .cloned()
            .collect();
        reservations.sort_by_key(|r| r.created_at);
        Ok(reservations)
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl CatalogTx for MemoryTx {
    async fn find_hall(&mut self, id: ObjectId) -> StoreResult<Option<Hall>> {
        Ok(self.working.halls.get(&id).cloned())
    }

    async fn find_hall_by_name(&mut self, name: &str) -> StoreResult<Option<Hall>> {
        Ok(self.working.halls.values().find(|h| h.name == name).cloned())
    }

    async fn find_movie(&mut self, id: ObjectId) -> StoreResult<Option<Movie>> {
        Ok(self.working.movies.get(&id).cloned())
    }

    async fn find_movie_by_title(&mut self, title: &str) -> StoreResult<Option<Movie>> {
        Ok(self.working.movies.values().find(|m| m.title == title).cloned())
    }

    async fn find_show_time(&mut self, id: ObjectId) -> StoreResult<Option<ShowTime>> {
        Ok(self.working.show_times.get(&id).cloned())
    }

    async fn load_schedule(&mut self, hall: &Hall) -> StoreResult<Vec<ShowTime>> {
        // the catalog lock is already held for the whole unit of work
        let ids = self
            .working
            .halls
            .get(&hall.id)
            .map(|h| h.show_time_ids.clone())
            .unwrap_or_default();
        Ok(self.working.show_times_by_ids(&ids))
    }

    async fn movie_show_times(&mut self, movie: &Movie) -> StoreResult<Vec<ShowTime>> {
        let ids = self
            .working
            .movies
            .get(&movie.id)
            .map(|m| m.show_time_ids.clone())
            .unwrap_or_default();
        Ok(self.working.show_times_by_ids(&ids))
    }

    async fn insert_hall(&mut self, hall: NewHall) -> StoreResult<Hall> {
        if self.working.halls.values().any(|h| h.name == hall.name) {
            return Err(StoreError::Constraint(format!("hall name '{}' is taken", hall.name)));
        }
        let hall = Hall {
            id: ObjectId::new(),
            name: hall.name,
            rows: hall.rows,
            seats_per_row: hall.seats_per_row,
            show_time_ids: Vec::new(),
        };
        self.working.halls.insert(hall.id, hall.clone());
        Ok(hall)
    }

    async fn update_hall(&mut self, hall: &Hall) -> StoreResult<()> {
        if self
            .working
            .halls
            .values()
            .any(|h| h.id != hall.id && h.name == hall.name)
        {
            return Err(StoreError::Constraint(format!("hall name '{}' is taken", hall.name)));
        }
        if let Some(stored) = self.working.halls.get_mut(&hall.id) {
            stored.name = hall.name.clone();
            stored.rows = hall.rows;
            stored.seats_per_row = hall.seats_per_row;
        }
        Ok(())
    }

    async fn delete_hall(&mut self, hall_id: ObjectId) -> StoreResult<()> {
        self.working.halls.remove(&hall_id);
        Ok(())
    }

    async fn insert_seats(&mut self, hall_id: ObjectId, positions: &[SeatPosition]) -> StoreResult<Vec<Seat>> {
        let mut taken: HashSet<SeatPosition> = self
            .working
            .seats
            .values()
            .filter(|s| s.hall_id == hall_id)
            .map(Seat::position)
            .collect();
        let mut inserted = Vec::with_capacity(positions.len());
        for position in positions {
            if !taken.insert(*position) {
                return Err(StoreError::Constraint(format!(
                    "seat {}-{} already exists in hall {hall_id}",
                    position.row_number, position.seat_number
                )));
            }
            let seat = Seat {
                id: ObjectId::new(),
                hall_id,
                row_number: position.row_number,
                seat_number: position.seat_number,
            };
            self.working.seats.insert(seat.id, seat.clone());
            inserted.push(seat);
        }
        Ok(inserted)
    }

    async fn delete_seats(&mut self, hall_id: ObjectId) -> StoreResult<u64> {
        let removed: HashSet<ObjectId> = self
            .working
            .seats
            .values()
            .filter(|s| s.hall_id == hall_id)
            .map(|s| s.id)
            .collect();
        self.working.seats.retain(|id, _| !removed.contains(id));
        for reservation in self.working.reservations.values_mut() {
            reservation.seats.retain(|rs| !removed.contains(&rs.seat_id));
        }
        Ok(removed.len() as u64)
    }

    async fn insert_movie(&mut self, movie: NewMovie) -> StoreResult<Movie> {
        if self.working.movies.values().any(|m| m.title == movie.title) {
            return Err(StoreError::Constraint(format!("movie title '{}' is taken", movie.title)));
        }
        let movie = Movie {
            id: ObjectId::new(),
            title: movie.title,
            description: movie.description,
            genre: movie.genre,
            duration_minutes: movie.duration_minutes,
            release_date: movie.release_date,
            age_rating: movie.age_rating,
            show_time_ids: Vec::new(),
        };
        self.working.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn delete_movie(&mut self, movie_id: ObjectId) -> StoreResult<()> {
        self.working.movies.remove(&movie_id);
        Ok(())
    }

    async fn insert_show_time(&mut self, show_time: NewShowTime) -> StoreResult<ShowTime> {
        let show_time = ShowTime {
            id: ObjectId::new(),
            movie_id: show_time.movie_id,
            hall_id: show_time.hall_id,
            start_time: show_time.start_time,
            end_time: show_time.end_time,
            price: show_time.price,
        };
        self.working.show_times.insert(show_time.id, show_time.clone());
        Ok(show_time)
    }

    async fn update_show_time(&mut self, show_time: &ShowTime) -> StoreResult<()> {
        self.working.show_times.insert(show_time.id, show_time.clone());
        Ok(())
    }

    async fn delete_show_time(&mut self, show_time_id: ObjectId) -> StoreResult<()> {
        self.working.show_times.remove(&show_time_id);
        self.working
            .reservations
            .retain(|_, r| r.show_time_id != show_time_id);
        Ok(())
    }

    async fn attach_show_time(&mut self, owner: Owner, show_time_id: ObjectId) -> StoreResult<()> {
        if let Some(index) = self.working.index_of(owner) {
            if !index.contains(&show_time_id) {
                index.push(show_time_id);
            }
        }
        Ok(())
    }

    async fn detach_show_time(&mut self, owner: Owner, show_time_id: ObjectId) -> StoreResult<()> {
        if let Some(index) = self.working.index_of(owner) {
            index.retain(|id| *id != show_time_id);
        }
        Ok(())
    }

    async fn insert_reservation(&mut self, reservation: NewReservation) -> StoreResult<Reservation> {
        if !self.working.show_times.contains_key(&reservation.show_time_id) {
            return Err(StoreError::Constraint(format!(
                "show time {} does not exist",
                reservation.show_time_id
            )));
        }
        let mut seen = HashSet::new();
        for seat_id in &reservation.seat_ids {
            if !self.working.seats.contains_key(seat_id) {
                return Err(StoreError::Constraint(format!("seat {seat_id} does not exist")));
            }
            if !seen.insert(*seat_id) {
                return Err(StoreError::Constraint(format!(
                    "seat {seat_id} is listed twice in one reservation"
                )));
            }
        }
        let reservation = Reservation {
            id: ObjectId::new(),
            user_id: reservation.user_id,
            show_time_id: reservation.show_time_id,
            created_at: Utc::now(),
            status: ReservationStatus::Active,
            seats: reservation
                .seat_ids
                .into_iter()
                .map(|seat_id| ReservedSeat { seat_id })
                .collect(),
        };
        self.working.reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn delete_reservation(&mut self, reservation_id: ObjectId) -> StoreResult<()> {
        self.working.reservations.remove(&reservation_id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
