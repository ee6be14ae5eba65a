//! Persistence boundary for halls, seats, movies, show times and reservations.
//!
//! Reads that need no isolation go through [`CinemaStore`] directly. Every
//! mutation runs inside a [`CatalogTx`] obtained from [`CinemaStore::begin`]:
//! the occupancy read and the writes that depend on it share one unit of work,
//! and dropping the unit without calling [`CatalogTx::commit`] discards all of
//! its writes.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::StoreError;
use crate::models::{
    hall_model::{Hall, NewHall, Seat},
    movie_model::{Movie, NewMovie},
    reservation_model::{NewReservation, Reservation},
    show_time_model::{NewShowTime, ShowTime, ShowTimeFilter},
};
use crate::scheduling::SeatPosition;

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Holder of a show-time index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Hall(ObjectId),
    Movie(ObjectId),
}

#[async_trait]
pub trait CinemaStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTx>>;

    async fn find_hall(&self, id: ObjectId) -> StoreResult<Option<Hall>>;
    async fn find_movie(&self, id: ObjectId) -> StoreResult<Option<Movie>>;
    async fn find_show_time(&self, id: ObjectId) -> StoreResult<Option<ShowTime>>;

    /// Halls ordered by name.
    async fn list_halls(&self) -> StoreResult<Vec<Hall>>;
    /// Movies ordered by title.
    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;
    /// Show times matching `filter`, ordered by start time.
    async fn list_show_times(&self, filter: ShowTimeFilter) -> StoreResult<Vec<ShowTime>>;
    /// Seats of a hall ordered by row, then seat number.
    async fn hall_seats(&self, hall_id: ObjectId) -> StoreResult<Vec<Seat>>;
    async fn show_time_reservations(&self, show_time_id: ObjectId) -> StoreResult<Vec<Reservation>>;
}

#[async_trait]
pub trait CatalogTx: Send {
    async fn find_hall(&mut self, id: ObjectId) -> StoreResult<Option<Hall>>;
    async fn find_hall_by_name(&mut self, name: &str) -> StoreResult<Option<Hall>>;
    async fn find_movie(&mut self, id: ObjectId) -> StoreResult<Option<Movie>>;
    async fn find_movie_by_title(&mut self, title: &str) -> StoreResult<Option<Movie>>;
    async fn find_show_time(&mut self, id: ObjectId) -> StoreResult<Option<ShowTime>>;

    /// The show times indexed by `hall`. Claims the hall for this unit of
    /// work so a concurrent scheduler on the same hall cannot also commit.
    async fn load_schedule(&mut self, hall: &Hall) -> StoreResult<Vec<ShowTime>>;
    async fn movie_show_times(&mut self, movie: &Movie) -> StoreResult<Vec<ShowTime>>;

    async fn insert_hall(&mut self, hall: NewHall) -> StoreResult<Hall>;
    async fn update_hall(&mut self, hall: &Hall) -> StoreResult<()>;
    async fn delete_hall(&mut self, hall_id: ObjectId) -> StoreResult<()>;

    async fn insert_seats(&mut self, hall_id: ObjectId, positions: &[SeatPosition]) -> StoreResult<Vec<Seat>>;
    /// Removes every seat of the hall and the reserved-seat rows pointing at
    /// them. Returns the number of seats removed.
    async fn delete_seats(&mut self, hall_id: ObjectId) -> StoreResult<u64>;

    async fn insert_movie(&mut self, movie: NewMovie) -> StoreResult<Movie>;
    async fn delete_movie(&mut self, movie_id: ObjectId) -> StoreResult<()>;

    async fn insert_show_time(&mut self, show_time: NewShowTime) -> StoreResult<ShowTime>;
    async fn update_show_time(&mut self, show_time: &ShowTime) -> StoreResult<()>;
    /// Removes the show time and every reservation made for it.
    async fn delete_show_time(&mut self, show_time_id: ObjectId) -> StoreResult<()>;

    async fn attach_show_time(&mut self, owner: Owner, show_time_id: ObjectId) -> StoreResult<()>;
    async fn detach_show_time(&mut self, owner: Owner, show_time_id: ObjectId) -> StoreResult<()>;

    async fn insert_reservation(&mut self, reservation: NewReservation) -> StoreResult<Reservation>;
    async fn delete_reservation(&mut self, reservation_id: ObjectId) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
