use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

/// One seat held by a reservation. `(reservation, seat_id)` is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedSeat {
    pub seat_id: ObjectId,
}

/// A user's booking for one show time. Owned by the show time: removing the
/// show time removes the reservation, and removing a seat removes the
/// reserved-seat rows pointing at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub show_time_id: ObjectId,
    pub created_at: DateTime<Utc>,
    pub status: ReservationStatus,
    pub seats: Vec<ReservedSeat>,
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub user_id: ObjectId,
    pub show_time_id: ObjectId,
    pub seat_ids: Vec<ObjectId>,
}
