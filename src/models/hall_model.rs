use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::scheduling::seat_grid::SeatPosition;
use crate::utils::{not_blank, serialize_object_id};

/// A screening room. Seats and show times live in their own tables and are
/// reachable through `hall_id`; `show_time_ids` is the hall's index of the
/// show times it hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hall {
    pub id: ObjectId,
    pub name: String,
    pub rows: u32,
    pub seats_per_row: u32,
    pub show_time_ids: Vec<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct NewHall {
    pub name: String,
    pub rows: u32,
    pub seats_per_row: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub id: ObjectId,
    pub hall_id: ObjectId,
    pub row_number: u32,
    pub seat_number: u32,
}

impl Seat {
    pub fn position(&self) -> SeatPosition {
        SeatPosition {
            row_number: self.row_number,
            seat_number: self.seat_number,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HallRequest {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(range(min = 1, max = 100, message = "rows must be between 1 and 100"))]
    pub rows: u32,
    #[validate(range(min = 1, max = 100, message = "seats_per_row must be between 1 and 100"))]
    pub seats_per_row: u32,
}

impl HallRequest {
    pub fn into_new_hall(self) -> NewHall {
        NewHall {
            name: self.name.trim().to_string(),
            rows: self.rows,
            seats_per_row: self.seats_per_row,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatResponse {
    pub row_number: u32,
    pub seat_number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct HallResponse {
    #[serde(serialize_with = "serialize_object_id")]
    pub id: ObjectId,
    pub name: String,
    pub rows: u32,
    pub seats_per_row: u32,
    pub seats: Vec<SeatResponse>,
}

impl HallResponse {
    pub fn of(hall: &Hall, seats: &[Seat]) -> Self {
        HallResponse {
            id: hall.id,
            name: hall.name.clone(),
            rows: hall.rows,
            seats_per_row: hall.seats_per_row,
            seats: seats
                .iter()
                .map(|seat| SeatResponse {
                    row_number: seat.row_number,
                    seat_number: seat.seat_number,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(rows: u32, seats_per_row: u32) -> HallRequest {
        HallRequest {
            name: "Hall A".into(),
            rows,
            seats_per_row,
        }
    }

    #[test]
    fn grid_dimensions_are_bounded() {
        assert!(request(100, 100).validate().is_ok());
        assert!(request(101, 10).validate().is_err());
        assert!(request(10, 101).validate().is_err());
        assert!(request(u32::MAX, u32::MAX).validate().is_err());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut blank = request(5, 10);
        blank.name = "   ".into();
        assert!(blank.validate().is_err());
    }
}
