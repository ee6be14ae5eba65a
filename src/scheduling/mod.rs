//! Hall occupancy and seat layout rules shared by the hall and show-time
//! services.

pub mod conflict;
pub mod occupancy;
pub mod seat_grid;

pub use conflict::validate_show_time;
pub use occupancy::HallSchedule;
pub use seat_grid::{generate_seats, SeatPosition};
