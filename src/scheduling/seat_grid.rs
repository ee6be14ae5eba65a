use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeatPosition {
    pub row_number: u32,
    pub seat_number: u32,
}

/// Every seat of a `rows` x `seats_per_row` grid, row by row, both 1-based.
pub fn generate_seats(rows: u32, seats_per_row: u32) -> Vec<SeatPosition> {
    (1..=rows)
        .flat_map(|row_number| {
            (1..=seats_per_row).map(move |seat_number| SeatPosition {
                row_number,
                seat_number,
            })
        })
        .collect()
}
