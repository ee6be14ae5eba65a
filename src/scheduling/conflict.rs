use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use super::occupancy::HallSchedule;
use crate::error::{CinemaError, CinemaResult};

/// Checks a requested window against a hall schedule.
///
/// The range check always runs first, so a reversed window is reported as
/// [`CinemaError::InvalidTimeRange`] even when it would also overlap. Create
/// passes `exclude = None`; update passes the id of the show time being
/// edited so it never collides with its own stored window.
pub fn validate_show_time(
    schedule: &HallSchedule,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    exclude: Option<ObjectId>,
) -> CinemaResult<()> {
    validate_end_after_start(start_time, end_time)?;
    validate_no_conflict(schedule, start_time, end_time, exclude)
}

fn validate_end_after_start(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> CinemaResult<()> {
    if end_time <= start_time {
        return Err(CinemaError::InvalidTimeRange {
            start: start_time,
            end: end_time,
        });
    }
    Ok(())
}

fn validate_no_conflict(
    schedule: &HallSchedule,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    exclude: Option<ObjectId>,
) -> CinemaResult<()> {
    if schedule.is_occupied_during(start_time, end_time, exclude) {
        return Err(CinemaError::ScheduleConflict {
            hall_name: schedule.hall.name.clone(),
            start: start_time,
            end: end_time,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{hall_model::Hall, show_time_model::ShowTime};
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 14, hour, minute, 0).unwrap()
    }

    fn schedule() -> HallSchedule {
        let hall = Hall {
            id: ObjectId::new(),
            name: "Hall A".into(),
            rows: 5,
            seats_per_row: 10,
            show_time_ids: Vec::new(),
        };
        let existing = ShowTime {
            id: ObjectId::new(),
            movie_id: ObjectId::new(),
            hall_id: hall.id,
            start_time: at(10, 0),
            end_time: at(12, 0),
            price: Decimal::TEN,
        };
        HallSchedule::new(hall, vec![existing])
    }

    #[test]
    fn accepts_free_window() {
        assert!(validate_show_time(&schedule(), at(12, 0), at(13, 0), None).is_ok());
    }

    #[test]
    fn rejects_overlap_with_hall_name() {
        let err = validate_show_time(&schedule(), at(11, 59), at(13, 0), None).unwrap_err();
        match err {
            CinemaError::ScheduleConflict { hall_name, start, end } => {
                assert_eq!(hall_name, "Hall A");
                assert_eq!(start, at(11, 59));
                assert_eq!(end, at(13, 0));
            }
            other => panic!("expected schedule conflict, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_window() {
        let err = validate_show_time(&schedule(), at(14, 0), at(14, 0), None).unwrap_err();
        assert!(matches!(err, CinemaError::InvalidTimeRange { .. }));
    }

    #[test]
    fn range_check_runs_before_conflict_check() {
        // reversed and overlapping the 10:00-12:00 screening
        let err = validate_show_time(&schedule(), at(11, 30), at(10, 30), None).unwrap_err();
        assert!(matches!(err, CinemaError::InvalidTimeRange { .. }));
    }

    #[test]
    fn revalidating_a_show_time_against_itself_succeeds() {
        let schedule = schedule();
        let own = &schedule.show_times[0];
        assert!(validate_show_time(&schedule, own.start_time, own.end_time, Some(own.id)).is_ok());
    }
}
