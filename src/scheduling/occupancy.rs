use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::models::{hall_model::Hall, show_time_model::ShowTime};

/// A hall together with the show times it currently hosts, as loaded inside
/// one unit of work.
#[derive(Debug, Clone)]
pub struct HallSchedule {
    pub hall: Hall,
    pub show_times: Vec<ShowTime>,
}

impl HallSchedule {
    pub fn new(hall: Hall, show_times: Vec<ShowTime>) -> Self {
        HallSchedule { hall, show_times }
    }

    /// Show times overlapping `[start_time, end_time)`, skipping `exclude`.
    pub fn conflicts<'a>(
        &'a self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude: Option<ObjectId>,
    ) -> impl Iterator<Item = &'a ShowTime> + 'a {
        self.show_times.iter().filter(move |other| {
            Some(other.id) != exclude && other.overlaps_with(start_time, end_time)
        })
    }

    pub fn is_occupied_during(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        exclude: Option<ObjectId>,
    ) -> bool {
        self.conflicts(start_time, end_time, exclude).next().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 14, hour, minute, 0).unwrap()
    }

    fn hall() -> Hall {
        Hall {
            id: ObjectId::new(),
            name: "Hall A".into(),
            rows: 5,
            seats_per_row: 10,
            show_time_ids: Vec::new(),
        }
    }

    fn screening(hall: &Hall, start: DateTime<Utc>, end: DateTime<Utc>) -> ShowTime {
        ShowTime {
            id: ObjectId::new(),
            movie_id: ObjectId::new(),
            hall_id: hall.id,
            start_time: start,
            end_time: end,
            price: Decimal::TEN,
        }
    }

    fn schedule_with(windows: &[(DateTime<Utc>, DateTime<Utc>)]) -> HallSchedule {
        let hall = hall();
        let show_times = windows.iter().map(|(s, e)| screening(&hall, *s, *e)).collect();
        HallSchedule::new(hall, show_times)
    }

    #[test]
    fn empty_hall_is_free() {
        let schedule = schedule_with(&[]);
        assert!(!schedule.is_occupied_during(at(10, 0), at(12, 0), None));
    }

    #[test]
    fn touching_endpoints_do_not_conflict() {
        let schedule = schedule_with(&[(at(10, 0), at(12, 0))]);
        assert!(!schedule.is_occupied_during(at(12, 0), at(13, 0), None));
        assert!(!schedule.is_occupied_during(at(8, 0), at(10, 0), None));
    }

    #[test]
    fn one_minute_overlap_conflicts() {
        let schedule = schedule_with(&[(at(10, 0), at(12, 0))]);
        assert!(schedule.is_occupied_during(at(11, 59), at(13, 0), None));
    }

    #[test]
    fn containment_in_either_direction_conflicts() {
        let schedule = schedule_with(&[(at(10, 0), at(12, 0))]);
        assert!(schedule.is_occupied_during(at(10, 30), at(11, 0), None));
        assert!(schedule.is_occupied_during(at(9, 0), at(13, 0), None));
    }

    #[test]
    fn excluded_show_time_never_conflicts_with_itself() {
        let schedule = schedule_with(&[(at(10, 0), at(12, 0))]);
        let own = schedule.show_times[0].id;
        assert!(!schedule.is_occupied_during(at(10, 0), at(12, 0), Some(own)));
        assert!(!schedule.is_occupied_during(at(11, 0), at(13, 0), Some(own)));
    }

    #[test]
    fn exclusion_only_skips_the_named_show_time() {
        let schedule = schedule_with(&[(at(10, 0), at(12, 0)), (at(13, 0), at(15, 0))]);
        let first = schedule.show_times[0].id;
        assert!(schedule.is_occupied_during(at(11, 0), at(14, 0), Some(first)));
        let conflicts: Vec<_> = schedule.conflicts(at(11, 0), at(14, 0), Some(first)).collect();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].start_time, at(13, 0));
    }
}
