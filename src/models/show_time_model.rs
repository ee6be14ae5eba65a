use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::AppError;
use crate::utils::{parse_object_id, serialize_object_id};

/// A scheduled screening of one movie in one hall over `[start_time, end_time)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowTime {
    pub id: ObjectId,
    pub movie_id: ObjectId,
    pub hall_id: ObjectId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Decimal,
}

impl ShowTime {
    /// Half-open overlap: touching endpoints do not overlap.
    pub fn overlaps_with(&self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> bool {
        self.start_time < end_time && self.end_time > start_time
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> ScreeningStatus {
        if now < self.start_time {
            ScreeningStatus::Upcoming
        } else if now < self.end_time {
            ScreeningStatus::Ongoing
        } else {
            ScreeningStatus::Finished
        }
    }
}

/// A show time that has not been validated or persisted yet.
#[derive(Debug, Clone)]
pub struct NewShowTime {
    pub movie_id: ObjectId,
    pub hall_id: ObjectId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningStatus {
    Upcoming,
    Ongoing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowTimeFilter {
    All,
    Movie(ObjectId),
    Hall(ObjectId),
    /// Show times starting within the UTC day.
    Day(NaiveDate),
}

impl ShowTimeFilter {
    pub fn matches(&self, show_time: &ShowTime) -> bool {
        match self {
            ShowTimeFilter::All => true,
            ShowTimeFilter::Movie(movie_id) => show_time.movie_id == *movie_id,
            ShowTimeFilter::Hall(hall_id) => show_time.hall_id == *hall_id,
            ShowTimeFilter::Day(date) => {
                let (from, to) = day_bounds(*date);
                show_time.start_time >= from && show_time.start_time < to
            }
        }
    }
}

/// `[date 00:00, date+1 00:00)` in UTC.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = date.and_time(chrono::NaiveTime::MIN).and_utc();
    (from, from + chrono::Duration::days(1))
}

fn positive_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price <= Decimal::ZERO {
        return Err(ValidationError::new("price_not_positive"));
    }
    Ok(())
}

fn in_future(time: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *time <= Utc::now() {
        return Err(ValidationError::new("not_in_future"));
    }
    Ok(())
}

/// Body of both the create and the update request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShowTimeRequest {
    pub movie_id: String,
    pub hall_id: String,
    #[validate(custom(function = "in_future"))]
    pub start_time: DateTime<Utc>,
    #[validate(custom(function = "in_future"))]
    pub end_time: DateTime<Utc>,
    #[validate(custom(function = "positive_price"))]
    pub price: Decimal,
}

impl ShowTimeRequest {
    pub fn into_new_show_time(self) -> Result<NewShowTime, AppError> {
        self.validate()?;
        Ok(NewShowTime {
            movie_id: parse_object_id(&self.movie_id)?,
            hall_id: parse_object_id(&self.hall_id)?,
            start_time: self.start_time,
            end_time: self.end_time,
            price: self.price,
        })
    }
}

/// Denormalized view of a show time with its movie and hall names.
#[derive(Debug, Clone, Serialize)]
pub struct ShowTimeResponse {
    #[serde(serialize_with = "serialize_object_id")]
    pub id: ObjectId,
    #[serde(serialize_with = "serialize_object_id")]
    pub movie_id: ObjectId,
    pub movie_title: String,
    #[serde(serialize_with = "serialize_object_id")]
    pub hall_id: ObjectId,
    pub hall_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub price: Decimal,
    pub status: ScreeningStatus,
}
