use chrono::{NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::utils::{not_blank, serialize_object_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeRating {
    #[serde(rename = "AGE_0")]
    Age0,
    #[serde(rename = "AGE_7")]
    Age7,
    #[serde(rename = "AGE_12")]
    Age12,
    #[serde(rename = "AGE_16")]
    Age16,
    #[serde(rename = "AGE_18")]
    Age18,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub duration_minutes: u32,
    pub release_date: NaiveDate,
    pub age_rating: AgeRating,
    pub show_time_ids: Vec<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub genre: String,
    pub duration_minutes: u32,
    pub release_date: NaiveDate,
    pub age_rating: AgeRating,
}

fn past_or_present(date: &NaiveDate) -> Result<(), ValidationError> {
    if *date > Utc::now().date_naive() {
        return Err(ValidationError::new("release_date_in_future"));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MovieRequest {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    #[validate(custom(function = "not_blank"))]
    pub genre: String,
    #[validate(range(min = 1, message = "duration_minutes must be at least 1"))]
    pub duration_minutes: u32,
    #[validate(custom(function = "past_or_present"))]
    pub release_date: NaiveDate,
    pub age_rating: AgeRating,
}

impl MovieRequest {
    pub fn into_new_movie(self) -> NewMovie {
        NewMovie {
            title: self.title.trim().to_string(),
            description: self.description,
            genre: self.genre,
            duration_minutes: self.duration_minutes,
            release_date: self.release_date,
            age_rating: self.age_rating,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MovieResponse {
    #[serde(serialize_with = "serialize_object_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    pub genre: String,
    pub duration_minutes: u32,
    pub release_date: NaiveDate,
    pub age_rating: AgeRating,
}

impl From<&Movie> for MovieResponse {
    fn from(movie: &Movie) -> Self {
        MovieResponse {
            id: movie.id,
            title: movie.title.clone(),
            description: movie.description.clone(),
            genre: movie.genre.clone(),
            duration_minutes: movie.duration_minutes,
            release_date: movie.release_date,
            age_rating: movie.age_rating,
        }
    }
}
