use async_trait::async_trait;
use chrono::{DateTime as ChronoDateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime, DateTime, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
    Client, ClientSession, Collection, Database, IndexModel, SessionCursor,
};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{CatalogTx, CinemaStore, Owner, StoreResult};
use crate::error::StoreError;
use crate::models::{
    hall_model::{Hall, NewHall, Seat},
    movie_model::{AgeRating, Movie, NewMovie},
    reservation_model::{NewReservation, Reservation, ReservationStatus, ReservedSeat},
    show_time_model::{day_bounds, NewShowTime, ShowTime, ShowTimeFilter},
};
use crate::scheduling::SeatPosition;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Serialize, Deserialize)]
struct HallDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    rows: u32,
    seats_per_row: u32,
    #[serde(default)]
    show_time_ids: Vec<ObjectId>,
    /// Bumped by every unit of work that schedules into the hall.
    #[serde(default)]
    revision: i64,
}

impl From<HallDocument> for Hall {
    fn from(doc: HallDocument) -> Self {
        Hall {
            id: doc.id,
            name: doc.name,
            rows: doc.rows,
            seats_per_row: doc.seats_per_row,
            show_time_ids: doc.show_time_ids,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SeatDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    hall_id: ObjectId,
    row_number: u32,
    seat_number: u32,
}

impl From<SeatDocument> for Seat {
    fn from(doc: SeatDocument) -> Self {
        Seat {
            id: doc.id,
            hall_id: doc.hall_id,
            row_number: doc.row_number,
            seat_number: doc.seat_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MovieDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    title: String,
    description: String,
    genre: String,
    duration_minutes: u32,
    release_date: NaiveDate,
    age_rating: AgeRating,
    #[serde(default)]
    show_time_ids: Vec<ObjectId>,
}

impl From<MovieDocument> for Movie {
    fn from(doc: MovieDocument) -> Self {
        Movie {
            id: doc.id,
            title: doc.title,
            description: doc.description,
            genre: doc.genre,
            duration_minutes: doc.duration_minutes,
            release_date: doc.release_date,
            age_rating: doc.age_rating,
            show_time_ids: doc.show_time_ids,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ShowTimeDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    movie_id: ObjectId,
    hall_id: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    start_time: ChronoDateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    end_time: ChronoDateTime<Utc>,
    price: Decimal,
}

impl From<ShowTimeDocument> for ShowTime {
    fn from(doc: ShowTimeDocument) -> Self {
        ShowTime {
            id: doc.id,
            movie_id: doc.movie_id,
            hall_id: doc.hall_id,
            start_time: doc.start_time,
            end_time: doc.end_time,
            price: doc.price,
        }
    }
}

impl From<&ShowTime> for ShowTimeDocument {
    fn from(show_time: &ShowTime) -> Self {
        ShowTimeDocument {
            id: show_time.id,
            movie_id: show_time.movie_id,
            hall_id: show_time.hall_id,
            start_time: show_time.start_time,
            end_time: show_time.end_time,
            price: show_time.price,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ReservedSeatDocument {
    seat_id: ObjectId,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReservationDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    user_id: ObjectId,
    show_time_id: ObjectId,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: ChronoDateTime<Utc>,
    status: ReservationStatus,
    seats: Vec<ReservedSeatDocument>,
}

impl From<ReservationDocument> for Reservation {
    fn from(doc: ReservationDocument) -> Self {
        Reservation {
            id: doc.id,
            user_id: doc.user_id,
            show_time_id: doc.show_time_id,
            created_at: doc.created_at,
            status: doc.status,
            seats: doc
                .seats
                .into_iter()
                .map(|s| ReservedSeat { seat_id: s.seat_id })
                .collect(),
        }
    }
}

fn halls(db: &Database) -> Collection<HallDocument> {
    db.collection("halls")
}

fn seats(db: &Database) -> Collection<SeatDocument> {
    db.collection("seats")
}

fn movies(db: &Database) -> Collection<MovieDocument> {
    db.collection("movies")
}

fn show_times(db: &Database) -> Collection<ShowTimeDocument> {
    db.collection("show_times")
}

fn reservations(db: &Database) -> Collection<ReservationDocument> {
    db.collection("reservations")
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY)),
        _ => false,
    }
}

fn write_error(err: MongoError) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Constraint(err.to_string())
    } else {
        StoreError::Database(err)
    }
}

fn show_time_query(filter: ShowTimeFilter) -> Document {
    match filter {
        ShowTimeFilter::All => doc! {},
        ShowTimeFilter::Movie(movie_id) => doc! { "movie_id": movie_id },
        ShowTimeFilter::Hall(hall_id) => doc! { "hall_id": hall_id },
        ShowTimeFilter::Day(date) => {
            let (from, to) = day_bounds(date);
            doc! {
                "start_time": {
                    "$gte": DateTime::from_chrono(from),
                    "$lt": DateTime::from_chrono(to),
                }
            }
        }
    }
}

fn index_collection(owner: Owner) -> (&'static str, ObjectId) {
    match owner {
        Owner::Hall(id) => ("halls", id),
        Owner::Movie(id) => ("movies", id),
    }
}

fn by_start_time() -> FindOptions {
    FindOptions::builder().sort(doc! { "start_time": 1, "_id": 1 }).build()
}

async fn drain<T>(mut cursor: SessionCursor<T>, session: &mut ClientSession) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut items = Vec::new();
    while let Some(item) = cursor.next(session).await {
        items.push(item?);
    }
    Ok(items)
}

/// MongoDB-backed store. Each unit of work is a session transaction, so the
/// deployment must be a replica set.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, database: &str) -> Self {
        let db = client.database(database);
        MongoStore { client, db }
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        halls(&self.db)
            .create_index(
                IndexModel::builder().keys(doc! { "name": 1 }).options(unique()).build(),
                None,
            )
            .await?;
        movies(&self.db)
            .create_index(
                IndexModel::builder().keys(doc! { "title": 1 }).options(unique()).build(),
                None,
            )
            .await?;
        seats(&self.db)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "hall_id": 1, "row_number": 1, "seat_number": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        show_times(&self.db)
            .create_index(
                IndexModel::builder().keys(doc! { "hall_id": 1, "start_time": 1 }).build(),
                None,
            )
            .await?;
        reservations(&self.db)
            .create_index(
                IndexModel::builder().keys(doc! { "show_time_id": 1 }).build(),
                None,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CinemaStore for MongoStore {
    async fn begin(&self) -> StoreResult<Box<dyn CatalogTx>> {
        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;
        Ok(Box::new(MongoTx {
            db: self.db.clone(),
            session,
        }))
    }

    async fn find_hall(&self, id: ObjectId) -> StoreResult<Option<Hall>> {
        Ok(halls(&self.db).find_one(doc! { "_id": id }, None).await?.map(Hall::from))
    }

    async fn find_movie(&self, id: ObjectId) -> StoreResult<Option<Movie>> {
        Ok(movies(&self.db).find_one(doc! { "_id": id }, None).await?.map(Movie::from))
    }

    async fn find_show_time(&self, id: ObjectId) -> StoreResult<Option<ShowTime>> {
        Ok(show_times(&self.db)
            .find_one(doc! { "_id": id }, None)
            .await?
            .map(ShowTime::from))
    }

    async fn list_halls(&self) -> StoreResult<Vec<Hall>> {
        let options = FindOptions::builder().sort(doc! { "name": 1 }).build();
        let cursor = halls(&self.db).find(doc! {}, options).await?;
        let docs: Vec<HallDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Hall::from).collect())
    }

    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let options = FindOptions::builder().sort(doc! { "title": 1 }).build();
        let cursor = movies(&self.db).find(doc! {}, options).await?;
        let docs: Vec<MovieDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Movie::from).collect())
    }

    async fn list_show_times(&self, filter: ShowTimeFilter) -> StoreResult<Vec<ShowTime>> {
        let cursor = show_times(&self.db)
            .find(show_time_query(filter), by_start_time())
            .await?;
        let docs: Vec<ShowTimeDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(ShowTime::from).collect())
    }

    async fn hall_seats(&self, hall_id: ObjectId) -> StoreResult<Vec<Seat>> {
        let options = FindOptions::builder()
            .sort(doc! { "row_number": 1, "seat_number": 1 })
            .build();
        let cursor = seats(&self.db).find(doc! { "hall_id": hall_id }, options).await?;
        let docs: Vec<SeatDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Seat::from).collect())
    }

    async fn show_time_reservations(&self, show_time_id: ObjectId) -> StoreResult<Vec<Reservation>> {
        let options = FindOptions::builder().sort(doc! { "created_at": 1 }).build();
        let cursor = reservations(&self.db)
            .find(doc! { "show_time_id": show_time_id }, options)
            .await?;
        let docs: Vec<ReservationDocument> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(Reservation::from).collect())
    }
}

/// A MongoDB session with an open transaction. Dropping it without commit
/// aborts the transaction.
pub struct MongoTx {
    db: Database,
    session: ClientSession,
}

impl MongoTx {
    async fn show_times_by_ids(&mut self, ids: Vec<ObjectId>) -> StoreResult<Vec<ShowTime>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let cursor = show_times(&self.db)
            .find_with_session(doc! { "_id": { "$in": ids } }, by_start_time(), &mut self.session)
            .await?;
        let docs = drain(cursor, &mut self.session).await?;
        Ok(docs.into_iter().map(ShowTime::from).collect())
    }
}

#[async_trait]
impl CatalogTx for MongoTx {
    async fn find_hall(&mut self, id: ObjectId) -> StoreResult<Option<Hall>> {
        let found = halls(&self.db)
            .find_one_with_session(doc! { "_id": id }, None, &mut self.session)
            .await?;
        Ok(found.map(Hall::from))
    }

    async fn find_hall_by_name(&mut self, name: &str) -> StoreResult<Option<Hall>> {
        let found = halls(&self.db)
            .find_one_with_session(doc! { "name": name }, None, &mut self.session)
            .await?;
        Ok(found.map(Hall::from))
    }

    async fn find_movie(&mut self, id: ObjectId) -> StoreResult<Option<Movie>> {
        let found = movies(&self.db)
            .find_one_with_session(doc! { "_id": id }, None, &mut self.session)
            .await?;
        Ok(found.map(Movie::from))
    }

    async fn find_movie_by_title(&mut self, title: &str) -> StoreResult<Option<Movie>> {
        let found = movies(&self.db)
            .find_one_with_session(doc! { "title": title }, None, &mut self.session)
            .await?;
        Ok(found.map(Movie::from))
    }

    async fn find_show_time(&mut self, id: ObjectId) -> StoreResult<Option<ShowTime>> {
        let found = show_times(&self.db)
            .find_one_with_session(doc! { "_id": id }, None, &mut self.session)
            .await?;
        Ok(found.map(ShowTime::from))
    }

    async fn load_schedule(&mut self, hall: &Hall) -> StoreResult<Vec<ShowTime>> {
        // Writing the hall document makes a concurrent scheduler on the same
        // hall fail with a write conflict instead of committing beside us.
        halls(&self.db)
            .update_one_with_session(
                doc! { "_id": hall.id },
                doc! { "$inc": { "revision": 1_i64 } },
                None,
                &mut self.session,
            )
            .await?;
        let ids = match self.find_hall(hall.id).await? {
            Some(current) => current.show_time_ids,
            None => return Ok(Vec::new()),
        };
        self.show_times_by_ids(ids).await
    }

    async fn movie_show_times(&mut self, movie: &Movie) -> StoreResult<Vec<ShowTime>> {
        let ids = match self.find_movie(movie.id).await? {
            Some(current) => current.show_time_ids,
            None => return Ok(Vec::new()),
        };
        self.show_times_by_ids(ids).await
    }

    async fn insert_hall(&mut self, hall: NewHall) -> StoreResult<Hall> {
        let doc = HallDocument {
            id: ObjectId::new(),
            name: hall.name,
            rows: hall.rows,
            seats_per_row: hall.seats_per_row,
            show_time_ids: Vec::new(),
            revision: 0,
        };
        halls(&self.db)
            .insert_one_with_session(&doc, None, &mut self.session)
            .await
            .map_err(write_error)?;
        Ok(Hall::from(doc))
    }

    async fn update_hall(&mut self, hall: &Hall) -> StoreResult<()> {
        halls(&self.db)
            .update_one_with_session(
                doc! { "_id": hall.id },
                doc! {
                    "$set": {
                        "name": hall.name.as_str(),
                        "rows": i64::from(hall.rows),
                        "seats_per_row": i64::from(hall.seats_per_row),
                    }
                },
                None,
                &mut self.session,
            )
            .await
            .map_err(write_error)?;
        Ok(())
    }

    async fn delete_hall(&mut self, hall_id: ObjectId) -> StoreResult<()> {
        halls(&self.db)
            .delete_one_with_session(doc! { "_id": hall_id }, None, &mut self.session)
            .await?;
        Ok(())
    }

    async fn insert_seats(&mut self, hall_id: ObjectId, positions: &[SeatPosition]) -> StoreResult<Vec<Seat>> {
        if positions.is_empty() {
            return Ok(Vec::new());
        }
        let docs: Vec<SeatDocument> = positions
            .iter()
            .map(|p| SeatDocument {
                id: ObjectId::new(),
                hall_id,
                row_number: p.row_number,
                seat_number: p.seat_number,
            })
            .collect();
        seats(&self.db)
            .insert_many_with_session(&docs, None, &mut self.session)
            .await
            .map_err(write_error)?;
        Ok(docs.into_iter().map(Seat::from).collect())
    }

    async fn delete_seats(&mut self, hall_id: ObjectId) -> StoreResult<u64> {
        let cursor = seats(&self.db)
            .find_with_session(doc! { "hall_id": hall_id }, None, &mut self.session)
            .await?;
        let seat_ids: Vec<ObjectId> = drain(cursor, &mut self.session)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if seat_ids.is_empty() {
            return Ok(0);
        }
        reservations(&self.db)
            .update_many_with_session(
                doc! { "seats.seat_id": { "$in": seat_ids.clone() } },
                doc! { "$pull": { "seats": { "seat_id": { "$in": seat_ids } } } },
                None,
                &mut self.session,
            )
            .await?;
        let result = seats(&self.db)
            .delete_many_with_session(doc! { "hall_id": hall_id }, None, &mut self.session)
            .await?;
        Ok(result.deleted_count)
    }

    async fn insert_movie(&mut self, movie: NewMovie) -> StoreResult<Movie> {
        let doc = MovieDocument {
            id: ObjectId::new(),
            title: movie.title,
            description: movie.description,
            genre: movie.genre,
            duration_minutes: movie.duration_minutes,
            release_date: movie.release_date,
            age_rating: movie.age_rating,
            show_time_ids: Vec::new(),
        };
        movies(&self.db)
            .insert_one_with_session(&doc, None, &mut self.session)
            .await
            .map_err(write_error)?;
        Ok(Movie::from(doc))
    }

    async fn delete_movie(&mut self, movie_id: ObjectId) -> StoreResult<()> {
        movies(&self.db)
            .delete_one_with_session(doc! { "_id": movie_id }, None, &mut self.session)
            .await?;
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
        show_times(&self.db)
            .insert_one_with_session(ShowTimeDocument::from(&show_time), None, &mut self.session)
            .await
            .map_err(write_error)?;
        Ok(show_time)
    }

    async fn update_show_time(&mut self, show_time: &ShowTime) -> StoreResult<()> {
        show_times(&self.db)
            .replace_one_with_session(
                doc! { "_id": show_time.id },
                ShowTimeDocument::from(show_time),
                None,
                &mut self.session,
            )
            .await?;
        Ok(())
    }

    async fn delete_show_time(&mut self, show_time_id: ObjectId) -> StoreResult<()> {
        reservations(&self.db)
            .delete_many_with_session(doc! { "show_time_id": show_time_id }, None, &mut self.session)
            .await?;
        show_times(&self.db)
            .delete_one_with_session(doc! { "_id": show_time_id }, None, &mut self.session)
            .await?;
        Ok(())
    }

    async fn attach_show_time(&mut self, owner: Owner, show_time_id: ObjectId) -> StoreResult<()> {
        let (collection, id) = index_collection(owner);
        self.db
            .collection::<Document>(collection)
            .update_one_with_session(
                doc! { "_id": id },
                doc! { "$addToSet": { "show_time_ids": show_time_id } },
                None,
                &mut self.session,
            )
            .await?;
        Ok(())
    }

    async fn detach_show_time(&mut self, owner: Owner, show_time_id: ObjectId) -> StoreResult<()> {
        let (collection, id) = index_collection(owner);
        self.db
            .collection::<Document>(collection)
            .update_one_with_session(
                doc! { "_id": id },
                doc! { "$pull": { "show_time_ids": show_time_id } },
                None,
                &mut self.session,
            )
            .await?;
        Ok(())
    }

    async fn insert_reservation(&mut self, reservation: NewReservation) -> StoreResult<Reservation> {
        if self.find_show_time(reservation.show_time_id).await?.is_none() {
            return Err(StoreError::Constraint(format!(
                "show time {} does not exist",
                reservation.show_time_id
            )));
        }
        let mut seat_docs = Vec::with_capacity(reservation.seat_ids.len());
        for seat_id in &reservation.seat_ids {
            if seat_docs.iter().any(|s: &ReservedSeatDocument| s.seat_id == *seat_id) {
                return Err(StoreError::Constraint(format!(
                    "seat {seat_id} is listed twice in one reservation"
                )));
            }
            seat_docs.push(ReservedSeatDocument { seat_id: *seat_id });
        }
        let doc = ReservationDocument {
            id: ObjectId::new(),
            user_id: reservation.user_id,
            show_time_id: reservation.show_time_id,
            created_at: Utc::now(),
            status: ReservationStatus::Active,
            seats: seat_docs,
        };
        reservations(&self.db)
            .insert_one_with_session(&doc, None, &mut self.session)
            .await
            .map_err(write_error)?;
        Ok(Reservation::from(doc))
    }

    async fn delete_reservation(&mut self, reservation_id: ObjectId) -> StoreResult<()> {
        reservations(&self.db)
            .delete_one_with_session(doc! { "_id": reservation_id }, None, &mut self.session)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut this = *self;
        this.session.commit_transaction().await?;
        Ok(())
    }
}
