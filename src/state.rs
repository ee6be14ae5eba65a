use std::sync::Arc;

use tokio::sync::Mutex;

use crate::services::{HallService, MovieService, ShowTimeService};
use crate::store::CinemaStore;
use crate::websockets::LiveFeed;

/// Shared by every handler through an `Extension` layer.
#[derive(Clone)]
pub struct AppState {
    pub halls: HallService,
    pub movies: MovieService,
    pub show_times: ShowTimeService,
    pub live: Arc<Mutex<LiveFeed>>,
}

impl AppState {
    pub fn new(store: Arc<dyn CinemaStore>) -> Self {
        AppState {
            halls: HallService::new(store.clone()),
            movies: MovieService::new(store.clone()),
            show_times: ShowTimeService::new(store),
            live: Arc::new(Mutex::new(LiveFeed::new())),
        }
    }
}
