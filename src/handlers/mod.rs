use std::sync::Arc;

use crate::database::{MovieRepository, Store};

pub mod movies;
pub mod users;

/// Shared router state: the store handle plus the repository built over it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub movies: Arc<MovieRepository>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        let movies = MovieRepository::new(&store);
        Self {
            store: Arc::new(store),
            movies: Arc::new(movies),
        }
    }
}
