pub mod movie;
pub mod repository;
pub mod store;

pub use movie::Movie;
pub use repository::{MovieFilter, MovieRepository, WatchlistAction, WatchlistUpdate};
pub use store::{Store, StoreError};
