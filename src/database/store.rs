use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::movie::Movie;

/// Errors surfaced by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("requester does not own this record")]
    Forbidden,

    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),
}

/// Handle to the backing document store.
///
/// Constructed once at startup and shared by reference through the router
/// state. The driver connects lazily, so an unreachable server does not keep
/// the HTTP listener from coming up; affected requests fail individually.
#[derive(Clone)]
pub struct Store {
    db: Database,
    collection: String,
}

impl Store {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        if let Some(app_name) = &config.app_name {
            options.app_name = Some(app_name.clone());
        }
        let client = Client::with_options(options)?;
        let db = client.database(&config.database);
        info!(database = %config.database, collection = %config.collection, "store handle ready");
        Ok(Self {
            db,
            collection: config.collection.clone(),
        })
    }

    /// Typed handle to the movies collection.
    pub fn movies(&self) -> Collection<Movie> {
        self.db.collection(&self.collection)
    }

    /// Untyped handle to the same collection, for schema-agnostic writes.
    pub fn movies_raw(&self) -> Collection<Document> {
        self.db.collection(&self.collection)
    }

    /// Round-trip to the server. Used by the health endpoint only.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
