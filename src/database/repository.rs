use futures::stream::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use mongodb::options::FindOptions;
use mongodb::Collection;

use crate::database::movie::Movie;
use crate::database::store::{Store, StoreError};

/// How many documents the featured and top-rated views return.
const SHOWCASE_LIMIT: i64 = 5;

/// Optional predicates for the filtered listing. Absent fields are no-ops;
/// present fields combine conjunctively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieFilter {
    pub genres: Option<Vec<String>>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
}

impl MovieFilter {
    /// Compile the filter into a MongoDB query document.
    pub fn to_document(&self) -> Document {
        let mut query = Document::new();
        if let Some(genres) = &self.genres {
            // $in matches scalar genres as well as array-valued ones.
            query.insert("genre", doc! { "$in": genres.clone() });
        }
        let mut rating = Document::new();
        if let Some(min) = self.min_rating {
            rating.insert("$gte", min);
        }
        if let Some(max) = self.max_rating {
            rating.insert("$lte", max);
        }
        if !rating.is_empty() {
            query.insert("rating", rating);
        }
        query
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistAction {
    Added,
    Removed,
}

/// Outcome of a watchlist toggle: what happened, and the membership after.
#[derive(Debug, Clone)]
pub struct WatchlistUpdate {
    pub action: WatchlistAction,
    pub watchlist: Vec<String>,
}

/// Domain queries and updates over the movies collection.
#[derive(Clone)]
pub struct MovieRepository {
    movies: Collection<Movie>,
    raw: Collection<Document>,
}

impl MovieRepository {
    pub fn new(store: &Store) -> Self {
        Self {
            movies: store.movies(),
            raw: store.movies_raw(),
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Movie>, StoreError> {
        let cursor = self.movies.find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn list_filtered(&self, filter: &MovieFilter) -> Result<Vec<Movie>, StoreError> {
        let cursor = self.movies.find(filter.to_document(), None).await?;
        Ok(cursor.try_collect().await?)
    }

    /// First few documents in store-default order.
    pub async fn list_featured(&self) -> Result<Vec<Movie>, StoreError> {
        let options = FindOptions::builder().limit(SHOWCASE_LIMIT).build();
        let cursor = self.movies.find(None, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn list_top_rated(&self) -> Result<Vec<Movie>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "rating": -1 })
            .limit(SHOWCASE_LIMIT)
            .build();
        let cursor = self.movies.find(None, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn get(&self, id: ObjectId) -> Result<Movie, StoreError> {
        self.movies
            .find_one(doc! { "_id": id }, None)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Insert a client document as-is, assigning a fresh identifier. Any
    /// client-supplied `_id` is discarded.
    pub async fn insert(&self, mut document: Document) -> Result<ObjectId, StoreError> {
        let id = ObjectId::new();
        document.insert("_id", id);
        self.raw.insert_one(document, None).await?;
        Ok(id)
    }

    /// Merge `patch` into an existing document, field by field. Fails with
    /// `Forbidden` unless `requester` created the record.
    pub async fn update(
        &self,
        id: ObjectId,
        patch: Document,
        requester: &str,
    ) -> Result<(), StoreError> {
        let movie = self.get(id).await?;
        if !movie.is_owned_by(requester) {
            return Err(StoreError::Forbidden);
        }

        let patch = sanitize_patch(patch);
        if patch.is_empty() {
            // Nothing left to set; an empty $set is a server error.
            return Ok(());
        }
        self.raw
            .update_one(doc! { "_id": id }, doc! { "$set": patch }, None)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: ObjectId, requester: &str) -> Result<(), StoreError> {
        let movie = self.get(id).await?;
        if !movie.is_owned_by(requester) {
            return Err(StoreError::Forbidden);
        }
        self.raw.delete_one(doc! { "_id": id }, None).await?;
        Ok(())
    }

    pub async fn list_by_owner(&self, requester: &str) -> Result<Vec<Movie>, StoreError> {
        let cursor = self.movies.find(doc! { "addedBy": requester }, None).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Flip `user_email`'s membership in the movie's watchlist.
    ///
    /// The write is an atomic $addToSet/$pull rather than an array replace,
    /// so concurrent toggles by different users cannot erase each other.
    pub async fn toggle_watchlist(
        &self,
        id: ObjectId,
        user_email: &str,
    ) -> Result<WatchlistUpdate, StoreError> {
        let movie = self.get(id).await?;
        let (action, watchlist) = toggle(&movie.watchlist, user_email);

        let update = match action {
            WatchlistAction::Added => doc! { "$addToSet": { "watchlist": user_email } },
            WatchlistAction::Removed => doc! { "$pull": { "watchlist": user_email } },
        };
        self.raw.update_one(doc! { "_id": id }, update, None).await?;

        Ok(WatchlistUpdate { action, watchlist })
    }

    /// Number of distinct users who have added at least one movie.
    pub async fn count_contributors(&self) -> Result<u64, StoreError> {
        let owners = self.movies.distinct("addedBy", None, None).await?;
        Ok(owners.len() as u64)
    }
}

/// Strip fields a client must not overwrite through an update payload.
pub fn sanitize_patch(mut patch: Document) -> Document {
    patch.remove("addedBy");
    patch.remove("userId");
    patch.remove("_id");
    patch
}

/// Decide the toggle action and the membership that results from it.
pub fn toggle(watchlist: &[String], user: &str) -> (WatchlistAction, Vec<String>) {
    if watchlist.iter().any(|entry| entry == user) {
        let remaining = watchlist
            .iter()
            .filter(|entry| entry.as_str() != user)
            .cloned()
            .collect();
        (WatchlistAction::Removed, remaining)
    } else {
        let mut grown = watchlist.to_vec();
        grown.push(user.to_string());
        (WatchlistAction::Added, grown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_filter_compiles_to_match_all() {
        assert_eq!(MovieFilter::default().to_document(), Document::new());
    }

    #[test]
    fn genre_filter_uses_in_operator() {
        let filter = MovieFilter {
            genres: Some(strings(&["Drama", "Crime"])),
            ..Default::default()
        };
        assert_eq!(
            filter.to_document(),
            doc! { "genre": { "$in": ["Drama", "Crime"] } }
        );
    }

    #[test]
    fn rating_bounds_share_one_clause() {
        let filter = MovieFilter {
            min_rating: Some(8.0),
            max_rating: Some(9.0),
            ..Default::default()
        };
        assert_eq!(
            filter.to_document(),
            doc! { "rating": { "$gte": 8.0, "$lte": 9.0 } }
        );
    }

    #[test]
    fn filters_combine_conjunctively() {
        let filter = MovieFilter {
            genres: Some(strings(&["Drama"])),
            min_rating: Some(7.0),
            max_rating: None,
        };
        let query = filter.to_document();
        assert_eq!(query.len(), 2);
        assert_eq!(query.get_document("rating").unwrap(), &doc! { "$gte": 7.0 });
    }

    #[test]
    fn sanitize_strips_protected_fields_only() {
        let patch = sanitize_patch(doc! {
            "rating": 8.0,
            "addedBy": "intruder",
            "userId": "u2",
            "_id": "0123456789abcdef01234567",
        });
        assert_eq!(patch, doc! { "rating": 8.0 });
    }

    #[test]
    fn sanitize_can_leave_nothing_behind() {
        assert!(sanitize_patch(doc! { "userId": "u1" }).is_empty());
    }

    #[test]
    fn toggle_adds_absent_user() {
        let (action, next) = toggle(&strings(&["bob@x.com"]), "alice@x.com");
        assert_eq!(action, WatchlistAction::Added);
        assert_eq!(next, strings(&["bob@x.com", "alice@x.com"]));
    }

    #[test]
    fn toggle_removes_present_user() {
        let (action, next) = toggle(&strings(&["alice@x.com", "bob@x.com"]), "alice@x.com");
        assert_eq!(action, WatchlistAction::Removed);
        assert_eq!(next, strings(&["bob@x.com"]));
    }

    #[test]
    fn toggling_twice_restores_membership() {
        let start = strings(&["bob@x.com"]);
        let (_, once) = toggle(&start, "alice@x.com");
        let (_, twice) = toggle(&once, "alice@x.com");

        let mut expected = start.clone();
        expected.sort();
        let mut actual = twice;
        actual.sort();
        assert_eq!(actual, expected);
    }
}
