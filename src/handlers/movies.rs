use axum::extract::{Path, Query, State};
use axum::Json;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use serde::Deserialize;
use serde_json::{json, Value};

use super::AppState;
use crate::database::{Movie, MovieFilter, WatchlistAction};
use crate::error::ApiError;

/// GET / - every movie, unfiltered
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<Movie>>, ApiError> {
    Ok(Json(state.movies.list_all().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieListQuery {
    /// Comma-separated genre labels.
    pub genres: Option<String>,
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
}

impl MovieListQuery {
    fn into_filter(self) -> Result<MovieFilter, ApiError> {
        Ok(MovieFilter {
            genres: self.genres.as_deref().and_then(parse_genres),
            min_rating: parse_rating(self.min_rating.as_deref(), "minRating")?,
            max_rating: parse_rating(self.max_rating.as_deref(), "maxRating")?,
        })
    }
}

/// GET /movies?genres=a,b&minRating=&maxRating= - filtered list
pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<MovieListQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let filter = query.into_filter()?;
    Ok(Json(state.movies.list_filtered(&filter).await?))
}

/// GET /movies/featured - first five in store order
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Movie>>, ApiError> {
    Ok(Json(state.movies.list_featured().await?))
}

/// GET /movies/top-rated - five highest rated
pub async fn top_rated(State(state): State<AppState>) -> Result<Json<Vec<Movie>>, ApiError> {
    Ok(Json(state.movies.list_top_rated().await?))
}

/// GET /movies/:id
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
    let id = parse_movie_id(&id)?;
    Ok(Json(state.movies.get(id).await?))
}

/// POST /movies/add - body is the full movie document
pub async fn add_movie(
    State(state): State<AppState>,
    Json(document): Json<Document>,
) -> Result<Json<Value>, ApiError> {
    let id = state.movies.insert(document).await?;
    Ok(Json(json!({ "message": "Movie added", "movieId": id.to_hex() })))
}

/// PUT /movies/update/:id - partial update; body must carry `userId`
pub async fn update_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Document>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_movie_id(&id)?;
    let requester = require_str(&body, "userId")?;
    state.movies.update(id, body, &requester).await?;
    Ok(Json(json!({ "message": "Movie updated" })))
}

/// DELETE /movies/delete/:id - body must carry `userId`
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Document>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_movie_id(&id)?;
    let requester = require_str(&body, "userId")?;
    state.movies.delete(id, &requester).await?;
    Ok(Json(json!({ "message": "Movie deleted" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionQuery {
    pub user_id: Option<String>,
}

/// GET /movies/my-collection?userId= - movies created by one user
pub async fn my_collection(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
) -> Result<Json<Vec<Movie>>, ApiError> {
    let owner = query
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;
    Ok(Json(state.movies.list_by_owner(&owner).await?))
}

/// PATCH /movies/:id/watchlist - body must carry `userEmail`
pub async fn toggle_watchlist(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Document>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_movie_id(&id)?;
    let user_email = require_str(&body, "userEmail")?;
    let update = state.movies.toggle_watchlist(id, &user_email).await?;

    let message = match update.action {
        WatchlistAction::Added => "Added to watchlist",
        WatchlistAction::Removed => "Removed from watchlist",
    };
    Ok(Json(json!({ "message": message, "watchlist": update.watchlist })))
}

fn parse_movie_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::bad_request("Invalid movie id"))
}

fn require_str(body: &Document, key: &str) -> Result<String, ApiError> {
    match body.get_str(key) {
        Ok(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ApiError::bad_request(format!("{} is required", key))),
    }
}

fn parse_genres(raw: &str) -> Option<Vec<String>> {
    if raw.is_empty() {
        return None;
    }
    Some(raw.split(',').map(str::to_string).collect())
}

fn parse_rating(raw: Option<&str>, name: &str) -> Result<Option<f64>, ApiError> {
    match raw {
        None => Ok(None),
        Some("") => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("{} must be a number", name))),
    }
}
