use mongodb::bson::oid::ObjectId;
use mongodb::bson::Document;
use serde::{Deserialize, Serialize, Serializer};

/// A movie document.
///
/// Only the fields the application reads are typed; everything else a client
/// stores (title, poster, description, ...) rides along in `fields` untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    #[serde(
        rename = "_id",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_object_id"
    )]
    pub id: Option<ObjectId>,

    /// Identifier of the user who created the record. Never changed after
    /// insert; the sole input to the ownership check.
    #[serde(rename = "addedBy", skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,

    /// User identifiers who marked this movie for later viewing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub watchlist: Vec<String>,

    #[serde(flatten)]
    pub fields: Document,
}

impl Movie {
    /// True when `requester` is the user who created this record. A record
    /// with no creator is owned by nobody.
    pub fn is_owned_by(&self, requester: &str) -> bool {
        self.added_by.as_deref() == Some(requester)
    }
}

/// Serialize an ObjectId as its 24-char hex string instead of `{"$oid": ..}`.
pub fn serialize_object_id<S>(oid: &Option<ObjectId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match oid {
        Some(oid) => serializer.serialize_str(&oid.to_hex()),
        None => serializer.serialize_none(),
    }
}
