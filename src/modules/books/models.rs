use bookshelf_db::UpdateOutcome;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use utoipa::ToSchema;

/// A stored book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Server-generated identifier
    pub id: String,
    /// Title of the book, unique across the catalogue
    pub name: String,
    /// Author of the book
    pub author: String,
    /// Price as submitted
    #[schema(value_type = f64)]
    pub price: Number,
    /// Revision counter maintained by the store
    pub schema_version: u64,
}

/// Request body for creating or replacing a book.
///
/// Fields are loosely typed here so that absence and wrong types are reported
/// by validation rather than by deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BookPayload {
    /// Title, 4 to 65 characters
    #[schema(value_type = Option<String>)]
    pub name: Option<Value>,
    /// Author, 4 to 25 characters
    #[schema(value_type = Option<String>)]
    pub author: Option<Value>,
    /// Price between 1 and 9999, as a number or numeric string
    #[schema(value_type = Option<f64>)]
    pub price: Option<Value>,
}

/// Envelope returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookListResponse {
    pub message: String,
    pub data: Vec<Book>,
}

/// Counts reported by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// Documents matching the id (0 or 1)
    pub matched_count: u64,
    /// Documents whose fields actually changed
    pub modified_count: u64,
}

impl From<UpdateOutcome> for UpdateResult {
    fn from(outcome: UpdateOutcome) -> Self {
        Self {
            matched_count: outcome.matched_count,
            modified_count: outcome.modified_count,
        }
    }
}

/// Envelope returned by the update endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateResponse {
    pub message: String,
    pub data: UpdateResult,
}
