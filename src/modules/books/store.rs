//! Typed access to the `books` collection.

use std::sync::Arc;

use bookshelf_db::{Collection, Document, DocumentStore, StoreError, StoreResult, UpdateOutcome};
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use super::models::Book;
use super::validation::ValidatedBook;

pub const COLLECTION: &str = "books";

/// Fields every stored book must carry.
#[derive(Debug, Deserialize)]
struct BookFields {
    name: String,
    author: String,
    price: Number,
}

/// Book record store over a document collection.
///
/// Only required-field presence is enforced here; bounds and name uniqueness
/// are the handlers' job.
#[derive(Clone)]
pub struct BookStore {
    collection: Collection,
}

impl BookStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            collection: Collection::new(store, COLLECTION),
        }
    }

    pub async fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        self.collection
            .exists_by_field("name", &Value::String(name.to_string()))
            .await
    }

    pub async fn create(&self, book: &ValidatedBook) -> StoreResult<Book> {
        let document = self.collection.insert(to_fields(book)?).await?;
        from_document(document)
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Book>> {
        self.collection
            .find_all()
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Book>> {
        self.collection
            .find_by_id(id)
            .await?
            .map(from_document)
            .transpose()
    }

    /// Overwrite the three business fields of the matching book.
    pub async fn update_by_id(&self, id: &str, book: &ValidatedBook) -> StoreResult<UpdateOutcome> {
        self.collection.update_by_id(id, to_fields(book)?).await
    }

    /// Remove a book and return its last stored state.
    ///
    /// The record is converted before removal; one that cannot be read as a
    /// book is left in place and reported as an error.
    pub async fn delete_by_id(&self, id: &str) -> StoreResult<Option<Book>> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }

        self.collection
            .find_and_delete_by_id(id)
            .await?
            .map(from_document)
            .transpose()
    }
}

/// Numeric value of a submitted price, keeping fractions.
///
/// Numbers pass through; numeric strings are converted; anything else cannot
/// be stored.
pub fn stored_price(price: &Value) -> StoreResult<Number> {
    let invalid = |reason: &str| StoreError::InvalidField {
        field: "price".to_string(),
        reason: reason.to_string(),
    };

    match price {
        Value::Number(n) => Ok(n.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(integer) = trimmed.parse::<i64>() {
                return Ok(Number::from(integer));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .ok_or_else(|| invalid(&format!("'{s}' is not a number")))
        }
        other => Err(invalid(&format!("{other} is not a number"))),
    }
}

fn to_fields(book: &ValidatedBook) -> StoreResult<Map<String, Value>> {
    let mut fields = Map::new();
    fields.insert("name".to_string(), Value::String(book.name.clone()));
    fields.insert("author".to_string(), Value::String(book.author.clone()));
    fields.insert(
        "price".to_string(),
        Value::Number(stored_price(&book.price)?),
    );
    Ok(fields)
}

fn from_document(document: Document) -> StoreResult<Book> {
    let fields: BookFields = serde_json::from_value(Value::Object(document.fields))?;
    Ok(Book {
        id: document.id.to_string(),
        name: fields.name,
        author: fields.author,
        price: fields.price,
        schema_version: document.schema_version,
    })
}
