//! MemoryStore - map-backed document store for tests and local development.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::document::{Document, DocumentId, UpdateOutcome};
use crate::error::{StoreError, StoreResult};
use crate::DocumentStore;

type Documents = BTreeMap<DocumentId, Document>;

/// In-memory document store.
///
/// Collections are created on first insert. Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Documents>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&HashMap<String, Documents>) -> T) -> StoreResult<T> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(f(&collections))
    }

    fn write<T>(&self, f: impl FnOnce(&mut HashMap<String, Documents>) -> T) -> StoreResult<T> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))?;
        Ok(f(&mut collections))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> StoreResult<Document> {
        let document = Document::new(fields);
        self.write(|collections| {
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(document.id, document.clone());
        })?;
        Ok(document)
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.read(|collections| {
            collections
                .get(collection)
                .map(|docs| docs.values().cloned().collect())
                .unwrap_or_default()
        })
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let id = DocumentId::parse(id)?;
        self.read(|collections| {
            collections
                .get(collection)
                .and_then(|docs| docs.get(&id))
                .cloned()
        })
    }

    async fn exists_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<bool> {
        self.read(|collections| {
            collections.get(collection).is_some_and(|docs| {
                docs.values()
                    .any(|doc| doc.fields.get(field) == Some(value))
            })
        })
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> StoreResult<UpdateOutcome> {
        let id = DocumentId::parse(id)?;
        self.write(|collections| {
            match collections
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(&id))
            {
                Some(doc) => UpdateOutcome::matched(doc.apply_patch(&patch)),
                None => UpdateOutcome::unmatched(),
            }
        })
    }

    async fn find_and_delete_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<Document>> {
        let id = DocumentId::parse(id)?;
        self.write(|collections| {
            collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_initial_version() {
        let store = MemoryStore::new();
        let doc = store
            .insert("books", fields(json!({"name": "Hobbit"})))
            .await
            .unwrap();

        assert_eq!(doc.schema_version, 0);
        let found = store
            .find_by_id("books", &doc.id.to_string())
            .await
            .unwrap();
        assert_eq!(found, Some(doc));
    }

    #[tokio::test]
    async fn malformed_id_is_an_error_not_a_miss() {
        let store = MemoryStore::new();
        let err = store.find_by_id("books", "nope").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId { .. }));

        let missing = DocumentId::generate().to_string();
        assert!(store.find_by_id("books", &missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_reports_matched_and_modified() {
        let store = MemoryStore::new();
        let doc = store
            .insert("books", fields(json!({"name": "Hobbit", "price": 25})))
            .await
            .unwrap();
        let id = doc.id.to_string();

        let outcome = store
            .update_by_id("books", &id, fields(json!({"price": 30})))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::matched(true));

        let same = store
            .update_by_id("books", &id, fields(json!({"price": 30})))
            .await
            .unwrap();
        assert_eq!(same, UpdateOutcome::matched(false));

        let updated = store.find_by_id("books", &id).await.unwrap().unwrap();
        assert_eq!(updated.fields["price"], json!(30));
        assert_eq!(updated.schema_version, 1);

        let missing = DocumentId::generate().to_string();
        let outcome = store
            .update_by_id("books", &missing, fields(json!({"price": 1})))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::unmatched());
    }

    #[tokio::test]
    async fn delete_returns_document_once() {
        let store = MemoryStore::new();
        let doc = store
            .insert("books", fields(json!({"name": "Hobbit"})))
            .await
            .unwrap();
        let id = doc.id.to_string();

        let deleted = store.find_and_delete_by_id("books", &id).await.unwrap();
        assert_eq!(deleted, Some(doc));
        assert!(store
            .find_and_delete_by_id("books", &id)
            .await
            .unwrap()
            .is_none());
        assert!(store.find_by_id("books", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn exists_by_field_matches_exact_value() {
        let store = MemoryStore::new();
        store
            .insert("books", fields(json!({"name": "Hobbit"})))
            .await
            .unwrap();

        assert!(store
            .exists_by_field("books", "name", &json!("Hobbit"))
            .await
            .unwrap());
        assert!(!store
            .exists_by_field("books", "name", &json!("hobbit"))
            .await
            .unwrap());
        assert!(!store
            .exists_by_field("films", "name", &json!("Hobbit"))
            .await
            .unwrap());
    }
}
