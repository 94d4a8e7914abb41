//! Document store for bookshelf: collection-oriented storage of JSON documents
//! with generated ids and a store-maintained schema version.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};

use bookshelf_kernel::settings::{DatabaseSettings, StorageBackend};

pub mod document;
pub mod durable;
pub mod error;
pub mod memory;

pub use document::{Document, DocumentId, UpdateOutcome};
pub use durable::RedbStore;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;

/// Query primitives every backend provides.
///
/// Operations are independent; nothing here spans more than one call.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document, assigning its id and initial version.
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> StoreResult<Document>;

    /// All documents of a collection in id order.
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Whether any document has `field` equal to `value`.
    async fn exists_by_field(&self, collection: &str, field: &str, value: &Value)
        -> StoreResult<bool>;

    /// Merge `patch` into the matching document.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> StoreResult<UpdateOutcome>;

    /// Remove the matching document and return it.
    async fn find_and_delete_by_id(&self, collection: &str, id: &str)
        -> StoreResult<Option<Document>>;
}

/// Handle bound to one named collection of a store.
#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn DocumentStore>,
    name: String,
}

impl Collection {
    pub fn new(store: Arc<dyn DocumentStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn insert(&self, fields: Map<String, Value>) -> StoreResult<Document> {
        self.store.insert(&self.name, fields).await
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Document>> {
        self.store.find_all(&self.name).await
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<Document>> {
        self.store.find_by_id(&self.name, id).await
    }

    pub async fn exists_by_field(&self, field: &str, value: &Value) -> StoreResult<bool> {
        self.store.exists_by_field(&self.name, field, value).await
    }

    pub async fn update_by_id(
        &self,
        id: &str,
        patch: Map<String, Value>,
    ) -> StoreResult<UpdateOutcome> {
        self.store.update_by_id(&self.name, id, patch).await
    }

    pub async fn find_and_delete_by_id(&self, id: &str) -> StoreResult<Option<Document>> {
        self.store.find_and_delete_by_id(&self.name, id).await
    }
}

/// Open the store selected by the database settings.
pub fn open(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match settings.backend {
        StorageBackend::Memory => {
            tracing::info!(target: "bookshelf-db", backend = "memory", "document store ready");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Redb => {
            let store = RedbStore::open(&settings.path).with_context(|| {
                format!("failed to open redb store at {}", settings.path.display())
            })?;
            tracing::info!(
                target: "bookshelf-db",
                backend = "redb",
                path = %settings.path.display(),
                "document store ready"
            );
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn collection_scopes_operations_by_name() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let books = Collection::new(store.clone(), "books");
        let authors = Collection::new(store, "authors");

        let mut fields = Map::new();
        fields.insert("name".into(), json!("Hobbit"));
        let doc = books.insert(fields).await.unwrap();

        assert_eq!(books.find_all().await.unwrap().len(), 1);
        assert!(authors.find_all().await.unwrap().is_empty());
        assert!(authors
            .find_by_id(&doc.id.to_string())
            .await
            .unwrap()
            .is_none());
        assert!(books
            .exists_by_field("name", &json!("Hobbit"))
            .await
            .unwrap());
    }

    #[test]
    fn open_memory_backend() {
        let settings = DatabaseSettings::default();
        assert!(open(&settings).is_ok());
    }

    #[test]
    fn open_redb_backend_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = DatabaseSettings {
            backend: StorageBackend::Redb,
            path: dir.path().join("nested").join("books.redb"),
        };
        assert!(open(&settings).is_ok());
        assert!(settings.path.exists());
    }
}
