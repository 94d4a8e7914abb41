//! Durable document store backed by redb.
//!
//! One table per collection, keyed by the hyphenated document id, holding the
//! JSON-encoded document. Every write is its own transaction.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use serde_json::{Map, Value};

use crate::document::{Document, DocumentId, UpdateOutcome};
use crate::error::{StoreError, StoreResult};
use crate::DocumentStore;

type DocumentTable<'a> = TableDefinition<'a, &'static str, &'static [u8]>;

fn table(collection: &str) -> DocumentTable<'_> {
    TableDefinition::new(collection)
}

fn failed<E: std::fmt::Display>(operation: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::backend(format!("{operation} failed: {e}"))
}

fn decode(bytes: &[u8]) -> StoreResult<Document> {
    Ok(serde_json::from_slice(bytes)?)
}

/// redb-backed document store.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create the database file, creating parent directories as needed.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::backend(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let db = Database::create(path).map_err(|e| {
            StoreError::backend(format!("failed to open redb at {}: {e}", path.display()))
        })?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Run a redb operation on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(failed("blocking task"))?
    }

    /// Read every document of a collection; a missing table is an empty collection.
    fn scan(db: &Database, collection: &str) -> StoreResult<Vec<Document>> {
        let txn = db.begin_read().map_err(failed("begin_read"))?;
        let table = match txn.open_table(table(collection)) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(failed("open_table")(e)),
        };

        let mut documents = Vec::new();
        for entry in table.iter().map_err(failed("iter"))? {
            let (_, value) = entry.map_err(failed("iter"))?;
            documents.push(decode(value.value())?);
        }
        Ok(documents)
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish()
    }
}

#[async_trait]
impl DocumentStore for RedbStore {
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> StoreResult<Document> {
        let collection = collection.to_string();
        let document = Document::new(fields);
        let bytes = serde_json::to_vec(&document)?;
        let key = document.id.to_string();

        self.blocking(move |db| {
            let txn = db.begin_write().map_err(failed("begin_write"))?;
            {
                let mut table = txn
                    .open_table(table(&collection))
                    .map_err(failed("open_table"))?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(failed("insert"))?;
            }
            txn.commit().map_err(failed("commit"))
        })
        .await?;

        Ok(document)
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let collection = collection.to_string();
        self.blocking(move |db| Self::scan(db, &collection)).await
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let key = DocumentId::parse(id)?.to_string();
        let collection = collection.to_string();

        self.blocking(move |db| {
            let txn = db.begin_read().map_err(failed("begin_read"))?;
            let table = match txn.open_table(table(&collection)) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(e) => return Err(failed("open_table")(e)),
            };
            let found = table.get(key.as_str()).map_err(failed("get"))?;
            found.map(|guard| decode(guard.value())).transpose()
        })
        .await
    }

    async fn exists_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<bool> {
        let collection = collection.to_string();
        let field = field.to_string();
        let value = value.clone();

        self.blocking(move |db| {
            let documents = Self::scan(db, &collection)?;
            Ok(documents
                .iter()
                .any(|doc| doc.fields.get(&field) == Some(&value)))
        })
        .await
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Map<String, Value>,
    ) -> StoreResult<UpdateOutcome> {
        let key = DocumentId::parse(id)?.to_string();
        let collection = collection.to_string();

        self.blocking(move |db| {
            let txn = db.begin_write().map_err(failed("begin_write"))?;
            let outcome = {
                let mut table = txn
                    .open_table(table(&collection))
                    .map_err(failed("open_table"))?;
                let existing = table
                    .get(key.as_str())
                    .map_err(failed("get"))?
                    .map(|guard| guard.value().to_vec());

                match existing {
                    None => UpdateOutcome::unmatched(),
                    Some(bytes) => {
                        let mut document = decode(&bytes)?;
                        let modified = document.apply_patch(&patch);
                        if modified {
                            let encoded = serde_json::to_vec(&document)?;
                            table
                                .insert(key.as_str(), encoded.as_slice())
                                .map_err(failed("insert"))?;
                        }
                        UpdateOutcome::matched(modified)
                    }
                }
            };
            txn.commit().map_err(failed("commit"))?;
            Ok(outcome)
        })
        .await
    }

    async fn find_and_delete_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> StoreResult<Option<Document>> {
        let key = DocumentId::parse(id)?.to_string();
        let collection = collection.to_string();

        self.blocking(move |db| {
            let txn = db.begin_write().map_err(failed("begin_write"))?;
            let removed = {
                let mut table = txn
                    .open_table(table(&collection))
                    .map_err(failed("open_table"))?;
                let removed = table
                    .remove(key.as_str())
                    .map_err(failed("remove"))?
                    .map(|guard| decode(guard.value()))
                    .transpose()?;
                removed
            };
            // An undecodable row returns above, dropping `txn` and aborting the removal.
            txn.commit().map_err(failed("commit"))?;
            Ok(removed)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_find_delete() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("books.redb")).unwrap();

        let doc = store
            .insert("books", fields(json!({"name": "Hobbit", "price": 25})))
            .await
            .unwrap();
        let id = doc.id.to_string();

        assert_eq!(
            store.find_by_id("books", &id).await.unwrap(),
            Some(doc.clone())
        );
        assert_eq!(store.find_all("books").await.unwrap(), vec![doc.clone()]);

        let deleted = store.find_and_delete_by_id("books", &id).await.unwrap();
        assert_eq!(deleted, Some(doc));
        assert!(store.find_by_id("books", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn undecodable_row_survives_failed_delete() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("books.redb")).unwrap();
        let id = DocumentId::generate().to_string();

        let txn = store.db.begin_write().unwrap();
        {
            let mut rows = txn.open_table(table("books")).unwrap();
            rows.insert(id.as_str(), b"not json".as_slice()).unwrap();
        }
        txn.commit().unwrap();

        let err = store.find_and_delete_by_id("books", &id).await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
        assert!(err.is_rejection());

        let txn = store.db.begin_read().unwrap();
        let rows = txn.open_table(table("books")).unwrap();
        assert!(rows.get(id.as_str()).unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_collection_reads_without_table() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("books.redb")).unwrap();
        let missing = DocumentId::generate().to_string();

        assert!(store.find_all("books").await.unwrap().is_empty());
        assert!(store.find_by_id("books", &missing).await.unwrap().is_none());
        assert!(!store
            .exists_by_field("books", "name", &json!("Hobbit"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn update_persists_patch_and_version() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("books.redb")).unwrap();
        let doc = store
            .insert("books", fields(json!({"name": "Hobbit", "price": 25})))
            .await
            .unwrap();
        let id = doc.id.to_string();

        let outcome = store
            .update_by_id("books", &id, fields(json!({"name": "Hobbit2"})))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::matched(true));

        let updated = store.find_by_id("books", &id).await.unwrap().unwrap();
        assert_eq!(updated.fields["name"], json!("Hobbit2"));
        assert_eq!(updated.schema_version, 1);
        assert!(store
            .exists_by_field("books", "name", &json!("Hobbit2"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn documents_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.redb");

        let id = {
            let store = RedbStore::open(&path).unwrap();
            let doc = store
                .insert("books", fields(json!({"name": "Hobbit"})))
                .await
                .unwrap();
            doc.id.to_string()
        };

        let store = RedbStore::open(&path).unwrap();
        let found = store.find_by_id("books", &id).await.unwrap().unwrap();
        assert_eq!(found.fields["name"], json!("Hobbit"));
    }

    #[tokio::test]
    async fn malformed_id_is_rejected_before_io() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("books.redb")).unwrap();
        let err = store
            .find_and_delete_by_id("books", "bogus")
            .await
            .unwrap_err();
        assert!(err.is_rejection());
    }
}
