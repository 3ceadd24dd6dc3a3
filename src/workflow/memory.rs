use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use super::store::{Document, DocumentStore, StoreError};

/// In-memory [`DocumentStore`] used by tests and the demo binary.
///
/// Faithful to the external store's capability contract: inserts are
/// append-only with backend-assigned ids, queries match one field, and
/// nothing enforces uniqueness — duplicate documents under the same logical
/// key are accepted, which is exactly what the application-side invariant
/// checks must catch.
pub struct InMemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Document>>> {
        self.collections.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, Vec::len)
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    async fn insert(
        &self,
        collection: &str,
        fields: serde_json::Value,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        Ok(id)
    }

    async fn query(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.lock();
        let matches = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| doc.fields.get(field).and_then(|v| v.as_str()) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(matches)
    }

    async fn update_field(
        &self,
        collection: &str,
        doc_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let mut collections = self.lock();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == doc_id))
            .ok_or_else(|| StoreError::MissingDocument {
                collection: collection.to_string(),
                doc_id: doc_id.to_string(),
            })?;

        if let serde_json::Value::Object(fields) = &mut doc.fields {
            fields.insert(field.to_string(), serde_json::Value::String(value.to_string()));
            Ok(())
        } else {
            Err(StoreError::Backend {
                operation: "update_field",
                key: doc_id.to_string(),
                message: "document fields are not an object".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_assigns_unique_ids() {
        let store = InMemoryDocumentStore::new();
        let a = store.insert("c", serde_json::json!({"k": "v"})).await.unwrap();
        let b = store.insert("c", serde_json::json!({"k": "v"})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.document_count("c"), 2);
    }

    #[tokio::test]
    async fn query_matches_string_field_exactly() {
        let store = InMemoryDocumentStore::new();
        store.insert("c", serde_json::json!({"name": "alpha"})).await.unwrap();
        store.insert("c", serde_json::json!({"name": "beta"})).await.unwrap();
        store.insert("other", serde_json::json!({"name": "alpha"})).await.unwrap();

        let docs = store.query("c", "name", "alpha").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["name"], "alpha");

        assert!(store.query("c", "name", "gamma").await.unwrap().is_empty());
        assert!(store.query("missing", "name", "alpha").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_logical_keys_are_accepted() {
        // No uniqueness at this layer by design.
        let store = InMemoryDocumentStore::new();
        store.insert("c", serde_json::json!({"key": "dup"})).await.unwrap();
        store.insert("c", serde_json::json!({"key": "dup"})).await.unwrap();
        assert_eq!(store.query("c", "key", "dup").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_field_rewrites_single_field() {
        let store = InMemoryDocumentStore::new();
        let id = store
            .insert("c", serde_json::json!({"status": "SUBMITTED", "other": "kept"}))
            .await
            .unwrap();

        store.update_field("c", &id, "status", "RUNNING").await.unwrap();

        let docs = store.query("c", "status", "RUNNING").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields["other"], "kept");
    }

    #[tokio::test]
    async fn update_field_unknown_doc_errors() {
        let store = InMemoryDocumentStore::new();
        let err = store.update_field("c", "nope", "f", "v").await.unwrap_err();
        assert!(matches!(err, StoreError::MissingDocument { .. }));
    }
}
