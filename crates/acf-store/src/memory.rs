use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use uuid::Uuid;

use crate::document::{BlobRef, Document, DocumentId, Fields, Query};
use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobStore, DocumentStore};

/// In-memory document store.
///
/// Intended for tests and single-process deployments. Documents are kept in
/// insertion order behind a `RwLock`. The store can be switched offline to
/// simulate an unreachable backend, and supports out-of-band field patches
/// that mimic an administrator editing records directly in the database.
pub struct InMemoryDocumentStore {
    docs: RwLock<Vec<Document>>,
    offline: AtomicBool,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.read().expect("lock poisoned").is_empty()
    }

    /// Snapshot of every document in insertion order.
    pub fn all(&self) -> Vec<Document> {
        self.docs.read().expect("lock poisoned").clone()
    }

    /// Simulate the backend becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Overwrite one field of a stored document, bypassing the append-only
    /// contract. Fails with `NotFound` if the document does not exist.
    pub fn patch(&self, id: &DocumentId, field: &str, value: Value) -> StoreResult<()> {
        let mut docs = self.docs.write().expect("lock poisoned");
        let doc = docs
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        doc.fields.insert(field.to_string(), value);
        Ok(())
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, fields: Fields) -> StoreResult<Document> {
        self.ensure_online()?;
        let doc = Document::new(DocumentId::new(Uuid::new_v4().simple().to_string()), fields);
        self.docs.write().expect("lock poisoned").push(doc.clone());
        Ok(doc)
    }

    async fn list(&self, query: &Query) -> StoreResult<Vec<Document>> {
        self.ensure_online()?;
        let docs = self.docs.read().expect("lock poisoned");
        let mut matched: Vec<&Document> = docs.iter().filter(|d| query.matches(d)).collect();

        if let Some(field) = &query.order_desc {
            // Stable sort keeps insertion order among equal keys.
            matched.sort_by(|a, b| compare_desc(a.get(field), b.get(field)));
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched.into_iter().map(|d| query.project(d)).collect())
    }
}

fn compare_desc(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.and_then(Value::as_f64);
    let b = b.and_then(Value::as_f64);
    match (a, b) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl std::fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("document_count", &self.len())
            .field("offline", &self.offline.load(AtomicOrdering::SeqCst))
            .finish()
    }
}

/// A blob held by [`InMemoryBlobStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// In-memory blob store.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobRef, StoredBlob>>,
    offline: AtomicBool,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    pub fn get(&self, reference: &BlobRef) -> Option<StoredBlob> {
        self.blobs.read().expect("lock poisoned").get(reference).cloned()
    }

    /// Simulate the backend becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, file_name: &str, content_type: &str, data: Bytes) -> StoreResult<BlobRef> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory blob store is offline".into()));
        }
        let reference = BlobRef::new(Uuid::new_v4().simple().to_string());
        let blob = StoredBlob {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data,
        };
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(reference.clone(), blob);
        tracing::debug!(%reference, file_name, "blob uploaded");
        Ok(reference)
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}
