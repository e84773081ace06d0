use async_trait::async_trait;
use bytes::Bytes;

use crate::document::{BlobRef, Document, Fields, Query};
use crate::error::StoreResult;

/// External document database holding the pass ledger.
///
/// Implementations must satisfy:
/// - `create` appends; it never overwrites an existing document.
/// - `list` applies filters, then sort, then limit, then projection.
/// - Transport failures surface as `StoreError::Unavailable`.
/// - No cross-call atomicity is promised.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document and return it with its store-assigned id.
    async fn create(&self, fields: Fields) -> StoreResult<Document>;

    /// List documents matching `query`.
    async fn list(&self, query: &Query) -> StoreResult<Vec<Document>>;

    /// First document matching `query`, if any.
    async fn find_one(&self, query: &Query) -> StoreResult<Option<Document>> {
        let query = query.clone().limit(1);
        Ok(self.list(&query).await?.into_iter().next())
    }
}

/// External blob storage for rendered pass images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload `data` under a suggested file name, returning an opaque reference.
    async fn upload(&self, file_name: &str, content_type: &str, data: Bytes) -> StoreResult<BlobRef>;
}
