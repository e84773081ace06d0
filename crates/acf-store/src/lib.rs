//! Storage collaborators for festival passes.
//!
//! The pass ledger lives in an external, eventually-consistent document
//! service and pass images live in an external blob service. This crate pins
//! down the narrow contract the rest of the workspace relies on and ships
//! in-memory backends for tests and single-process deployments.
//!
//! # Contract
//!
//! - [`DocumentStore::create`] — append a document, returning it with a store-assigned id
//! - [`DocumentStore::list`] — exact-match filters, descending sort on a numeric
//!   field, result limit, optional field projection (see [`Query`])
//! - [`BlobStore::upload`] — store bytes, returning an opaque [`BlobRef`]
//!
//! # Design Rules
//!
//! 1. Documents are never updated or deleted through this contract.
//! 2. The store offers no transactions; callers resolve races by detect-and-retry.
//! 3. Transport failures are reported as [`StoreError::Unavailable`] so callers
//!    can tell "unreachable" apart from every other failure.

pub mod document;
pub mod error;
pub mod memory;
pub mod traits;

pub use document::{BlobRef, Document, DocumentId, Fields, Query};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryBlobStore, InMemoryDocumentStore, StoredBlob};
pub use traits::{BlobStore, DocumentStore};
