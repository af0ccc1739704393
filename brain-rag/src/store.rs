//! Fragment store trait and an in-memory implementation.
//!
//! The store is an external collaborator: the pipeline only inserts
//! documents, inserts fragments, and scans. [`InMemoryFragmentStore`] keeps
//! everything in insertion-ordered `Vec`s behind a `tokio::sync::RwLock` and
//! is suitable for development, testing, and small personal corpora.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Document, Fragment};
use crate::error::{RagError, Result};

/// A storage backend for documents and their fragment vectors.
///
/// # Example
///
/// ```rust,ignore
/// use brain_rag::{FragmentStore, InMemoryFragmentStore};
///
/// let store = InMemoryFragmentStore::new();
/// let id = store.insert_document(&document).await?;
/// store.insert_fragments(&fragments).await?;
/// let all = store.scan_fragments().await?;
/// ```
#[async_trait]
pub trait FragmentStore: Send + Sync {
    /// Persist a document and return its id.
    async fn insert_document(&self, document: &Document) -> Result<String>;

    /// Persist fragments. Each must reference an existing document and carry an embedding.
    async fn insert_fragments(&self, fragments: &[Fragment]) -> Result<()>;

    /// Return every stored fragment, oldest first.
    ///
    /// The result is a snapshot; inserts racing with the scan may or may not
    /// be included.
    async fn scan_fragments(&self) -> Result<Vec<Fragment>>;

    /// Look up a document by id.
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Release backend resources. Called once on pipeline shutdown.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

const BACKEND: &str = "InMemory";

#[derive(Debug, Default)]
struct Inner {
    documents: Vec<Document>,
    fragments: Vec<Fragment>,
    dimensions: Option<usize>,
}

/// An insertion-ordered, in-memory [`FragmentStore`].
///
/// The first stored fragment fixes the corpus dimensionality; later fragments
/// with a different vector length are rejected.
#[derive(Debug, Default)]
pub struct InMemoryFragmentStore {
    inner: RwLock<Inner>,
}

impl InMemoryFragmentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn document_count(&self) -> usize {
        self.inner.read().await.documents.len()
    }

    /// Number of stored fragments.
    pub async fn fragment_count(&self) -> usize {
        self.inner.read().await.fragments.len()
    }

    /// The corpus dimensionality, once any fragment has been stored.
    pub async fn dimensions(&self) -> Option<usize> {
        self.inner.read().await.dimensions
    }
}

fn store_error(message: String) -> RagError {
    RagError::Store { backend: BACKEND.to_string(), message }
}

#[async_trait]
impl FragmentStore for InMemoryFragmentStore {
    async fn insert_document(&self, document: &Document) -> Result<String> {
        let mut inner = self.inner.write().await;
        if inner.documents.iter().any(|d| d.id == document.id) {
            return Err(store_error(format!("document '{}' already exists", document.id)));
        }
        inner.documents.push(document.clone());
        debug!(backend = BACKEND, document.id = %document.id, "stored document");
        Ok(document.id.clone())
    }

    async fn insert_fragments(&self, fragments: &[Fragment]) -> Result<()> {
        let mut inner = self.inner.write().await;

        // Validate the whole batch before touching storage.
        let mut dimensions = inner.dimensions;
        for fragment in fragments {
            if !inner.documents.iter().any(|d| d.id == fragment.document_id) {
                return Err(store_error(format!(
                    "fragment '{}' references unknown document '{}'",
                    fragment.id, fragment.document_id
                )));
            }
            if fragment.embedding.is_empty() {
                return Err(store_error(format!("fragment '{}' has no embedding", fragment.id)));
            }
            match dimensions {
                Some(expected) if expected != fragment.embedding.len() => {
                    return Err(RagError::DimensionMismatch {
                        expected,
                        actual: fragment.embedding.len(),
                    });
                }
                Some(_) => {}
                None => dimensions = Some(fragment.embedding.len()),
            }
        }

        inner.dimensions = dimensions;
        inner.fragments.extend_from_slice(fragments);
        debug!(backend = BACKEND, count = fragments.len(), "stored fragments");
        Ok(())
    }

    async fn scan_fragments(&self) -> Result<Vec<Fragment>> {
        Ok(self.inner.read().await.fragments.clone())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.inner.read().await.documents.iter().find(|d| d.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NewDocument;
    use chrono::Utc;

    fn fragment_for(document: &Document, sequence: usize, embedding: Vec<f32>) -> Fragment {
        Fragment {
            id: format!("{}_{sequence}", document.id),
            document_id: document.id.clone(),
            sequence,
            text: format!("fragment {sequence}"),
            embedding,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn scan_preserves_insertion_order() {
        let store = InMemoryFragmentStore::new();
        let doc = Document::from_new(NewDocument::new("a b c"));
        store.insert_document(&doc).await.unwrap();
        store
            .insert_fragments(&[
                fragment_for(&doc, 0, vec![1.0, 0.0]),
                fragment_for(&doc, 1, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();
        store.insert_fragments(&[fragment_for(&doc, 2, vec![1.0, 1.0])]).await.unwrap();

        let sequences: Vec<usize> =
            store.scan_fragments().await.unwrap().iter().map(|f| f.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(store.dimensions().await, Some(2));
    }

    #[tokio::test]
    async fn rejects_orphan_fragments() {
        let store = InMemoryFragmentStore::new();
        let doc = Document::from_new(NewDocument::new("never stored"));
        let err = store.insert_fragments(&[fragment_for(&doc, 0, vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, RagError::Store { .. }));
        assert_eq!(store.fragment_count().await, 0);
    }

    #[tokio::test]
    async fn rejects_mixed_dimensions_without_partial_writes() {
        let store = InMemoryFragmentStore::new();
        let doc = Document::from_new(NewDocument::new("x"));
        store.insert_document(&doc).await.unwrap();
        store.insert_fragments(&[fragment_for(&doc, 0, vec![1.0, 0.0])]).await.unwrap();

        let err = store
            .insert_fragments(&[
                fragment_for(&doc, 1, vec![1.0, 0.0]),
                fragment_for(&doc, 2, vec![1.0, 0.0, 0.0]),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));
        assert_eq!(store.fragment_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_document_ids_are_rejected() {
        let store = InMemoryFragmentStore::new();
        let doc = Document::from_new(NewDocument::new("once"));
        store.insert_document(&doc).await.unwrap();
        assert!(store.insert_document(&doc).await.is_err());
        assert_eq!(store.document_count().await, 1);
        assert_eq!(store.get_document(&doc.id).await.unwrap(), Some(doc));
    }
}
