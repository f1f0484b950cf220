//! Registry of uploaded documents, kept for the lifetime of the process.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use vox_core::{Document, DocumentId, MediaKind};

/// Listing view of a document, without its payload.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub filename: String,
    pub kind: MediaKind,
    pub size: usize,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            filename: doc.filename.clone(),
            kind: doc.kind,
            size: doc.size(),
            content_hash: doc.content_hash.clone(),
            created_at: doc.created_at,
        }
    }
}

#[derive(Default)]
pub struct DocumentStore {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document under a new id. Returns false, leaving the stored
    /// version untouched, when the id is already taken.
    pub fn insert(&self, document: Document) -> bool {
        match self.documents.write().entry(document.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(document);
                true
            }
        }
    }

    /// Replace a stored document, returning the version it replaced.
    /// Ids that are not stored (e.g. deleted meanwhile) are left absent.
    pub fn update(&self, document: Document) -> Option<Document> {
        self.documents
            .write()
            .get_mut(&document.id)
            .map(|stored| std::mem::replace(stored, document))
    }

    /// Payloads are reference counted, so this clone is cheap.
    pub fn get(&self, id: &str) -> Option<Document> {
        self.documents.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.read().contains_key(id)
    }

    pub fn remove(&self, id: &str) -> Option<Document> {
        self.documents.write().remove(id)
    }

    /// Documents with the given content hash.
    pub fn find_by_hash(&self, hash: &str) -> Vec<DocumentSummary> {
        self.documents
            .read()
            .values()
            .filter(|doc| doc.content_hash == hash)
            .map(DocumentSummary::from)
            .collect()
    }

    /// Oldest first.
    pub fn list(&self) -> Vec<DocumentSummary> {
        let mut summaries: Vec<DocumentSummary> = self
            .documents
            .read()
            .values()
            .map(DocumentSummary::from)
            .collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    pub fn clear(&self) {
        self.documents.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replace_remove() {
        let store = DocumentStore::new();
        let doc = Document::new("a.txt", MediaKind::Document, b"one".to_vec());
        let id = doc.id.clone();

        assert!(store.insert(doc));
        let replacement = Document::new("a.txt", MediaKind::Document, b"two".to_vec()).with_id(&id);
        assert!(!store.insert(replacement.clone()));
        assert_eq!(&store.get(&id).unwrap().payload[..], b"one");

        let previous = store.update(replacement).unwrap();
        assert_eq!(&previous.payload[..], b"one");
        assert_eq!(&store.get(&id).unwrap().payload[..], b"two");
        assert_eq!(store.len(), 1);

        assert!(store.remove(&id).is_some());
        assert!(store.remove(&id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_skips_missing_documents() {
        let store = DocumentStore::new();
        let doc = Document::new("gone.txt", MediaKind::Document, b"late".to_vec());

        assert!(store.update(doc.clone()).is_none());
        assert!(!store.contains(&doc.id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_by_hash_and_list() {
        let store = DocumentStore::new();
        store.insert(Document::new("a.txt", MediaKind::Document, b"same".to_vec()));
        store.insert(Document::new("b.txt", MediaKind::Document, b"same".to_vec()));
        store.insert(Document::new("c.wav", MediaKind::Audio, b"other".to_vec()));

        let hash = vox_core::content_hash(b"same");
        assert_eq!(store.find_by_hash(&hash).len(), 2);

        let listed = store.list();
        assert_eq!(listed.len(), 3);
        assert!(listed.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }
}
