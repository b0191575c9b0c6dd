use crate::{DocId, Document, SearchIndex, SearchOptions};
use parking_lot::Mutex;
use std::sync::Arc;

/// A search hit with the document cloned out of the lock.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedHit<D> {
    pub doc_id: DocId,
    pub doc: D,
    pub score: f64,
}

/// Cloneable handle serializing every index operation through one mutex.
pub struct SharedIndex<D> {
    inner: Arc<Mutex<SearchIndex<D>>>,
}

impl<D> Clone for SharedIndex<D> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<D: Document> SharedIndex<D> {
    pub fn new(index: SearchIndex<D>) -> Self {
        Self { inner: Arc::new(Mutex::new(index)) }
    }

    pub fn add(&self, id: impl Into<DocId>, doc: D) {
        self.inner.lock().add(id, doc);
    }

    pub fn remove(&self, id: &DocId) -> bool {
        self.inner.lock().remove(id)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run `f` with the index locked.
    pub fn with<R>(&self, f: impl FnOnce(&SearchIndex<D>) -> R) -> R {
        f(&self.inner.lock())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut SearchIndex<D>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<D: Document + Clone> SharedIndex<D> {
    pub fn get(&self, id: &DocId) -> Option<D> {
        self.inner.lock().get(id).cloned()
    }

    pub fn search_owned(&self, query: &str, options: SearchOptions) -> Vec<OwnedHit<D>> {
        let index = self.inner.lock();
        index
            .search(query, options)
            .into_iter()
            .map(|hit| OwnedHit { doc_id: hit.doc_id, doc: hit.doc.clone(), score: hit.score })
            .collect()
    }
}
