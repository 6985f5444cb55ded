use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use tokio::sync::broadcast;

use super::provider::{ContentChange, DocumentsProvider, ProviderError};
use crate::document::Document;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// In-memory documents provider using HashMaps
///
/// Results are scripted: whatever was last set for a root
///  is returned until it is replaced.
#[derive(Debug, Clone)]
pub struct MemoryDocumentsProvider {
    authority: String,
    inner: Arc<RwLock<MemoryDocumentsProviderInner>>,
    changes: broadcast::Sender<ContentChange>,
}

#[derive(Debug, Default)]
struct MemoryDocumentsProviderInner {
    /// root_id -> documents returned by recents queries
    recents: HashMap<String, Vec<Document>>,
    /// Returned for recents queries on roots without an entry
    default_recents: Vec<Document>,
    /// parent_id -> children
    children: HashMap<String, Vec<Document>>,
    /// Returned for child queries on parents without an entry
    default_children: Vec<Document>,
    /// When set, every query fails with this reason
    failure: Option<String>,
    /// Number of recents queries served, by root
    recents_queries: HashMap<String, usize>,
}

impl MemoryDocumentsProvider {
    pub fn new(authority: impl Into<String>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            authority: authority.into(),
            inner: Arc::new(RwLock::new(MemoryDocumentsProviderInner::default())),
            changes,
        }
    }

    /// Documents returned by every following recents query on any root
    ///  that has no documents of its own
    pub fn set_next_recent_documents(&self, documents: impl IntoIterator<Item = Document>) {
        if let Some(mut inner) = self.write_for_update() {
            inner.default_recents = self.owned(documents);
        }
    }

    /// Documents returned by recents queries on `root_id`
    pub fn set_recent_documents(
        &self,
        root_id: impl Into<String>,
        documents: impl IntoIterator<Item = Document>,
    ) {
        if let Some(mut inner) = self.write_for_update() {
            let documents = self.owned(documents);
            inner.recents.insert(root_id.into(), documents);
        }
    }

    /// Children returned for any parent without children of its own
    pub fn set_next_child_documents(&self, documents: impl IntoIterator<Item = Document>) {
        if let Some(mut inner) = self.write_for_update() {
            inner.default_children = self.owned(documents);
        }
    }

    pub fn set_child_documents(
        &self,
        parent_id: impl Into<String>,
        documents: impl IntoIterator<Item = Document>,
    ) {
        if let Some(mut inner) = self.write_for_update() {
            let documents = self.owned(documents);
            inner.children.insert(parent_id.into(), documents);
        }
    }

    /// Make every query fail until cleared with `None`
    pub fn set_failure(&self, reason: Option<&str>) {
        if let Some(mut inner) = self.write_for_update() {
            inner.failure = reason.map(str::to_string);
        }
    }

    /// How many recents queries `root_id` has served
    pub fn recents_queries(&self, root_id: &str) -> usize {
        self.inner
            .read()
            .map(|inner| inner.recents_queries.get(root_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Announce a content change to subscribers. Returns the
    ///  number of subscribers that will see it.
    pub fn notify_change(&self, root_id: Option<&str>) -> usize {
        let change = ContentChange {
            authority: self.authority.clone(),
            root_id: root_id.map(str::to_string),
        };
        tracing::debug!(authority = %self.authority, ?root_id, "content changed");
        self.changes.send(change).unwrap_or(0)
    }

    // Documents served by this provider always carry its authority
    fn owned(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        documents
            .into_iter()
            .map(|mut document| {
                document.authority = self.authority.clone();
                document
            })
            .collect()
    }

    // Updates on a poisoned provider are dropped, queries keep reporting the lock error
    fn write_for_update(&self) -> Option<RwLockWriteGuard<'_, MemoryDocumentsProviderInner>> {
        match self.inner.write() {
            Ok(inner) => Some(inner),
            Err(e) => {
                tracing::warn!(
                    authority = %self.authority,
                    "dropping provider update: {}",
                    self.lock_error(e)
                );
                None
            }
        }
    }

    fn lock_error(&self, e: impl std::fmt::Display) -> ProviderError {
        ProviderError::Internal(format!("failed to acquire lock: {}", e))
    }
}

#[async_trait]
impl DocumentsProvider for MemoryDocumentsProvider {
    fn authority(&self) -> &str {
        &self.authority
    }

    async fn query_recent_documents(
        &self,
        root_id: &str,
        limit: usize,
    ) -> Result<Vec<Document>, ProviderError> {
        let mut inner = self.inner.write().map_err(|e| self.lock_error(e))?;

        *inner.recents_queries.entry(root_id.to_string()).or_insert(0) += 1;

        if let Some(reason) = &inner.failure {
            return Err(ProviderError::Query {
                authority: self.authority.clone(),
                root_id: root_id.to_string(),
                reason: reason.clone(),
            });
        }

        let mut documents = inner
            .recents
            .get(root_id)
            .unwrap_or(&inner.default_recents)
            .clone();
        documents.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        documents.truncate(limit);

        Ok(documents)
    }

    async fn query_child_documents(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Document>, ProviderError> {
        let inner = self.inner.read().map_err(|e| self.lock_error(e))?;

        if let Some(reason) = &inner.failure {
            return Err(ProviderError::Query {
                authority: self.authority.clone(),
                root_id: parent_id.to_string(),
                reason: reason.clone(),
            });
        }

        Ok(inner
            .children
            .get(parent_id)
            .unwrap_or(&inner.default_children)
            .clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<ContentChange> {
        self.changes.subscribe()
    }
}
