use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::document::Document;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider rejected or failed a query
    #[error("provider {authority} failed to query root {root_id}: {reason}")]
    Query {
        authority: String,
        root_id: String,
        reason: String,
    },
    /// The provider cannot be reached at all
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    /// A root did not answer in time
    #[error("query of root {root_id} timed out after {elapsed:?}")]
    Timeout { root_id: String, elapsed: Duration },
    #[error("memory provider error: {0}")]
    Internal(String),
}

/// Notification that content served by a provider changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub authority: String,
    /// The root whose content changed, or `None` when the
    ///  change affects every root of the provider
    pub root_id: Option<String>,
}

impl ContentChange {
    pub fn affects(&self, root_id: &str) -> bool {
        self.root_id.as_deref().map_or(true, |id| id == root_id)
    }
}

#[async_trait]
pub trait DocumentsProvider: Send + Sync + Debug {
    /// Authority this provider answers for
    fn authority(&self) -> &str;

    /// Documents recently modified within a root
    ///
    /// # Arguments
    /// * `root_id` - The root to list recents for
    /// * `limit` - Upper bound on the number of documents wanted
    ///
    /// # Returns
    /// * `Ok(Vec<Document>)` - Recent documents, newest first
    /// * `Err(ProviderError)` - The root could not be queried
    async fn query_recent_documents(
        &self,
        root_id: &str,
        limit: usize,
    ) -> Result<Vec<Document>, ProviderError>;

    /// Direct children of a document. Recents never walk
    ///  directory trees, this exists for browsing callers.
    async fn query_child_documents(&self, parent_id: &str)
        -> Result<Vec<Document>, ProviderError>;

    /// Subscribe to content changes of this provider
    fn subscribe(&self) -> broadcast::Receiver<ContentChange>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_affects() {
        let change = ContentChange {
            authority: "home".to_string(),
            root_id: Some("home".to_string()),
        };
        assert!(change.affects("home"));
        assert!(!change.affects("downloads"));

        let provider_wide = ContentChange {
            authority: "home".to_string(),
            root_id: None,
        };
        assert!(provider_wide.affects("downloads"));
    }
}
