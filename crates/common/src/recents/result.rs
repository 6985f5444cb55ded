use serde::Serialize;

use crate::document::Document;
use crate::user::UserId;

/// Why a recents listing could not be produced at all
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecentsError {
    /// The requesting user may not forward queries to the target profile
    #[error("no permission to access the profile of {target}")]
    CrossProfileNoPermission { target: UserId },
    /// The target profile is locked or paused
    #[error("the profile of {target} is in quiet mode")]
    CrossProfileQuietMode { target: UserId },
}

/// Outcome of one aggregation run
///
/// Either documents or an error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentsResult {
    documents: Option<Vec<Document>>,
    error: Option<RecentsError>,
}

impl RecentsResult {
    pub fn ok(documents: Vec<Document>) -> Self {
        debug_assert!(documents.iter().all(|document| !document.is_directory()));
        Self {
            documents: Some(documents),
            error: None,
        }
    }

    pub fn failed(error: RecentsError) -> Self {
        Self {
            documents: None,
            error: Some(error),
        }
    }

    /// `None` when the run failed
    pub fn documents(&self) -> Option<&[Document]> {
        self.documents.as_deref()
    }

    pub fn error(&self) -> Option<&RecentsError> {
        self.error.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Number of documents, zero for a failed run
    pub fn len(&self) -> usize {
        self.documents.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_documents(self) -> Result<Vec<Document>, RecentsError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.documents.unwrap_or_default()),
        }
    }
}
