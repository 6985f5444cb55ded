//! Document filter pipeline
//!
//! Every document a root returns flows through an ordered list of
//!  [`DocumentStage`]s. A stage either drops the document or hands a
//!  (possibly rewritten) document to the next stage.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use mime::Mime;

use crate::document::{Document, DocumentFlags};

/// Marker that makes a path segment hidden
pub const DEFAULT_HIDDEN_PREFIX: &str = ".";

pub trait DocumentStage: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    /// Returns `None` to drop the document
    fn apply(&self, document: Document) -> Option<Document>;
}

/// Drops folders
#[derive(Debug, Clone, Copy, Default)]
pub struct ExcludeDirectories;

impl DocumentStage for ExcludeDirectories {
    fn name(&self) -> &'static str {
        "exclude-directories"
    }

    fn apply(&self, document: Document) -> Option<Document> {
        (!document.is_directory()).then_some(document)
    }
}

/// Whether a document or any of its ancestors is hidden
///
/// Every `/` separated segment of the document id is checked, so a
///  file nested below a hidden folder counts as hidden too.
pub fn is_hidden(document: &Document, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    document.display_name.starts_with(prefix)
        || document
            .document_id
            .split('/')
            .any(|segment| segment.starts_with(prefix))
}

/// Drops hidden documents unless hidden documents are wanted
#[derive(Debug, Clone)]
pub struct HiddenFilter {
    show_hidden: bool,
    prefix: String,
}

impl HiddenFilter {
    pub fn new(show_hidden: bool, prefix: impl Into<String>) -> Self {
        Self {
            show_hidden,
            prefix: prefix.into(),
        }
    }
}

impl Default for HiddenFilter {
    fn default() -> Self {
        Self::new(false, DEFAULT_HIDDEN_PREFIX)
    }
}

impl DocumentStage for HiddenFilter {
    fn name(&self) -> &'static str {
        "hidden"
    }

    fn apply(&self, document: Document) -> Option<Document> {
        if self.show_hidden || !is_hidden(&document, &self.prefix) {
            Some(document)
        } else {
            None
        }
    }
}

/// Keeps documents whose mime type matches one of the accepted patterns
#[derive(Debug, Clone)]
pub struct MimeFilter {
    accept: Vec<Mime>,
}

impl MimeFilter {
    /// Patterns that fail to parse are ignored. No usable
    ///  pattern at all means everything is accepted.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let accept = patterns
            .iter()
            .filter_map(|pattern| match pattern.as_ref().parse::<Mime>() {
                Ok(mime) => Some(mime),
                Err(e) => {
                    tracing::warn!(pattern = pattern.as_ref(), "ignoring mime pattern: {}", e);
                    None
                }
            })
            .collect();
        Self { accept }
    }

    pub fn accepts(&self, mime_type: &str) -> bool {
        if self.accept.is_empty() {
            return true;
        }
        match mime_type.parse::<Mime>() {
            Ok(actual) => self.accept.iter().any(|pattern| mime_matches(pattern, &actual)),
            Err(_) => self
                .accept
                .iter()
                .any(|pattern| pattern.type_() == mime::STAR && pattern.subtype() == mime::STAR),
        }
    }
}

fn mime_matches(pattern: &Mime, actual: &Mime) -> bool {
    (pattern.type_() == mime::STAR || pattern.type_() == actual.type_())
        && (pattern.subtype() == mime::STAR || pattern.subtype() == actual.subtype())
}

impl DocumentStage for MimeFilter {
    fn name(&self) -> &'static str {
        "mime"
    }

    fn apply(&self, document: Document) -> Option<Document> {
        self.accepts(&document.mime_type).then_some(document)
    }
}

/// Drops documents last modified before a cutoff
#[derive(Debug, Clone, Copy)]
pub struct RecencyCutoff {
    not_before: DateTime<Utc>,
}

impl RecencyCutoff {
    pub fn new(not_before: DateTime<Utc>) -> Self {
        Self { not_before }
    }
}

impl DocumentStage for RecencyCutoff {
    fn name(&self) -> &'static str {
        "recency"
    }

    fn apply(&self, document: Document) -> Option<Document> {
        (document.last_modified >= self.not_before).then_some(document)
    }
}

/// Recents are read-only as far as delete, remove and move go
#[derive(Debug, Clone, Copy, Default)]
pub struct StripMutatingFlags;

impl DocumentStage for StripMutatingFlags {
    fn name(&self) -> &'static str {
        "strip-mutating-flags"
    }

    fn apply(&self, mut document: Document) -> Option<Document> {
        document.flags.remove(DocumentFlags::MUTATING);
        Some(document)
    }
}

#[derive(Debug, Default)]
pub struct FilterPipeline {
    stages: Vec<Box<dyn DocumentStage>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, stage: impl DocumentStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn apply(&self, document: Document) -> Option<Document> {
        self.stages
            .iter()
            .try_fold(document, |document, stage| stage.apply(document))
    }

    pub fn run(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        documents
            .into_iter()
            .filter_map(|document| self.apply(document))
            .collect()
    }
}
