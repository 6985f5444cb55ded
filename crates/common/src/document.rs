use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mime type reported for folders
pub const DIRECTORY_MIME_TYPE: &str = "inode/directory";

bitflags! {
    /// Operations a provider allows on a document
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DocumentFlags: u32 {
        const SUPPORTS_THUMBNAIL  = 1 << 0;
        const SUPPORTS_WRITE      = 1 << 1;
        const SUPPORTS_DELETE     = 1 << 2;
        const DIR_SUPPORTS_CREATE = 1 << 3;
        const SUPPORTS_RENAME     = 1 << 6;
        const SUPPORTS_COPY       = 1 << 7;
        const SUPPORTS_MOVE       = 1 << 8;
        const SUPPORTS_REMOVE     = 1 << 10;
    }
}

impl DocumentFlags {
    /// Flags that let a caller relocate or drop a document
    pub const MUTATING: DocumentFlags = DocumentFlags::SUPPORTS_DELETE
        .union(DocumentFlags::SUPPORTS_REMOVE)
        .union(DocumentFlags::SUPPORTS_MOVE);
}

impl Default for DocumentFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A document-like record produced by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub authority: String,
    /// Path-like identifier, unique within the authority
    pub document_id: String,
    pub display_name: String,
    pub mime_type: String,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub flags: DocumentFlags,
}

impl Document {
    /// Create a regular file, the mime type is guessed
    ///  from the display name
    pub fn file(authority: impl Into<String>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let mime_type = guess_mime_type(&display_name);
        Self {
            authority: authority.into(),
            document_id: display_name.clone(),
            display_name,
            mime_type,
            last_modified: Utc::now(),
            size: None,
            flags: DocumentFlags::empty(),
        }
    }

    /// Create a folder
    pub fn folder(authority: impl Into<String>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            authority: authority.into(),
            document_id: display_name.clone(),
            display_name,
            mime_type: DIRECTORY_MIME_TYPE.to_string(),
            last_modified: Utc::now(),
            size: None,
            flags: DocumentFlags::DIR_SUPPORTS_CREATE,
        }
    }

    pub fn with_id(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = document_id.into();
        self
    }

    pub fn with_flags(mut self, flags: DocumentFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn is_directory(&self) -> bool {
        self.mime_type == DIRECTORY_MIME_TYPE
    }
}

fn guess_mime_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
