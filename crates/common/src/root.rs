use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::user::UserId;

bitflags! {
    /// Capabilities a provider declares for one of its roots
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RootFlags: u32 {
        const SUPPORTS_CREATE   = 1 << 0;
        const LOCAL_ONLY        = 1 << 1;
        const SUPPORTS_RECENTS  = 1 << 2;
        const SUPPORTS_SEARCH   = 1 << 3;
        const SUPPORTS_IS_CHILD = 1 << 4;
    }
}

impl Default for RootFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// A user-scoped content source served by a provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Root {
    /// Authority of the provider serving this root
    pub authority: String,
    /// Provider-local identifier of the root
    pub root_id: String,
    /// The user the root belongs to
    pub user_id: UserId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub flags: RootFlags,
}

impl Root {
    pub fn new(
        authority: impl Into<String>,
        root_id: impl Into<String>,
        user_id: UserId,
        flags: RootFlags,
    ) -> Self {
        let root_id = root_id.into();
        Self {
            authority: authority.into(),
            title: root_id.clone(),
            root_id,
            user_id,
            flags,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn supports_recents(&self) -> bool {
        self.flags.contains(RootFlags::SUPPORTS_RECENTS)
    }

    pub fn is_local_only(&self) -> bool {
        self.flags.contains(RootFlags::LOCAL_ONLY)
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.authority, self.root_id, self.user_id)
    }
}
