/**
 * Settings for an aggregation run: fan-out, per-root
 *  limits, recency cutoff and the permission mode.
 */
pub mod config;
/**
 * Documents as reported by providers, and the
 *  capability flags they carry.
 */
pub mod document;
/**
 * Composable stages that decide which documents
 *  make it into a recents listing, and in what shape.
 */
pub mod filter;
/**
 * Change observation: callbacks, scoped registrations
 *  and the dispatcher thread that runs them.
 */
pub mod observer;
/**
 * Cross-profile forwarding policies.
 */
pub mod permission;
/**
 * Document provider abstraction, an in-memory
 *  implementation and the registry of roots.
 */
pub mod provider;
/**
 * The recents aggregator itself.
 */
pub mod recents;
/**
 * Roots: user-scoped content sources.
 */
pub mod root;
/**
 * User ids and the user manager capability.
 */
pub mod user;

pub mod prelude {
    pub use crate::config::{ConfigError, PermissionConfig, RecentsConfig};
    pub use crate::document::{Document, DocumentFlags, DIRECTORY_MIME_TYPE};
    pub use crate::observer::{ContentObserver, ObserverRegistration};
    pub use crate::permission::{CrossProfilePolicy, ProfilePermissionMap, SharedProfileFlag};
    pub use crate::provider::{
        ContentChange, DocumentsProvider, MemoryDocumentsProvider, ProviderError, ProvidersAccess,
    };
    pub use crate::recents::{
        should_ignore_root, QueryContext, RecentsAggregator, RecentsError, RecentsResult,
    };
    pub use crate::root::{Root, RootFlags};
    pub use crate::user::{StaticUserManager, UserId, UserManager};
}
