//! Document providers and the registry of their roots
//!
//! - **[`DocumentsProvider`]**: the query surface the aggregator consumes
//! - **[`MemoryDocumentsProvider`]**: in-memory provider with scripted results
//!   and manual change notification
//! - **[`ProvidersAccess`]**: which roots exist, for which users, and which
//!   provider serves each of them

mod access;
mod memory;
#[allow(clippy::module_inception)]
mod provider;

pub use access::ProvidersAccess;
pub use memory::MemoryDocumentsProvider;
pub use provider::{ContentChange, DocumentsProvider, ProviderError};
