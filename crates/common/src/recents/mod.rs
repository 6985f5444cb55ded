//! Aggregation of recent documents across roots
//!
//! [`RecentsAggregator`] answers one question: which documents did the target
//!  user touch lately, across every root that is allowed to say? A run
//!
//! 1. refuses early when the target profile is in quiet mode, or when the
//!    requesting user may not forward to it ([`RecentsError`])
//! 2. picks the eligible roots ([`should_ignore_root`])
//! 3. queries each root's recents, concurrently and with a timeout per root
//! 4. filters, merges and sorts the documents, newest first
//! 5. points the change observer at the roots it just queried
//!
//! The outcome is a [`RecentsResult`]; errors travel on the result rather
//!  than out of [`RecentsAggregator::aggregate`].

mod aggregator;
mod query;
mod result;

pub use aggregator::{should_ignore_root, RecentsAggregator};
pub use query::QueryContext;
pub use result::{RecentsError, RecentsResult};
