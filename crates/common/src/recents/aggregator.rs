use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use super::query::QueryContext;
use super::result::{RecentsError, RecentsResult};
use crate::config::RecentsConfig;
use crate::document::Document;
use crate::filter::{
    ExcludeDirectories, FilterPipeline, HiddenFilter, MimeFilter, RecencyCutoff,
    StripMutatingFlags,
};
use crate::observer::{ContentObserver, ObserverSlot, WatchedSource};
use crate::permission::CrossProfilePolicy;
use crate::provider::{DocumentsProvider, ProviderError, ProvidersAccess};
use crate::root::Root;
use crate::user::{UserId, UserManager};

/// Whether `root` stays out of a recents listing for `target_user`
///
/// A root takes part only if it supports recents, and it either belongs
///  to the target user or is local-only.
pub fn should_ignore_root(root: &Root, target_user: UserId) -> bool {
    !root.supports_recents() || (root.user_id != target_user && !root.is_local_only())
}

/// Documents one root answered with
struct RootBatch {
    root: Root,
    provider: Arc<dyn DocumentsProvider>,
    documents: Result<Vec<Document>, ProviderError>,
}

#[derive(Debug)]
pub struct RecentsAggregator {
    providers: ProvidersAccess,
    policy: Arc<dyn CrossProfilePolicy>,
    users: Arc<dyn UserManager>,
    config: RecentsConfig,
    observer: Mutex<ObserverSlot>,
}

impl RecentsAggregator {
    pub fn new(
        providers: ProvidersAccess,
        policy: Arc<dyn CrossProfilePolicy>,
        users: Arc<dyn UserManager>,
        config: RecentsConfig,
    ) -> Self {
        Self {
            providers,
            policy,
            users,
            config,
            observer: Mutex::new(ObserverSlot::new()),
        }
    }

    /// Build an aggregator whose permission policy comes from `config`
    pub fn from_config(
        config: RecentsConfig,
        providers: ProvidersAccess,
        users: Arc<dyn UserManager>,
    ) -> Self {
        let policy = config.permissions.build();
        Self::new(providers, policy, users, config)
    }

    pub fn config(&self) -> &RecentsConfig {
        &self.config
    }

    pub fn providers(&self) -> &ProvidersAccess {
        &self.providers
    }

    pub fn policy(&self) -> Arc<dyn CrossProfilePolicy> {
        self.policy.clone()
    }

    pub fn should_ignore_root(&self, root: &Root, target_user: UserId) -> bool {
        should_ignore_root(root, target_user)
    }

    /// Roots a listing for `target_user` would query
    pub fn eligible_roots(&self, target_user: UserId) -> Vec<Root> {
        self.providers
            .roots()
            .iter()
            .filter(|root| !should_ignore_root(root, target_user))
            .cloned()
            .collect()
    }

    /// Quiet mode wins over a missing permission
    pub fn check_access(&self, ctx: &QueryContext) -> Result<(), RecentsError> {
        let target = ctx.target_user;

        if self.users.is_quiet_mode_enabled(target) {
            return Err(RecentsError::CrossProfileQuietMode { target });
        }

        if ctx.is_cross_profile() && !self.policy.can_forward_to_profile(target) {
            return Err(RecentsError::CrossProfileNoPermission { target });
        }

        Ok(())
    }

    /// Stages every queried document goes through, in order
    pub fn pipeline(&self, ctx: &QueryContext, now: DateTime<Utc>) -> FilterPipeline {
        let mut pipeline = FilterPipeline::new()
            .with(ExcludeDirectories)
            .with(HiddenFilter::new(
                ctx.show_hidden,
                self.config.hidden_prefix.clone(),
            ))
            .with(MimeFilter::new(ctx.accept_mimes.as_slice()));

        if let Some(max_age) = self.config.reject_older_than() {
            pipeline = pipeline.with(RecencyCutoff::new(now - max_age));
        }

        pipeline.with(StripMutatingFlags)
    }

    /// Run one aggregation
    ///
    /// Roots that fail or time out are skipped, the listing is built
    ///  from whatever the remaining roots returned.
    pub async fn aggregate(&self, ctx: &QueryContext) -> RecentsResult {
        if let Err(error) = self.check_access(ctx) {
            tracing::info!(
                requesting_user = %ctx.requesting_user,
                target_user = %ctx.target_user,
                "recents refused: {}",
                error
            );
            // a refused listing has nothing left to watch
            self.observer.lock().watch(Vec::new());
            return RecentsResult::failed(error);
        }

        let roots = self.eligible_roots(ctx.target_user);
        let limit = self.config.max_docs_per_root;
        let timeout = self.config.root_query_timeout();

        let queries = roots.into_iter().filter_map(|root| {
            match self.providers.provider_for(&root) {
                Some(provider) => Some((root, provider)),
                None => {
                    tracing::warn!(root = %root, "no provider registered for root");
                    None
                }
            }
        });

        let pending: Vec<_> = queries
            .map(|(root, provider)| query_root(root, provider, limit, timeout))
            .collect();
        let batches: Vec<RootBatch> = stream::iter(pending)
            .buffered(self.config.max_concurrent_queries)
            .collect()
            .await;

        let pipeline = self.pipeline(ctx, Utc::now());
        // Keyed by provider instance: one instance may serve several users
        //  and must be subscribed to only once
        let mut sources: BTreeMap<usize, WatchedSource> = BTreeMap::new();
        let mut documents = Vec::new();

        for batch in batches {
            let mut batch_documents = match batch.documents {
                Ok(batch_documents) => batch_documents,
                Err(e) => {
                    tracing::warn!(root = %batch.root, "skipping root: {}", e);
                    continue;
                }
            };
            batch_documents.truncate(limit);

            let queried = batch_documents.len();
            let kept = pipeline.run(batch_documents);
            tracing::debug!(root = %batch.root, queried, kept = kept.len(), "root queried");
            documents.extend(kept);

            sources
                .entry(provider_key(&batch.provider))
                .or_insert_with(|| WatchedSource::new(batch.provider.clone()))
                .root_ids
                .insert(batch.root.root_id.clone());
        }

        sort_newest_first(&mut documents);

        self.observer.lock().watch(sources.into_values().collect());

        RecentsResult::ok(documents)
    }

    /// Install `observer`, releasing whatever observer was installed before
    pub fn set_observer(&self, observer: ContentObserver) {
        self.observer.lock().set_observer(observer);
    }

    pub fn clear_observer(&self) {
        self.observer.lock().clear_observer();
    }

    /// Whether an observer is currently subscribed to queried sources
    pub fn is_observing(&self) -> bool {
        self.observer
            .lock()
            .registration()
            .is_some_and(|registration| registration.is_active())
    }
}

async fn query_root(
    root: Root,
    provider: Arc<dyn DocumentsProvider>,
    limit: usize,
    timeout: Duration,
) -> RootBatch {
    let documents =
        match tokio::time::timeout(timeout, provider.query_recent_documents(&root.root_id, limit))
            .await
        {
            Ok(documents) => documents,
            Err(_) => Err(ProviderError::Timeout {
                root_id: root.root_id.clone(),
                elapsed: timeout,
            }),
        };

    RootBatch {
        root,
        provider,
        documents,
    }
}

fn provider_key(provider: &Arc<dyn DocumentsProvider>) -> usize {
    Arc::as_ptr(provider) as *const () as usize
}

fn sort_newest_first(documents: &mut [Document]) {
    documents.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.authority.cmp(&b.authority))
            .then_with(|| a.document_id.cmp(&b.document_id))
    });
}
