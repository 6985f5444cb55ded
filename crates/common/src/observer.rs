//! Change observation for recents listings
//!
//! A [`ContentObserver`] wraps the callback a caller wants to run when any
//!  queried source changes. Registering it against a set of
//!  [`WatchedSource`]s yields an [`ObserverRegistration`]:
//!
//! - one forwarder task per provider listens to the provider's change feed
//!   and passes along changes that touch a watched root
//! - a dedicated dispatcher thread runs the callback, once per change, never
//!   on the task that queried the sources
//!
//! Dropping the registration releases all of it. [`ObserverSlot`] holds the
//!  current observer and registration and guarantees the old registration is
//!  released before a new one is installed.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::provider::{ContentChange, DocumentsProvider};

const DISPATCHER_THREAD_NAME: &str = "recents-observer";

#[derive(thiserror::Error, Debug)]
pub enum ObserverError {
    /// Forwarders need a tokio runtime to run on
    #[error("no tokio runtime available to watch sources")]
    NoRuntime,
    #[error("failed to start dispatcher thread: {0}")]
    Dispatcher(#[from] std::io::Error),
}

/// Callback run when watched content changes
#[derive(Clone)]
pub struct ContentObserver {
    id: Uuid,
    callback: Arc<dyn Fn() + Send + Sync>,
}

impl ContentObserver {
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            callback: Arc::new(callback),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn notify(&self) {
        (self.callback)()
    }
}

impl fmt::Debug for ContentObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentObserver")
            .field("id", &self.id)
            .finish()
    }
}

/// A provider and the roots of it that were queried
#[derive(Debug, Clone)]
pub struct WatchedSource {
    pub provider: Arc<dyn DocumentsProvider>,
    pub root_ids: BTreeSet<String>,
}

impl WatchedSource {
    pub fn new(provider: Arc<dyn DocumentsProvider>) -> Self {
        Self {
            provider,
            root_ids: BTreeSet::new(),
        }
    }

    fn watches(&self, change: &ContentChange) -> bool {
        self.root_ids.iter().any(|root_id| change.affects(root_id))
    }
}

/// Live registration of an observer on a set of sources
#[derive(Debug)]
pub struct ObserverRegistration {
    id: Uuid,
    observer_id: Uuid,
    active: Arc<AtomicBool>,
    forwarders: Vec<JoinHandle<()>>,
}

impl ObserverRegistration {
    /// Subscribe `observer` to every source. Changes published after
    ///  this returns are delivered.
    pub fn register(
        observer: &ContentObserver,
        sources: &[WatchedSource],
    ) -> Result<Self, ObserverError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ObserverError::NoRuntime)?;

        let id = Uuid::new_v4();
        let active = Arc::new(AtomicBool::new(true));
        let mut registration = Self {
            id,
            observer_id: observer.id(),
            active: active.clone(),
            forwarders: Vec::with_capacity(sources.len()),
        };

        if sources.is_empty() {
            return Ok(registration);
        }

        let (tx, rx) = flume::unbounded::<ContentChange>();

        let dispatched = observer.clone();
        std::thread::Builder::new()
            .name(DISPATCHER_THREAD_NAME.to_string())
            .spawn(move || {
                // Exits once every forwarder is gone
                while let Ok(change) = rx.recv() {
                    if !active.load(Ordering::SeqCst) {
                        break;
                    }
                    tracing::debug!(
                        registration = %id,
                        authority = %change.authority,
                        root_id = ?change.root_id,
                        "dispatching content change"
                    );
                    dispatched.notify();
                }
            })?;

        for source in sources {
            let rx = source.provider.subscribe();
            let forwarder = forward_changes(id, source.clone(), rx, tx.clone());
            registration.forwarders.push(runtime.spawn(forwarder));
        }

        tracing::info!(
            registration = %id,
            observer = %observer.id(),
            sources = sources.len(),
            "observer registered"
        );

        Ok(registration)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn observer_id(&self) -> Uuid {
        self.observer_id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for ObserverRegistration {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
        tracing::debug!(registration = %self.id, "observer released");
    }
}

async fn forward_changes(
    registration: Uuid,
    source: WatchedSource,
    mut rx: broadcast::Receiver<ContentChange>,
    tx: flume::Sender<ContentChange>,
) {
    loop {
        match rx.recv().await {
            Ok(change) => {
                if !source.watches(&change) {
                    continue;
                }
                if tx.send(change).is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                // Whatever was missed, the listing is stale
                tracing::warn!(%registration, "change feed lagged {} events", n);
                let change = ContentChange {
                    authority: source.provider.authority().to_string(),
                    root_id: None,
                };
                if tx.send(change).is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!(%registration, "change feed closed");
                break;
            }
        }
    }
}

/// The current observer, the sources it should watch and
///  the registration binding the two
#[derive(Debug, Default)]
pub struct ObserverSlot {
    observer: Option<ContentObserver>,
    sources: Vec<WatchedSource>,
    registration: Option<ObserverRegistration>,
}

impl ObserverSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the observer; the previous registration is
    ///  released before the new one is made
    pub fn set_observer(&mut self, observer: ContentObserver) {
        self.registration = None;
        self.observer = Some(observer);
        self.refresh();
    }

    pub fn clear_observer(&mut self) {
        self.registration = None;
        self.observer = None;
    }

    /// Replace the watched sources
    pub fn watch(&mut self, sources: Vec<WatchedSource>) {
        self.registration = None;
        self.sources = sources;
        self.refresh();
    }

    pub fn observer(&self) -> Option<&ContentObserver> {
        self.observer.as_ref()
    }

    pub fn registration(&self) -> Option<&ObserverRegistration> {
        self.registration.as_ref()
    }

    pub fn sources(&self) -> &[WatchedSource] {
        &self.sources
    }

    fn refresh(&mut self) {
        let Some(observer) = &self.observer else {
            return;
        };
        if self.sources.is_empty() {
            return;
        }

        match ObserverRegistration::register(observer, &self.sources) {
            Ok(registration) => self.registration = Some(registration),
            Err(ObserverError::NoRuntime) => {
                tracing::debug!("no runtime, observer registration deferred to next aggregation");
            }
            Err(e) => {
                tracing::warn!("failed to register observer: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MemoryDocumentsProvider;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn source(provider: &Arc<MemoryDocumentsProvider>, roots: &[&str]) -> WatchedSource {
        let provider: Arc<dyn DocumentsProvider> = provider.clone();
        WatchedSource {
            provider,
            root_ids: roots.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn counting_observer() -> (ContentObserver, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let observer = ContentObserver::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (observer, count)
    }

    async fn wait_for(count: &AtomicUsize, expected: usize) -> bool {
        for _ in 0..100 {
            if count.load(Ordering::SeqCst) >= expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[test]
    fn test_register_requires_runtime() {
        let provider = Arc::new(MemoryDocumentsProvider::new("home"));
        let (observer, _) = counting_observer();
        let result = ObserverRegistration::register(&observer, &[source(&provider, &["home"])]);
        assert!(matches!(result, Err(ObserverError::NoRuntime)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_change_dispatched_once() {
        let provider = Arc::new(MemoryDocumentsProvider::new("home"));
        let (observer, count) = counting_observer();
        let registration =
            ObserverRegistration::register(&observer, &[source(&provider, &["home"])]).unwrap();
        assert!(registration.is_active());

        provider.notify_change(Some("home"));
        assert!(wait_for(&count, 1).await);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unwatched_root_ignored() {
        let provider = Arc::new(MemoryDocumentsProvider::new("home"));
        let (observer, count) = counting_observer();
        let _registration =
            ObserverRegistration::register(&observer, &[source(&provider, &["home"])]).unwrap();

        provider.notify_change(Some("other"));
        provider.notify_change(None);

        assert!(wait_for(&count, 1).await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_replaced_observer_not_invoked() {
        let provider = Arc::new(MemoryDocumentsProvider::new("home"));
        let (first, first_count) = counting_observer();
        let (second, second_count) = counting_observer();

        let mut slot = ObserverSlot::new();
        slot.watch(vec![source(&provider, &["home"])]);
        slot.set_observer(first);
        slot.set_observer(second.clone());
        assert_eq!(slot.registration().unwrap().observer_id(), second.id());

        provider.notify_change(Some("home"));
        assert!(wait_for(&second_count, 1).await);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cleared_observer_releases_subscription() {
        let provider = Arc::new(MemoryDocumentsProvider::new("home"));
        let (observer, count) = counting_observer();

        let mut slot = ObserverSlot::new();
        slot.set_observer(observer);
        assert!(slot.registration().is_none());

        slot.watch(vec![source(&provider, &["home"])]);
        assert!(slot.registration().is_some());

        slot.clear_observer();
        assert!(slot.registration().is_none());

        provider.notify_change(Some("home"));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
