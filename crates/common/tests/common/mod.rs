//! Shared test environment for recents integration tests
#![allow(dead_code)]

use std::sync::Arc;

use common::config::RecentsConfig;
use common::permission::{CrossProfilePolicy, ProfilePermissionMap, SharedProfileFlag};
use common::provider::{MemoryDocumentsProvider, ProvidersAccess};
use common::recents::{QueryContext, RecentsAggregator};
use common::root::{Root, RootFlags};
use common::user::{StaticUserManager, UserId};

pub const USER_ID: UserId = UserId(0);
pub const OTHER_USER_ID: UserId = UserId(10);

pub const HOME: &str = "com.example.home";
pub const DOWNLOADS: &str = "com.example.downloads";
pub const PICKLES: &str = "pickles";

/// The two ways cross-profile permission can be represented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionMode {
    SharedFlag,
    PerProfile,
}

pub const PERMISSION_MODES: [PermissionMode; 2] =
    [PermissionMode::SharedFlag, PermissionMode::PerProfile];

pub fn home_root() -> Root {
    Root::new(
        HOME,
        "home",
        USER_ID,
        RootFlags::SUPPORTS_CREATE
            | RootFlags::SUPPORTS_IS_CHILD
            | RootFlags::LOCAL_ONLY
            | RootFlags::SUPPORTS_RECENTS,
    )
    .with_title("Home")
}

pub fn downloads_root() -> Root {
    Root::new(
        DOWNLOADS,
        "downloads",
        USER_ID,
        RootFlags::LOCAL_ONLY
            | RootFlags::SUPPORTS_CREATE
            | RootFlags::SUPPORTS_IS_CHILD
            | RootFlags::SUPPORTS_RECENTS,
    )
    .with_title("Downloads")
}

pub fn pickles_root() -> Root {
    Root::new(PICKLES, "pickles", USER_ID, RootFlags::empty()).with_title("Pickles")
}

pub fn other_downloads_root() -> Root {
    Root::new(
        DOWNLOADS,
        "downloads",
        OTHER_USER_ID,
        RootFlags::SUPPORTS_CREATE | RootFlags::SUPPORTS_IS_CHILD | RootFlags::SUPPORTS_RECENTS,
    )
    .with_title("Downloads")
}

pub struct TestEnv {
    pub mode: PermissionMode,
    pub home: Arc<MemoryDocumentsProvider>,
    pub downloads: Arc<MemoryDocumentsProvider>,
    pub pickles: Arc<MemoryDocumentsProvider>,
    pub other_downloads: Arc<MemoryDocumentsProvider>,
    pub providers: ProvidersAccess,
    pub users: Arc<StaticUserManager>,
    pub shared_flag: Arc<SharedProfileFlag>,
    pub profile_map: Arc<ProfilePermissionMap>,
}

impl TestEnv {
    /// Every profile starts out reachable
    pub fn create(mode: PermissionMode) -> Self {
        let home = Arc::new(MemoryDocumentsProvider::new(HOME));
        let downloads = Arc::new(MemoryDocumentsProvider::new(DOWNLOADS));
        let pickles = Arc::new(MemoryDocumentsProvider::new(PICKLES));
        let other_downloads = Arc::new(MemoryDocumentsProvider::new(DOWNLOADS));

        let mut providers = ProvidersAccess::new();
        providers
            .register(USER_ID, home.clone(), vec![home_root()])
            .register(USER_ID, downloads.clone(), vec![downloads_root()])
            .register(USER_ID, pickles.clone(), vec![pickles_root()])
            .register(
                OTHER_USER_ID,
                other_downloads.clone(),
                vec![other_downloads_root()],
            );

        Self {
            mode,
            home,
            downloads,
            pickles,
            other_downloads,
            providers,
            users: Arc::new(StaticUserManager::new()),
            shared_flag: Arc::new(SharedProfileFlag::new(true)),
            profile_map: Arc::new(ProfilePermissionMap::with_grants([
                (USER_ID, true),
                (OTHER_USER_ID, true),
            ])),
        }
    }

    pub fn policy(&self) -> Arc<dyn CrossProfilePolicy> {
        match self.mode {
            PermissionMode::SharedFlag => self.shared_flag.clone(),
            PermissionMode::PerProfile => self.profile_map.clone(),
        }
    }

    /// Take away permission to reach the other user's profile
    pub fn deny_other_user(&self) {
        match self.mode {
            PermissionMode::SharedFlag => self.shared_flag.set(false),
            PermissionMode::PerProfile => self.profile_map.set(OTHER_USER_ID, false),
        }
    }

    pub fn aggregator(&self) -> RecentsAggregator {
        self.aggregator_with(RecentsConfig::default())
    }

    pub fn aggregator_with(&self, config: RecentsConfig) -> RecentsAggregator {
        RecentsAggregator::new(
            self.providers.clone(),
            self.policy(),
            self.users.clone(),
            config,
        )
    }

    pub fn query(&self) -> QueryContext {
        QueryContext::new(USER_ID)
    }
}

/// Opt-in log output, e.g. `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
