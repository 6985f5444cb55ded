//! Cross-profile forwarding policies
//!
//! Whether a request from one user may reach another user's profile is
//!  represented one of two ways, depending on how the device is configured:
//!
//! - a single flag covering every other profile ([`SharedProfileFlag`])
//! - a per-profile map ([`ProfilePermissionMap`]), unknown profiles are denied
//!
//! Aggregation only ever talks to [`CrossProfilePolicy`].

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::user::UserId;

pub trait CrossProfilePolicy: Send + Sync + Debug {
    /// Whether requests may be forwarded to `target`'s profile
    fn can_forward_to_profile(&self, target: UserId) -> bool;
}

/// One flag for all profiles
#[derive(Debug, Default)]
pub struct SharedProfileFlag {
    can_share: AtomicBool,
}

impl SharedProfileFlag {
    pub fn new(can_share: bool) -> Self {
        Self {
            can_share: AtomicBool::new(can_share),
        }
    }

    pub fn set(&self, can_share: bool) {
        self.can_share.store(can_share, Ordering::SeqCst);
    }
}

impl CrossProfilePolicy for SharedProfileFlag {
    fn can_forward_to_profile(&self, _target: UserId) -> bool {
        self.can_share.load(Ordering::SeqCst)
    }
}

/// Permission tracked per target profile
#[derive(Debug, Default)]
pub struct ProfilePermissionMap {
    grants: RwLock<HashMap<UserId, bool>>,
}

impl ProfilePermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grants(grants: impl IntoIterator<Item = (UserId, bool)>) -> Self {
        Self {
            grants: RwLock::new(grants.into_iter().collect()),
        }
    }

    pub fn set(&self, target: UserId, allowed: bool) {
        self.grants.write().insert(target, allowed);
    }

    pub fn revoke(&self, target: UserId) {
        self.grants.write().remove(&target);
    }
}

impl CrossProfilePolicy for ProfilePermissionMap {
    fn can_forward_to_profile(&self, target: UserId) -> bool {
        self.grants.read().get(&target).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_flag() {
        let policy = SharedProfileFlag::new(true);
        assert!(policy.can_forward_to_profile(UserId::new(10)));
        assert!(policy.can_forward_to_profile(UserId::new(11)));

        policy.set(false);
        assert!(!policy.can_forward_to_profile(UserId::new(10)));
    }

    #[test]
    fn test_profile_map() {
        let work = UserId::new(10);
        let policy = ProfilePermissionMap::with_grants([(UserId::DEFAULT, true), (work, true)]);
        assert!(policy.can_forward_to_profile(work));
        assert!(!policy.can_forward_to_profile(UserId::new(11)));

        policy.set(work, false);
        assert!(!policy.can_forward_to_profile(work));

        policy.set(work, true);
        policy.revoke(work);
        assert!(!policy.can_forward_to_profile(work));
    }
}
