use std::collections::HashSet;
use std::fmt;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identifier of a user profile
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl UserId {
    /// The primary user of a device
    pub const DEFAULT: UserId = UserId(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user:{}", self.0)
    }
}

impl From<u32> for UserId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Knowledge about the state of user profiles
pub trait UserManager: Send + Sync + fmt::Debug {
    /// Whether the profile is locked or otherwise inactive,
    ///  in which case nothing may be queried on its behalf
    fn is_quiet_mode_enabled(&self, user: UserId) -> bool;
}

/// In-memory user manager, quiet mode is toggled per user
#[derive(Debug, Default)]
pub struct StaticUserManager {
    quiet: RwLock<HashSet<UserId>>,
}

impl StaticUserManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quiet_users(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            quiet: RwLock::new(users.into_iter().collect()),
        }
    }

    pub fn set_quiet_mode(&self, user: UserId, enabled: bool) {
        let mut quiet = self.quiet.write();
        if enabled {
            quiet.insert(user);
        } else {
            quiet.remove(&user);
        }
    }
}

impl UserManager for StaticUserManager {
    fn is_quiet_mode_enabled(&self, user: UserId) -> bool {
        self.quiet.read().contains(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_mode_toggle() {
        let users = StaticUserManager::new();
        let work = UserId::new(10);

        assert!(!users.is_quiet_mode_enabled(work));
        users.set_quiet_mode(work, true);
        assert!(users.is_quiet_mode_enabled(work));
        assert!(!users.is_quiet_mode_enabled(UserId::DEFAULT));
        users.set_quiet_mode(work, false);
        assert!(!users.is_quiet_mode_enabled(work));
    }

    #[test]
    fn test_display() {
        assert_eq!(UserId::new(10).to_string(), "user:10");
    }
}
