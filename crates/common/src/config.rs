use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::filter::DEFAULT_HIDDEN_PREFIX;
use crate::permission::{CrossProfilePolicy, ProfilePermissionMap, SharedProfileFlag};
use crate::user::UserId;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How cross-profile forwarding permission is represented
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PermissionConfig {
    /// One flag for every other profile
    SharedFlag {
        #[serde(default)]
        can_share_across_profiles: bool,
    },
    /// Permission listed per target profile, unlisted profiles are denied
    PerProfile {
        #[serde(default)]
        grants: Vec<ProfileGrant>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileGrant {
    pub user: UserId,
    pub allowed: bool,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        PermissionConfig::SharedFlag {
            can_share_across_profiles: false,
        }
    }
}

impl PermissionConfig {
    /// Build the policy this configuration describes
    pub fn build(&self) -> Arc<dyn CrossProfilePolicy> {
        match self {
            PermissionConfig::SharedFlag {
                can_share_across_profiles,
            } => Arc::new(SharedProfileFlag::new(*can_share_across_profiles)),
            PermissionConfig::PerProfile { grants } => Arc::new(ProfilePermissionMap::with_grants(
                grants.iter().map(|grant| (grant.user, grant.allowed)),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentsConfig {
    /// Most documents a single root may contribute
    #[serde(default = "default_max_docs_per_root")]
    pub max_docs_per_root: usize,
    /// Roots queried at the same time
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
    /// Time a single root gets to answer before it is skipped
    #[serde(default = "default_root_query_timeout_ms")]
    pub root_query_timeout_ms: u64,
    /// Documents older than this many days are left out, 0 keeps all
    #[serde(default = "default_reject_older_than_days")]
    pub reject_older_than_days: Option<u32>,
    /// Prefix that marks a path segment as hidden
    #[serde(default = "default_hidden_prefix")]
    pub hidden_prefix: String,
    #[serde(default)]
    pub permissions: PermissionConfig,
}

fn default_max_docs_per_root() -> usize {
    64
}

fn default_max_concurrent_queries() -> usize {
    4
}

fn default_root_query_timeout_ms() -> u64 {
    2_000
}

fn default_reject_older_than_days() -> Option<u32> {
    Some(45)
}

fn default_hidden_prefix() -> String {
    DEFAULT_HIDDEN_PREFIX.to_string()
}

impl Default for RecentsConfig {
    fn default() -> Self {
        Self {
            max_docs_per_root: default_max_docs_per_root(),
            max_concurrent_queries: default_max_concurrent_queries(),
            root_query_timeout_ms: default_root_query_timeout_ms(),
            reject_older_than_days: default_reject_older_than_days(),
            hidden_prefix: default_hidden_prefix(),
            permissions: PermissionConfig::default(),
        }
    }
}

impl RecentsConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: RecentsConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_docs_per_root == 0 {
            return Err(ConfigError::Invalid(
                "max_docs_per_root must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_queries == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_queries must be at least 1".to_string(),
            ));
        }
        if self.root_query_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "root_query_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn root_query_timeout(&self) -> Duration {
        Duration::from_millis(self.root_query_timeout_ms)
    }

    pub fn reject_older_than(&self) -> Option<chrono::Duration> {
        self.reject_older_than_days
            .filter(|days| *days > 0)
            .map(|days| chrono::Duration::days(i64::from(days)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RecentsConfig::from_toml_str("").unwrap();
        assert_eq!(config, RecentsConfig::default());
        assert_eq!(config.max_docs_per_root, 64);
        assert_eq!(config.max_concurrent_queries, 4);
        assert_eq!(config.reject_older_than(), Some(chrono::Duration::days(45)));
        assert_eq!(config.hidden_prefix, ".");

        let keep_all = RecentsConfig::from_toml_str("reject_older_than_days = 0").unwrap();
        assert_eq!(keep_all.reject_older_than(), None);
    }

    #[test]
    fn test_per_profile_permissions() {
        let config = RecentsConfig::from_toml_str(
            r#"
            max_docs_per_root = 10

            [permissions]
            mode = "per_profile"
            grants = [
                { user = 0, allowed = true },
                { user = 10, allowed = false },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(config.max_docs_per_root, 10);
        let policy = config.permissions.build();
        assert!(policy.can_forward_to_profile(UserId::DEFAULT));
        assert!(!policy.can_forward_to_profile(UserId::new(10)));
        assert!(!policy.can_forward_to_profile(UserId::new(11)));
    }

    #[test]
    fn test_shared_flag_permissions() {
        let config = RecentsConfig::from_toml_str(
            r#"
            [permissions]
            mode = "shared_flag"
            can_share_across_profiles = true
            "#,
        )
        .unwrap();

        assert!(config
            .permissions
            .build()
            .can_forward_to_profile(UserId::new(10)));
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            RecentsConfig::from_toml_str("max_docs_per_root = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RecentsConfig::from_toml_str("[permissions]\nmode = \"sometimes\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "root_query_timeout_ms = 250").unwrap();

        let config = RecentsConfig::load(file.path()).unwrap();
        assert_eq!(config.root_query_timeout(), Duration::from_millis(250));

        let missing = RecentsConfig::load(Path::new("/nonexistent/recents.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
