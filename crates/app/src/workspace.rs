//! Workspace description: the providers, roots and documents a run of
//!  the CLI aggregates over, plus the recents settings to use.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use common::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to read workspace: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse workspace: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write workspace: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid recents settings: {0}")]
    Config(#[from] ConfigError),
    #[error("provider {authority} is declared twice for {user}")]
    DuplicateProvider { authority: String, user: UserId },
    #[error("document {document_id} references unknown root {root_id} of {authority}")]
    UnknownRoot {
        authority: String,
        root_id: String,
        document_id: String,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    /// Users whose profile is locked
    #[serde(default)]
    pub quiet_users: Vec<UserId>,
    #[serde(default)]
    pub recents: RecentsConfig,
    #[serde(default)]
    pub providers: Vec<ProviderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub authority: String,
    #[serde(default)]
    pub user: UserId,
    #[serde(default)]
    pub roots: Vec<RootEntry>,
    #[serde(default)]
    pub documents: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootEntry {
    pub root_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// e.g. `"SUPPORTS_RECENTS | LOCAL_ONLY"`
    #[serde(default)]
    pub flags: RootFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub root_id: String,
    pub document_id: String,
    /// Defaults to the last segment of the document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Guessed from the display name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Defaults to the time the workspace is loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default)]
    pub flags: DocumentFlags,
}

impl DocumentEntry {
    fn to_document(&self, authority: &str, now: DateTime<Utc>) -> Document {
        let display_name = self.display_name.clone().unwrap_or_else(|| {
            self.document_id
                .rsplit('/')
                .next()
                .unwrap_or(&self.document_id)
                .to_string()
        });

        let mut document = Document::file(authority, display_name)
            .with_id(self.document_id.clone())
            .with_flags(self.flags)
            .with_last_modified(self.last_modified.unwrap_or(now));
        if let Some(mime_type) = &self.mime_type {
            document = document.with_mime_type(mime_type.clone());
        }
        document.size = self.size;
        document
    }
}

impl Workspace {
    pub fn from_toml_str(s: &str) -> Result<Self, WorkspaceError> {
        let workspace: Workspace = toml::from_str(s)?;
        workspace.validate()?;
        Ok(workspace)
    }

    pub fn load(path: &Path) -> Result<Self, WorkspaceError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, WorkspaceError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), WorkspaceError> {
        self.recents.validate()?;

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if !seen.insert((provider.user, provider.authority.as_str())) {
                return Err(WorkspaceError::DuplicateProvider {
                    authority: provider.authority.clone(),
                    user: provider.user,
                });
            }

            let root_ids: HashSet<&str> = provider
                .roots
                .iter()
                .map(|root| root.root_id.as_str())
                .collect();
            if let Some(document) = provider
                .documents
                .iter()
                .find(|document| !root_ids.contains(document.root_id.as_str()))
            {
                return Err(WorkspaceError::UnknownRoot {
                    authority: provider.authority.clone(),
                    root_id: document.root_id.clone(),
                    document_id: document.document_id.clone(),
                });
            }
        }

        Ok(())
    }

    /// In-memory providers and user state for this workspace
    pub fn build(&self) -> (ProvidersAccess, Arc<StaticUserManager>) {
        let now = Utc::now();
        let mut providers = ProvidersAccess::new();

        for entry in &self.providers {
            let provider = Arc::new(MemoryDocumentsProvider::new(entry.authority.clone()));

            let mut by_root: BTreeMap<&str, Vec<Document>> = entry
                .roots
                .iter()
                .map(|root| (root.root_id.as_str(), Vec::new()))
                .collect();
            for document in &entry.documents {
                by_root
                    .entry(document.root_id.as_str())
                    .or_default()
                    .push(document.to_document(&entry.authority, now));
            }
            for (root_id, documents) in by_root {
                provider.set_recent_documents(root_id, documents);
            }

            let roots = entry.roots.iter().map(|root| {
                let mut built = Root::new(&entry.authority, &root.root_id, entry.user, root.flags);
                if let Some(title) = &root.title {
                    built = built.with_title(title.clone());
                }
                built
            });
            providers.register(entry.user, provider, roots);
        }

        let users = Arc::new(StaticUserManager::with_quiet_users(
            self.quiet_users.iter().copied(),
        ));
        (providers, users)
    }

    /// A small workspace to start from: a personal and a work profile
    pub fn sample() -> Self {
        let now = Utc::now();
        let work = UserId::new(10);
        let document = |root_id: &str, document_id: &str, age: Duration| DocumentEntry {
            root_id: root_id.to_string(),
            document_id: document_id.to_string(),
            display_name: None,
            mime_type: None,
            last_modified: Some(now - age),
            size: None,
            flags: DocumentFlags::SUPPORTS_WRITE
                | DocumentFlags::SUPPORTS_DELETE
                | DocumentFlags::SUPPORTS_MOVE,
        };

        Workspace {
            quiet_users: Vec::new(),
            recents: RecentsConfig::default(),
            providers: vec![
                ProviderEntry {
                    authority: "com.example.home".to_string(),
                    user: UserId::DEFAULT,
                    roots: vec![RootEntry {
                        root_id: "home".to_string(),
                        title: Some("Home".to_string()),
                        flags: RootFlags::SUPPORTS_RECENTS
                            | RootFlags::LOCAL_ONLY
                            | RootFlags::SUPPORTS_CREATE,
                    }],
                    documents: vec![
                        document("home", "photos/freddy.jpg", Duration::hours(2)),
                        document("home", "notes/todo.txt", Duration::minutes(5)),
                        document("home", ".config/settings.json", Duration::minutes(1)),
                    ],
                },
                ProviderEntry {
                    authority: "com.example.downloads".to_string(),
                    user: work,
                    roots: vec![RootEntry {
                        root_id: "downloads".to_string(),
                        title: Some("Work downloads".to_string()),
                        flags: RootFlags::SUPPORTS_RECENTS,
                    }],
                    documents: vec![document("downloads", "report.pdf", Duration::days(1))],
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKSPACE: &str = r#"
        quiet_users = [11]

        [recents]
        max_docs_per_root = 8

        [recents.permissions]
        mode = "per_profile"
        grants = [{ user = 10, allowed = true }]

        [[providers]]
        authority = "com.example.home"
        user = 0
        roots = [{ root_id = "home", title = "Home", flags = "SUPPORTS_RECENTS | LOCAL_ONLY" }]

        [[providers.documents]]
        root_id = "home"
        document_id = "photos/freddy.jpg"
        last_modified = "2026-10-18T12:00:00Z"
        flags = "SUPPORTS_MOVE | SUPPORTS_DELETE"
    "#;

    #[test]
    fn test_parse_and_build() {
        let workspace = Workspace::from_toml_str(WORKSPACE).unwrap();
        assert_eq!(workspace.recents.max_docs_per_root, 8);
        assert_eq!(workspace.quiet_users, vec![UserId::new(11)]);

        let (providers, users) = workspace.build();
        assert!(users.is_quiet_mode_enabled(UserId::new(11)));

        let root = &providers.roots()[0];
        assert_eq!(root.title, "Home");
        assert!(root.supports_recents());
        assert!(root.is_local_only());
        assert!(providers.provider_for(root).is_some());
    }

    #[tokio::test]
    async fn test_built_documents() {
        let workspace = Workspace::from_toml_str(WORKSPACE).unwrap();
        let (providers, _) = workspace.build();
        let root = providers.roots()[0].clone();

        let documents = providers
            .provider_for(&root)
            .unwrap()
            .query_recent_documents("home", 10)
            .await
            .unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].display_name, "freddy.jpg");
        assert_eq!(documents[0].mime_type, "image/jpeg");
        assert!(documents[0].flags.contains(DocumentFlags::SUPPORTS_MOVE));
    }

    #[test]
    fn test_unknown_root_rejected() {
        let result = Workspace::from_toml_str(
            r#"
            [[providers]]
            authority = "com.example.home"
            roots = [{ root_id = "home" }]

            [[providers.documents]]
            root_id = "elsewhere"
            document_id = "a.txt"
            "#,
        );
        assert!(matches!(result, Err(WorkspaceError::UnknownRoot { .. })));
    }

    #[test]
    fn test_duplicate_provider_rejected() {
        let result = Workspace::from_toml_str(
            r#"
            [[providers]]
            authority = "com.example.home"

            [[providers]]
            authority = "com.example.home"
            "#,
        );
        assert!(matches!(
            result,
            Err(WorkspaceError::DuplicateProvider { .. })
        ));
    }

    #[test]
    fn test_sample_round_trips() {
        let sample = Workspace::sample();
        let toml = sample.to_toml_string().unwrap();
        let parsed = Workspace::from_toml_str(&toml).unwrap();
        assert_eq!(parsed.providers.len(), 2);
        assert_eq!(parsed.providers[1].user, UserId::new(10));
    }
}
