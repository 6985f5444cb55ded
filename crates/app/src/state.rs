use std::{fs, path::PathBuf};

use crate::workspace::{Workspace, WorkspaceError};

pub const APP_NAME: &str = "recents";
pub const WORKSPACE_FILE_NAME: &str = "workspace.toml";

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the recents directory (~/.recents)
    pub recents_dir: PathBuf,
    /// Path to the workspace file
    pub workspace_path: PathBuf,
    /// Loaded workspace
    pub workspace: Workspace,
}

impl AppState {
    /// Get the recents directory path (custom or default ~/.recents)
    pub fn recents_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new recents directory holding `workspace`
    pub fn init(
        custom_path: Option<PathBuf>,
        workspace: Option<Workspace>,
    ) -> Result<Self, StateError> {
        let recents_dir = Self::recents_dir(custom_path)?;
        let workspace_path = recents_dir.join(WORKSPACE_FILE_NAME);

        if workspace_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&recents_dir)?;

        let workspace = workspace.unwrap_or_else(Workspace::sample);
        fs::write(&workspace_path, workspace.to_toml_string()?)?;

        Ok(Self {
            recents_dir,
            workspace_path,
            workspace,
        })
    }

    /// Load existing state from the recents directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let recents_dir = Self::recents_dir(custom_path)?;
        let workspace_path = recents_dir.join(WORKSPACE_FILE_NAME);

        if !workspace_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let workspace = Workspace::load(&workspace_path)?;

        Ok(Self {
            recents_dir,
            workspace_path,
            workspace,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("recents directory not initialized. Run 'recents init' first")]
    NotInitialized,

    #[error("recents directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recents");

        let state = AppState::init(Some(path.clone()), None).unwrap();
        assert!(state.workspace_path.exists());

        let loaded = AppState::load(Some(path)).unwrap();
        assert_eq!(
            loaded.workspace.providers.len(),
            state.workspace.providers.len()
        );
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        AppState::init(Some(path.clone()), None).unwrap();
        assert!(matches!(
            AppState::init(Some(path), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().join("missing"))),
            Err(StateError::NotInitialized)
        ));
    }
}
