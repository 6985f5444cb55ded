use clap::Args;

use crate::state::{AppState, StateError};
use crate::workspace::Workspace;

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Start from an empty workspace instead of the sample one
    #[arg(long)]
    pub empty: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let workspace = if self.empty {
            Workspace::default()
        } else {
            Workspace::sample()
        };

        let state = AppState::init(ctx.config_path.clone(), Some(workspace))?;

        let roots: usize = state
            .workspace
            .providers
            .iter()
            .map(|provider| provider.roots.len())
            .sum();

        Ok(format!(
            "Initialized recents directory at: {}\n\
             - Workspace: {}\n\
             - Providers: {}\n\
             - Roots: {}",
            state.recents_dir.display(),
            state.workspace_path.display(),
            state.workspace.providers.len(),
            roots
        ))
    }
}
