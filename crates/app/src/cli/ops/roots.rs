use clap::Args;

use common::prelude::*;

use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Roots {
    /// Profile whose recents would be listed
    #[arg(long, default_value_t = 0)]
    pub target_user: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum RootsError {
    #[error(transparent)]
    State(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Roots {
    type Error = RootsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let (providers, _) = state.workspace.build();
        let target_user = UserId::new(self.target_user);

        if providers.roots().is_empty() {
            return Ok("No roots configured".to_string());
        }

        Ok(providers
            .roots()
            .iter()
            .map(|root| {
                let status = if should_ignore_root(root, target_user) {
                    "ignored"
                } else {
                    "queried"
                };
                format!("{} [{}] {:?}", root, status, root.flags)
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
