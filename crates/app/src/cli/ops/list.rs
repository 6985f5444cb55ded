use clap::Args;

use common::prelude::*;

use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct List {
    /// User asking for the listing
    #[arg(long, default_value_t = 0)]
    pub user: u32,

    /// Profile to list (defaults to --user)
    #[arg(long)]
    pub target_user: Option<u32>,

    /// Include documents whose name or path starts with the hidden prefix
    #[arg(long)]
    pub show_hidden: bool,

    /// Mime patterns to accept, e.g. image/* (repeatable)
    #[arg(long = "accept", default_value = "*/*")]
    pub accept_mimes: Vec<String>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("recents unavailable: {0}")]
    Refused(#[from] RecentsError),
    #[error("failed to encode result: {0}")]
    Json(#[from] serde_json::Error),
}

impl List {
    fn query(&self) -> QueryContext {
        let requesting_user = UserId::new(self.user);
        let target_user = self.target_user.map(UserId::new).unwrap_or(requesting_user);

        QueryContext::cross_profile(requesting_user, target_user)
            .with_show_hidden(self.show_hidden)
            .with_accept_mimes(self.accept_mimes.iter().cloned())
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for List {
    type Error = ListError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let (providers, users) = state.workspace.build();
        let aggregator =
            RecentsAggregator::from_config(state.workspace.recents.clone(), providers, users);

        let query = self.query();
        tracing::debug!(?query, "listing recents");
        let result = aggregator.aggregate(&query).await;

        if self.json {
            return Ok(serde_json::to_string_pretty(&result)?);
        }

        let documents = result.into_documents()?;
        if documents.is_empty() {
            return Ok("No recent documents".to_string());
        }

        Ok(documents
            .iter()
            .map(format_document)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

fn format_document(document: &Document) -> String {
    format!(
        "{}  {}  {} [{}]",
        document.last_modified.format("%Y-%m-%d %H:%M"),
        document.authority,
        document.document_id,
        document.mime_type
    )
}
