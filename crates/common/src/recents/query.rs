use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// Who is asking, on whose behalf, and what they want to see
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub requesting_user: UserId,
    pub target_user: UserId,
    #[serde(default)]
    pub show_hidden: bool,
    /// Mime patterns such as `*/*` or `image/*`
    #[serde(default = "default_accept_mimes")]
    pub accept_mimes: Vec<String>,
}

fn default_accept_mimes() -> Vec<String> {
    vec!["*/*".to_string()]
}

impl QueryContext {
    /// A user asking about their own profile
    pub fn new(user: UserId) -> Self {
        Self {
            requesting_user: user,
            target_user: user,
            show_hidden: false,
            accept_mimes: default_accept_mimes(),
        }
    }

    /// Ask about another profile on behalf of `requesting_user`
    pub fn cross_profile(requesting_user: UserId, target_user: UserId) -> Self {
        Self {
            target_user,
            ..Self::new(requesting_user)
        }
    }

    pub fn with_show_hidden(mut self, show_hidden: bool) -> Self {
        self.show_hidden = show_hidden;
        self
    }

    pub fn with_accept_mimes<S: Into<String>>(mut self, mimes: impl IntoIterator<Item = S>) -> Self {
        self.accept_mimes = mimes.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_cross_profile(&self) -> bool {
        self.requesting_user != self.target_user
    }
}
