use std::collections::BTreeMap;
use std::sync::Arc;

use super::provider::DocumentsProvider;
use crate::root::Root;
use crate::user::UserId;

/// Registry of known roots and the providers serving them
///
/// Providers are keyed by the user they run for and their
///  authority, so every user gets its own provider instance.
#[derive(Debug, Clone, Default)]
pub struct ProvidersAccess {
    providers: BTreeMap<(UserId, String), Arc<dyn DocumentsProvider>>,
    roots: Vec<Root>,
}

impl ProvidersAccess {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider running for `user` along with the roots it serves
    ///
    /// Roots are re-scoped to the provider's authority and `user`; registering
    ///  the same authority for the same user again replaces the provider
    ///  and its roots.
    pub fn register(
        &mut self,
        user: UserId,
        provider: Arc<dyn DocumentsProvider>,
        roots: impl IntoIterator<Item = Root>,
    ) -> &mut Self {
        let authority = provider.authority().to_string();

        self.roots
            .retain(|root| !(root.user_id == user && root.authority == authority));

        for mut root in roots {
            if root.authority != authority || root.user_id != user {
                tracing::warn!(
                    root = %root,
                    %authority,
                    %user,
                    "root registered under a different provider, re-scoping"
                );
                root.authority = authority.clone();
                root.user_id = user;
            }
            self.roots.push(root);
        }

        self.providers.insert((user, authority), provider);
        self
    }

    /// All known roots, in registration order
    pub fn roots(&self) -> &[Root] {
        &self.roots
    }

    /// Roots belonging to a single user
    pub fn roots_for_user(&self, user: UserId) -> impl Iterator<Item = &Root> {
        self.roots.iter().filter(move |root| root.user_id == user)
    }

    /// The provider serving `root`, if it is still registered
    pub fn provider_for(&self, root: &Root) -> Option<Arc<dyn DocumentsProvider>> {
        self.providers
            .get(&(root.user_id, root.authority.clone()))
            .cloned()
    }

    pub fn provider(&self, user: UserId, authority: &str) -> Option<Arc<dyn DocumentsProvider>> {
        self.providers.get(&(user, authority.to_string())).cloned()
    }
}
