//! Default-assignee resolution as an ordered chain of lookups.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Role, User};
use crate::ports::{AssigneeResolver, UserDirectory};

/// One step of the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum AssigneeLookup {
    Username(String),
    Role(Role),
}

impl fmt::Display for AssigneeLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssigneeLookup::Username(name) => write!(f, "username={name}"),
            AssigneeLookup::Role(role) => write!(f, "role={role:?}"),
        }
    }
}

/// Manager account first, then the administrator.
pub fn default_assignee_chain() -> Vec<AssigneeLookup> {
    vec![
        AssigneeLookup::Username("manager".to_string()),
        AssigneeLookup::Username("admin".to_string()),
    ]
}

/// Tries each lookup in order and returns the first user found.
pub struct FallbackChainResolver {
    users: Arc<dyn UserDirectory>,
    chain: Vec<AssigneeLookup>,
}

impl FallbackChainResolver {
    pub fn new(users: Arc<dyn UserDirectory>, chain: Vec<AssigneeLookup>) -> Self {
        Self { users, chain }
    }

    pub fn chain(&self) -> &[AssigneeLookup] {
        &self.chain
    }
}

#[async_trait]
impl AssigneeResolver for FallbackChainResolver {
    async fn default_assignee(&self) -> Option<User> {
        for lookup in &self.chain {
            let found = match lookup {
                AssigneeLookup::Username(name) => self.users.find_by_username(name).await,
                AssigneeLookup::Role(role) => self.users.find_first_with_role(*role).await,
            };
            match found {
                Ok(Some(user)) => {
                    debug!(%lookup, username = %user.username, "default assignee resolved");
                    return Some(user);
                }
                Ok(None) => debug!(%lookup, "no user for assignee lookup"),
                // a broken lookup is treated like an empty one
                Err(err) => warn!(%lookup, error = %err, "assignee lookup failed"),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StoreError, UserId};
    use crate::impls::InMemoryUserDirectory;
    use ulid::Ulid;

    fn user(name: &str, roles: Vec<Role>) -> User {
        User::new(UserId::from_ulid(Ulid::new()), name, roles)
    }

    #[tokio::test]
    async fn prefers_first_lookup() {
        let users = InMemoryUserDirectory::with_users([
            user("admin", vec![Role::Admin]),
            user("manager", vec![Role::Manager]),
        ]);
        let resolver = FallbackChainResolver::new(Arc::new(users), default_assignee_chain());

        let found = resolver.default_assignee().await.unwrap();
        assert_eq!(found.username, "manager");
    }

    #[tokio::test]
    async fn falls_back_to_admin() {
        let users = InMemoryUserDirectory::with_users([user("admin", vec![Role::Admin])]);
        let resolver = FallbackChainResolver::new(Arc::new(users), default_assignee_chain());

        let found = resolver.default_assignee().await.unwrap();
        assert_eq!(found.username, "admin");
    }

    #[tokio::test]
    async fn none_when_chain_is_exhausted() {
        let users = InMemoryUserDirectory::with_users([user("clerk", vec![Role::User])]);
        let resolver = FallbackChainResolver::new(Arc::new(users), default_assignee_chain());

        assert!(resolver.default_assignee().await.is_none());
    }

    #[tokio::test]
    async fn role_lookup_picks_lowest_username() {
        let users = InMemoryUserDirectory::with_users([
            user("zoe", vec![Role::Manager]),
            user("anna", vec![Role::Manager, Role::Admin]),
        ]);
        let resolver = FallbackChainResolver::new(
            Arc::new(users),
            vec![AssigneeLookup::Role(Role::Manager)],
        );

        assert_eq!(resolver.default_assignee().await.unwrap().username, "anna");
    }

    struct BrokenDirectory;

    #[async_trait]
    impl UserDirectory for BrokenDirectory {
        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, StoreError> {
            Err(StoreError::Unavailable("users offline".into()))
        }

        async fn find_first_with_role(&self, _role: Role) -> Result<Option<User>, StoreError> {
            Err(StoreError::Unavailable("users offline".into()))
        }
    }

    #[tokio::test]
    async fn lookup_errors_resolve_to_none() {
        let resolver = FallbackChainResolver::new(Arc::new(BrokenDirectory), default_assignee_chain());
        assert!(resolver.default_assignee().await.is_none());
    }

    #[test]
    fn lookup_config_shape() {
        let chain: Vec<AssigneeLookup> = serde_json::from_str(
            r#"[{"by":"username","value":"manager"},{"by":"role","value":"ADMIN"}]"#,
        )
        .unwrap();
        assert_eq!(
            chain,
            vec![
                AssigneeLookup::Username("manager".into()),
                AssigneeLookup::Role(Role::Admin),
            ]
        );
    }
}
