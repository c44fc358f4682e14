// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lookup of accounts by name and id.
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::error::Error;

use userprotect_core::{UserId, UserName};

/// Interface to the accounts of the host system.
pub trait UserDirectory {
    type Error: Error + Send + Sync + 'static;

    /// Maps user names to account ids. Names without an account are missing in the result.
    fn resolve_user_ids(
        &self,
        names: &BTreeSet<UserName>,
    ) -> impl Future<Output = Result<BTreeMap<UserName, UserId>, Self::Error>>;

    /// Returns `true` if an account with this id exists.
    fn user_exists(&self, user_id: UserId) -> impl Future<Output = Result<bool, Self::Error>>;

    /// Maps account ids back to user names. Unknown ids are missing in the result.
    fn user_names(
        &self,
        user_ids: &BTreeSet<UserId>,
    ) -> impl Future<Output = Result<BTreeMap<UserId, UserName>, Self::Error>>;
}

/// Identity making a request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Actor {
    /// Visitor without a stored account. Overrides never apply to them.
    Anonymous,
    User(UserId),
}

impl Actor {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Actor::Anonymous => None,
            Actor::User(user_id) => Some(*user_id),
        }
    }
}

/// Identifies the actor of a request. Ids the directory does not know count as anonymous.
pub async fn actor_for<D>(directory: &D, user_id: Option<UserId>) -> Result<Actor, D::Error>
where
    D: UserDirectory,
{
    let Some(user_id) = user_id else {
        return Ok(Actor::Anonymous);
    };

    if directory.user_exists(user_id).await? {
        Ok(Actor::User(user_id))
    } else {
        Ok(Actor::Anonymous)
    }
}

/// In-memory user directory.
///
/// Use this only in development or test contexts.
#[derive(Clone, Debug, Default)]
pub struct MemoryDirectory {
    users: BTreeMap<UserName, UserId>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: UserName, user_id: UserId) {
        self.users.insert(name, user_id);
    }
}

impl UserDirectory for MemoryDirectory {
    type Error = Infallible;

    async fn resolve_user_ids(
        &self,
        names: &BTreeSet<UserName>,
    ) -> Result<BTreeMap<UserName, UserId>, Self::Error> {
        Ok(names
            .iter()
            .filter_map(|name| self.users.get(name).map(|id| (name.clone(), *id)))
            .collect())
    }

    async fn user_exists(&self, user_id: UserId) -> Result<bool, Self::Error> {
        Ok(self.users.values().any(|id| *id == user_id))
    }

    async fn user_names(
        &self,
        user_ids: &BTreeSet<UserId>,
    ) -> Result<BTreeMap<UserId, UserName>, Self::Error> {
        Ok(self
            .users
            .iter()
            .filter(|(_, id)| user_ids.contains(*id))
            .map(|(name, id)| (*id, name.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use userprotect_core::{UserId, UserName};

    use super::{Actor, MemoryDirectory, UserDirectory, actor_for};

    fn directory() -> MemoryDirectory {
        let mut directory = MemoryDirectory::new();
        directory.insert(UserName::new("alice").unwrap(), UserId::new(1));
        directory.insert(UserName::new("Bob").unwrap(), UserId::new(2));
        directory
    }

    #[tokio::test]
    async fn unknown_names_are_missing() {
        let directory = directory();
        let names = BTreeSet::from([
            UserName::new("alice").unwrap(),
            UserName::new("ghost").unwrap(),
        ]);

        let ids = directory.resolve_user_ids(&names).await.unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get(&UserName::new("Alice").unwrap()), Some(&UserId::new(1)));
    }

    #[tokio::test]
    async fn actors() {
        let directory = directory();
        assert_eq!(actor_for(&directory, None).await.unwrap(), Actor::Anonymous);
        assert_eq!(
            actor_for(&directory, Some(UserId::new(99))).await.unwrap(),
            Actor::Anonymous
        );
        assert_eq!(
            actor_for(&directory, Some(UserId::new(2))).await.unwrap(),
            Actor::User(UserId::new(2))
        );
    }
}
