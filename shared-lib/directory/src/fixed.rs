//! Fixed directory for development and tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use error::DirectoryError;

use crate::identity::UserInfo;
use crate::DirectoryService;

/// Directory with a fixed signed-in user, group set and user table.
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    current: UserInfo,
    groups: HashSet<String>,
    users: HashMap<i64, UserInfo>,
    unavailable: bool,
}

impl StaticDirectory {
    pub fn new(current: UserInfo) -> Self {
        let mut users = HashMap::new();
        users.insert(current.id, current.clone());
        Self {
            current,
            groups: HashSet::new(),
            users,
            unavailable: false,
        }
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    pub fn with_user(mut self, user: UserInfo) -> Self {
        self.users.insert(user.id, user);
        self
    }

    /// Fail every lookup with [`DirectoryError::Unavailable`].
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check(&self) -> Result<(), DirectoryError> {
        if self.unavailable {
            return Err(DirectoryError::Unavailable("directory offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryService for StaticDirectory {
    async fn current_user(&self) -> Result<UserInfo, DirectoryError> {
        self.check()?;
        Ok(self.current.clone())
    }

    async fn is_member_of_group(&self, group: &str) -> Result<bool, DirectoryError> {
        self.check()?;
        Ok(self.groups.contains(group))
    }

    async fn employee_by_id(&self, id: i64) -> Result<Option<UserInfo>, DirectoryError> {
        self.check()?;
        Ok(self.users.get(&id).cloned())
    }
}
