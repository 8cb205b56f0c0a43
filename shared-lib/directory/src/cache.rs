//! Caller-owned employee lookup cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use error::DirectoryError;

use crate::identity::UserInfo;
use crate::DirectoryService;

/// Employee lookups keyed by numeric directory id.
///
/// The cache is an ordinary value: whoever creates it owns it and decides
/// when to invalidate. Entries older than the TTL are treated as missing.
#[derive(Debug)]
pub struct EmployeeCache {
    entries: HashMap<i64, (UserInfo, Instant)>,
    ttl: Duration,
}

impl EmployeeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Fresh entry for `id`, if any.
    pub fn get(&self, id: i64) -> Option<&UserInfo> {
        self.entries
            .get(&id)
            .filter(|(_, fetched_at)| fetched_at.elapsed() < self.ttl)
            .map(|(user, _)| user)
    }

    pub fn insert(&mut self, user: UserInfo) {
        self.entries.insert(user.id, (user, Instant::now()));
    }

    pub fn invalidate(&mut self, id: i64) {
        self.entries.remove(&id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached user, fetching from the directory on a miss.
    ///
    /// Unknown users are not cached, so a later lookup asks again.
    pub async fn lookup(
        &mut self,
        directory: &dyn DirectoryService,
        id: i64,
    ) -> Result<Option<UserInfo>, DirectoryError> {
        if let Some(user) = self.get(id) {
            return Ok(Some(user.clone()));
        }

        let fetched = directory.employee_by_id(id).await?;
        if let Some(user) = &fetched {
            self.insert(user.clone());
        }
        Ok(fetched)
    }
}
