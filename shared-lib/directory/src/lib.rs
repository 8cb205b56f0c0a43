//! User directory and group membership lookups.
//!
//! Lookups return explicit results so callers can tell "not a member" apart
//! from "the membership check failed".

mod cache;
mod http;
mod identity;
mod fixed;

use async_trait::async_trait;
use error::DirectoryError;

pub use cache::EmployeeCache;
pub use fixed::StaticDirectory;
pub use http::{DirectoryConfig, HttpDirectory};
pub use identity::{Caller, Role, UserInfo};

/// Identity and group membership as seen by the current session.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// The signed-in user
    async fn current_user(&self) -> Result<UserInfo, DirectoryError>;

    /// Whether the signed-in user belongs to the named group
    async fn is_member_of_group(&self, group: &str) -> Result<bool, DirectoryError>;

    /// Look up any user by numeric id
    async fn employee_by_id(&self, id: i64) -> Result<Option<UserInfo>, DirectoryError>;
}

/// Resolve the current caller and their approval role.
///
/// Admin membership is checked first. Any lookup failure is returned as-is;
/// it is never folded into [`Role::Employee`].
pub async fn resolve_caller(
    directory: &dyn DirectoryService,
    manager_group: &str,
    admin_group: &str,
) -> Result<Caller, DirectoryError> {
    let user = directory.current_user().await?;

    let role = if directory.is_member_of_group(admin_group).await? {
        Role::Admin
    } else if directory.is_member_of_group(manager_group).await? {
        Role::Manager
    } else {
        Role::Employee
    };

    tracing::debug!(user_id = user.id, role = role.label(), "caller resolved");
    Ok(Caller::new(user, role))
}
