//! User lookup contract.

use async_trait::async_trait;

use super::user::User;
use crate::Result;

/// Read access to user accounts by email.
///
/// `Ok(None)` means no such user. `Err` is reserved for store faults, which
/// callers must not confuse with a missing account.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the user with this email.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
}
