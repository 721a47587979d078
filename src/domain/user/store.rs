//! Transactional record store traits for user records

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::DomainError;

/// Abstract transactional store for user records.
///
/// Mutations go through a [`UserTransaction`] obtained from [`begin`];
/// single-statement reads go through the store directly.
///
/// [`begin`]: UserStore::begin
#[async_trait]
pub trait UserStore: Send + Sync + Debug {
    /// Open a new transaction. The handle is exclusively owned by the caller
    /// and must be committed or rolled back before the operation returns.
    async fn begin(&self) -> Result<Box<dyn UserTransaction>, DomainError>;

    /// Get a user by id
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError>;

    /// List all users ordered by id
    async fn list(&self) -> Result<Vec<User>, DomainError>;
}

/// A single unit of work over the user store.
///
/// Changes become visible to other callers only after [`commit`]. Commit and
/// rollback consume the handle, so a transaction is released exactly once;
/// a handle dropped without either publishes nothing.
///
/// [`commit`]: UserTransaction::commit
#[async_trait]
pub trait UserTransaction: Send {
    /// Look up a user within the transaction.
    ///
    /// Implementations must isolate concurrent transactions targeting the
    /// same id: of two concurrent removals, at most one can commit.
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Insert a new user; the store assigns the identifier.
    async fn insert(&mut self, login: &str) -> Result<User, DomainError>;

    /// Remove an existing user record.
    async fn remove(&mut self, user: &User) -> Result<(), DomainError>;

    /// Persist all changes made within the transaction.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;

    /// Discard all changes made within the transaction.
    async fn rollback(self: Box<Self>) -> Result<(), DomainError>;
}
