//! In-memory user store
//!
//! Backing store when no database is configured, and the test double for the
//! service layer. A transaction holds an exclusive lock on the store state
//! and mutates a working copy that is published only at commit, so a dropped
//! or rolled-back transaction publishes nothing and transactions targeting
//! the same store are serialized.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::user::{User, UserId, UserStore, UserTransaction};
use crate::domain::DomainError;

/// Store operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    Begin,
    Find,
    Insert,
    Remove,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    users: BTreeMap<i64, User>,
    next_id: i64,
}

/// In-memory implementation of [`UserStore`]
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    state: Arc<AsyncMutex<StoreState>>,
    fail_next: Arc<Mutex<Option<FailPoint>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next matching store operation fail once.
    pub fn fail_once(&self, point: FailPoint) {
        *self.lock_fail_next() = Some(point);
    }

    fn trip(&self, point: FailPoint) -> Result<(), DomainError> {
        let mut slot = self.lock_fail_next();

        if *slot == Some(point) {
            *slot = None;
            return Err(DomainError::operation_failed(format!(
                "injected {point:?} failure"
            )));
        }

        Ok(())
    }

    fn lock_fail_next(&self) -> std::sync::MutexGuard<'_, Option<FailPoint>> {
        self.fail_next.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn begin(&self) -> Result<Box<dyn UserTransaction>, DomainError> {
        self.trip(FailPoint::Begin)?;

        // Exclusive guard held for the transaction's lifetime; this is the
        // store's isolation discipline.
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(InMemoryTransaction {
            guard,
            working,
            store: self.clone(),
        }))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        self.trip(FailPoint::Find)?;
        Ok(self.state.lock().await.users.get(&id.value()).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, DomainError> {
        Ok(self.state.lock().await.users.values().cloned().collect())
    }
}

struct InMemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    working: StoreState,
    store: InMemoryUserStore,
}

#[async_trait]
impl UserTransaction for InMemoryTransaction {
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, DomainError> {
        self.store.trip(FailPoint::Find)?;
        Ok(self.working.users.get(&id.value()).cloned())
    }

    async fn insert(&mut self, login: &str) -> Result<User, DomainError> {
        self.store.trip(FailPoint::Insert)?;

        self.working.next_id += 1;
        let user = User::new(UserId::new(self.working.next_id), login);
        self.working.users.insert(user.id().value(), user.clone());

        Ok(user)
    }

    async fn remove(&mut self, user: &User) -> Result<(), DomainError> {
        self.store.trip(FailPoint::Remove)?;

        if self.working.users.remove(&user.id().value()).is_none() {
            return Err(DomainError::operation_failed(format!(
                "User {} vanished within the transaction",
                user.id()
            )));
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        // A failed commit publishes nothing: the working copy is only
        // written back after the failure check.
        self.store.trip(FailPoint::Commit)?;

        let InMemoryTransaction {
            mut guard, working, ..
        } = *self;
        *guard = working;

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), DomainError> {
        // Dropping the guard discards the working copy.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_visible_after_commit() {
        let store = InMemoryUserStore::new();

        let mut tx = store.begin().await.unwrap();
        let user = tx.insert("alice").await.unwrap();
        tx.commit().await.unwrap();

        let found = store.find_by_id(user.id()).await.unwrap();
        assert_eq!(found.unwrap().login(), "alice");
    }

    #[tokio::test]
    async fn test_insert_invisible_before_commit() {
        let store = InMemoryUserStore::new();

        let mut tx = store.begin().await.unwrap();
        let user = tx.insert("alice").await.unwrap();

        // Visible inside the transaction, not outside it.
        assert!(tx.find_by_id(user.id()).await.unwrap().is_some());
        tx.rollback().await.unwrap();

        assert!(store.find_by_id(user.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropped_transaction_publishes_nothing() {
        let store = InMemoryUserStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert("alice").await.unwrap();
            // Dropped without commit or rollback.
        }

        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_visible_only_after_commit() {
        let store = InMemoryUserStore::new();

        let mut tx = store.begin().await.unwrap();
        let user = tx.insert("alice").await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let found = tx.find_by_id(user.id()).await.unwrap().unwrap();
        tx.remove(&found).await.unwrap();

        tx.commit().await.unwrap();
        assert!(store.find_by_id(user.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let store = InMemoryUserStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert("alice").await.unwrap();
        tx.insert("bob").await.unwrap();
        tx.insert("carol").await.unwrap();
        tx.commit().await.unwrap();

        let users = store.list().await.unwrap();
        let ids: Vec<i64> = users.iter().map(|u| u.id().value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fail_once_trips_a_single_time() {
        let store = InMemoryUserStore::new();
        store.fail_once(FailPoint::Begin);

        assert!(store.begin().await.is_err());
        assert!(store.begin().await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_commit_publishes_nothing() {
        let store = InMemoryUserStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.insert("alice").await.unwrap();

        store.fail_once(FailPoint::Commit);
        assert!(tx.commit().await.is_err());

        assert!(store.list().await.unwrap().is_empty());
    }
}
