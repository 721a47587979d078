//! User service - transactional operations over the record store

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::user::{validate_login, User, UserId, UserStore, UserTransaction};
use crate::domain::DomainError;

/// Request for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub login: String,
}

/// User service.
///
/// Every mutation runs inside a single store transaction that is committed or
/// rolled back before the call returns. The transaction handle is owned by
/// the in-flight call and never shared.
#[derive(Debug)]
pub struct UserService<S: UserStore> {
    store: Arc<S>,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Delete a user by id.
    ///
    /// Absence is reported as [`DomainError::UserNotFound`] after rolling the
    /// transaction back; any store failure also rolls back and surfaces as
    /// [`DomainError::OperationFailed`]. Exactly one of {no change} and
    /// {record removed, transaction committed} is observable afterwards.
    /// Failures are reported upward once; no retries.
    pub async fn delete(&self, id: UserId) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;

        match Self::remove_existing(tx.as_mut(), id).await {
            Ok(()) => {
                tx.commit().await?;
                debug!(user_id = %id, "user deleted");
                Ok(())
            }
            Err(err) => {
                // The primary error wins; a failed rollback is only logged.
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        user_id = %id,
                        error = %rollback_err,
                        "rollback failed after delete error"
                    );
                }
                Err(err)
            }
        }
    }

    async fn remove_existing(
        tx: &mut dyn UserTransaction,
        id: UserId,
    ) -> Result<(), DomainError> {
        let user = tx
            .find_by_id(id)
            .await?
            .ok_or(DomainError::UserNotFound { id })?;

        tx.remove(&user).await
    }

    /// Create a new user; the store assigns the identifier.
    pub async fn create(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        validate_login(&request.login).map_err(|e| DomainError::validation(e.to_string()))?;

        let mut tx = self.store.begin().await?;

        match tx.insert(&request.login).await {
            Ok(user) => {
                tx.commit().await?;
                debug!(user_id = %user.id(), "user created");
                Ok(user)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "rollback failed after insert error");
                }
                Err(err)
            }
        }
    }

    /// Get a user by id
    pub async fn get(&self, id: UserId) -> Result<Option<User>, DomainError> {
        self.store.find_by_id(id).await
    }

    /// List all users
    pub async fn list(&self) -> Result<Vec<User>, DomainError> {
        self.store.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::user::memory::{FailPoint, InMemoryUserStore};

    fn create_service() -> UserService<InMemoryUserStore> {
        UserService::new(Arc::new(InMemoryUserStore::new()))
    }

    fn make_request(login: &str) -> CreateUserRequest {
        CreateUserRequest {
            login: login.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let service = create_service();

        let alice = service.create(make_request("alice")).await.unwrap();
        let bob = service.create(make_request("bob")).await.unwrap();

        assert_eq!(alice.id(), UserId::new(1));
        assert_eq!(bob.id(), UserId::new(2));
        assert_eq!(alice.login(), "alice");
    }

    #[tokio::test]
    async fn test_create_rejects_empty_login() {
        let service = create_service();

        let result = service.create(make_request("")).await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_existing_user() {
        let service = create_service();
        let alice = service.create(make_request("alice")).await.unwrap();

        service.delete(alice.id()).await.unwrap();

        assert!(service.get(alice.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_user_reports_not_found() {
        let service = create_service();

        let err = service.delete(UserId::new(42)).await.unwrap_err();

        assert!(matches!(err, DomainError::UserNotFound { id } if id == UserId::new(42)));
        assert_eq!(err.to_string(), "User with id 42 not found.");
    }

    #[tokio::test]
    async fn test_delete_missing_user_performs_no_mutation() {
        let service = create_service();
        service.create(make_request("alice")).await.unwrap();
        service.create(make_request("bob")).await.unwrap();

        let result = service.delete(UserId::new(99)).await;

        assert!(result.is_err());
        assert_eq!(service.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_delete_reports_not_found() {
        let service = create_service();
        let alice = service.create(make_request("alice")).await.unwrap();

        service.delete(alice.id()).await.unwrap();
        let err = service.delete(alice.id()).await.unwrap_err();

        assert!(matches!(err, DomainError::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = UserService::new(store.clone());
        let alice = service.create(make_request("alice")).await.unwrap();

        store.fail_once(FailPoint::Commit);
        let err = service.delete(alice.id()).await.unwrap_err();

        assert!(matches!(err, DomainError::OperationFailed { .. }));
        // Rollback verified: the record must still be present.
        assert!(service.get(alice.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_reported_as_not_found() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = UserService::new(store.clone());
        let alice = service.create(make_request("alice")).await.unwrap();

        store.fail_once(FailPoint::Find);
        let err = service.delete(alice.id()).await.unwrap_err();

        assert!(matches!(err, DomainError::OperationFailed { .. }));
        assert!(service.get(alice.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_failure_rolls_back() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = UserService::new(store.clone());
        let alice = service.create(make_request("alice")).await.unwrap();

        store.fail_once(FailPoint::Remove);
        let err = service.delete(alice.id()).await.unwrap_err();

        assert!(matches!(err, DomainError::OperationFailed { .. }));
        assert!(service.get(alice.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_begin_failure_reports_operation_failed() {
        let store = Arc::new(InMemoryUserStore::new());
        let service = UserService::new(store.clone());

        store.fail_once(FailPoint::Begin);
        let err = service.delete(UserId::new(1)).await.unwrap_err();

        assert!(matches!(err, DomainError::OperationFailed { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_deletes_exactly_one_succeeds() {
        let service = Arc::new(create_service());
        let alice = service.create(make_request("alice")).await.unwrap();
        let id = alice.id();

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.delete(id).await }
        });
        let second = tokio::spawn({
            let service = service.clone();
            async move { service.delete(id).await }
        });

        let results = [first.await.unwrap(), second.await.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        let not_found = results
            .iter()
            .filter(|r| matches!(r, Err(DomainError::UserNotFound { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(not_found, 1);
        assert!(service.get(id).await.unwrap().is_none());
    }
}
