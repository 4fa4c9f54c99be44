use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::friend::{Friend, FriendPatch, NewFriend};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unable to get postgres client: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}

/// Persistence for friend records.
///
/// Id-keyed operations report a missing record through `None`/`false`
/// rather than an error, so callers can tell not-found from failure.
#[async_trait]
pub trait FriendStorage: Send + Sync {
    async fn list(&self) -> Result<Vec<Friend>, StorageError>;
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Friend>, StorageError>;
    async fn create(&self, new_friend: NewFriend) -> Result<Friend, StorageError>;
    async fn delete(&self, id: &Uuid) -> Result<bool, StorageError>;
    async fn update(&self, id: &Uuid, patch: FriendPatch) -> Result<Option<Friend>, StorageError>;
}
