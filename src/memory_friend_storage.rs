use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::friend::{Friend, FriendPatch, NewFriend};
use crate::friend_storage::{FriendStorage, StorageError};

/// Process-local storage. Records are kept in insertion order.
#[derive(Default)]
pub struct MemoryFriendStorage {
    friends: RwLock<Vec<Friend>>,
}

impl MemoryFriendStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FriendStorage for MemoryFriendStorage {
    async fn list(&self) -> Result<Vec<Friend>, StorageError> {
        Ok(self.friends.read().await.clone())
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Friend>, StorageError> {
        let friends = self.friends.read().await;
        Ok(friends.iter().find(|friend| friend.id == *id).cloned())
    }

    async fn create(&self, new_friend: NewFriend) -> Result<Friend, StorageError> {
        let friend = Friend::new(new_friend);
        self.friends.write().await.push(friend.clone());
        Ok(friend)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, StorageError> {
        let mut friends = self.friends.write().await;
        match friends.iter().position(|friend| friend.id == *id) {
            Some(index) => {
                friends.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update(&self, id: &Uuid, patch: FriendPatch) -> Result<Option<Friend>, StorageError> {
        let mut friends = self.friends.write().await;
        Ok(friends.iter_mut().find(|friend| friend.id == *id).map(|friend| {
            friend.apply(patch);
            friend.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> NewFriend {
        NewFriend {
            name: Some(name.to_owned()),
            ..NewFriend::default()
        }
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let storage = MemoryFriendStorage::new();
        let ann = storage.create(named("Ann")).await.unwrap();
        let bob = storage.create(named("Bob")).await.unwrap();

        assert_eq!(storage.list().await.unwrap(), vec![ann, bob]);
    }

    #[tokio::test]
    async fn delete_reports_missing_record() {
        let storage = MemoryFriendStorage::new();
        let ann = storage.create(named("Ann")).await.unwrap();

        assert!(storage.delete(&ann.id).await.unwrap());
        assert!(!storage.delete(&ann.id).await.unwrap());
        assert_eq!(storage.get_by_id(&ann.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_of_missing_record_is_none() {
        let storage = MemoryFriendStorage::new();
        let patch = FriendPatch {
            likes: Some(3),
            ..FriendPatch::default()
        };

        assert_eq!(storage.update(&Uuid::new_v4(), patch).await.unwrap(), None);
    }
}
