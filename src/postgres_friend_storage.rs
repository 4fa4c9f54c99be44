use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use crate::friend::{Friend, FriendPatch, NewFriend};
use crate::friend_storage::{FriendStorage, StorageError};

const COLUMNS: &str = "id, name, age, photo, body, likes";

/// Builds the `UPDATE` statement for the fields present in `patch`.
/// `$1` is always the id. Returns `None` when there is nothing to set.
fn update_statement<'a>(id: &'a Uuid, patch: &'a FriendPatch) -> Option<(String, Vec<&'a (dyn ToSql + Sync)>)> {
    if patch.is_empty() {
        return None;
    }

    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
    params.push(id);
    let mut assignments = Vec::new();

    for (column, value) in [
        ("name", &patch.name),
        ("age", &patch.age),
        ("photo", &patch.photo),
        ("body", &patch.body),
    ] {
        if let Some(value) = value {
            params.push(value);
            assignments.push(format!("{} = ${}", column, params.len()));
        }
    }
    if let Some(likes) = &patch.likes {
        params.push(likes);
        assignments.push(format!("likes = ${}", params.len()));
    }

    let query = format!(
        "UPDATE friends SET {} WHERE id = $1 RETURNING {}",
        assignments.join(", "),
        COLUMNS
    );

    Some((query, params))
}

pub struct PostgresFriendStorage {
    pool: Pool,
}

impl PostgresFriendStorage {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FriendStorage for PostgresFriendStorage {
    async fn list(&self) -> Result<Vec<Friend>, StorageError> {
        let client = self.pool.get().await?;

        let stmt = client.prepare(&format!("SELECT {} FROM friends", COLUMNS)).await?;

        let rows = client.query(&stmt, &[]).await?;

        let friends = rows.iter().map(Friend::try_from).collect::<Result<Vec<_>, _>>()?;

        Ok(friends)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Friend>, StorageError> {
        let client = self.pool.get().await?;

        let stmt = client.prepare(&format!("SELECT {} FROM friends WHERE id = $1", COLUMNS)).await?;

        match client.query_opt(&stmt, &[id]).await? {
            Some(row) => Ok(Some(Friend::try_from(&row)?)),
            None => Ok(None),
        }
    }

    async fn create(&self, new_friend: NewFriend) -> Result<Friend, StorageError> {
        let friend = Friend::new(new_friend);
        let client = self.pool.get().await?;

        let stmt = client.prepare(
            "INSERT INTO friends (id, name, age, photo, body, likes) VALUES ($1, $2, $3, $4, $5, $6)"
        ).await?;

        client.execute(
            &stmt,
            &[&friend.id, &friend.name, &friend.age, &friend.photo, &friend.body, &friend.likes]
        ).await?;

        Ok(friend)
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, StorageError> {
        let client = self.pool.get().await?;

        let stmt = client.prepare("DELETE FROM friends WHERE id = $1").await?;

        let deleted = client.execute(&stmt, &[id]).await?;

        Ok(deleted > 0)
    }

    async fn update(&self, id: &Uuid, patch: FriendPatch) -> Result<Option<Friend>, StorageError> {
        let (query, params) = match update_statement(id, &patch) {
            Some(statement) => statement,
            None => return self.get_by_id(id).await,
        };

        let client = self.pool.get().await?;

        let stmt = client.prepare(&query).await?;

        match client.query_opt(&stmt, &params).await? {
            Some(row) => Ok(Some(Friend::try_from(&row)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> FriendPatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_patch_has_no_statement() {
        let id = Uuid::new_v4();
        let patch = patch(json!({}));

        assert!(update_statement(&id, &patch).is_none());
    }

    #[test]
    fn likes_only_patch() {
        let id = Uuid::new_v4();
        let patch = patch(json!({"likes": 5}));

        let (query, params) = update_statement(&id, &patch).unwrap();

        assert_eq!(
            query,
            "UPDATE friends SET likes = $2 WHERE id = $1 RETURNING id, name, age, photo, body, likes"
        );
        assert_eq!(params.len(), 2);
        assert_eq!(format!("{:?}", params[1]), "5");
    }

    #[test]
    fn all_fields_patch_numbers_placeholders_in_order() {
        let id = Uuid::new_v4();
        let patch = patch(json!({
            "name": "Ann",
            "age": "31",
            "photo": "ann.png",
            "body": "hello",
            "likes": 2,
        }));

        let (query, params) = update_statement(&id, &patch).unwrap();

        assert_eq!(
            query,
            "UPDATE friends SET name = $2, age = $3, photo = $4, body = $5, likes = $6 \
             WHERE id = $1 RETURNING id, name, age, photo, body, likes"
        );
        assert_eq!(params.len(), 6);
        assert_eq!(format!("{:?}", params[0]), format!("{:?}", id));
    }

    #[test]
    fn null_text_field_is_bound_as_null() {
        let id = Uuid::new_v4();
        let patch = patch(json!({"photo": null}));

        let (query, params) = update_statement(&id, &patch).unwrap();

        assert_eq!(
            query,
            "UPDATE friends SET photo = $2 WHERE id = $1 RETURNING id, name, age, photo, body, likes"
        );
        assert_eq!(params.len(), 2);
        assert_eq!(format!("{:?}", params[1]), "None");
    }
}
