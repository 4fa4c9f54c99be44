use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

/// A stored friend record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Friend {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub likes: i64,
}

impl TryFrom<&Row> for Friend {
    type Error = tokio_postgres::Error;

    fn try_from(row: &Row) -> Result<Friend, Self::Error> {
        Ok(Friend {
            id: row.try_get(0)?,
            name: row.try_get(1)?,
            age: row.try_get(2)?,
            photo: row.try_get(3)?,
            body: row.try_get(4)?,
            likes: row.try_get(5)?,
        })
    }
}

impl Friend {
    pub fn new(new_friend: NewFriend) -> Friend {
        Friend {
            id: Uuid::new_v4(),
            name: new_friend.name,
            age: new_friend.age,
            photo: new_friend.photo,
            body: new_friend.body,
            likes: new_friend.likes.unwrap_or(0),
        }
    }

    /// Applies every field present in `patch`, leaving the rest untouched.
    pub fn apply(&mut self, patch: FriendPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(photo) = patch.photo {
            self.photo = photo;
        }
        if let Some(body) = patch.body {
            self.body = body;
        }
        if let Some(likes) = patch.likes {
            self.likes = likes;
        }
    }
}

/// Body of a create request. Unknown fields are dropped.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct NewFriend {
    #[serde(default, deserialize_with = "text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub age: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub photo: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub body: Option<String>,
    #[serde(default, deserialize_with = "counter")]
    pub likes: Option<i64>,
}

/// Body of an update request.
///
/// Outer `None` means the field was not sent. For text fields `Some(None)`
/// means an explicit `null`, which clears the stored value.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FriendPatch {
    #[serde(default, deserialize_with = "nullable_text")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub age: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub photo: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub body: Option<Option<String>>,
    #[serde(default, deserialize_with = "counter")]
    pub likes: Option<i64>,
}

impl FriendPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.photo.is_none()
            && self.body.is_none()
            && self.likes.is_none()
    }
}

fn cast_text<E: de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(E::custom(format!("expected a text value, got {}", other))),
    }
}

fn cast_counter<E: de::Error>(value: Value) -> Result<Option<i64>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| E::custom(format!("likes must be an integer, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| E::custom(format!("likes must be an integer, got {:?}", s))),
        other => Err(E::custom(format!("likes must be an integer, got {}", other))),
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    cast_text(Value::deserialize(deserializer)?)
}

fn nullable_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Option<String>>, D::Error> {
    cast_text(Value::deserialize(deserializer)?).map(Some)
}

fn counter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    cast_counter(Value::deserialize(deserializer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_friend_defaults_likes_to_zero() {
        let new_friend: NewFriend = serde_json::from_value(json!({"name": "Ann", "age": "30"})).unwrap();
        let friend = Friend::new(new_friend);

        assert_eq!(friend.likes, 0);
        assert_eq!(friend.name.as_deref(), Some("Ann"));
        assert_eq!(friend.photo, None);
    }

    #[test]
    fn null_likes_on_create_defaults_to_zero() {
        let new_friend: NewFriend = serde_json::from_value(json!({"likes": null})).unwrap();
        assert_eq!(Friend::new(new_friend).likes, 0);
    }

    #[test]
    fn scalars_are_cast_to_text() {
        let new_friend: NewFriend = serde_json::from_value(json!({"age": 30, "body": true, "likes": "7"})).unwrap();

        assert_eq!(new_friend.age.as_deref(), Some("30"));
        assert_eq!(new_friend.body.as_deref(), Some("true"));
        assert_eq!(new_friend.likes, Some(7));
    }

    #[test]
    fn structured_values_are_rejected() {
        assert!(serde_json::from_value::<NewFriend>(json!({"name": {"first": "Ann"}})).is_err());
        assert!(serde_json::from_value::<NewFriend>(json!({"likes": 1.5})).is_err());
        assert!(serde_json::from_value::<NewFriend>(json!({"likes": "many"})).is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let new_friend: NewFriend = serde_json::from_value(json!({"name": "Ann", "nickname": "A"})).unwrap();
        assert_eq!(new_friend.name.as_deref(), Some("Ann"));
    }

    #[test]
    fn patch_distinguishes_absent_from_null() {
        let patch: FriendPatch = serde_json::from_value(json!({"photo": null, "likes": 5})).unwrap();

        assert_eq!(patch.name, None);
        assert_eq!(patch.photo, Some(None));
        assert_eq!(patch.likes, Some(5));
        assert!(!patch.is_empty());
    }

    #[test]
    fn apply_changes_only_sent_fields() {
        let mut friend = Friend::new(NewFriend {
            name: Some("Ann".into()),
            age: Some("30".into()),
            photo: Some("ann.png".into()),
            ..NewFriend::default()
        });
        let patch: FriendPatch = serde_json::from_value(json!({"age": "31", "photo": null})).unwrap();

        friend.apply(patch);

        assert_eq!(friend.name.as_deref(), Some("Ann"));
        assert_eq!(friend.age.as_deref(), Some("31"));
        assert_eq!(friend.photo, None);
        assert_eq!(friend.likes, 0);
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let friend = Friend::new(NewFriend {
            name: Some("Ann".into()),
            ..NewFriend::default()
        });
        let value = serde_json::to_value(&friend).unwrap();

        assert_eq!(value["name"], "Ann");
        assert_eq!(value["likes"], 0);
        assert!(value.get("age").is_none());
        assert_eq!(value["id"], friend.id.to_string());
    }
}
