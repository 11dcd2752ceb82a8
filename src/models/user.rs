use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing, default)]
  pub password: String,
  pub avatar: String,
  pub date: DateTime<Utc>,
}

/// Public part of a user, embedded in profiles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub name: String,
  pub avatar: String,
}

impl From<&User> for UserSummary {
  fn from(user: &User) -> Self {
    Self {
      id: user.id,
      name: user.name.clone(),
      avatar: user.avatar.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_is_never_serialized() {
    let user = User {
      id: Uuid::new_v4(),
      name: "A".into(),
      email: "a@x.com".into(),
      password: "$argon2id$hash".into(),
      avatar: "https://www.gravatar.com/avatar/x".into(),
      date: Utc::now(),
    };
    let value = serde_json::to_value(&user).unwrap();
    assert!(value.get("password").is_none());
    assert_eq!(value["_id"], json!(user.id));
    assert_eq!(value["email"], "a@x.com");
  }
}
