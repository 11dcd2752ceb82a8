use chrono::{DateTime, Utc};

use serde::{Deserialize, Serialize};

use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Like {
  pub user: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub user: Uuid,
  pub text: String,
  pub name: String,
  pub avatar: String,
  pub date: DateTime<Utc>,
}

/// A post.  `name`/`avatar` are a snapshot of the author taken at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub user: Uuid,
  pub text: String,
  pub name: String,
  pub avatar: String,
  pub likes: Vec<Like>,
  pub comments: Vec<Comment>,
  pub date: DateTime<Utc>,
}

impl Post {
  pub fn is_liked_by(&self, user_id: Uuid) -> bool {
    self.likes.iter().any(|like| like.user == user_id)
  }
}
