use log::*;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::*;
use crate::app::AppConfig;
use crate::models::*;

pub mod util;

mod user;
mod profile;
mod post;
pub use self::{
  user::*,
  profile::*,
  post::*,
};

mod memory;
pub use memory::MemoryStore;

mod service;
pub use service::*;

pub const SCHEMA: &str = include_str!("../../sql/schema.sql");

/// Outcome of a guarded post mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum PostUpdate<T> {
  Updated(T),
  PostNotFound,
  CommentNotFound,
  /// The actor does not own the post/comment.
  NotAuthorized,
  /// Like already present, or unlike of a missing like.
  Unchanged,
}

impl<T> PostUpdate<T> {
  pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> PostUpdate<U> {
    match self {
      PostUpdate::Updated(val) => PostUpdate::Updated(f(val)),
      PostUpdate::PostNotFound => PostUpdate::PostNotFound,
      PostUpdate::CommentNotFound => PostUpdate::CommentNotFound,
      PostUpdate::NotAuthorized => PostUpdate::NotAuthorized,
      PostUpdate::Unchanged => PostUpdate::Unchanged,
    }
  }
}

#[async_trait(?Send)]
pub trait UserStore {
  async fn prepare(&self) -> Result<()> {
    Ok(())
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<User>>;

  async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

  /// Insert a new user.  `None` if the email is already taken.
  async fn create_user(&self, user: User) -> Result<Option<User>>;

  async fn update_password(&self, id: Uuid, password: &str) -> Result<()>;

  /// Delete the user and its profile.  Posts are left in place.
  async fn delete_with_profile(&self, id: Uuid) -> Result<()>;
}

#[async_trait(?Send)]
pub trait ProfileStore {
  async fn prepare(&self) -> Result<()> {
    Ok(())
  }

  async fn get_by_owner(&self, user_id: Uuid) -> Result<Option<ProfileDetails>>;

  async fn list(&self) -> Result<Vec<ProfileDetails>>;

  /// Update the owner's profile, or insert it if there is none.
  async fn upsert_by_owner(&self, user_id: Uuid, fields: ProfileFields) -> Result<ProfileDetails>;

  /// Prepend an experience entry.  `None` if the owner has no profile.
  async fn add_experience(&self, user_id: Uuid, exp: Experience) -> Result<Option<ProfileDetails>>;

  /// Drop the experience entry with `exp_id`, if present.
  async fn remove_experience(&self, user_id: Uuid, exp_id: Uuid) -> Result<Option<ProfileDetails>>;

  async fn add_education(&self, user_id: Uuid, edu: Education) -> Result<Option<ProfileDetails>>;

  async fn remove_education(&self, user_id: Uuid, edu_id: Uuid) -> Result<Option<ProfileDetails>>;
}

#[async_trait(?Send)]
pub trait PostStore {
  async fn prepare(&self) -> Result<()> {
    Ok(())
  }

  async fn create(&self, post: Post) -> Result<Post>;

  /// All posts, newest first.
  async fn list(&self) -> Result<Vec<Post>>;

  async fn get(&self, id: Uuid) -> Result<Option<Post>>;

  /// Delete a post owned by `user_id`.
  async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<PostUpdate<()>>;

  async fn like(&self, id: Uuid, user_id: Uuid) -> Result<PostUpdate<Vec<Like>>>;

  async fn unlike(&self, id: Uuid, user_id: Uuid) -> Result<PostUpdate<Vec<Like>>>;

  async fn add_comment(&self, id: Uuid, comment: Comment) -> Result<PostUpdate<Vec<Comment>>>;

  /// Remove a comment written by `user_id`.
  async fn remove_comment(&self, id: Uuid, comment_id: Uuid, user_id: Uuid) -> Result<PostUpdate<Vec<Comment>>>;
}

/// Where the stores keep their documents.
#[derive(Clone)]
pub enum DbBackend {
  Postgres(String),
  Memory(MemoryStore),
}

impl DbBackend {
  pub fn from_app_config(config: &AppConfig) -> Result<Self> {
    let backend = config.get_str("db.backend")?.unwrap_or_else(|| "postgres".to_string());
    match backend.as_str() {
      "postgres" => {
        let url = config.get_str("db.url")?
          .ok_or_else(|| Error::MissingConfig("db.url".into()))?;
        Ok(DbBackend::Postgres(url))
      },
      "memory" => {
        warn!("Using in-memory database.  Nothing will be persisted.");
        Ok(DbBackend::Memory(MemoryStore::new()))
      },
      other => Err(Error::InvalidConfig(format!("unknown db.backend: {}", other))),
    }
  }
}

/// Create the tables if they are missing.
pub async fn migrate(db_url: &str) -> Result<()> {
  let (cl, conn) = tokio_postgres::connect(db_url, tokio_postgres::NoTls).await?;
  actix_rt::spawn(async move {
    if let Err(e) = conn.await {
      debug!("migrate: connection error: {}", e);
    }
  });
  info!("Apply database schema.");
  cl.batch_execute(SCHEMA).await?;
  Ok(())
}
