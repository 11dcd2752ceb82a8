use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::*;
use crate::models::*;
use crate::util::{new_id, now};

use super::{PostStore, PostUpdate, ProfileStore, UserStore};

#[derive(Debug, Default)]
struct Documents {
  users: Vec<User>,
  profiles: Vec<Profile>,
  posts: Vec<Post>,
}

impl Documents {
  fn details(&self, profile: &Profile) -> ProfileDetails {
    let user = self.users.iter()
      .find(|u| u.id == profile.user)
      .map(UserSummary::from);
    profile.clone().with_user(user)
  }

  fn profile_mut(&mut self, user_id: Uuid) -> Option<&mut Profile> {
    self.profiles.iter_mut().find(|p| p.user == user_id)
  }

  fn post_mut(&mut self, id: Uuid) -> Option<&mut Post> {
    self.posts.iter_mut().find(|p| p.id == id)
  }

  /// Apply `update` to the owner's profile and return it joined with the owner.
  fn update_profile<F>(&mut self, user_id: Uuid, update: F) -> Option<ProfileDetails>
  where
    F: FnOnce(&mut Profile),
  {
    let profile = self.profile_mut(user_id)?;
    update(profile);
    let profile = profile.clone();
    Some(self.details(&profile))
  }
}

/// Process-local document store.  Every operation runs under one lock, so
/// each is atomic with respect to the others.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  docs: Arc<Mutex<Documents>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Default::default()
  }
}

#[async_trait(?Send)]
impl UserStore for MemoryStore {
  async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
    let docs = self.docs.lock();
    Ok(docs.users.iter().find(|u| u.id == id).cloned())
  }

  async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
    let docs = self.docs.lock();
    Ok(docs.users.iter().find(|u| u.email == email).cloned())
  }

  async fn create_user(&self, user: User) -> Result<Option<User>> {
    let mut docs = self.docs.lock();
    if docs.users.iter().any(|u| u.email == user.email) {
      return Ok(None);
    }
    docs.users.push(user.clone());
    Ok(Some(user))
  }

  async fn update_password(&self, id: Uuid, password: &str) -> Result<()> {
    let mut docs = self.docs.lock();
    if let Some(user) = docs.users.iter_mut().find(|u| u.id == id) {
      user.password = password.to_string();
    }
    Ok(())
  }

  async fn delete_with_profile(&self, id: Uuid) -> Result<()> {
    let mut docs = self.docs.lock();
    docs.profiles.retain(|p| p.user != id);
    docs.users.retain(|u| u.id != id);
    Ok(())
  }
}

#[async_trait(?Send)]
impl ProfileStore for MemoryStore {
  async fn get_by_owner(&self, user_id: Uuid) -> Result<Option<ProfileDetails>> {
    let docs = self.docs.lock();
    Ok(docs.profiles.iter()
      .find(|p| p.user == user_id)
      .map(|p| docs.details(p)))
  }

  async fn list(&self) -> Result<Vec<ProfileDetails>> {
    let docs = self.docs.lock();
    Ok(docs.profiles.iter().map(|p| docs.details(p)).collect())
  }

  async fn upsert_by_owner(&self, user_id: Uuid, fields: ProfileFields) -> Result<ProfileDetails> {
    let mut docs = self.docs.lock();
    let profile = match docs.profile_mut(user_id) {
      Some(profile) => {
        fields.apply(profile);
        profile.clone()
      },
      None => {
        let profile = fields.into_profile(new_id(), user_id, now());
        docs.profiles.push(profile.clone());
        profile
      },
    };
    Ok(docs.details(&profile))
  }

  async fn add_experience(&self, user_id: Uuid, exp: Experience) -> Result<Option<ProfileDetails>> {
    let mut docs = self.docs.lock();
    Ok(docs.update_profile(user_id, |p| p.experience.insert(0, exp)))
  }

  async fn remove_experience(&self, user_id: Uuid, exp_id: Uuid) -> Result<Option<ProfileDetails>> {
    let mut docs = self.docs.lock();
    Ok(docs.update_profile(user_id, |p| p.experience.retain(|e| e.id != exp_id)))
  }

  async fn add_education(&self, user_id: Uuid, edu: Education) -> Result<Option<ProfileDetails>> {
    let mut docs = self.docs.lock();
    Ok(docs.update_profile(user_id, |p| p.education.insert(0, edu)))
  }

  async fn remove_education(&self, user_id: Uuid, edu_id: Uuid) -> Result<Option<ProfileDetails>> {
    let mut docs = self.docs.lock();
    Ok(docs.update_profile(user_id, |p| p.education.retain(|e| e.id != edu_id)))
  }
}

#[async_trait(?Send)]
impl PostStore for MemoryStore {
  async fn create(&self, post: Post) -> Result<Post> {
    let mut docs = self.docs.lock();
    // newest first, also for posts created within the same clock tick.
    docs.posts.insert(0, post.clone());
    Ok(post)
  }

  async fn list(&self) -> Result<Vec<Post>> {
    let docs = self.docs.lock();
    let mut posts = docs.posts.clone();
    posts.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(posts)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Post>> {
    let docs = self.docs.lock();
    Ok(docs.posts.iter().find(|p| p.id == id).cloned())
  }

  async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<PostUpdate<()>> {
    let mut docs = self.docs.lock();
    let post = match docs.posts.iter().find(|p| p.id == id) {
      Some(post) => post,
      None => return Ok(PostUpdate::PostNotFound),
    };
    if post.user != user_id {
      return Ok(PostUpdate::NotAuthorized);
    }
    docs.posts.retain(|p| p.id != id);
    Ok(PostUpdate::Updated(()))
  }

  async fn like(&self, id: Uuid, user_id: Uuid) -> Result<PostUpdate<Vec<Like>>> {
    let mut docs = self.docs.lock();
    let post = match docs.post_mut(id) {
      Some(post) => post,
      None => return Ok(PostUpdate::PostNotFound),
    };
    if post.is_liked_by(user_id) {
      return Ok(PostUpdate::Unchanged);
    }
    post.likes.push(Like { user: user_id });
    Ok(PostUpdate::Updated(post.likes.clone()))
  }

  async fn unlike(&self, id: Uuid, user_id: Uuid) -> Result<PostUpdate<Vec<Like>>> {
    let mut docs = self.docs.lock();
    let post = match docs.post_mut(id) {
      Some(post) => post,
      None => return Ok(PostUpdate::PostNotFound),
    };
    if !post.is_liked_by(user_id) {
      return Ok(PostUpdate::Unchanged);
    }
    post.likes.retain(|like| like.user != user_id);
    Ok(PostUpdate::Updated(post.likes.clone()))
  }

  async fn add_comment(&self, id: Uuid, comment: Comment) -> Result<PostUpdate<Vec<Comment>>> {
    let mut docs = self.docs.lock();
    match docs.post_mut(id) {
      Some(post) => {
        post.comments.push(comment);
        Ok(PostUpdate::Updated(post.comments.clone()))
      },
      None => Ok(PostUpdate::PostNotFound),
    }
  }

  async fn remove_comment(&self, id: Uuid, comment_id: Uuid, user_id: Uuid) -> Result<PostUpdate<Vec<Comment>>> {
    let mut docs = self.docs.lock();
    let post = match docs.post_mut(id) {
      Some(post) => post,
      None => return Ok(PostUpdate::PostNotFound),
    };
    match post.comments.iter().find(|c| c.id == comment_id) {
      None => return Ok(PostUpdate::CommentNotFound),
      Some(comment) if comment.user != user_id => return Ok(PostUpdate::NotAuthorized),
      Some(_) => (),
    }
    post.comments.retain(|c| c.id != comment_id);
    Ok(PostUpdate::Updated(post.comments.clone()))
  }
}
