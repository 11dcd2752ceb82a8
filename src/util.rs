use std::str::FromStr;

use sha2::{Digest, Sha256};
use uuid::Uuid;

// id/avatar util functions.

/// Parse a path id.  A malformed id is treated the same as an unknown one.
pub fn parse_id(id: &str) -> Option<Uuid> {
  match Uuid::from_str(id.trim()) {
    Ok(id) => Some(id),
    Err(err) => {
      log::debug!("Failed to parse id '{}': {:?}", id, err);
      None
    },
  }
}

pub fn new_id() -> Uuid {
  Uuid::new_v4()
}

pub fn now() -> chrono::DateTime<chrono::Utc> {
  chrono::Utc::now()
}

/// Default avatar: gravatar for the email, 200px, rating `x`, `retro` fallback image.
pub fn gravatar_url(email: &str) -> String {
  let hash = Sha256::digest(email.trim().to_lowercase().as_bytes());
  format!("https://www.gravatar.com/avatar/{}?s=200&r=x&d=retro", hex::encode(hash))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn gravatar_normalizes_email() {
    let a = gravatar_url("A@X.com ");
    let b = gravatar_url("a@x.com");
    assert_eq!(a, b);
    assert!(a.starts_with("https://www.gravatar.com/avatar/"));
    assert!(a.ends_with("?s=200&r=x&d=retro"));
  }

  #[test]
  fn bad_ids_are_none() {
    assert!(parse_id("not-an-id").is_none());
    let id = new_id();
    assert_eq!(parse_id(&id.to_string()), Some(id));
  }
}
