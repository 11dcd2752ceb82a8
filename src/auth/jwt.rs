use serde::{Deserialize, Serialize};

use chrono::{Duration, Utc};

use uuid::Uuid;

use jsonwebtoken::{
  encode, Header, EncodingKey,
  decode, DecodingKey,
  Validation
};

use crate::error::*;
use crate::app::AppConfig;
use crate::models::User;

const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Authenticated identity, decoded once per request from the token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthData {
  pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClaimsUser {
  pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub user: ClaimsUser,
  pub iat: i64,
  pub exp: i64,
}

/// Signing/verification keys and token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
  expires_in: Duration,
}

impl JwtKeys {
  pub fn new(secret: &str, expires_in: i64) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_ref()),
      decoding: DecodingKey::from_secret(secret.as_ref()),
      expires_in: Duration::seconds(expires_in),
    }
  }

  pub fn from_app_config(config: &AppConfig) -> Result<Self> {
    let secret = config.get_str("jwt.secret")?
      .ok_or_else(|| Error::MissingConfig("jwt.secret".into()))?;
    let expires_in = config.get_int("jwt.expires_in")?.unwrap_or(DEFAULT_EXPIRES_IN);
    Ok(Self::new(&secret, expires_in))
  }

  pub fn generate(&self, user_id: Uuid) -> Result<String> {
    let now = Utc::now();
    let claims = Claims{
      user: ClaimsUser { id: user_id },
      iat: now.timestamp(),
      exp: (now + self.expires_in).timestamp(),
    };

    let token = encode(&Header::default(), &claims, &self.encoding)?;

    Ok(token)
  }

  pub fn decode(&self, token: &str) -> Result<AuthData> {
    let token = decode::<Claims>(token, &self.decoding, &Validation::default())?;
    Ok(AuthData{
      user_id: token.claims.user.id,
    })
  }
}

pub trait GenerateJwt {
  fn generate_jwt(&self, keys: &JwtKeys) -> Result<String>;
}

pub trait DecodeJwt {
  fn decode_jwt(&self, keys: &JwtKeys) -> Result<AuthData>;
}

impl GenerateJwt for User {
  fn generate_jwt(&self, keys: &JwtKeys) -> Result<String> {
    keys.generate(self.id)
  }
}

impl DecodeJwt for str {
  fn decode_jwt(&self, keys: &JwtKeys) -> Result<AuthData> {
    keys.decode(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn token_carries_user_id() {
    let keys = JwtKeys::new("test-secret", 3600);
    let id = Uuid::new_v4();
    let token = keys.generate(id).unwrap();
    let auth = token.as_str().decode_jwt(&keys).unwrap();
    assert_eq!(auth.user_id, id);
  }

  #[test]
  fn wrong_secret_is_rejected() {
    let keys = JwtKeys::new("test-secret", 3600);
    let other = JwtKeys::new("other-secret", 3600);
    let token = keys.generate(Uuid::new_v4()).unwrap();
    assert!(other.decode(&token).is_err());
  }

  #[test]
  fn expired_token_is_rejected() {
    // past the default 60s validation leeway.
    let keys = JwtKeys::new("test-secret", -600);
    let token = keys.generate(Uuid::new_v4()).unwrap();
    assert!(keys.decode(&token).is_err());
  }
}
