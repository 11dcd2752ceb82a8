use log::*;

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::Value as JsonValue;

use argon2::password_hash;

use jsonwebtoken::errors::Error as JwtError;

use thiserror::Error;

use crate::github::GithubError;

#[derive(Error, Debug)]
pub enum Error {
  // 401
  #[error("unauthorized: {0}")]
  Unauthorized(JsonValue),

  // 404
  #[error("not found: {0}")]
  NotFound(JsonValue),

  // 422
  #[error("unprocessable entity: {0}")]
  UnprocessableEntity(JsonValue),

  // 500
  #[error("internal server error")]
  InternalServerError,

  // 400
  #[error("bad request: {0}")]
  BadRequest(JsonValue),

  // Json error
  #[error("Json error: {source}")]
  JsonError {
    #[from]
    source: serde_json::Error,
  },

  // Password error
  #[error("Password error: {0}")]
  PasswordError(String),

  #[error("JWT error")]
  JwtError {
    #[from]
    source: JwtError,
  },

  #[error("disconnected: {0}")]
  DisconnectedError(String),

  #[error("postgres error")]
  PgError {
    #[from]
    source: tokio_postgres::error::Error,
  },

  #[error("github error")]
  GithubError {
    #[from]
    source: GithubError,
  },

  #[error("crossbeam recv error")]
  RecvError {
    #[from]
    source: crossbeam_channel::RecvError,
  },

  #[error("std io error")]
  IOError {
    #[from]
    source: std::io::Error,
  },

  #[error("config error")]
  ConfigError {
    #[from]
    source: config::ConfigError,
  },

  #[error("missing config: {0}")]
  MissingConfig(String),

  #[error("invalid config: {0}")]
  InvalidConfig(String),

  #[error("server failed: {0}")]
  ServerFailed(String),

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl From<password_hash::Error> for Error {
  fn from(err: password_hash::Error) -> Self {
    Error::PasswordError(err.to_string())
  }
}

impl Error {
  /// `{"msg": ..}` body used by most client-visible failures.
  pub fn msg(msg: &str) -> JsonValue {
    json!({ "msg": msg })
  }

  /// `{"errors": [{"msg": ..}]}` body, the shape validation failures use.
  pub fn errors(msg: &str) -> JsonValue {
    json!({ "errors": [{ "msg": msg }] })
  }

  pub fn unauthorized(msg: &str) -> Self {
    Error::Unauthorized(Self::msg(msg))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// the ResponseError trait lets us convert errors to http responses with appropriate data
// https://actix.rs/docs/errors/
impl ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self {
      Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::DisconnectedError(_) => StatusCode::BAD_GATEWAY,
      Error::GithubError { source: GithubError::InvalidUsername } => StatusCode::NOT_FOUND,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    match self {
      Error::Unauthorized(ref message) |
      Error::NotFound(ref message) |
      Error::UnprocessableEntity(ref message) |
      Error::BadRequest(ref message) => {
        HttpResponse::build(self.status_code()).json(message)
      },
      Error::DisconnectedError(ref message) => {
        error!("Disconnected: {}", message);
        HttpResponse::build(self.status_code()).json(Self::msg("Server error"))
      },
      Error::GithubError { source: GithubError::InvalidUsername } => {
        HttpResponse::build(self.status_code()).json(Self::msg("Invalid username"))
      },
      ref err => {
        error!("InternalServerError: {:?}", err);
        HttpResponse::InternalServerError().json(Self::msg("Server error"))
      },
    }
  }
}
