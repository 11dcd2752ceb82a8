use log::*;

use actix_web::{
  post, web, HttpResponse,
  Error
};

use crate::error::*;
use crate::app::*;
use crate::forms::*;
use crate::models::User;
use crate::util::{gravatar_url, new_id, now};

use crate::db::DbService;
use crate::auth::{pass, GenerateJwt, JwtKeys};

fn user_exists() -> HttpResponse {
  HttpResponse::BadRequest().json(json!({
    "errors": [{ "msg": "User already exists" }],
  }))
}

/// register new user
#[post("/users")]
async fn register(
  cfg: web::Data<UserService>,
  db: web::Data<DbService>,
  keys: web::Data<JwtKeys>,
  register: web::Json<RegisterUser>,
) -> Result<HttpResponse, Error> {
  if !cfg.allow_register {
    return Ok(HttpResponse::Forbidden().json(json!({
      "msg": "Registration is disabled",
    })));
  }

  let register = register.into_inner();
  if let Err(errors) = check_form(&register) {
    return Ok(HttpResponse::UnprocessableEntity().json(errors));
  }

  if db.user.get_by_email(&register.email).await?.is_some() {
    return Ok(user_exists());
  }

  let user = User {
    id: new_id(),
    avatar: gravatar_url(&register.email),
    password: pass::hash_password(&register.password)?,
    name: register.name,
    email: register.email,
    date: now(),
  };
  // Lost a race with another registration for the same email.
  let user = match db.user.create_user(user).await? {
    Some(user) => user,
    None => return Ok(user_exists()),
  };
  info!("register: new user {}", user.id);

  Ok(HttpResponse::Ok().json(TokenResponse {
    token: user.generate_jwt(&keys)?,
  }))
}

#[derive(Debug, Clone)]
pub struct UserService {
  pub allow_register: bool,
}

impl super::Service for UserService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<()> {
    self.allow_register = config.get_bool("user.allow_register")?.unwrap_or(true);
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .app_data(web::Data::new(self.clone()))
      .service(register);
  }
}

pub fn new_factory() -> UserService {
  UserService {
    allow_register: true,
  }
}
