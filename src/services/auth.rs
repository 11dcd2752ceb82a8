use log::*;

use actix_web::{
  get, post, web, HttpResponse,
  Error
};

use crate::error::*;
use crate::app::*;
use crate::forms::*;
use crate::auth::{pass, AuthData, GenerateJwt, JwtKeys};

use crate::db::DbService;

use crate::middleware::Auth;

fn invalid_login() -> HttpResponse {
  HttpResponse::UnprocessableEntity().json(json!({
    "errors": [{ "msg": "Invalid username or password" }],
  }))
}

/// login user
#[post("/auth")]
async fn login(
  db: web::Data<DbService>,
  keys: web::Data<JwtKeys>,
  login: web::Json<LoginUser>,
) -> Result<HttpResponse, Error> {
  if let Err(errors) = check_form(&login.0) {
    return Ok(HttpResponse::UnprocessableEntity().json(errors));
  }
  // Get user from database
  let user = match db.user.get_by_email(&login.email).await? {
    Some(user) => user,
    _ => {
      // unknown email looks the same as a bad password.
      return Ok(invalid_login());
    }
  };

  let res = pass::check_password(&user.password, &login.password)?;
  debug!("login: res={:?}", res);
  if !res.is_valid {
    return Ok(invalid_login());
  }
  if res.needs_update {
    // Rehash password.
    let hash = pass::hash_password(&login.password)?;
    db.user.update_password(user.id, &hash).await?;
  }

  Ok(HttpResponse::Ok().json(TokenResponse {
    token: user.generate_jwt(&keys)?,
  }))
}

/// get current user
#[get("/auth", wrap="Auth::required()")]
async fn get_user(
  auth: AuthData,
  db: web::Data<DbService>,
) -> Result<HttpResponse, Error> {
  // Get auth user from database
  match db.user.get_by_id(auth.user_id).await? {
    Some(user) => {
      Ok(HttpResponse::Ok().json(user))
    },
    _ => {
      // token outlived its user.
      Ok(HttpResponse::BadRequest().json(json!({
        "msg": "Invalid token. User does not exist.",
      })))
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct AuthService {
}

impl super::Service for AuthService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .service(login)
      .service(get_user);
  }
}

pub fn new_factory() -> AuthService {
  Default::default()
}
