use log::*;

use actix_web::{
  get, post, put, delete, web, HttpResponse,
  Error
};

use crate::error::*;
use crate::app::*;
use crate::forms::*;
use crate::models::ProfileDetails;
use crate::auth::AuthData;
use crate::util::parse_id;

use crate::db::DbService;

use crate::middleware::Auth;

fn no_profile() -> HttpResponse {
  HttpResponse::BadRequest().json(json!({
    "msg": "There is no profile for the user",
  }))
}

fn profile_or_missing(profile: Option<ProfileDetails>) -> HttpResponse {
  match profile {
    Some(profile) => HttpResponse::Ok().json(profile),
    None => no_profile(),
  }
}

/// get current user's profile
#[get("/profile/me", wrap="Auth::required()")]
async fn me(
  auth: AuthData,
  db: web::Data<DbService>,
) -> Result<HttpResponse, Error> {
  let profile = db.profile.get_by_owner(auth.user_id).await?;
  Ok(profile_or_missing(profile))
}

/// create or update current user's profile
#[post("/profile", wrap="Auth::required()")]
async fn upsert(
  auth: AuthData,
  db: web::Data<DbService>,
  form: web::Json<ProfileForm>,
) -> Result<HttpResponse, Error> {
  let fields = match form.into_inner().validated() {
    Ok(fields) => fields,
    Err(errors) => return Ok(HttpResponse::UnprocessableEntity().json(errors)),
  };

  let profile = db.profile.upsert_by_owner(auth.user_id, fields).await?;
  debug!("profile: saved {} for user {}", profile.id, auth.user_id);
  Ok(HttpResponse::Ok().json(profile))
}

/// list all profiles
#[get("/profile")]
async fn list(
  db: web::Data<DbService>,
) -> Result<HttpResponse, Error> {
  let profiles = db.profile.list().await?;
  Ok(HttpResponse::Ok().json(profiles))
}

/// get profile by user id
#[get("/profile/user/{user_id}")]
async fn by_user(
  db: web::Data<DbService>,
  user_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let profile = match parse_id(&user_id) {
    Some(user_id) => db.profile.get_by_owner(user_id).await?,
    None => None,
  };
  match profile {
    Some(profile) => Ok(HttpResponse::Ok().json(profile)),
    None => Ok(HttpResponse::BadRequest().json(json!({
      "msg": "Profile not found",
    }))),
  }
}

/// delete current user and profile
#[delete("/profile", wrap="Auth::required()")]
async fn delete_user(
  auth: AuthData,
  db: web::Data<DbService>,
) -> Result<HttpResponse, Error> {
  db.user.delete_with_profile(auth.user_id).await?;
  info!("profile: deleted user {}", auth.user_id);
  Ok(HttpResponse::Ok().json(json!({
    "msg": "User deleted",
  })))
}

/// add experience entry
#[put("/profile/experience", wrap="Auth::required()")]
async fn add_experience(
  auth: AuthData,
  db: web::Data<DbService>,
  form: web::Json<ExperienceForm>,
) -> Result<HttpResponse, Error> {
  let exp = match form.into_inner().validated() {
    Ok(exp) => exp,
    Err(errors) => return Ok(HttpResponse::BadRequest().json(errors)),
  };
  let profile = db.profile.add_experience(auth.user_id, exp).await?;
  Ok(profile_or_missing(profile))
}

/// remove experience entry
#[delete("/profile/experience/{exp_id}", wrap="Auth::required()")]
async fn remove_experience(
  auth: AuthData,
  db: web::Data<DbService>,
  exp_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  // No entry can match a malformed id, the profile comes back unchanged.
  let profile = match parse_id(&exp_id) {
    Some(exp_id) => db.profile.remove_experience(auth.user_id, exp_id).await?,
    None => db.profile.get_by_owner(auth.user_id).await?,
  };
  Ok(profile_or_missing(profile))
}

/// add education entry
#[put("/profile/education", wrap="Auth::required()")]
async fn add_education(
  auth: AuthData,
  db: web::Data<DbService>,
  form: web::Json<EducationForm>,
) -> Result<HttpResponse, Error> {
  let edu = match form.into_inner().validated() {
    Ok(edu) => edu,
    Err(errors) => return Ok(HttpResponse::BadRequest().json(errors)),
  };
  let profile = db.profile.add_education(auth.user_id, edu).await?;
  Ok(profile_or_missing(profile))
}

/// remove education entry
#[delete("/profile/education/{edu_id}", wrap="Auth::required()")]
async fn remove_education(
  auth: AuthData,
  db: web::Data<DbService>,
  edu_id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let profile = match parse_id(&edu_id) {
    Some(edu_id) => db.profile.remove_education(auth.user_id, edu_id).await?,
    None => db.profile.get_by_owner(auth.user_id).await?,
  };
  Ok(profile_or_missing(profile))
}

#[derive(Debug, Clone, Default)]
pub struct ProfileService {
}

impl super::Service for ProfileService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .service(me)
      .service(upsert)
      .service(list)
      .service(by_user)
      .service(delete_user)
      .service(add_experience)
      .service(remove_experience)
      .service(add_education)
      .service(remove_education);
  }
}

pub fn new_factory() -> ProfileService {
  Default::default()
}
