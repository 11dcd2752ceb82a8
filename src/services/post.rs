use log::*;

use serde::Serialize;

use actix_web::{
  get, post, put, delete, web, HttpResponse,
  Error
};

use crate::error::*;
use crate::app::*;
use crate::forms::*;
use crate::models::*;
use crate::auth::AuthData;
use crate::util::{new_id, now, parse_id};

use crate::db::{DbService, PostUpdate};

use crate::middleware::Auth;

fn post_not_found() -> HttpResponse {
  HttpResponse::NotFound().json(json!({
    "msg": "Post not found",
  }))
}

fn unknown_user() -> HttpResponse {
  HttpResponse::BadRequest().json(json!({
    "msg": "Invalid token. User does not exist.",
  }))
}

/// Map the outcome of a guarded post mutation to a response.
/// `unchanged` is the message for a like/unlike that changed nothing.
fn post_response<T: Serialize>(update: PostUpdate<T>, unchanged: &str) -> HttpResponse {
  match update {
    PostUpdate::Updated(body) => HttpResponse::Ok().json(body),
    PostUpdate::PostNotFound => post_not_found(),
    PostUpdate::CommentNotFound => HttpResponse::NotFound().json(json!({
      "msg": "Comment does not exist",
    })),
    PostUpdate::NotAuthorized => HttpResponse::Unauthorized().json(json!({
      "msg": "User not authorized",
    })),
    PostUpdate::Unchanged => HttpResponse::BadRequest().json(json!({
      "msg": unchanged,
    })),
  }
}

/// create post
#[post("/posts", wrap="Auth::required()")]
async fn create(
  auth: AuthData,
  db: web::Data<DbService>,
  form: web::Json<CreatePost>,
) -> Result<HttpResponse, Error> {
  let form = form.into_inner();
  if let Err(errors) = check_form(&form) {
    return Ok(HttpResponse::BadRequest().json(errors));
  }
  let user = match db.user.get_by_id(auth.user_id).await? {
    Some(user) => user,
    None => return Ok(unknown_user()),
  };

  let post = db.post.create(Post {
    id: new_id(),
    user: user.id,
    text: form.text,
    name: user.name,
    avatar: user.avatar,
    likes: Vec::new(),
    comments: Vec::new(),
    date: now(),
  }).await?;
  debug!("post: created {}", post.id);
  Ok(HttpResponse::Ok().json(post))
}

/// list posts, newest first
#[get("/posts")]
async fn list(
  db: web::Data<DbService>,
) -> Result<HttpResponse, Error> {
  let posts = db.post.list().await?;
  Ok(HttpResponse::Ok().json(posts))
}

/// get post by id
#[get("/posts/{id}")]
async fn get_post(
  db: web::Data<DbService>,
  id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let post = match parse_id(&id) {
    Some(id) => db.post.get(id).await?,
    None => None,
  };
  match post {
    Some(post) => Ok(HttpResponse::Ok().json(post)),
    None => Ok(post_not_found()),
  }
}

/// delete own post
#[delete("/posts/{id}", wrap="Auth::required()")]
async fn delete_post(
  auth: AuthData,
  db: web::Data<DbService>,
  id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let id = match parse_id(&id) {
    Some(id) => id,
    None => return Ok(post_not_found()),
  };
  let update = db.post.delete(id, auth.user_id).await?
    .map(|_| json!({ "msg": "Post removed" }));
  Ok(post_response(update, "Post not removed"))
}

/// like post
#[put("/posts/like/{id}", wrap="Auth::required()")]
async fn like(
  auth: AuthData,
  db: web::Data<DbService>,
  id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let id = match parse_id(&id) {
    Some(id) => id,
    None => return Ok(post_not_found()),
  };
  let update = db.post.like(id, auth.user_id).await?;
  Ok(post_response(update, "Post already liked"))
}

/// unlike post
#[put("/posts/unlike/{id}", wrap="Auth::required()")]
async fn unlike(
  auth: AuthData,
  db: web::Data<DbService>,
  id: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let id = match parse_id(&id) {
    Some(id) => id,
    None => return Ok(post_not_found()),
  };
  let update = db.post.unlike(id, auth.user_id).await?;
  Ok(post_response(update, "Post has not yet been liked"))
}

/// comment on post
#[put("/posts/comment/{id}", wrap="Auth::required()")]
async fn comment(
  auth: AuthData,
  db: web::Data<DbService>,
  id: web::Path<String>,
  form: web::Json<CreateComment>,
) -> Result<HttpResponse, Error> {
  let form = form.into_inner();
  if let Err(errors) = check_form(&form) {
    return Ok(HttpResponse::BadRequest().json(errors));
  }
  let id = match parse_id(&id) {
    Some(id) => id,
    None => return Ok(post_not_found()),
  };
  let user = match db.user.get_by_id(auth.user_id).await? {
    Some(user) => user,
    None => return Ok(unknown_user()),
  };

  let comment = Comment {
    id: new_id(),
    user: user.id,
    text: form.text,
    name: user.name,
    avatar: user.avatar,
    date: now(),
  };
  let update = db.post.add_comment(id, comment).await?;
  Ok(post_response(update, "Comment not added"))
}

/// delete own comment
#[delete("/posts/comment/{id}/{comment_id}", wrap="Auth::required()")]
async fn uncomment(
  auth: AuthData,
  db: web::Data<DbService>,
  path: web::Path<(String, String)>,
) -> Result<HttpResponse, Error> {
  let (id, comment_id) = path.into_inner();
  let id = match parse_id(&id) {
    Some(id) => id,
    None => return Ok(post_not_found()),
  };
  let update = match parse_id(&comment_id) {
    Some(comment_id) => db.post.remove_comment(id, comment_id, auth.user_id).await?,
    // still report a missing post before a missing comment.
    None => match db.post.get(id).await? {
      Some(_) => PostUpdate::CommentNotFound,
      None => PostUpdate::PostNotFound,
    },
  };
  Ok(post_response(update, "Comment not removed"))
}

#[derive(Debug, Clone, Default)]
pub struct PostService {
}

impl super::Service for PostService {
  fn load_app_config(&mut self, _config: &AppConfig, _prefix: &str) -> Result<()> {
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    web
      .service(create)
      .service(list)
      .service(get_post)
      .service(delete_post)
      .service(like)
      .service(unlike)
      .service(comment)
      .service(uncomment);
  }
}

pub fn new_factory() -> PostService {
  Default::default()
}
