use log::*;

use actix_web::{
  get, web, HttpResponse,
  Error
};

use crate::error::*;
use crate::app::*;
use crate::github::{GithubClient, GithubConfig};

/// oldest repositories of a GitHub user
#[get("/profile/github/{username}")]
async fn repos(
  github: web::Data<GithubClient>,
  username: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let repos = github.list_repos(&username).await
    .map_err(crate::error::Error::from)?;
  Ok(HttpResponse::Ok().json(repos))
}

/// first page of repositories
#[get("/profile/github-graphql/{username}")]
async fn first_page(
  github: web::Data<GithubClient>,
  username: web::Path<String>,
) -> Result<HttpResponse, Error> {
  let page = github.repo_page(&username, None).await
    .map_err(crate::error::Error::from)?;
  Ok(HttpResponse::Ok().json(page))
}

/// page of repositories after `cursor`
#[get("/profile/github-graphql/{username}/{cursor}")]
async fn next_page(
  github: web::Data<GithubClient>,
  path: web::Path<(String, String)>,
) -> Result<HttpResponse, Error> {
  let (username, cursor) = path.into_inner();
  let page = github.repo_page(&username, Some(&cursor)).await
    .map_err(crate::error::Error::from)?;
  Ok(HttpResponse::Ok().json(page))
}

#[derive(Clone, Default)]
pub struct GithubService {
  client: Option<GithubClient>,
}

impl super::Service for GithubService {
  fn load_app_config(&mut self, config: &AppConfig, _prefix: &str) -> Result<()> {
    let config = GithubConfig::from_app_config(config)?;
    // fail at startup, not on the first request.
    self.client = Some(GithubClient::new(config)?);
    Ok(())
  }

  fn api_config(&self, web: &mut web::ServiceConfig) {
    let client = match self.client {
      Some(ref client) => client.clone(),
      None => {
        error!("GithubService: config not loaded, repo routes disabled.");
        return;
      },
    };
    web.app_data(web::Data::new(client))
      .service(repos)
      .service(first_page)
      .service(next_page);
  }
}

pub fn new_factory() -> GithubService {
  Default::default()
}

#[cfg(test)]
mod tests {
  use super::*;

  use actix_web::{test, App};
  use ::config::{Config, File, FileFormat};

  use crate::services::Service;

  #[actix_rt::test]
  async fn routes_need_a_loaded_client() {
    // without config no route is mounted.
    let service = new_factory();
    let app = test::init_service(App::new().configure(|web| service.api_config(web))).await;
    let req = test::TestRequest::get().uri("/profile/github/bad_name!").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);

    let conf = Config::builder()
      .add_source(File::from_str("[github]\nuser_agent = \"test\"\n", FileFormat::Toml))
      .build()
      .unwrap();
    let mut service = new_factory();
    service.load_app_config(&AppConfig::from_config(conf), "api").unwrap();
    assert!(service.client.is_some());

    // invalid usernames are answered without calling GitHub.
    let app = test::init_service(App::new().configure(|web| service.api_config(web))).await;
    let req = test::TestRequest::get().uri("/profile/github/bad_name!").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status().as_u16(), 404);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["msg"], "Invalid username");
  }
}
