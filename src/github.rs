use log::*;

use chrono::{DateTime, Utc};

use reqwest::{Client, RequestBuilder, Response, StatusCode};

use serde::{Deserialize, Serialize};

use thiserror::Error;

use crate::app::AppConfig;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const DEFAULT_USER_AGENT: &str = "fast-devconnector";
const DEFAULT_PAGE_SIZE: i64 = 5;

const REPOS_QUERY: &str = r#"query ($username: String!, $first: Int!, $after: String) {
  user(login: $username) {
    repositories(orderBy: {field: CREATED_AT, direction: ASC}, first: $first, after: $after) {
      nodes { id name url createdAt }
      pageInfo { hasNextPage endCursor }
    }
  }
}"#;

#[derive(Debug, Error)]
pub enum GithubError {
  #[error("invalid username")]
  InvalidUsername,

  #[error("github request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("github returned status {0}")]
  Status(u16),

  #[error("github graphql error: {0}")]
  Graphql(String),
}

pub type GithubResult<T> = std::result::Result<T, GithubError>;

/// Repository as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
  pub id: String,
  pub name: String,
  pub url: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
  pub has_next_page: bool,
  pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepoPage {
  pub repos: Vec<Repo>,
  pub page_info: PageInfo,
}

// REST shape.
#[derive(Debug, Deserialize)]
struct RestRepo {
  id: u64,
  name: String,
  html_url: String,
  created_at: DateTime<Utc>,
}

impl From<RestRepo> for Repo {
  fn from(repo: RestRepo) -> Self {
    Repo {
      id: repo.id.to_string(),
      name: repo.name,
      url: repo.html_url,
      created_at: repo.created_at,
    }
  }
}

// GraphQL shapes.
#[derive(Debug, Deserialize)]
struct GraphqlResponse {
  data: Option<GraphqlData>,
  #[serde(default)]
  errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
  #[serde(rename = "type")]
  kind: Option<String>,
  #[serde(default)]
  message: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
  user: Option<GraphqlUser>,
}

#[derive(Debug, Deserialize)]
struct GraphqlUser {
  repositories: GraphqlRepos,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphqlRepos {
  nodes: Vec<Repo>,
  page_info: PageInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GithubConfig {
  pub api_url: String,
  pub graphql_url: String,
  pub token: Option<String>,
  pub user_agent: String,
  pub page_size: i64,
}

impl Default for GithubConfig {
  fn default() -> Self {
    Self {
      api_url: DEFAULT_API_URL.to_string(),
      graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
      token: None,
      user_agent: DEFAULT_USER_AGENT.to_string(),
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl GithubConfig {
  pub fn from_app_config(config: &AppConfig) -> crate::error::Result<Self> {
    let defaults = Self::default();
    Ok(Self {
      api_url: config.get_str("github.api_url")?.unwrap_or(defaults.api_url),
      graphql_url: config.get_str("github.graphql_url")?.unwrap_or(defaults.graphql_url),
      token: config.get_str("github.token")?.filter(|token| !token.is_empty()),
      user_agent: config.get_str("github.user_agent")?.unwrap_or(defaults.user_agent),
      page_size: config.get_int("github.page_size")?.unwrap_or(defaults.page_size),
    })
  }
}

/// GitHub logins are alphanumeric with single hyphens.  Anything else
/// can't exist, so don't send it upstream.
fn valid_username(username: &str) -> bool {
  !username.is_empty() && username.len() <= 39
    && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[derive(Clone)]
pub struct GithubClient {
  client: Client,
  config: GithubConfig,
}

impl GithubClient {
  pub fn new(config: GithubConfig) -> GithubResult<Self> {
    let client = Client::builder()
      .user_agent(config.user_agent.clone())
      .build()?;
    Ok(Self { client, config })
  }

  fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
    match self.config.token {
      Some(ref token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn check_status(res: Response) -> GithubResult<Response> {
    match res.status() {
      StatusCode::NOT_FOUND => Err(GithubError::InvalidUsername),
      status if !status.is_success() => {
        debug!("github: unexpected status {}", status);
        Err(GithubError::Status(status.as_u16()))
      },
      _ => Ok(res),
    }
  }

  /// Oldest public repositories of `username`.
  pub async fn list_repos(&self, username: &str) -> GithubResult<Vec<Repo>> {
    if !valid_username(username) {
      return Err(GithubError::InvalidUsername);
    }
    let url = format!("{}/users/{}/repos", self.config.api_url.trim_end_matches('/'), username);
    let req = self.client.get(&url).query(&[
      ("per_page", self.config.page_size.to_string()),
      ("sort", "created".to_string()),
      ("direction", "asc".to_string()),
    ]);
    let res = Self::check_status(self.authorized(req).send().await?).await?;
    let repos: Vec<RestRepo> = res.json().await?;
    Ok(repos.into_iter().map(Repo::from).collect())
  }

  /// One page of repositories, continuing after `cursor` when given.
  pub async fn repo_page(&self, username: &str, cursor: Option<&str>) -> GithubResult<RepoPage> {
    if !valid_username(username) {
      return Err(GithubError::InvalidUsername);
    }
    let body = json!({
      "query": REPOS_QUERY,
      "variables": {
        "username": username,
        "first": self.config.page_size,
        "after": cursor,
      },
    });
    let req = self.client.post(&self.config.graphql_url).json(&body);
    let res = Self::check_status(self.authorized(req).send().await?).await?;
    let res: GraphqlResponse = res.json().await?;

    if res.errors.iter().any(|err| err.kind.as_deref() == Some("NOT_FOUND")) {
      return Err(GithubError::InvalidUsername);
    }
    if !res.errors.is_empty() {
      let msg = res.errors.iter().map(|err| err.message.as_str()).collect::<Vec<_>>().join("; ");
      return Err(GithubError::Graphql(msg));
    }

    let user = res.data.and_then(|data| data.user).ok_or(GithubError::InvalidUsername)?;
    Ok(RepoPage {
      repos: user.repositories.nodes,
      page_info: user.repositories.page_info,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use wiremock::matchers::{body_partial_json, header, method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client(server: &MockServer) -> GithubClient {
    GithubClient::new(GithubConfig {
      api_url: server.uri(),
      graphql_url: format!("{}/graphql", server.uri()),
      token: Some("gh-token".into()),
      ..Default::default()
    }).unwrap()
  }

  #[actix_rt::test]
  async fn lists_oldest_repos() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/users/octocat/repos"))
      .and(query_param("per_page", "5"))
      .and(query_param("sort", "created"))
      .and(query_param("direction", "asc"))
      .and(header("authorization", "Bearer gh-token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
        "id": 1296269,
        "name": "Hello-World",
        "html_url": "https://github.com/octocat/Hello-World",
        "created_at": "2011-01-26T19:01:12Z",
        "stargazers_count": 80,
      }])))
      .mount(&server)
      .await;

    let repos = client(&server).list_repos("octocat").await.unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].id, "1296269");
    assert_eq!(repos[0].url, "https://github.com/octocat/Hello-World");

    let body = serde_json::to_value(&repos[0]).unwrap();
    assert_eq!(body["createdAt"], "2011-01-26T19:01:12Z");
  }

  #[actix_rt::test]
  async fn unknown_user_is_invalid_username() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/users/nobody-here/repos"))
      .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
      .mount(&server)
      .await;

    let res = client(&server).list_repos("nobody-here").await;
    assert!(matches!(res, Err(GithubError::InvalidUsername)));
  }

  #[actix_rt::test]
  async fn other_failures_are_not_invalid_username() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

    let res = client(&server).list_repos("octocat").await;
    assert!(matches!(res, Err(GithubError::Status(503))));
  }

  #[actix_rt::test]
  async fn malformed_usernames_never_leave() {
    let server = MockServer::start().await;
    let res = client(&server).list_repos("../admin").await;
    assert!(matches!(res, Err(GithubError::InvalidUsername)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
  }

  #[actix_rt::test]
  async fn graphql_page_with_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/graphql"))
      .and(body_partial_json(json!({
        "variables": { "username": "octocat", "first": 5, "after": "Y3Vyc29yOjU=" },
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": { "user": { "repositories": {
          "nodes": [{
            "id": "MDEwOlJlcG9zaXRvcnkxMjk2MjY5",
            "name": "Hello-World",
            "url": "https://github.com/octocat/Hello-World",
            "createdAt": "2011-01-26T19:01:12Z",
          }],
          "pageInfo": { "hasNextPage": true, "endCursor": "Y3Vyc29yOjY=" },
        }}},
      })))
      .mount(&server)
      .await;

    let page = client(&server).repo_page("octocat", Some("Y3Vyc29yOjU=")).await.unwrap();
    assert_eq!(page.repos.len(), 1);
    assert!(page.page_info.has_next_page);
    assert_eq!(page.page_info.end_cursor.as_deref(), Some("Y3Vyc29yOjY="));

    let body = serde_json::to_value(&page).unwrap();
    assert_eq!(body["pageInfo"]["endCursor"], "Y3Vyc29yOjY=");
  }

  #[actix_rt::test]
  async fn graphql_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/graphql"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "data": { "user": null },
        "errors": [{
          "type": "NOT_FOUND",
          "path": ["user"],
          "message": "Could not resolve to a User with the login of 'nobody-here'.",
        }],
      })))
      .mount(&server)
      .await;

    let res = client(&server).repo_page("nobody-here", None).await;
    assert!(matches!(res, Err(GithubError::InvalidUsername)));
  }
}
