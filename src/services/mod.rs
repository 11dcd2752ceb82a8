use log::*;

use std::collections::HashMap;

use actix_files::{Files, NamedFile};
use actix_web::dev::{fn_service, ServiceRequest, ServiceResponse};
use actix_web::{web, HttpRequest};

use crate::error::*;
use crate::app::*;
use crate::auth::JwtKeys;
use crate::db::{DbBackend, DbService};

mod user;
mod auth;
mod profile;
mod post;
mod github;

type BoxService = Box<dyn Service>;

pub trait Service: ServiceClone + Send {
  /// Load Service config from AppConfig.
  fn load_app_config(&mut self, config: &AppConfig, prefix: &str) -> Result<()>;

  /// Setup Service endpoints.
  fn web_config(&self, _web: &mut web::ServiceConfig) {
  }

  fn api_config(&self, _web: &mut web::ServiceConfig) {
  }
}

pub trait ServiceClone {
  fn clone_box(&self) -> BoxService;
}

impl<T> ServiceClone for T
where
    T: 'static + Service + Clone,
{
  fn clone_box(&self) -> BoxService {
    Box::new(self.clone())
  }
}

impl Clone for BoxService {
  fn clone(&self) -> BoxService {
    self.clone_box()
  }
}

/// Malformed JSON bodies are reported like validation failures.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .limit(256 * 1024)
    .error_handler(|err, _req: &HttpRequest| {
      debug!("Rejected json body: {}", err);
      Error::BadRequest(Error::errors(&err.to_string())).into()
    })
}

/// Built client assets, with unknown paths falling back to `index.html`.
fn static_files(dir: &str) -> Files {
  let index = format!("{}/index.html", dir.trim_end_matches('/'));
  Files::new("/", dir)
    .index_file("index.html")
    .default_handler(fn_service(move |req: ServiceRequest| {
      let index = index.clone();
      async move {
        let (req, _) = req.into_parts();
        let file = NamedFile::open_async(index).await?;
        let res = file.into_response(&req);
        Ok(ServiceResponse::new(req, res))
      }
    }))
}

#[derive(Clone)]
pub struct Services {
  backend: DbBackend,
  jwt: Option<JwtKeys>,
  static_dir: Option<String>,
  services: Vec<BoxService>,
}

impl Services {
  pub fn new(backend: DbBackend) -> Services {
    Services {
      backend,
      jwt: None,
      static_dir: None,
      services: Vec::new(),
    }
  }

  fn load_service(&mut self, name: &str, config: &AppConfig, prefix: &str) -> Result<BoxService> {
    let mut service: BoxService = match name {
      "User" => Box::new(user::new_factory()),
      "Auth" => Box::new(auth::new_factory()),
      "Profile" => Box::new(profile::new_factory()),
      "Post" => Box::new(post::new_factory()),
      "Github" => Box::new(github::new_factory()),
      _ => {
        return Err(Error::InvalidConfig(format!("unknown service: {}", name)));
      },
    };

    service.load_app_config(config, prefix)?;
    Ok(service)
  }

  /// Load Service config from AppConfig.
  pub fn load_app_config(&mut self, config: &AppConfig, prefix: &str) -> Result<()> {
    // Token keys are shared by every service that checks auth.
    self.jwt = Some(JwtKeys::from_app_config(config)?);
    self.static_dir = config.get_str(&format!("{}.static_dir", prefix))?;

    let mut loaded: HashMap<String, bool> = HashMap::new();
    let list = config.get_str_list(&format!("{}.services", prefix))?
      .ok_or_else(|| Error::MissingConfig(format!("{}.services", prefix)))?;
    for name in list.into_iter() {
      info!("Loading {}Service config", name);
      // check if it is loaded already.
      if loaded.contains_key(&name) {
        return Err(Error::InvalidConfig(format!("service loaded twice: {}", name)));
      }
      loaded.insert(name.clone(), true);
      // load service
      let service = self.load_service(&name, config, prefix)?;
      self.services.push(service);
    }
    Ok(())
  }

  /// Setup Service endpoints.
  pub fn web_config(&self, web: &mut web::ServiceConfig) {
    // Create DbService for worker.
    let db = DbService::new(&self.backend).expect("Failed to init db.");
    web.app_data(web::Data::new(db))
      .app_data(json_config());
    if let Some(ref keys) = self.jwt {
      web.app_data(web::Data::new(keys.clone()));
    }

    for service in self.services.iter() {
      service.web_config(web);
    }
    web.service(
      web::scope("/api")
        .configure(|web| {
          for service in self.services.iter() {
            service.api_config(web);
          }
        })
    );

    if let Some(ref dir) = self.static_dir {
      info!("Serving static files from: {}", dir);
      web.service(static_files(dir));
    }
  }
}

pub fn config_services(config: &AppConfig, prefix: &str, backend: DbBackend) -> Result<Services> {
  let mut services = Services::new(backend);
  services.load_app_config(config, prefix)?;
  Ok(services)
}

#[cfg(test)]
mod tests {
  use super::*;

  use ::config::{Config, File, FileFormat};

  use crate::db::MemoryStore;

  fn load(services: &str) -> Result<Services> {
    let toml = format!("[api]\nservices = {}\n\n[jwt]\nsecret = \"s\"\n", services);
    let conf = Config::builder()
      .add_source(File::from_str(&toml, FileFormat::Toml))
      .build()
      .unwrap();
    config_services(&AppConfig::from_config(conf), "api", DbBackend::Memory(MemoryStore::new()))
  }

  #[test]
  fn loads_named_services() {
    let services = load(r#"["User", "Auth", "Github"]"#).unwrap();
    assert_eq!(services.services.len(), 3);
  }

  #[test]
  fn unknown_service_is_invalid() {
    let err = load(r#"["User", "Articles"]"#).err().unwrap();
    assert!(matches!(err, Error::InvalidConfig(ref msg) if msg.contains("Articles")));
  }

  #[test]
  fn service_listed_twice_is_invalid() {
    let err = load(r#"["Post", "Post"]"#).err().unwrap();
    assert!(matches!(err, Error::InvalidConfig(_)));
  }

  #[test]
  fn services_list_is_required() {
    let conf = Config::builder()
      .add_source(File::from_str("[jwt]\nsecret = \"s\"\n", FileFormat::Toml))
      .build()
      .unwrap();
    let err = config_services(&AppConfig::from_config(conf), "api", DbBackend::Memory(MemoryStore::new()))
      .err().unwrap();
    assert!(matches!(err, Error::MissingConfig(_)));
  }
}
