use serde::de::Deserialize;

use config::{Config, ConfigError, Value, File, Environment};

use crate::error::*;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub conf: Config
}

impl AppConfig {
  pub fn new(config_file: Option<&str>) -> Result<Self> {
    // Load defaults
    let mut builder = Config::builder()
      .add_source(File::with_name("conf/default"));

    if let Some(config_file) = config_file {
      builder = builder.add_source(File::with_name(config_file));
    } else {
      // Get RUN_MODE from environment
      let env = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
      builder = builder
        .add_source(File::with_name(&format!("conf/{}", env)).required(false))
        // Allow overrides from environment: APP_JWT__SECRET -> jwt.secret
        .add_source(Environment::with_prefix("app").prefix_separator("_").separator("__"));
    }

    Ok(Self::from_config(builder.build()?))
  }

  pub fn from_config(conf: Config) -> Self {
    AppConfig {
      conf,
    }
  }

  pub fn get<'de, T: Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
    Ok(self.conf.get(key).or_else(|e| {
      match e {
        ConfigError::NotFound(_) => Ok(None),
        err => Err(err),
      }
    })?)
  }

  pub fn get_str(&self, key: &str) -> Result<Option<String>> {
    let val = if let Some(val) = self.get(key)? {
      Some(Value::into_string(val)?)
    } else {
      None
    };
    Ok(val)
  }

  pub fn get_int(&self, key: &str) -> Result<Option<i64>> {
    let val = if let Some(val) = self.get(key)? {
      Some(Value::into_int(val)?)
    } else {
      None
    };
    Ok(val)
  }

  pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
    let val = if let Some(val) = self.get(key)? {
      Some(Value::into_bool(val)?)
    } else {
      None
    };
    Ok(val)
  }

  pub fn get_array(&self, key: &str) -> Result<Option<Vec<Value>>> {
    let val = if let Some(val) = self.get(key)? {
      Some(Value::into_array(val)?)
    } else {
      None
    };
    Ok(val)
  }

  /// List of strings, e.g. `servers` or `<server>.services`.
  pub fn get_str_list(&self, key: &str) -> Result<Option<Vec<String>>> {
    let val = if let Some(list) = self.get_array(key)? {
      Some(list.into_iter()
        .map(Value::into_string)
        .collect::<std::result::Result<Vec<_>, _>>()?)
    } else {
      None
    };
    Ok(val)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use config::FileFormat;

  fn config(toml: &str) -> AppConfig {
    let conf = Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap();
    AppConfig::from_config(conf)
  }

  #[test]
  fn missing_keys_are_none() {
    let cfg = config("[jwt]\nsecret = \"s\"\n");
    assert_eq!(cfg.get_str("jwt.secret").unwrap().as_deref(), Some("s"));
    assert_eq!(cfg.get_int("jwt.expires_in").unwrap(), None);
    assert_eq!(cfg.get_bool("user.allow_register").unwrap(), None);
  }

  #[test]
  fn reads_server_lists() {
    let cfg = config(r#"
      servers = ["api"]
      [api]
      listen = "127.0.0.1:5000"
      services = ["User", "Auth"]
      workers = 2
    "#);
    assert_eq!(cfg.get_str_list("servers").unwrap(), Some(vec!["api".to_string()]));
    assert_eq!(cfg.get_str_list("api.services").unwrap().unwrap().len(), 2);
    assert_eq!(cfg.get_int("api.workers").unwrap(), Some(2));
  }

  #[test]
  fn wrong_type_is_an_error() {
    let cfg = config("[api]\nworkers = \"many\"\n");
    assert!(cfg.get_int("api.workers").is_err());
  }
}
