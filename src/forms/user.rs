use serde::{Deserialize, Serialize};

use validator::Validate;

#[derive(Debug, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct LoginUser {
  #[serde(default)]
  #[validate(email(message = "Please include a valid email"))]
  pub email: String,
  #[serde(default)]
  #[validate(length(min = 1, message = "Password is required"))]
  pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct RegisterUser {
  #[serde(default)]
  #[validate(length(min = 1, message = "Name is required"))]
  pub name: String,
  #[serde(default)]
  #[validate(email(message = "Please include a valid email"))]
  pub email: String,
  #[serde(default)]
  #[validate(length(min = 6, message = "Please enter a password with 6 or more characters"))]
  pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
  pub token: String,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::forms::check_form;

  #[test]
  fn register_reports_every_bad_field() {
    let form = RegisterUser {
      name: "".into(),
      email: "not-an-email".into(),
      password: "12345".into(),
    };
    let errs = check_form(&form).unwrap_err();
    let params: Vec<&str> = errs["errors"].as_array().unwrap().iter()
      .map(|e| e["param"].as_str().unwrap())
      .collect();
    assert_eq!(params, vec!["email", "name", "password"]);
    assert_eq!(errs["errors"][2]["msg"], "Please enter a password with 6 or more characters");
  }

  #[test]
  fn register_accepts_six_char_password() {
    let form = RegisterUser {
      name: "A".into(),
      email: "a@x.com".into(),
      password: "secret".into(),
    };
    assert!(check_form(&form).is_ok());
  }

  #[test]
  fn login_requires_password() {
    let form: LoginUser = serde_json::from_value(json!({ "email": "a@x.com" })).unwrap();
    let errs = check_form(&form).unwrap_err();
    assert_eq!(errs["errors"][0]["msg"], "Password is required");
  }
}
