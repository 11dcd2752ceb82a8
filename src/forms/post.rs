use serde::{Deserialize, Serialize};

use validator::Validate;

#[derive(Debug, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct CreatePost {
  #[serde(default)]
  #[validate(length(min = 1, message = "Text is required"))]
  pub text: String,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct CreateComment {
  #[serde(default)]
  #[validate(length(min = 1, message = "Text is required"))]
  pub text: String,
}
