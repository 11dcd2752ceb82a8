use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use validator::{Validate, ValidationErrors};

pub mod user;
pub mod profile;
pub mod post;
pub use self::{
  user::*,
  profile::*,
  post::*,
};

/// One entry of a validation failure list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
  pub param: String,
  pub msg: String,
}

pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
  let mut list: Vec<FieldError> = errors.field_errors().iter()
    .flat_map(|(field, errs)| {
      errs.iter().map(move |err| FieldError {
        param: field.to_string(),
        msg: match err.message {
          Some(ref msg) => msg.to_string(),
          None => err.code.to_string(),
        },
      })
    })
    .collect();
  // field_errors() is a HashMap; keep the output stable.
  list.sort_by(|a, b| a.param.cmp(&b.param));
  list
}

/// Validate a form, producing the `{"errors": [..]}` body on failure.
pub fn check_form<T: Validate>(form: &T) -> Result<(), JsonValue> {
  form.validate().map_err(|errs| json!({
    "errors": field_errors(&errs),
  }))
}

/// Blank strings from html forms mean "not set".
pub fn non_blank(val: Option<String>) -> Option<String> {
  val.and_then(|val| {
    let val = val.trim();
    if val.is_empty() {
      None
    } else {
      Some(val.to_string())
    }
  })
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp; empty string or null is `None`.
pub fn de_opt_date<'de, D>(de: D) -> Result<Option<chrono::NaiveDate>, D::Error>
where
  D: Deserializer<'de>,
{
  use serde::de::Error;

  let val: Option<String> = Option::deserialize(de)?;
  let val = match non_blank(val) {
    Some(val) => val,
    None => return Ok(None),
  };
  if let Ok(date) = chrono::NaiveDate::parse_from_str(&val, "%Y-%m-%d") {
    return Ok(Some(date));
  }
  match chrono::DateTime::parse_from_rfc3339(&val) {
    Ok(ts) => Ok(Some(ts.date_naive())),
    Err(_) => Err(D::Error::custom(format!("invalid date: {}", val))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Deserialize)]
  struct Dated {
    #[serde(default, deserialize_with = "de_opt_date")]
    from: Option<chrono::NaiveDate>,
  }

  #[test]
  fn dates_accept_blank_and_timestamps() {
    let d: Dated = serde_json::from_value(json!({ "from": "" })).unwrap();
    assert_eq!(d.from, None);
    let d: Dated = serde_json::from_value(json!({})).unwrap();
    assert_eq!(d.from, None);
    let d: Dated = serde_json::from_value(json!({ "from": "2019-03-01" })).unwrap();
    assert_eq!(d.from, chrono::NaiveDate::from_ymd_opt(2019, 3, 1));
    let d: Dated = serde_json::from_value(json!({ "from": "2019-03-01T00:00:00.000Z" })).unwrap();
    assert_eq!(d.from, chrono::NaiveDate::from_ymd_opt(2019, 3, 1));
    assert!(serde_json::from_value::<Dated>(json!({ "from": "yesterday" })).is_err());
  }

  #[test]
  fn blank_is_none() {
    assert_eq!(non_blank(Some("  ".into())), None);
    assert_eq!(non_blank(Some(" x ".into())), Some("x".into()));
    assert_eq!(non_blank(None), None);
  }
}
