use chrono::NaiveDate;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use validator::{Validate, ValidationError};

use crate::forms::*;
use crate::models::{Education, Experience, ProfileFields, Social};
use crate::util::new_id;

/// Split a comma separated skills string into trimmed, non-empty skills.
pub fn split_skills(skills: &str) -> Vec<String> {
  skills.split(',')
    .map(|skill| skill.trim())
    .filter(|skill| !skill.is_empty())
    .map(|skill| skill.to_string())
    .collect()
}

fn has_skills(skills: &str) -> Result<(), ValidationError> {
  if split_skills(skills).is_empty() {
    let mut err = ValidationError::new("required");
    err.message = Some("Skills is required".into());
    return Err(err);
  }
  Ok(())
}

/// Create/update profile request.  Social links arrive as top level fields.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
  #[serde(default)]
  #[validate(length(min = 1, message = "Status is required"))]
  pub status: String,
  #[serde(default)]
  #[validate(custom(function = "has_skills"))]
  pub skills: String,
  #[serde(default)]
  pub company: Option<String>,
  #[serde(default)]
  pub website: Option<String>,
  #[serde(default)]
  pub location: Option<String>,
  #[serde(default)]
  pub bio: Option<String>,
  #[serde(default)]
  pub github_username: Option<String>,
  #[serde(default)]
  pub youtube: Option<String>,
  #[serde(default)]
  pub twitter: Option<String>,
  #[serde(default)]
  pub facebook: Option<String>,
  #[serde(default)]
  pub linkedin: Option<String>,
  #[serde(default)]
  pub wechat: Option<String>,
  #[serde(default)]
  pub weibo: Option<String>,
}

impl ProfileForm {
  pub fn validated(self) -> Result<ProfileFields, JsonValue> {
    check_form(&self)?;
    Ok(ProfileFields {
      company: non_blank(self.company),
      website: non_blank(self.website),
      location: non_blank(self.location),
      status: self.status.trim().to_string(),
      skills: split_skills(&self.skills),
      bio: non_blank(self.bio),
      github_username: non_blank(self.github_username),
      social: Social {
        youtube: non_blank(self.youtube),
        twitter: non_blank(self.twitter),
        facebook: non_blank(self.facebook),
        linkedin: non_blank(self.linkedin),
        wechat: non_blank(self.wechat),
        weibo: non_blank(self.weibo),
      },
    })
  }
}

fn missing_from() -> JsonValue {
  json!({
    "errors": [FieldError {
      param: "from".into(),
      msg: "From date is required".into(),
    }],
  })
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ExperienceForm {
  #[serde(default)]
  #[validate(length(min = 1, message = "Title is required"))]
  pub title: String,
  #[serde(default)]
  #[validate(length(min = 1, message = "Company is required"))]
  pub company: String,
  #[serde(default)]
  #[validate(length(min = 1, message = "Location is required"))]
  pub location: String,
  #[serde(default, deserialize_with = "de_opt_date")]
  #[validate(required(message = "From date is required"))]
  pub from: Option<NaiveDate>,
  #[serde(default, deserialize_with = "de_opt_date")]
  pub to: Option<NaiveDate>,
  #[serde(default)]
  pub current: bool,
  #[serde(default)]
  pub description: Option<String>,
}

impl ExperienceForm {
  pub fn validated(self) -> Result<Experience, JsonValue> {
    check_form(&self)?;
    let from = self.from.ok_or_else(missing_from)?;
    Ok(Experience {
      id: new_id(),
      title: self.title,
      company: self.company,
      location: self.location,
      from,
      to: self.to,
      current: self.current,
      description: non_blank(self.description),
    })
  }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EducationForm {
  #[serde(default)]
  #[validate(length(min = 1, message = "School is required"))]
  pub school: String,
  #[serde(default)]
  #[validate(length(min = 1, message = "Degree is required"))]
  pub degree: String,
  #[serde(default)]
  #[validate(length(min = 1, message = "Field of study is required"))]
  pub field_of_study: String,
  #[serde(default)]
  pub location: Option<String>,
  #[serde(default, deserialize_with = "de_opt_date")]
  #[validate(required(message = "From date is required"))]
  pub from: Option<NaiveDate>,
  #[serde(default, deserialize_with = "de_opt_date")]
  pub to: Option<NaiveDate>,
  #[serde(default)]
  pub current: bool,
  #[serde(default)]
  pub description: Option<String>,
}

impl EducationForm {
  pub fn validated(self) -> Result<Education, JsonValue> {
    check_form(&self)?;
    let from = self.from.ok_or_else(missing_from)?;
    Ok(Education {
      id: new_id(),
      school: self.school,
      degree: self.degree,
      field_of_study: self.field_of_study,
      location: non_blank(self.location),
      from,
      to: self.to,
      current: self.current,
      description: non_blank(self.description),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn skills_are_split_and_trimmed() {
    assert_eq!(split_skills("go,rust"), vec!["go", "rust"]);
    assert_eq!(split_skills(" HTML , CSS,,  JavaScript "), vec!["HTML", "CSS", "JavaScript"]);
    assert!(split_skills(" , ").is_empty());
  }

  #[test]
  fn profile_requires_status_and_skills() {
    let form: ProfileForm = serde_json::from_value(json!({ "skills": " , " })).unwrap();
    let errs = form.validated().unwrap_err();
    let errors = errs["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["param"], "skills");
    assert_eq!(errors[0]["msg"], "Skills is required");
    assert_eq!(errors[1]["param"], "status");
  }

  #[test]
  fn profile_social_links_are_collected() {
    let form: ProfileForm = serde_json::from_value(json!({
      "status": "Developer",
      "skills": "go,rust",
      "githubUsername": "octocat",
      "twitter": "https://twitter.com/a",
      "youtube": "",
      "company": "  ",
    })).unwrap();
    let fields = form.validated().unwrap();
    assert_eq!(fields.skills, vec!["go", "rust"]);
    assert_eq!(fields.github_username.as_deref(), Some("octocat"));
    assert_eq!(fields.social.twitter.as_deref(), Some("https://twitter.com/a"));
    assert_eq!(fields.social.youtube, None);
    assert_eq!(fields.company, None);
  }

  #[test]
  fn experience_requires_fields() {
    let form: ExperienceForm = serde_json::from_value(json!({
      "title": "Dev",
      "to": "",
    })).unwrap();
    let errs = form.validated().unwrap_err();
    let params: Vec<&str> = errs["errors"].as_array().unwrap().iter()
      .map(|e| e["param"].as_str().unwrap())
      .collect();
    assert_eq!(params, vec!["company", "from", "location"]);
  }

  #[test]
  fn education_gets_a_fresh_id() {
    let body = json!({
      "school": "MIT",
      "degree": "BSc",
      "fieldOfStudy": "CS",
      "from": "2010-09-01",
      "current": true,
    });
    let a = serde_json::from_value::<EducationForm>(body.clone()).unwrap().validated().unwrap();
    let b = serde_json::from_value::<EducationForm>(body).unwrap().validated().unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(a.field_of_study, "CS");
    assert!(a.current);
    assert_eq!(a.to, None);
  }
}
