use chrono::{DateTime, NaiveDate, Utc};

use serde::{Deserialize, Serialize};

use uuid::Uuid;

use crate::models::UserSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experience {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub title: String,
  pub company: String,
  pub location: String,
  pub from: NaiveDate,
  pub to: Option<NaiveDate>,
  #[serde(default)]
  pub current: bool,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Education {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub school: String,
  pub degree: String,
  pub field_of_study: String,
  pub location: Option<String>,
  pub from: NaiveDate,
  pub to: Option<NaiveDate>,
  #[serde(default)]
  pub current: bool,
  pub description: Option<String>,
}

/// Social network links, by platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Social {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub youtube: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub twitter: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub facebook: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub linkedin: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub wechat: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub weibo: Option<String>,
}

/// A user's profile.  `U` is the owner: a bare user id when stored,
/// the owner's public details when returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile<U = Uuid> {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub user: U,
  pub company: Option<String>,
  pub website: Option<String>,
  pub location: Option<String>,
  pub status: String,
  pub skills: Vec<String>,
  pub bio: Option<String>,
  pub github_username: Option<String>,
  pub experience: Vec<Experience>,
  pub education: Vec<Education>,
  pub social: Social,
  pub date: DateTime<Utc>,
}

/// Profile joined with its owner.  The owner is `None` if the user record is gone.
pub type ProfileDetails = Profile<Option<UserSummary>>;

impl<U> Profile<U> {
  pub fn with_user<T>(self, user: T) -> Profile<T> {
    Profile {
      id: self.id,
      user,
      company: self.company,
      website: self.website,
      location: self.location,
      status: self.status,
      skills: self.skills,
      bio: self.bio,
      github_username: self.github_username,
      experience: self.experience,
      education: self.education,
      social: self.social,
      date: self.date,
    }
  }
}

/// The client-editable part of a profile, written by an upsert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFields {
  pub company: Option<String>,
  pub website: Option<String>,
  pub location: Option<String>,
  pub status: String,
  pub skills: Vec<String>,
  pub bio: Option<String>,
  pub github_username: Option<String>,
  pub social: Social,
}

impl ProfileFields {
  /// New profile document for `user`, with empty experience/education.
  pub fn into_profile(self, id: Uuid, user: Uuid, date: DateTime<Utc>) -> Profile {
    Profile {
      id,
      user,
      company: self.company,
      website: self.website,
      location: self.location,
      status: self.status,
      skills: self.skills,
      bio: self.bio,
      github_username: self.github_username,
      experience: Vec::new(),
      education: Vec::new(),
      social: self.social,
      date,
    }
  }

  /// Overwrite the editable fields of an existing profile.
  pub fn apply<U>(self, profile: &mut Profile<U>) {
    profile.company = self.company;
    profile.website = self.website;
    profile.location = self.location;
    profile.status = self.status;
    profile.skills = self.skills;
    profile.bio = self.bio;
    profile.github_username = self.github_username;
    profile.social = self.social;
  }
}
