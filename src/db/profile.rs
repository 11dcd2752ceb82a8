use async_trait::async_trait;

use postgres_types::Json;
use tokio_postgres::Row;

use uuid::Uuid;

use crate::error::*;
use crate::models::*;
use crate::util::{new_id, now};

use crate::db::*;
use crate::db::util::*;

#[derive(Clone)]
pub struct PgProfileStore {
  // gets
  profile_by_owner: VersionedStatement,
  profiles: VersionedStatement,

  // upsert by user_id
  upsert_profile: VersionedStatement,

  // experience/education lists
  add_experience: VersionedStatement,
  remove_experience: VersionedStatement,
  add_education: VersionedStatement,
  remove_education: VersionedStatement,
}

lazy_static! {
  static ref PROFILE_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "profiles",
      columns: vec![
        noted("id", ColumnNote::Primary),
        noted("user_id", ColumnNote::Fixed),
        column("company"),
        column("website"),
        column("location"),
        column("status"),
        column("skills"),
        column("bio"),
        column("github_username"),
        column("social"),
        noted("date", ColumnNote::Fixed),
        noted("experience", ColumnNote::Extra),
        noted("education", ColumnNote::Extra),
      ],
    }
  };
}

/// Select profiles from `source` (aliased `p`) joined with their owner.
fn details_query(source: &str) -> String {
  format!(r#"SELECT {}, u.name, u.avatar FROM {} LEFT JOIN users u ON u.id = p.user_id"#,
    PROFILE_COLUMNS.get_columns_prefixed("p", true), source)
}

/// Run `update` (a statement with `RETURNING *`) and select the joined result.
fn details_after(update: &str) -> String {
  format!("WITH p AS ({}) {}", update, details_query("p"))
}

/// Rewrite a JSONB list without the entry whose `_id` is `$2`.
fn remove_entry_query(list: &str) -> String {
  details_after(&format!(r#"UPDATE profiles SET {list} = COALESCE(
      (SELECT jsonb_agg(e ORDER BY i) FROM jsonb_array_elements({list}) WITH ORDINALITY AS t(e, i)
        WHERE e->>'_id' <> $2), '[]'::jsonb)
    WHERE user_id = $1 RETURNING *"#, list = list))
}

/// Prepend `$2` (a one element JSONB array) to a JSONB list.
fn prepend_entry_query(list: &str) -> String {
  details_after(&format!(r#"UPDATE profiles SET {list} = $2::jsonb || {list}
    WHERE user_id = $1 RETURNING *"#, list = list))
}

fn profile_from_row(row: &Row) -> ProfileDetails {
  let user_id: Uuid = row.get(1);
  let social: Json<Social> = row.get(9);
  let experience: Json<Vec<Experience>> = row.get(11);
  let education: Json<Vec<Education>> = row.get(12);
  let name: Option<String> = row.get(13);
  let avatar: Option<String> = row.get(14);

  let user = match (name, avatar) {
    (Some(name), Some(avatar)) => Some(UserSummary {
      id: user_id,
      name,
      avatar,
    }),
    _ => None,
  };

  Profile {
    id: row.get(0),
    user,
    company: row.get(2),
    website: row.get(3),
    location: row.get(4),
    status: row.get(5),
    skills: row.get(6),
    bio: row.get(7),
    github_username: row.get(8),
    social: social.0,
    date: row.get(10),
    experience: experience.0,
    education: education.0,
  }
}

fn profile_from_opt_row(row: &Option<Row>) -> Option<ProfileDetails> {
  row.as_ref().map(profile_from_row)
}

impl PgProfileStore {
  pub fn new(cl: SharedClient) -> Result<PgProfileStore> {
    let select = details_query("profiles p");
    let profile_by_owner = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE p.user_id = $1"#, select))?;
    let profiles = VersionedStatement::new(cl.clone(),
        &format!(r#"{} ORDER BY p.date"#, select))?;

    let upsert = PROFILE_COLUMNS.build_upsert("(user_id)", false);
    let upsert_profile = VersionedStatement::new(cl.clone(),
        &details_after(&format!("{} RETURNING *", upsert)))?;

    let add_experience = VersionedStatement::new(cl.clone(), &prepend_entry_query("experience"))?;
    let remove_experience = VersionedStatement::new(cl.clone(), &remove_entry_query("experience"))?;
    let add_education = VersionedStatement::new(cl.clone(), &prepend_entry_query("education"))?;
    let remove_education = VersionedStatement::new(cl, &remove_entry_query("education"))?;

    Ok(PgProfileStore {
      profile_by_owner,
      profiles,
      upsert_profile,
      add_experience,
      remove_experience,
      add_education,
      remove_education,
    })
  }
}

#[async_trait(?Send)]
impl ProfileStore for PgProfileStore {
  async fn prepare(&self) -> Result<()> {
    self.profile_by_owner.prepare().await?;
    self.profiles.prepare().await?;
    self.upsert_profile.prepare().await?;
    self.add_experience.prepare().await?;
    self.remove_experience.prepare().await?;
    self.add_education.prepare().await?;
    self.remove_education.prepare().await?;

    Ok(())
  }

  async fn get_by_owner(&self, user_id: Uuid) -> Result<Option<ProfileDetails>> {
    let row = self.profile_by_owner.query_opt(&[&user_id]).await?;
    Ok(profile_from_opt_row(&row))
  }

  async fn list(&self) -> Result<Vec<ProfileDetails>> {
    let rows = self.profiles.query(&[]).await?;
    Ok(rows.iter().map(profile_from_row).collect())
  }

  async fn upsert_by_owner(&self, user_id: Uuid, fields: ProfileFields) -> Result<ProfileDetails> {
    // id/date only take effect when the profile is inserted.
    let profile = fields.into_profile(new_id(), user_id, now());
    let social = Json(&profile.social);
    let row = self.upsert_profile.query_one(&[
      &profile.id, &profile.user, &profile.company, &profile.website, &profile.location,
      &profile.status, &profile.skills, &profile.bio, &profile.github_username,
      &social, &profile.date,
    ]).await?;
    Ok(profile_from_row(&row))
  }

  async fn add_experience(&self, user_id: Uuid, exp: Experience) -> Result<Option<ProfileDetails>> {
    let entry = Json(vec![exp]);
    let row = self.add_experience.query_opt(&[&user_id, &entry]).await?;
    Ok(profile_from_opt_row(&row))
  }

  async fn remove_experience(&self, user_id: Uuid, exp_id: Uuid) -> Result<Option<ProfileDetails>> {
    let row = self.remove_experience.query_opt(&[&user_id, &exp_id.to_string()]).await?;
    Ok(profile_from_opt_row(&row))
  }

  async fn add_education(&self, user_id: Uuid, edu: Education) -> Result<Option<ProfileDetails>> {
    let entry = Json(vec![edu]);
    let row = self.add_education.query_opt(&[&user_id, &entry]).await?;
    Ok(profile_from_opt_row(&row))
  }

  async fn remove_education(&self, user_id: Uuid, edu_id: Uuid) -> Result<Option<ProfileDetails>> {
    let row = self.remove_education.query_opt(&[&user_id, &edu_id.to_string()]).await?;
    Ok(profile_from_opt_row(&row))
  }
}
