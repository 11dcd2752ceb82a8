use async_trait::async_trait;

use tokio_postgres::Row;

use uuid::Uuid;

use crate::error::*;

use crate::db::*;
use crate::db::util::*;

#[derive(Clone)]
pub struct PgUserStore {
  // gets
  user_by_id: VersionedStatement,
  user_by_email: VersionedStatement,

  // writes
  insert_user: VersionedStatement,
  update_password: VersionedStatement,
  delete_user: VersionedStatement,
}

lazy_static! {
  static ref USER_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "users",
      columns: vec![
        noted("id", ColumnNote::Primary),
        column("name"),
        column("email"),
        column("password"),
        column("avatar"),
        noted("date", ColumnNote::Fixed),
      ],
    }
  };
}

fn user_from_row(row: &Row) -> User {
  User {
    id: row.get(0),
    name: row.get(1),
    email: row.get(2),
    password: row.get(3),
    avatar: row.get(4),
    date: row.get(5),
  }
}

fn user_from_opt_row(row: &Option<Row>) -> Option<User> {
  row.as_ref().map(user_from_row)
}

impl PgUserStore {
  pub fn new(cl: SharedClient) -> Result<PgUserStore> {
    let select = USER_COLUMNS.build_select_query(false);
    let user_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1"#, select))?;
    let user_by_email = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE email = $1"#, select))?;

    // the unique email guards against concurrent registrations.
    let insert_user = VersionedStatement::new(cl.clone(),
        &format!(r#"{} ON CONFLICT (email) DO NOTHING RETURNING {}"#,
          USER_COLUMNS.build_insert_query(false), USER_COLUMNS.get_columns(false)))?;
    let update_password = VersionedStatement::new(cl.clone(),
        r#"UPDATE users SET password = $2 WHERE id = $1"#)?;
    let delete_user = VersionedStatement::new(cl,
        r#"WITH p AS (DELETE FROM profiles WHERE user_id = $1)
        DELETE FROM users WHERE id = $1"#)?;

    Ok(PgUserStore {
      user_by_id,
      user_by_email,
      insert_user,
      update_password,
      delete_user,
    })
  }
}

#[async_trait(?Send)]
impl UserStore for PgUserStore {
  async fn prepare(&self) -> Result<()> {
    self.user_by_id.prepare().await?;
    self.user_by_email.prepare().await?;
    self.insert_user.prepare().await?;
    self.update_password.prepare().await?;
    self.delete_user.prepare().await?;

    Ok(())
  }

  async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
    let row = self.user_by_id.query_opt(&[&id]).await?;
    Ok(user_from_opt_row(&row))
  }

  async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
    let row = self.user_by_email.query_opt(&[&email]).await?;
    Ok(user_from_opt_row(&row))
  }

  async fn create_user(&self, user: User) -> Result<Option<User>> {
    let row = self.insert_user.query_opt(&[
      &user.id, &user.name, &user.email, &user.password, &user.avatar, &user.date,
    ]).await?;
    Ok(user_from_opt_row(&row))
  }

  async fn update_password(&self, id: Uuid, password: &str) -> Result<()> {
    self.update_password.execute(&[&id, &password]).await?;
    Ok(())
  }

  async fn delete_with_profile(&self, id: Uuid) -> Result<()> {
    self.delete_user.execute(&[&id]).await?;
    Ok(())
  }
}
