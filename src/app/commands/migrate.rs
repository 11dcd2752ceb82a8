use log::*;

use actix_rt::System;

use crate::{
  error::*,
  app::*,
  db::{self, DbBackend},
};

/// Apply the database schema and exit.
pub fn execute(config: AppConfig) -> Result<()> {
  match DbBackend::from_app_config(&config)? {
    DbBackend::Postgres(url) => {
      System::new().block_on(db::migrate(&url))?;
      info!("Database schema is up to date.");
    },
    DbBackend::Memory(_) => {
      info!("In-memory database, nothing to migrate.");
    },
  }
  Ok(())
}
