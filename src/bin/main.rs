use clap::{Parser, Subcommand};
use dotenv::dotenv;

use fast_devconnector::{app::*, error::*};

#[derive(Debug, Parser)]
#[command(name = "fast-devconnector", version, about = "Developer profiles and posts API server")]
struct Cli {
  /// Config file, replaces `conf/$RUN_MODE` and environment overrides.
  #[arg(short, long, value_name = "FILE")]
  config: Option<String>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
  /// Run the configured servers (default).
  Serve,
  /// Create the database tables and exit.
  Migrate,
}

fn main() -> Result<()> {
  dotenv().ok();
  env_logger::init();

  let cli = Cli::parse();

  let config = AppConfig::new(cli.config.as_deref())?;

  match cli.command {
    Some(Command::Migrate) => migrate::execute(config)?,
    // default to 'serve' command.
    Some(Command::Serve) | None => serve::execute(config)?,
  }
  log::info!("Main finished");
  Ok(())
}
