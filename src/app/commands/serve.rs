use log::*;

use std::thread;
use futures::executor;

use crossbeam_channel::{
  bounded, Sender, Receiver,
};

use actix_cors::Cors;
use actix_rt::System;
use actix_web::{get, web, middleware, HttpResponse, App, HttpServer};

use crate::{
  error::*,
  app::*,
  db::{self, DbBackend, DbService},
  services::config_services,
};

#[derive(Debug)]
enum StopEvent {
  Shutdown,
  StopServer,
  StopServerFinished(u32),
  StartFailed(u32, String),
}

#[get("/stop")]
async fn stop_server(waiter: web::Data<ServerWaiter>) -> HttpResponse {
  info!("Got shutdown request.");
  waiter.main_shutdown();

  HttpResponse::Ok().body("Shutting down.")
}

#[derive(Clone)]
struct ServerStopper {
  id: u32,
  tx: Sender<StopEvent>,
}

#[derive(Clone)]
struct ServerWaiter {
  id: u32,
  main_tx: Sender<StopEvent>,
  rx: Receiver<StopEvent>,
}

impl ServerStopper {
  pub fn new(id: u32, main_tx: Sender<StopEvent>) -> (Self, ServerWaiter) {
    let (tx, rx) = bounded(1);
    (Self{
      id,
      tx,
    }, ServerWaiter{
      id,
      main_tx,
      rx,
    })
  }

  pub fn shutdown(&self) {
    debug!("Signal server({}) to stop.", self.id);
    if let Err(err) = self.tx.send(StopEvent::StopServer) {
      debug!("Server({}) already gone: {:?}", self.id, err);
    }
  }
}

impl ServerWaiter {
  pub fn wait_shutdown(&self) -> Result<StopEvent> {
    debug!("Server waiting for shutdown signal.");
    Ok(self.rx.recv()?)
  }

  pub fn server_stopped(&self) {
    debug!("Server stopped, let main thread know.");
    if let Err(err) = self.main_tx.send(StopEvent::StopServerFinished(self.id)) {
      error!("Failed to notify main thread: {:?}", err);
    }
  }

  pub fn server_failed(&self, err: &Error) {
    debug!("Server failed, let main thread know.");
    if let Err(err) = self.main_tx.send(StopEvent::StartFailed(self.id, format!("{:?}", err))) {
      error!("Failed to notify main thread: {:?}", err);
    }
  }

  pub fn main_shutdown(&self) {
    info!("Signal main thread to shutdown.");
    if let Err(err) = self.main_tx.send(StopEvent::Shutdown) {
      error!("Failed to signal main thread: {:?}", err);
    }
  }
}

#[derive(Clone)]
struct MainStopper {
  tx: Sender<StopEvent>,
  rx: Receiver<StopEvent>,
  servers: Vec<ServerStopper>,
}

impl MainStopper {
  pub fn new() -> Self {
    let (tx, rx) = bounded(1);
    Self { tx, rx,
      servers: Vec::new(),
    }
  }

  pub fn new_server(&mut self) -> ServerWaiter {
    let id = self.servers.len();
    let (stopper, waiter) = ServerStopper::new(id as u32, self.tx.clone());
    self.servers.push(stopper);
    waiter
  }

  pub fn wait_shutdown(&self) -> Result<()> {
    // wait on main stopper
    debug!("Wait for shutdown signal");
    let mut stopped_counter = 0usize;
    // first server that failed, the others are stopped after it.
    let mut failed: Option<Error> = None;
    // wait for shutdown signal.
    while stopped_counter < self.servers.len() {
      match self.rx.recv()? {
        StopEvent::Shutdown => {
          info!("Got shutdown signal.  Stop servers.");
          break;
        },
        StopEvent::StopServerFinished(id) => {
          let len = self.servers.len();
          stopped_counter += 1;
          if stopped_counter < len {
            let remain = len - stopped_counter;
            debug!("Server({}) stopped.  Remaining {}", id, remain);
          } else {
            debug!("Server({}) stopped.  All servers stopped.  Stop main thread", id);
            return Ok(());
          }
        },
        StopEvent::StartFailed(id, msg) => {
          error!("Server({}) failed: {}.  Stop servers.", id, msg);
          stopped_counter += 1;
          failed = Some(Error::ServerFailed(format!("server({}): {}", id, msg)));
          break;
        },
        ev => {
          error!("Main thread received invalid event: {:?}", ev);
        },
      }
    }

    // Tell all servers to shutdown.
    for stopper in self.servers.iter() {
      stopper.shutdown();
    }
    // Wait for the running servers to shutdown.
    let mut running = self.servers.len() - stopped_counter;
    while running > 0 {
      match self.rx.recv()? {
        StopEvent::StopServerFinished(id) | StopEvent::StartFailed(id, _) => {
          running -= 1;
          debug!("Server({}) stopped.  Remaining {}", id, running);
        },
        ev => {
          debug!("Main thread ignored event during shutdown: {:?}", ev);
        },
      }
    }
    info!("Stopped all servers.");
    match failed {
      Some(err) => Err(err),
      None => Ok(()),
    }
  }
}

pub fn execute(config: AppConfig) -> Result<()> {
  // Stopper for main thread.
  let mut main_stopper = MainStopper::new();

  // One backend for all servers, the in-memory store is shared through it.
  let backend = DbBackend::from_app_config(&config)?;
  if let DbBackend::Postgres(ref url) = backend {
    // The database must be reachable at boot.
    System::new().block_on(db::migrate(url))?;
  }

  let servers = config.get_str_list("servers")?
    .ok_or_else(|| Error::MissingConfig("servers".into()))?;
  for server in servers.into_iter() {
    let cfg = config.clone();
    let backend = backend.clone();
    let waiter = main_stopper.new_server();
    debug!("Spawn server: {}", server);
    thread::spawn(move || {
      // notify main thread that we have stopped.
      match run_server(&cfg, &server, backend, waiter.clone()) {
        Ok(()) => {
          debug!("run_server: stopped.");
          waiter.server_stopped();
        },
        Err(err) => {
          error!("Error from server({}): {:?}", server, err);
          waiter.server_failed(&err);
        },
      }
    });
  }

  // wait on main stopper
  main_stopper.wait_shutdown()?;

  info!("main thread: stopped.");
  Ok(())
}

async fn test_db(backend: DbBackend) -> Result<()> {
  let db = DbService::new(&backend)?;
  db.prepare().await
}

fn run_server(config: &AppConfig, prefix: &str, backend: DbBackend, waiter: ServerWaiter) -> Result<()> {
  let sys = System::new();

  let debug = config.get_bool("debug")?.unwrap_or(false);
  debug!("Debug = {:?}", debug);

  if debug {
    // Test db prepared statements.
    sys.block_on(test_db(backend.clone()))?;
  }

  // configure services
  info!("Serve.Services: configure services. prefix={}", prefix);
  let services = config_services(config, prefix, backend)?;

  // Check if stopper is enabled for this server
  let stopper = if config.get_bool(&format!("{}.stopper", prefix))?.unwrap_or_default() {
    Some(waiter.clone())
  } else {
    None
  };
  let access_log = config.get_bool(&format!("{}.access_log", prefix))?.unwrap_or(false);
  let cors = config.get_bool(&format!("{}.cors", prefix))?.unwrap_or(false);

  // Start http server
  let mut server = HttpServer::new(move || {
    let mut app = App::new()
      .wrap(middleware::Condition::new(cors, Cors::permissive()))
      .wrap(middleware::Condition::new(access_log, middleware::Logger::default()));

    if let Some(ref stopper) = stopper {
      // Server stopper
      app = app.app_data(web::Data::new(stopper.clone()))
        .service(stop_server);
    }

    app.configure(|web| services.web_config(web))
  });

  // workers
  let workers = match config.get_int(&format!("{}.workers", prefix))? {
    Some(workers) if workers > 0 => workers as usize,
    Some(workers) => return Err(Error::InvalidConfig(format!("{}.workers must be > 0, got {}", prefix, workers))),
    None => num_cpus::get(),
  };
  info!("Workers: {}", workers);
  server = server.workers(workers);

  // listen backlog
  if let Some(backlog) = config.get_int(&format!("{}.backlog", prefix))? {
    info!("Listen backlog: {}", backlog);
    server = server.backlog(backlog as u32);
  }

  // setup binds.
  let listen = config.get_str(&format!("{}.listen", prefix))?
    .ok_or_else(|| Error::MissingConfig(format!("{}.listen", prefix)))?;
  info!("{} services listening on: {}", prefix, listen);
  server = server.bind(listen)?;

  // start server
  let server = server.run();

  let handle = server.handle();
  let stop_waiter = waiter.clone();
  thread::spawn(move || {
    debug!("Wait for shutdown signal");
    // wait for shutdown signal.
    match stop_waiter.wait_shutdown() {
      Err(_) => (),
      Ok(StopEvent::StopServer) => {
        debug!("Got shutdown signal.  Stop server: {}", stop_waiter.id);
        executor::block_on(handle.stop(true));
      },
      Ok(ev) => {
        error!("Server waiter received invalid event: {:?}", ev);
      },
    }
  });

  // run server future
  Ok(sys.block_on(server)?)
}

#[cfg(test)]
mod tests {
  use super::*;

  use ::config::{Config, File, FileFormat};

  fn config(servers: &str, api: &str, extra: &str) -> AppConfig {
    let toml = format!(r#"
servers = {}

[api]
listen = "127.0.0.1:0"
services = ["User", "Auth"]
{}

[db]
backend = "memory"

{}
"#, servers, api, extra);
    let conf = Config::builder()
      .add_source(File::from_str(&toml, FileFormat::Toml))
      .build()
      .unwrap();
    AppConfig::from_config(conf)
  }

  #[test]
  fn execute_fails_without_jwt_secret() {
    let err = execute(config(r#"["api"]"#, "", "")).err().unwrap();
    assert!(matches!(err, Error::ServerFailed(ref msg) if msg.contains("jwt.secret")));
  }

  #[test]
  fn execute_fails_on_zero_workers() {
    let cfg = config(r#"["api"]"#, "workers = 0", "[jwt]\nsecret = \"s\"\n");
    let err = execute(cfg).err().unwrap();
    assert!(matches!(err, Error::ServerFailed(ref msg) if msg.contains("workers")));
  }

  #[test]
  fn one_failed_server_stops_the_others() {
    let cfg = config(r#"["api", "admin"]"#, "workers = 1", r#"
[jwt]
secret = "s"

[admin]
listen = "127.0.0.1:0"
services = ["Nope"]
"#);
    let err = execute(cfg).err().unwrap();
    assert!(matches!(err, Error::ServerFailed(ref msg) if msg.contains("unknown service")));
  }
}
