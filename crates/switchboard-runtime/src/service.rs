//! The service object: configuration, handlers, middlewares and tasks, plus
//! the lifecycle that starts listeners and waits for a shutdown signal.
//!
//! ```rust,ignore
//! use switchboard_runtime::Service;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = Service::new("storage").config_file("config.yml")?;
//!     let ctx = service.context();
//!
//!     service
//!         .handlers(vec![/* HandlerDescriptor::new(...) */])
//!         .middlewares(vec![/* logging_middleware("Logging") */])
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::ffi::OsString;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use switchboard_core::{
    Dispatcher, HandlerDescriptor, Middleware, Registry, ServiceContext, Settings,
};
use switchboard_transport::ListenAddr;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::{Cli, Invocation};
use crate::config::{ServiceConfig, load_config, load_config_from_file};
use crate::error::RuntimeResult;
use crate::logging;

/// Build date reported by `/version`.
pub const BUILD_DATE: &str = match option_env!("SWITCHBOARD_BUILD_DATE") {
    Some(date) => date,
    None => "no build date",
};

/// A unit of background work started alongside the listeners.
pub struct Task(Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>);

impl Task {
    /// Wraps an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Box::new(move || f().boxed()))
    }

    /// Runs the task to completion.
    pub async fn run(self) {
        (self.0)().await
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Task")
    }
}

/// A configured microservice.
#[derive(Debug)]
pub struct Service {
    name: String,
    context: Arc<ServiceContext>,
    handlers: Vec<HandlerDescriptor>,
    middlewares: Vec<Middleware>,
    tasks: Vec<Task>,
    init_task: Option<Task>,
}

impl Service {
    /// Creates a service with empty settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: Arc::new(ServiceContext::default()),
            handlers: Vec::new(),
            middlewares: Vec::new(),
            tasks: Vec::new(),
            init_task: None,
        }
    }

    /// Replaces the settings (and the context that carries them).
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.context = Arc::new(ServiceContext::new(settings));
        self.init_logging();
        self
    }

    /// Loads settings from `path` plus `SWITCHBOARD_*` environment overrides.
    pub fn config_file<P: AsRef<Path>>(self, path: P) -> RuntimeResult<Self> {
        let settings = load_config_from_file(path)?;
        Ok(self.with_settings(settings))
    }

    /// Loads settings from the default files in the current directory or,
    /// failing that, the user config directory.
    pub fn load_config(self) -> RuntimeResult<Self> {
        let settings = load_config()?;
        Ok(self.with_settings(settings))
    }

    /// Appends request handlers.
    pub fn handlers(mut self, handlers: Vec<HandlerDescriptor>) -> Self {
        self.handlers.extend(handlers);
        self
    }

    /// Appends global middlewares; the first one runs outermost.
    pub fn middlewares(mut self, middlewares: Vec<Middleware>) -> Self {
        self.middlewares.extend(middlewares);
        self
    }

    /// Appends background tasks.
    pub fn tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Sets the task awaited before the command line is handled.
    pub fn init_task(mut self, task: Task) -> Self {
        self.init_task = Some(task);
        self
    }

    /// Service name, used as the CLI program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared context handed to handlers and tasks.
    pub fn context(&self) -> Arc<ServiceContext> {
        Arc::clone(&self.context)
    }

    /// The typed view of the current settings.
    pub fn config(&self) -> ServiceConfig {
        ServiceConfig::from_settings(self.context.settings())
    }

    fn init_logging(&self) {
        logging::init_from_config(&self.config());
    }

    fn build_dispatcher(&mut self) -> RuntimeResult<Dispatcher> {
        let registry = Registry::register(std::mem::take(&mut self.handlers))?;
        Ok(Dispatcher::new(
            registry,
            std::mem::take(&mut self.middlewares),
        ))
    }

    /// Runs the init task, then the command line from the process arguments.
    pub async fn run(self) -> RuntimeResult<()> {
        self.run_from(std::env::args_os()).await
    }

    /// Runs the init task, then the command line from `args`.
    ///
    /// `start` serves until Ctrl+C or SIGTERM; a method subcommand prints its
    /// JSON result on stdout.
    pub async fn run_from<I, T>(mut self, args: I) -> RuntimeResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.init_logging();
        if let Some(task) = self.init_task.take() {
            task.run().await;
        }

        let dispatcher = self.build_dispatcher()?;
        let cli = Cli::new(self.name.clone(), dispatcher.clone());
        match cli.run_from(args).await? {
            Invocation::Start => self.serve(dispatcher, wait_for_shutdown()).await,
            Invocation::Output(body) => {
                println!("{body}");
                Ok(())
            }
            Invocation::Help(text) => {
                println!("{text}");
                Ok(())
            }
        }
    }

    /// Starts every enabled listener and all tasks, then waits for Ctrl+C or
    /// SIGTERM.
    pub async fn start_services(self) -> RuntimeResult<()> {
        self.start_services_until(wait_for_shutdown()).await
    }

    /// Like [`start_services`](Self::start_services) with a custom shutdown
    /// future.
    pub async fn start_services_until<F>(mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.init_logging();
        let dispatcher = self.build_dispatcher()?;
        self.serve(dispatcher, shutdown).await
    }

    async fn serve<F>(self, dispatcher: Dispatcher, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        let config = self.config();
        let token = CancellationToken::new();

        let mut listeners = Vec::new();
        if config.http.enabled {
            listeners.extend(spawn_http(&config, &dispatcher, &token));
        }
        if config.ws.enabled {
            listeners.extend(spawn_ws(&config, &dispatcher, &token));
        }

        let tasks: Vec<JoinHandle<()>> = self
            .tasks
            .into_iter()
            .map(|task| tokio::spawn(task.run()))
            .collect();

        info!("{} has been started!", self.name);

        if config.socket.enabled {
            listeners.extend(spawn_socket(&config, &dispatcher, &token));
        }

        shutdown.await;
        token.cancel();

        for listener in listeners {
            if let Err(e) = listener.await {
                error!(error = %e, "Listener task failed");
            }
        }
        for task in tasks {
            task.abort();
        }

        info!("{} stopped", self.name);
        Ok(())
    }
}

fn listen_addr(config: &ServiceConfig, port: u16) -> ListenAddr {
    ListenAddr::new(config.host.clone(), port)
}

#[cfg(feature = "http-server")]
fn spawn_http(
    config: &ServiceConfig,
    dispatcher: &Dispatcher,
    token: &CancellationToken,
) -> Option<JoinHandle<()>> {
    use switchboard_transport::{HttpOptions, HttpServer, TokenGuard};

    let options = HttpOptions {
        addr: listen_addr(config, config.http.port),
        read_timeout: config.http.read_timeout,
        write_timeout: config.http.write_timeout,
        cors: config.http.cors,
        token: TokenGuard::new(config.token.clone()),
        token_policy: config.http.token_policy,
        version: config.version.clone(),
        build_date: BUILD_DATE.to_string(),
        ..HttpOptions::default()
    };
    let server = HttpServer::new(options, dispatcher.clone());
    let token = token.clone();
    Some(tokio::spawn(async move {
        if let Err(e) = server.serve(token).await {
            error!(error = %e, "HTTP server stopped");
        }
    }))
}

#[cfg(not(feature = "http-server"))]
fn spawn_http(_: &ServiceConfig, _: &Dispatcher, _: &CancellationToken) -> Option<JoinHandle<()>> {
    warn!("HTTP is enabled in configuration but the http-server feature is off");
    None
}

#[cfg(feature = "ws-server")]
fn spawn_ws(
    config: &ServiceConfig,
    dispatcher: &Dispatcher,
    token: &CancellationToken,
) -> Option<JoinHandle<()>> {
    use switchboard_transport::{TokenGuard, WsServer};

    let server = WsServer::new(
        listen_addr(config, config.ws.port),
        TokenGuard::new(config.token.clone()),
        dispatcher.clone(),
    );
    let token = token.clone();
    Some(tokio::spawn(async move {
        if let Err(e) = server.serve(token).await {
            error!(error = %e, "WebSocket server stopped");
        }
    }))
}

#[cfg(not(feature = "ws-server"))]
fn spawn_ws(_: &ServiceConfig, _: &Dispatcher, _: &CancellationToken) -> Option<JoinHandle<()>> {
    warn!("WebSocket is enabled in configuration but the ws-server feature is off");
    None
}

#[cfg(feature = "socket-server")]
fn spawn_socket(
    config: &ServiceConfig,
    dispatcher: &Dispatcher,
    token: &CancellationToken,
) -> Option<JoinHandle<()>> {
    use switchboard_transport::SocketServer;

    let server = SocketServer::new(listen_addr(config, config.socket.port), dispatcher.clone());
    let token = token.clone();
    Some(tokio::spawn(async move {
        if let Err(e) = server.serve(token).await {
            error!(error = %e, "Socket server stopped");
        }
    }))
}

#[cfg(not(feature = "socket-server"))]
fn spawn_socket(
    _: &ServiceConfig,
    _: &Dispatcher,
    _: &CancellationToken,
) -> Option<JoinHandle<()>> {
    warn!("Socket is enabled in configuration but the socket-server feature is off");
    None
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c() => {}
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    ctrl_c().await;
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;
    use switchboard_core::{Outcome, Request};
    use tokio::sync::oneshot;

    fn quiet_settings() -> Settings {
        Settings::from(json!({
            "common": {
                "http": {"enabled": false},
                "ws": {"enabled": false},
                "socket": {"enabled": false}
            },
            "test": "81"
        }))
    }

    #[test]
    fn test_context_carries_settings() {
        let service = Service::new("storage").with_settings(quiet_settings());
        assert_eq!(service.name(), "storage");
        assert_eq!(service.context().config_str("test", "80"), "81");
        assert!(!service.config().http.enabled);
    }

    #[test]
    fn test_config_file_missing() {
        let result = Service::new("storage").config_file("/no/such/config.yml");
        assert!(matches!(
            result,
            Err(crate::RuntimeError::Config(crate::config::ConfigError::FileNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_tasks_run_until_shutdown() {
        let (started_tx, started_rx) = oneshot::channel();
        let task = Task::new(move || async move {
            let _ = started_tx.send(());
        });

        let service = Service::new("storage")
            .with_settings(quiet_settings())
            .tasks(vec![task]);

        service
            .start_services_until(async move {
                let _ = started_rx.await;
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_handlers_rejected() {
        let handler = || HandlerDescriptor::new("get", |_req: Request| async { Outcome::ok(1) });
        let service = Service::new("storage")
            .with_settings(quiet_settings())
            .handlers(vec![handler(), handler()]);

        let result = service.start_services_until(async {}).await;
        assert!(matches!(result, Err(crate::RuntimeError::Registry(_))));
    }

    #[tokio::test]
    async fn test_init_task_runs_before_command() {
        let service = Service::new("storage").with_settings(quiet_settings());
        let ctx = service.context();
        let handler_ctx = service.context();
        let seen = Arc::new(Mutex::new(None));
        let handler_seen = Arc::clone(&seen);

        service
            .init_task(Task::new(move || async move {
                ctx.set_value("ready", true);
            }))
            .handlers(vec![HandlerDescriptor::new("ready", move |_req: Request| {
                let ctx = Arc::clone(&handler_ctx);
                let seen = Arc::clone(&handler_seen);
                async move {
                    let ready = ctx.value("ready").unwrap_or_default();
                    *seen.lock() = Some(ready.clone());
                    Outcome::ok(ready)
                }
            })])
            .run_from(["storage", "ready", "null"])
            .await
            .unwrap();

        assert_eq!(*seen.lock(), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_cli_failure_is_error() {
        let result = Service::new("storage")
            .with_settings(quiet_settings())
            .run_from(["storage", "missing"])
            .await;
        assert!(result.is_err());
    }
}
