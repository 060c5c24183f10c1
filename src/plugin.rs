//! Plugin phases.
//!
//! The hosting application drives four phases in order:
//!
//! ```text
//! 1. bind:    construct controller singletons, bind them by id
//! 2. config:  collect ordered middleware from contributors
//! 3. build:   assemble the axum Router (middleware, routes, error stage)
//! 4. start:   bind the TCP listener and serve
//!    ...
//! 5. stop / destroy: graceful shutdown (no-op when never started)
//! ```

use crate::config::GantryConfig;
use crate::di::{Container, Registry};
use crate::error::{GantryError, Result};
use crate::handler::RouteAdapter;
use crate::metadata::{ControllerHandler, ControllerRegistration};
use crate::middleware::{ErrorPipeline, Filter, MiddlewareConfig, MiddlewareContributor};
use crate::path::clean_path;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{MethodFilter, on};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// The controller-mounting plugin.
///
/// Owns the middleware collected during configuration, the router produced
/// by the build phase and, once started, the serve task.
#[derive(Default)]
pub struct GantryPlugin {
    middleware: MiddlewareConfig,
    router: Option<Router>,
    server: Option<ServerHandle>,
}

struct ServerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

/// Disposition of a listener bind failure.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum BindFailure {
    /// Log the message and terminate the process with exit code 1.
    Fatal(String),
    /// Surface the error to the caller.
    Propagate,
}

pub(crate) fn classify_bind_error(error: &std::io::Error, port: u16) -> BindFailure {
    match error.kind() {
        std::io::ErrorKind::PermissionDenied => {
            BindFailure::Fatal(format!("Port {port} requires elevated privileges"))
        }
        std::io::ErrorKind::AddrInUse => {
            BindFailure::Fatal(format!("Port {port} is already in use"))
        }
        _ => BindFailure::Propagate,
    }
}

impl GantryPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binding phase: construct every registered controller once and bind
    /// the singleton under its id.
    pub fn bind(&self, container: &Container, registry: &Registry) -> Result<()> {
        for registration in registry.controllers() {
            let instance = registration.construct(container).map_err(|e| {
                GantryError::ControllerConstruction {
                    id: registration.id.to_string(),
                    message: e.to_string(),
                }
            })?;
            container.bind_named(registration.id, instance);
        }
        Ok(())
    }

    /// Configuration phase: append a contributor's middleware in stable
    /// order. Final ordering is resolved by the build phase.
    pub fn config(&mut self, contributor: &dyn MiddlewareContributor) {
        for entry in contributor.middlewares() {
            self.middleware.add_middleware(entry);
        }
        for entry in contributor.error_middlewares() {
            self.middleware.add_error_middleware(entry);
        }
    }

    /// Build phase: mount every controller, apply setup middleware and wire
    /// the error stage. The finished router is also retained for
    /// [`start`](GantryPlugin::start).
    pub fn build(&mut self, container: &Container, registry: &Registry) -> Result<Router> {
        let config = container.resolve::<GantryConfig>()?;
        let (setup, errors) = std::mem::take(&mut self.middleware).into_sorted();

        let mut app = Router::new();
        app = build_controllers(app, container, registry, &config, &errors)?;

        // axum layers wrap the routes already applied, so fold the sorted
        // list in reverse: the lowest order ends up outermost and runs
        // first on a request.
        for entry in setup.into_iter().rev() {
            app = (entry.instance)(app);
        }

        self.router = Some(app.clone());
        Ok(app)
    }

    /// Start phase: bind the TCP listener and serve the built router.
    ///
    /// Privilege and address-in-use failures are logged and terminate the
    /// process with exit code 1; any other bind failure is returned.
    pub async fn start(&mut self, container: &Container) -> Result<()> {
        let config = container.resolve::<GantryConfig>()?;
        let router = self.router.take().ok_or_else(|| GantryError::NotBuilt {
            message: "start called before build".to_string(),
        })?;

        let listener = match TcpListener::bind((config.hostname.as_str(), config.port)).await {
            Ok(listener) => listener,
            Err(error) => match classify_bind_error(&error, config.port) {
                BindFailure::Fatal(message) => {
                    tracing::error!("{message}");
                    std::process::exit(1);
                }
                BindFailure::Propagate => return Err(error.into()),
            },
        };

        tracing::info!("Listening on port {}", listener.local_addr()?.port());

        let (shutdown, signal) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = signal.await;
                })
                .await
        });
        self.server = Some(ServerHandle { shutdown, task });
        Ok(())
    }

    /// Stop the listener and wait for in-flight connections to drain.
    /// Stopping a plugin that was never started succeeds as a no-op.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.server.take() else {
            return Ok(());
        };
        let _ = handle.shutdown.send(());
        match handle.task.await {
            Ok(result) => result?,
            Err(join_error) => tracing::error!("serve task failed: {join_error}"),
        }
        tracing::info!("Listener stopped");
        Ok(())
    }

    pub async fn destroy(&mut self) -> Result<()> {
        self.stop().await
    }
}

/// Wait for SIGTERM or Ctrl+C.
///
/// Convenience for hosts that keep the plugin running until an OS signal
/// arrives, then call [`GantryPlugin::stop`].
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}

fn build_controllers(
    mut app: Router,
    container: &Container,
    registry: &Registry,
    config: &GantryConfig,
    errors: &ErrorPipeline,
) -> Result<Router> {
    for registration in registry.controllers() {
        if registration.routes.is_empty() {
            tracing::debug!(id = registration.id, "controller has no routes, skipping");
            continue;
        }
        let sub = build_sub_router(container, registration, errors)?;
        let mount = clean_path(&format!("{}{}", config.root_path, registration.metadata.path));
        tracing::debug!(id = registration.id, mount = %mount, "mounting controller");
        app = if mount == "/" {
            app.merge(sub)
        } else {
            app.nest(&mount, sub)
        };
    }
    Ok(app)
}

fn build_sub_router(
    container: &Container,
    registration: &ControllerRegistration,
    errors: &ErrorPipeline,
) -> Result<Router> {
    let controller = container.get_named::<Arc<dyn ControllerHandler>>(registration.id)?;
    let controller_filters: Vec<Arc<dyn Filter>> = registration
        .filters
        .iter()
        .map(|filter| filter.resolve(container))
        .collect::<Result<_>>()?;

    let mut sub = Router::new();
    for route in &registration.routes {
        let path = clean_path(&route.path);
        let mut filters = controller_filters.clone();
        for filter in &route.filters {
            filters.push(filter.resolve(container)?);
        }
        let adapter = Arc::new(RouteAdapter::new(
            controller.clone(),
            route.key,
            registration.metadata.json,
            filters,
            errors.clone(),
        ));
        let method = MethodFilter::try_from(route.method.clone()).map_err(|_| {
            GantryError::UnsupportedMethod {
                method: route.method.to_string(),
            }
        })?;
        tracing::debug!(method = %route.method, path = %path, "registering route");
        sub = sub.route(
            &path,
            on(method, move |request: Request<Body>| {
                let adapter = Arc::clone(&adapter);
                async move { adapter.handle(request).await }
            }),
        );
    }
    Ok(sub)
}
