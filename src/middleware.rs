//! Ordered middleware registries.
//!
//! Two categories are collected during the configuration phase and consumed
//! by the build phase:
//! - setup middleware: functions handed the application [`Router`] so they
//!   can register themselves (globally mounted layers, default routes);
//! - error middleware: handlers given a chance to turn a failed controller
//!   dispatch into a response.
//!
//! Both are sorted ascending by `order` at build time; ties keep insertion
//! order.

use crate::di::Container;
use crate::error::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::Route;
use std::convert::Infallible;
use std::sync::Arc;
use tower::{Layer, Service};

/// A setup callback invoked with the application router at build time.
pub type SetupFn = Box<dyn FnOnce(Router) -> Router + Send>;

/// One setup middleware contribution.
pub struct MiddlewareEntry {
    pub order: i32,
    pub instance: SetupFn,
}

impl MiddlewareEntry {
    pub fn new<F>(order: i32, instance: F) -> Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        Self {
            order,
            instance: Box::new(instance),
        }
    }

    /// Contribute a plain tower layer. The bounds mirror
    /// [`Router::layer`], which the entry delegates to.
    pub fn layer<L>(order: i32, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request<Body>> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request<Body>>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request<Body>>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request<Body>>>::Future: Send + 'static,
    {
        Self::new(order, move |router| router.layer(layer))
    }
}

/// Error-stage middleware: inspect a failed dispatch and either claim it by
/// producing a response, or decline with `None` so the next handler in order
/// gets a chance.
#[async_trait]
pub trait ErrorHandler: Send + Sync + 'static {
    async fn handle(&self, error: &anyhow::Error, parts: &Parts) -> Option<Response>;
}

/// One error middleware contribution.
pub struct ErrorMiddlewareEntry {
    pub order: i32,
    pub instance: Arc<dyn ErrorHandler>,
}

impl ErrorMiddlewareEntry {
    pub fn new(order: i32, instance: Arc<dyn ErrorHandler>) -> Self {
        Self { order, instance }
    }
}

/// Middleware collected during the configuration phase.
///
/// Owned by the plugin while configuration runs and consumed by the build
/// step; nothing survives past initialization.
#[derive(Default)]
pub struct MiddlewareConfig {
    middlewares: Vec<MiddlewareEntry>,
    error_middlewares: Vec<ErrorMiddlewareEntry>,
}

impl MiddlewareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_middleware(&mut self, entry: MiddlewareEntry) {
        self.middlewares.push(entry);
    }

    pub fn add_error_middleware(&mut self, entry: ErrorMiddlewareEntry) {
        self.error_middlewares.push(entry);
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    pub fn error_middleware_count(&self) -> usize {
        self.error_middlewares.len()
    }

    /// Sort both lists ascending by `order` (stable, so ties keep insertion
    /// order) and hand them to the build step.
    pub(crate) fn into_sorted(mut self) -> (Vec<MiddlewareEntry>, ErrorPipeline) {
        self.middlewares.sort_by_key(|entry| entry.order);
        self.error_middlewares.sort_by_key(|entry| entry.order);
        let handlers = self
            .error_middlewares
            .into_iter()
            .map(|entry| entry.instance)
            .collect();
        (self.middlewares, ErrorPipeline::new(handlers))
    }
}

/// A configuration object contributing ordered middleware.
///
/// The closed replacement for duck-typed configuration classes: any config
/// type declares its contributions by implementing this trait, both methods
/// defaulting to empty.
pub trait MiddlewareContributor {
    fn middlewares(&self) -> Vec<MiddlewareEntry> {
        Vec::new()
    }

    fn error_middlewares(&self) -> Vec<ErrorMiddlewareEntry> {
        Vec::new()
    }
}

/// The sorted error middleware chain, shared by every route adapter.
#[derive(Clone, Default)]
pub struct ErrorPipeline {
    handlers: Arc<Vec<Arc<dyn ErrorHandler>>>,
}

impl ErrorPipeline {
    fn new(handlers: Vec<Arc<dyn ErrorHandler>>) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    /// Offer the error to each handler in order; the first `Some` wins. When
    /// nobody claims it, fall back to a 500 carrying the error text.
    pub(crate) async fn dispatch(&self, error: anyhow::Error, parts: &Parts) -> Response {
        for handler in self.handlers.iter() {
            if let Some(response) = handler.handle(&error, parts).await {
                return response;
            }
        }
        tracing::debug!(error = %error, "unhandled controller error");
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            error.to_string(),
        )
            .into_response()
    }
}

/// Pre-handler route filter.
///
/// Filters run before the controller method, controller-level ones first,
/// then method-level, in attachment order. Returning `Err(response)`
/// short-circuits the route with that response.
#[async_trait]
pub trait Filter: Send + Sync + 'static {
    async fn check(&self, request: &Request<Body>) -> std::result::Result<(), Response>;
}

/// Reference to a filter attached to a controller or route.
#[derive(Clone)]
pub enum FilterRef {
    /// Resolved from the container by id at build time.
    Named(&'static str),
    /// Supplied inline.
    Instance(Arc<dyn Filter>),
}

impl FilterRef {
    pub(crate) fn resolve(&self, container: &Container) -> Result<Arc<dyn Filter>> {
        match self {
            FilterRef::Named(id) => container.get_named::<Arc<dyn Filter>>(id),
            FilterRef::Instance(filter) => Ok(filter.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recording_entry(order: i32, tag: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> MiddlewareEntry {
        MiddlewareEntry::new(order, move |router| {
            log.lock().unwrap().push(tag);
            router
        })
    }

    #[test]
    fn sort_is_stable_on_equal_orders() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut config = MiddlewareConfig::new();
        config.add_middleware(recording_entry(10, "a", Arc::clone(&log)));
        config.add_middleware(recording_entry(0, "b", Arc::clone(&log)));
        config.add_middleware(recording_entry(10, "c", Arc::clone(&log)));

        let (sorted, _) = config.into_sorted();
        assert_eq!(
            sorted.iter().map(|e| e.order).collect::<Vec<_>>(),
            vec![0, 10, 10]
        );

        let mut router = Router::new();
        for entry in sorted {
            router = (entry.instance)(router);
        }
        assert_eq!(*log.lock().unwrap(), vec!["b", "a", "c"]);
    }

    struct Claiming {
        seen: AtomicUsize,
        claim: bool,
    }

    #[async_trait]
    impl ErrorHandler for Claiming {
        async fn handle(&self, error: &anyhow::Error, _parts: &Parts) -> Option<Response> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            if self.claim {
                Some((axum::http::StatusCode::BAD_GATEWAY, error.to_string()).into_response())
            } else {
                None
            }
        }
    }

    fn parts() -> Parts {
        Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap()
            .into_parts()
            .0
    }

    #[tokio::test]
    async fn first_claiming_error_handler_wins() {
        let declining = Arc::new(Claiming {
            seen: AtomicUsize::new(0),
            claim: false,
        });
        let claiming = Arc::new(Claiming {
            seen: AtomicUsize::new(0),
            claim: true,
        });
        let unreached = Arc::new(Claiming {
            seen: AtomicUsize::new(0),
            claim: true,
        });

        let mut config = MiddlewareConfig::new();
        // insertion order deliberately differs from `order`
        config.add_error_middleware(ErrorMiddlewareEntry::new(2, unreached.clone()));
        config.add_error_middleware(ErrorMiddlewareEntry::new(0, declining.clone()));
        config.add_error_middleware(ErrorMiddlewareEntry::new(1, claiming.clone()));

        let (_, pipeline) = config.into_sorted();
        let response = pipeline.dispatch(anyhow::anyhow!("boom"), &parts()).await;

        assert_eq!(response.status(), axum::http::StatusCode::BAD_GATEWAY);
        assert_eq!(declining.seen.load(Ordering::SeqCst), 1);
        assert_eq!(claiming.seen.load(Ordering::SeqCst), 1);
        assert_eq!(unreached.seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unclaimed_error_falls_back_to_500() {
        let (_, pipeline) = MiddlewareConfig::new().into_sorted();
        let response = pipeline.dispatch(anyhow::anyhow!("boom"), &parts()).await;
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
