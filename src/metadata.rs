//! Route descriptors.
//!
//! Controllers describe themselves through an explicit registration table
//! instead of reflective metadata: one [`ControllerRegistration`] per
//! controller, carrying its [`ControllerMetadata`] and one [`RouteMetadata`]
//! per handler method in declaration order.

use crate::di::Container;
use crate::error::Result;
use crate::handler::Reply;
use crate::middleware::FilterRef;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use std::sync::Arc;

/// Controller-level metadata: the mount path and whether replies are
/// JSON-encoded (`json: false` means plain-text rendering).
#[derive(Debug, Clone)]
pub struct ControllerMetadata {
    pub path: String,
    pub json: bool,
}

impl ControllerMetadata {
    pub fn new(path: impl Into<String>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }
}

/// One handler method: the dispatch key, sub-path, HTTP verb and any
/// method-level filters.
pub struct RouteMetadata {
    pub key: &'static str,
    pub path: String,
    pub method: Method,
    pub filters: Vec<FilterRef>,
}

impl RouteMetadata {
    pub fn new(key: &'static str, method: Method, path: impl Into<String>) -> Self {
        Self {
            key,
            path: path.into(),
            method,
            filters: Vec::new(),
        }
    }

    /// Attach a method-level filter. Filters run after controller-level
    /// ones, in attachment order.
    pub fn filter(mut self, filter: FilterRef) -> Self {
        self.filters.push(filter);
        self
    }
}

/// Request dispatch for one controller instance.
///
/// `key` is the method identity declared in [`RouteMetadata::key`];
/// implementations match on it and invoke the corresponding method. An
/// unknown key should be reported as an error, which flows to the error
/// pipeline like any handler failure.
#[async_trait]
pub trait ControllerHandler: Send + Sync + 'static {
    async fn dispatch(
        &self,
        key: &str,
        request: Request<Body>,
    ) -> std::result::Result<Reply, anyhow::Error>;
}

type ConstructFn = Arc<dyn Fn(&Container) -> Result<Arc<dyn ControllerHandler>> + Send + Sync>;

/// Everything the plugin needs to know about one controller: identity,
/// metadata, routes in declaration order, controller-level filters, and a
/// constructor invoked once during the bind phase.
pub struct ControllerRegistration {
    pub id: &'static str,
    pub metadata: ControllerMetadata,
    pub routes: Vec<RouteMetadata>,
    pub filters: Vec<FilterRef>,
    construct: ConstructFn,
}

impl ControllerRegistration {
    pub fn new<F>(id: &'static str, metadata: ControllerMetadata, construct: F) -> Self
    where
        F: Fn(&Container) -> Result<Arc<dyn ControllerHandler>> + Send + Sync + 'static,
    {
        Self {
            id,
            metadata,
            routes: Vec::new(),
            filters: Vec::new(),
            construct: Arc::new(construct),
        }
    }

    pub fn route(mut self, route: RouteMetadata) -> Self {
        self.routes.push(route);
        self
    }

    /// Attach a controller-level filter, applied to every route.
    pub fn filter(mut self, filter: FilterRef) -> Self {
        self.filters.push(filter);
        self
    }

    pub(crate) fn construct(&self, container: &Container) -> Result<Arc<dyn ControllerHandler>> {
        (self.construct)(container)
    }
}
