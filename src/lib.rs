//! # Gantry
//!
//! A controller mounting and lifecycle plugin for axum with built-in
//! dependency injection.
//!
//! Gantry wires a declarative controller layer onto axum inside a
//! DI host: controllers are described by an explicit registration table,
//! bound as singletons into a container, and mounted as routers under a
//! configured path prefix. The plugin also collects ordered middleware from
//! configuration objects and manages the TCP listener's lifecycle. All HTTP
//! parsing, routing and socket handling is delegated to axum and tokio.
//!
//! ## Features
//!
//! - **Explicit registration**: route metadata lives in plain data, no
//!   reflection or ambient discovery
//! - **Ordered middleware**: setup and error middleware contributed by
//!   config objects, sorted by `order` with stable ties
//! - **Tagged replies**: controller methods return [`Reply`], making the
//!   response adapter's branches exhaustive
//! - **Lifecycle management**: start/stop of the listener with graceful
//!   shutdown; stopping an unstarted plugin is a no-op
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gantry::prelude::*;
//! use serde_json::json;
//!
//! struct UserController;
//!
//! #[async_trait]
//! impl ControllerHandler for UserController {
//!     async fn dispatch(
//!         &self,
//!         key: &str,
//!         request: Request<Body>,
//!     ) -> Result<Reply, anyhow::Error> {
//!         match key {
//!             "get_user" => Reply::value(json!({ "path": request.uri().path() })),
//!             other => Err(anyhow::anyhow!("unknown handler '{other}'")),
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> gantry::Result<()> {
//!     let mut container = Container::new();
//!     container.register(GantryConfig {
//!         root_path: "/api".to_string(),
//!         ..GantryConfig::default()
//!     });
//!
//!     let mut registry = Registry::new();
//!     registry.add(
//!         ControllerRegistration::new(
//!             "UserController",
//!             ControllerMetadata::new("/users", true),
//!             |_| Ok(std::sync::Arc::new(UserController)),
//!         )
//!         .route(RouteMetadata::new("get_user", Method::GET, "/{id}")),
//!     );
//!
//!     let mut plugin = GantryPlugin::new();
//!     plugin.bind(&container, &registry)?;
//!     plugin.build(&container, &registry)?;
//!     plugin.start(&container).await?;
//!     gantry::shutdown_signal().await;
//!     plugin.stop().await
//! }
//! ```

pub mod config;
pub mod di;
pub mod error;
pub mod handler;
pub mod metadata;
pub mod middleware;
pub mod path;
pub mod plugin;

// Re-export core types
pub use config::GantryConfig;
pub use di::{Container, Registry};
pub use error::{GantryError, Result};
pub use handler::Reply;
pub use metadata::{ControllerHandler, ControllerMetadata, ControllerRegistration, RouteMetadata};
pub use middleware::{
    ErrorHandler, ErrorMiddlewareEntry, Filter, FilterRef, MiddlewareConfig, MiddlewareContributor,
    MiddlewareEntry,
};
pub use plugin::{GantryPlugin, shutdown_signal};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use gantry::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::GantryConfig;
    pub use crate::di::{Container, Registry};
    pub use crate::error::{GantryError, Result as GantryResult};
    pub use crate::handler::Reply;
    pub use crate::metadata::{
        ControllerHandler, ControllerMetadata, ControllerRegistration, RouteMetadata,
    };
    pub use crate::middleware::{
        ErrorHandler, ErrorMiddlewareEntry, Filter, FilterRef, MiddlewareConfig,
        MiddlewareContributor, MiddlewareEntry,
    };
    pub use crate::path::clean_path;
    pub use crate::plugin::{GantryPlugin, shutdown_signal};
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        body::Body,
        http::{Method, Request, StatusCode},
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
