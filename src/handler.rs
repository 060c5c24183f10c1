//! Response adapter.
//!
//! Wraps one controller method dispatch into an axum route handler and
//! normalizes its outcome into exactly one write: a value is rendered as
//! JSON or plain text per the controller's mode, an absent value becomes a
//! literal `null`, an already-committed response passes through untouched,
//! and an error is handed to the error pipeline instead of panicking.

use crate::metadata::ControllerHandler;
use crate::middleware::{ErrorPipeline, Filter};
use axum::Json;
use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::sync::Arc;

/// The outcome of a controller method, tagged so the adapter's branch is
/// exhaustive.
pub enum Reply {
    /// A value to render, per the controller's JSON mode.
    Value(serde_json::Value),
    /// Nothing to render; the adapter writes an explicit `null`.
    Empty,
    /// The method built the full response itself; the adapter must not
    /// write anything further.
    Committed(Response),
}

impl Reply {
    /// Tag a serializable value.
    pub fn value<T: Serialize>(value: T) -> std::result::Result<Self, anyhow::Error> {
        Ok(Reply::Value(serde_json::to_value(value)?))
    }

    /// Tag a response the method committed itself.
    pub fn committed(response: impl IntoResponse) -> Self {
        Reply::Committed(response.into_response())
    }
}

/// One mounted route: the controller singleton, the method key, the
/// controller's JSON mode, the resolved filter chain and the shared error
/// pipeline.
pub(crate) struct RouteAdapter {
    controller: Arc<dyn ControllerHandler>,
    key: &'static str,
    json: bool,
    filters: Vec<Arc<dyn Filter>>,
    errors: ErrorPipeline,
}

impl RouteAdapter {
    pub(crate) fn new(
        controller: Arc<dyn ControllerHandler>,
        key: &'static str,
        json: bool,
        filters: Vec<Arc<dyn Filter>>,
        errors: ErrorPipeline,
    ) -> Self {
        Self {
            controller,
            key,
            json,
            filters,
            errors,
        }
    }

    pub(crate) async fn handle(&self, request: Request<Body>) -> Response {
        for filter in &self.filters {
            if let Err(response) = filter.check(&request).await {
                return response;
            }
        }

        // The error pipeline only needs the head of the request, so keep a
        // copy of the parts before the controller consumes it.
        let (parts, body) = request.into_parts();
        let request = Request::from_parts(parts.clone(), body);

        match self.controller.dispatch(self.key, request).await {
            Ok(Reply::Value(value)) => render(self.json, value),
            Ok(Reply::Empty) => render(self.json, serde_json::Value::Null),
            Ok(Reply::Committed(response)) => response,
            Err(error) => self.errors.dispatch(error, &parts).await,
        }
    }
}

fn render(json: bool, value: serde_json::Value) -> Response {
    if json {
        Json(value).into_response()
    } else {
        match value {
            serde_json::Value::String(text) => text.into_response(),
            serde_json::Value::Null => "null".to_string().into_response(),
            other => other.to_string().into_response(),
        }
    }
}
