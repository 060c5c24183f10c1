use crate::metadata::ControllerRegistration;

/// Ordered table of controller registrations.
///
/// This is the explicit replacement for ambient annotation discovery: the
/// hosting application adds one [`ControllerRegistration`] per controller at
/// startup, and the plugin walks the table during the bind and build phases.
#[derive(Default)]
pub struct Registry {
    controllers: Vec<ControllerRegistration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, registration: ControllerRegistration) -> &mut Self {
        self.controllers.push(registration);
        self
    }

    pub fn controllers(&self) -> &[ControllerRegistration] {
        &self.controllers
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Reply;
    use crate::metadata::{ControllerHandler, ControllerMetadata};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;

    struct Noop;

    #[async_trait::async_trait]
    impl ControllerHandler for Noop {
        async fn dispatch(
            &self,
            _key: &str,
            _request: Request<Body>,
        ) -> Result<Reply, anyhow::Error> {
            Ok(Reply::Empty)
        }
    }

    fn registration(id: &'static str) -> ControllerRegistration {
        ControllerRegistration::new(id, ControllerMetadata::new("/", true), |_| {
            Ok(Arc::new(Noop))
        })
    }

    #[test]
    fn keeps_registrations_in_insertion_order() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.add(registration("First"));
        registry.add(registration("Second"));

        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
        let ids: Vec<&str> = registry.controllers().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["First", "Second"]);
    }
}
