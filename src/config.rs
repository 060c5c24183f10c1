use serde::Deserialize;
use std::env;

/// Plugin configuration supplied by the hosting application.
///
/// Bound into the [`Container`](crate::di::Container) before the build phase
/// and treated as read-only afterwards.
///
/// # Example
/// ```
/// use gantry::config::GantryConfig;
///
/// let config = GantryConfig {
///     root_path: "/api".to_string(),
///     port: 8080,
///     ..GantryConfig::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GantryConfig {
    /// Path prefix every controller is mounted under.
    pub root_path: String,

    /// Port the TCP listener binds to.
    pub port: u16,

    /// Hostname the TCP listener binds to.
    pub hostname: String,
}

impl Default for GantryConfig {
    fn default() -> Self {
        Self {
            root_path: "/".to_string(),
            port: 3000,
            hostname: "localhost".to_string(),
        }
    }
}

impl GantryConfig {
    /// Build a configuration from `GANTRY_ROOT_PATH`, `GANTRY_PORT` and
    /// `GANTRY_HOSTNAME`, falling back to the defaults for anything unset
    /// or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            root_path: env::var("GANTRY_ROOT_PATH").unwrap_or(defaults.root_path),
            port: env::var("GANTRY_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            hostname: env::var("GANTRY_HOSTNAME").unwrap_or(defaults.hostname),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GantryConfig::default();
        assert_eq!(config.root_path, "/");
        assert_eq!(config.port, 3000);
        assert_eq!(config.hostname, "localhost");
    }

    #[test]
    fn deserializes_partial_config() {
        let config: GantryConfig = serde_json::from_str(r#"{"port": 8080}"#).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.root_path, "/");
    }
}
