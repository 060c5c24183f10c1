use thiserror::Error;

pub type Result<T> = std::result::Result<T, GantryError>;

#[derive(Debug, Error)]
pub enum GantryError {
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Controller construction failed for '{id}': {message}")]
    ControllerConstruction { id: String, message: String },

    #[error("Unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("Router not built: {message}")]
    NotBuilt { message: String },

    #[error("Listener error: {0}")]
    Listener(#[from] std::io::Error),
}
