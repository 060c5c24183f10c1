mod container;
mod registry;

pub use container::Container;
pub use registry::Registry;
