//! Shared utilities: filesystem wrappers, name sanitization, version gates.

pub mod files;
pub mod sanitize;
pub mod version;

pub use sanitize::sanitize_name;
pub use version::supports_graphql;
