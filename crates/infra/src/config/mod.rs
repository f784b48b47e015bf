//! Configuration loading: file fallback, environment overrides.

pub mod loader;

pub use loader::{load, load_from_file, parse_users};
