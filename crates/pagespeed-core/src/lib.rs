//! Shared domain types and run configuration for the pagespeed workspace.

pub mod config;
pub mod csv;
mod device;
mod error;
mod url_spec;

pub use config::{load_run_config, parse_run_config, FieldRevision, RunConfig};
pub use device::DeviceType;
pub use error::ConfigError;
pub use url_spec::{load_url_specs, parse_url_specs, UrlSpec};
