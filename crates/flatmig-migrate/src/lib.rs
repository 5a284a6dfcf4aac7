//! Versioned state migration
//!
//! Upgrades flattened resource state written by an older schema so it can
//! be read by the current one.
//!
//! # Core Concepts
//!
//! - [`MigrationRegistry`]: routes stored state to the step for its version
//! - [`MigrationStep`]: one `v → v+1` transform with its input schema
//! - [`convert_set_to_list`]: re-encodes a hash-keyed set field as a list
//! - [`InstanceState`]: attributes plus their schema version marker
//! - [`cloudfront`]: the `aws_cloudfront_distribution` steps
//!
//! # Example
//!
//! ```rust
//! use flatmig_flatmap::AttributeMap;
//! use flatmig_migrate::{cloudfront, MigrationError};
//!
//! let registry = cloudfront::distribution_migrations();
//! assert!(registry.migrate(0, &AttributeMap::new())?.is_empty());
//!
//! let stored: AttributeMap = [("comment", "edge")].into_iter().collect();
//! assert_eq!(
//!     registry.migrate(3, &stored),
//!     Err(MigrationError::UnsupportedVersion { version: 3 })
//! );
//! # Ok::<(), MigrationError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cloudfront;
mod config;
mod convert;
mod error;
mod registry;
mod state;

pub use config::{ConfigError, MigrationConfig};
pub use convert::convert_set_to_list;
pub use error::{MigrationError, MigrationResult};
pub use registry::{MigrationRegistry, MigrationStep, StepFn};
pub use state::InstanceState;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
