// Allow large error types - detailed config errors are expected
#![allow(clippy::result_large_err)]

//! Envschema: nested, typed configuration from flat environment variables.
//!
//! An application declares the shape of its configuration once, as a JSON
//! Schema, and receives a validated, type-coerced object instead of parsing
//! dozens of environment variables by hand.
//!
//! # Core Concepts
//!
//! - **Schema-driven reconstruction**: `DATABASE_POOL_SIZE`, `database-pool-size`
//!   and `databasePoolSize` all land in `database.poolSize`
//! - **Source key overrides**: `x-sourceKey` keeps legacy variable names working
//! - **Error Accumulation**: every violation is reported, not just the first one
//! - **Testable I/O**: schema files and the environment go through `ConfigEnv`
//!
//! # Quick Start
//!
//! ```ignore
//! use envschema::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Database {
//!     pool_size: u32,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct AppConfig {
//!     database: Database,
//! }
//!
//! fn main() -> Result<(), LoadError> {
//!     // schema.yaml:
//!     //   type: object
//!     //   properties:
//!     //     database:
//!     //       type: object
//!     //       properties:
//!     //         poolSize: { type: integer, default: 5 }
//!     let config: Config<AppConfig> = load_from_environment("schema.yaml")?;
//!
//!     println!("pool size {}", config.database.pool_size);
//!     Ok(())
//! }
//! ```
//!
//! # Schema Extensions
//!
//! | Keyword | Where | Meaning |
//! |---------|-------|---------|
//! | `x-sourceFormat` | root | `camel-case` (default), `snake-case` or `kebab-case` |
//! | `x-sourceKey` | any property | look the property up under this key instead |
//!
//! # Architecture
//!
//! The pipeline follows the "pure core, imperative shell" pattern:
//!
//! - **Imperative Shell**: [`resolve`] reads and dereferences schema files and
//!   [`config`] snapshots the environment, both through [`ConfigEnv`]
//! - **Pure Core**: [`source`] normalization, [`reconstruct`]ion,
//!   [`coerce`]ion, [`validate`] and [`enrich`] never touch I/O
//!
//! # Module Structure
//!
//! - [`prelude`]: Convenient re-exports for common usage
//! - [`config`]: `Config`, `Loader`, `LoadOptions` and the entry points
//! - [`error`]: Error types (`SchemaError`, `ConfigError`, `ConfigErrors`, `LoadError`)
//! - [`case`]: Case transforms selected by `x-sourceFormat`
//! - [`schema`]: `Schema` and the `SchemaNode` tree
//! - [`trace`]: Which source key supplied which property
//! - [`mod@env`]: `ConfigEnv` trait and `MockEnv` for testing
//!
//! # Stillwater Integration
//!
//! | Type | Usage |
//! |------|-------|
//! | `Validation<T, E>` | Result of the validation step |
//! | `NonEmptyVec<T>` | Guaranteed non-empty error lists |
//! | `Semigroup` | Combining error lists |

pub mod case;
pub mod coerce;
pub mod config;
pub mod enrich;
pub mod env;
pub mod error;
pub mod prelude;
pub mod pretty;
pub mod reconstruct;
pub mod resolve;
pub mod schema;
pub mod source;
pub mod trace;
pub mod validate;
pub mod value;

// Re-exports for convenience
pub use case::{select_transform, KeyTransform, SourceFormat};
pub use config::{load, load_by_schema, load_from_environment, Config, LoadOptions, Loader};
pub use enrich::Violation;
pub use env::{ConfigEnv, MockEnv, RealEnv};
pub use error::{
    ConfigError, ConfigErrors, ConfigValidation, ConfigValidationExt, FieldError, LoadError,
    SchemaError,
};
pub use pretty::{ColorOption, PrettyPrintOptions, ValidationExt};
pub use reconstruct::{reconstruct, Reconstruction, Reconstructor};
pub use resolve::{dereference, dereference_value};
pub use schema::{NodeKind, Schema, SchemaNode};
pub use source::SourceMap;
pub use trace::{KeyResolution, Lookup, ResolutionTrace, TracedConfig};
pub use value::Value;

// Re-export stillwater types that are commonly used
pub use stillwater::{NonEmptyVec, Semigroup, Validation};
