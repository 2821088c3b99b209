//! Convenient re-exports for common envschema usage.
//!
//! ```ignore
//! use envschema::prelude::*;
//! ```

// ============================================================================
// Stillwater re-exports
// ============================================================================

/// Result type with error accumulation, returned by the validation step.
pub use stillwater::Validation;

/// Trait for combining values. `ConfigErrors` implements this for error accumulation.
pub use stillwater::Semigroup;

/// Guaranteed non-empty collection. Underlying type for `ConfigErrors`.
pub use stillwater::NonEmptyVec;

// ============================================================================
// Error types
// ============================================================================

pub use crate::error::ConfigError;

/// Non-empty collection of errors. Implements `Semigroup` for accumulation.
pub use crate::error::ConfigErrors;

/// Type alias: `Validation<T, ConfigErrors>`.
pub use crate::error::ConfigValidation;

pub use crate::error::ConfigValidationExt;

/// One enriched schema violation: `{message, field, data}`.
pub use crate::error::FieldError;

/// Error of the path-based entry points.
pub use crate::error::LoadError;

pub use crate::error::SchemaError;

// ============================================================================
// Loading
// ============================================================================

/// Validated configuration wrapper; derefs to the target type.
pub use crate::config::Config;

pub use crate::config::{load, load_by_schema, load_from_environment, LoadOptions, Loader};

/// A dereferenced schema.
pub use crate::schema::Schema;

pub use crate::resolve::{dereference, dereference_value};

// ============================================================================
// Environment abstractions
// ============================================================================

/// Trait for abstracting I/O operations. Enables testable configuration loading.
pub use crate::env::ConfigEnv;

pub use crate::env::{MockEnv, RealEnv};

// ============================================================================
// Values and tracing
// ============================================================================

/// Raw source value.
pub use crate::value::Value;

/// Configuration with its resolution trace.
pub use crate::trace::TracedConfig;

// ============================================================================
// Pretty printing
// ============================================================================

pub use crate::pretty::{ColorOption, PrettyPrintOptions, ValidationExt};
