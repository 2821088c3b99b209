//! Error types for envschema.
//!
//! Three layers of failure are kept apart:
//!
//! - [`SchemaError`]: the schema could not be read or dereferenced. Fatal and
//!   returned as-is.
//! - [`ConfigError`]: one problem with the reconstructed configuration. All of
//!   them are collected into a [`ConfigErrors`] (a stillwater `NonEmptyVec`)
//!   rather than stopping at the first.
//! - [`LoadError`]: what the path-based entry points return, either of the two.

use std::fmt;

use stillwater::{NonEmptyVec, Semigroup, Validation};
use thiserror::Error;

/// Headline of every aggregate validation failure.
pub const INVALID_CONFIGURATION: &str = "Invalid configuration";

/// Failure to read or dereference a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema file not found: {path}")]
    NotFound { path: String },

    #[error("failed to read schema {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse schema {path}: {message}")]
    Parse { path: String, message: String },

    #[error("unsupported schema format for {path}: {message}")]
    UnsupportedFormat { path: String, message: String },

    #[error("unresolved $ref '{reference}' in {path}")]
    UnresolvedRef { reference: String, path: String },

    #[error("circular $ref '{reference}' in {path}")]
    CircularRef { reference: String, path: String },
}

/// One enriched schema violation.
///
/// `field` is the root label followed by the dotted instance path (for
/// `required`, the path of the object missing the property). `data` carries
/// the keyword parameters, e.g. `{"missingProperty": "uri"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub message: String,
    pub field: String,
    pub data: serde_json::Map<String, serde_json::Value>,
    /// `x-sourceKey` of the violating or missing property, when declared.
    pub source_key: Option<String>,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A single problem found while loading a configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The root schema is not `type: object`; no field-level detail exists.
    RootNotObject { found: String },

    /// The validation engine refused to compile the schema.
    InvalidSchema { message: String },

    /// A schema constraint failed on the reconstructed object.
    Violation(FieldError),

    /// The validated object does not fit the requested Rust type.
    Deserialize { target: String, message: String },
}

impl ConfigError {
    /// The `field` of a violation, if this is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ConfigError::Violation(e) => Some(&e.field),
            _ => None,
        }
    }

    /// The declared source key attached to a violation, if any.
    pub fn source_key(&self) -> Option<&str> {
        match self {
            ConfigError::Violation(e) => e.source_key.as_deref(),
            _ => None,
        }
    }

    pub fn as_field_error(&self) -> Option<&FieldError> {
        match self {
            ConfigError::Violation(e) => Some(e),
            _ => None,
        }
    }

    /// Check if this is a schema violation.
    pub fn is_violation(&self) -> bool {
        matches!(self, ConfigError::Violation(_))
    }

    /// Get a suggestion for fixing this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            ConfigError::Violation(FieldError {
                source_key: Some(key),
                ..
            }) => Some(format!("Set '{}' in the configuration source", key)),
            ConfigError::Violation(FieldError { data, field, .. }) => data
                .get("missingProperty")
                .and_then(|p| p.as_str())
                .map(|p| format!("Provide a value for '{}.{}'", field, p)),
            ConfigError::RootNotObject { .. } => {
                Some("Declare the root schema as 'type: object'".to_string())
            }
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::RootNotObject { found } => write!(
                f,
                "root schema must be of type 'object', found '{}'",
                found
            ),
            ConfigError::InvalidSchema { message } => write!(f, "invalid schema: {}", message),
            ConfigError::Violation(e) => write!(f, "{}", e),
            ConfigError::Deserialize { target, message } => {
                write!(f, "cannot deserialize configuration into {}: {}", target, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A non-empty collection of configuration errors.
///
/// Uses `NonEmptyVec` from stillwater to guarantee at least one error exists.
#[derive(Debug, Clone)]
pub struct ConfigErrors(pub NonEmptyVec<ConfigError>);

impl ConfigErrors {
    /// Create from a single error.
    pub fn single(error: ConfigError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Create from a non-empty vec.
    pub fn from_nonempty(errors: NonEmptyVec<ConfigError>) -> Self {
        Self(errors)
    }

    /// Try to create from a vec, returning None if empty.
    pub fn from_vec(errors: Vec<ConfigError>) -> Option<Self> {
        NonEmptyVec::from_vec(errors).map(Self)
    }

    /// Get the first error (always exists).
    pub fn first(&self) -> &ConfigError {
        self.0.head()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over errors.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

    /// The `{message, field, data}` entries, one per schema violation.
    pub fn field_errors(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter().filter_map(ConfigError::as_field_error)
    }

    /// Top-level message: the headline followed by every individual message.
    pub fn message(&self) -> String {
        let details: Vec<String> = self.iter().map(|e| e.to_string()).collect();
        format!("{}: {}", INVALID_CONFIGURATION, details.join("; "))
    }
}

impl Semigroup for ConfigErrors {
    fn combine(self, other: Self) -> Self {
        Self(self.0.combine(other.0))
    }
}

impl From<ConfigError> for ConfigErrors {
    fn from(error: ConfigError) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for ConfigErrors {
    type Item = ConfigError;
    type IntoIter = std::vec::IntoIter<ConfigError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ConfigErrors {}

/// The standard validation result type.
pub type ConfigValidation<T> = Validation<T, ConfigErrors>;

/// Extension trait for creating failing validations easily.
pub trait ConfigValidationExt<T> {
    /// Create a failing validation with a single error.
    fn fail_with(error: ConfigError) -> ConfigValidation<T>;
}

impl<T> ConfigValidationExt<T> for ConfigValidation<T> {
    fn fail_with(error: ConfigError) -> ConfigValidation<T> {
        Validation::Failure(ConfigErrors::single(error))
    }
}

/// Error returned by the entry points that resolve a schema by path.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Invalid(#[from] ConfigErrors),
}

impl LoadError {
    /// The validation errors, if loading got as far as validation.
    pub fn config_errors(&self) -> Option<&ConfigErrors> {
        match self {
            LoadError::Invalid(errors) => Some(errors),
            LoadError::Schema(_) => None,
        }
    }

    /// The schema resolution error, if loading stopped there.
    pub fn schema_error(&self) -> Option<&SchemaError> {
        match self {
            LoadError::Schema(e) => Some(e),
            LoadError::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn violation(field: &str, message: &str, source_key: Option<&str>) -> ConfigError {
        let mut data = serde_json::Map::new();
        data.insert("missingProperty".to_string(), json!("uri"));
        ConfigError::Violation(FieldError {
            message: message.to_string(),
            field: field.to_string(),
            data,
            source_key: source_key.map(str::to_string),
        })
    }

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::NotFound {
            path: "schema.yaml".to_string(),
        };
        assert_eq!(err.to_string(), "schema file not found: schema.yaml");

        let err = SchemaError::CircularRef {
            reference: "#/definitions/node".to_string(),
            path: "schema.yaml".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "circular $ref '#/definitions/node' in schema.yaml"
        );
    }

    #[test]
    fn test_config_error_field_and_source_key() {
        let err = violation("config.foobar", "config.foobar missing", Some("FOOBAR_URI"));
        assert_eq!(err.field(), Some("config.foobar"));
        assert_eq!(err.source_key(), Some("FOOBAR_URI"));
        assert!(err.is_violation());

        let err = ConfigError::RootNotObject {
            found: "array".to_string(),
        };
        assert_eq!(err.field(), None);
        assert!(!err.is_violation());
    }

    #[test]
    fn test_suggestions() {
        let err = violation("config.foobar", "m", Some("legacyUri"));
        assert_eq!(
            err.suggestion(),
            Some("Set 'legacyUri' in the configuration source".to_string())
        );

        let err = violation("config.foobar", "m", None);
        assert_eq!(
            err.suggestion(),
            Some("Provide a value for 'config.foobar.uri'".to_string())
        );
    }

    #[test]
    fn test_config_errors_message_joins_all() {
        let errors = ConfigErrors::from_vec(vec![
            violation("config.foobar", "config.foobar first", None),
            violation("config.foobar", "config.foobar second", None),
        ])
        .unwrap();

        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.message(),
            "Invalid configuration: config.foobar first; config.foobar second"
        );
        assert_eq!(errors.to_string(), errors.message());
    }

    #[test]
    fn test_root_error_has_no_field_errors() {
        let errors = ConfigErrors::single(ConfigError::RootNotObject {
            found: "array".to_string(),
        });
        assert_eq!(errors.field_errors().count(), 0);
        assert!(errors.message().starts_with(INVALID_CONFIGURATION));
    }

    #[test]
    fn test_config_errors_combine() {
        let e1 = ConfigErrors::single(violation("config", "a", None));
        let e2 = ConfigErrors::single(ConfigError::InvalidSchema {
            message: "bad".to_string(),
        });
        let combined = e1.combine(e2);
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.field_errors().count(), 1);
    }

    #[test]
    fn test_config_validation_fail_with() {
        let result: ConfigValidation<i32> = ConfigValidation::fail_with(ConfigError::RootNotObject {
            found: "string".to_string(),
        });
        assert!(result.is_failure());
    }

    #[test]
    fn test_load_error_is_transparent() {
        let schema_err = SchemaError::NotFound {
            path: "missing.yaml".to_string(),
        };
        let err = LoadError::from(schema_err.clone());
        assert_eq!(err.to_string(), schema_err.to_string());
        assert_eq!(err.schema_error(), Some(&schema_err));
        assert!(err.config_errors().is_none());
    }
}
