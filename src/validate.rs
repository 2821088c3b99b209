//! Schema validation of the reconstructed configuration.
//!
//! Validation runs on the `jsonschema` engine with every error collected
//! (`iter_errors`, never fail-fast). Each engine error is turned into a
//! [`Violation`] and enriched into a [`ConfigError::Violation`].

use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;
use stillwater::Validation;
use tracing::warn;

use crate::config::LoadOptions;
use crate::enrich::{enrich_all, Violation};
use crate::error::{ConfigError, ConfigValidation, ConfigValidationExt};
use crate::schema::Schema;

/// Validate `instance` against the dereferenced schema.
///
/// `instance` is expected to be coerced and defaulted already.
pub fn validate(
    schema: &Schema,
    instance: &serde_json::Value,
    options: &LoadOptions,
) -> ConfigValidation<()> {
    let validator = match jsonschema::options()
        .should_validate_formats(options.validate_formats)
        .build(schema.document())
    {
        Ok(validator) => validator,
        Err(e) => {
            warn!(error = %e, "schema rejected by the validation engine");
            return ConfigValidation::fail_with(ConfigError::InvalidSchema {
                message: e.to_string(),
            });
        }
    };

    let violations: Vec<Violation> = validator
        .iter_errors(instance)
        .map(|e| violation(&e, schema.document()))
        .collect();

    match enrich_all(&violations, schema.root(), &options.root_label) {
        Some(errors) => {
            warn!(count = errors.len(), "configuration failed validation");
            Validation::Failure(errors)
        }
        None => Validation::Success(()),
    }
}

/// Convert one engine error.
///
/// The keyword is the last segment of the schema path. `required` carries the
/// missing property; every other keyword carries its value in the schema.
pub fn violation(error: &ValidationError<'_>, document: &serde_json::Value) -> Violation {
    let schema_path = error.schema_path.to_string();
    let keyword = schema_path
        .rsplit('/')
        .next()
        .map(unescape)
        .unwrap_or_default();

    let mut params = serde_json::Map::new();
    match &error.kind {
        ValidationErrorKind::Required { property } => {
            params.insert("missingProperty".to_string(), property.clone());
        }
        _ => {
            if let Some(value) = document.pointer(&schema_path) {
                params.insert(keyword.clone(), value.clone());
            }
        }
    }

    Violation {
        instance_path: pointer_segments(&error.instance_path.to_string()),
        keyword,
        message: error.to_string(),
        params,
    }
}

/// Split a JSON pointer into unescaped segments.
pub fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(unescape)
        .collect()
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
