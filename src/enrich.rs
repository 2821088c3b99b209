//! Turning raw engine violations into operator-facing field errors.
//!
//! The schema name of a property is rarely the variable an operator has to
//! set, so every violation whose property declares an `x-sourceKey` gets it
//! appended to the message. For `required` violations the engine reports the
//! parent object; the key is looked up on the missing property itself.

use crate::error::{ConfigErrors, ConfigError, FieldError};
use crate::schema::SchemaNode;

/// A violation as reported by the validation engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Instance path segments of the violating value
    pub instance_path: Vec<String>,
    /// The failing keyword (`required`, `type`, `format`, ...)
    pub keyword: String,
    /// Engine message, without any path
    pub message: String,
    /// Keyword parameters, e.g. `missingProperty`
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Violation {
    /// The missing property of a `required` violation.
    pub fn missing_property(&self) -> Option<&str> {
        if self.keyword != "required" {
            return None;
        }
        self.params.get("missingProperty").and_then(|p| p.as_str())
    }
}

/// Enrich one violation against the schema tree.
///
/// The violation is not modified; a new `FieldError` is built.
pub fn enrich(violation: &Violation, schema: &SchemaNode, root_label: &str) -> FieldError {
    let node = schema.descend(violation.instance_path.iter().map(String::as_str));
    let source_key = match violation.missing_property() {
        Some(missing) => node.and_then(|n| n.property(missing)),
        None => node,
    }
    .and_then(SchemaNode::source_key)
    .map(str::to_string);

    let field = field_path(root_label, &violation.instance_path);
    let mut message = format!("{} {}", field, violation.message);
    if let Some(key) = &source_key {
        message.push_str(&format!(" with source key: \"{}\"", key));
    }

    FieldError {
        message,
        field,
        data: violation.params.clone(),
        source_key,
    }
}

/// Enrich every violation; `None` when there are none.
pub fn enrich_all<'v, I>(violations: I, schema: &SchemaNode, root_label: &str) -> Option<ConfigErrors>
where
    I: IntoIterator<Item = &'v Violation>,
{
    let errors = violations
        .into_iter()
        .map(|v| ConfigError::Violation(enrich(v, schema, root_label)))
        .collect();
    ConfigErrors::from_vec(errors)
}

/// `config` + dotted instance path.
pub fn field_path(root_label: &str, segments: &[String]) -> String {
    segments.iter().fold(root_label.to_string(), |mut field, segment| {
        field.push('.');
        field.push_str(segment);
        field
    })
}
