//! Schema loading and `$ref` dereferencing.
//!
//! Schema documents are read through [`ConfigEnv`] (JSON, or YAML with the
//! `yaml` feature) and every `$ref` is inlined before the schema reaches the
//! reconstruction core, which never follows references itself.
//!
//! Supported references:
//!
//! - local pointers: `#/definitions/redisUri`
//! - relative files, optionally with a pointer: `common.yaml#/definitions/uri`
//!
//! Keywords next to a `$ref` are merged over the resolved target, so a
//! property can reuse a shared definition and still declare its own
//! `x-sourceKey`. Remote references and reference cycles are errors.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{ConfigEnv, RealEnv};
use crate::error::SchemaError;
use crate::schema::Schema;

/// Which document a node came from; `None` is an in-memory root.
type DocKey = Option<PathBuf>;

/// Load a schema file and dereference it.
pub fn dereference(path: impl AsRef<Path>, env: &dyn ConfigEnv) -> Result<Schema, SchemaError> {
    let path = path.as_ref();
    info!("resolving schema from {}", path.display());
    let document = SchemaResolver::new(env).resolve_file(path)?;
    Ok(Schema::from_value(document))
}

/// Dereference an in-memory schema document.
///
/// Relative file references are read from the real file system, relative to
/// the working directory.
pub fn dereference_value(document: serde_json::Value) -> Result<Schema, SchemaError> {
    let document = SchemaResolver::new(&RealEnv).resolve_value(document)?;
    Ok(Schema::from_value(document))
}

/// Resolves `$ref`s, caching every document it reads.
pub struct SchemaResolver<'a> {
    env: &'a dyn ConfigEnv,
    documents: HashMap<DocKey, serde_json::Value>,
}

impl<'a> SchemaResolver<'a> {
    pub fn new(env: &'a dyn ConfigEnv) -> Self {
        Self {
            env,
            documents: HashMap::new(),
        }
    }

    /// Read a schema file and return it with every reference inlined.
    pub fn resolve_file(&mut self, path: &Path) -> Result<serde_json::Value, SchemaError> {
        let key = Some(path.to_path_buf());
        self.load(path)?;
        self.resolve_root(key)
    }

    /// Inline every reference of an in-memory document.
    pub fn resolve_value(
        &mut self,
        document: serde_json::Value,
    ) -> Result<serde_json::Value, SchemaError> {
        self.documents.insert(None, document);
        self.resolve_root(None)
    }

    fn resolve_root(&mut self, key: DocKey) -> Result<serde_json::Value, SchemaError> {
        let root = self.document(&key)?.clone();
        let mut stack = vec![(key.clone(), String::new())];
        self.expand(&root, &key, &mut stack)
    }

    fn document(&self, key: &DocKey) -> Result<&serde_json::Value, SchemaError> {
        self.documents
            .get(key)
            .ok_or_else(|| SchemaError::NotFound {
                path: display_key(key),
            })
    }

    fn expand(
        &mut self,
        node: &serde_json::Value,
        doc: &DocKey,
        stack: &mut Vec<(DocKey, String)>,
    ) -> Result<serde_json::Value, SchemaError> {
        match node {
            serde_json::Value::Object(map) => {
                if let Some(serde_json::Value::String(reference)) = map.get("$ref") {
                    let mut resolved = self.follow(reference, doc, stack)?;
                    if let serde_json::Value::Object(target) = &mut resolved {
                        for (key, value) in map.iter().filter(|(k, _)| k.as_str() != "$ref") {
                            target.insert(key.clone(), self.expand(value, doc, stack)?);
                        }
                    }
                    return Ok(resolved);
                }

                let mut expanded = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    expanded.insert(key.clone(), self.expand(value, doc, stack)?);
                }
                Ok(serde_json::Value::Object(expanded))
            }
            serde_json::Value::Array(items) => items
                .iter()
                .map(|item| self.expand(item, doc, stack))
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn follow(
        &mut self,
        reference: &str,
        doc: &DocKey,
        stack: &mut Vec<(DocKey, String)>,
    ) -> Result<serde_json::Value, SchemaError> {
        let unresolved = || SchemaError::UnresolvedRef {
            reference: reference.to_string(),
            path: display_key(doc),
        };

        let (file_part, fragment) = reference.split_once('#').unwrap_or((reference, ""));
        if file_part.contains("://") {
            return Err(unresolved());
        }
        if !fragment.is_empty() && !fragment.starts_with('/') {
            return Err(unresolved());
        }

        let target_doc = if file_part.is_empty() {
            doc.clone()
        } else {
            let base = doc
                .as_deref()
                .and_then(Path::parent)
                .unwrap_or_else(|| Path::new(""));
            let path = base.join(file_part);
            if !self.documents.contains_key(&Some(path.clone())) {
                self.load(&path)?;
            }
            Some(path)
        };

        let frame = (target_doc.clone(), fragment.to_string());
        if stack.contains(&frame) {
            return Err(SchemaError::CircularRef {
                reference: reference.to_string(),
                path: display_key(doc),
            });
        }

        let target = self
            .document(&target_doc)?
            .pointer(fragment)
            .cloned()
            .ok_or_else(unresolved)?;

        debug!(reference, "following schema reference");
        stack.push(frame);
        let resolved = self.expand(&target, &target_doc, stack);
        stack.pop();
        resolved
    }

    fn load(&mut self, path: &Path) -> Result<(), SchemaError> {
        let shown = path.display().to_string();
        let content = self.env.read_file(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SchemaError::NotFound {
                path: shown.clone(),
            },
            _ => SchemaError::Io {
                path: shown.clone(),
                message: e.to_string(),
            },
        })?;

        let document = parse_document(path, &content)?;
        debug!(path = %shown, "loaded schema document");
        self.documents.insert(Some(path.to_path_buf()), document);
        Ok(())
    }
}

/// Parse a schema document, picking the format from the file extension.
fn parse_document(path: &Path, content: &str) -> Result<serde_json::Value, SchemaError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("yaml") | Some("yml") => parse_yaml(path, content),
        _ => serde_json::from_str(content).map_err(|e| SchemaError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}

#[cfg(feature = "yaml")]
fn parse_yaml(path: &Path, content: &str) -> Result<serde_json::Value, SchemaError> {
    serde_yaml::from_str(content).map_err(|e| SchemaError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(not(feature = "yaml"))]
fn parse_yaml(path: &Path, _content: &str) -> Result<serde_json::Value, SchemaError> {
    Err(SchemaError::UnsupportedFormat {
        path: path.display().to_string(),
        message: "YAML schemas require the `yaml` feature".to_string(),
    })
}

fn display_key(key: &DocKey) -> String {
    key.as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(inline schema)".to_string())
}
