//! Rebuilding a nested configuration from a flat source mapping.
//!
//! The walker visits every object node of the schema tree and resolves each
//! declared property with exactly one lookup:
//!
//! 1. the property's `x-sourceKey`, transformed, when declared;
//! 2. otherwise the composed key, `transform(prefix + "_" + property)`.
//!
//! A hit becomes the property's value as-is, even for object-typed
//! properties, so a single source entry can supply a whole subtree. On a miss,
//! object-typed properties are descended into with the composed key as the new
//! prefix; other properties stay `Value::Undefined`.
//!
//! With camel case and an empty prefix, `database.poolSize` is looked up as
//! `transform("_database")` = `database`, then `transform("database_poolSize")`
//! = `databasePoolSize`.

use indexmap::IndexMap;
use tracing::debug;

use crate::case::KeyTransform;
use crate::schema::SchemaNode;
use crate::source::SourceMap;
use crate::trace::{Lookup, ResolutionTrace, TraceBuilder};
use crate::value::Value;

/// Rebuild the nested value for `schema` from `data`.
///
/// Object nodes yield a `Value::Table` holding exactly the declared
/// properties, in declaration order. Leaf nodes yield `Value::Undefined`:
/// leaves are resolved by their parent, never by descending into them.
pub fn reconstruct(
    schema: &SchemaNode,
    data: &SourceMap,
    key_prefix: &str,
    transform: KeyTransform,
) -> Value {
    let mut walker = Reconstructor::new(data, transform);
    walker.walk(schema, key_prefix, "")
}

/// Outcome of a traced reconstruction.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub value: Value,
    pub trace: ResolutionTrace,
}

/// Schema walker over one normalized source mapping.
pub struct Reconstructor<'a> {
    data: &'a SourceMap,
    transform: KeyTransform,
    trace: TraceBuilder,
}

impl<'a> Reconstructor<'a> {
    pub fn new(data: &'a SourceMap, transform: KeyTransform) -> Self {
        Self {
            data,
            transform,
            trace: TraceBuilder::new(),
        }
    }

    /// Walk from the schema root, recording where every leaf came from.
    pub fn run(mut self, root: &SchemaNode) -> Reconstruction {
        let value = self.walk(root, "", "");
        Reconstruction {
            value,
            trace: self.trace.build(),
        }
    }

    fn walk(&mut self, node: &SchemaNode, key_prefix: &str, path: &str) -> Value {
        if !node.is_object() {
            return Value::Undefined;
        }

        let data = self.data;
        let mut table = IndexMap::with_capacity(node.properties().len());
        for (name, child) in node.properties() {
            let composed = (self.transform)(&format!("{}_{}", key_prefix, name));
            let child_path = join_path(path, name);

            let (key, lookup) = match child.source_key() {
                Some(source_key) => ((self.transform)(source_key), Lookup::Override),
                None => (composed.clone(), Lookup::Composed),
            };

            let value = match data.get(&key) {
                Some(found) => {
                    debug!(path = %child_path, key = %key, "resolved property");
                    self.trace
                        .record_hit(child_path.clone(), key, lookup, found.clone());
                    found.clone()
                }
                None if child.is_object() => self.walk(child, &composed, &child_path),
                None => {
                    debug!(path = %child_path, key = %key, "property not found in source");
                    self.trace.record_miss(child_path.clone(), key);
                    Value::Undefined
                }
            };

            table.insert(name.clone(), value);
        }

        Value::Table(table)
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}
