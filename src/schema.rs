//! Schema node tree.
//!
//! A dereferenced JSON Schema document is read into a tree of [`SchemaNode`]s
//! that only keeps what reconstruction needs: whether a node is an object,
//! its declared properties in declaration order, and the `x-sourceKey`
//! override. The full document is kept next to the tree for the validation
//! engine.

use crate::case::{KeyTransform, SourceFormat};

/// Root-level keyword carrying the case format hint.
pub const SOURCE_FORMAT_KEYWORD: &str = "x-sourceFormat";

/// Per-property keyword carrying an explicit source key.
pub const SOURCE_KEY_KEYWORD: &str = "x-sourceKey";

/// Discriminates object nodes, which reconstruction descends into, from leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `type: object`, with properties in declaration order
    Object { properties: Vec<(String, SchemaNode)> },
    /// Any other type, or no type at all
    Leaf,
}

/// A read-only node of the schema tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    kind: NodeKind,
    source_key: Option<String>,
}

impl SchemaNode {
    /// Read a node (and its subtree) from a JSON Schema value.
    ///
    /// Only an exact `"type": "object"` makes an object node.
    pub fn from_json(schema: &serde_json::Value) -> Self {
        let source_key = schema
            .get(SOURCE_KEY_KEYWORD)
            .and_then(|v| v.as_str())
            .map(str::to_string);

        let is_object = schema.get("type").and_then(|t| t.as_str()) == Some("object");
        let kind = if is_object {
            let properties = schema
                .get("properties")
                .and_then(|p| p.as_object())
                .map(|props| {
                    props
                        .iter()
                        .map(|(name, child)| (name.clone(), SchemaNode::from_json(child)))
                        .collect()
                })
                .unwrap_or_default();
            NodeKind::Object { properties }
        } else {
            NodeKind::Leaf
        };

        Self { kind, source_key }
    }

    /// Build an object node directly.
    pub fn object(properties: Vec<(String, SchemaNode)>) -> Self {
        Self {
            kind: NodeKind::Object { properties },
            source_key: None,
        }
    }

    /// Build a leaf node directly.
    pub fn leaf() -> Self {
        Self {
            kind: NodeKind::Leaf,
            source_key: None,
        }
    }

    /// Attach an explicit source key.
    pub fn with_source_key(mut self, key: impl Into<String>) -> Self {
        self.source_key = Some(key.into());
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, NodeKind::Object { .. })
    }

    /// The declared `x-sourceKey`, if any.
    pub fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    /// Declared properties; empty for leaves.
    pub fn properties(&self) -> &[(String, SchemaNode)] {
        match &self.kind {
            NodeKind::Object { properties } => properties,
            NodeKind::Leaf => &[],
        }
    }

    /// Look up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        self.properties()
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    /// Follow a property path down the tree.
    pub fn descend<'a, I>(&self, path: I) -> Option<&SchemaNode>
    where
        I: IntoIterator<Item = &'a str>,
    {
        path.into_iter()
            .try_fold(self, |node, segment| node.property(segment))
    }
}

/// A fully dereferenced schema: the raw document plus its node tree.
#[derive(Debug, Clone)]
pub struct Schema {
    document: serde_json::Value,
    root: SchemaNode,
}

impl Schema {
    /// Wrap an already dereferenced document.
    ///
    /// Any `$ref` left in the document is not followed here; use
    /// [`crate::resolve::dereference_value`] for documents that still carry
    /// references.
    pub fn from_value(document: serde_json::Value) -> Self {
        let root = SchemaNode::from_json(&document);
        Self { document, root }
    }

    /// The raw schema document, as handed to the validation engine.
    pub fn document(&self) -> &serde_json::Value {
        &self.document
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// The root's `x-sourceFormat` hint, if present.
    pub fn source_format_hint(&self) -> Option<&str> {
        self.document
            .get(SOURCE_FORMAT_KEYWORD)
            .and_then(|v| v.as_str())
    }

    /// The effective source format (camel case when absent or unknown).
    pub fn source_format(&self) -> SourceFormat {
        SourceFormat::from_hint(self.source_format_hint())
    }

    /// The key transform selected by the root's format hint.
    pub fn transform(&self) -> KeyTransform {
        self.source_format().transform()
    }

    /// The root's declared `type`, rendered for diagnostics.
    pub fn root_type(&self) -> String {
        match self.document.get("type") {
            Some(serde_json::Value::String(t)) => t.clone(),
            Some(other) => other.to_string(),
            None => "(none)".to_string(),
        }
    }
}
