//! Resolution tracing for debugging configuration issues.
//!
//! When a property comes out wrong, the first question is which source key
//! fed it. A traced load records, for every leaf the walker resolved, the
//! normalized key it matched and whether that key came from an `x-sourceKey`
//! override or was composed from the property path. Leaves nothing matched are
//! recorded with the key that was searched.
//!
//! # Usage
//!
//! ```ignore
//! use envschema::Loader;
//!
//! let traced = Loader::new().load_traced_by_schema::<AppConfig, _, _, _>(&schema, vars)?;
//!
//! if let Some(resolution) = traced.trace().get("database.poolSize") {
//!     println!("from {} ({})", resolution.key, resolution.lookup);
//! }
//!
//! println!("{}", traced.trace().report());
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::config::Config;
use crate::value::Value;

/// How a property's lookup key was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The property's `x-sourceKey`
    Override,
    /// `prefix_property`, transformed
    Composed,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Override => f.write_str("source key"),
            Lookup::Composed => f.write_str("composed key"),
        }
    }
}

/// Where one resolved property came from.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyResolution {
    /// Normalized source key that matched
    pub key: String,
    pub lookup: Lookup,
    /// Raw value before coercion
    pub value: Value,
}

/// Per-path record of one reconstruction.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTrace {
    resolved: BTreeMap<String, KeyResolution>,
    unresolved: BTreeMap<String, String>,
}

impl ResolutionTrace {
    /// Resolution of a dotted property path, if the source supplied it.
    pub fn get(&self, path: &str) -> Option<&KeyResolution> {
        self.resolved.get(path)
    }

    /// The key searched for a path nothing matched.
    pub fn searched_key(&self, path: &str) -> Option<&str> {
        self.unresolved.get(path).map(String::as_str)
    }

    /// Paths resolved through an `x-sourceKey` override.
    pub fn overridden_paths(&self) -> impl Iterator<Item = &str> {
        self.resolved
            .iter()
            .filter(|(_, r)| r.lookup == Lookup::Override)
            .map(|(k, _)| k.as_str())
    }

    pub fn resolved_paths(&self) -> impl Iterator<Item = &str> {
        self.resolved.keys().map(String::as_str)
    }

    pub fn unresolved_paths(&self) -> impl Iterator<Item = &str> {
        self.unresolved.keys().map(String::as_str)
    }

    /// Generate a human-readable trace report.
    pub fn report(&self) -> String {
        let mut report = String::new();

        for (path, resolution) in &self.resolved {
            report.push_str(&format!(
                "{} = {:?}\n  ✓ [{}] via {}\n",
                path, resolution.value, resolution.key, resolution.lookup
            ));
        }
        for (path, key) in &self.unresolved {
            report.push_str(&format!("{} (unset)\n  ○ searched [{}]\n", path, key));
        }

        report
    }
}

/// Configuration with resolution trace.
#[derive(Debug)]
pub struct TracedConfig<T> {
    config: Config<T>,
    trace: ResolutionTrace,
}

impl<T> TracedConfig<T> {
    pub fn new(config: Config<T>, trace: ResolutionTrace) -> Self {
        Self { config, trace }
    }

    /// Get reference to the configuration.
    pub fn value(&self) -> &T {
        self.config.get()
    }

    pub fn trace(&self) -> &ResolutionTrace {
        &self.trace
    }

    /// Consume and return the configuration value.
    pub fn into_inner(self) -> T {
        self.config.into_inner()
    }

    /// Consume and return the inner Config.
    pub fn into_config(self) -> Config<T> {
        self.config
    }
}

impl<T> std::ops::Deref for TracedConfig<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.config.get()
    }
}

/// Collects trace data while the schema is walked.
#[derive(Debug, Default)]
pub struct TraceBuilder {
    resolved: BTreeMap<String, KeyResolution>,
    unresolved: BTreeMap<String, String>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a property the source supplied.
    pub fn record_hit(&mut self, path: String, key: String, lookup: Lookup, value: Value) {
        self.resolved
            .insert(path, KeyResolution { key, lookup, value });
    }

    /// Record a leaf nothing matched.
    pub fn record_miss(&mut self, path: String, key: String) {
        self.unresolved.insert(path, key);
    }

    pub fn build(self) -> ResolutionTrace {
        ResolutionTrace {
            resolved: self.resolved,
            unresolved: self.unresolved,
        }
    }
}
