//! Config type, load options and the loading entry points.
//!
//! Every entry point ends up in the same pipeline:
//!
//! 1. reject schemas whose root is not `type: object`;
//! 2. normalize the flat source with the schema's case transform;
//! 3. rebuild the nested object by walking the schema;
//! 4. coerce types and fill defaults;
//! 5. validate, collecting every violation;
//! 6. deserialize into the requested type.
//!
//! Steps 1-5 never stop at the first problem they can report alongside others,
//! and nothing is returned unless every step succeeded.

use std::any::type_name;
use std::path::Path;

use serde::de::DeserializeOwned;
use stillwater::Validation;
use tracing::{debug, info};

use crate::coerce;
use crate::env::{ConfigEnv, RealEnv};
use crate::error::{ConfigError, ConfigErrors, LoadError};
use crate::reconstruct::Reconstructor;
use crate::resolve::dereference;
use crate::schema::Schema;
use crate::source::SourceMap;
use crate::trace::{ResolutionTrace, TracedConfig};
use crate::validate::validate;
use crate::value::Value;

/// Wrapper around a validated configuration value.
///
/// This type ensures that the configuration has been reconstructed, coerced
/// and validated. It implements `Deref` to provide transparent access to the
/// inner type.
#[derive(Debug, Clone)]
pub struct Config<T> {
    inner: T,
}

impl<T> Config<T> {
    /// Create a new Config wrapping an already-validated value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Get a reference to the inner configuration value.
    pub fn get(&self) -> &T {
        &self.inner
    }

    /// Consume this Config and return the inner value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> std::ops::Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> AsRef<T> for Config<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}

/// Knobs of the coercion and validation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Coerce primitives towards the declared `type` (`"9"` to `9`)
    pub coerce_types: bool,
    /// Fill absent properties from the schema's `default`
    pub use_defaults: bool,
    /// Enforce `format` (`uri`, `email`, ...)
    pub validate_formats: bool,
    /// Prefix of every error `field`
    pub root_label: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            coerce_types: true,
            use_defaults: true,
            validate_formats: true,
            root_label: "config".to_string(),
        }
    }
}

impl LoadOptions {
    pub fn coerce_types(mut self, enabled: bool) -> Self {
        self.coerce_types = enabled;
        self
    }

    pub fn use_defaults(mut self, enabled: bool) -> Self {
        self.use_defaults = enabled;
        self
    }

    pub fn validate_formats(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self
    }

    pub fn root_label(mut self, label: impl Into<String>) -> Self {
        self.root_label = label.into();
        self
    }
}

/// Loads configuration through a JSON Schema.
///
/// # Example
///
/// ```ignore
/// use envschema::{Loader, LoadOptions};
///
/// let config: Config<AppConfig> = Loader::new()
///     .with_options(LoadOptions::default().root_label("data"))
///     .load("schema.yaml", [("DATABASE_POOL_SIZE", "9")])?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    /// Create a loader with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the options.
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Resolve the schema at `schema_path` and load `data` through it.
    pub fn load<T, I, K, V>(&self, schema_path: impl AsRef<Path>, data: I) -> Result<Config<T>, LoadError>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.load_with_env(schema_path, data, &RealEnv::new())
    }

    /// Like [`Loader::load`], reading schema files through `env`.
    pub fn load_with_env<T, I, K, V>(
        &self,
        schema_path: impl AsRef<Path>,
        data: I,
        env: &dyn ConfigEnv,
    ) -> Result<Config<T>, LoadError>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let schema = dereference(schema_path, env)?;
        Ok(self.load_by_schema(&schema, data)?)
    }

    /// Load `data` through an already dereferenced schema.
    pub fn load_by_schema<T, I, K, V>(&self, schema: &Schema, data: I) -> Result<Config<T>, ConfigErrors>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.run(schema, data).map(|(config, _)| config)
    }

    /// Like [`Loader::load_by_schema`], also recording where every property
    /// came from.
    pub fn load_traced_by_schema<T, I, K, V>(
        &self,
        schema: &Schema,
        data: I,
    ) -> Result<TracedConfig<T>, ConfigErrors>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.run(schema, data)
            .map(|(config, trace)| TracedConfig::new(config, trace))
    }

    /// Load the process environment through the schema at `schema_path`.
    pub fn load_from_environment<T>(&self, schema_path: impl AsRef<Path>) -> Result<Config<T>, LoadError>
    where
        T: DeserializeOwned,
    {
        self.load_from_environment_with_env(schema_path, &RealEnv::new())
    }

    /// Like [`Loader::load_from_environment`], with the environment snapshot
    /// and schema files taken from `env`.
    pub fn load_from_environment_with_env<T>(
        &self,
        schema_path: impl AsRef<Path>,
        env: &dyn ConfigEnv,
    ) -> Result<Config<T>, LoadError>
    where
        T: DeserializeOwned,
    {
        let vars = env.all_env_vars();
        debug!(count = vars.len(), "snapshot of environment variables");
        self.load_with_env(schema_path, vars, env)
    }

    fn run<T, I, K, V>(&self, schema: &Schema, data: I) -> Result<(Config<T>, ResolutionTrace), ConfigErrors>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        if !schema.root().is_object() {
            return Err(ConfigErrors::single(ConfigError::RootNotObject {
                found: schema.root_type(),
            }));
        }

        let transform = schema.transform();
        let source = SourceMap::normalize(data, transform);
        debug!(
            format = %schema.source_format(),
            keys = source.len(),
            "normalized configuration source"
        );

        let reconstruction = Reconstructor::new(&source, transform).run(schema.root());
        let mut json = reconstruction
            .value
            .to_json()
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        coerce::apply(schema.document(), &mut json, &self.options);

        if let Validation::Failure(errors) = validate(schema, &json, &self.options) {
            return Err(errors);
        }

        let config = serde_json::from_value::<T>(json).map_err(|e| {
            ConfigErrors::single(ConfigError::Deserialize {
                target: type_name::<T>().to_string(),
                message: e.to_string(),
            })
        })?;

        info!("configuration loaded");
        Ok((Config::new(config), reconstruction.trace))
    }
}

/// Resolve the schema at `schema_path` and load `data` through it.
pub fn load<T, I, K, V>(schema_path: impl AsRef<Path>, data: I) -> Result<Config<T>, LoadError>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    Loader::new().load(schema_path, data)
}

/// Load `data` through an already dereferenced schema.
pub fn load_by_schema<T, I, K, V>(schema: &Schema, data: I) -> Result<Config<T>, ConfigErrors>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<Value>,
{
    Loader::new().load_by_schema(schema, data)
}

/// Load the process environment through the schema at `schema_path`.
pub fn load_from_environment<T>(schema_path: impl AsRef<Path>) -> Result<Config<T>, LoadError>
where
    T: DeserializeOwned,
{
    Loader::new().load_from_environment(schema_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MockEnv;
    use crate::error::SchemaError;
    use crate::trace::Lookup;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Database {
        connection_string: Option<String>,
        pool_size: i64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct AppConfig {
        database: Database,
        is_enabled: bool,
    }

    fn schema() -> Schema {
        Schema::from_value(json!({
            "type": "object",
            "required": ["database"],
            "properties": {
                "database": {
                    "type": "object",
                    "required": ["poolSize"],
                    "properties": {
                        "connectionString": { "type": "string", "format": "uri" },
                        "poolSize": { "type": "integer", "x-sourceKey": "POOL" }
                    }
                },
                "isEnabled": { "type": "boolean", "default": true }
            }
        }))
    }

    #[test]
    fn test_config_deref() {
        let config = Config::new(AppConfig {
            database: Database {
                connection_string: None,
                pool_size: 3,
            },
            is_enabled: true,
        });

        assert_eq!(config.database.pool_size, 3);
        assert!(config.get().is_enabled);
        assert_eq!(config.as_ref().database.pool_size, 3);
        assert_eq!(config.into_inner().database.pool_size, 3);
    }

    #[test]
    fn test_load_options_builder() {
        let options = LoadOptions::default()
            .coerce_types(false)
            .use_defaults(false)
            .validate_formats(false)
            .root_label("data");

        assert!(!options.coerce_types);
        assert!(!options.use_defaults);
        assert!(!options.validate_formats);
        assert_eq!(options.root_label, "data");
        assert_eq!(Loader::new().options(), &LoadOptions::default());
    }

    #[test]
    fn test_load_by_schema_coerces_and_defaults() {
        let config: Config<AppConfig> = load_by_schema(
            &schema(),
            [("POOL", "9"), ("DATABASE_CONNECTION_STRING", "http://o.oo")],
        )
        .unwrap();

        assert_eq!(config.database.pool_size, 9);
        assert_eq!(
            config.database.connection_string.as_deref(),
            Some("http://o.oo")
        );
        assert!(config.is_enabled);
    }

    #[test]
    fn test_untyped_target() {
        let config: Config<serde_json::Value> =
            load_by_schema(&schema(), [("pool", "4"), ("isEnabled", "false")]).unwrap();

        assert_eq!(
            *config,
            json!({ "database": { "poolSize": 4 }, "isEnabled": false })
        );
    }

    #[test]
    fn test_root_not_object() {
        let schema = Schema::from_value(json!({ "type": "array" }));

        let errors = load_by_schema::<serde_json::Value, _, _, _>(&schema, [("a", "b")])
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.first(),
            &ConfigError::RootNotObject {
                found: "array".to_string()
            }
        );
    }

    #[test]
    fn test_violations_are_enriched() {
        let errors = load_by_schema::<AppConfig, _, _, _>(
            &schema(),
            [("DATABASE_CONNECTION_STRING", "not a uri")],
        )
        .unwrap_err();

        let fields: Vec<&str> = errors.field_errors().map(|e| e.field.as_str()).collect();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains(&"config.database"));
        assert!(fields.contains(&"config.database.connectionString"));

        let missing = errors
            .field_errors()
            .find(|e| e.data.contains_key("missingProperty"))
            .unwrap();
        assert!(missing.message.ends_with("with source key: \"POOL\""));
    }

    #[test]
    fn test_options_change_root_label_and_formats() {
        let loader = Loader::new().with_options(
            LoadOptions::default()
                .validate_formats(false)
                .root_label("data"),
        );

        let errors = loader
            .load_by_schema::<AppConfig, _, _, _>(
                &schema(),
                [("DATABASE_CONNECTION_STRING", "not a uri")],
            )
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().field(), Some("data.database"));
    }

    #[test]
    fn test_deserialize_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Strict {
            missing: String,
        }

        let errors = load_by_schema::<Strict, _, _, _>(&schema(), [("POOL", "1")]).unwrap_err();

        assert!(matches!(errors.first(), ConfigError::Deserialize { .. }));
    }

    #[test]
    fn test_load_with_env_reads_schema_file() {
        let env = MockEnv::new().with_file(
            "schema.json",
            r#"{
                "type": "object",
                "properties": {
                    "database": {
                        "type": "object",
                        "properties": { "poolSize": { "type": "integer" } }
                    }
                }
            }"#,
        );

        let config: Config<serde_json::Value> = Loader::new()
            .load_with_env("schema.json", [("databasePoolSize", "9")], &env)
            .unwrap();

        assert_eq!(*config, json!({ "database": { "poolSize": 9 } }));
    }

    #[test]
    fn test_schema_errors_propagate_unchanged() {
        let err = Loader::new()
            .load_with_env::<serde_json::Value, _, _, _>(
                "missing.json",
                Vec::<(String, String)>::new(),
                &MockEnv::new(),
            )
            .unwrap_err();

        assert_eq!(
            err.schema_error(),
            Some(&SchemaError::NotFound {
                path: "missing.json".to_string()
            })
        );
    }

    #[test]
    fn test_load_from_environment_with_env() {
        let env = MockEnv::new()
            .with_file(
                "schema.json",
                r#"{ "type": "object", "properties": { "port": { "type": "integer" } } }"#,
            )
            .with_env("PORT", "8080")
            .with_env("UNRELATED", "x");

        let config: Config<serde_json::Value> = Loader::new()
            .load_from_environment_with_env("schema.json", &env)
            .unwrap();

        assert_eq!(*config, json!({ "port": 8080 }));
    }

    #[test]
    fn test_load_traced_by_schema() {
        let traced: TracedConfig<AppConfig> = Loader::new()
            .load_traced_by_schema(&schema(), [("POOL", "2")])
            .unwrap();

        assert_eq!(traced.database.pool_size, 2);
        let pool = traced.trace().get("database.poolSize").unwrap();
        assert_eq!(pool.key, "pool");
        assert_eq!(pool.lookup, Lookup::Override);
        assert_eq!(pool.value, Value::from("2"));
        assert_eq!(
            traced.trace().searched_key("isEnabled"),
            Some("isEnabled")
        );
    }
}
