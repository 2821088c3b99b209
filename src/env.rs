//! ConfigEnv trait for testable I/O.
//!
//! Everything that touches the outside world while loading (reading schema
//! files, snapshotting the process environment) goes through [`ConfigEnv`],
//! so reconstruction itself stays pure and tests run against [`MockEnv`].

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// Environment trait for configuration I/O operations.
///
/// # Example
///
/// ```ignore
/// // Production
/// let config: Config<AppConfig> = load_from_environment("schema.yaml")?;
///
/// // Testing
/// let env = MockEnv::new()
///     .with_file("schema.yaml", "type: object\nproperties: {}")
///     .with_env("DATABASE_POOL_SIZE", "9");
/// let config: Config<AppConfig> =
///     Loader::new().load_from_environment_with_env("schema.yaml", &env)?;
/// ```
pub trait ConfigEnv: Send + Sync {
    /// Read a file's contents as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if:
    /// - File does not exist (`ErrorKind::NotFound`)
    /// - File is not valid UTF-8
    /// - Permission denied
    /// - Other I/O errors
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Snapshot of all environment variables, in enumeration order.
    fn all_env_vars(&self) -> Vec<(String, String)>;
}

/// Production environment using standard library I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealEnv;

impl RealEnv {
    /// Create a new real environment.
    pub fn new() -> Self {
        Self
    }
}

impl ConfigEnv for RealEnv {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn all_env_vars(&self) -> Vec<(String, String)> {
        // Non-UTF-8 variables cannot name or feed a schema property.
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect()
    }
}

/// Mock file state for testing.
#[derive(Debug, Clone)]
enum MockFile {
    Content(String),
    PermissionDenied,
}

/// Mock environment for testing configuration loading.
///
/// Environment variables keep insertion order, so key collisions after case
/// normalization resolve the same way on every run.
///
/// # Example
///
/// ```
/// use envschema::env::MockEnv;
///
/// let env = MockEnv::new()
///     .with_file("schema.yaml", r#"
///         type: object
///         properties:
///           database:
///             type: object
///             properties:
///               poolSize: { type: integer }
///     "#)
///     .with_env("DATABASE_POOL_SIZE", "9");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    files: HashMap<PathBuf, MockFile>,
    env_vars: IndexMap<String, String>,
}

impl MockEnv {
    /// Create a new empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with content.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files
            .insert(path.into(), MockFile::Content(content.into()));
        self
    }

    /// Add a file that will return "permission denied" error.
    pub fn with_unreadable_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into(), MockFile::PermissionDenied);
        self
    }

    /// Set an environment variable.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }

    /// Set multiple environment variables from an iterator.
    pub fn with_envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in vars {
            self.env_vars.insert(k.into(), v.into());
        }
        self
    }

    /// Remove an environment variable.
    pub fn without_env(mut self, name: &str) -> Self {
        self.env_vars.shift_remove(name);
        self
    }
}

impl ConfigEnv for MockEnv {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        match self.files.get(path) {
            Some(MockFile::Content(content)) => Ok(content.clone()),
            Some(MockFile::PermissionDenied) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("mock permission denied: {}", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock file not found: {}", path.display()),
            )),
        }
    }

    fn all_env_vars(&self) -> Vec<(String, String)> {
        self.env_vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
