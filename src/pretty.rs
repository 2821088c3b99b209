//! Pretty printing for configuration errors.
//!
//! This module provides colorized, grouped error output with support for
//! suggestions, redaction of sensitive values, and truncation.
//!
//! # Example
//!
//! ```ignore
//! use envschema::{load_from_environment, ValidationExt};
//!
//! let config: Config<AppConfig> = load_from_environment("schema.yaml").unwrap_or_exit();
//! ```
//!
//! # Output Format
//!
//! ```text
//! Invalid configuration (3):
//!
//!   config.foobar:
//!     • config.foobar "uri" is a required property with source key: "legacyUri"
//!     • config.foobar "token" is a required property
//!
//!   config.foobar.timeoutInMs:
//!     • config.foobar.timeoutInMs "abc" is not of type "integer"
//!
//! Hints:
//!   • Set 'legacyUri' in the configuration source
//!   • Provide a value for 'config.foobar.token'
//! ```

use std::io::Write;

use indexmap::IndexMap;
use stillwater::Validation;

use crate::error::{ConfigError, ConfigErrors, ConfigValidation, FieldError, LoadError, INVALID_CONFIGURATION};

/// Options for pretty printing errors.
#[derive(Debug, Clone)]
pub struct PrettyPrintOptions {
    /// Enable colored output (auto-detected by default).
    pub color: ColorOption,
    /// Group violations by field.
    pub group_by_field: bool,
    /// Show fix suggestions.
    pub show_suggestions: bool,
    /// Maximum errors to display (None for all).
    pub max_errors: Option<usize>,
    /// Redact rejected values of sensitive-looking fields.
    pub redact_sensitive: bool,
}

impl Default for PrettyPrintOptions {
    fn default() -> Self {
        Self {
            color: ColorOption::Auto,
            group_by_field: true,
            show_suggestions: true,
            max_errors: Some(20),
            redact_sensitive: true,
        }
    }
}

impl PrettyPrintOptions {
    /// Create options with colors disabled.
    pub fn no_color() -> Self {
        Self {
            color: ColorOption::Never,
            ..Default::default()
        }
    }

    /// Create options that show all errors (no truncation).
    pub fn show_all() -> Self {
        Self {
            max_errors: None,
            ..Default::default()
        }
    }

    pub fn with_color(mut self, color: ColorOption) -> Self {
        self.color = color;
        self
    }

    pub fn with_grouping(mut self, group: bool) -> Self {
        self.group_by_field = group;
        self
    }

    pub fn with_suggestions(mut self, show: bool) -> Self {
        self.show_suggestions = show;
        self
    }

    pub fn with_max_errors(mut self, max: Option<usize>) -> Self {
        self.max_errors = max;
        self
    }

    pub fn with_redaction(mut self, redact: bool) -> Self {
        self.redact_sensitive = redact;
        self
    }
}

/// Color output option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOption {
    /// Auto-detect based on terminal capability.
    Auto,
    /// Always use colors.
    Always,
    /// Never use colors.
    Never,
}

/// ANSI color codes for terminal output.
struct Colors {
    error: &'static str,
    warning: &'static str,
    info: &'static str,
    value: &'static str,
    hint: &'static str,
    reset: &'static str,
}

impl Colors {
    fn enabled() -> Self {
        Self {
            error: "\x1b[1;31m",   // bold red
            warning: "\x1b[1;33m", // bold yellow
            info: "\x1b[1;36m",    // bold cyan
            value: "\x1b[33m",     // yellow
            hint: "\x1b[32m",      // green
            reset: "\x1b[0m",
        }
    }

    fn disabled() -> Self {
        Self {
            error: "",
            warning: "",
            info: "",
            value: "",
            hint: "",
            reset: "",
        }
    }
}

/// Group label for errors without a field.
const SCHEMA_GROUP: &str = "(schema)";

struct ErrorPrinter<'a> {
    options: &'a PrettyPrintOptions,
    colors: Colors,
}

impl<'a> ErrorPrinter<'a> {
    fn new(options: &'a PrettyPrintOptions, use_color: bool) -> Self {
        let colors = if use_color {
            Colors::enabled()
        } else {
            Colors::disabled()
        };
        Self { options, colors }
    }

    fn print(&self, errors: &ConfigErrors, writer: &mut dyn Write) {
        let c = &self.colors;

        writeln!(
            writer,
            "\n{}{} ({}):{}\n",
            c.error,
            INVALID_CONFIGURATION,
            errors.len(),
            c.reset
        )
        .ok();

        if self.options.group_by_field {
            self.print_grouped(errors, writer);
        } else {
            self.print_flat(errors, writer);
        }

        if self.options.show_suggestions {
            self.print_suggestions(errors, writer);
        }
    }

    fn print_grouped(&self, errors: &ConfigErrors, writer: &mut dyn Write) {
        let c = &self.colors;
        let mut shown = 0;

        for (field, errs) in group_by_field(errors) {
            writeln!(writer, "  {}{}:{}", c.info, field, c.reset).ok();

            for error in errs {
                if self.truncated(shown, errors.len(), writer) {
                    return;
                }
                self.print_error(error, writer);
                shown += 1;
            }
            writeln!(writer).ok();
        }
    }

    fn print_flat(&self, errors: &ConfigErrors, writer: &mut dyn Write) {
        for (shown, error) in errors.iter().enumerate() {
            if self.truncated(shown, errors.len(), writer) {
                return;
            }
            self.print_error(error, writer);
        }
        writeln!(writer).ok();
    }

    fn truncated(&self, shown: usize, total: usize, writer: &mut dyn Write) -> bool {
        let c = &self.colors;
        match self.options.max_errors {
            Some(max) if shown >= max => {
                writeln!(
                    writer,
                    "\n  {}...and {} more errors{}\n",
                    c.warning,
                    total - shown,
                    c.reset
                )
                .ok();
                true
            }
            _ => false,
        }
    }

    fn print_error(&self, error: &ConfigError, writer: &mut dyn Write) {
        let c = &self.colors;

        match error {
            ConfigError::Violation(e) if self.should_redact(e) => {
                let keyword = e.data.keys().next().map(String::as_str).unwrap_or("schema");
                writeln!(
                    writer,
                    "    {}•{} '{}' = {}[REDACTED]{}: rejected by '{}'",
                    c.error, c.reset, e.field, c.value, c.reset, keyword
                )
                .ok();
            }
            other => {
                writeln!(writer, "    {}•{} {}", c.error, c.reset, other).ok();
            }
        }
    }

    fn print_suggestions(&self, errors: &ConfigErrors, writer: &mut dyn Write) {
        let c = &self.colors;
        let suggestions: Vec<_> = errors
            .iter()
            .filter_map(|e| e.suggestion())
            .take(3)
            .collect();

        if !suggestions.is_empty() {
            writeln!(writer, "{}Hints:{}", c.hint, c.reset).ok();
            for suggestion in suggestions {
                writeln!(writer, "  • {}", suggestion).ok();
            }
            writeln!(writer).ok();
        }
    }

    /// Only violations that echo a value are redacted; `required` ones have none.
    fn should_redact(&self, error: &FieldError) -> bool {
        self.options.redact_sensitive
            && !error.data.contains_key("missingProperty")
            && (is_sensitive_path(&error.field)
                || error.source_key.as_deref().is_some_and(is_sensitive_path))
    }
}

fn group_by_field(errors: &ConfigErrors) -> IndexMap<&str, Vec<&ConfigError>> {
    let mut groups: IndexMap<&str, Vec<&ConfigError>> = IndexMap::new();
    for error in errors.iter() {
        let field = error.field().unwrap_or(SCHEMA_GROUP);
        groups.entry(field).or_default().push(error);
    }
    groups
}

/// Check if a config path appears to contain sensitive data.
fn is_sensitive_path(path: &str) -> bool {
    let sensitive_patterns = [
        "password",
        "secret",
        "key",
        "token",
        "credential",
        "api_key",
    ];
    let lower = path.to_lowercase();
    sensitive_patterns.iter().any(|p| lower.contains(p))
}

fn should_use_color(color_option: ColorOption) -> bool {
    match color_option {
        ColorOption::Always => true,
        ColorOption::Never => false,
        ColorOption::Auto => {
            use std::io::IsTerminal;
            std::io::stderr().is_terminal()
        }
    }
}

impl ConfigErrors {
    /// Pretty print errors to stderr.
    pub fn pretty_print(&self, options: &PrettyPrintOptions) {
        let use_color = should_use_color(options.color);
        let printer = ErrorPrinter::new(options, use_color);
        let mut stderr = std::io::stderr();
        printer.print(self, &mut stderr);
    }

    /// Pretty print to a string.
    pub fn format(&self, options: &PrettyPrintOptions) -> String {
        let use_color = options.color == ColorOption::Always;
        let printer = ErrorPrinter::new(options, use_color);
        let mut buf = Vec::new();
        printer.print(self, &mut buf);
        String::from_utf8(buf).unwrap_or_default()
    }

    /// Pretty print with default options.
    pub fn pretty_print_default(&self) {
        self.pretty_print(&PrettyPrintOptions::default());
    }
}

impl LoadError {
    /// Pretty print to stderr; schema errors get a single line.
    pub fn pretty_print(&self, options: &PrettyPrintOptions) {
        match self {
            LoadError::Invalid(errors) => errors.pretty_print(options),
            LoadError::Schema(e) => {
                let c = if should_use_color(options.color) {
                    Colors::enabled()
                } else {
                    Colors::disabled()
                };
                eprintln!("\n{}Schema error:{} {}\n", c.error, c.reset, e);
            }
        }
    }
}

/// Trait extension for easy error handling with pretty printing.
pub trait ValidationExt<T> {
    type Error;

    /// Unwrap or pretty print errors and exit with code 1.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use envschema::{load_from_environment, ValidationExt};
    ///
    /// let config: Config<AppConfig> = load_from_environment("schema.yaml").unwrap_or_exit();
    /// ```
    fn unwrap_or_exit(self) -> T
    where
        Self: Sized,
    {
        self.unwrap_or_exit_with(&PrettyPrintOptions::default())
    }

    /// Unwrap or pretty print errors with custom options and exit.
    fn unwrap_or_exit_with(self, options: &PrettyPrintOptions) -> T;

    /// Convert to Result, pretty printing on error but not exiting.
    fn unwrap_or_print(self) -> Result<T, Self::Error>;
}

impl<T> ValidationExt<T> for Result<T, LoadError> {
    type Error = LoadError;

    fn unwrap_or_exit_with(self, options: &PrettyPrintOptions) -> T {
        match self {
            Ok(value) => value,
            Err(error) => {
                error.pretty_print(options);
                std::process::exit(1);
            }
        }
    }

    fn unwrap_or_print(self) -> Result<T, LoadError> {
        self.inspect_err(|error| error.pretty_print(&PrettyPrintOptions::default()))
    }
}

impl<T> ValidationExt<T> for Result<T, ConfigErrors> {
    type Error = ConfigErrors;

    fn unwrap_or_exit_with(self, options: &PrettyPrintOptions) -> T {
        match self {
            Ok(value) => value,
            Err(errors) => {
                errors.pretty_print(options);
                std::process::exit(1);
            }
        }
    }

    fn unwrap_or_print(self) -> Result<T, ConfigErrors> {
        self.inspect_err(ConfigErrors::pretty_print_default)
    }
}

impl<T> ValidationExt<T> for ConfigValidation<T> {
    type Error = ConfigErrors;

    fn unwrap_or_exit_with(self, options: &PrettyPrintOptions) -> T {
        match self {
            Validation::Success(value) => value,
            Validation::Failure(errors) => {
                errors.pretty_print(options);
                std::process::exit(1);
            }
        }
    }

    fn unwrap_or_print(self) -> Result<T, ConfigErrors> {
        match self {
            Validation::Success(value) => Ok(value),
            Validation::Failure(errors) => {
                errors.pretty_print_default();
                Err(errors)
            }
        }
    }
}
