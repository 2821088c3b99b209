//! Case normalization of source keys.
//!
//! Every source key and every composed lookup key passes through the same
//! transform, so `FOO_BAR`, `foo-bar` and `fooBar` all compare equal once
//! normalized. The transform is picked from the schema's `x-sourceFormat`
//! hint; anything unrecognized falls back to camel case.

use std::fmt;
use std::str::FromStr;

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase};

/// A pure key transform applied to source keys and composed lookup keys.
pub type KeyTransform = fn(&str) -> String;

/// Case format hint carried by `x-sourceFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    /// `fooBarBaz`. Also the fallback for absent or unknown hints.
    #[default]
    CamelCase,
    /// `foo_bar_baz`
    SnakeCase,
    /// `foo-bar-baz`
    KebabCase,
}

impl SourceFormat {
    /// Resolve an optional hint, falling back to camel case.
    ///
    /// Unknown hints are not an error.
    pub fn from_hint(hint: Option<&str>) -> Self {
        hint.and_then(|h| h.parse().ok()).unwrap_or_default()
    }

    /// The hint string for this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::CamelCase => "camel-case",
            SourceFormat::SnakeCase => "snake-case",
            SourceFormat::KebabCase => "kebab-case",
        }
    }

    /// The transform function for this format.
    pub fn transform(&self) -> KeyTransform {
        match self {
            SourceFormat::CamelCase => to_camel_case,
            SourceFormat::SnakeCase => to_snake_case,
            SourceFormat::KebabCase => to_kebab_case,
        }
    }
}

impl FromStr for SourceFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camel-case" => Ok(SourceFormat::CamelCase),
            "snake-case" => Ok(SourceFormat::SnakeCase),
            "kebab-case" => Ok(SourceFormat::KebabCase),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A format hint that is not one of the recognized tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown source format '{}'", self.0)
    }
}

impl std::error::Error for UnknownFormat {}

/// Select the key transform for an optional format hint.
pub fn select_transform(hint: Option<&str>) -> KeyTransform {
    SourceFormat::from_hint(hint).transform()
}

/// `DATABASE_POOL_SIZE` -> `databasePoolSize`
///
/// Repeated until stable: one-letter words such as `a_a_a` camel-case to an
/// upper-case run (`aAA`) that re-segments as a single word.
pub fn to_camel_case(text: &str) -> String {
    let mut current = text.to_lower_camel_case();
    for _ in 0..MAX_CAMEL_PASSES {
        let next = current.to_lower_camel_case();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

const MAX_CAMEL_PASSES: usize = 4;

/// `databasePoolSize` -> `database_pool_size`
pub fn to_snake_case(text: &str) -> String {
    text.to_snake_case()
}

/// `databasePoolSize` -> `database-pool-size`
pub fn to_kebab_case(text: &str) -> String {
    text.to_kebab_case()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hint_recognized() {
        assert_eq!(
            SourceFormat::from_hint(Some("snake-case")),
            SourceFormat::SnakeCase
        );
        assert_eq!(
            SourceFormat::from_hint(Some("kebab-case")),
            SourceFormat::KebabCase
        );
        assert_eq!(
            SourceFormat::from_hint(Some("camel-case")),
            SourceFormat::CamelCase
        );
    }

    #[test]
    fn test_from_hint_falls_back_to_camel_case() {
        assert_eq!(SourceFormat::from_hint(None), SourceFormat::CamelCase);
        assert_eq!(
            SourceFormat::from_hint(Some("SCREAMING")),
            SourceFormat::CamelCase
        );
        assert_eq!(SourceFormat::from_hint(Some("")), SourceFormat::CamelCase);
    }

    #[test]
    fn test_parse_unknown_format() {
        let err = "pascal-case".parse::<SourceFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown source format 'pascal-case'");
    }

    #[test]
    fn test_camel_case_normalizes_mixed_conventions() {
        let transform = select_transform(None);
        assert_eq!(transform("FOO_BAR"), "fooBar");
        assert_eq!(transform("foo-bar"), "fooBar");
        assert_eq!(transform("fooBar"), "fooBar");
        assert_eq!(transform("RE_CONNECTING_STRING2"), "reConnectingString2");
    }

    #[test]
    fn test_camel_case_single_letter_words_are_stable() {
        let once = to_camel_case("a_a_a");
        assert_eq!(once, "aAa");
        assert_eq!(to_camel_case(&once), once);
        assert_eq!(to_camel_case("A_A_A"), to_camel_case("a-a-a"));
        assert_eq!(to_camel_case("x_y_z_1"), to_camel_case(&to_camel_case("x_y_z_1")));
    }

    #[test]
    fn test_composed_keys_drop_leading_separator() {
        assert_eq!(to_camel_case("_customKey"), "customKey");
        assert_eq!(to_camel_case("foobarStore_redis"), "foobarStoreRedis");
        assert_eq!(to_snake_case("foobar_timeoutInMs"), "foobar_timeout_in_ms");
        assert_eq!(to_kebab_case("_database_poolSize"), "database-pool-size");
    }

    #[test]
    fn test_snake_and_kebab_from_upper_case() {
        assert_eq!(to_snake_case("DATABASE_POOL_SIZE"), "database_pool_size");
        assert_eq!(to_kebab_case("DATABASE_POOL_SIZE"), "database-pool-size");
    }

    #[test]
    fn test_display_round_trips_hint() {
        for format in [
            SourceFormat::CamelCase,
            SourceFormat::SnakeCase,
            SourceFormat::KebabCase,
        ] {
            assert_eq!(format.to_string().parse::<SourceFormat>(), Ok(format));
        }
    }
}
