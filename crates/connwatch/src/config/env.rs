use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use super::{ConfigError, parse_duration};

/// Reads prefixed settings through a lookup function.
///
/// `EnvReader::from_env` reads the process environment; tests hand in a map.
pub struct EnvReader<F> {
    prefix: String,
    lookup: F,
}

impl EnvReader<fn(&str) -> Option<String>> {
    /// Reader over the real process environment
    pub fn from_env(prefix: &str) -> Self {
        fn lookup(key: &str) -> Option<String> {
            std::env::var(key).ok()
        }
        Self { prefix: prefix.to_string(), lookup }
    }
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(prefix: &str, lookup: F) -> Self {
        Self { prefix: prefix.to_string(), lookup }
    }

    /// Full variable name for a setting, e.g. `CONNCHK_GRACE_PERIOD`
    pub fn key(&self, name: &str) -> String {
        format!("{}_{}", self.prefix, name)
    }

    /// Raw value; blank values count as unset
    pub fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(&self.key(name)).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    pub fn required<T>(&self, name: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let key = self.key(name);
        let raw = self.raw(name).ok_or_else(|| ConfigError::Missing { key: key.clone() })?;
        raw.parse().map_err(|e: T::Err| ConfigError::invalid(&key, &raw, e))
    }

    pub fn optional<T>(&self, name: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.raw(name) {
            Some(raw) => {
                raw.parse().map(Some).map_err(|e: T::Err| ConfigError::invalid(&self.key(name), &raw, e))
            }
            None => Ok(None),
        }
    }

    pub fn with_default<T>(&self, name: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    /// Boolean flag accepting the usual spellings (`true`/`1`/`yes`/`on`)
    pub fn flag(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.raw(name) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(&self.key(name), &raw, "expected a boolean")),
        }
    }

    /// Strictly positive duration, falling back to `default`
    pub fn positive_duration(&self, name: &str, default: Duration) -> Result<Duration, ConfigError> {
        let value = match self.raw(name) {
            Some(raw) => {
                parse_duration(&raw).map_err(|e| ConfigError::invalid(&self.key(name), &raw, e))?
            }
            None => default,
        };
        if value.is_zero() {
            return Err(ConfigError::NotPositive { key: self.key(name) });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn reader(pairs: &[(&str, &str)]) -> EnvReader<impl Fn(&str) -> Option<String>> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        EnvReader::new("TEST", move |key| map.get(key).cloned())
    }

    #[test]
    fn test_required_missing_and_blank() {
        let env = reader(&[("TEST_BLANK", "   ")]);
        assert_eq!(
            env.required::<String>("ABSENT"),
            Err(ConfigError::Missing { key: "TEST_ABSENT".to_string() })
        );
        assert!(matches!(env.required::<String>("BLANK"), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_required_parse_failure_names_the_key() {
        let env = reader(&[("TEST_PORT", "eighty")]);
        match env.required::<u16>("PORT") {
            Err(ConfigError::Invalid { key, value, .. }) => {
                assert_eq!(key, "TEST_PORT");
                assert_eq!(value, "eighty");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_flag_spellings() {
        let env = reader(&[("TEST_A", "TRUE"), ("TEST_B", "off"), ("TEST_C", "maybe")]);
        assert_eq!(env.flag("A", false), Ok(true));
        assert_eq!(env.flag("B", true), Ok(false));
        assert_eq!(env.flag("MISSING", true), Ok(true));
        assert!(env.flag("C", false).is_err());
    }

    #[test]
    fn test_positive_duration_rejects_zero() {
        let env = reader(&[("TEST_GRACE", "0s")]);
        assert_eq!(
            env.positive_duration("GRACE", Duration::from_secs(10)),
            Err(ConfigError::NotPositive { key: "TEST_GRACE".to_string() })
        );
        assert_eq!(
            env.positive_duration("UNSET", Duration::from_secs(10)),
            Ok(Duration::from_secs(10))
        );
    }
}
