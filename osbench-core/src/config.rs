use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Flat key/value configuration attached to an operator or a storage backend.
///
/// The textual form is `key=value` pairs separated by `;`, e.g.
/// `containers=u(1,10);objects=u(1,100);name=ls`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    entries: BTreeMap<String, String>,
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| Error::InvalidConfigValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    pub fn get_u64_or(&self, key: &str, default: u64) -> Result<u64> {
        Ok(self.get_parsed(key)?.unwrap_or(default))
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self.get_parsed(key)?.unwrap_or(default))
    }

    /// Reads a value expressed in milliseconds.
    pub fn get_millis_or(&self, key: &str, default: Duration) -> Result<Duration> {
        Ok(self
            .get_parsed::<u64>(key)?
            .map_or(default, Duration::from_millis))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for raw in s.split(';') {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }

            let Some((key, value)) = entry.split_once('=') else {
                return Err(Error::InvalidConfigEntry(entry.to_string()));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(Error::InvalidConfigEntry(entry.to_string()));
            }
            entries.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Self { entries })
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (k, v) in &self.entries {
            if !first {
                f.write_str(";")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Config {
        match s.parse::<Config>() {
            Ok(v) => v,
            Err(err) => panic!("failed to parse config {s:?}: {err}"),
        }
    }

    #[test]
    fn parses_semicolon_separated_pairs() {
        let cfg = parse(" name = ls ; containers=u(1,10);; objects=c(3)");
        assert_eq!(cfg.get("name"), Some("ls"));
        assert_eq!(cfg.get("containers"), Some("u(1,10)"));
        assert_eq!(cfg.get("objects"), Some("c(3)"));
        assert_eq!(cfg.get("missing"), None);
        assert_eq!(cfg.get_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn later_keys_override_earlier_ones() {
        let cfg = parse("size=1;size=2");
        assert!(matches!(cfg.get_u64_or("size", 0), Ok(2)));
    }

    #[test]
    fn values_may_contain_equals_signs() {
        let cfg = parse("token=abc==");
        assert_eq!(cfg.get("token"), Some("abc=="));
    }

    #[test]
    fn rejects_entries_without_a_key() {
        assert!(matches!(
            "novalue".parse::<Config>(),
            Err(Error::InvalidConfigEntry(_))
        ));
        assert!(matches!(
            "=x".parse::<Config>(),
            Err(Error::InvalidConfigEntry(_))
        ));
    }

    #[test]
    fn typed_getters_report_bad_values() {
        let cfg = parse("size=big;flag=yes;delay=250");
        assert!(matches!(
            cfg.get_u64_or("size", 1),
            Err(Error::InvalidConfigValue { .. })
        ));
        assert!(cfg.get_bool_or("flag", false).is_err());
        assert!(matches!(
            cfg.get_millis_or("delay", Duration::ZERO),
            Ok(d) if d == Duration::from_millis(250)
        ));
        assert!(matches!(cfg.get_u64_or("absent", 7), Ok(7)));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let cfg = Config::new().with("b", "2").with("a", "1");
        assert_eq!(cfg.to_string(), "a=1;b=2");
        assert_eq!(parse(&cfg.to_string()), cfg);
    }
}
