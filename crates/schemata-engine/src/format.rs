//! # Format Registry
//!
//! The `format` keyword looks validators up by name in a [`FormatRegistry`]
//! and silently skips names it does not know. A validator receives the
//! schema fragment and the value and returns whether the value conforms;
//! non-string values always conform to the string formats.
//!
//! [`FormatRegistry::with_defaults`] registers `date-time`, `date`, `time`,
//! `email`, `uuid`, `uri`, `ipv4`, `ipv6` and `regex`. Custom validators
//! are added through [`SchemaCompiler::format`](crate::SchemaCompiler::format).

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde_json::Value;

/// A format validator: `(schema, value) -> conforms`.
pub type FormatFn = Arc<dyn Fn(&Value, &Value) -> bool + Send + Sync>;

/// Format validators by name.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    validators: HashMap<String, FormatFn>,
}

impl FormatRegistry {
    /// A registry without any validator; every `format` is skipped.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry with the built-in string formats.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("date-time", |_, v| on_string(v, is_date_time));
        registry.register("date", |_, v| on_string(v, is_date));
        registry.register("time", |_, v| on_string(v, is_time));
        registry.register("email", |_, v| on_string(v, is_email));
        registry.register("uuid", |_, v| on_string(v, is_uuid));
        registry.register("uri", |_, v| on_string(v, |s| url::Url::parse(s).is_ok()));
        registry.register("ipv4", |_, v| on_string(v, |s| s.parse::<Ipv4Addr>().is_ok()));
        registry.register("ipv6", |_, v| on_string(v, |s| s.parse::<Ipv6Addr>().is_ok()));
        registry.register("regex", |_, v| on_string(v, |s| Regex::new(s).is_ok()));
        registry
    }

    /// Register (or replace) the validator for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, validator: F)
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.validators.insert(name.into(), Arc::new(validator));
    }

    /// The validator registered for `name`.
    pub fn get(&self, name: &str) -> Option<&FormatFn> {
        self.validators.get(name)
    }

    /// Whether a validator is registered for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.validators.contains_key(name)
    }

    /// Registered format names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.validators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry").field("formats", &self.names()).finish()
    }
}

fn on_string(value: &Value, check: impl Fn(&str) -> bool) -> bool {
    value.as_str().map_or(true, check)
}

fn is_date_time(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok()
}

fn is_date(s: &str) -> bool {
    static SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
    let shape = SHAPE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok());
    shape.as_ref().is_some_and(|re| re.is_match(s)) && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_time(s: &str) -> bool {
    // RFC 3339 full-time: reuse the date-time parser on a fixed date.
    DateTime::parse_from_rfc3339(&format!("1970-01-01T{s}")).is_ok()
}

fn is_email(s: &str) -> bool {
    static SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
    let shape = SHAPE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+$").ok());
    shape.as_ref().is_some_and(|re| re.is_match(s))
}

fn is_uuid(s: &str) -> bool {
    s.len() == 36 && uuid::Uuid::parse_str(s).is_ok()
}
