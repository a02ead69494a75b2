//! Ordered flat property sets.
//!
//! A [`Properties`] value maps string keys to string values and remembers the
//! order in which keys were first defined. That order is significant: the host
//! discovers service declarations in it, and therefore starts and stops
//! services in it.

use indexmap::IndexMap;

/// Ordered set of string properties.
///
/// Setting a key that already exists replaces its value but keeps its
/// original position. Setting a key to the empty string removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: IndexMap<String, String>,
}

impl Properties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns the value of `key`, or `default` when unset.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Returns the value of `key` parsed as an integer, or `default` when the
    /// key is unset or does not hold an integer.
    #[must_use]
    pub fn get_as_int(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Sets `key` to `value`. An empty value removes the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let owned_key = key.into();
        let owned_value = value.into();
        if owned_value.is_empty() {
            self.entries.shift_remove(&owned_key);
        } else {
            self.entries.insert(owned_key, owned_value);
        }
    }

    /// Returns `true` when `key` is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no properties are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over every property in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Iterates over the properties whose key starts with `prefix`, in
    /// definition order. Keys are returned in full.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.iter().filter(move |(key, _)| key.starts_with(prefix))
    }

    /// Copies every property of `other` into `self`, overriding collisions.
    pub fn merge(&mut self, other: &Self) {
        for (key, value) in other.iter() {
            self.set(key, value);
        }
    }

    /// Renders every property as a `--key=value` option, in definition order.
    #[must_use]
    pub fn command_line_options(&self) -> Vec<String> {
        self.iter()
            .map(|(key, value)| format!("--{key}={value}"))
            .collect()
    }

    /// Absorbs the options under `prefix` and returns the remaining
    /// arguments.
    ///
    /// An argument of the form `--<prefix>.<rest>=<value>` sets the property
    /// `<prefix>.<rest>` to `<value>`; `--<prefix>.<rest>` without a value
    /// sets it to `1`. Later options override earlier ones. Every other
    /// argument is returned unchanged and in order.
    pub fn parse_command_line_options<I, S>(&mut self, prefix: &str, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scope = format!("{prefix}.");
        let mut residual = Vec::new();
        for arg in args {
            let text: String = arg.into();
            let Some(option) = text
                .strip_prefix("--")
                .filter(|option| option.starts_with(&scope))
            else {
                residual.push(text);
                continue;
            };
            match option.split_once('=') {
                Some((key, value)) => self.set(key, value),
                None => self.set(option, "1"),
            }
        }
        residual
    }
}

impl<K, V> FromIterator<(K, V)> for Properties
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.set(key, value);
        }
        properties
    }
}
