//! Parsing of the `Cookie` request header.

use std::collections::HashMap;

/// Cookies sent with the upgrade request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CookieSet {
    values: HashMap<String, String>,
}

impl CookieSet {
    /// Parse a `Cookie` header value.
    ///
    /// The header is split on `"; "` and each part on its first `=`. A part
    /// without `=` yields a cookie with an empty value; empty parts are
    /// skipped and later duplicates overwrite earlier ones.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let values = header
            .split("; ")
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (name, value) = part.split_once('=').unwrap_or((part, ""));
                (name.to_owned(), value.to_owned())
            })
            .collect();
        Self { values }
    }

    /// Value of the cookie called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> { self.values.get(name).map(String::as_str) }

    /// Whether a cookie called `name` was sent.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.values.contains_key(name) }

    /// Set or replace a cookie.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Iterate over `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of cookies.
    #[must_use]
    pub fn len(&self) -> usize { self.values.len() }

    /// Whether no cookies were sent.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
}
