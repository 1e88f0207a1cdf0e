//! Case-insensitive header storage that keeps the client's spelling.

/// Ordered header collection with ASCII case-insensitive lookup.
///
/// Names are stored as received so they can be echoed back verbatim; a
/// repeated header replaces the earlier value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    /// Insert a header, replacing any value stored under the same name.
    pub fn insert(&mut self, name: &str, value: &str) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            name.clone_into(&mut entry.0);
            value.clone_into(&mut entry.1);
        } else {
            self.entries.push((name.to_owned(), value.to_owned()));
        }
    }

    /// Return the value stored under `name`, ignoring ASCII case.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether a header named `name` is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }

    /// Iterate over `(name, value)` pairs in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of distinct headers.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether no headers were received.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
