//! Query-string splitting.

use std::collections::HashMap;

/// Split a raw query string into parameters.
///
/// Pairs are separated by `&` and split on the first `=`. A pair without `=`
/// maps to an empty value, empty pairs are skipped and the last occurrence
/// of a key wins. Values are not percent-decoded.
#[must_use]
pub fn parse_query(raw: &str) -> HashMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key.to_owned(), value.to_owned())
        })
        .collect()
}
