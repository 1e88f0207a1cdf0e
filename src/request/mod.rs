//! Parsing of the HTTP upgrade request that opens a WebSocket connection.
//!
//! [`parse`] turns the raw header block into an immutable [`ParsedRequest`].
//! The parser is deliberately lenient about header lines: anything that does
//! not look like `Token: value` is skipped. Only the request line is
//! mandatory. Values are kept literally; no percent-decoding is applied to the
//! path or the query string.

mod cookie;
mod headers;
mod query;
mod read;

use std::collections::HashMap;

pub use cookie::CookieSet;
pub use headers::HeaderMap;
pub use query::parse_query;
pub use read::read_head;
use thiserror::Error;
use tokio::io;

/// Errors raised while reading or parsing the upgrade request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request line does not carry method, URI and version.
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
    /// The header block exceeded the configured size limit.
    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    /// The peer closed the socket before the head was complete.
    #[error("connection closed before request head was complete")]
    Closed,
    /// The head did not arrive within the handshake timeout.
    #[error("timed out reading request head")]
    Timeout,
    /// I/O error while reading the head.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Structured view of the upgrade request.
///
/// Built once per connection and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedRequest {
    method: String,
    uri: String,
    path: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    version: String,
}

impl ParsedRequest {
    /// HTTP method token, e.g. `GET`.
    #[must_use]
    pub fn method(&self) -> &str { &self.method }

    /// Request target exactly as sent.
    #[must_use]
    pub fn uri(&self) -> &str { &self.uri }

    /// Request target without the query string.
    #[must_use]
    pub fn path(&self) -> &str { &self.path }

    /// Query parameters; duplicate keys keep the last value.
    #[must_use]
    pub const fn query(&self) -> &HashMap<String, String> { &self.query }

    /// Look up a single query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// All headers, with case-insensitive lookup.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap { &self.headers }

    /// Look up a header value ignoring ASCII case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> { self.headers.get(name) }

    /// Protocol version token, e.g. `HTTP/1.1`.
    #[must_use]
    pub fn version(&self) -> &str { &self.version }
}

/// Parse a raw HTTP request head.
///
/// The first CRLF-delimited line must be `METHOD SP URI SP VERSION`. Every
/// following non-empty line of the form `Token: value` becomes a header;
/// other lines are ignored.
///
/// # Errors
/// Returns [`RequestError::MalformedRequestLine`] when the request line has
/// fewer than three whitespace-separated tokens.
pub fn parse(raw: &str) -> Result<ParsedRequest, RequestError> {
    let mut lines = raw.split("\r\n");
    let request_line = lines.next().unwrap_or_default();
    let mut tokens = request_line.split_whitespace();
    let (Some(method), Some(uri), Some(version)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(RequestError::MalformedRequestLine(request_line.to_owned()));
    };

    let mut headers = HeaderMap::default();
    for line in lines {
        if let Some((name, value)) = split_header_line(line) {
            headers.insert(name, value);
        }
    }

    let (path, query_string) = uri.split_once('?').unwrap_or((uri, ""));
    Ok(ParsedRequest {
        method: method.to_owned(),
        uri: uri.to_owned(),
        path: path.to_owned(),
        query: parse_query(query_string),
        headers,
        version: version.to_owned(),
    })
}

/// Split `Token: value`; the token may not contain whitespace.
fn split_header_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_end();
    let (name, value) = trimmed.split_once(": ")?;
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return None;
    }
    Some((name, value))
}

#[cfg(test)]
mod tests;
