//! Tests for request-head parsing helpers.

use std::time::Duration;

use proptest::prelude::*;
use rstest::rstest;
use tokio::io::{AsyncWriteExt, BufReader};

use super::*;

const UPGRADE: &str = "GET /chat?room=1 HTTP/1.1\r\nHost: example.com:8443\r\nUpgrade: \
                       websocket\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n";

#[test]
fn parses_request_line_and_headers() {
    let req = parse(UPGRADE).expect("request parses");
    assert_eq!(req.method(), "GET");
    assert_eq!(req.uri(), "/chat?room=1");
    assert_eq!(req.path(), "/chat");
    assert_eq!(req.version(), "HTTP/1.1");
    assert_eq!(req.query_param("room"), Some("1"));
    assert_eq!(req.header("host"), Some("example.com:8443"));
    assert_eq!(req.headers().len(), 3);
}

#[rstest]
#[case("sec-websocket-key")]
#[case("SEC-WEBSOCKET-KEY")]
#[case("Sec-WebSocket-Key")]
fn header_lookup_ignores_case(#[case] name: &str) {
    let req = parse(UPGRADE).expect("request parses");
    assert_eq!(req.header(name), Some("dGhlIHNhbXBsZSBub25jZQ=="));
}

#[test]
fn header_names_keep_original_spelling() {
    let req = parse(UPGRADE).expect("request parses");
    let names: Vec<&str> = req.headers().iter().map(|(name, _)| name).collect();
    assert_eq!(names, ["Host", "Upgrade", "Sec-WebSocket-Key"]);
}

#[rstest]
#[case("")]
#[case("GET")]
#[case("GET /chat")]
#[case("   \r\nHost: a\r\n\r\n")]
fn rejects_short_request_line(#[case] raw: &str) {
    assert!(matches!(
        parse(raw),
        Err(RequestError::MalformedRequestLine(_))
    ));
}

#[test]
fn ignores_lines_that_are_not_headers() {
    let raw = "GET / HTTP/1.1\r\nHost: a\r\ngarbage\r\nNo-Space:x\r\nBad Name: y\r\n\r\n";
    let req = parse(raw).expect("request parses");
    assert_eq!(req.headers().len(), 1);
    assert!(!req.headers().contains("no-space"));
    assert!(!req.headers().contains("bad name"));
}

#[test]
fn header_value_keeps_inner_colons_and_drops_trailing_space() {
    let raw = "GET / HTTP/1.1\r\nOrigin: http://a.test:81  \r\n\r\n";
    let req = parse(raw).expect("request parses");
    assert_eq!(req.header("origin"), Some("http://a.test:81"));
}

#[test]
fn repeated_header_keeps_last_value() {
    let raw = "GET / HTTP/1.1\r\nX-Test: one\r\nx-test: two\r\n\r\n";
    let req = parse(raw).expect("request parses");
    assert_eq!(req.header("X-Test"), Some("two"));
    assert_eq!(req.headers().len(), 1);
}

#[test]
fn query_last_value_wins_and_bare_key_is_empty() {
    let req = parse("GET /chat?room=1&room=2&flag HTTP/1.1\r\n\r\n").expect("request parses");
    assert_eq!(req.query_param("room"), Some("2"));
    assert_eq!(req.query_param("flag"), Some(""));
    assert_eq!(req.query().len(), 2);
}

#[rstest]
#[case("a=b=c", "a", "b=c")]
#[case("name=J%20Doe", "name", "J%20Doe")]
#[case("&&x=1&", "x", "1")]
fn query_values_are_literal(#[case] raw: &str, #[case] key: &str, #[case] value: &str) {
    let query = parse_query(raw);
    assert_eq!(query.get(key).map(String::as_str), Some(value));
    assert_eq!(query.len(), 1);
}

#[test]
fn uri_without_query_has_empty_parameters() {
    let req = parse("GET /plain HTTP/1.1\r\n\r\n").expect("request parses");
    assert_eq!(req.path(), "/plain");
    assert!(req.query().is_empty());
}

#[test]
fn cookie_pairs_are_split_on_first_equals() {
    let cookies = CookieSet::parse("a=1; b=2; token=x=y");
    assert_eq!(cookies.get("a"), Some("1"));
    assert_eq!(cookies.get("b"), Some("2"));
    assert_eq!(cookies.get("token"), Some("x=y"));
    assert_eq!(cookies.len(), 3);
}

#[test]
fn cookie_without_equals_has_empty_value() {
    let cookies = CookieSet::parse("a=1; b");
    assert_eq!(cookies.get("a"), Some("1"));
    assert_eq!(cookies.get("b"), Some(""));
}

#[test]
fn empty_cookie_header_is_empty_set() {
    assert!(CookieSet::parse("").is_empty());
}

proptest! {
    #[test]
    fn cookie_parsing_never_panics(header in ".*") {
        let _cookies = CookieSet::parse(&header);
    }

    #[test]
    fn query_keeps_last_duplicate(key in "[a-z]{1,8}", first in "[a-z0-9]{0,8}", last in "[a-z0-9]{0,8}") {
        let query = parse_query(&format!("{key}={first}&{key}={last}"));
        prop_assert_eq!(query.get(&key), Some(&last));
    }
}

#[tokio::test]
async fn read_head_stops_at_blank_line() {
    let (mut client, server) = tokio::io::duplex(1024);
    client
        .write_all(b"GET / HTTP/1.1\r\nHost: a\r\n\r\nleftover")
        .await
        .expect("write head");
    let mut reader = BufReader::new(server);
    let head = read_head(&mut reader, 1024, Duration::from_secs(1))
        .await
        .expect("head read");
    assert_eq!(head, "GET / HTTP/1.1\r\nHost: a\r\n\r\n");
}

#[tokio::test]
async fn read_head_keeps_latin1_cookie() {
    let (mut client, server) = tokio::io::duplex(1024);
    client
        .write_all(b"GET / HTTP/1.1\r\nCookie: name=Jos\xe9\r\n\r\n")
        .await
        .expect("write head");
    let mut reader = BufReader::new(server);
    let head = read_head(&mut reader, 1024, Duration::from_secs(1))
        .await
        .expect("head read");
    let req = parse(&head).expect("request parses");
    assert_eq!(req.header("cookie"), Some("name=Jos\u{fffd}"));
}

#[tokio::test]
async fn read_head_rejects_oversized_head() {
    let (mut client, server) = tokio::io::duplex(1024);
    client
        .write_all(b"GET / HTTP/1.1\r\nX-Long: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n\r\n")
        .await
        .expect("write head");
    let mut reader = BufReader::new(server);
    let result = read_head(&mut reader, 32, Duration::from_secs(1)).await;
    assert!(matches!(result, Err(RequestError::HeadTooLarge(32))));
}

#[tokio::test]
async fn read_head_reports_premature_close() {
    let (mut client, server) = tokio::io::duplex(1024);
    client
        .write_all(b"GET / HTTP/1.1\r\nHost")
        .await
        .expect("write head");
    drop(client);
    let mut reader = BufReader::new(server);
    let result = read_head(&mut reader, 1024, Duration::from_secs(1)).await;
    assert!(matches!(result, Err(RequestError::Closed)));
}

#[tokio::test]
async fn read_head_times_out_on_silent_client() {
    let (_client, server) = tokio::io::duplex(1024);
    let mut reader = BufReader::new(server);
    let result = read_head(&mut reader, 1024, Duration::from_millis(20)).await;
    assert!(matches!(result, Err(RequestError::Timeout)));
}
