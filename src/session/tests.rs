//! Tests for session stores and the resolver.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rstest::rstest;
use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::{
    auth::{AnonymousAuthenticator, AuthContext, AuthError, ClientData},
    connection::{PeerInfo, ResourceId},
    request::parse,
};

fn record(pairs: &[(&str, serde_json::Value)]) -> SessionRecord {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.clone()))
        .collect()
}

fn settings(dir: &Path) -> SessionSettings {
    SessionSettings {
        save_path: dir.to_path_buf(),
        ..SessionSettings::default()
    }
}

fn peer() -> PeerInfo { PeerInfo::new(ResourceId::new(1), None) }

#[rstest]
#[case("abc123", true)]
#[case("a-b,c", true)]
#[case("", false)]
#[case("../etc/passwd", false)]
#[case("abc/def", false)]
#[case("abc def", false)]
fn session_id_charset(#[case] id: &str, #[case] valid: bool) {
    assert_eq!(is_valid_session_id(id), valid);
}

#[test]
fn file_path_joins_prefix_and_id() {
    assert_eq!(
        session_file_path(Path::new("/tmp/s"), "sess_", "abc"),
        PathBuf::from("/tmp/s/sess_abc")
    );
}

#[tokio::test]
async fn file_store_round_trips_records() {
    let dir = TempDir::new().expect("temp dir");
    let store = FileSessionStore::new();
    let data = record(&[("user", json!("alice")), ("visits", json!(3))]);

    store
        .save("abc123", dir.path(), "sess_", &data)
        .await
        .expect("save");
    assert!(dir.path().join("sess_abc123").exists());
    let loaded = store
        .load("abc123", dir.path(), "sess_")
        .await
        .expect("load");
    assert_eq!(loaded, data);
}

#[tokio::test]
async fn file_store_reports_missing_file() {
    let dir = TempDir::new().expect("temp dir");
    let result = FileSessionStore::new()
        .load("nope", dir.path(), "sess_")
        .await;
    assert!(matches!(result, Err(SessionError::NotFound(path)) if path.ends_with("sess_nope")));
}

#[tokio::test]
async fn file_store_treats_blank_file_as_empty_session() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("sess_blank"), "\n").expect("write blank");
    let loaded = FileSessionStore::new()
        .load("blank", dir.path(), "sess_")
        .await
        .expect("load");
    assert!(loaded.is_empty());
}

#[tokio::test]
async fn file_store_rejects_malformed_json() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("sess_bad"), "user|s:5:\"alice\";").expect("write");
    let result = FileSessionStore::new()
        .load("bad", dir.path(), "sess_")
        .await;
    assert!(matches!(result, Err(SessionError::Decode(_))));
}

#[tokio::test]
async fn file_store_refuses_traversal() {
    let dir = TempDir::new().expect("temp dir");
    let result = FileSessionStore::new()
        .load("../../etc/passwd", dir.path(), "sess_")
        .await;
    assert!(matches!(result, Err(SessionError::InvalidId(_))));
}

#[tokio::test]
async fn memory_store_separates_prefixes() {
    let store = MemorySessionStore::new();
    let dir = Path::new("/sessions");
    store.insert("id", dir, "a_", record(&[("k", json!(1))]));
    assert!(store.load("id", dir, "a_").await.is_ok());
    assert!(matches!(
        store.load("id", dir, "b_").await,
        Err(SessionError::NotFound(_))
    ));
}

#[tokio::test]
async fn resolver_skips_store_without_cookie_header() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let auth = move |_: &AuthContext<'_>| -> Result<ClientData, AuthError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(ClientData::new())
    };
    let resolver = SessionResolver::new(Arc::new(MemorySessionStore::new()), Arc::new(auth));
    let request = parse("GET / HTTP/1.1\r\nHost: a\r\n\r\n").expect("request");

    let resolution = resolver
        .resolve(&request, &SessionSettings::default(), &peer())
        .await
        .expect("resolves");
    assert_eq!(resolution, Resolution::default());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn resolver_keeps_cookies_without_session_cookie() {
    let resolver = SessionResolver::new(
        Arc::new(MemorySessionStore::new()),
        Arc::new(AnonymousAuthenticator),
    );
    let request = parse("GET / HTTP/1.1\r\nCookie: a=1; b\r\n\r\n").expect("request");

    let resolution = resolver
        .resolve(&request, &SessionSettings::default(), &peer())
        .await
        .expect("resolves");
    assert_eq!(resolution.session_id, "");
    assert_eq!(resolution.cookies.get("a"), Some("1"));
    assert_eq!(resolution.cookies.get("b"), Some(""));
}

#[tokio::test]
async fn resolver_reads_file_backed_session() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("sess_s1"), r#"{"user":"bob"}"#).expect("write");
    let auth = |ctx: &AuthContext<'_>| -> Result<ClientData, AuthError> {
        let mut data = ClientData::new();
        data.insert("sid".to_owned(), json!(ctx.session_id));
        data.insert("user".to_owned(), ctx.session.get("user").cloned().unwrap_or_default());
        Ok(data)
    };
    let resolver = SessionResolver::new(Arc::new(FileSessionStore::new()), Arc::new(auth));
    let request = parse("GET / HTTP/1.1\r\nCookie: PHPSESSID=s1\r\n\r\n").expect("request");

    let resolution = resolver
        .resolve(&request, &settings(dir.path()), &peer())
        .await
        .expect("resolves");
    assert_eq!(resolution.session_id, "s1");
    assert_eq!(resolution.record.get("user"), Some(&json!("bob")));
    assert_eq!(resolution.client_data.get("sid"), Some(&json!("s1")));
    assert_eq!(resolution.client_data.get("user"), Some(&json!("bob")));
}

#[tokio::test]
async fn resolver_treats_invalid_id_as_empty_session() {
    let dir = TempDir::new().expect("temp dir");
    let resolver = SessionResolver::new(
        Arc::new(FileSessionStore::new()),
        Arc::new(AnonymousAuthenticator),
    );
    let request =
        parse("GET / HTTP/1.1\r\nCookie: PHPSESSID=../secret\r\n\r\n").expect("request");

    let resolution = resolver
        .resolve(&request, &settings(dir.path()), &peer())
        .await
        .expect("resolves");
    assert_eq!(resolution.session_id, "../secret");
    assert!(resolution.record.is_empty());
}

#[test]
fn context_setters_chain() {
    let mut ctx = SessionContext::new(SessionSettings::default());
    ctx.set_cookie_name("SID")
        .set_file_prefix("s_")
        .set_save_path("/srv/sessions")
        .set_username("carol");
    assert_eq!(ctx.cookie_name(), "SID");
    assert_eq!(ctx.file_prefix(), "s_");
    assert_eq!(ctx.save_path(), Path::new("/srv/sessions"));
    assert_eq!(ctx.username(), "carol");
    assert!(ctx.is_anonymous());
}
