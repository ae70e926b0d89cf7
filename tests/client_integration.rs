//! Integration tests for the Gazelle client against a mock tracker.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use gazelle::{
    ClientConfig, CookieStore, Credentials, FileCookieStore, Gazelle, GazelleError,
    MemoryCookieStore,
};
use gazelle::api::SessionCookie;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_test::assert_ok;
use wiremock::matchers::{any, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION: &str = "session=abc123";

fn browse_fixture() -> Value {
    serde_json::from_str(include_str!("fixtures/browse_sehnsucht.json")).unwrap()
}

fn success(payload: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"status": "success", "response": payload}))
}

fn credentials(server: &MockServer) -> Credentials {
    Credentials::new("user", "pass", format!("{}/", server.uri()))
}

fn fast_config() -> ClientConfig {
    ClientConfig::default().with_min_interval(Duration::from_millis(10))
}

fn client(server: &MockServer, store: Arc<dyn CookieStore>) -> Gazelle {
    Gazelle::with_store(credentials(server), fast_config(), store).expect("client should build")
}

/// Login endpoint that answers like Gazelle: a redirect carrying the cookie.
async fn mount_login(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/login.php"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "index.php")
                .insert_header("set-cookie", "session=abc123; path=/; HttpOnly"),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_logs_in_and_selects_most_seeded_edition() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(query_param("action", "browse"))
        .and(query_param("artistname", "Rammstein"))
        .and(query_param("groupname", "Sehnsucht"))
        .and(header("cookie", SESSION))
        .respond_with(success(browse_fixture()))
        .expect(1)
        .mount(&server)
        .await;

    let gazelle = client(&server, Arc::new(MemoryCookieStore::new()));
    let edition = assert_ok!(gazelle.search("Rammstein", "Sehnsucht").await);

    assert_eq!(edition.artist, "Rammstein");
    assert_eq!(edition.album, "Sehnsucht");
    assert_eq!(edition.image, "https://i.imgur.com/qVCZ90w.jpg");
    assert_eq!(edition.year, 1997);
    assert_eq!(edition.torrent_id, 42967);
    assert_eq!(edition.encoding, "320");
    assert!(gazelle.session().await.valid_at.is_some());
}

#[tokio::test]
async fn test_second_search_reuses_session() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(header("cookie", SESSION))
        .respond_with(success(browse_fixture()))
        .expect(2)
        .mount(&server)
        .await;

    let gazelle = client(&server, Arc::new(MemoryCookieStore::new()));
    gazelle.search("Rammstein", "Sehnsucht").await.unwrap();
    gazelle.search("Rammstein", "Sehnsucht").await.unwrap();
}

#[tokio::test]
async fn test_login_writes_cookie_file() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;

    let dir = TempDir::new().unwrap();
    let cookie_path = dir.path().join("cookie.json");
    let gazelle = Gazelle::with_config(
        credentials(&server),
        fast_config().with_cookie_path(&cookie_path),
    )
    .unwrap();

    assert!(!gazelle.is_logged_in());
    gazelle.api().login().await.unwrap();
    assert!(gazelle.is_logged_in());

    let stored = FileCookieStore::new(&cookie_path).load().unwrap().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "session");
    assert_eq!(stored[0].value, "abc123");
}

#[tokio::test]
async fn test_stored_cookie_is_reused_across_clients() {
    let server = MockServer::start().await;
    mount_login(&server, 0).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(header("cookie", SESSION))
        .respond_with(success(json!({"username": "user"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCookieStore::with_cookies(vec![SessionCookie::new(
        "session", "abc123",
    )]));
    let gazelle = client(&server, store);
    let payload = gazelle.action("index", &[] as &[(&str, &str)]).await.unwrap();
    assert_eq!(payload["username"], "user");
}

#[tokio::test]
async fn test_expired_session_relogs_in_once() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(header("cookie", "session=stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(header("cookie", SESSION))
        .respond_with(success(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCookieStore::with_cookies(vec![SessionCookie::new(
        "session", "stale",
    )]));
    let gazelle = client(&server, store.clone());
    let payload = gazelle.action("index", &[] as &[(&str, &str)]).await.unwrap();

    assert_eq!(payload, json!({"ok": true}));
    let stored = store.load().unwrap().unwrap();
    assert_eq!(stored[0].value, "abc123");
}

#[tokio::test]
async fn test_redirect_to_login_counts_as_expired_session() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(header("cookie", "session=stale"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "login.php"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(header("cookie", SESSION))
        .respond_with(success(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCookieStore::with_cookies(vec![SessionCookie::new(
        "session", "stale",
    )]));
    let gazelle = client(&server, store);
    gazelle.action("index", &[] as &[(&str, &str)]).await.unwrap();
}

#[tokio::test]
async fn test_persistent_rejection_is_not_retried_forever() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let gazelle = client(&server, Arc::new(MemoryCookieStore::new()));
    let err = gazelle
        .action("index", &[] as &[(&str, &str)])
        .await
        .unwrap_err();

    assert!(matches!(err, GazelleError::Authentication(_)), "got {:?}", err);
    assert!(!gazelle.is_logged_in());
}

#[tokio::test]
async fn test_login_without_cookie_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Login</html>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .respond_with(success(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let gazelle = client(&server, Arc::new(MemoryCookieStore::new()));
    let err = gazelle.search("Rammstein", "Sehnsucht").await.unwrap_err();
    assert!(matches!(err, GazelleError::Authentication(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_failure_status_becomes_api_error() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "failure", "error": "bad parameters"})),
        )
        .mount(&server)
        .await;

    let gazelle = client(&server, Arc::new(MemoryCookieStore::new()));
    let err = gazelle
        .action("browse", &[("searchstr", "x")])
        .await
        .unwrap_err();
    match err {
        GazelleError::Api(msg) => assert_eq!(msg, "bad parameters"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_search_without_match_is_not_found() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .respond_with(success(json!({"currentPage": 1, "pages": 0, "results": []})))
        .mount(&server)
        .await;

    let gazelle = client(&server, Arc::new(MemoryCookieStore::new()));
    let err = gazelle.search("Ayreon", "Into the Electric Castle").await.unwrap_err();
    assert!(matches!(err, GazelleError::NotFound(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_download_writes_file_named_from_header() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(query_param("action", "download"))
        .and(query_param("id", "42967"))
        .and(header("cookie", SESSION))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-bittorrent")
                .insert_header(
                    "content-disposition",
                    r#"attachment; filename="Rammstein - Sehnsucht - 1997 (CD - MP3 - 320)-42967.torrent""#,
                )
                .set_body_bytes(b"d8:announce4:test".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let dest = format!("{}/", dir.path().join("out").display());

    let gazelle = client(&server, Arc::new(MemoryCookieStore::new()));
    let pending = assert_ok!(gazelle.download(42967, &dest));
    let written = assert_ok!(pending.await);

    assert_eq!(
        written.file_name().unwrap().to_str().unwrap(),
        "Rammstein - Sehnsucht - 1997 (CD - MP3 - 320).torrent"
    );
    assert_eq!(std::fs::read(&written).unwrap(), b"d8:announce4:test");
}

#[tokio::test]
async fn test_download_refused_with_json_is_api_error() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .and(query_param("action", "download"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "failure", "error": "bad id parameter"})),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let dest = format!("{}/", dir.path().display());

    let gazelle = client(&server, Arc::new(MemoryCookieStore::new()));
    let err = gazelle.download(1, &dest).unwrap().await.unwrap_err();
    match err {
        GazelleError::Api(msg) => assert_eq!(msg, "bad id parameter"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_download_to_file_path_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let gazelle = client(&server, Arc::new(MemoryCookieStore::new()));
    let err = match gazelle.download(30836090, "./test/test.torrent") {
        Ok(_) => panic!("file-shaped destination should be rejected"),
        Err(e) => e,
    };

    assert!(matches!(err, GazelleError::InvalidArgument(_)));
    assert_eq!(err.to_string(), "path cannot contain a filename");
}

#[tokio::test]
async fn test_concurrent_calls_are_rate_limited() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/ajax.php"))
        .respond_with(success(json!({})))
        .expect(4)
        .mount(&server)
        .await;

    let interval = Duration::from_millis(100);
    let gazelle = Gazelle::with_store(
        credentials(&server),
        ClientConfig::default().with_min_interval(interval),
        Arc::new(MemoryCookieStore::new()),
    )
    .unwrap();

    // Login plus four calls: five request starts in total.
    let start = Instant::now();
    let calls = (0..4).map(|_| gazelle.action("browse", &[("searchstr", "sven hammond soul")]));
    for result in join_all(calls).await {
        result.unwrap();
    }

    assert!(start.elapsed() >= interval * 4, "took {:?}", start.elapsed());
}
