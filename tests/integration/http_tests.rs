//! End-to-end crawls over HTTP
//!
//! These tests use wiremock to create mock HTTP servers and run
//! [`run_crawl`] with the real fetcher, parser, and sinks.

use weir::config::{Config, CrawlerConfig, SeedEntry, StoreBackend, StoreConfig, UserAgentConfig};
use weir::crawler::run_crawl;
use weir::sink::{SqliteSink, DATABASE_FILE};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration storing into `location`
fn create_test_config(seed: &str, location: &str, backend: StoreBackend) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth: 2,
            worker_count: 3,
            queue_capacity: 8,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
        },
        store: StoreConfig {
            location: location.to_string(),
            backend,
        },
        seeds: vec![SeedEntry {
            url: seed.to_string(),
            origin: None,
        }],
    }
}

fn html_response(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Mounts a small site: a home page, two articles, an image, and a dead link
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact)",
        ))
        .respond_with(html_response(
            r#"<html><head><title>Home</title></head><body>
            <a href="/one">One</a>
            <a href="/two?utm_source=home">Two</a>
            <a href="/logo.png">Logo</a>
            <a href="/gone">Gone</a>
            <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/one"))
        .respond_with(html_response(
            r#"<html><head><title>Article One</title></head><body>
            <a href="/">Home</a>
            <a href="/deep">Too deep</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/two"))
        .respond_with(html_response(
            "<html><head><title>Article Two</title></head><body></body></html>",
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47])
                .insert_header("content-type", "image/png"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/deep"))
        .respond_with(html_response(
            "<html><head><title>Deep</title></head></html>",
        ))
        .expect(0)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_into_files() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let location = dir.path().join("pages");
    let config = create_test_config(
        &format!("{}/", server.uri()),
        &location.to_string_lossy(),
        StoreBackend::Files,
    );

    let summary = run_crawl(config).await.expect("crawl should succeed");

    assert!(!summary.stopped);
    assert_eq!(summary.persisted, 3);
    assert_eq!(summary.fetch_failed, 2);
    assert_eq!(summary.discarded_too_deep, 1);

    let home = std::fs::read_to_string(location.join("Home.html")).unwrap();
    assert!(home.contains("<title>Home</title>"));
    assert!(location.join("Article_One.html").is_file());
    assert!(location.join("Article_Two.html").is_file());
}

#[tokio::test]
async fn test_full_crawl_into_sqlite() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        &format!("{}/", server.uri()),
        &dir.path().to_string_lossy(),
        StoreBackend::Sqlite,
    );

    let summary = run_crawl(config).await.expect("crawl should succeed");
    assert_eq!(summary.persisted, 3);
    assert!(dir.path().join(DATABASE_FILE).is_file());

    let store = SqliteSink::create(dir.path()).unwrap();
    assert_eq!(store.count().unwrap(), 3);

    let two = store.get("Article Two").unwrap().unwrap();
    assert_eq!(two.url, format!("{}/two", server.uri()));
    assert_eq!(two.depth, 2);
}

#[tokio::test]
async fn test_unreachable_seed_still_terminates() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(
        "http://127.0.0.1:1/",
        &dir.path().to_string_lossy(),
        StoreBackend::Files,
    );

    let summary = run_crawl(config).await.expect("crawl should succeed");

    assert_eq!(summary.fetch_failed, 1);
    assert_eq!(summary.persisted, 0);
    assert!(!summary.stopped);
}
