#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Crawls small sites served by wiremock

use ragchat::crawler::{CrawlerConfig, crawl};
use ragchat::documents::Document;
use std::collections::HashMap;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config() -> CrawlerConfig {
    CrawlerConfig {
        user_agent: "ragchat-integration".to_string(),
        timeout_seconds: 5,
        rate_limit_ms: 0,
        max_pages: Some(100),
    }
}

async fn mount_page(server: &MockServer, page: &str, links: &[&str]) {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">{}</a> "#, link, link))
        .collect();
    let body = format!(
        "<html><body><h1>Page {}</h1>{}</body></html>",
        page.trim_start_matches('/'),
        anchors
    );

    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

async fn run(seed: String, filter: Option<String>) -> Vec<Document> {
    tokio::task::spawn_blocking(move || {
        crawl(&seed, filter.as_deref(), &config())
            .expect("seed should be valid")
            .collect()
    })
    .await
    .expect("crawl should not panic")
}

fn visits(documents: &[Document]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for document in documents {
        *counts.entry(document.origin().to_string()).or_insert(0) += 1;
    }
    counts
}

#[tokio::test(flavor = "multi_thread")]
async fn three_page_site_is_visited_once_per_page() {
    for order in [["/b", "/c"], ["/c", "/b"]] {
        let server = MockServer::start().await;
        mount_page(&server, "/a", &order).await;
        mount_page(&server, "/b", &["/c", "/a#top"]).await;
        mount_page(&server, "/c", &["/a?utm=1"]).await;

        let documents = run(format!("{}/a", server.uri()), None).await;
        let counts = visits(&documents);

        assert_eq!(counts.len(), 3, "visited: {:?}", counts);
        assert!(counts.values().all(|count| *count == 1));
        for page in ["/a", "/b", "/c"] {
            assert!(counts.contains_key(&format!("{}{}", server.uri(), page)));
        }
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn filter_domain_replaces_seed_host() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &["/next"]).await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>next</p>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    // The seed is still fetched, but no link matches the filter host
    let documents = run(server.uri(), Some("docs.example.com".to_string())).await;

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].metadata.section.as_deref(), Some("homepage"));
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_redirect_keeps_relative_links_inside_it() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/guide"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/guide/", server.uri())),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/guide/", &["install", "usage"]).await;
    mount_page(&server, "/guide/install", &["../guide/usage"]).await;
    mount_page(&server, "/guide/usage", &["install"]).await;

    let documents = run(format!("{}/guide", server.uri()), None).await;
    let counts = visits(&documents);

    assert_eq!(counts.len(), 3, "visited: {:?}", counts);
    for page in ["/guide/", "/guide/install", "/guide/usage"] {
        assert_eq!(counts.get(&format!("{}{}", server.uri(), page)), Some(&1));
    }
}
