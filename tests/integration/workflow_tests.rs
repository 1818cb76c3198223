//! Integration tests for a full giveaway run
//!
//! These tests use wiremock to stand in for the giveaway site and its listing API
//! and drive the coordinator end-to-end: sign-in, discovery and entry.

use bookdraw::config::Config;
use bookdraw::crawler::{Coordinator, DiscoveryStop};
use bookdraw::output::{read_last_run, read_records};
use bookdraw::{Credentials, GiveawayError};
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.site.base_url = server.uri();
    config.site.discovery_endpoint = format!("{}/graphql", server.uri());
    config.output.entry_log_path = log_path(dir).to_string_lossy().into_owned();
    config
}

fn log_path(dir: &TempDir) -> PathBuf {
    dir.path().join("EnteredGiveaways.txt")
}

fn credentials() -> Credentials {
    Credentials::new("reader@example.com", "hunter2")
}

/// Mounts a sign-in flow that accepts the credentials and sets a session cookie
async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/user/sign_in"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body><a href="{}/ap/signin?openid.mode=checkid_setup&amp;language=en_US">Sign in with email</a></body></html>"#,
            server.uri()
        )))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ap/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><form name="signIn" method="post" action="/ap/signin">
                <input type="hidden" name="appActionToken" value="app-1">
                <input type="email" name="email">
                <input type="password" name="password">
                <input type="submit" value="Sign in">
            </form></body></html>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/ap/signin"))
        .and(body_string_contains("appActionToken=app-1"))
        .and(body_string_contains("email=reader%40example.com"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/")
                .insert_header("set-cookie", "_session_id=s1; Path=/"),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><script>{"isSignedIn":true}</script></html>"#),
        )
        .mount(server)
        .await;
}

/// Mounts the first listing page
async fn mount_first_page(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path("/giveaway"))
        .and(header("cookie", "_session_id=s1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

fn listing_body(entry_urls: &[&str], next_page_token: &str, jwt: Option<&str>) -> String {
    let edges: Vec<String> = entry_urls
        .iter()
        .map(|url| format!(r#"{{"node":{{"details":{{"enterGiveawayUrl":"{}"}}}}}}"#, url))
        .collect();
    let jwt = jwt
        .map(|token| format!(r#","jwtToken":"{}""#, token))
        .unwrap_or_default();
    format!(
        r#"{{"data":{{"getGiveaways":{{"edges":[{}],"pageInfo":{{"nextPageToken":"{}"}}}}}}{}}}"#,
        edges.join(","),
        next_page_token,
        jwt
    )
}

/// Mounts a print giveaway that accepts the entry
async fn mount_print_giveaway(server: &MockServer, id: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/giveaway/enter_choose_address/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><head><meta name="csrf-token" content="csrf-{id}"></head>
            <body><a href="/giveaway/select_address/{id}">Select This Address</a></body></html>"#
        )))
        .expect(1)
        .mount(server)
        .await;
    mount_confirmation(server, &format!("/giveaway/select_address/{}", id), id).await;
}

/// Mounts a Kindle giveaway whose thank-you page has no details
async fn mount_kindle_giveaway(server: &MockServer, id: u32) {
    let entry_path = format!("/giveaway/enter_kindle_giveaway/{}", id);
    Mock::given(method("GET"))
        .and(path(entry_path.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><head><meta name="csrf-token" content="csrf-{id}"></head><body></body></html>"#
        )))
        .expect(1)
        .mount(server)
        .await;
    mount_confirmation(server, &entry_path, id).await;
}

async fn mount_confirmation(server: &MockServer, confirm_path: &str, id: u32) {
    Mock::given(method("POST"))
        .and(path(confirm_path))
        .and(body_string_contains(format!("authenticity_token=csrf-{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body><form name="entry_form" method="post" action="/giveaway/enter/{id}">
                <input type="hidden" name="authenticity_token" value="stale">
                <input type="checkbox" name="entry_terms" value="1">
                <input type="checkbox" name="want_to_read" value="1" checked>
                <input type="submit" name="commit" value="Enter Giveaway">
            </form></body></html>"#
        )))
        .expect(1)
        .mount(server)
        .await;

    let accepted = if confirm_path.contains("kindle") {
        "<html><body><p>You're entered!</p></body></html>".to_string()
    } else {
        format!(
            r#"<html><body><h1>Book {id} by Author {id}</h1><p>Print book</p>
            <p>5 copies available</p><p>100 people requesting</p>
            <p>Giveaway dates: Oct 10 - Nov 01, 2026</p></body></html>"#
        )
    };
    Mock::given(method("POST"))
        .and(path(format!("/giveaway/enter/{}", id)))
        .and(body_string_contains(format!("authenticity_token=csrf-{}", id)))
        .and(body_string_contains("entry_terms=1"))
        .and(body_string_contains("want_to_read=0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(accepted))
        .expect(1)
        .mount(server)
        .await;
}

/// Mounts an entry page with neither address link nor Kindle URL
async fn mount_addressless_giveaway(server: &MockServer, id: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/giveaway/enter_choose_address/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><head><meta name="csrf-token" content="csrf"></head><body>No saved address</body></html>"#,
        ))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_across_two_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_sign_in(&server).await;
    mount_first_page(
        &server,
        listing_body(
            &[
                "/giveaway/enter_choose_address/1",
                "/giveaway/enter_kindle_giveaway/2",
            ],
            "page-2",
            Some("jwt-1"),
        ),
    )
    .await;

    // Second page repeats listing 1, which must not be entered twice
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "jwt-1"))
        .and(body_string_contains(r#""nextPageToken":"page-2""#))
        .and(body_string_contains(r#""operationName":"getGiveaways""#))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_body(
            &[
                "/giveaway/enter_choose_address/3",
                "/giveaway/enter_choose_address/1",
            ],
            "",
            None,
        )))
        .expect(1)
        .mount(&server)
        .await;

    mount_print_giveaway(&server, 1).await;
    mount_kindle_giveaway(&server, 2).await;
    mount_addressless_giveaway(&server, 3).await;

    let coordinator = Coordinator::new(create_test_config(&server, &dir), credentials()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.entered, 2);
    assert_eq!(summary.abandoned, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.listings_queued, 3);
    assert_eq!(summary.discovery_stop, DiscoveryStop::Exhausted);

    let records = read_last_run(&log_path(&dir)).unwrap();
    let numbers: Vec<u64> = records.iter().map(|r| r.sequence_number).collect();
    assert_eq!(numbers, vec![1, 2]);

    let mut urls: Vec<String> = records.iter().map(|r| r.giveaway_url.clone()).collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{}/giveaway/enter/1", server.uri()),
            format!("{}/giveaway/enter/2", server.uri()),
        ]
    );
    assert_eq!(coordinator.session().bearer_token().as_deref(), Some("jwt-1"));
}

#[tokio::test]
async fn test_login_failure_stops_the_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/user/sign_in"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/ap/signin?openid.mode=checkid_setup">Sign in</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ap/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<form name="signIn" method="post"><input name="email"><input name="password"></form>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ap/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<p>There was a problem. Your password is incorrect, try again.</p>",
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/giveaway"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(create_test_config(&server, &dir), credentials()).unwrap();
    let result = coordinator.run().await;

    assert!(matches!(result, Err(GiveawayError::LoginFailed { .. })));
    assert!(!log_path(&dir).exists());
}

#[tokio::test]
async fn test_redirect_back_to_sign_in_path_fails_login() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server, &dir);
    config.site.sign_in_path = "/account/login".to_string();

    Mock::given(method("GET"))
        .and(path("/account/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/ap/signin?openid.mode=checkid_setup">Sign in</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ap/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<form name="signIn" method="post" action="/ap/verify">
                <input name="email"><input name="password">
            </form>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ap/verify"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/account/login?retry=1"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/giveaway"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(config, credentials()).unwrap();
    let result = coordinator.run().await;

    match result {
        Err(GiveawayError::LoginFailed { reason }) => {
            assert!(reason.contains("still on sign-in page"), "{}", reason);
            assert!(reason.contains("/account/login"), "{}", reason);
        }
        other => panic!("expected login failure, got {:?}", other),
    }
    assert!(!log_path(&dir).exists());
}

#[tokio::test]
async fn test_listing_api_error_lets_queued_entries_finish() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_sign_in(&server).await;
    mount_first_page(
        &server,
        listing_body(&["/giveaway/enter_choose_address/21"], "page-2", Some("jwt-1")),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_print_giveaway(&server, 21).await;

    let coordinator = Coordinator::new(create_test_config(&server, &dir), credentials()).unwrap();
    let summary = coordinator.run().await.unwrap();

    match &summary.discovery_stop {
        DiscoveryStop::FetchFailed { url, error } => {
            assert!(url.ends_with("/graphql"), "{}", url);
            assert!(error.contains("500"), "{}", error);
        }
        other => panic!("expected fetch failure, got {:?}", other),
    }
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.entered, 1);
    assert_eq!(read_last_run(&log_path(&dir)).unwrap().len(), 1);
}

#[tokio::test]
async fn test_single_page_without_token() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_sign_in(&server).await;
    mount_first_page(
        &server,
        listing_body(
            &[
                "/giveaway/enter_choose_address/10",
                "/giveaway/enter_choose_address/11",
            ],
            "",
            Some("jwt-1"),
        ),
    )
    .await;
    mount_addressless_giveaway(&server, 10).await;
    mount_addressless_giveaway(&server, 11).await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(create_test_config(&server, &dir), credentials()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.listings_queued, 2);
    assert_eq!(summary.abandoned, 2);
    assert_eq!(summary.entered, 0);
    assert_eq!(summary.discovery_stop, DiscoveryStop::Exhausted);

    // Only the banner was written
    assert!(read_records(&log_path(&dir)).unwrap().is_empty());
}

#[tokio::test]
async fn test_page_limit_stops_discovery() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_sign_in(&server).await;
    mount_first_page(&server, listing_body(&[], "page-2", Some("jwt-1"))).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, &dir);
    config.discovery.max_pages = 1;

    let coordinator = Coordinator::new(config, credentials()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(
        summary.discovery_stop,
        DiscoveryStop::PageLimitExceeded { limit: 1 }
    );
}

#[tokio::test]
async fn test_repeated_token_stops_discovery() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_sign_in(&server).await;
    mount_first_page(&server, listing_body(&[], "same", Some("jwt-1"))).await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(listing_body(&[], "same", None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(create_test_config(&server, &dir), credentials()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(
        summary.discovery_stop,
        DiscoveryStop::RepeatedToken {
            token: "same".to_string()
        }
    );
}

#[tokio::test]
async fn test_missing_bearer_token_stops_discovery() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_sign_in(&server).await;
    mount_first_page(&server, listing_body(&[], "page-2", None)).await;
    Mock::given(method("POST"))
        .and(path_regex("^/graphql"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let coordinator = Coordinator::new(create_test_config(&server, &dir), credentials()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.discovery_stop, DiscoveryStop::MissingToken);
}

#[tokio::test]
async fn test_failed_entry_does_not_stop_others() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_sign_in(&server).await;
    mount_first_page(
        &server,
        listing_body(
            &[
                "/giveaway/enter_choose_address/20",
                "/giveaway/enter_choose_address/21",
            ],
            "",
            Some("jwt-1"),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/giveaway/enter_choose_address/20"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_print_giveaway(&server, 21).await;

    let coordinator = Coordinator::new(create_test_config(&server, &dir), credentials()).unwrap();
    let summary = coordinator.run().await.unwrap();

    assert_eq!(summary.entered, 1);
    assert_eq!(summary.failed, 1);

    let records = read_last_run(&log_path(&dir)).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sequence_number, 1);
}
