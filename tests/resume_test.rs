//! Resumability tests
//!
//! A key recorded in the processed log must never be mapped or emitted
//! again, whether the log was seeded by an earlier run or by an operator.

use mockito::{Matcher, Server, ServerGuard};
use porter::config::{
    secret_string, ApplicationConfig, Deployment, ExportConfig, JiraConfig, LoggingConfig,
    PorterConfig, RetryConfig, StateConfig,
};
use porter::core::export::ExportCoordinator;
use serde_json::json;
use tempfile::TempDir;

fn test_config(server: &ServerGuard, dir: &TempDir) -> PorterConfig {
    PorterConfig {
        application: ApplicationConfig {
            log_level: "info".to_string(),
            dry_run: false,
        },
        jira: JiraConfig {
            base_url: server.url(),
            deployment: Deployment::Cloud,
            email: Some("bot@acme.example".to_string()),
            api_token: Some(secret_string("token".to_string())),
            username: None,
            password: None,
            timeout_seconds: 5,
            retry: RetryConfig {
                max_retries: 1,
                ..RetryConfig::default()
            },
        },
        directory: None,
        export: ExportConfig {
            project_key: "PROJ".to_string(),
            jql: None,
            page_size: 100,
            workers: 2,
            max_batch_bytes: 7 * 1024 * 1024,
            output_dir: dir.path().join("export").to_string_lossy().to_string(),
            placeholder_account_id: "712020:placeholder".to_string(),
            exempt_groups: vec![],
        },
        state: StateConfig {
            dir: dir.path().join("state").to_string_lossy().to_string(),
        },
        logging: LoggingConfig::default(),
    }
}

async fn mock_fixtures(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    vec![
        server
            .mock("GET", "/rest/api/2/project/PROJ")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"name": "Project", "key": "PROJ"}).to_string())
            .create_async()
            .await,
        server
            .mock("GET", "/rest/api/2/field")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await,
        server
            .mock("GET", "/rest/api/2/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "issues": [{"key": "P-1"}],
                    "total": 1,
                    "startAt": 0,
                    "maxResults": 100
                })
                .to_string(),
            )
            .create_async()
            .await,
        server
            .mock("GET", "/rest/api/2/issue/P-1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "key": "P-1",
                    "fields": {
                        "summary": "First",
                        "status": {"name": "Open"},
                        "issuetype": {"name": "Bug"}
                    }
                })
                .to_string(),
            )
            .create_async()
            .await,
    ]
}

/// A seeded processed log makes the only search hit a no-op.
#[tokio::test]
async fn test_seeded_processed_log_skips_issue() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _mocks = mock_fixtures(&mut server).await;

    let config = test_config(&server, &dir);
    let state_dir = config.state.dir.clone();
    std::fs::create_dir_all(&state_dir).unwrap();
    std::fs::write(
        std::path::Path::new(&state_dir).join("processed_issues.txt"),
        "P-1\n",
    )
    .unwrap();

    let coordinator = ExportCoordinator::new(config).unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.total_issues, 1);
    assert_eq!(summary.mapped_issues, 0);
    assert_eq!(summary.skipped_issues, 1);
    assert_eq!(summary.batches_written, 0);
}

/// Re-running against the same state directory produces zero new mapped
/// issues and zero new bundles.
#[tokio::test]
async fn test_second_run_is_idempotent() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();
    let _mocks = mock_fixtures(&mut server).await;

    let first = ExportCoordinator::new(test_config(&server, &dir)).unwrap();
    let summary = first.execute_export().await.unwrap();
    assert_eq!(summary.mapped_issues, 1);
    assert_eq!(summary.batches_written, 1);

    let output_dir = dir.path().join("export");
    let bundles_after_first = std::fs::read_dir(&output_dir).unwrap().count();
    assert_eq!(bundles_after_first, 1);

    let second = ExportCoordinator::new(test_config(&server, &dir)).unwrap();
    let summary = second.execute_export().await.unwrap();
    assert_eq!(summary.mapped_issues, 0);
    assert_eq!(summary.skipped_issues, 1);
    assert_eq!(summary.batches_written, 0);

    // The first run's bundle is untouched
    let bundles_after_second = std::fs::read_dir(&output_dir).unwrap().count();
    assert_eq!(bundles_after_second, 1);
}

/// Concurrent submission of the same key maps it exactly once.
#[tokio::test]
async fn test_duplicate_search_hits_map_once() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let _project = server
        .mock("GET", "/rest/api/2/project/PROJ")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"name": "Project", "key": "PROJ"}).to_string())
        .create_async()
        .await;
    let _fields = server
        .mock("GET", "/rest/api/2/field")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;
    // The same key appears twice in the search result; the total of 2 makes
    // the coordinator fetch (and submit) it twice.
    let _search = server
        .mock("GET", "/rest/api/2/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "issues": [{"key": "P-1"}, {"key": "P-1"}],
                "total": 2,
                "startAt": 0,
                "maxResults": 100
            })
            .to_string(),
        )
        .create_async()
        .await;
    let _issue = server
        .mock("GET", "/rest/api/2/issue/P-1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "key": "P-1",
                "fields": {
                    "summary": "First",
                    "status": {"name": "Open"},
                    "issuetype": {"name": "Bug"}
                }
            })
            .to_string(),
        )
        .create_async()
        .await;

    let coordinator = ExportCoordinator::new(test_config(&server, &dir)).unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.total_issues, 2);
    assert_eq!(summary.mapped_issues, 1);
    assert_eq!(summary.skipped_issues, 1);
    assert_eq!(summary.failed_issues, 0);
}
