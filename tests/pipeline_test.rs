//! End-to-end pipeline tests against a mock Jira server
//!
//! These drive the full coordinator: project + schema + search fetch,
//! concurrent mapping, transitive link resolution, identity anonymization,
//! batch assembly and bundle writing.

use mockito::{Matcher, Server, ServerGuard};
use porter::config::{
    secret_string, ApplicationConfig, Deployment, ExportConfig, JiraConfig, LoggingConfig,
    PorterConfig, RetryConfig, StateConfig,
};
use porter::core::export::ExportCoordinator;
use serde_json::{json, Value};
use tempfile::TempDir;

const PLACEHOLDER: &str = "712020:placeholder";

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
            workers: 4,
            max_batch_bytes: 7 * 1024 * 1024,
            output_dir: dir.path().join("export").to_string_lossy().to_string(),
            placeholder_account_id: PLACEHOLDER.to_string(),
            exempt_groups: vec!["jira-administrators".to_string()],
        },
        state: StateConfig {
            dir: dir.path().join("state").to_string_lossy().to_string(),
        },
        logging: LoggingConfig::default(),
    }
}

async fn mock_project(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/rest/api/2/project/PROJ")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "name": "Project",
                "key": "PROJ",
                "versions": [{"name": "1.0", "released": true, "releaseDate": "2024-01-01"}],
                "components": [{"name": "core"}]
            })
            .to_string(),
        )
        .create_async()
        .await
}

async fn mock_fields(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("GET", "/rest/api/2/field")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {
                    "id": "customfield_10001",
                    "name": "Severity",
                    "schema": {"custom": "com.atlassian.jira.plugin.system.customfieldtypes:select"}
                },
                {
                    "id": "customfield_10002",
                    "name": "Epic Link",
                    "schema": {"custom": "com.pyxis.greenhopper.jira:gh-epic-link"}
                }
            ])
            .to_string(),
        )
        .create_async()
        .await
}

async fn mock_search(server: &mut ServerGuard, keys: &[&str]) -> mockito::Mock {
    let issues: Vec<Value> = keys.iter().map(|k| json!({"key": k})).collect();
    server
        .mock("GET", "/rest/api/2/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "issues": issues,
                "total": keys.len(),
                "startAt": 0,
                "maxResults": 100
            })
            .to_string(),
        )
        .create_async()
        .await
}

async fn mock_issue(server: &mut ServerGuard, key: &str, body: Value) -> mockito::Mock {
    server
        .mock("GET", format!("/rest/api/2/issue/{key}").as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

fn user_groups_mock(server: &mut ServerGuard, account_id: &str, groups: &[&str]) -> mockito::Mock {
    let items: Vec<Value> = groups.iter().map(|g| json!({"name": g})).collect();
    server
        .mock("GET", "/rest/api/3/user")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("accountId".into(), account_id.into()),
            Matcher::UrlEncoded("expand".into(), "groups".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "accountId": account_id,
                "groups": {"items": items}
            })
            .to_string(),
        )
}

async fn mock_user_groups(
    server: &mut ServerGuard,
    account_id: &str,
    groups: &[&str],
) -> mockito::Mock {
    user_groups_mock(server, account_id, groups)
        .create_async()
        .await
}

/// One issue in the search result linking outward to a second issue that the
/// search never returned: both must be mapped, joined by exactly one
/// canonical edge, with authors anonymized or preserved per exemption.
#[tokio::test]
async fn test_transitive_link_pull_dedup_and_anonymization() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let _project = mock_project(&mut server).await;
    let _fields = mock_fields(&mut server).await;
    let _search = mock_search(&mut server, &["P-1"]).await;

    let user_lookup = user_groups_mock(&mut server, "user-1", &["developers"])
        .expect(1)
        .create_async()
        .await;
    let _admin_lookup = mock_user_groups(&mut server, "admin-1", &["jira-administrators"]).await;

    let _p1 = mock_issue(
        &mut server,
        "P-1",
        json!({
            "key": "P-1",
            "fields": {
                "summary": "First",
                "description": "first issue",
                "status": {"name": "Open"},
                "issuetype": {"name": "Bug"},
                "priority": {"name": "High"},
                "reporter": {"accountId": "user-1"},
                "assignee": {"accountId": "user-1"},
                "labels": ["backend"],
                "created": "2024-01-15T10:30:00.000+0000",
                "updated": "2024-01-16T08:00:00.000+0000",
                "customfield_10001": {"value": "Critical"},
                "comment": {"comments": [
                    {"body": "a comment", "author": {"accountId": "user-1"}, "created": "2024-01-15T11:00:00.000+0000"}
                ]},
                "issuelinks": [{
                    "type": {"name": "Blocks"},
                    "outwardIssue": {"key": "P-2"}
                }]
            }
        }),
    )
    .await;

    // P-2 carries the reciprocal inward descriptor; it must collapse into
    // the same edge.
    let _p2 = mock_issue(
        &mut server,
        "P-2",
        json!({
            "key": "P-2",
            "fields": {
                "summary": "Second",
                "status": {"name": "Done"},
                "issuetype": {"name": "Task"},
                "reporter": {"accountId": "admin-1"},
                "resolution": {"name": "Fixed"},
                "issuelinks": [{
                    "type": {"name": "Blocks"},
                    "inwardIssue": {"key": "P-1"}
                }]
            }
        }),
    )
    .await;

    let config = test_config(&server, &dir);
    let output_dir = config.export.output_dir.clone();
    let state_dir = config.state.dir.clone();

    let coordinator = ExportCoordinator::new(config).unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.total_issues, 1);
    assert_eq!(summary.mapped_issues, 2);
    assert_eq!(summary.failed_issues, 0);
    assert_eq!(summary.link_edges, 1);
    assert_eq!(summary.batches_written, 1);
    assert!(summary.is_successful());

    // The cached exemption answer is reused for reporter, assignee and
    // comment author
    user_lookup.assert_async().await;

    let bundle_path = std::path::Path::new(&output_dir).join("jira_export_PROJ_batch_1.json");
    let bundle: Value = serde_json::from_str(&std::fs::read_to_string(bundle_path).unwrap()).unwrap();

    assert_eq!(bundle["projects"][0]["key"], "PROJ");
    assert_eq!(bundle["projects"][0]["components"][0], "core");

    let issues = bundle["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);

    let p1 = issues.iter().find(|i| i["key"] == "P-1").unwrap();
    let p2 = issues.iter().find(|i| i["key"] == "P-2").unwrap();

    // Identifier assignment: P-1 claimed first, P-2 discovered through it
    assert_eq!(p1["externalId"], "1");
    assert_eq!(p2["externalId"], "2");

    // Non-exempt authors anonymized on every author field
    assert_eq!(p1["reporter"], PLACEHOLDER);
    assert_eq!(p1["assignee"], PLACEHOLDER);
    assert_eq!(p1["comments"][0]["author"], PLACEHOLDER);
    // Exempt Cloud reporter keeps the accountId
    assert_eq!(p2["reporter"], "admin-1");

    // Allowed custom field captured with its option wrapper unwrapped
    assert_eq!(p1["customFieldValues"][0]["fieldName"], "Severity");
    assert_eq!(p1["customFieldValues"][0]["value"], "Critical");

    // Exactly one canonical edge despite both descriptors
    let links = bundle["links"].as_array().unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0]["name"], "Blocks");
    assert_eq!(links[0]["sourceId"], "1");
    assert_eq!(links[0]["destinationId"], "2");

    // Both keys finalized durably; exemption answers cached durably
    let processed =
        std::fs::read_to_string(std::path::Path::new(&state_dir).join("processed_issues.txt"))
            .unwrap();
    assert!(processed.contains("P-1"));
    assert!(processed.contains("P-2"));

    let identity_cache =
        std::fs::read_to_string(std::path::Path::new(&state_dir).join("identity_cache.txt"))
            .unwrap();
    assert!(identity_cache.contains("user-1,False"));
    assert!(identity_cache.contains("admin-1,True"));
}

/// A failing user lookup must anonymize, not abort the run.
#[tokio::test]
async fn test_user_lookup_failure_fails_closed() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let _project = mock_project(&mut server).await;
    let _fields = mock_fields(&mut server).await;
    let _search = mock_search(&mut server, &["P-1"]).await;

    let _user_lookup = server
        .mock("GET", "/rest/api/3/user")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let _p1 = mock_issue(
        &mut server,
        "P-1",
        json!({
            "key": "P-1",
            "fields": {
                "summary": "First",
                "status": {"name": "Open"},
                "issuetype": {"name": "Bug"},
                "reporter": {"accountId": "user-1"}
            }
        }),
    )
    .await;

    let config = test_config(&server, &dir);
    let output_dir = config.export.output_dir.clone();

    let coordinator = ExportCoordinator::new(config).unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.mapped_issues, 1);
    assert_eq!(summary.failed_issues, 0);

    let bundle_path = std::path::Path::new(&output_dir).join("jira_export_PROJ_batch_1.json");
    let bundle: Value = serde_json::from_str(&std::fs::read_to_string(bundle_path).unwrap()).unwrap();
    assert_eq!(bundle["issues"][0]["reporter"], PLACEHOLDER);
}

/// An unreachable project endpoint is the one fatal condition.
#[tokio::test]
async fn test_missing_project_exits_early() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let _project = server
        .mock("GET", "/rest/api/2/project/PROJ")
        .with_status(404)
        .with_body("{}")
        .create_async()
        .await;

    let coordinator = ExportCoordinator::new(test_config(&server, &dir)).unwrap();
    let result = coordinator.execute_export().await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("PROJ"), "unexpected error: {err}");
}

/// A link target that cannot be fetched loses its edge but not the run.
#[tokio::test]
async fn test_unfetchable_link_target_drops_edge_only() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let _project = mock_project(&mut server).await;
    let _fields = mock_fields(&mut server).await;
    let _search = mock_search(&mut server, &["P-1"]).await;
    let _user = mock_user_groups(&mut server, "user-1", &[]).await;

    let _p1 = mock_issue(
        &mut server,
        "P-1",
        json!({
            "key": "P-1",
            "fields": {
                "summary": "First",
                "status": {"name": "Open"},
                "issuetype": {"name": "Bug"},
                "issuelinks": [{
                    "type": {"name": "Blocks"},
                    "outwardIssue": {"key": "P-404"}
                }]
            }
        }),
    )
    .await;

    let _p404 = server
        .mock("GET", "/rest/api/2/issue/P-404")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body("{}")
        .create_async()
        .await;

    let coordinator = ExportCoordinator::new(test_config(&server, &dir)).unwrap();
    let summary = coordinator.execute_export().await.unwrap();

    assert_eq!(summary.mapped_issues, 1);
    assert_eq!(summary.link_edges, 0);
    assert_eq!(summary.failed_issues, 0);
}
