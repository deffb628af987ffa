//! Jira REST client
//!
//! A thin, retrying client over the Jira REST API v2 (plus the v3 user
//! endpoints on Cloud). Errors never expose the underlying HTTP crate; they
//! map onto [`JiraError`] variants so the pipeline can decide how to degrade.

use crate::config::{Deployment, DirectoryConfig, JiraConfig, RetryConfig, SecretString};
use crate::domain::{JiraError, PorterError, Result};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::models::{
    FieldSchema, ProjectDetails, RawIssue, RawProject, SearchPage, UserRef, UserWithGroups,
};

/// Client for one Jira site.
///
/// The same type serves both roles in a cross-system run: the Data Center
/// source and the Cloud directory used for account-id lookups.
pub struct JiraClient {
    base_url: String,
    deployment: Deployment,
    http: Client,
    email: Option<String>,
    api_token: Option<SecretString>,
    username: Option<String>,
    password: Option<SecretString>,
    retry: RetryConfig,
}

impl JiraClient {
    /// Create a client for the configured source Jira.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL does not parse.
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let http = build_http_client(config.timeout_seconds)?;
        Ok(Self {
            base_url: normalize_base_url(&config.base_url)?,
            deployment: config.deployment,
            http,
            email: config.email.clone(),
            api_token: config.api_token.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Create a client for the Cloud directory side of a cross-system run.
    pub fn for_directory(config: &DirectoryConfig) -> Result<Self> {
        let http = build_http_client(30)?;
        Ok(Self {
            base_url: normalize_base_url(&config.base_url)?,
            deployment: Deployment::Cloud,
            http,
            email: Some(config.email.clone()),
            api_token: Some(config.api_token.clone()),
            username: None,
            password: None,
            retry: RetryConfig::default(),
        })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one issue by key, optionally expanding nested collections
    /// (e.g. `changelog`).
    pub async fn fetch_issue(&self, key: &str, expand: Option<&str>) -> Result<RawIssue> {
        let path = format!("/rest/api/2/issue/{key}");
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(expand) = expand {
            query.push(("expand", expand.to_string()));
        }
        self.get_json(&path, &query).await
    }

    /// Run one page of a JQL search.
    pub async fn search_issues(
        &self,
        jql: &str,
        start_at: usize,
        max_results: usize,
    ) -> Result<SearchPage> {
        let query = vec![
            ("jql", jql.to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        self.get_json("/rest/api/2/search", &query).await
    }

    /// Fetch the full field schema listing.
    pub async fn fetch_custom_fields(&self) -> Result<Vec<FieldSchema>> {
        self.get_json("/rest/api/2/field", &[]).await
    }

    /// Fetch a user by their stable key, with group membership expanded.
    ///
    /// Cloud keys users by accountId, Data Center by username; the lookup
    /// endpoint differs accordingly.
    pub async fn fetch_user_with_groups(&self, user_key: &str) -> Result<UserWithGroups> {
        match self.deployment {
            Deployment::Cloud => {
                let query = vec![
                    ("accountId", user_key.to_string()),
                    ("expand", "groups".to_string()),
                ];
                self.get_json("/rest/api/3/user", &query).await
            }
            Deployment::Datacenter => {
                let query = vec![
                    ("username", user_key.to_string()),
                    ("expand", "groups".to_string()),
                ];
                self.get_json("/rest/api/2/user", &query).await
            }
        }
    }

    /// Look up a Cloud accountId by email via user search.
    ///
    /// Returns `Ok(None)` when the search succeeds but matches nobody.
    pub async fn search_account_id(&self, email: &str) -> Result<Option<String>> {
        let query = vec![("query", email.to_string())];
        let users: Vec<UserRef> = self.get_json("/rest/api/3/user/search", &query).await?;
        Ok(users.into_iter().find_map(|u| u.account_id))
    }

    /// Fetch project metadata, mapped to the bundle shape.
    pub async fn fetch_project(&self, project_key: &str) -> Result<ProjectDetails> {
        let path = format!("/rest/api/2/project/{project_key}");
        let raw: RawProject = self.get_json(&path, &[]).await?;
        Ok(raw.into())
    }

    /// Attach credentials to a request
    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match self.deployment {
            Deployment::Cloud => {
                if let (Some(email), Some(token)) = (&self.email, &self.api_token) {
                    request.basic_auth(email, Some(token.expose_secret().as_ref()))
                } else {
                    request
                }
            }
            Deployment::Datacenter => {
                if let (Some(username), Some(password)) = (&self.username, &self.password) {
                    request.basic_auth(username, Some(password.expose_secret().as_ref()))
                } else {
                    request
                }
            }
        }
    }

    /// GET a JSON resource with retry
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        self.retry_request(|| async {
            let mut request = self.http.get(&url);
            if !query.is_empty() {
                request = request.query(query);
            }
            let request = self
                .apply_auth(request)
                .header(reqwest::header::ACCEPT, "application/json");

            let resp = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    PorterError::Jira(JiraError::Timeout(e.to_string()))
                } else {
                    PorterError::Jira(JiraError::ConnectionFailed(e.to_string()))
                }
            })?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let err = match status.as_u16() {
                    401 | 403 => JiraError::AuthenticationFailed(format!("{path}: {body}")),
                    404 => JiraError::NotFound(path.to_string()),
                    s if s >= 500 => JiraError::ServerError {
                        status: s,
                        message: body,
                    },
                    s => JiraError::ClientError {
                        status: s,
                        message: body,
                    },
                };
                return Err(PorterError::Jira(err));
            }

            resp.json::<T>()
                .await
                .map_err(|e| PorterError::Jira(JiraError::InvalidResponse(e.to_string())))
        })
        .await
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries || !is_retryable(&e) {
                        return Err(e);
                    }

                    let delay_ms = self.retry.initial_delay_ms
                        * (self.retry.backoff_multiplier.powf((attempt - 1) as f64) as u64).max(1);
                    let delay_ms = delay_ms.min(self.retry.max_delay_ms);

                    tracing::warn!(
                        attempt = attempt,
                        max_retries = max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "Retrying request after error"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

/// Client errors are definitive; only transport and server-side failures
/// are worth retrying.
fn is_retryable(err: &PorterError) -> bool {
    matches!(
        err,
        PorterError::Jira(
            JiraError::ConnectionFailed(_) | JiraError::Timeout(_) | JiraError::ServerError { .. }
        )
    )
}

fn build_http_client(timeout_seconds: u64) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| PorterError::Configuration(format!("Failed to build HTTP client: {e}")))
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    Url::parse(base_url)
        .map_err(|e| PorterError::Configuration(format!("Invalid base URL '{base_url}': {e}")))?;
    Ok(base_url.trim_end_matches('/').to_string())
}
