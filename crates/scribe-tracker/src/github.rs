//! GitHub client: REST for issue creation, GraphQL for project boards.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use scribe_core::{GithubSettings, OwnerKind};
use scribe_models::{CreatedIssue, GeneratedIssue, ProjectHandle, ProjectItem, StatusField};

use crate::error::{Result, TrackerError};
use crate::graphql::{
    FieldNode, GraphQlResponse, ItemsNode, NodeData, OwnerData, RawItem, ITEMS_QUERY,
    ORG_PROJECT_QUERY, STATUS_FIELD_QUERY, USER_PROJECT_QUERY,
};
use crate::IssueTracker;

const API_VERSION: &str = "2022-11-28";

/// GitHub-backed [`IssueTracker`].
#[derive(Clone)]
pub struct GithubTracker {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    owner_kind: OwnerKind,
}

/// Subset of the REST issue payload we read back.
#[derive(Debug, Deserialize)]
struct RestIssue {
    number: u64,
    html_url: String,
    title: String,
}

impl GithubTracker {
    /// Build a client with auth and API headers preset.
    pub fn new(settings: &GithubSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("issue-scribe"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        let auth = HeaderValue::from_str(&format!("Bearer {}", settings.token.trim()))
            .map_err(|_| TrackerError::Http("token is not a valid header value".to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_base: settings.api_url.trim_end_matches('/').to_string(),
            owner: settings.owner.clone(),
            repo: settings.repo.clone(),
            owner_kind: settings.owner_kind,
        })
    }

    /// `owner/repo` the client files issues against.
    pub fn repository(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &str,
        variables: Value,
    ) -> Result<T> {
        trace!(operation, "GraphQL request");
        let response = self
            .http
            .post(format!("{}/graphql", self.api_base))
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Api {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| TrackerError::Decode(format!("{}: {}", operation, e)))?;

        if !envelope.errors.is_empty() {
            let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(TrackerError::GraphQl(messages.join("; ")));
        }

        envelope
            .data
            .ok_or_else(|| TrackerError::Decode(format!("{}: response has no data", operation)))
    }
}

#[async_trait]
impl IssueTracker for GithubTracker {
    async fn create_issue(&self, issue: &GeneratedIssue) -> Result<CreatedIssue> {
        let response = self
            .http
            .post(format!(
                "{}/repos/{}/{}/issues",
                self.api_base, self.owner, self.repo
            ))
            .json(&json!({
                "title": issue.title,
                "body": issue.body,
                "labels": issue.labels,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Api {
                operation: "create issue",
                status: status.as_u16(),
                body,
            });
        }

        let created: RestIssue = response
            .json()
            .await
            .map_err(|e| TrackerError::Decode(format!("create issue: {}", e)))?;

        Ok(CreatedIssue {
            number: created.number,
            url: created.html_url,
            title: created.title,
        })
    }

    async fn project(&self, number: u64) -> Result<ProjectHandle> {
        let query = match self.owner_kind {
            OwnerKind::Organization => ORG_PROJECT_QUERY,
            OwnerKind::User => USER_PROJECT_QUERY,
        };
        let data: OwnerData = self
            .graphql(
                "resolve project",
                query,
                json!({ "owner": self.owner, "number": number }),
            )
            .await?;

        let project = data
            .owner
            .and_then(|o| o.project_v2)
            .ok_or_else(|| TrackerError::ProjectNotFound {
                owner: self.owner.clone(),
                number,
            })?;
        debug!(project_id = %project.id, title = %project.title, "Project resolved");
        Ok(project)
    }

    async fn status_field(&self, project: &ProjectHandle) -> Result<StatusField> {
        let data: NodeData<FieldNode> = self
            .graphql(
                "fetch status field",
                STATUS_FIELD_QUERY,
                json!({ "project": project.id }),
            )
            .await?;

        let raw = data
            .node
            .and_then(|n| n.field)
            .ok_or(TrackerError::MissingStatusField)?;
        match (raw.id, raw.name) {
            (Some(id), Some(name)) => Ok(StatusField {
                id,
                name,
                options: raw.options,
            }),
            _ => Err(TrackerError::MissingStatusField),
        }
    }

    async fn project_items(
        &self,
        project: &ProjectHandle,
        limit: usize,
    ) -> Result<Vec<ProjectItem>> {
        let data: NodeData<ItemsNode> = self
            .graphql(
                "fetch project items",
                ITEMS_QUERY,
                json!({ "project": project.id, "first": limit.min(crate::MAX_LISTED_ITEMS) }),
            )
            .await?;

        let node = data
            .node
            .ok_or_else(|| TrackerError::Decode("project node missing".to_string()))?;
        let items: Vec<ProjectItem> = node
            .items
            .nodes
            .into_iter()
            .flatten()
            .filter_map(RawItem::into_item)
            .collect();
        debug!(count = items.len(), "Project items fetched");
        Ok(items)
    }
}
