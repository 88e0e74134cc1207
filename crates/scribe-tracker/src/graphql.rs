//! GraphQL documents and response records for Projects v2.
//!
//! Records mirror the response shape; anything GitHub may omit or null out is
//! an `Option`. Conversion into the shared models happens in the client.

use serde::Deserialize;

use scribe_models::{IssueContent, ProjectHandle, ProjectItem, StatusOption};

pub(crate) const ORG_PROJECT_QUERY: &str = r#"
query($owner: String!, $number: Int!) {
  owner: organization(login: $owner) {
    projectV2(number: $number) { id title }
  }
}"#;

pub(crate) const USER_PROJECT_QUERY: &str = r#"
query($owner: String!, $number: Int!) {
  owner: user(login: $owner) {
    projectV2(number: $number) { id title }
  }
}"#;

pub(crate) const STATUS_FIELD_QUERY: &str = r#"
query($project: ID!) {
  node(id: $project) {
    ... on ProjectV2 {
      field(name: "Status") {
        ... on ProjectV2SingleSelectField { id name options { id name } }
      }
    }
  }
}"#;

pub(crate) const ITEMS_QUERY: &str = r#"
query($project: ID!, $first: Int!) {
  node(id: $project) {
    ... on ProjectV2 {
      items(first: $first) {
        nodes {
          id
          fieldValueByName(name: "Status") {
            ... on ProjectV2ItemFieldSingleSelectValue { optionId name }
          }
          content {
            ... on Issue {
              number
              title
              body
              url
              assignees(first: 10) { nodes { login } }
            }
          }
        }
      }
    }
  }
}"#;

/// Envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OwnerData {
    pub owner: Option<ProjectOwner>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectOwner {
    pub project_v2: Option<ProjectHandle>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NodeData<T> {
    pub node: Option<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldNode {
    pub field: Option<RawField>,
}

/// A field fragment; non single-select fields come back as an empty object.
#[derive(Debug, Deserialize)]
pub(crate) struct RawField {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<StatusOption>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemsNode {
    pub items: Connection<RawItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawItem {
    pub id: String,
    pub field_value_by_name: Option<RawStatusValue>,
    pub content: Option<RawContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawStatusValue {
    pub option_id: Option<String>,
    pub name: Option<String>,
}

/// Issue fragment; pull requests and drafts come back without these fields.
#[derive(Debug, Deserialize)]
pub(crate) struct RawContent {
    pub number: Option<u64>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
    pub assignees: Option<Connection<Login>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Login {
    pub login: String,
}

impl RawItem {
    /// Convert into a board item; `None` when the item is not an issue.
    pub fn into_item(self) -> Option<ProjectItem> {
        let content = self.content?;
        let assignees = content
            .assignees
            .map(|c| c.nodes.into_iter().flatten().map(|l| l.login).collect())
            .unwrap_or_default();

        let status = self.field_value_by_name.and_then(|value| {
            match (value.option_id, value.name) {
                (Some(id), Some(name)) => Some(StatusOption { id, name }),
                _ => None,
            }
        });

        Some(ProjectItem {
            id: self.id,
            content: IssueContent {
                number: content.number?,
                title: content.title?,
                body: content.body.unwrap_or_default(),
                url: content.url?,
            },
            status,
            assignees,
        })
    }
}
