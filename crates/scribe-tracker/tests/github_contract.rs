use httpmock::prelude::*;
use serde_json::json;

use scribe_core::{GithubSettings, OwnerKind};
use scribe_models::{GeneratedIssue, ProjectHandle};
use scribe_tracker::{GithubTracker, IssueTracker, TrackerError};

fn tracker_for(server: &MockServer, owner_kind: OwnerKind) -> GithubTracker {
    GithubTracker::new(&GithubSettings {
        token: "ghp_test".into(),
        api_url: server.base_url(),
        owner: "acme".into(),
        repo: "widgets".into(),
        owner_kind,
        project_number: 4,
    })
    .expect("client builds")
}

fn handle() -> ProjectHandle {
    ProjectHandle {
        id: "PVT_1".into(),
        title: "Roadmap".into(),
    }
}

#[tokio::test]
async fn creates_issue_via_rest() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/widgets/issues")
            .header("authorization", "Bearer ghp_test")
            .header("accept", "application/vnd.github+json")
            .json_body_includes(
                json!({"title": "Login button unresponsive", "labels": ["bug"]}).to_string(),
            );
        then.status(201).json_body(json!({
            "number": 42,
            "url": "https://api.github.com/repos/acme/widgets/issues/42",
            "html_url": "https://github.com/acme/widgets/issues/42",
            "title": "Login button unresponsive"
        }));
    });

    let issue = GeneratedIssue::new(
        "Login button unresponsive",
        "Clicking the login button on Safari does nothing at all.",
        vec!["bug".into()],
    );
    let created = tracker_for(&server, OwnerKind::Organization)
        .create_issue(&issue)
        .await
        .expect("issue created");

    mock.assert();
    assert_eq!(created.number, 42);
    assert_eq!(created.url, "https://github.com/acme/widgets/issues/42");
}

#[tokio::test]
async fn create_issue_surfaces_api_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/repos/acme/widgets/issues");
        then.status(410).body("Issues are disabled for this repo");
    });

    let issue = GeneratedIssue::new("A title long enough", "b".repeat(40), vec![]);
    let err = tracker_for(&server, OwnerKind::Organization)
        .create_issue(&issue)
        .await
        .expect_err("creation fails");
    assert!(matches!(err, TrackerError::Api { status: 410, .. }));
}

#[tokio::test]
async fn resolves_user_project() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_includes("user(login: $owner)")
            .json_body_includes(json!({"variables": {"owner": "acme", "number": 4}}).to_string());
        then.status(200).json_body(json!({
            "data": {"owner": {"projectV2": {"id": "PVT_1", "title": "Roadmap"}}}
        }));
    });

    let project = tracker_for(&server, OwnerKind::User)
        .project(4)
        .await
        .expect("project resolves");
    mock.assert();
    assert_eq!(project, handle());
}

#[tokio::test]
async fn missing_project_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200)
            .json_body(json!({"data": {"owner": {"projectV2": null}}}));
    });

    let err = tracker_for(&server, OwnerKind::Organization)
        .project(9)
        .await
        .expect_err("no project");
    assert!(matches!(err, TrackerError::ProjectNotFound { number: 9, .. }));
}

#[tokio::test]
async fn graphql_errors_are_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200).json_body(json!({
            "data": null,
            "errors": [{"message": "Could not resolve to an Organization"}]
        }));
    });

    let err = tracker_for(&server, OwnerKind::Organization)
        .project(4)
        .await
        .expect_err("query fails");
    match err {
        TrackerError::GraphQl(msg) => assert!(msg.contains("Could not resolve")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn fetches_status_field() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql").body_includes("ProjectV2SingleSelectField");
        then.status(200).json_body(json!({
            "data": {"node": {"field": {
                "id": "PVTSSF_1",
                "name": "Status",
                "options": [
                    {"id": "o1", "name": "Backlog"},
                    {"id": "o2", "name": "In Progress"},
                    {"id": "o3", "name": "Done"}
                ]
            }}}
        }));
    });

    let field = tracker_for(&server, OwnerKind::Organization)
        .status_field(&handle())
        .await
        .expect("field fetched");
    assert_eq!(field.options.len(), 3);
    assert_eq!(field.option_named("done").map(|o| o.id.as_str()), Some("o3"));
}

#[tokio::test]
async fn non_select_status_field_is_missing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/graphql");
        then.status(200)
            .json_body(json!({"data": {"node": {"field": {}}}}));
    });

    let err = tracker_for(&server, OwnerKind::Organization)
        .status_field(&handle())
        .await
        .expect_err("no select field");
    assert!(matches!(err, TrackerError::MissingStatusField));
}

#[tokio::test]
async fn fetches_items_skipping_non_issues() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .json_body_includes(json!({"variables": {"project": "PVT_1", "first": 100}}).to_string());
        then.status(200).json_body(json!({
            "data": {"node": {"items": {"nodes": [
                {
                    "id": "PVTI_1",
                    "fieldValueByName": {"optionId": "o2", "name": "In Progress"},
                    "content": {
                        "number": 7, "title": "Slow search", "body": "Takes 9s",
                        "url": "https://github.com/acme/widgets/issues/7",
                        "assignees": {"nodes": [{"login": "octocat"}]}
                    }
                },
                {"id": "PVTI_2", "fieldValueByName": null, "content": {}}
            ]}}}
        }));
    });

    let items = tracker_for(&server, OwnerKind::Organization)
        .project_items(&handle(), 500)
        .await
        .expect("items fetched");
    mock.assert();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].content.number, 7);
    assert!(items[0].is_assigned_to("OctoCat"));
}
