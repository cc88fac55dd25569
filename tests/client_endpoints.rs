//! Endpoint method tests for JiraClient.
//!
//! Uses wiremock to mock the JIRA REST API and check request shapes.

use jirapi::{
    Attr, ClientOptions, JiraClient, PaginationParams, ResourceKind, SearchQuery, TypeRegistry,
};
use serde_json::{json, Map};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> JiraClient {
    JiraClient::new(ClientOptions::new(&server.uri()).unwrap()).unwrap()
}

fn issue(server: &MockServer, id: u32, key: &str) -> serde_json::Value {
    json!({
        "self": format!("{}/rest/api/2/issue/{id}", server.uri()),
        "id": id.to_string(),
        "key": key,
        "fields": { "summary": format!("Issue {key}") }
    })
}

#[tokio::test]
async fn test_issue_passes_fields_and_expand() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/BULK-1"))
        .and(query_param("fields", "summary,status"))
        .and(query_param("expand", "changelog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue(&mock_server, 10001, "BULK-1")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let issue = client
        .issue("BULK-1", Some("summary,status"), Some("changelog"))
        .await
        .unwrap();

    assert_eq!(issue.kind(), ResourceKind::Issue);
}

#[tokio::test]
async fn test_search_issues_returns_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/search"))
        .and(query_param("jql", "project = BULK"))
        .and(query_param("startAt", "0"))
        .and(query_param("maxResults", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 0,
            "maxResults": 2,
            "total": 3,
            "issues": [issue(&mock_server, 10001, "BULK-1"), issue(&mock_server, 10002, "BULK-2")]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let mut query = SearchQuery::new("project = BULK");
    query.max_results = 2;
    let page = client.search_issues(&query).await.unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page.total, Some(3));
    assert!(page.has_more);
    assert_eq!(page.next_start(), 2);
    assert!(page.iter().all(|i| i.kind() == ResourceKind::Issue));
}

#[tokio::test]
async fn test_search_all_issues_follows_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/search"))
        .and(query_param("startAt", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 0,
            "total": 2,
            "issues": [issue(&mock_server, 10001, "BULK-1")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/search"))
        .and(query_param("startAt", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 1,
            "total": 2,
            "issues": [issue(&mock_server, 10002, "BULK-2")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let issues = client.search_all_issues("project = BULK").await.unwrap();

    let keys: Vec<_> = issues
        .iter()
        .filter_map(|i| i.get("key").and_then(Attr::as_str))
        .collect();
    assert_eq!(keys, vec!["BULK-1", "BULK-2"]);
}

#[tokio::test]
async fn test_comments_unwraps_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/BULK-1/comment"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startAt": 0,
            "total": 1,
            "comments": [{
                "self": format!("{}/rest/api/2/issue/10001/comment/10100", mock_server.uri()),
                "id": "10100",
                "body": "First!"
            }]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let comments = client.comments("BULK-1").await.unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].kind(), ResourceKind::Comment);
    assert!(comments[0].self_link().unwrap().ends_with("/comment/10100"));
}

#[tokio::test]
async fn test_add_comment_posts_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/BULK-1/comment"))
        .and(body_json(json!({
            "body": "Fixed in trunk",
            "visibility": { "type": "role", "value": "Administrators" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "self": format!("{}/rest/api/2/issue/10001/comment/10101", mock_server.uri()),
            "id": "10101",
            "body": "Fixed in trunk"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let comment = client
        .add_comment(
            "BULK-1",
            "Fixed in trunk",
            Some(json!({ "type": "role", "value": "Administrators" })),
        )
        .await
        .unwrap();

    assert_eq!(comment.get("id").and_then(Attr::as_str), Some("10101"));
}

#[tokio::test]
async fn test_create_issue_with_prefetch_loads_full_issue() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue"))
        .and(body_json(json!({ "fields": { "summary": "New bug" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "10003",
            "key": "BULK-3",
            "self": format!("{}/rest/api/2/issue/10003", mock_server.uri())
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/BULK-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue(&mock_server, 10003, "BULK-3")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let mut fields = Map::new();
    fields.insert("summary".to_string(), json!("New bug"));

    let full = client.create_issue(fields.clone(), true).await.unwrap();
    assert_eq!(
        full.path(&["fields", "summary"]).and_then(Attr::as_str),
        Some("Issue BULK-3")
    );

    // Without prefetch only the creation response is held
    let bare = client.create_issue(fields, false).await.unwrap();
    assert!(bare.get("fields").is_none());
    assert_eq!(bare.get("key").and_then(Attr::as_str), Some("BULK-3"));
}

#[tokio::test]
async fn test_issue_handle_as_identifier() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/BULK-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issue(&mock_server, 10001, "BULK-1")))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/issue/BULK-1/votes"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let issue = client.issue("BULK-1", None, None).await.unwrap();
    client.add_vote(&issue).await.unwrap();
}

#[tokio::test]
async fn test_projects_with_nested_lead() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/project"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "self": format!("{}/rest/api/2/project/BULK", mock_server.uri()),
            "id": "10000",
            "key": "BULK",
            "name": "Bulk Move",
            "lead": {
                "self": format!("{}/rest/api/2/user?username=admin", mock_server.uri()),
                "name": "admin"
            }
        }])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let projects = client.projects().await.unwrap();

    assert_eq!(projects.len(), 1);
    let lead = projects[0].get("lead").and_then(Attr::as_resource).unwrap();
    assert_eq!(lead.kind(), ResourceKind::User);
}

#[tokio::test]
async fn test_search_users_window() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/user/search"))
        .and(query_param("username", "fred"))
        .and(query_param("startAt", "10"))
        .and(query_param("maxResults", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let users = client
        .search_users("fred", &PaginationParams::window(10, 5))
        .await
        .unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn test_custom_registry_applies_to_responses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/issue/BULK-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "self": format!("{}/rest/api/2/issue/10001", mock_server.uri()),
            "key": "BULK-1",
            "fields": {
                "status": {
                    "self": format!("{}/rest/api/2/status/1", mock_server.uri()),
                    "name": "Open"
                }
            }
        })))
        .mount(&mock_server)
        .await;

    // Registry that only knows statuses
    let registry = TypeRegistry::empty()
        .register(r"status/[^/]+$", ResourceKind::Status)
        .unwrap();
    let client = client_for(&mock_server).with_registry(registry);
    let issue = client.issue("BULK-1", None, None).await.unwrap();

    let status = issue
        .path(&["fields", "status"])
        .and_then(Attr::as_resource)
        .unwrap();
    assert_eq!(status.kind(), ResourceKind::Status);
}

#[tokio::test]
async fn test_session_uses_auth_root() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/auth/1/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "self": format!("{}/rest/api/2/user?username=admin", mock_server.uri()),
            "name": "admin"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let session = client.session().await.unwrap();
    assert_eq!(session.get("name").and_then(Attr::as_str), Some("admin"));
}

#[tokio::test]
async fn test_version_counts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/version/10000/unresolvedIssueCount"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "self": format!("{}/rest/api/2/version/10000", mock_server.uri()),
            "issuesUnresolvedCount": 4
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/version/10000/relatedIssueCounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuesFixedCount": 2,
            "issuesAffectedCount": 1
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    assert_eq!(client.version_count_unresolved_issues("10000").await.unwrap(), 4);

    let related = client.version_count_related_issues("10000").await.unwrap();
    assert_eq!(related["issuesFixedCount"], 2);
}

#[tokio::test]
async fn test_move_version_posts_position() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/2/version/10000/move"))
        .and(body_json(json!({ "position": "First" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "self": format!("{}/rest/api/2/version/10000", mock_server.uri()),
            "id": "10000",
            "name": "1.0"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let version = client
        .move_version("10000", None, Some("First"))
        .await
        .unwrap();
    assert_eq!(version.kind(), ResourceKind::Version);
}

#[tokio::test]
async fn test_assignable_users_for_projects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/user/assignable/multiProjectSearch"))
        .and(query_param("username", "fr"))
        .and(query_param("projectKeys", "BULK,XSS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "self": format!("{}/rest/api/2/user?username=fred", mock_server.uri()),
            "name": "fred"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let users = client
        .search_assignable_users_for_projects("fr", "BULK,XSS", &PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].kind(), ResourceKind::User);
}

#[tokio::test]
async fn test_groups_picker_and_websudo() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/api/2/groups/picker"))
        .and(query_param("query", "jira"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "header": "Showing 1 of 1 matching groups",
            "total": 1,
            "groups": [{ "name": "jira-users" }]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/auth/1/websudo"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let groups = client.groups(Some("jira"), None).await.unwrap();
    assert_eq!(groups["groups"][0]["name"], "jira-users");

    client.kill_websudo().await.unwrap();
}
