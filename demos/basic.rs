//! Basic example demonstrating the JIRA client.
//!
//! Run with:
//! ```
//! JIRA_SERVER=http://localhost:2990/jira JIRA_USERNAME=admin JIRA_PASSWORD=admin \
//!     cargo run --example basic
//! ```

use jirapi::{Attr, JiraClient, ResourceKind, SearchQuery};

#[tokio::main]
async fn main() -> jirapi::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating JIRA client...");
    let client = JiraClient::from_env()?;
    println!("Connected to: {}", client.client_info());

    // List projects
    println!("\n--- Listing Projects ---");
    let projects = client.projects().await?;
    println!("Found {} projects", projects.len());

    for project in &projects {
        let key = project.get("key").and_then(Attr::as_str).unwrap_or("?");
        let name = project.get("name").and_then(Attr::as_str).unwrap_or("?");
        println!("  - {key} ({name})");
    }

    // Search the first project's issues
    let Some(first_project) = projects.first() else {
        return Ok(());
    };
    let key = first_project.get("key").and_then(Attr::as_str).unwrap_or_default();

    println!("\n--- Searching Issues ---");
    let mut query = SearchQuery::new(format!("project = {key} ORDER BY created DESC"));
    query.max_results = 5;
    let page = client.search_issues(&query).await?;
    println!("Showing {} of {:?} issues", page.len(), page.total);

    // Walk into nested resources of the first issue
    if let Some(issue) = page.items.first() {
        println!("\n--- Issue Details ---");
        println!("  Key: {:?}", issue.get("key").and_then(Attr::as_str));
        println!(
            "  Summary: {:?}",
            issue.path(&["fields", "summary"]).and_then(Attr::as_str)
        );

        if let Some(status) = issue.path(&["fields", "status"]).and_then(Attr::as_resource) {
            assert_eq!(status.kind(), ResourceKind::Status);
            println!(
                "  Status: {:?} ({})",
                status.get("name").and_then(Attr::as_str),
                status.self_link().unwrap_or_default()
            );
        }

        let comments = client.comments(issue).await?;
        println!("  Comments: {}", comments.len());
    }

    // Fetch an endpoint with no dedicated method
    println!("\n--- Server Info ---");
    let info = client.find("serverInfo", ()).await?;
    println!("  Version: {:?}", info.get("version").and_then(Attr::as_str));

    println!("\nDone!");
    Ok(())
}
