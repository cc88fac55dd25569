//! JIRA REST API CLI binary.
//!
//! A command-line interface for interacting with a JIRA server.

use clap::Parser;
use jirapi::cli::{Cli, Command};
use jirapi::output::{display_attr, PrettyPrint};
use jirapi::{IssueDeleteParams, JiraClient, Page, Resource, SearchQuery};
use serde_json::{Map, Value};
use std::process::ExitCode;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match JiraClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set JIRA_SERVER, JIRA_USERNAME and JIRA_PASSWORD environment variables");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &JiraClient, cli: Cli) -> jirapi::Result<()> {
    match cli.command {
        Command::Find { template, ids } => {
            let resource = client.find(&template, ids).await?;
            output_single(&resource, cli.json)
        }
        Command::Issue {
            key,
            fields,
            expand,
        } => {
            let issue = client
                .issue(key.as_str(), fields.as_deref(), expand.as_deref())
                .await?;
            output_single(&issue, cli.json)
        }
        Command::Search {
            jql,
            start_at,
            max_results,
        } => {
            let mut query = SearchQuery::new(jql);
            query.start_at = start_at;
            query.max_results = max_results;
            let page = client.search_issues(&query).await?;
            output_page(&page, cli.json)
        }
        Command::Projects => {
            let projects = client.projects().await?;
            if cli.json {
                print_raw(&projects)
            } else {
                let rows: Vec<ProjectRow> = projects.iter().map(ProjectRow::from).collect();
                println!("{}", Table::new(rows));
                Ok(())
            }
        }
        Command::UpdateIssue { key, set } => {
            let mut issue = client.issue(key.as_str(), None, None).await?;
            issue.update(assignments(set)).await?;
            output_single(&issue, cli.json)
        }
        Command::DeleteIssue {
            key,
            delete_subtasks,
        } => {
            let issue = client.issue(key.as_str(), Some("summary"), None).await?;
            issue.delete_with(&IssueDeleteParams { delete_subtasks }).await?;
            eprintln!("Deleted {key}");
            Ok(())
        }
        Command::ServerInfo => {
            let info = client.server_info().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
    }
}

/// Field map from `--set` pairs; values that parse as JSON keep their type.
fn assignments(set: Vec<(String, String)>) -> Map<String, Value> {
    set.into_iter()
        .map(|(name, value)| {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            (name, value)
        })
        .collect()
}

fn output_single(resource: &Resource, json: bool) -> jirapi::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&resource.raw())?);
    } else {
        println!("{}", resource.pretty_print());
    }
    Ok(())
}

fn print_raw(resources: &[Resource]) -> jirapi::Result<()> {
    let raw: Vec<_> = resources.iter().map(Resource::raw).collect();
    println!("{}", serde_json::to_string_pretty(&raw)?);
    Ok(())
}

fn output_page(page: &Page<Resource>, json: bool) -> jirapi::Result<()> {
    if json {
        print_raw(&page.items)?;
    } else {
        let rows: Vec<IssueRow> = page.iter().map(IssueRow::from).collect();
        println!("{}", Table::new(rows));
        let first = page.start_at + 1;
        let last = page.next_start();
        if let Some(total) = page.total {
            println!("\nIssues {first}-{last} of {total}");
        } else if page.has_more {
            println!("\nIssues {first}-{last} (more available)");
        } else {
            println!("\nIssues {first}-{last} (end)");
        }
    }
    Ok(())
}

// Table row types for non-JSON output

fn text(resource: &Resource, path: &[&str]) -> String {
    resource.path(path).map(display_attr).unwrap_or_default()
}

#[derive(Tabled)]
struct IssueRow {
    key: String,
    #[tabled(rename = "type")]
    issue_type: String,
    status: String,
    summary: String,
}

impl From<&Resource> for IssueRow {
    fn from(issue: &Resource) -> Self {
        Self {
            key: text(issue, &["key"]),
            issue_type: text(issue, &["fields", "issuetype"]),
            status: text(issue, &["fields", "status"]),
            summary: text(issue, &["fields", "summary"]),
        }
    }
}

#[derive(Tabled)]
struct ProjectRow {
    key: String,
    name: String,
    lead: String,
}

impl From<&Resource> for ProjectRow {
    fn from(project: &Resource) -> Self {
        Self {
            key: text(project, &["key"]),
            name: text(project, &["name"]),
            lead: text(project, &["lead"]),
        }
    }
}
