//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the jirapi binary.

use clap::{Parser, Subcommand};

/// JIRA REST API command-line interface.
#[derive(Parser, Debug)]
#[command(name = "jirapi", about = "JIRA REST API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load any resource by URL template, e.g. `issue/{0}/comment/{1}`.
    Find {
        /// Path template below the REST root.
        template: String,

        /// Identifiers filling the template placeholders, in order.
        ids: Vec<String>,
    },

    /// Get a single issue.
    Issue {
        /// Issue key or id.
        key: String,

        /// Comma-separated fields to include.
        #[arg(long)]
        fields: Option<String>,

        /// Comma-separated entities to expand.
        #[arg(long)]
        expand: Option<String>,
    },

    /// Search issues with JQL.
    Search {
        /// The JQL query.
        jql: String,

        /// Index of the first issue to return.
        #[arg(long, default_value_t = 0)]
        start_at: u64,

        /// Number of issues per page.
        #[arg(long, default_value_t = crate::client::DEFAULT_MAX_RESULTS)]
        max_results: u64,
    },

    /// List projects visible to the current user.
    Projects,

    /// Update fields of an issue.
    UpdateIssue {
        /// Issue key or id.
        key: String,

        /// Field assignments as `name=value`; values are parsed as JSON when possible.
        #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
    },

    /// Delete an issue.
    DeleteIssue {
        /// Issue key or id.
        key: String,

        /// Also delete the issue's subtasks.
        #[arg(long)]
        delete_subtasks: bool,
    },

    /// Show server information.
    ServerInfo,
}

/// Parse a `name=value` pair.
pub fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{s}'")),
    }
}
