//! Command-line surface for `tk`.
//!
//! The CLI is a thin caller of the service layer; it owns argument parsing
//! and output formatting, nothing else.

use crate::error::{Result, TicketsError};
use crate::model::{
    CreateIssueInput, IssueAggregate, IssueFilter, Status, Tag, UpdateIssueInput,
};
use crate::storage::SqliteStore;
use crate::{directory, service};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "tk", version, about = "Issue-tracking record store")]
pub struct Cli {
    /// Path to the SQLite database.
    #[arg(long, env = "TICKETS_DB", default_value = "tickets.db", global = true)]
    pub db: PathBuf,

    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account.
    Register {
        email: String,
        password: String,
    },
    /// Verify credentials.
    Login {
        email: String,
        password: String,
    },
    /// Create an issue.
    Create(CreateArgs),
    /// Update an issue.
    Update(UpdateArgs),
    /// Delete an issue.
    Delete {
        id: i64,
    },
    /// List issues, optionally filtered.
    List(ListArgs),
    /// Show a single issue.
    Show {
        id: i64,
    },
    /// Manage tags.
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    pub title: String,

    /// Acting user (the issue's creator).
    #[arg(long)]
    pub creator: i64,

    #[arg(long, default_value = "")]
    pub description: String,

    /// One of: "not started", "in progress", "done".
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub assignee: Option<i64>,

    /// Tag id; may be repeated.
    #[arg(long = "tag")]
    pub tags: Vec<i64>,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// One of: "not started", "in progress", "done".
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, conflicts_with = "unassign")]
    pub assignee: Option<i64>,

    /// Clear the assignee.
    #[arg(long)]
    pub unassign: bool,

    /// Replace the full tag set; `--tags` with no value clears all tags.
    /// Omitting the flag leaves tags unchanged.
    #[arg(long, value_delimiter = ',', num_args = 0..)]
    pub tags: Option<Vec<i64>>,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub assignee: Option<i64>,

    /// One of: "not started", "in progress", "done".
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub tag: Option<i64>,
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// Create a tag.
    Create { name: String },
    /// Rename a tag.
    Rename { id: i64, name: String },
    /// Delete a tag.
    Delete { id: i64 },
    /// List all tags.
    List,
}

/// Dispatch a parsed command against the store at `cli.db`.
///
/// # Errors
///
/// Propagates service-layer errors; the binary maps them to exit codes.
pub fn execute(cli: &Cli) -> Result<()> {
    let mut store = SqliteStore::open(&cli.db)?;

    match &cli.command {
        Commands::Register { email, password } => {
            let user = directory::register_user(&mut store, email, password)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("registered {} (id {})", user.email, user.id);
            }
        }
        Commands::Login { email, password } => {
            let user = directory::login_user(&store, email, password)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("ok: {} (id {})", user.email, user.id);
            }
        }
        Commands::Create(args) => {
            let input = CreateIssueInput {
                title: args.title.clone(),
                description: args.description.clone(),
                status: parse_status(args.status.as_deref())?,
                assignee_id: args.assignee,
                tag_ids: if args.tags.is_empty() {
                    None
                } else {
                    Some(args.tags.clone())
                },
            };
            let aggregate = service::create_issue(&mut store, &input, args.creator)?;
            print_aggregate(&aggregate, cli.json)?;
        }
        Commands::Update(args) => {
            let input = update_input(args)?;
            let aggregate = service::update_issue(&mut store, &input)?;
            print_aggregate(&aggregate, cli.json)?;
        }
        Commands::Delete { id } => {
            let result = service::delete_issue(&mut store, *id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.success {
                println!("deleted issue {id}");
            } else {
                println!("issue {id} did not exist");
            }
        }
        Commands::List(args) => {
            let filter = IssueFilter {
                assignee_id: args.assignee,
                status: parse_status(args.status.as_deref())?,
                tag_id: args.tag,
            };
            let aggregates = service::get_issues(&store, &filter)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&aggregates)?);
            } else {
                for aggregate in &aggregates {
                    println!("{}", format_aggregate(aggregate));
                }
            }
        }
        Commands::Show { id } => match service::get_issue_by_id(&store, *id)? {
            Some(aggregate) => print_aggregate(&aggregate, cli.json)?,
            None => println!("issue {id} not found"),
        },
        Commands::Tag { command } => match command {
            TagCommands::Create { name } => {
                let tag = service::create_tag(&mut store, name)?;
                print_tag(&tag, cli.json)?;
            }
            TagCommands::Rename { id, name } => {
                let tag = service::update_tag(&mut store, *id, name)?;
                print_tag(&tag, cli.json)?;
            }
            TagCommands::Delete { id } => {
                let result = service::delete_tag(&mut store, *id)?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else if result.success {
                    println!("deleted tag {id}");
                } else {
                    println!("tag {id} did not exist");
                }
            }
            TagCommands::List => {
                let tags = service::list_tags(&store)?;
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&tags)?);
                } else {
                    for tag in &tags {
                        println!("{:>4}  {}", tag.id, tag.name);
                    }
                }
            }
        },
    }

    Ok(())
}

fn parse_status(status: Option<&str>) -> Result<Option<Status>> {
    status.map(Status::from_str).transpose()
}

/// Build the update input from the parsed flags, rejecting a command that
/// names no field at all rather than issuing a pure `updated_at` bump.
fn update_input(args: &UpdateArgs) -> Result<UpdateIssueInput> {
    let assignee_id = if args.unassign {
        Some(None)
    } else {
        args.assignee.map(Some)
    };
    let input = UpdateIssueInput {
        id: args.id,
        title: args.title.clone(),
        description: args.description.clone(),
        status: parse_status(args.status.as_deref())?,
        assignee_id,
        tag_ids: args.tags.clone(),
    };
    if input.is_empty() {
        return Err(TicketsError::validation("update", "no fields to update"));
    }
    Ok(input)
}

fn print_aggregate(aggregate: &IssueAggregate, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(aggregate)?);
    } else {
        println!("{}", format_aggregate(aggregate));
    }
    Ok(())
}

fn print_tag(tag: &Tag, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(tag)?);
    } else {
        println!("{:>4}  {}", tag.id, tag.name);
    }
    Ok(())
}

fn format_aggregate(aggregate: &IssueAggregate) -> String {
    let assignee = aggregate
        .assignee
        .as_ref()
        .map_or("unassigned", |user| user.email.as_str());
    let tags = aggregate
        .tags
        .iter()
        .map(|tag| tag.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "#{} [{}] {} (creator: {}, assignee: {}) tags: [{}]",
        aggregate.issue.id,
        aggregate.issue.status,
        aggregate.issue.title,
        aggregate.creator.email,
        assignee,
        tags,
    )
}
