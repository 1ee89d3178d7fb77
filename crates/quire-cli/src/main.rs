//! quire: command-line tool for personal notes, ideas, and research.
//!
//! Connection parameters are read from the environment, after loading a
//! `.env` file from the working directory if one exists.

mod logging;
mod render;

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::debug;

use quire_core::config::REQUIRED_KEYS;
use quire_core::defaults;
use quire_core::{
    parse_tag_list, CreateEntryRequest, DbConfig, EntryRepository, ListEntriesRequest,
    SearchEntriesRequest,
};
use quire_db::{Database, PoolConfig};

const EXAMPLE_ENV: &str = "\
user=postgres.your_project_id
password=your_password
host=aws-0-region.pooler.supabase.com
port=6543
dbname=postgres";

#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about = "Manage notes, ideas, and research with tags and search")]
#[command(propagate_version = true)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create tables and indexes if they do not exist
    InitDb,

    /// Check that the database is reachable
    TestConnection,

    /// Add a new entry
    AddEntry {
        /// Entry title
        title: String,

        /// Entry body
        content: String,

        /// Entry type (note, idea, research, ...)
        #[arg(long = "type", default_value = defaults::ENTRY_TYPE)]
        entry_type: String,

        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,

        /// Author recorded on the entry
        #[arg(long, default_value = defaults::CREATED_BY)]
        created_by: String,
    },

    /// List recent entries
    ListEntries {
        /// Only entries carrying this tag
        #[arg(long)]
        tag: Option<String>,

        /// Only entries of this type
        #[arg(long = "type")]
        entry_type: Option<String>,

        /// Maximum number of entries
        #[arg(long, default_value_t = defaults::LIST_LIMIT)]
        limit: i64,
    },

    /// Search titles and content (case-insensitive substring match)
    #[command(group(ArgGroup::new("field").args(["title_only", "content_only"])))]
    Search {
        /// Text to look for; `%` and `_` act as wildcards unless --literal
        query: String,

        /// Search titles only
        #[arg(long)]
        title_only: bool,

        /// Search content only
        #[arg(long)]
        content_only: bool,

        /// Match `%` and `_` literally
        #[arg(long)]
        literal: bool,
    },

    /// Show the most recent entry whose title contains TITLE
    Show {
        /// Title fragment (case-insensitive)
        title: String,
    },

    /// List tags with usage counts
    Tags,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _log_guard = logging::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load configuration, printing setup help when required keys are missing.
fn load_config() -> anyhow::Result<DbConfig> {
    let config = DbConfig::from_env().context("invalid database configuration")?;

    let missing = config.missing_fields();
    if !missing.is_empty() {
        eprintln!("Missing database settings: {}", missing.join(", "));
        eprintln!(
            "Set {} in the environment or a .env file.",
            REQUIRED_KEYS.join(", ")
        );
        eprintln!("\nExample .env file:\n{}", EXAMPLE_ENV);
        bail!("database configuration is incomplete");
    }
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config()?;
    debug!(config = ?config, command = ?cli.command, "Running command");

    let db = Database::with_pool_config(&config, PoolConfig::from_env());
    let result = execute(&db, cli.command, cli.json).await;
    db.close().await;
    result
}

async fn execute(db: &Database, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::InitDb => {
            if !db.gateway.initialize_schema().await {
                bail!("database initialization failed");
            }
            println!("Database initialized.");
        }

        Commands::TestConnection => {
            if !db.gateway.test_connection().await {
                bail!("could not connect to the database");
            }
            println!("Connection successful.");
        }

        Commands::AddEntry {
            title,
            content,
            entry_type,
            tags,
            created_by,
        } => {
            let req = CreateEntryRequest::new(title, content)
                .entry_type(entry_type)
                .created_by(created_by)
                .tags(tags.as_deref().map(parse_tag_list).unwrap_or_default());

            let id = db.entries.create(req).await?;
            if json {
                println!("{}", render::json(&serde_json::json!({ "id": id }))?);
            } else {
                println!("Created entry {}", id);
            }
        }

        Commands::ListEntries {
            tag,
            entry_type,
            limit,
        } => {
            let entries = db
                .entries
                .list(ListEntriesRequest {
                    tag,
                    entry_type,
                    limit,
                })
                .await?;
            if json {
                println!("{}", render::json(&entries)?);
            } else {
                println!("{}", render::entry_list(&entries));
            }
        }

        Commands::Search {
            query,
            title_only,
            content_only,
            literal,
        } => {
            let req = SearchEntriesRequest {
                in_title: !content_only,
                in_content: !title_only,
                literal,
                ..SearchEntriesRequest::new(query)
            };
            let entries = db.entries.search(req).await?;
            if json {
                println!("{}", render::json(&entries)?);
            } else {
                println!("{}", render::entry_list(&entries));
            }
        }

        Commands::Show { title } => match db.entries.get_by_title(&title).await? {
            Some(entry) if json => println!("{}", render::json(&entry)?),
            Some(entry) => println!("{}", render::entry_detail(&entry)),
            None if json => println!("null"),
            None => println!("No entry found matching '{}'.", title),
        },

        Commands::Tags => {
            let tags = db.entries.list_tags().await?;
            if json {
                println!("{}", render::json(&tags)?);
            } else {
                println!("{}", render::tag_table(&tags));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_entry_with_options() {
        let cli = Cli::try_parse_from([
            "quire",
            "add-entry",
            "My title",
            "Body text",
            "--type",
            "idea",
            "--tags",
            "rust, cli",
            "--created-by",
            "alice",
        ])
        .unwrap();

        match cli.command {
            Commands::AddEntry {
                title,
                content,
                entry_type,
                tags,
                created_by,
            } => {
                assert_eq!(title, "My title");
                assert_eq!(content, "Body text");
                assert_eq!(entry_type, "idea");
                assert_eq!(tags.as_deref(), Some("rust, cli"));
                assert_eq!(created_by, "alice");
            }
            other => panic!("Expected AddEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_add_entry_defaults() {
        let cli = Cli::try_parse_from(["quire", "add-entry", "T", "C"]).unwrap();
        match cli.command {
            Commands::AddEntry {
                entry_type,
                tags,
                created_by,
                ..
            } => {
                assert_eq!(entry_type, "note");
                assert_eq!(tags, None);
                assert_eq!(created_by, "user");
            }
            other => panic!("Expected AddEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_list_entries_default_limit() {
        let cli = Cli::try_parse_from(["quire", "list-entries"]).unwrap();
        match cli.command {
            Commands::ListEntries { limit, tag, .. } => {
                assert_eq!(limit, 20);
                assert_eq!(tag, None);
            }
            other => panic!("Expected ListEntries, got {:?}", other),
        }
    }

    #[test]
    fn test_search_field_flags_conflict() {
        let result =
            Cli::try_parse_from(["quire", "search", "foo", "--title-only", "--content-only"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_json_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["quire", "tags", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Tags));
    }

    #[test]
    fn test_example_env_names_every_required_key() {
        for key in REQUIRED_KEYS {
            assert!(EXAMPLE_ENV.contains(&format!("{}=", key)));
        }
    }
}
