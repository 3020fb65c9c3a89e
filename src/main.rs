// ABOUTME: CLI entry point for ocdskingfisher-views
// ABOUTME: Parses commands, opens the database connection and routes to handlers

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use ocdskingfisher_views::commands::{self, AddViewOptions, Session};
use ocdskingfisher_views::error::Error;
use ocdskingfisher_views::{config, postgres};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ocdskingfisher-views")]
#[command(about = "Create and manage summary schemas of OCDS Kingfisher collections", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a schema containing summary tables about one or more collections
    AddView {
        /// One or more comma-separated collection IDs
        collections: String,
        /// Your name and a description of your purpose
        note: String,
        /// A custom name for the SQL schema ("view_data_" will be prepended)
        #[arg(long)]
        name: Option<String>,
        /// Don't run the refresh-views, field-counts and correct-user-permissions commands
        #[arg(long)]
        dontbuild: bool,
        /// Create SQL tables instead of SQL views
        #[arg(long)]
        tables_only: bool,
        /// The number of threads for the field-counts command to use (up to the number of collections)
        #[arg(long, default_value_t = 1)]
        threads: usize,
    },
    /// Drop a schema
    DeleteView {
        /// The last part of a schema's name after "view_data_"
        name: String,
    },
    /// List the schemas, with collection IDs and creators' notes
    ListViews,
    /// Create (or re-create) the summary tables in a schema
    RefreshViews {
        /// The last part of a schema's name after "view_data_"
        name: String,
        /// Drop the summary tables from the schema
        #[arg(long)]
        remove: bool,
        /// Create SQL tables instead of SQL views
        #[arg(long)]
        tables_only: bool,
    },
    /// Create (or re-create) the field_counts table in a schema
    FieldCounts {
        /// The last part of a schema's name after "view_data_"
        name: String,
        /// Drop the field_counts table from the schema
        #[arg(long)]
        remove: bool,
        /// The number of threads to use (up to the number of collections)
        #[arg(long, default_value_t = 1)]
        threads: usize,
    },
    /// Grant the users in the views.read_only_user table read-only access to all schemas
    CorrectUserPermissions,
    /// Create or update the CSV files documenting the summary tables
    DocsTableRef {
        /// The last part of a schema's name after "view_data_"
        name: String,
        /// Directory for the CSV files
        #[arg(long, default_value = commands::docs_table_ref::DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::AddView { .. } => "add-view",
            Commands::DeleteView { .. } => "delete-view",
            Commands::ListViews => "list-views",
            Commands::RefreshViews { .. } => "refresh-views",
            Commands::FieldCounts { .. } => "field-counts",
            Commands::CorrectUserPermissions => "correct-user-permissions",
            Commands::DocsTableRef { .. } => "docs-table-ref",
        }
    }
}

/// The message of a usage error, which clap reports instead of the logger
fn usage_message(e: &anyhow::Error) -> Option<&str> {
    match e.downcast_ref::<Error>() {
        Some(Error::Usage(message)) => Some(message.as_str()),
        _ => None,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command).await {
        if let Some(message) = usage_message(&e) {
            Cli::command().error(ErrorKind::ValueValidation, message).exit();
        }
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    tracing::info!("Running {}", command.name());

    let database_uri = config::get_database_uri()?;
    let client = postgres::connect_with_retry(&database_uri).await?;
    let mut session = Session::new(database_uri, client);

    match command {
        Commands::AddView {
            collections,
            note,
            name,
            dontbuild,
            tables_only,
            threads,
        } => {
            let options = AddViewOptions {
                name,
                dontbuild,
                tables_only,
                threads,
            };
            commands::add_view(&mut session, &collections, &note, options).await
        }
        Commands::DeleteView { name } => commands::delete_view(&session, &name).await,
        Commands::ListViews => commands::list_views(&session).await,
        Commands::RefreshViews {
            name,
            remove,
            tables_only,
        } => commands::refresh_views(&mut session, &name, remove, tables_only).await,
        Commands::FieldCounts {
            name,
            remove,
            threads,
        } => commands::field_counts(&session, &name, remove, threads).await,
        Commands::CorrectUserPermissions => commands::correct_user_permissions(&mut session).await,
        Commands::DocsTableRef { name, output_dir } => {
            commands::docs_table_ref(&session, &name, &output_dir).await
        }
    }
}
