//! # Topicforge CLI (`forge`)
//!
//! ## Usage
//!
//! ```bash
//! forge --config ./config/forge.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `forge init` | Create the SQLite database and run schema migrations |
//! | `forge job create <file-name>` | Create a processing job and print its id |
//! | `forge group <topics.json>` | Preview topic consolidation (no service calls) |
//! | `forge process <topics.json> --job <id>` | Run the pipeline and print the response |
//! | `forge jobs list` | List jobs, newest first |
//! | `forge jobs show <id>` | Show a job, its topics and its generated content |
//! | `forge jobs delete <id>` | Delete a job, its rows and its stored artifacts |
//! | `forge serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use topicforge::{config, jobs, logging, migrate, server};

/// Topicforge CLI: consolidate detected topics and generate categorized
/// content for uploaded documents.
///
/// All commands except `group` read a TOML configuration file given by
/// `--config`. See `config/forge.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "forge",
    about = "Topicforge — topic consolidation and AI content generation for uploaded documents",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/forge.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the processing_jobs,
    /// detected_topics and generated_content tables. Idempotent.
    Init,

    /// Manage a single job.
    Job {
        #[command(subcommand)]
        action: JobAction,
    },

    /// Preview how a topics file consolidates into groups.
    ///
    /// Accepts a JSON array of topics or an object with a `topics` array.
    /// Makes no generation or storage calls.
    Group {
        /// Path to the topics JSON file.
        topics: PathBuf,
    },

    /// Run the autonomous pipeline for an existing job.
    ///
    /// Consolidates the topics, generates content per group, stores the
    /// rendered artifacts, completes the job, and prints the JSON response.
    Process {
        /// Path to the topics JSON file.
        topics: PathBuf,

        /// Job id (from `forge job create`).
        #[arg(long)]
        job: String,

        /// Original document name; defaults to the job's file name.
        #[arg(long)]
        file_name: Option<String>,
    },

    /// Browse and manage job history.
    Jobs {
        #[command(subcommand)]
        action: JobsAction,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Subcommand)]
enum JobAction {
    /// Create a job in the `processing` state and print its id.
    Create {
        /// Name of the uploaded document.
        file_name: String,

        /// Size of the uploaded document in bytes.
        #[arg(long, default_value_t = 0)]
        size: i64,
    },
}

#[derive(Subcommand)]
enum JobsAction {
    /// List jobs, newest first.
    List,
    /// Show a job with its topics and generated content.
    Show { id: String },
    /// Delete a job, its rows, and its stored artifacts.
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Group { topics } = &cli.command {
        jobs::run_group(topics)?;
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Job { action } => match action {
            JobAction::Create { file_name, size } => {
                jobs::run_job_create(&cfg, &file_name, size).await?;
            }
        },
        Commands::Group { topics } => jobs::run_group(&topics)?,
        Commands::Process {
            topics,
            job,
            file_name,
        } => {
            jobs::run_process(&cfg, &topics, &job, file_name.as_deref()).await?;
        }
        Commands::Jobs { action } => match action {
            JobsAction::List => jobs::run_jobs_list(&cfg).await?,
            JobsAction::Show { id } => jobs::run_jobs_show(&cfg, &id).await?,
            JobsAction::Delete { id } => jobs::run_jobs_delete(&cfg, &id).await?,
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
