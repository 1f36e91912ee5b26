use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use jot::items::Status;
use jot::Config;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Capture tasks and ideas from free-text messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one inbound message: store extracted items or answer a question
    Ingest {
        /// The message text
        message: String,

        /// Sender identifier the items belong to
        #[arg(long, default_value = "me")]
        owner: String,
    },

    /// Ask a question about stored items
    Query {
        /// The question
        question: String,

        #[arg(long, default_value = "me")]
        owner: String,
    },

    /// List items using structural filters
    List {
        /// Filter by kind (task, idea)
        #[arg(long)]
        kind: Option<String>,

        /// Filter by priority (high, medium, low)
        #[arg(long)]
        priority: Option<String>,

        /// Filter by status (pending, completed, cancelled); defaults to pending
        #[arg(long)]
        status: Option<String>,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,

        /// Maximum number of items
        #[arg(long, default_value = "50")]
        limit: usize,

        #[arg(long, default_value = "me")]
        owner: String,
    },

    /// Add an item directly, without classification
    Add {
        /// Item content
        content: String,

        /// Item kind (task, idea)
        #[arg(long, default_value = "task")]
        kind: String,

        /// Priority (high, medium, low)
        #[arg(long)]
        priority: Option<String>,

        /// Category name (created on first use)
        #[arg(long)]
        category: Option<String>,

        /// Deadline as an ISO date (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        /// Tags (comma-separated)
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        #[arg(long, default_value = "me")]
        owner: String,
    },

    /// Mark an item as completed
    Done {
        /// Item ID
        id: i64,

        #[arg(long, default_value = "me")]
        owner: String,
    },

    /// Mark an item as cancelled
    Cancel {
        /// Item ID
        id: i64,

        #[arg(long, default_value = "me")]
        owner: String,
    },

    /// Show aggregate counts
    Stats {
        #[arg(long, default_value = "me")]
        owner: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Ingest { message, owner } => {
            commands::ingest::execute(&config, &owner, &message)?;
        }
        Commands::Query { question, owner } => {
            commands::query::execute(&config, &owner, &question)?;
        }
        Commands::List {
            kind,
            priority,
            status,
            category,
            limit,
            owner,
        } => {
            commands::list::execute(&config, &owner, kind, priority, status, category, limit)?;
        }
        Commands::Add {
            content,
            kind,
            priority,
            category,
            deadline,
            tags,
            owner,
        } => {
            commands::add::execute(
                &config, &owner, &kind, &content, priority, category, deadline, tags,
            )?;
        }
        Commands::Done { id, owner } => {
            commands::status::execute(&config, &owner, id, Status::Completed)?;
        }
        Commands::Cancel { id, owner } => {
            commands::status::execute(&config, &owner, id, Status::Cancelled)?;
        }
        Commands::Stats { owner } => {
            commands::stats::execute(&config, &owner)?;
        }
    }

    Ok(())
}
