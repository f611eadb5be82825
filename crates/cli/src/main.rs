//! giftsync CLI - store preparation and on-demand code operations.
//!
//! # Usage
//!
//! ```bash
//! # Create the schema and import legacy stores
//! giftsync migrate
//!
//! # Run a single reconciliation pass
//! giftsync sync
//!
//! # Manage codes
//! giftsync codes list
//! giftsync codes add ABC123
//! giftsync codes check ABC123
//! giftsync codes remove ABC123 --validated
//! giftsync codes clean
//!
//! # Auto-claim groups and notification recipients
//! giftsync group 1234 --auto-claim true
//! giftsync admin 42 --primary true
//! ```
//!
//! # Commands
//!
//! - `migrate`, `codes list|claims|claim`, `group`, `admin` - store only
//! - `sync`, `codes add|check|remove|clean` - need the remote API settings

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{ArgAction, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "giftsync")]
#[command(author, version, about = "giftsync CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema and import legacy stores
    Migrate,
    /// Run one reconciliation pass and print its report
    Sync,
    /// Manage gift codes
    Codes {
        #[command(subcommand)]
        action: CodeAction,
    },
    /// Enable or disable auto-claim for a group
    Group {
        /// Group (alliance) ID
        id: String,

        /// Whether new codes are redeemed for this group
        #[arg(long, action = ArgAction::Set)]
        auto_claim: bool,
    },
    /// Mark an admin as a notification recipient
    Admin {
        /// Admin user ID
        id: String,

        /// Whether the admin is notified about new codes
        #[arg(long, action = ArgAction::Set)]
        primary: bool,
    },
}

#[derive(Subcommand)]
enum CodeAction {
    /// List stored codes
    List,
    /// Add a code (dated today) remotely, then locally
    Add {
        /// Gift code
        code: String,
    },
    /// Ask the remote whether it knows a code
    Check {
        /// Gift code
        code: String,
    },
    /// Remove a code remotely, then locally with its claims
    Remove {
        /// Gift code
        code: String,

        /// Confirm the code is known to be dead
        #[arg(long)]
        validated: bool,
    },
    /// Probe every stored code and remove the dead ones
    Clean,
    /// List the users who claimed a code
    Claims {
        /// Gift code
        code: String,
    },
    /// Record that a user claimed a code
    Claim {
        /// Gift code
        code: String,

        /// User ID
        #[arg(short, long)]
        user: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::warn!("A rustls crypto provider was already installed");
    }

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Sync => commands::sync::run().await?,
        Commands::Codes { action } => match action {
            CodeAction::List => commands::codes::list().await?,
            CodeAction::Add { code } => commands::codes::add(&code).await?,
            CodeAction::Check { code } => commands::codes::check(&code).await?,
            CodeAction::Remove { code, validated } => {
                commands::codes::remove(&code, validated).await?;
            }
            CodeAction::Clean => commands::codes::clean().await?,
            CodeAction::Claims { code } => commands::codes::claims(&code).await?,
            CodeAction::Claim { code, user } => commands::codes::claim(&code, &user).await?,
        },
        Commands::Group { id, auto_claim } => commands::settings::group(&id, auto_claim).await?,
        Commands::Admin { id, primary } => commands::settings::admin(&id, primary).await?,
    }
    Ok(())
}
