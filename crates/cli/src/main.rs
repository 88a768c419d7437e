//! LocalBite CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! lb-cli migrate
//!
//! # Promote a user to admin
//! lb-cli users set-role --uid abc123 --role admin
//!
//! # Mark a user verified without a request
//! lb-cli users verify --uid abc123
//!
//! # Load users and reviews from YAML
//! lb-cli seed --file seed.yaml
//! ```
//!
//! All commands read `LOCALBITE_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lb-cli")]
#[command(author, version, about = "LocalBite CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed the database from a YAML file
    Seed {
        /// Path to the seed file
        #[arg(short, long)]
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Change a user's role
    SetRole {
        /// User uid
        #[arg(short, long)]
        uid: String,

        /// New role (`foodie`, `cook`, `admin`, `employee`)
        #[arg(short, long)]
        role: String,
    },
    /// Mark a user verified
    Verify {
        /// User uid
        #[arg(short, long)]
        uid: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

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
        Commands::Users { action } => match action {
            UserAction::SetRole { uid, role } => commands::users::set_role(&uid, &role).await?,
            UserAction::Verify { uid } => commands::users::verify(&uid).await?,
        },
        Commands::Seed { file } => commands::seed::from_file(&file).await?,
    }
    Ok(())
}
