//! Petlandia CLI - Database migrations and user management.
//!
//! # Usage
//!
//! ```bash
//! # Apply the storefront schema and session table
//! pl-cli migrate
//!
//! # Create a user (add --admin for administrator rights)
//! pl-cli admin create -u alice -e alice@example.com -p 'correct horse' --admin
//!
//! # Create the default `admin` account if it does not exist
//! pl-cli admin bootstrap --password 'something-better'
//! ```
//!
//! All commands read the database location from `STOREFRONT_DATABASE_URL`
//! (or `DATABASE_URL`), loading `.env` if present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pl-cli")]
#[command(author, version, about = "Petlandia CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Manage user accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new user
    Create {
        /// Login name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,

        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },
    /// Create the default administrator if missing
    Bootstrap {
        /// Password for the new account (defaults to the well-known `admin123`)
        #[arg(short, long)]
        password: Option<String>,
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
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                password,
                admin,
            } => {
                commands::admin::create_user(&username, &email, &password, admin).await?;
            }
            AdminAction::Bootstrap { password } => {
                commands::admin::bootstrap(password.as_deref()).await?;
            }
        },
    }
    Ok(())
}
