//! CampusMart CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! cm-cli migrate
//!
//! # Create a user (password read from stdin)
//! printf '%s\n' "$PASSWORD" | cm-cli user create manager --role admin
//!
//! # Import users from YAML, or from `id,username,password[,email]` CSV rows
//! cm-cli user import users.yaml
//! cm-cli user import users.csv
//!
//! # Hash any plain-text passwords left by older imports
//! cm-cli user rehash
//!
//! # Seed the starter catalog
//! cm-cli seed products
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `user create|import|rehash` - Manage accounts
//! - `seed products` - Insert starter or file-provided products

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cm-cli")]
#[command(author, version, about = "CampusMart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Insert seed data
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a user; the password is read from the first line of stdin
    Create {
        /// Login name
        username: String,

        /// Role (`admin` or `staff`)
        #[arg(short, long, default_value = "staff")]
        role: String,

        /// Contact email
        #[arg(short, long)]
        email: Option<String>,
    },
    /// Create users listed in a YAML or CSV file, skipping existing usernames
    Import {
        /// Path to the user file
        file: PathBuf,

        /// File layout; guessed from the extension when omitted
        #[arg(short, long, value_enum)]
        format: Option<commands::user::ImportFormat>,
    },
    /// Replace stored passwords that are not Argon2 hashes
    Rehash,
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Add products that do not exist yet (matched by name)
    Products {
        /// YAML catalog; the built-in starter catalog is used when omitted
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                role,
                email,
            } => {
                commands::user::create(&username, &role, email.as_deref()).await?;
            }
            UserAction::Import { file, format } => commands::user::import(&file, format).await?,
            UserAction::Rehash => commands::user::rehash().await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(file.as_deref()).await?,
        },
    }
    Ok(())
}
