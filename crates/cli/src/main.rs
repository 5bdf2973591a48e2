//! K4J LPG Center CLI - migrations and day-to-day operations.
//!
//! # Usage
//!
//! ```bash
//! # Create the kv_store table
//! lpg migrate
//!
//! # Seed an empty deployment, then sign in as the seed admin
//! lpg init
//! lpg login -u admin -p admin123
//!
//! # Inventory
//! lpg products list --low-stock
//! lpg products add --name "LPG Hose" --category Accessories --quantity 50 --price 150
//! lpg products update <id> --quantity 45
//!
//! # Users (admin)
//! lpg users list
//! lpg users update <id> --role admin
//! ```
//!
//! # Environment Variables
//!
//! - `LPG_API_URL` - API root including the route prefix
//! - `LPG_SESSION_FILE` - Where the session token is kept
//! - `LPG_DATABASE_URL` / `DATABASE_URL` - For `migrate` only

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;

use commands::{CliError, Context};

/// Default API root for a locally running server.
const DEFAULT_API_URL: &str = "http://127.0.0.1:3002/make-server-9f945771";

#[derive(Parser)]
#[command(name = "lpg")]
#[command(author, version, about = "K4J LPG Center CLI tools")]
struct Cli {
    /// API root including the route prefix
    #[arg(long, global = true, env = "LPG_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Session file (default: ~/.k4j_lpg/session.json)
    #[arg(long, global = true, env = "LPG_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        /// `PostgreSQL` connection string (falls back to `DATABASE_URL`)
        #[arg(long, env = "LPG_DATABASE_URL")]
        database_url: Option<String>,
    },
    #[command(flatten)]
    Api(ApiCommand),
}

/// Commands that talk to the API.
#[derive(Subcommand)]
enum ApiCommand {
    /// Check whether the API is reachable
    Health,
    /// Seed default users and products on an empty deployment
    Init,
    /// Sign in and save the session
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
    /// Sign out and forget the saved session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Register a new account
    Signup {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
        /// Role (`admin` or `staff`)
        #[arg(short, long, default_value = "staff")]
        role: String,
    },
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage users (admin)
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Dashboard figures
    Stats,
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products
    List {
        /// Only products whose name or category contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Only products at or below their low stock threshold
        #[arg(long)]
        low_stock: bool,
    },
    /// Add a product (admin)
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        quantity: i32,
        #[arg(long)]
        price: Decimal,
        /// Low stock threshold (default 20)
        #[arg(long)]
        threshold: Option<i32>,
    },
    /// Update product fields
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        quantity: Option<i32>,
        #[arg(long)]
        price: Option<Decimal>,
        #[arg(long)]
        threshold: Option<i32>,
    },
    /// Delete a product (admin)
    Delete { id: String },
}

#[derive(Subcommand)]
enum UserAction {
    /// List users
    List,
    /// Change a user's username or role
    Update {
        id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// Delete a user
    Delete { id: String },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Migrate { database_url } => commands::migrate::run(database_url).await?,
        Commands::Api(command) => {
            let ctx = Context::open(&cli.api_url, cli.session_file).await?;
            dispatch(&ctx, command).await?;
        }
    }
    Ok(())
}

async fn dispatch(ctx: &Context, command: ApiCommand) -> Result<(), CliError> {
    match command {
        ApiCommand::Health => commands::auth::health(ctx).await?,
        ApiCommand::Init => commands::auth::init(ctx).await?,
        ApiCommand::Login { username, password } => {
            commands::auth::login(ctx, &username, password).await?;
        }
        ApiCommand::Logout => commands::auth::logout(ctx).await?,
        ApiCommand::Whoami => commands::auth::whoami(ctx).await?,
        ApiCommand::Signup {
            username,
            password,
            role,
        } => commands::auth::signup(ctx, &username, password, &role).await?,
        ApiCommand::Products { action } => match action {
            ProductAction::List { search, low_stock } => {
                commands::products::list(ctx, search.as_deref(), low_stock).await?;
            }
            ProductAction::Add {
                name,
                category,
                quantity,
                price,
                threshold,
            } => {
                let draft = lpg_core::NewProduct {
                    name,
                    category,
                    quantity,
                    price,
                    low_stock_threshold: threshold,
                };
                commands::products::add(ctx, &draft).await?;
            }
            ProductAction::Update {
                id,
                name,
                category,
                quantity,
                price,
                threshold,
            } => {
                let patch = lpg_core::ProductPatch {
                    name,
                    category,
                    quantity,
                    price,
                    low_stock_threshold: threshold,
                };
                commands::products::update(ctx, id, &patch).await?;
            }
            ProductAction::Delete { id } => commands::products::delete(ctx, id).await?,
        },
        ApiCommand::Users { action } => match action {
            UserAction::List => commands::users::list(ctx).await?,
            UserAction::Update { id, username, role } => {
                let patch = lpg_core::UserPatch {
                    username,
                    role: role.map(lpg_core::Role::new),
                };
                commands::users::update(ctx, id, &patch).await?;
            }
            UserAction::Delete { id } => commands::users::delete(ctx, id).await?,
        },
        ApiCommand::Stats => commands::stats::show(ctx).await?,
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_migrate_is_routed_apart_from_api_commands() {
        let cli = Cli::try_parse_from(["lpg", "migrate", "--database-url", "postgres://x"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate { database_url: Some(ref url) } if url == "postgres://x"
        ));

        let cli = Cli::try_parse_from(["lpg", "products", "list", "--low-stock"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Api(ApiCommand::Products {
                action: ProductAction::List { low_stock: true, .. }
            })
        ));
    }
}
