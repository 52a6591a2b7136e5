//! School Portal CLI - Gate checks, menus and an interactive portal shell.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate the route gate offline
//! portal gate --path /learner-dashboard --role learner --verified
//!
//! # Show a role's navigation menu
//! portal menu --role teacher
//!
//! # Print the route table
//! portal routes
//!
//! # Talk to the backend at PORTAL_API_URL
//! portal shell
//! ```
//!
//! # Commands
//!
//! - `gate` - Evaluate the gate and landing resolver for a path
//! - `menu` - Print the navigation menu for a role
//! - `routes` - Print the client route table
//! - `shell` - Interactive session against the configured backend

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use school_portal_client::PortalConfig;
use school_portal_core::Role;

mod commands;
mod telemetry;

#[derive(Parser)]
#[command(name = "portal")]
#[command(author, version, about = "School portal CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the route gate for a path and session
    Gate {
        /// Requested path
        #[arg(short, long)]
        path: String,

        /// Role of the signed-in user (learner, teacher, admin)
        #[arg(short, long)]
        role: Option<Role>,

        /// Email is verified
        #[arg(long)]
        verified: bool,

        /// Learner is enrolled
        #[arg(long)]
        enrolled: bool,

        /// Nobody is signed in
        #[arg(long, conflicts_with = "role")]
        anonymous: bool,

        /// A session check is still in flight
        #[arg(long)]
        pending: bool,
    },
    /// Print the navigation menu for a role
    Menu {
        /// Role (learner, teacher, admin)
        #[arg(short, long)]
        role: Role,
    },
    /// Print the route table
    Routes,
    /// Start an interactive session against the backend
    Shell,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Only the shell talks to the backend; offline commands need no config
    let config = match cli.command {
        Commands::Shell => match PortalConfig::from_env() {
            Ok(config) => Some(config),
            Err(e) => {
                telemetry::init(None);
                tracing::error!("Invalid configuration: {e}");
                std::process::exit(2);
            }
        },
        _ => None,
    };

    let _sentry_guard = telemetry::init(config.as_ref());

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Option<PortalConfig>) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Gate {
            path,
            role,
            verified,
            enrolled,
            anonymous,
            pending,
        } => {
            let flags = commands::gate::SessionFlags {
                role,
                verified,
                enrolled,
                anonymous,
                pending,
            };
            commands::gate::run(&path, flags)?;
        }
        Commands::Menu { role } => commands::menu::print_menu(role),
        Commands::Routes => commands::menu::print_routes(),
        Commands::Shell => {
            if let Some(config) = config {
                commands::shell::run(config).await?;
            }
        }
    }
    Ok(())
}
