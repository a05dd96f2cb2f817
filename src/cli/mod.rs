pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "userdesk")]
#[command(about = "UserDesk CLI - operator tooling for the user-records API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print a bcrypt hash of a password for manual seeding")]
    HashPassword {
        #[arg(help = "Plaintext password to hash")]
        password: String,
    },

    #[command(about = "Create an admin account in the configured database")]
    SeedAdmin {
        #[arg(long, help = "Admin login email")]
        email: String,
        #[arg(long, help = "Plaintext password (stored hashed)")]
        password: String,
        #[arg(long, default_value = "Administrator", help = "Display name")]
        name: String,
        #[arg(long, default_value = "admin", help = "Admin role label")]
        role: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::HashPassword { password } => commands::admin::hash_password(&password),
        Commands::SeedAdmin { email, password, name, role } => {
            commands::admin::seed_admin(&email, &password, &name, &role).await
        }
    }
}
