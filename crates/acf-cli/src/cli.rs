use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "acf",
    about = "ACF festival pass service: donation passes, verification, admin console",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Hash an admin password for ADMIN_PASSWORD_HASH
    HashPassword(HashPasswordArgs),
    /// Generate a random verification secret
    GenSecret(GenSecretArgs),
    /// Load and validate the configuration without serving
    CheckConfig(CheckConfigArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct HashPasswordArgs {
    /// Password to hash; read from stdin when omitted
    pub secret: Option<String>,
}

#[derive(Args)]
pub struct GenSecretArgs {
    /// Number of random bytes
    #[arg(long, default_value_t = 32)]
    pub bytes: usize,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
