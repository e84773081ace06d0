use std::io::BufRead;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;

use acf_server::{AcfServer, Backends, ServerConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::HashPassword(args) => cmd_hash_password(args),
        Command::GenSecret(args) => cmd_gen_secret(args),
        Command::CheckConfig(args) => cmd_check_config(args, &cli.format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServerConfig> {
    ServerConfig::load(path).context("failed to load configuration")
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind}"))?;
    }

    let backends = Backends::in_memory(&config);
    let server = AcfServer::new(config, backends).context("server configuration rejected")?;
    println!(
        "{} ACF pass server on {}",
        "✓".green().bold(),
        server.config().bind_addr.to_string().bold()
    );
    tracing::warn!("using in-memory stores; issued passes are lost on restart");

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(server.serve())?;
    Ok(())
}

fn cmd_hash_password(args: HashPasswordArgs) -> anyhow::Result<()> {
    let secret = match args.secret {
        Some(secret) => secret,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            line
        }
    };
    let secret = secret.trim();
    anyhow::ensure!(!secret.is_empty(), "password cannot be empty");

    let hash = acf_crypto::hash_password(secret)?;
    println!("{hash}");
    eprintln!("{} Set this as {}", "✓".green().bold(), "ADMIN_PASSWORD_HASH".cyan());
    Ok(())
}

fn cmd_gen_secret(args: GenSecretArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.bytes >= 16, "use at least 16 bytes of entropy");
    println!("{}", acf_crypto::random_hex(args.bytes));
    eprintln!("{} Set this as {}", "✓".green().bold(), "VERIFICATION_SECRET".cyan());
    Ok(())
}

fn cmd_check_config(args: CheckConfigArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let verdict = config.validate();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        OutputFormat::Text => {
            println!("Bind address: {}", config.bind_addr.to_string().bold());
            println!("Receipt prefix: {}", config.ledger.display_prefix.yellow());
            println!(
                "Admin auth: {} per {}s",
                config.gate.admin_auth.max_requests, config.gate.admin_auth.window_secs
            );
            println!(
                "Chat: {} per {}s via {}",
                config.gate.chat.max_requests,
                config.gate.chat.window_secs,
                config.chat.model.cyan()
            );
            for feature in config.disabled_features() {
                println!("  {} {} disabled (secret not set)", "!".yellow().bold(), feature);
            }
        }
    }

    verdict.context("configuration is invalid")?;
    println!("{} Configuration OK", "✓".green().bold());
    Ok(())
}
