pub mod config;
pub mod search;

use clap::{Parser, Subcommand};

/// Voice tour-guide gateway.
#[derive(Debug, Parser)]
#[command(name = "tourguide", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Query the knowledge index offline, as the guide's lookup tool would.
    Search {
        /// Free-text query.
        query: String,
        /// Maximum matches to print.
        #[arg(long, short = 'n')]
        limit: Option<usize>,
        /// Drop matches scoring below this.
        #[arg(long, default_value_t = 0.0)]
        min_score: f64,
        /// Print raw JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse and validate the config file.
    Validate,
    /// Print the resolved config with defaults filled in.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the config from `TG_CONFIG` (default `config.toml`), falling back
/// to defaults when the file does not exist.
pub fn load_config() -> anyhow::Result<(tg_domain::config::Config, String)> {
    let config_path = std::env::var("TG_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        tg_domain::config::Config::default()
    };

    Ok((config, config_path))
}
