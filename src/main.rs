//! gridstash - authoritative inventory host
//!
//! Loads the server config and item pack, then serves inventories over QUIC
//! until interrupted.

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use config::{ServerConfig, DEFAULT_CONFIG_PATH};
use gridstash_server::multiplayer::MultiplayerServer;
use gridstash_server::Server;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Server-authoritative grid inventory host", long_about = None)]
struct Args {
    /// Server config file (TOML)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Address to listen on, overrides the config
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Item pack (JSON), overrides the config
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Record accepted requests to <DIR>/requests.jsonl
    #[arg(long, value_name = "DIR")]
    request_log_dir: Option<PathBuf>,
    /// Host ticks per second, overrides the config
    #[arg(long)]
    tick_rate: Option<u32>,
    /// Write the effective config to --config and exit
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // INFO by default, overridable via RUST_LOG.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("Starting gridstash v{}", env!("CARGO_PKG_VERSION"));

    let mut cfg = ServerConfig::load_from_path(&args.config);
    apply_overrides(&mut cfg, &args);

    if args.write_config {
        cfg.save_to_path(&args.config)?;
        info!("Wrote config to {}", args.config.display());
        return Ok(());
    }

    let catalog = gridstash_assets::catalog_from_file(&cfg.catalog_path).with_context(|| {
        format!("Failed to load item pack {}", cfg.catalog_path.display())
    })?;
    info!(items = catalog.len(), "Item catalog loaded");

    let mut server = Server::new(Arc::new(catalog), cfg.server_settings());
    if let Some(dir) = &cfg.request_log_dir {
        server.enable_request_log(dir)?;
    }

    let mut host = MultiplayerServer::bind(cfg.bind_addr, server)?;
    info!("Listening on {}", host.local_addr());

    host.run(cfg.tick_rate_hz, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested");
    })
    .await?;

    info!(ticks = host.current_tick().0, "Server stopped");
    Ok(())
}

fn apply_overrides(cfg: &mut ServerConfig, args: &Args) {
    if let Some(bind) = args.bind {
        cfg.bind_addr = bind;
    }
    if let Some(catalog) = &args.catalog {
        cfg.catalog_path = catalog.clone();
    }
    if let Some(dir) = &args.request_log_dir {
        cfg.request_log_dir = Some(dir.clone());
    }
    if let Some(rate) = args.tick_rate {
        if rate == 0 {
            warn!("--tick-rate 0 ignored, keeping {}", cfg.tick_rate_hz);
        } else {
            cfg.tick_rate_hz = rate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "gridstash",
            "--bind",
            "127.0.0.1:9000",
            "--catalog",
            "packs/items.json",
            "--tick-rate",
            "0",
        ]);
        let mut cfg = ServerConfig::default();
        apply_overrides(&mut cfg, &args);

        assert_eq!(cfg.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.catalog_path, PathBuf::from("packs/items.json"));
        assert_eq!(cfg.tick_rate_hz, 20);
        assert!(cfg.request_log_dir.is_none());
    }

    #[test]
    fn default_args_use_default_config_path() {
        let args = Args::parse_from(["gridstash"]);
        assert_eq!(args.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(!args.write_config);
    }
}
