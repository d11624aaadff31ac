//! WSJT-X alert listener entry point.
//!
//! Loads the configuration, starts structured logging and runs the UDP
//! receive loop until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_or_init_config()  -- <exe>.toml or the path in argv[1]
//!  └─ open_log_file()        -- <config stem>.log, appended
//!  └─ bind_listener()        -- UDP socket on server.ip:server.port
//!  └─ run_listener()
//!       └─ DatagramProcessor -- envelope policy, decode, prefix rules
//!            └─ BellAlert    -- audible alert per hit
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use wsjtx_alert::application::process_datagram::DatagramProcessor;
use wsjtx_alert::domain::rules::PrefixRules;
use wsjtx_alert::infrastructure::alert::{BellAlert, BellPattern};
use wsjtx_alert::infrastructure::network::listener::{bind_listener, run_listener};
use wsjtx_alert::infrastructure::storage::config::{default_config_path, load_or_init_config};
use wsjtx_alert::infrastructure::storage::log_file::open_log_file;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = match std::env::args_os().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => default_config_path()?,
    };
    let (config, created) = load_or_init_config(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let log_path = config.log.file_path(&config_path);
    let log_file = match &log_path {
        Some(path) => Some(open_log_file(path)?),
        None => None,
    };

    // Initialise structured logging: console plus the optional append-only
    // file.  Level is overridden by `RUST_LOG`.
    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Arc::new(file))
    });
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .with(fmt::layer())
        .with(file_layer)
        .init();

    info!("WSJT-X alert starting (config {})", config_path.display());
    if created {
        info!("wrote starter config to {}", config_path.display());
    }
    if let Some(path) = &log_path {
        info!("appending log to {}", path.display());
    }

    let rules = PrefixRules::from(&config.prefixes);
    if rules.is_empty() {
        info!("no callsign or gridsquare prefixes configured; alerts are disabled");
    } else {
        info!(
            "alerting on callsign prefixes {:?} and gridsquare prefixes {:?}",
            rules.callsign, rules.gridsquare
        );
    }

    let addr = config.server.socket_addr()?;
    let socket = bind_listener(addr).await?;
    let sink = Arc::new(
        BellAlert::spawn(BellPattern::new(config.alert.repeat))
            .context("starting bell worker")?,
    );
    let processor = DatagramProcessor::new(rules, config.alert.reply_on_match, sink);

    let stats = run_listener(socket, processor, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => {
                error!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        }
    })
    .await;

    info!(
        "WSJT-X alert stopped after {} datagrams ({} alerts)",
        stats.received, stats.alerts
    );
    Ok(())
}
