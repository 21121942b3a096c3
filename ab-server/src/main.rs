#![forbid(unsafe_code)]

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use ab_server_core::family::PlcFamily;
use ab_server_core::server;
use ab_server_core::tag::TagStore;
use ab_server_core::template::{parse_tag_spec, TemplateConnection};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// An Allen-Bradley PLC family simulator: speaks EtherNet/IP, CIP, and
/// (for the PCCC families) the PLC-5/SLC/MicroLogix command set over a
/// plain TCP listener.
#[derive(Parser, Debug)]
#[command(author, version, about = "Allen-Bradley PLC family simulator")]
struct Cli {
    /// PLC family to emulate: controllogix, micro800, omron, plc5, slc500, micrologix
    #[arg(long = "plc")]
    plc: String,

    /// ControlLogix connection path "a,b" (required only for --plc=controllogix)
    #[arg(long = "path")]
    path: Option<String>,

    /// TCP port to listen on
    #[arg(long, default_value_t = 44818)]
    port: u16,

    /// Reject this many Forward Opens before the next one succeeds
    #[arg(long = "reject_fo", default_value_t = 0)]
    reject_fo: u32,

    /// Artificial delay (milliseconds) applied before every reply is sent
    #[arg(long, default_value_t = 0)]
    delay: u64,

    /// Tag definition, repeatable. CIP: "Name:TYPE[dims]". PCCC: "N7[10]".
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Verbosity level, 0 (quiet) to 4 (trace)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=4))]
    debug: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let template = match build_template(&cli) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(("0.0.0.0", template.port)).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, port = template.port, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    info!(family = ?template.family, port = template.port, "listening");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    if let Err(e) = server::run(listener, Arc::new(template), shutdown_rx).await {
        error!(error = %e, "server exited with error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

fn build_template(cli: &Cli) -> Result<TemplateConnection, String> {
    let family = PlcFamily::from_name(&cli.plc).ok_or_else(|| format!("unknown PLC family \"{}\"", cli.plc))?;

    let path = match &cli.path {
        Some(s) => Some(parse_path(s)?),
        None => None,
    };
    if family.requires_path() && path.is_none() {
        return Err(format!("--plc={} requires --path=a,b", cli.plc));
    }

    let mut cip_tags = Vec::new();
    let mut pccc_tags = Vec::new();
    for spec in &cli.tags {
        let tag = parse_tag_spec(spec, family).map_err(|e| e.to_string())?;
        if family.is_pccc() {
            pccc_tags.push(tag);
        } else {
            cip_tags.push(tag);
        }
    }

    Ok(TemplateConnection {
        family,
        path,
        port: cli.port,
        reject_fo_count: cli.reject_fo,
        delay: Duration::from_millis(cli.delay),
        tags: Arc::new(TagStore::new(cip_tags, pccc_tags)),
    })
}

fn parse_path(s: &str) -> Result<(u8, u8), String> {
    let (a, b) = s.split_once(',').ok_or_else(|| format!("--path=\"{s}\" must be \"a,b\""))?;
    let a: u8 = a.trim().parse().map_err(|_| format!("--path=\"{s}\" has a non-numeric component"))?;
    let b: u8 = b.trim().parse().map_err(|_| format!("--path=\"{s}\" has a non-numeric component"))?;
    Ok((a, b))
}

/// Maps the `--debug=<0..4>` verbosity level to a default filter directive,
/// same shape as the original `debug_level` argument it replaces.
fn init_tracing(debug_level: u8) {
    let default = match debug_level {
        0 => "info",
        1 | 2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
}
