use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use manger::{keyfile, AttackConfig, CancelToken, ProcessOracle, WireEncoding};

#[derive(Parser)]
#[command(author, version, about = "Manger's attack against an RSA-OAEP decryption oracle", long_about = None)]
struct Cli {
    /// Target program acting as the decryption oracle
    target: PathBuf,

    /// Key file: N, E, optional label L, and C, one base-16 field per line
    keyfile: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Candidate ciphertext serialization (hex or octet)
    #[arg(short, long, value_parser = parse_encoding)]
    encoding: Option<WireEncoding>,

    /// Per-query response timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Relaunch-and-resend attempts after a transport failure
    #[arg(short, long)]
    retries: Option<u32>,

    /// Abort after this many oracle queries
    #[arg(short, long)]
    max_queries: Option<u64>,

    /// Skip the EME-OAEP decode stage and report the raw encoded message
    #[arg(long)]
    raw: bool,

    /// Logging verbosity, overridden by RUST_LOG
    #[arg(short, long)]
    log_level: Option<String>,
}

fn parse_encoding(s: &str) -> Result<WireEncoding, String> {
    match s {
        "hex" => Ok(WireEncoding::Hex),
        "octet" => Ok(WireEncoding::Octet),
        _ => Err(format!("unknown encoding '{}', expected hex or octet", s)),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => AttackConfig::from_file(path)?,
        None => AttackConfig::default(),
    };
    if let Some(encoding) = cli.encoding {
        cfg.encoding = encoding;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        cfg.transport.timeout_ms = Some(timeout_ms);
    }
    if let Some(retries) = cli.retries {
        cfg.transport.retries = retries;
    }
    if cli.max_queries.is_some() {
        cfg.max_queries = cli.max_queries;
    }
    if cli.raw {
        cfg.oaep = false;
    }
    if cli.log_level.is_some() {
        cfg.log_level = cli.log_level.clone();
    }
    cfg.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_level.as_deref().unwrap_or("info")));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("initialising attack");
    let params = keyfile::load(&cli.keyfile)?;
    info!(k = params.k(), label = params.label().is_some(), "loaded key material");

    let cancel = CancelToken::new();
    let handler_cancel = cancel.clone();
    ctrlc::set_handler(move || handler_cancel.cancel())
        .context("failed to install interrupt handler")?;

    let oracle = ProcessOracle::spawn(
        &cli.target,
        params.k(),
        params.label_line().map(|l| l.as_bytes().to_vec()),
        cfg.encoding,
        cfg.transport.clone(),
    )?;

    info!("executing attack");
    let hash = if cfg.oaep { Some(cfg.hash) } else { None };
    let recovery = manger::execute(
        &params,
        oracle,
        cfg.convention,
        cfg.max_queries,
        hash,
        cancel,
    )
    .context("attack failed")?;

    info!("attack complete");
    println!("Elapsed time: {:.2}s", recovery.elapsed.as_secs_f64());
    println!("Interactions: {}", recovery.interactions);
    println!("EM: [{:X}]", recovery.em);

    match recovery.message {
        Some(Ok(message)) => println!("Target material: [{}]", hex::encode_upper(message)),
        Some(Err(e)) => warn!("recovered EM but decoding failed: {}", e),
        None => (),
    }

    Ok(())
}
