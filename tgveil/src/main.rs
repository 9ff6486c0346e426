#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use clap::Parser;
use tgveil_core::config::{Config, FragmentationConfig};
use tgveil_core::{intercept, ip_refresh, Stats, TargetSet};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod privilege;

/// Transparent TCP segment splitter that defeats DPI classification of a
/// messaging service's traffic.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Path to configuration TOML file. Missing file falls back to defaults.
    #[arg(short, long, value_name = "FILE", default_value = "tgveil.toml")]
    config: PathBuf,

    /// Fixed first-fragment size (bytes). Overrides the config file and
    /// disables adaptive sizing. 1..=500.
    #[arg(long, value_name = "SIZE")]
    fragment_size: Option<usize>,

    /// Fixed inter-segment delay, in milliseconds. Requires --fragment-size.
    #[arg(long, value_name = "MS")]
    delay: Option<f64>,

    /// Enable debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = privilege::require_elevated() {
        error!(%err, "insufficient privileges to open the kernel intercept handle");
        std::process::exit(1);
    }

    let cfg = match tgveil_core::load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(%err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let mut frag_cfg = cfg.fragmentation.clone();
    if let Some(size) = cli.fragment_size {
        frag_cfg.adaptive = false;
        frag_cfg.fragment_size = size;
        if let Some(delay) = cli.delay {
            frag_cfg.delay_ms = delay;
        }
    }

    let targets = build_targets(&cfg);
    let stats = Arc::new(Stats::default());
    let running = Arc::new(AtomicBool::new(true));

    install_ctrlc_handler(running.clone());
    maybe_spawn_metrics_server(&cfg, stats.clone());

    let filter = cfg.capture.filter_expression();
    info!(filter, "opening kernel intercept handle");

    if let Err(err) = run_loop(&filter, &running, &targets, &frag_cfg, &stats) {
        error!(%err, "intercept loop exited with error");
        print_final_stats(&stats);
        std::process::exit(1);
    }

    print_final_stats(&stats);
}

fn build_targets(cfg: &Config) -> TargetSet {
    let mut targets = TargetSet::default();
    targets.union_config(&cfg.targets);

    if cfg.ip_refresh.enabled {
        let learned = ip_refresh::refresh(&cfg.ip_refresh);
        let prefixes: Vec<String> = learned
            .iter()
            .filter_map(|ip| ip_refresh::to_two_octet_prefix(ip))
            .collect();
        if prefixes.is_empty() {
            warn!("IP list refresh returned no usable prefixes, built-in set unchanged");
        } else {
            info!(count = prefixes.len(), "refreshed target IP prefixes");
            targets.union_prefixes(prefixes);
        }
    } else {
        info!("IP list refresh disabled by configuration");
    }

    targets
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) {
    let result = ctrlc::set_handler(move || {
        info!("interrupt received, shutting down");
        running.store(false, Ordering::Relaxed);
    });
    if let Err(err) = result {
        warn!(%err, "failed to install Ctrl-C handler, shutdown will require a kill");
    }
}

fn maybe_spawn_metrics_server(cfg: &Config, stats: Arc<Stats>) {
    if let Some(port) = cfg.metrics.port {
        info!(port, "starting metrics scrape endpoint");
        thread::spawn(move || tgveil_core::metrics_server::serve(port, stats));
    }
}

#[cfg(windows)]
fn run_loop(
    filter: &str,
    running: &Arc<AtomicBool>,
    targets: &TargetSet,
    frag_cfg: &FragmentationConfig,
    stats: &Stats,
) -> tgveil_core::Result<()> {
    let mut handle = tgveil_core::kernel::WinDivertHandle::open(filter)?;
    intercept::run(&mut handle, running, targets, frag_cfg, stats)
}

#[cfg(not(windows))]
fn run_loop(
    _filter: &str,
    _running: &Arc<AtomicBool>,
    _targets: &TargetSet,
    _frag_cfg: &FragmentationConfig,
    _stats: &Stats,
) -> tgveil_core::Result<()> {
    Err(tgveil_core::TgveilError::Driver(
        "the kernel intercept handle requires WinDivert, which is Windows-only".into(),
    ))
}

fn print_final_stats(stats: &Stats) {
    let snap = stats.snapshot();
    info!(
        total = snap.total,
        tls_records_seen = snap.tls_records_seen,
        target_flagged = snap.target_flagged,
        errors = snap.errors,
        udp_seen = snap.udp_seen,
        rst_blocked = snap.rst_blocked,
        fragmented = snap.fragmented,
        passed = snap.passed,
        split_errors = snap.split_errors,
        "final statistics"
    );
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
