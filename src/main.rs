use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pathscout::classify::{parse_status_list, parse_unmatched, OutcomePolicy};
use pathscout::probe::ProbeConfig;
use pathscout::scanner::{ScanConfig, ScanController, ScanEvent};
use pathscout::server::{self, AppState};
use pathscout::types::{Outcome, ProbeResult, ScanSnapshot};
use pathscout::wordlist;

/// pathscout — wordlist-driven web path discovery scanner with a tiny embedded web UI.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pathscout",
    version,
    about = "Wordlist-driven web path discovery scanner with a tiny embedded web UI. Authorized testing only.",
    long_about = None
)]
struct Cli {
    /// Target host or URL (e.g. example.com or http://10.0.0.5:8080). Required unless --serve-ui.
    #[arg(long)]
    target: Option<String>,

    /// Path to wordlist file (one path per line). Falls back to the built-in list.
    #[arg(long)]
    wordlist: Option<PathBuf>,

    /// Delay between consecutive probes in milliseconds.
    #[arg(long = "delay-ms", default_value_t = 250)]
    delay_ms: u64,

    /// Per-request timeout in milliseconds.
    #[arg(long = "timeout-ms", default_value_t = 10_000)]
    timeout_ms: u64,

    /// Status codes counted as found, e.g. "200-299,301,302". Codes in neither
    /// list (401, 403, 5xx, ...) get the --unmatched outcome.
    #[arg(long = "found-status", default_value = "200-399")]
    found_status: String,

    /// Status codes counted as not found. Checked before --found-status.
    #[arg(long = "not-found-status", default_value = "404,410")]
    not_found_status: String,

    /// Outcome for codes in neither list: found, not_found or error.
    /// Use "found" to report protected paths (401/403) as hits.
    #[arg(long, default_value = "not_found")]
    unmatched: String,

    /// User-Agent header sent with every probe.
    #[arg(long = "user-agent")]
    user_agent: Option<String>,

    /// Follow redirects instead of reporting the 3xx status.
    #[arg(long = "follow-redirects", default_value_t = false)]
    follow_redirects: bool,

    /// Accept invalid TLS certificates.
    #[arg(long, default_value_t = false)]
    insecure: bool,

    /// Write results as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Start the embedded HTTP UI server instead of a one-shot terminal scan.
    #[arg(long = "serve-ui", default_value_t = false)]
    serve_ui: bool,

    /// Bind address for the UI server.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Directory with the static UI files.
    #[arg(long = "ui-dir", default_value = "ui")]
    ui_dir: PathBuf,

    /// Enable debug logging.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = format!("pathscout={level},tower_http={level},reqwest=warn,hyper=warn");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let policy = OutcomePolicy {
        found: parse_status_list(&cli.found_status).context("--found-status")?,
        not_found: parse_status_list(&cli.not_found_status).context("--not-found-status")?,
        unmatched: parse_unmatched(&cli.unmatched).context("--unmatched")?,
    };
    let scan_config = ScanConfig {
        delay: Duration::from_millis(cli.delay_ms),
        policy,
    };
    let mut probe_config = ProbeConfig {
        timeout: Duration::from_millis(cli.timeout_ms),
        follow_redirects: cli.follow_redirects,
        accept_invalid_certs: cli.insecure,
        ..ProbeConfig::default()
    };
    if let Some(ua) = cli.user_agent.clone() {
        probe_config.user_agent = ua;
    }

    let paths = match cli.wordlist.as_deref() {
        Some(p) => wordlist::load_wordlist_from_path(p)?,
        None => wordlist::default_wordlist(),
    };

    println!("pathscout configuration:");
    println!("  target       : {}", cli.target.as_deref().unwrap_or("<none>"));
    println!(
        "  wordlist     : {} ({} paths)",
        cli.wordlist
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<built-in>".to_string()),
        paths.len()
    );
    println!("  delay_ms     : {}", cli.delay_ms);
    println!("  timeout_ms   : {}", cli.timeout_ms);
    println!(
        "  output       : {}",
        cli.output
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!("  serve_ui     : {}", cli.serve_ui);

    let controller = ScanController::with_http(scan_config, &probe_config)?;

    if cli.serve_ui {
        let state = AppState::new(controller.clone(), paths);
        println!("UI server starting at http://{} (Ctrl+C to stop)", cli.bind);
        // A bind or serve error ends the process instead of idling until Ctrl+C.
        let served = tokio::select! {
            res = server::spawn_server(&cli.bind, state, cli.ui_dir.clone()) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        };
        if controller.state().is_active() {
            let _ = controller.stop().await;
        }
        return served.with_context(|| format!("HTTP UI server on {}", cli.bind));
    }

    let target = cli
        .target
        .as_deref()
        .context("--target is required unless --serve-ui is given")?;

    let mut events = controller.subscribe();
    controller.start(target, paths).await?;

    // Ctrl-C stops the scan; results gathered so far are kept.
    let ctrlc = controller.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = ctrlc.stop().await;
    });

    loop {
        match events.recv().await {
            Ok(ScanEvent::Probed(update)) => {
                if update.result.outcome != Outcome::NotFound {
                    print_result_line(&update.result, update.progress);
                }
            }
            Ok(ScanEvent::Finished { .. }) => break,
            Ok(ScanEvent::Started { .. }) => {}
            Err(RecvError::Lagged(n)) => warn!(skipped = n, "progress output lagged"),
            Err(RecvError::Closed) => break,
        }
    }

    let snapshot = controller.snapshot().await;
    print_results_table(&snapshot);
    if let Some(path) = cli.output.as_deref() {
        if let Err(e) = write_results_json(path, &snapshot) {
            eprintln!("Failed to write JSON to {}: {}", path.display(), e);
        } else {
            println!("Wrote JSON results to {}", path.display());
        }
    }

    Ok(())
}

fn print_result_line(r: &ProbeResult, progress: f64) {
    println!(
        "[{:>5.1}%] {:<12} {:<6} {}",
        progress * 100.0,
        r.outcome,
        r.status,
        r.url
    );
}

fn print_results_table(snapshot: &ScanSnapshot) {
    let hits: Vec<&ProbeResult> = snapshot
        .results
        .iter()
        .filter(|r| r.outcome != Outcome::NotFound)
        .collect();

    let mut path_w = "path".len();
    let mut status_w = "status".len();
    for r in &hits {
        path_w = path_w.max(r.path.len().min(60));
        status_w = status_w.max(r.status.chars().count().min(STATUS_MAX));
    }
    let outcome_w = "unobservable".len();

    println!(
        "\nScan {}: {}/{} probed, found {}, not found {}, errors {}, unobservable {}",
        snapshot.state,
        snapshot.completed,
        snapshot.total,
        snapshot.stats.found,
        snapshot.stats.not_found,
        snapshot.stats.errors,
        snapshot.stats.unobservable
    );
    println!(
        "{:<path_w$}  {:<outcome_w$}  {:<status_w$}",
        "path",
        "outcome",
        "status",
        path_w = path_w,
        outcome_w = outcome_w,
        status_w = status_w
    );
    println!(
        "{:-<path_w$}  {:-<outcome_w$}  {:-<status_w$}",
        "",
        "",
        "",
        path_w = path_w,
        outcome_w = outcome_w,
        status_w = status_w
    );
    for r in hits {
        let status = clip(&r.status, STATUS_MAX);
        println!(
            "{:<path_w$}  {:<outcome_w$}  {:<status_w$}",
            r.path,
            r.outcome.to_string(),
            status,
            path_w = path_w,
            outcome_w = outcome_w,
            status_w = status_w
        );
    }
}

const STATUS_MAX: usize = 40;

/// First `max` characters of `s`, never splitting a multi-byte character.
fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn write_results_json(path: &std::path::Path, snapshot: &ScanSnapshot) -> anyhow::Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &snapshot.results)?;
    Ok(())
}
