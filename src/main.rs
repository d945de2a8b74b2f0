//! QR Attendance Scanner CLI
//!
//! Reads decoded QR payloads (from stdin, a FIFO, or a scripted demo),
//! submits registration numbers to the attendance server, and prints
//! the outcome of every submission as a status line.

use clap::{Parser, Subcommand};
use qr_attendance::{
    client::{AttendanceApi, HttpAttendanceClient},
    config::FileConfig,
    flash::{self, CookieJar, TerminalNotifier},
    metrics::ScanMetrics,
    pipeline::extract,
    scanner::{DecoderAdapter, LineDecoder, MockDecoder, ScannerController},
    status::StatusPresenter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "qr-attendance", version, about = "QR attendance scanner client")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Attendance server base URL (overrides the config file).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start scanning and submit every admitted code.
    Scan {
        /// File or FIFO with one decoded payload per line ("-" for stdin).
        #[arg(long, default_value = "-")]
        input: String,

        /// Use a scripted decoder instead of real input.
        #[arg(long)]
        demo: bool,
    },
    /// Print the registration number carried by a decoded payload.
    Extract { payload: String },
    /// Submit a single registration number.
    Mark { reg_no: String },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging; stdout is reserved for the status region.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match FileConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => FileConfig::default(),
    };
    if let Some(server) = &cli.server {
        config.server.base_url = server.clone();
    }
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    match cli.command {
        Command::Extract { payload } => match extract(Some(&payload)) {
            Some(id) => {
                println!("{id}");
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("No registration number in payload");
                ExitCode::FAILURE
            }
        },
        Command::Mark { reg_no } => mark_once(&config, &reg_no).await,
        Command::Scan { input, demo } => scan(config, &input, demo).await,
    }
}

async fn mark_once(config: &FileConfig, reg_no: &str) -> ExitCode {
    let Some(id) = extract(Some(reg_no)) else {
        eprintln!("Registration number is empty");
        return ExitCode::FAILURE;
    };
    let client = match HttpAttendanceClient::new(&config.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let outcome = client.submit(&id).await;
    let mut presenter = StatusPresenter::new(std::io::stdout());
    presenter.render(outcome.clone());
    match outcome {
        qr_attendance::AttendanceOutcome::Success(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

async fn scan(config: FileConfig, input: &str, demo: bool) -> ExitCode {
    info!("QR Attendance v{}", qr_attendance::VERSION);

    let cookie_file = config.session.cookie_file.clone();
    let jar = match CookieJar::load(&cookie_file) {
        Ok(jar) => jar,
        Err(e) => {
            warn!(error = %e, "Starting with an empty cookie jar");
            CookieJar::new()
        }
    };
    let jar = Arc::new(Mutex::new(jar));
    show_flash(&jar, &cookie_file);

    let client = match HttpAttendanceClient::new(&config.server) {
        Ok(client) => Arc::new(client.with_cookie_jar(Arc::clone(&jar))),
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(url = %client.mark_url(), "Submitting to attendance endpoint");

    let metrics = match ScanMetrics::new() {
        Ok(metrics) => Arc::new(metrics),
        Err(e) => {
            eprintln!("Failed to create metrics registry: {}", e);
            return ExitCode::FAILURE;
        }
    };
    spawn_metrics_server(&config, &metrics);

    let shutdown = Arc::new(Notify::new());
    let handler_shutdown = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || handler_shutdown.notify_one()) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let code = if demo {
        let decoder = MockDecoder::new()
            .then(Duration::from_millis(500), "REG:A100")
            .then(Duration::from_millis(200), "REG:A100")
            .then(Duration::from_millis(500), "REG:B200")
            .then(Duration::from_secs(4), "REG:A100");
        run_session(decoder, client, &config, metrics, shutdown).await
    } else if input == "-" {
        run_session(LineDecoder::stdin(), client, &config, metrics, shutdown).await
    } else {
        run_session(LineDecoder::path(input), client, &config, metrics, shutdown).await
    };

    // Persist cookies set by the server for the next launch.
    let saved = match jar.lock() {
        Ok(jar) => jar.save(&cookie_file),
        Err(_) => Ok(()),
    };
    if let Err(e) = saved {
        warn!(error = %e, "Failed to save cookies");
    }
    code
}

async fn run_session<D: DecoderAdapter>(
    decoder: D,
    client: Arc<HttpAttendanceClient>,
    config: &FileConfig,
    metrics: Arc<ScanMetrics>,
    shutdown: Arc<Notify>,
) -> ExitCode {
    let mut scanner = ScannerController::new(
        decoder,
        client,
        StatusPresenter::new(std::io::stdout()),
        config.scanner.clone(),
    )
    .with_metrics(metrics);

    if scanner.start().await.is_err() {
        return ExitCode::FAILURE;
    }
    scanner.run_until(async move { shutdown.notified().await }).await;
    ExitCode::SUCCESS
}

fn show_flash(jar: &Mutex<CookieJar>, cookie_file: &std::path::Path) {
    let Ok(mut jar) = jar.lock() else {
        return;
    };
    let mut notifier = TerminalNotifier::new(std::io::stdout());
    if flash::take_flash(&mut jar, &mut notifier).is_some() {
        if let Err(e) = jar.save(cookie_file) {
            warn!(error = %e, "Failed to clear flash cookie");
        }
    }
}

#[cfg(feature = "metrics")]
fn spawn_metrics_server(config: &FileConfig, metrics: &Arc<ScanMetrics>) {
    use qr_attendance::metrics::{MetricsServer, MetricsServerConfig};

    if config.metrics.port == 0 {
        return;
    }
    let server = MetricsServer::new(
        MetricsServerConfig::with_port(config.metrics.port),
        Arc::clone(metrics),
    );
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            warn!(error = %e, "Metrics server stopped");
        }
    });
}

#[cfg(not(feature = "metrics"))]
fn spawn_metrics_server(config: &FileConfig, _metrics: &Arc<ScanMetrics>) {
    if config.metrics.port != 0 {
        warn!("Metrics port configured but the `metrics` feature is disabled");
    }
}
