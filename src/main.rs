// Main entry point - Dependency injection and command dispatch
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::application::archive_service::ArchiveService;
use crate::application::clock::{Clock, SystemClock};
use crate::application::session::{Session, ShutdownFlag};
use crate::infrastructure::archive::FileArchive;
use crate::infrastructure::config::load_logger_config;
use crate::infrastructure::line_reader::open_source;
use crate::infrastructure::output::SessionOutput;
use crate::presentation::archive_report::render_batch;
use crate::presentation::cli::{Cli, Command, InspectArgs, LogArgs};
use crate::presentation::console::ConsoleDashboard;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Log(args) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("building tokio runtime")?;
            let result = runtime.block_on(run_logger(args));
            // A pending stdin read holds a blocking thread that never returns on its own.
            runtime.shutdown_background();
            result
        }
        Command::Inspect(args) => {
            run_inspect(args);
            Ok(())
        }
    }
}

async fn run_logger(args: LogArgs) -> anyhow::Result<()> {
    // Load configuration
    let mut config = load_logger_config(args.config.as_deref()).context("loading logger config")?;
    args.apply(&mut config);

    // Acquire the line source before creating any output
    let source = match open_source(&config.source).await {
        Ok(source) => source,
        Err(err) => {
            tracing::error!(error = %err, "could not acquire line source");
            return Err(err).context("line source unavailable");
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let output = SessionOutput::create(&config.output.log_dir, clock.now(), config.output.save_statistics)
        .context("creating session output")?;

    let mut session = Session::new(config.session_settings(), output, clock);
    session.connect(source)?;

    let shutdown = ShutdownFlag::new();
    spawn_signal_listener(shutdown.clone());

    let mut dashboard = ConsoleDashboard::stdout(config.dashboard_refresh()).context("opening console dashboard")?;
    let result = session.run(&shutdown, &mut dashboard).await;
    dashboard.restore();
    let summary = result?;
    println!(
        "Session complete: {} points in {}s ({:.1} Hz), {} parameters",
        summary.total_points,
        summary.runtime.as_secs(),
        summary.average_rate,
        summary.parameters_tracked
    );
    Ok(())
}

/// Raise the shutdown flag on Ctrl+C (and SIGTERM on unix).
fn spawn_signal_listener(shutdown: ShutdownFlag) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = term.recv() => {}
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "SIGTERM handler unavailable");
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        let _ = tokio::signal::ctrl_c().await;

        shutdown.request();
    });
}

fn run_inspect(args: InspectArgs) {
    let service = ArchiveService::new(Arc::new(FileArchive));
    let batch = service.load_all(&args.files, args.format.map(Into::into));
    print!("{}", render_batch(&batch));
}
