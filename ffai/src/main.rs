use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use ffai::cli::Cli;
use ffai::config::Settings;
use ffai::errors::display_user_error;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load(&cli.overrides()) {
        Ok(settings) => settings,
        Err(err) => {
            display_user_error(&err);
            return ExitCode::FAILURE;
        }
    };

    let log_path = settings.log_path();
    if let Err(err) = init_tracing(&log_path, cli.verbose) {
        eprintln!("ffai: logging disabled: {err:#}");
    }
    setup_panic_handler(log_path);
    debug!("settings: provider={} data_dir={}", settings.provider, settings.data_dir.display());

    match ffai::run(cli, settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("command failed: {err:?}");
            display_user_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(log_path: &Path, verbose: bool) -> Result<()> {
    if let Some(dir) = log_path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let log_file = Arc::new(
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .with_context(|| format!("failed to open {}", log_path.display()))?,
    );

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("FFAI_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .try_init()
        .map_err(|e| anyhow!(e))
}

fn setup_panic_handler(log_path: PathBuf) {
    std::panic::set_hook(Box::new(move |panic_info| {
        let payload = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic payload".to_string()
        };

        let location = if let Some(location) = panic_info.location() {
            format!(
                "{}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            )
        } else {
            "Unknown location".to_string()
        };

        let backtrace = std::backtrace::Backtrace::capture();
        let backtrace_str = match backtrace.status() {
            std::backtrace::BacktraceStatus::Captured => format!("\nBacktrace:\n{backtrace}"),
            _ => String::new(),
        };

        let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC");
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            use std::io::Write;
            let _ = writeln!(
                file,
                "\n=== PANIC ===\nTimestamp: {timestamp}\nLocation: {location}\nMessage: {payload}{backtrace_str}\n"
            );
            let _ = file.flush();
        }

        tracing::error!("panic: {} at {}", payload, location);

        eprintln!("ffai crashed: {payload} ({location})");
        eprintln!("Details were written to {}", log_path.display());
    }));
}
