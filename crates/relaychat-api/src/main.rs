//! Relaychat CLI and HTTP entry point.
//!
//! Binary name: `relaychat`
//!
//! Parses CLI arguments, initializes the database and services, then
//! dispatches to an admin command or starts the HTTP server.

mod cli;
mod http;
mod state;

use std::time::Duration;

use clap::Parser;
use relaychat_observe::tracing_setup::{init_tracing, shutdown_tracing, verbosity_directive};

use cli::{Cli, Commands};
use state::AppState;

/// How often idle anonymous sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(verbosity_directive(cli.verbose, cli.quiet), cli.otel) {
        eprintln!("Warning: failed to initialize tracing: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Serve { host, port } => serve(state, &host, port).await?,

        Commands::Usage { user } => {
            cli::usage::show_usage(&state, &user, cli.json).await?;
        }

        Commands::ResetUsage { user } => {
            cli::usage::reset_usage(&state, &user, cli.json).await?;
        }

        Commands::ClearHistory { user } => {
            cli::history::clear_history(&state, &user, cli.json).await?;
        }
    }

    Ok(())
}

async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let ai_info = state.chat_service.selector().current_info();
    tracing::info!(
        %addr,
        mode = %ai_info.mode,
        provider = %ai_info.name,
        data_dir = %state.data_dir.display(),
        "Relaychat listening"
    );

    println!(
        "  {} Relaychat listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!(
        "  {} {}",
        console::style("Provider:").dim(),
        console::style(&ai_info.name).bold()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let sweeper = relaychat_infra::session::spawn_sweeper(
        state.session_history.clone(),
        state.session_usage.clone(),
        SESSION_SWEEP_INTERVAL,
        state.server.session_ttl(),
    );
    let mode_reset = tokio::spawn(reset_mode_on_hangup(state.clone()));

    let router = http::router::build_router(state);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;
    sweeper.abort();
    mode_reset.abort();
    served?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Restore the configured initial provider mode on each SIGHUP.
#[cfg(unix)]
async fn reset_mode_on_hangup(state: AppState) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGHUP handler");
            return;
        }
    };
    while hangup.recv().await.is_some() {
        let ai_info = state.chat_service.selector().reset_mode();
        tracing::info!(mode = %ai_info.mode, provider = %ai_info.name, "Provider mode reset");
    }
}

#[cfg(not(unix))]
async fn reset_mode_on_hangup(_state: AppState) {}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
