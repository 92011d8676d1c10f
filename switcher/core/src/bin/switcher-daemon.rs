//! Switcher Daemon
//!
//! Headless demo process for the output routing engine. Seeds an in-memory
//! content store with a small event, spawns a surface per video output,
//! and logs a JSON snapshot of what every output is showing once a second.
//!
//! # Usage
//!
//! ```bash
//! # Start with defaults
//! switcher-daemon
//!
//! # With a faster poll cadence
//! SWITCHER_POLL_REFRESH_MS=500 switcher-daemon
//!
//! # With verbose logging
//! RUST_LOG=debug switcher-daemon
//! ```
//!
//! # Environment Variables
//!
//! - `SWITCHER_POLL_REFRESH_MS`: Poll vote freshness cadence
//! - `SWITCHER_QA_REFRESH_MS`: Q&A queue freshness cadence
//! - `SWITCHER_ENTER_DELAY_MS`: Enter transition delay (0-10000)
//! - `SWITCHER_BACKGROUND_FIRST`: Stagger the background layer in first
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)
//!
//! # Files
//!
//! - Config: `~/.config/switcher/switcher.toml` (optional)
//!
//! # Signals
//!
//! - SIGTERM/SIGINT: Graceful shutdown (stops every surface loop)

use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tracing::{info, warn};

use switcher_core::{
    load_config, LayoutVariant, LiveSnapshot, OperatorConsole, OutputAssignment, OutputIndex,
    OutputSurface, Poll, QaQuestion, QaSession, SurfaceHandle,
};
use switcher_core::{ContentRepository, InMemoryRepository};

/// Seed the demo event: one poll live everywhere, a Q&A session with two
/// questions ready for the operator walk-through.
fn seed_demo_content(repository: &InMemoryRepository) {
    let poll = Poll::new("Which feature should we ship next?")
        .with_option("Dark mode")
        .with_option("Offline sync")
        .with_option("Plugins")
        .with_assignment(OutputAssignment::all_outputs(LayoutVariant::LowerThird))
        .active();
    repository.insert_poll(poll);

    let session = QaSession::new("Town hall").with_default_assignment(
        OutputAssignment::new().with(LayoutVariant::FullScreen, [OutputIndex::Two]),
    );
    let session_id = repository.insert_session(session);

    repository.insert_question(
        QaQuestion::new("What is the roadmap for next quarter?").in_session(session_id.clone()),
    );
    repository
        .insert_question(QaQuestion::new("When does the beta open?").in_session(session_id));

    info!("demo content seeded");
}

/// Walk the seeded Q&A queue once so a fresh run shows every transition.
async fn demo_operator_script(console: OperatorConsole) {
    let Ok(items) = console.repository().list_qa_items().await else {
        return;
    };
    let questions: Vec<_> = items
        .iter()
        .filter_map(|item| item.as_question())
        .map(|q| q.id.clone())
        .collect();
    let [first, second] = questions.as_slice() else {
        return;
    };

    tokio::time::sleep(Duration::from_secs(5)).await;
    console.cue(first).await;
    console.set_next(second, true).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    console.play(first).await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    console.stop(first).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    console.play(second).await;
}

/// Once a second, log what every output is showing as one JSON line.
async fn snapshot_loop(repository: Arc<dyn ContentRepository>) {
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    loop {
        tick.tick().await;
        let (polls, qa_items) = match (
            repository.list_polls().await,
            repository.list_qa_items().await,
        ) {
            (Ok(polls), Ok(qa_items)) => (polls, qa_items),
            _ => continue,
        };
        let snapshot = LiveSnapshot::capture(&polls, &qa_items);
        match serde_json::to_string(&snapshot) {
            Ok(json) => info!(live = snapshot.live_count(), %json, "live snapshot"),
            Err(e) => warn!(error = %e, "snapshot serialization failed"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("switcher_daemon=info".parse()?)
                .add_directive("switcher_core=info".parse()?),
        )
        .with_target(true)
        .init();

    info!("Starting Switcher Daemon");
    info!("PID: {}", std::process::id());

    let config = load_config()?;
    info!(source = %config.source(), "configuration loaded");

    let repository = Arc::new(InMemoryRepository::new());
    seed_demo_content(&repository);

    // One surface per video output.
    let handles: Vec<SurfaceHandle> = OutputIndex::ALL
        .into_iter()
        .map(|output| {
            OutputSurface::new(
                Arc::clone(&repository) as Arc<dyn ContentRepository>,
                output,
                config.clone(),
            )
            .spawn()
        })
        .collect();

    let console = OperatorConsole::new(
        Arc::clone(&repository) as Arc<dyn ContentRepository>,
        config,
    );
    tokio::spawn(demo_operator_script(console));
    tokio::spawn(snapshot_loop(
        Arc::clone(&repository) as Arc<dyn ContentRepository>
    ));

    info!("All output surfaces running");

    // Wait for a shutdown signal
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        () = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }

    // Graceful shutdown
    info!("Stopping output surfaces...");
    for handle in handles {
        handle.shutdown().await;
    }

    info!("Switcher daemon stopped cleanly");
    Ok(())
}
