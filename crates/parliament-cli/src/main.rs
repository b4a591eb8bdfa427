//! Terminal front end for the AI parliament.
//!
//! # Usage
//!
//! ```bash
//! # List candidate papers
//! parliament papers
//!
//! # Debate the second imported paper and vote once it finishes
//! parliament debate --pick 2 --vote against
//!
//! # Resume the paper stored by an earlier run
//! parliament --store ~/.parliament/session.json debate
//!
//! # Faster playback against a remote backend
//! PARLIAMENT_API_URL=http://10.0.0.5:8000 parliament --interval-ms 300 debate --paper 12
//! ```

mod cli;
mod view;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{info, warn};

use cli::{Cli, Command, DebateArgs};
use parliament::{
    seat_distribution, FileSessionStore, HttpBackend, MemorySessionStore, PaperId,
    ParliamentBackend, ParliamentConfig, PlaybackOutcome, RequestOutcome, SessionController,
    SessionEvent, SharedSessionStore, VoteDisposition,
};
use view::EventPrinter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let config = args.resolve_config()?;
    info!(api = %config.api_base_url, source = %config.paper_source, "Parliament starting");

    match args.command {
        Command::Papers { json, .. } => list_papers(&config, json).await,
        Command::Debate(debate) => run_debate(config, debate).await,
        Command::Health => health(&config).await,
        Command::Seats { json } => seats(json),
        Command::Status { json } => status(config, json),
    }
}

fn open_store(config: &ParliamentConfig) -> Result<SharedSessionStore> {
    Ok(match &config.store_path {
        Some(path) => FileSessionStore::open(path)
            .with_context(|| format!("opening session store {}", path.display()))?
            .shared(),
        None => MemorySessionStore::new().shared(),
    })
}

fn build_controller(config: ParliamentConfig) -> Result<SessionController> {
    let backend = Arc::new(HttpBackend::from_config(&config)?);
    let store = open_store(&config)?;
    Ok(SessionController::new(config, backend, store))
}

async fn list_papers(config: &ParliamentConfig, json: bool) -> Result<()> {
    let controller = build_controller(config.clone())?;
    let mut rx = controller.subscribe();
    let papers = controller.import_papers().await;

    let printer = EventPrinter::new(json);
    while let Ok(event) = rx.try_recv() {
        printer.print(&event);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&papers)?);
    } else if papers.is_empty() {
        println!("No papers available.");
    } else {
        for (i, paper) in papers.iter().enumerate() {
            println!("{}", view::format_paper(i, paper));
        }
    }
    Ok(())
}

async fn run_debate(config: ParliamentConfig, args: DebateArgs) -> Result<()> {
    let controller = build_controller(config)?;
    let printer = EventPrinter::new(args.json);
    let mut rx = controller.subscribe();

    if let Some(n) = args.pick {
        let papers = controller.import_papers().await;
        let paper = match n.checked_sub(1).and_then(|i| papers.get(i)) {
            Some(paper) => paper,
            None => bail!("no paper #{} among {} imported papers", n, papers.len()),
        };
        controller.select_paper(paper)?;
    } else if let Some(id) = args.paper {
        let paper_id = PaperId::new(id);
        match controller.lookup_paper(&paper_id).await {
            Some(paper) => controller.select_paper(&paper)?,
            None => controller.select(paper_id)?,
        };
    } else if controller.restore()?.is_none() {
        bail!("no paper selected: pass --paper <ID> or --pick <N>");
    }

    match controller.request_debate().await {
        RequestOutcome::Loaded(_) | RequestOutcome::AlreadyLoaded(_) => {}
        RequestOutcome::Failed(e) => {
            flush(&mut rx, &printer);
            bail!("debate generation failed: {}", e);
        }
        RequestOutcome::NoPaperSelected => bail!("no paper selected"),
        other => bail!("debate request did not complete: {:?}", other),
    }

    let mut player = tokio::spawn({
        let controller = controller.clone();
        async move { controller.play().await }
    });
    let interrupt = tokio::spawn({
        let controller = controller.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping playback");
                controller.cancel_playback();
            }
        }
    });

    let outcome = loop {
        tokio::select! {
            biased;
            event = rx.recv() => match event {
                Ok(event) => printer.print(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "View fell behind, events skipped"),
                Err(RecvError::Closed) => {}
            },
            joined = &mut player => break joined.context("playback task failed")?,
        }
    };
    interrupt.abort();
    flush(&mut rx, &printer);

    match outcome {
        PlaybackOutcome::Completed { .. } => {
            if let Some(choice) = args.vote {
                match controller.cast_vote(choice.into()).await? {
                    VoteDisposition::Cast(_) => {}
                    VoteDisposition::Rejected => println!("Voting is not open yet."),
                }
                flush(&mut rx, &printer);
            }
        }
        PlaybackOutcome::Cancelled { revealed } => {
            info!(revealed, "Playback cancelled");
        }
        PlaybackOutcome::NotReady => bail!("nothing to play"),
    }

    info!(status = %controller.status_line(), "Session finished");
    controller.teardown();
    Ok(())
}

/// Print whatever events are already buffered.
fn flush(rx: &mut tokio::sync::broadcast::Receiver<SessionEvent>, printer: &EventPrinter) {
    loop {
        match rx.try_recv() {
            Ok(event) => printer.print(&event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
}

async fn health(config: &ParliamentConfig) -> Result<()> {
    let backend = HttpBackend::from_config(config)?;
    let status = backend
        .health()
        .await
        .with_context(|| format!("backend at {} is not healthy", backend.base_url()))?;
    println!("{}: {}", backend.base_url(), status);
    Ok(())
}

fn seats(json: bool) -> Result<()> {
    let seats = seat_distribution();
    if json {
        println!("{}", serde_json::to_string_pretty(&seats)?);
    } else {
        for seat in &seats {
            println!("{}", view::format_seat(seat));
        }
        println!(
            "{:>4} seats  total",
            seats.iter().map(|s| s.seats).sum::<u32>()
        );
    }
    Ok(())
}

fn status(config: ParliamentConfig, json: bool) -> Result<()> {
    if config.store_path.is_none() {
        bail!("no session store configured: pass --store <PATH> or set PARLIAMENT_STORE_PATH");
    }
    let controller = build_controller(config)?;
    match controller.restore()? {
        Some(snapshot) if json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        Some(_) => println!("{}", controller.status_line()),
        None => println!("No stored session."),
    }
    Ok(())
}
