//! Application entry point — Boletim.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse CLI flags.
//! 3. Load [`AppConfig`] from disk (returns default on first run) and apply
//!    CLI overrides.
//! 4. Fetch the service's config endpoint to seed summary-mode / TTS
//!    defaults (best-effort — the client works offline from it).
//! 5. Bring up the audio engine ([`RodioEngine`], falling back to
//!    [`NullEngine`] when no output device exists).
//! 6. Build the orchestrator and spawn the [`SessionRunner`].
//! 7. Pump stdin lines into session commands until `sair`/EOF.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use boletim::api::{ConfigUpdateBody, HttpBulletinService, RequestOrchestrator};
use boletim::app::{self, Input};
use boletim::config::{AppConfig, SummaryMode, TtsEngine};
use boletim::player::{AudioEngine, NullEngine, PlaybackController, RodioEngine};
use boletim::session::SessionRunner;

/// Cliente de boletins de notícias em áudio.
#[derive(Debug, Parser)]
#[command(name = "boletim", version, about)]
struct Args {
    /// Base URL of the bulletin service (overrides the config file).
    #[arg(long)]
    base_url: Option<String>,

    /// Explicit path to settings.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run without audio output (text-only).
    #[arg(long)]
    no_audio: bool,

    /// Push local settings (summary mode, TTS engine, API keys) to the
    /// service's config endpoint at startup.
    #[arg(long)]
    push_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }

    let service = HttpBulletinService::from_config(&config.api);

    if args.push_config {
        match service.save_config(&ConfigUpdateBody::from_config(&config)).await {
            Ok(()) => log::info!("config: pushed local settings to the service"),
            Err(e) => log::warn!("config: push failed ({e})"),
        }
    }

    // Seed orchestrator defaults from the service's own config, when it is
    // reachable. Local settings stand in otherwise.
    match service.fetch_config().await {
        Ok(remote) => {
            if let Some(mode) = remote.ai_summary_mode.as_deref() {
                config.bulletin.summary_mode = SummaryMode::from_wire(mode);
            }
            if let Some(engine) = remote.tts_engine.as_deref() {
                config.tts.engine = TtsEngine::from_wire(engine);
            }
            log::info!(
                "config: seeded from service (summary {}, tts {})",
                config.bulletin.summary_mode.as_str(),
                config.tts.engine.as_str()
            );
        }
        Err(e) => {
            log::warn!("config: service config unavailable ({e}), using local settings");
        }
    }

    let (engine_tx, engine_rx) = mpsc::channel(32);
    let engine: Box<dyn AudioEngine> = if args.no_audio {
        Box::new(NullEngine)
    } else {
        match RodioEngine::spawn(engine_tx.clone()) {
            Ok(engine) => Box::new(engine),
            Err(e) => {
                log::warn!("player: {e} — continuing without audio output");
                Box::new(NullEngine)
            }
        }
    };
    let player = PlaybackController::new(engine);

    let orchestrator = Arc::new(RequestOrchestrator::new(Arc::new(service), config.clone()));

    let (command_tx, command_rx) = mpsc::channel(16);
    let (notice_tx, mut notice_rx) = mpsc::channel(64);

    let runner = SessionRunner::new(orchestrator, player, config, notice_tx);
    let runner_task = tokio::spawn(runner.run(command_rx, engine_rx));

    let printer = tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            println!("{}", app::render_notice(&notice));
        }
    });

    println!("Boletim de notícias — digite `ajuda` para os comandos.");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match app::parse_input(&line) {
            Input::Command(command) => {
                if command_tx.send(command).await.is_err() {
                    break;
                }
            }
            Input::Help => println!("{}", app::HELP),
            Input::Quit => break,
            Input::Empty => {}
            Input::Unknown(line) => {
                println!("Comando desconhecido: {line} (use `ajuda`)");
            }
        }
    }

    drop(command_tx);
    let _ = runner_task.await;
    let _ = printer.await;
    Ok(())
}
