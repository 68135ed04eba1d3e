//! # voxhomed: voice home control daemon
//!
//! Composition root that wires the adapters into the orchestration core and
//! runs the voice control loop.
//!
//! ## Responsibilities
//! - Load configuration (`voxhome.toml` + environment overrides)
//! - Install the `tracing` subscriber
//! - Construct the protocol adapter, the registry and the core services
//! - Run one discovery pass before accepting commands
//! - Run periodic discovery in the background
//! - Run the dispatch loop in the foreground until the exit phrase
//! - Stop background discovery cleanly on exit or ctrl-c
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no orchestration logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context as _;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use voxhome_adapter_console::ConsoleSpeech;
use voxhome_adapter_llm_http::LlmClient;
use voxhome_adapter_virtual::VirtualProtocol;
use voxhome_app::controller::DeviceController;
use voxhome_app::discovery::DiscoveryService;
use voxhome_app::dispatch::DispatchLoop;
use voxhome_app::interpreter::CommandInterpreter;
use voxhome_app::registry::DeviceRegistry;
use voxhome_app::scene_engine::SceneEngine;

use crate::config::Config;

fn main() -> anyhow::Result<()> {
    block_on_detached(run())?
}

/// Drive `future` to completion on a fresh runtime, then drop the runtime
/// without waiting for blocking tasks.
///
/// A pending stdin read sits on a blocking thread until the next line.
fn block_on_detached<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the tokio runtime")?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

async fn run() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let catalog = config
        .scene_catalog()
        .context("failed to build scene catalog")?;
    tracing::info!(scenes = ?catalog.names(), "scenes loaded");

    // Devices
    let adapter = Arc::new(if config.simulation.devices.is_empty() {
        VirtualProtocol::default()
    } else {
        VirtualProtocol::new(config.simulation.devices.iter().cloned())
    });
    let registry = Arc::new(DeviceRegistry::new());

    // Discovery: once before listening, then in the background
    let discovery = Arc::new(DiscoveryService::new(
        Arc::clone(&adapter),
        Arc::clone(&registry),
        config.scan_timeout(),
    ));
    match discovery.run_once().await {
        Ok(report) => tracing::info!(?report, devices = ?registry.names(), "initial discovery done"),
        Err(err) => tracing::warn!(%err, "initial discovery failed, starting with no devices"),
    }

    let shutdown = CancellationToken::new();
    let discovery_task =
        Arc::clone(&discovery).spawn_periodic(config.discovery_interval(), shutdown.clone());

    // Services
    let controller = Arc::new(DeviceController::new(
        adapter,
        registry,
        config.control_timeouts(),
    ));
    let scenes = SceneEngine::new(catalog, Arc::clone(&controller));
    let llm = LlmClient::new(config.interpreter.clone()).context("failed to build LLM client")?;
    if llm.config().api_key.is_none() {
        tracing::warn!("no interpreter API key configured, requests are sent unauthenticated");
    }
    let interpreter = CommandInterpreter::new(llm, config.interpreter_timeout());
    let speech = ConsoleSpeech::stdin(config.voice.exit_phrase.clone());

    let mut dispatch = DispatchLoop::new(
        speech,
        interpreter,
        scenes,
        controller,
        config.dispatch_settings(),
    );

    let ctrl_c = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        })
    };

    eprintln!(
        "voxhomed ready: type a command, or {:?} to quit",
        config.voice.exit_phrase
    );
    let summary = dispatch.run(&shutdown).await;

    shutdown.cancel();
    ctrl_c.abort();
    discovery_task
        .await
        .context("background discovery task failed")?;

    tracing::info!(
        cycles = summary.cycles,
        exited = summary.exited,
        "voxhomed stopped"
    );
    Ok(())
}
