// Copyright (C) 2026 the sharded-gateway contributors. This program is free
// software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation,
// version 3.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program. If not, see <https://www.gnu.org/licenses/>.

mod args;
mod bridge;
mod chunk_peer;
mod session;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chunk_peer::ChunkPeer;
use clap::Parser;
use color_eyre::eyre::{Context, Result};
use figment::providers::{Env, Format, Json};
use figment::Figment;
use gateway_common::GatewayConfig;
use gateway_db::Repository;
use gateway_kernel::dispatch::Dispatcher;
use gateway_kernel::{Caches, EventQueues, Scheduler};
use session::ClientRegistry;
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use crate::args::Args;
use crate::bridge::{DbCharacterFlusher, DbCharacterLoader};

/// Connection pool size for the one `Repository` this process opens. The
/// spec has no knob for it — every cache load and character round-trip
/// shares this pool.
const DB_MAX_CONNECTIONS: u32 = 10;

/// How often the dirty character cache is flushed to Postgres (§4.5).
const CHARACTER_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// How often each spawn zone's mobs take a wander step (§4.6).
const MOB_MOVE_INTERVAL: Duration = Duration::from_millis(300);

/// How often zones are checked for a due respawn fill (§4.6). Much
/// coarser than the wander tick — a zone's `respawn_time` is measured in
/// seconds, not milliseconds.
const ZONE_RESPAWN_INTERVAL: Duration = Duration::from_secs(2);

/// How often the shutdown poller checks the signal-driven kill switch.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(200);

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    let _log_guard = init_tracing(args.debug);

    let config: GatewayConfig = Figment::new()
        .merge(Json::file(&args.config))
        .merge(Env::prefixed("GATEWAY_").split("__"))
        .extract()
        .wrap_err("failed to load gateway configuration")?;

    let runtime = tokio::runtime::Runtime::new().wrap_err("failed to start tokio runtime")?;
    runtime.block_on(run(config))
}

fn init_tracing(debug: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_ansi(true)
        .with_file(true)
        .with_target(false)
        .with_line_number(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::NONE)
        .with_max_level(if debug { Level::DEBUG } else { Level::INFO })
        .with_writer(writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to install tracing subscriber");
    guard
}

async fn run(config: GatewayConfig) -> Result<()> {
    let repo = Repository::connect(&config.database.connection_string(), DB_MAX_CONNECTIONS)
        .await
        .wrap_err("failed to connect to the database")?;

    let caches = Arc::new(Caches::default());
    preload_caches(&repo, &caches).await?;

    let queues = EventQueues::new();
    let client_registry = Arc::new(ClientRegistry::new());
    let chunk_peer = ChunkPeer::new();

    let handle = Handle::current();
    let loader = Arc::new(DbCharacterLoader::new(repo.clone(), handle.clone()));
    let flusher = Arc::new(DbCharacterFlusher::new(repo.clone(), handle, caches.clone()));

    let dispatcher = Dispatcher::new(
        caches.clone(),
        queues.clone(),
        client_registry.clone(),
        chunk_peer.clone(),
        loader,
        flusher,
        config.game_server.event_batch_size,
        config.game_server.ping_batch_size,
    );
    let dispatcher_handles = dispatcher.start();

    let scheduler = Scheduler::start();
    let flush_task_id = schedule_character_flush(&scheduler, repo.clone(), caches.clone());
    let mob_task_id = schedule_mob_moves(&scheduler, caches.clone());
    let respawn_task_id = schedule_zone_respawns(&scheduler, caches.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = TcpListener::bind((config.game_server.host.as_str(), config.game_server.port))
        .await
        .wrap_err("failed to bind client acceptor")?;
    info!(host = %config.game_server.host, port = config.game_server.port, "client acceptor listening");

    let acceptor_task = tokio::spawn(session::run_acceptor(
        listener,
        queues.clone(),
        caches.clone(),
        client_registry.clone(),
        shutdown_rx.clone(),
    ));

    let chunk_peer_task = tokio::spawn(chunk_peer.clone().run(
        config.chunk_server.host.clone(),
        config.chunk_server.port,
        config.chunk_server.retry_base_seconds,
        config.chunk_server.max_retry_count,
        queues.clone(),
        caches.clone(),
        shutdown_rx.clone(),
    ));

    let kill_switch = Arc::new(AtomicBool::new(false));
    register_signal_handlers(&kill_switch)?;
    while !kill_switch.load(Ordering::SeqCst) {
        tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
    }
    info!("shutdown signal received, draining queues");

    let _ = shutdown_tx.send(true);
    queues.close_all();
    tokio::task::spawn_blocking(move || dispatcher_handles.join())
        .await
        .wrap_err("dispatcher shutdown task panicked")?;

    scheduler.remove(flush_task_id);
    scheduler.remove(mob_task_id);
    scheduler.remove(respawn_task_id);
    scheduler.stop();

    acceptor_task.abort();
    chunk_peer_task.abort();

    info!("gateway daemon shut down cleanly");
    Ok(())
}

async fn preload_caches(repo: &Repository, caches: &Arc<Caches>) -> Result<()> {
    caches.items.load_all(repo.load_items().await.wrap_err("failed to load items")?);
    caches.npcs.load_all(repo.load_npcs().await.wrap_err("failed to load npcs")?);
    caches.mobs.load_all(repo.load_mob_templates().await.wrap_err("failed to load mob templates")?);
    caches.chunks.load_all(repo.load_chunks().await.wrap_err("failed to load chunk servers")?);
    caches.spawn_zones.load_all(repo.load_spawn_zones().await.wrap_err("failed to load spawn zones")?);
    info!(
        items = caches.items.len(),
        npcs = caches.npcs.len(),
        mob_templates = caches.mobs.len(),
        chunks = caches.chunks.len(),
        spawn_zones = caches.spawn_zones.len(),
        "startup cache load complete"
    );
    Ok(())
}

fn schedule_character_flush(scheduler: &Scheduler, repo: Repository, caches: Arc<Caches>) -> u64 {
    let handle = Handle::current();
    scheduler.schedule(CHARACTER_FLUSH_INTERVAL, move || {
        for character in caches.characters.dirty_snapshot() {
            let character_id = character.id;
            match handle.block_on(repo.flush_character(&character)) {
                Ok(()) => caches.characters.clear_dirty_if_unchanged(character_id, &character),
                Err(err) => tracing::warn!(character_id, error = %err, "scheduled character flush failed, will retry"),
            }
        }
    })
}

fn schedule_mob_moves(scheduler: &Scheduler, caches: Arc<Caches>) -> u64 {
    scheduler.schedule(MOB_MOVE_INTERVAL, move || {
        let mut rng = rand::rng();
        for zone_id in caches.spawn_zones.zone_ids() {
            gateway_kernel::spawn::move_mobs_in_zone(zone_id, &caches.spawn_zones, &mut rng);
        }
    })
}

/// §4.6's respawn task: refills every zone whose respawn timer is due (or
/// was never armed, which covers a zone's very first fill after startup).
fn schedule_zone_respawns(scheduler: &Scheduler, caches: Arc<Caches>) -> u64 {
    scheduler.schedule(ZONE_RESPAWN_INTERVAL, move || {
        let mut rng = rand::rng();
        gateway_kernel::spawn::process_respawns(&caches.spawn_zones, &caches.mobs, &mut rng);
    })
}

fn register_signal_handlers(kill_switch: &Arc<AtomicBool>) -> Result<()> {
    signal_hook::flag::register(signal_hook::consts::SIGTERM, kill_switch.clone())
        .wrap_err("failed to register SIGTERM handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, kill_switch.clone())
        .wrap_err("failed to register SIGINT handler")?;
    Ok(())
}
