use std::sync::Arc;
use std::time::Instant;

use strata_engine::generation::GenContext;
use strata_engine::world::position::ChunkCoord;
use strata_engine::world::World;
use strata_server::config::ServerConfig;
use strata_server::http::{self, AppState};
use strata_server::persistence;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ServerConfig::from_env();
    tracing::info!("strata -- voxel chunk store, seed {}", config.seed);

    let world = Arc::new(World::new(GenContext::new(config.seed)));

    // Saved chunks take precedence over generation.
    match persistence::load_into(&world, &config.world_dir) {
        Ok(0) => tracing::info!("No saved chunks found"),
        Ok(n) => tracing::info!("Loaded {} chunks from {}", n, config.world_dir.display()),
        Err(e) => tracing::error!("Failed to load saved chunks: {:#}", e),
    }

    // ── Warm the spawn area ──────────────────────────────────────────────
    if config.preload_radius > 0 {
        let start = Instant::now();
        let preload_world = Arc::clone(&world);
        let radius = config.preload_radius;
        match tokio::task::spawn_blocking(move || {
            preload_world.preload(ChunkCoord::default(), radius)
        })
        .await
        {
            Ok(n) => tracing::info!("Preloaded {} chunks ({:.2?})", n, start.elapsed()),
            Err(e) => tracing::error!("Preload failed: {}", e),
        }
    }

    // ── Periodic autosave ────────────────────────────────────────────────
    let save_world_ref = Arc::clone(&world);
    let save_dir = config.world_dir.clone();
    let autosave = config.autosave;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(autosave);
        interval.tick().await; // first tick is immediate, skip it
        loop {
            interval.tick().await;
            let world = Arc::clone(&save_world_ref);
            let dir = save_dir.clone();
            match tokio::task::spawn_blocking(move || persistence::save_world(&world, &dir)).await {
                Ok(Ok(n)) => tracing::info!("Autosave complete: {} chunks", n),
                Ok(Err(e)) => tracing::error!("Autosave failed: {:#}", e),
                Err(e) => tracing::error!("Autosave task panicked: {}", e),
            }
        }
    });

    // ── Serve until Ctrl+C ───────────────────────────────────────────────
    let state = Arc::new(AppState::new(Arc::clone(&world)));
    tokio::select! {
        result = http::serve(state, &config.bind) => {
            if let Err(e) = result {
                tracing::error!("Server error: {:#}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received, shutting down...");
        }
    }

    // ── Save on shutdown ─────────────────────────────────────────────────
    tracing::info!("Saving world before exit...");
    match persistence::save_world(&world, &config.world_dir) {
        Ok(n) => tracing::info!("Shutdown save complete: {} chunks written", n),
        Err(e) => tracing::error!("Shutdown save failed: {:#}", e),
    }
}
