//! Helmsman daemon entry point.
//!
//! Brings up the shared store, synchronizes with the low-level
//! controller, spawns the guidance tasks and then monitors them until
//! shutdown. Initialization failures exit non-zero; a clean shutdown
//! exits zero.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use helmsman::alarm::AlarmState;
use helmsman::config::Config;
use helmsman::error::{Error, Result};
use helmsman::gps::GpsFix;
use helmsman::mission::{Mission, MissionStatus};
use helmsman::otto::{OttoLink, OttoState};
use helmsman::store::Store;
use helmsman::threads::spawn_threads;
use helmsman::transport::SerialTransport;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("helmsman v{} starting", env!("CARGO_PKG_VERSION"));

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "helmsman.toml".to_string());
    log::info!("using config: {}", config_path);
    let config = Config::load(&config_path)?;

    let mission = Arc::new(Mission::load(&config.mission.file)?);
    log::info!(
        "mission \"{}\": {} attractors, {} repellors, launching at {}",
        mission.title,
        mission.attractors.len(),
        mission.repellors.len(),
        mission.launch.site
    );

    let store = Arc::new(Store::new());
    store.setup::<GpsFix>()?;
    store.setup::<OttoState>()?;
    store.setup::<MissionStatus>()?;
    store.setup::<AlarmState>()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    let ctrlc_shutdown = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        log::info!("received shutdown signal");
        ctrlc_shutdown.store(true, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("failed to set signal handler: {}", e)))?;

    // Bring up the controller link first: nothing can act without it.
    let mut otto_link = OttoLink::open(&config.otto, Arc::clone(&shutdown))?;
    if !otto_link.synchronize()? {
        log::info!("shutdown requested during controller sync");
        return Ok(());
    }
    let otto = otto_link.start(Arc::clone(&store))?;

    let gps_transport = SerialTransport::open(&config.gps.port, config.gps.baud)?;

    let handles = spawn_threads(
        Arc::clone(&store),
        mission,
        otto,
        Box::new(gps_transport),
        Arc::clone(&shutdown),
    )?;

    log::info!("all tasks running");

    // Monitor: a task stopping on its own means something is wrong
    // enough that the whole process should wind down.
    while !shutdown.load(Ordering::Relaxed) {
        if handles.any_finished() {
            log::error!("a guidance task stopped unexpectedly, shutting down");
            shutdown.store(true, Ordering::Relaxed);
            break;
        }
        std::thread::sleep(Duration::from_millis(500));
    }

    shutdown.store(true, Ordering::Relaxed);
    log::info!("waiting for tasks to finish");
    handles.join();
    otto_link.stop();

    log::info!("helmsman stopped");
    Ok(())
}
