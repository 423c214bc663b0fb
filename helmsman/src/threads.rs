//! Thread spawning for the guidance tasks.
//!
//! The Otto link spawns its own reader/writer pair; this module brings up
//! the remaining three tasks and hands the join handles back to `main`,
//! which acts as the monitor.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::unbounded;

use crate::error::{Error, Result};
use crate::gps::{self, GpsFix};
use crate::mission::{Mission, Supervisor};
use crate::nav::Navigator;
use crate::otto::OttoHandle;
use crate::store::Store;
use crate::transport::Transport;

/// Join handles for the spawned tasks.
pub struct Handles {
    pub gps: JoinHandle<()>,
    pub navigator: JoinHandle<()>,
    pub supervisor: JoinHandle<()>,
}

impl Handles {
    /// True when any task has stopped on its own.
    pub fn any_finished(&self) -> bool {
        self.gps.is_finished() || self.navigator.is_finished() || self.supervisor.is_finished()
    }

    pub fn join(self) {
        for (name, handle) in [
            ("gps-ingest", self.gps),
            ("navigator", self.navigator),
            ("mission-supervisor", self.supervisor),
        ] {
            if handle.join().is_err() {
                log::error!("{} thread panicked", name);
            }
        }
    }
}

/// Spawn the GPS ingest, navigator and mission supervisor tasks.
pub fn spawn_threads(
    store: Arc<Store>,
    mission: Arc<Mission>,
    otto: OttoHandle,
    gps_transport: Box<dyn Transport>,
    shutdown: Arc<AtomicBool>,
) -> Result<Handles> {
    let (event_tx, event_rx) = unbounded();

    // Subscribe before anything publishes so no wakeup is missed.
    let gps_wakeups = store.subscribe::<GpsFix>()?;

    let gps_store = Arc::clone(&store);
    let gps_shutdown = Arc::clone(&shutdown);
    let gps_handle = thread::Builder::new()
        .name("gps-ingest".to_string())
        .spawn(move || {
            gps::ingest_loop(gps_transport, gps_shutdown, gps_store);
        })
        .map_err(|e| Error::Other(format!("failed to spawn gps-ingest: {}", e)))?;

    let nav_store = Arc::clone(&store);
    let nav_otto = otto.clone();
    let nav_mission = Arc::clone(&mission);
    let nav_shutdown = Arc::clone(&shutdown);
    let navigator_handle = thread::Builder::new()
        .name("navigator".to_string())
        .spawn(move || {
            let mut navigator =
                Navigator::new(nav_store, nav_otto, &nav_mission, event_tx, gps_wakeups);
            navigator.run(&nav_shutdown);
        })
        .map_err(|e| Error::Other(format!("failed to spawn navigator: {}", e)))?;

    let supervisor_handle = thread::Builder::new()
        .name("mission-supervisor".to_string())
        .spawn(move || {
            let mut supervisor = Supervisor::new(store, otto, event_rx, shutdown);
            supervisor.run();
        })
        .map_err(|e| Error::Other(format!("failed to spawn mission-supervisor: {}", e)))?;

    Ok(Handles {
        gps: gps_handle,
        navigator: navigator_handle,
        supervisor: supervisor_handle,
    })
}
