//! Low-level controller link.
//!
//! The controller ("Otto") owns the rudder and sail servos, the compass
//! and the apparent-wind sensor, and actuates second by second on its
//! own. This module is the application's half of the link:
//!
//! - [`sync`] performs the boot handshake;
//! - a **reader thread** parses inbound frames into the shared
//!   [`OttoState`] record and publishes every update;
//! - a **writer thread** drains the register-write queue onto the wire.
//!
//! Both threads share one full-duplex serial port under a single-device
//! contract: short lock hold times, reads and writes interleaved.

pub mod frame;
pub mod registers;
pub mod state;
pub mod sync;

mod reader;
mod writer;

pub use registers::{OttoMode, Register};
pub use state::OttoState;
pub use writer::{write_queue, OttoHandle, RegisterWrite};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::OttoConfig;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::transport::{shared, SerialTransport, SharedTransport, Transport};

/// The application side of the controller serial link.
pub struct OttoLink {
    port: SharedTransport,
    read_timeout: Duration,
    shutdown: Arc<AtomicBool>,
    reader_handle: Option<JoinHandle<()>>,
    writer_handle: Option<JoinHandle<()>>,
}

impl OttoLink {
    /// Open the configured serial device.
    pub fn open(config: &OttoConfig, shutdown: Arc<AtomicBool>) -> Result<Self> {
        let transport = SerialTransport::open(&config.port, config.baud)?;
        Ok(OttoLink::with_transport(
            Box::new(transport),
            shutdown,
            Duration::from_secs(config.read_timeout_s),
        ))
    }

    /// Build a link over an arbitrary transport (tests use the mock).
    pub fn with_transport(
        transport: Box<dyn Transport>,
        shutdown: Arc<AtomicBool>,
        read_timeout: Duration,
    ) -> Self {
        OttoLink {
            port: shared(transport),
            read_timeout,
            shutdown,
            reader_handle: None,
            writer_handle: None,
        }
    }

    /// Run the boot handshake. Returns false if shutdown interrupted it.
    pub fn synchronize(&self) -> Result<bool> {
        sync::synchronize(&self.port, &self.shutdown, self.read_timeout)
    }

    /// Spawn the reader and writer threads and hand back the write API.
    pub fn start(&mut self, store: Arc<Store>) -> Result<OttoHandle> {
        let (handle, requests) = writer::write_queue();

        let reader_port = Arc::clone(&self.port);
        let reader_shutdown = Arc::clone(&self.shutdown);
        let read_timeout = self.read_timeout;
        self.reader_handle = Some(
            thread::Builder::new()
                .name("otto-reader".to_string())
                .spawn(move || {
                    reader::reader_loop(reader_port, reader_shutdown, store, read_timeout);
                })
                .map_err(|e| Error::Other(format!("failed to spawn otto-reader: {}", e)))?,
        );

        let writer_port = Arc::clone(&self.port);
        let writer_shutdown = Arc::clone(&self.shutdown);
        self.writer_handle = Some(
            thread::Builder::new()
                .name("otto-writer".to_string())
                .spawn(move || {
                    writer::writer_loop(writer_port, writer_shutdown, requests);
                })
                .map_err(|e| Error::Other(format!("failed to spawn otto-writer: {}", e)))?,
        );

        log::info!("otto link started");
        Ok(handle)
    }

    /// Join both threads. The shared shutdown flag must already be set.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reader_handle.take() {
            if handle.join().is_err() {
                log::error!("otto reader thread panicked");
            }
        }
        if let Some(handle) = self.writer_handle.take() {
            if handle.join().is_err() {
                log::error!("otto writer thread panicked");
            }
        }
    }
}

impl Drop for OttoLink {
    fn drop(&mut self) {
        self.stop();
    }
}
