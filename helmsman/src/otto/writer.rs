//! Writer thread and the typed register-write API.
//!
//! Callers enqueue [`RegisterWrite`]s through a cloneable [`OttoHandle`];
//! the writer thread frames them as `R<reg>=<hex>\r\n` and owns the
//! write half of the shared port. Requests are fire-and-forget: the
//! caller never blocks beyond the bounded queue.
//!
//! A write that would re-send the register's last sent value is
//! suppressed, which also makes the forced mode transitions idempotent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::error::{Error, Result};
use crate::transport::SharedTransport;

use super::registers::{
    angle_to_register, awa_to_register, rudder_to_register, sail_to_register, OttoMode, Register,
};

/// Depth of the register-write queue.
const QUEUE_DEPTH: usize = 64;

/// How long the writer blocks on an empty queue before rechecking the
/// shutdown flag.
const DEQUEUE_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial write retries before a request is dropped.
const WRITE_ATTEMPTS: u32 = 3;

/// One queued register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWrite {
    pub register: Register,
    pub value: u16,
}

/// Cloneable sender half of the register-write queue.
///
/// The typed helpers encode application units into register units and
/// enforce the controller's mode rules: commanding the rudder or sail
/// directly forces MANUAL, steering a compass heading forces
/// TRACK_COMPASS, steering an apparent wind angle forces TRACK_AWA.
#[derive(Clone)]
pub struct OttoHandle {
    tx: Sender<RegisterWrite>,
}

impl OttoHandle {
    /// Enqueue a raw register write.
    pub fn write_register(&self, register: Register, value: u16) -> Result<()> {
        self.tx
            .send(RegisterWrite { register, value })
            .map_err(|_| Error::Other("otto writer queue closed".to_string()))
    }

    /// Command the rudder in degrees, [-40, +40]. Forces MANUAL.
    pub fn set_rudder(&self, degrees: f64) -> Result<()> {
        self.write_register(Register::Mode, OttoMode::Manual.code() as u16)?;
        self.write_register(Register::RudderAngle, rudder_to_register(degrees) as u16)
    }

    /// Command the sail trim in percent, [0, 100]. Forces MANUAL.
    pub fn set_sail(&self, percent: f64) -> Result<()> {
        self.write_register(Register::Mode, OttoMode::Manual.code() as u16)?;
        self.write_register(Register::SailAngle, sail_to_register(percent) as u16)
    }

    /// Hand the controller a compass heading to hold, radians.
    /// Forces TRACK_COMPASS.
    pub fn steer_compass(&self, radians: f64) -> Result<()> {
        self.write_register(Register::Mode, OttoMode::TrackCompass.code() as u16)?;
        self.write_register(
            Register::CompassHeading,
            angle_to_register(radians) as u16,
        )
    }

    /// Hand the controller an apparent wind angle to hold, radians.
    /// Forces TRACK_AWA.
    pub fn steer_awa(&self, radians: f64) -> Result<()> {
        self.write_register(Register::Mode, OttoMode::TrackAwa.code() as u16)?;
        self.write_register(Register::AwaHeading, awa_to_register(radians) as u16)
    }

    /// Acknowledge controller alarms.
    pub fn clear_alarms(&self, mask: u16) -> Result<()> {
        self.write_register(Register::AlarmClear, mask)
    }

    pub fn buzzer(&self, code: u8) -> Result<()> {
        self.write_register(Register::Buzzer, code as u16)
    }

    pub fn mission_control(&self, value: u8) -> Result<()> {
        self.write_register(Register::MissionControl, value as u16)
    }
}

/// Create the write queue, returning the caller handle and the receiver
/// consumed by [`writer_loop`]. Exposed so tests can drive an
/// [`OttoHandle`] without a serial port.
pub fn write_queue() -> (OttoHandle, Receiver<RegisterWrite>) {
    let (tx, rx) = bounded(QUEUE_DEPTH);
    (OttoHandle { tx }, rx)
}

pub(super) fn writer_loop(
    port: SharedTransport,
    shutdown: Arc<AtomicBool>,
    requests: Receiver<RegisterWrite>,
) {
    let mut last_sent: HashMap<Register, u16> = HashMap::new();

    while !shutdown.load(Ordering::Relaxed) {
        let request = match requests.recv_timeout(DEQUEUE_TIMEOUT) {
            Ok(request) => request,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if last_sent.get(&request.register) == Some(&request.value) {
            log::trace!(
                "suppressing redundant write R{}={:x}",
                request.register.number(),
                request.value
            );
            continue;
        }

        if send_frame(&port, &request) {
            last_sent.insert(request.register, request.value);
        }
    }

    log::info!("writer thread exiting");
}

/// Frame and send one register write, retrying transient I/O errors.
fn send_frame(port: &SharedTransport, request: &RegisterWrite) -> bool {
    let frame = encode(request);

    for attempt in 1..=WRITE_ATTEMPTS {
        let result = {
            let Ok(mut port) = port.lock() else {
                log::error!("writer: port lock poisoned");
                return false;
            };
            port.send(frame.as_bytes())
        };

        match result {
            Ok(()) => {
                log::debug!("sent {}", frame.trim_end());
                return true;
            }
            Err(e) => {
                log::warn!(
                    "register write failed (attempt {}/{}): {}",
                    attempt,
                    WRITE_ATTEMPTS,
                    e
                );
                std::thread::sleep(Duration::from_millis(50 * attempt as u64));
            }
        }
    }

    log::error!("dropping register write {}", frame.trim_end());
    false
}

/// Wire encoding: decimal register number, lowercase hex value.
fn encode(request: &RegisterWrite) -> String {
    format!("R{}={:x}\r\n", request.register.number(), request.value)
}
