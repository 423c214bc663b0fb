//! Reader thread for the controller link.
//!
//! Parses newline-terminated frames, mirrors them into the shared
//! [`OttoState`] record and publishes after every update. Malformed
//! frames are logged and discarded; the link stays usable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::alarm;
use crate::store::Store;
use crate::transport::{LineBuffer, SharedTransport};

use super::frame::Frame;
use super::state::{OttoState, TELEMETRY_CHANNELS};

/// Pause between empty polls; keeps the port lock available to the writer.
const IDLE_SLEEP: Duration = Duration::from_millis(5);

pub(super) fn reader_loop(
    port: SharedTransport,
    shutdown: Arc<AtomicBool>,
    store: Arc<Store>,
    read_timeout: Duration,
) {
    let mut state = OttoState::default();
    let mut lines = LineBuffer::new(256);
    let mut chunk = [0u8; 256];
    let mut last_rx = Instant::now();
    let mut unresponsive = false;
    let mut previous_uptime: Option<u32> = None;

    while !shutdown.load(Ordering::Relaxed) {
        let n = {
            let Ok(mut port) = port.lock() else {
                log::error!("reader: port lock poisoned, exiting");
                break;
            };
            match port.poll(&mut chunk) {
                Ok(n) => n,
                Err(e) => {
                    log::error!("reader: serial read failed: {}", e);
                    std::thread::sleep(Duration::from_millis(250));
                    continue;
                }
            }
        };

        if n == 0 {
            if !unresponsive && last_rx.elapsed() > read_timeout {
                unresponsive = true;
                let _ = alarm::raise(&store, alarm::MOTHER_UNRESP);
            }
            std::thread::sleep(IDLE_SLEEP);
            continue;
        }

        last_rx = Instant::now();
        if unresponsive {
            unresponsive = false;
            let _ = alarm::clear(&store, alarm::MOTHER_UNRESP);
        }

        for line in lines.push(&chunk[..n]) {
            handle_line(&line, &mut state, &mut previous_uptime, &store);
        }
    }

    log::info!("reader thread exiting");
}

fn handle_line(
    text: &str,
    state: &mut OttoState,
    previous_uptime: &mut Option<u32>,
    store: &Arc<Store>,
) {
    let frame = match Frame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            log::warn!("discarding malformed frame: {}", e);
            return;
        }
    };

    match frame {
        Frame::Status {
            alarms,
            awa,
            compass,
            rudder,
            sail,
        } => {
            state.alarm_status = alarms;
            state.actual_awa = awa;
            state.actual_compass = compass;
            state.actual_rudder = rudder;
            state.actual_sail = sail;
            if alarms != 0 {
                let _ = alarm::raise(store, alarms);
            }
        }
        Frame::Uptime(seconds) => {
            if previous_uptime.is_some_and(|prev| seconds < prev) {
                log::warn!(
                    "controller uptime went backwards ({} -> {}), controller rebooted",
                    previous_uptime.unwrap_or(0),
                    seconds
                );
                let _ = alarm::raise(store, alarm::OTTO_RESTART);
            }
            *previous_uptime = Some(seconds);
            state.otto_timestamp = seconds;
        }
        Frame::Mode(mode) => {
            log::info!("controller mode now {:#04x}", mode);
            state.mode = mode;
        }
        Frame::Telemetry { channel, sample } => {
            if (channel as usize) < TELEMETRY_CHANNELS {
                state.telemetry[channel as usize] = sample;
            }
        }
        Frame::Debug(text) => {
            log::info!("otto: {}", text);
            // Debug chatter carries no state; nothing to persist.
            return;
        }
    }

    if let Err(e) = store.save_and_publish(state) {
        log::error!("reader: failed to persist controller state: {}", e);
    }
}
