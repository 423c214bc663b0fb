//! Boot-time synchronization with the controller.
//!
//! Until the controller has seen the challenge line it treats everything
//! on the wire as line noise and discards it. The core sends `@@CQ!` and
//! waits for an acknowledgement line starting with `+CQOK` (or the short
//! form `+OK`). Missing acknowledgements are retried forever with a
//! stretching backoff - the controller may simply be rebooting, so a sync
//! failure is never fatal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::transport::{LineBuffer, SharedTransport};

/// Challenge line sent to the controller.
pub const HANDSHAKE: &[u8] = b"@@CQ!\r\n";

/// Seconds to wait before each retry; the last entry repeats.
const BACKOFF_SECONDS: [u64; 13] = [1, 1, 1, 1, 2, 2, 3, 5, 10, 10, 20, 30, 60];

/// Poll interval while waiting for the acknowledgement.
const ACK_POLL: Duration = Duration::from_millis(20);

/// Run the handshake until the controller answers or shutdown is
/// requested. Returns `Ok(true)` once synchronized, `Ok(false)` if
/// shutdown interrupted the wait.
pub fn synchronize(
    port: &SharedTransport,
    shutdown: &AtomicBool,
    ack_timeout: Duration,
) -> Result<bool> {
    let mut attempt = 0usize;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(false);
        }

        log::debug!("controller sync attempt {}", attempt + 1);
        if send_challenge(port).is_ok() && await_ack(port, shutdown, ack_timeout)? {
            log::info!("controller synchronized after {} attempt(s)", attempt + 1);
            return Ok(true);
        }

        let backoff = BACKOFF_SECONDS[attempt.min(BACKOFF_SECONDS.len() - 1)];
        attempt += 1;
        log::warn!(
            "controller did not acknowledge sync, retrying in {} s",
            backoff
        );
        if !sleep_interruptible(Duration::from_secs(backoff), shutdown) {
            return Ok(false);
        }
    }
}

fn send_challenge(port: &SharedTransport) -> Result<()> {
    let Ok(mut port) = port.lock() else {
        return Err(crate::error::Error::State(
            "controller port lock poisoned".to_string(),
        ));
    };
    port.send(HANDSHAKE)
}

/// Wait up to `ack_timeout` for a line starting with `+CQOK` or `+OK`.
fn await_ack(
    port: &SharedTransport,
    shutdown: &AtomicBool,
    ack_timeout: Duration,
) -> Result<bool> {
    let deadline = Instant::now() + ack_timeout;
    let mut lines = LineBuffer::new(64);
    let mut chunk = [0u8; 64];

    while Instant::now() < deadline {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(false);
        }

        let n = {
            let Ok(mut port) = port.lock() else {
                return Err(crate::error::Error::State(
                    "controller port lock poisoned".to_string(),
                ));
            };
            port.poll(&mut chunk)?
        };

        for line in lines.push(&chunk[..n]) {
            if line.starts_with("+CQOK") || line.starts_with("+OK") {
                return Ok(true);
            }
        }

        if n == 0 {
            std::thread::sleep(ACK_POLL);
        }
    }
    Ok(false)
}

fn sleep_interruptible(duration: Duration, shutdown: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        if shutdown.load(Ordering::Relaxed) {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    true
}
