//! UART transport over the `serialport` crate.

use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use super::Transport;
use crate::error::Result;

/// How long one poll blocks before reporting silence. Kept short so a
/// reader sharing the port mutex with a writer hands the lock over
/// promptly.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Serial link to the controller or the GPS receiver.
///
/// Both devices speak 8N1 with no flow control, which is what the
/// `serialport` crate configures by default; only the path, the line
/// rate and the poll interval vary.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(POLL_INTERVAL)
            .open()?;
        log::info!("opened serial port {} at {} baud", path, baud_rate);
        Ok(SerialTransport { port })
    }
}

impl Transport for SerialTransport {
    fn poll(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.port.read(buffer) {
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => Ok(0),
            other => Ok(other?),
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.port.write_all(frame)?;
        self.port.flush()?;
        Ok(())
    }
}
