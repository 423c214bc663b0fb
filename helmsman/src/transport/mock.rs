//! Scripted in-memory transport for tests.

use std::sync::{Arc, Mutex};

use super::Transport;
use crate::error::Result;

/// Test double standing in for a serial device.
///
/// Inbound bytes are queued with [`MockTransport::inject`]; outbound
/// frames accumulate for inspection through [`MockTransport::written`].
/// A scripted trigger can hold a canned reply back until a marker shows
/// up in the outbound stream, which is how the handshake exchange is
/// staged: everything before the marker is line noise as far as the far
/// end is concerned.
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    inbound: Vec<u8>,
    outbound: Vec<u8>,
    trigger: Option<(Vec<u8>, Vec<u8>)>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Queue bytes for the next polls.
    pub fn inject(&self, data: &[u8]) {
        self.script.lock().unwrap().inbound.extend_from_slice(data);
    }

    /// Make `reply` pollable once `marker` has gone out over the wire.
    pub fn reply_after(&self, marker: &[u8], reply: &[u8]) {
        self.script.lock().unwrap().trigger = Some((marker.to_vec(), reply.to_vec()));
    }

    /// Everything sent so far.
    pub fn written(&self) -> Vec<u8> {
        self.script.lock().unwrap().outbound.clone()
    }
}

impl Transport for MockTransport {
    fn poll(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut script = self.script.lock().unwrap();
        let n = script.inbound.len().min(buffer.len());
        buffer[..n].copy_from_slice(&script.inbound[..n]);
        script.inbound.drain(..n);
        Ok(n)
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        script.outbound.extend_from_slice(frame);

        if let Some((marker, reply)) = script.trigger.take() {
            let seen = script
                .outbound
                .windows(marker.len())
                .any(|w| w == marker.as_slice());
            if seen {
                script.inbound.extend_from_slice(&reply);
            } else {
                script.trigger = Some((marker, reply));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_round_trip() {
        let mock = MockTransport::new();
        mock.inject(b"abc");

        let mut transport = mock.clone();
        let mut buf = [0u8; 8];
        assert_eq!(transport.poll(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(transport.poll(&mut buf).unwrap(), 0);

        transport.send(b"xyz").unwrap();
        assert_eq!(mock.written(), b"xyz");
    }

    #[test]
    fn test_reply_held_until_marker() {
        let mock = MockTransport::new();
        mock.reply_after(b"PING", b"PONG");

        let mut transport = mock.clone();
        transport.send(b"noise ").unwrap();
        let mut buf = [0u8; 8];
        assert_eq!(transport.poll(&mut buf).unwrap(), 0);

        transport.send(b"PING").unwrap();
        assert_eq!(transport.poll(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"PONG");
    }

    #[test]
    fn test_short_poll_buffer_keeps_remainder() {
        let mock = MockTransport::new();
        mock.inject(b"abcdef");

        let mut transport = mock.clone();
        let mut buf = [0u8; 4];
        assert_eq!(transport.poll(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(transport.poll(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
    }
}
