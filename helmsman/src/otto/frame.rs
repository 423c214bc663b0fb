//! Inbound frame format of the controller link.
//!
//! After synchronization the controller emits newline-terminated ASCII
//! frames whose first byte is a message tag:
//!
//! | Tag | Payload          | Meaning                                   |
//! |-----|------------------|-------------------------------------------|
//! | `$` | `AAAA:WWCC:RRSS` | status: alarms, AWA, compass, rudder, sail |
//! | `@` | `HHHHHH`         | seconds since controller boot (24-bit)     |
//! | `!` | `MM`             | controller mode                            |
//! | `>` | `CVVV`           | telemetry channel and 12-bit sample        |
//! | `*` | UTF-8 text       | debug log line                             |

use crate::error::{Error, Result};

/// One parsed controller frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `$AAAA:WWCC:RRSS` - full status snapshot, ~1 Hz.
    Status {
        alarms: u16,
        awa: i8,
        compass: u8,
        rudder: u8,
        sail: u8,
    },
    /// `@HHHHHH` - uptime seconds, ~0.25 Hz.
    Uptime(u32),
    /// `!MM` - mode change notification.
    Mode(u8),
    /// `>CVVV` - one telemetry sample.
    Telemetry { channel: u8, sample: u16 },
    /// `*...` - controller debug output, forwarded to the log.
    Debug(String),
}

impl Frame {
    /// Parse one frame line (without its newline terminator).
    pub fn parse(line: &str) -> Result<Frame> {
        let mut chars = line.chars();
        let tag = chars
            .next()
            .ok_or_else(|| Error::Parse("empty frame".to_string()))?;
        let payload = chars.as_str();

        match tag {
            '$' => parse_status(payload),
            '@' => {
                let uptime = parse_hex(payload, 6)?;
                Ok(Frame::Uptime(uptime))
            }
            '!' => {
                let mode = parse_hex(payload, 2)?;
                Ok(Frame::Mode(mode as u8))
            }
            '>' => {
                let word = parse_hex(payload, 4)?;
                Ok(Frame::Telemetry {
                    channel: (word >> 12) as u8,
                    sample: (word & 0x0FFF) as u16,
                })
            }
            '*' => Ok(Frame::Debug(payload.to_string())),
            other => Err(Error::Parse(format!(
                "unknown frame tag {:?} in {:?}",
                other, line
            ))),
        }
    }
}

fn parse_status(payload: &str) -> Result<Frame> {
    let mut parts = payload.split(':');
    let alarms = parse_hex(parts.next().unwrap_or(""), 4)?;
    let wind_compass = parse_hex(
        parts
            .next()
            .ok_or_else(|| Error::Parse(format!("status frame too short: {:?}", payload)))?,
        4,
    )?;
    let rudder_sail = parse_hex(
        parts
            .next()
            .ok_or_else(|| Error::Parse(format!("status frame too short: {:?}", payload)))?,
        4,
    )?;
    if parts.next().is_some() {
        return Err(Error::Parse(format!(
            "status frame has trailing fields: {:?}",
            payload
        )));
    }

    Ok(Frame::Status {
        alarms: alarms as u16,
        awa: (wind_compass >> 8) as u8 as i8,
        compass: (wind_compass & 0xFF) as u8,
        rudder: (rudder_sail >> 8) as u8,
        sail: (rudder_sail & 0xFF) as u8,
    })
}

/// Parse exactly `digits` hex digits.
fn parse_hex(text: &str, digits: usize) -> Result<u32> {
    if text.len() != digits {
        return Err(Error::Parse(format!(
            "expected {} hex digits, got {:?}",
            digits, text
        )));
    }
    u32::from_str_radix(text, 16)
        .map_err(|_| Error::Parse(format!("invalid hex field: {:?}", text)))
}
