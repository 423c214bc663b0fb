//! GPS ingest task.
//!
//! Owns the receiver's serial port outright, reads NMEA sentences,
//! validates checksums, and publishes every decoded GPRMC fix into the
//! shared store. The navigator is woken by the publish.

pub mod nmea;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pelorus::Location;

use crate::store::{now_timestamp, FieldReader, FieldWriter, Record, Store, Value};
use crate::transport::{LineBuffer, Transport};

/// The latest navigation fix.
#[derive(Debug, Clone, PartialEq)]
pub struct GpsFix {
    /// UTC fix time, fractional seconds since the epoch.
    pub time: f64,
    pub location: Location,
    /// Speed over the ground, knots.
    pub sog: f64,
    /// Course made good, radians true.
    pub cmg: f64,
    /// Magnetic variation, radians, west negative.
    pub magvar: f64,
    /// The fix is usable for navigation.
    pub valid: bool,
}

impl Default for GpsFix {
    fn default() -> Self {
        GpsFix {
            time: 0.0,
            location: Location::default(),
            sog: 0.0,
            cmg: 0.0,
            magvar: 0.0,
            valid: false,
        }
    }
}

impl From<nmea::Gprmc> for GpsFix {
    fn from(fix: nmea::Gprmc) -> Self {
        GpsFix {
            time: fix.time,
            location: fix.location,
            sog: fix.sog,
            cmg: fix.cmg,
            magvar: fix.magvar,
            valid: fix.valid,
        }
    }
}

impl Record for GpsFix {
    const NAME: &'static str = "gpsfix";

    fn pack(&self, fields: &mut FieldWriter<'_>) {
        fields.set("time", Value::Timestamp(self.time));
        fields.set_location("location", &self.location);
        fields.set("sog", Value::Float(self.sog));
        fields.set("cmg", Value::Float(self.cmg));
        fields.set("magvar", Value::Float(self.magvar));
        fields.set("valid", Value::Bool(self.valid));
    }

    fn unpack(fields: &FieldReader<'_>) -> Self {
        GpsFix {
            time: fields.f64("time", 0.0),
            location: fields.location("location").unwrap_or_default(),
            sog: fields.f64("sog", 0.0),
            cmg: fields.f64("cmg", 0.0),
            magvar: fields.f64("magvar", 0.0),
            valid: fields.bool("valid", false),
        }
    }
}

/// Read NMEA lines until shutdown, publishing decoded fixes.
///
/// The transport is moved in: the GPS port has exactly one user.
pub fn ingest_loop(mut transport: Box<dyn Transport>, shutdown: Arc<AtomicBool>, store: Arc<Store>) {
    // An NMEA sentence is at most 82 characters; anything longer is noise.
    let mut lines = LineBuffer::new(96);
    let mut chunk = [0u8; 256];

    while !shutdown.load(Ordering::Relaxed) {
        let n = match transport.poll(&mut chunk) {
            Ok(n) => n,
            Err(e) => {
                log::error!("gps: serial read failed: {}", e);
                std::thread::sleep(Duration::from_millis(250));
                continue;
            }
        };

        if n == 0 {
            std::thread::sleep(Duration::from_millis(20));
            continue;
        }

        for sentence in lines.push(&chunk[..n]) {
            handle_sentence(&sentence, &store);
        }
    }

    log::info!("gps ingest exiting");
}

fn handle_sentence(text: &str, store: &Arc<Store>) {
    let body = match nmea::checked_body(text) {
        Ok(body) => body,
        Err(e) => {
            log::warn!("gps: dropping sentence: {}", e);
            return;
        }
    };

    if !body.starts_with("GPRMC") {
        log::debug!("gps: ignoring sentence {:?}", body.split(',').next().unwrap_or(""));
        return;
    }

    match nmea::parse_gprmc(body) {
        Ok(decoded) => {
            let mut fix = GpsFix::from(decoded);
            if !fix.valid {
                log::debug!("gps: fix not valid yet");
            }
            // A fix from a receiver without an almanac can carry a stale
            // date; the store timestamp is the fallback clock.
            if fix.time <= 0.0 {
                fix.time = now_timestamp();
                fix.valid = false;
            }
            if let Err(e) = store.save_and_publish(&fix) {
                log::error!("gps: failed to persist fix: {}", e);
            }
        }
        Err(e) => log::warn!("gps: dropping GPRMC: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_checksum(body: &str) -> String {
        let sum = body.bytes().fold(0u8, |acc, b| acc ^ b);
        format!("${}*{:02X}", body, sum)
    }

    #[test]
    fn test_fix_record_round_trip() {
        let store = Store::new();
        let fix = GpsFix {
            time: 1_785_582_454.5,
            location: Location::from_degrees(53.15, -9.03),
            sog: 2.5,
            cmg: 3.02,
            magvar: -0.07,
            valid: true,
        };
        store.save(&fix).unwrap();
        assert_eq!(store.load::<GpsFix>().unwrap(), fix);
    }

    #[test]
    fn test_valid_sentence_is_published() {
        let store = Arc::new(Store::new());
        let rx = store.subscribe::<GpsFix>().unwrap();

        let line =
            with_checksum("GPRMC,110734.000,A,5309.395,N,00902.119,W,2.5,173.4,010826,4.2,W,A");
        handle_sentence(&line, &store);

        assert_eq!(rx.try_recv().unwrap(), 1);
        let fix = store.load::<GpsFix>().unwrap();
        assert!(fix.valid);
        assert!((fix.location.latitude_degrees() - 53.1565833).abs() < 1e-6);
    }

    #[test]
    fn test_void_fix_is_published_as_invalid() {
        let store = Arc::new(Store::new());
        let rx = store.subscribe::<GpsFix>().unwrap();

        let line = with_checksum("GPRMC,110734.000,V,,,,,,,010826,,,N");
        handle_sentence(&line, &store);

        assert_eq!(rx.try_recv().unwrap(), 1);
        assert!(!store.load::<GpsFix>().unwrap().valid);
    }

    #[test]
    fn test_other_sentences_and_bad_checksums_are_dropped() {
        let store = Arc::new(Store::new());

        handle_sentence(&with_checksum("GPGGA,110734.000,5309.395,N"), &store);
        handle_sentence("$GPRMC,110734.000,A,5309.395,N,00902.119,W,2.5,173.4,010826,,,A*00", &store);
        handle_sentence("no dollar sign", &store);

        assert_eq!(store.counter::<GpsFix>().unwrap(), 0);
    }
}
