//! NMEA 0183 sentence handling.
//!
//! The receiver emits `$...*hh` sentences; the checksum is the XOR of the
//! characters between `$` and `*`, written as two hex digits. The only
//! sentence the core interprets is GPRMC (recommended minimum specific
//! data); everything else is logged and discarded upstream.

use chrono::NaiveDate;

use pelorus::angle::{absolute, degrees_to_radians};
use pelorus::Location;

use crate::error::{Error, Result};

/// Verify and strip the `*hh` checksum, returning the sentence body
/// (without the leading `$`).
pub fn checked_body(line: &str) -> Result<&str> {
    let line = line.trim_end();
    let body = line
        .strip_prefix('$')
        .ok_or_else(|| Error::Parse(format!("sentence does not start with $: {:?}", line)))?;

    let (body, checksum) = body
        .rsplit_once('*')
        .ok_or_else(|| Error::Parse(format!("sentence has no checksum: {:?}", line)))?;

    let expected = u8::from_str_radix(checksum, 16)
        .map_err(|_| Error::Parse(format!("bad checksum field: {:?}", checksum)))?;
    let actual = body.bytes().fold(0u8, |acc, b| acc ^ b);

    if actual != expected {
        return Err(Error::Parse(format!(
            "checksum mismatch: computed {:02X}, sentence says {:02X}",
            actual, expected
        )));
    }
    Ok(body)
}

/// A decoded GPRMC sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Gprmc {
    /// UTC fix time, fractional seconds since the epoch.
    pub time: f64,
    pub location: Location,
    /// Speed over the ground, knots.
    pub sog: f64,
    /// Course made good, radians true.
    pub cmg: f64,
    /// Magnetic variation, radians, west negative.
    pub magvar: f64,
    /// Receiver reported an active fix (status `A`).
    pub valid: bool,
}

/// Parse a GPRMC body (checksum already stripped).
///
/// Field layout: `GPRMC,hhmmss.sss,A|V,ddmm.mmmm,N|S,dddmm.mmmm,E|W,
/// sog,cmg,ddmmyy,magvar,E|W[,mode]`.
pub fn parse_gprmc(body: &str) -> Result<Gprmc> {
    let fields: Vec<&str> = body.split(',').collect();
    if !(12..=13).contains(&fields.len()) {
        return Err(Error::Parse(format!(
            "GPRMC needs 12-13 fields, got {}",
            fields.len()
        )));
    }
    if fields[0] != "GPRMC" {
        return Err(Error::Parse(format!("not a GPRMC body: {:?}", fields[0])));
    }

    let status_valid = fields[2] == "A";

    let latitude = parse_angular(fields[3], fields[4])?;
    let longitude = parse_angular(fields[5], fields[6])?;
    let location = Location::from_degrees(latitude, longitude);

    let sog = parse_optional_number(fields[7])?;
    let cmg = absolute(degrees_to_radians(parse_optional_number(fields[8])?));
    let magvar = {
        let magnitude = degrees_to_radians(parse_optional_number(fields[10])?);
        match fields[11] {
            "W" | "w" => -magnitude,
            _ => magnitude,
        }
    };

    let time = parse_datetime(fields[1], fields[9])?;

    Ok(Gprmc {
        time,
        location,
        sog,
        cmg,
        magvar,
        valid: status_valid && location.is_valid() && !fields[3].is_empty(),
    })
}

/// `ddmm.mmmm` (or `dddmm.mmmm`) plus hemisphere into signed degrees.
fn parse_angular(value: &str, hemisphere: &str) -> Result<f64> {
    if value.is_empty() {
        return Ok(0.0);
    }
    let raw: f64 = value
        .parse()
        .map_err(|_| Error::Parse(format!("bad coordinate field: {:?}", value)))?;

    let whole_degrees = (raw / 100.0).trunc();
    let minutes = raw - whole_degrees * 100.0;
    let degrees = whole_degrees + minutes / 60.0;

    Ok(match hemisphere {
        "S" | "s" | "W" | "w" => -degrees,
        _ => degrees,
    })
}

/// Empty NMEA fields read as zero.
fn parse_optional_number(value: &str) -> Result<f64> {
    if value.is_empty() {
        return Ok(0.0);
    }
    value
        .parse()
        .map_err(|_| Error::Parse(format!("bad numeric field: {:?}", value)))
}

/// `hhmmss.sss` + `ddmmyy` into fractional epoch seconds.
fn parse_datetime(time: &str, date: &str) -> Result<f64> {
    if time.len() < 6 || date.len() != 6 {
        return Err(Error::Parse(format!(
            "bad time/date fields: {:?} {:?}",
            time, date
        )));
    }

    let hour: u32 = time[0..2]
        .parse()
        .map_err(|_| Error::Parse(format!("bad hour: {:?}", time)))?;
    let minute: u32 = time[2..4]
        .parse()
        .map_err(|_| Error::Parse(format!("bad minute: {:?}", time)))?;
    let seconds: f64 = time[4..]
        .parse()
        .map_err(|_| Error::Parse(format!("bad seconds: {:?}", time)))?;

    let day: u32 = date[0..2]
        .parse()
        .map_err(|_| Error::Parse(format!("bad day: {:?}", date)))?;
    let month: u32 = date[2..4]
        .parse()
        .map_err(|_| Error::Parse(format!("bad month: {:?}", date)))?;
    let year: i32 = date[4..6]
        .parse::<i32>()
        .map_err(|_| Error::Parse(format!("bad year: {:?}", date)))?
        + 2000;

    let midnight = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Error::Parse(format!("invalid date: {:?}", date)))?;

    if hour > 23 || minute > 59 || !(0.0..60.5).contains(&seconds) {
        return Err(Error::Parse(format!("invalid time: {:?}", time)));
    }

    let day_seconds = hour as f64 * 3600.0 + minute as f64 * 60.0 + seconds;
    Ok(midnight.and_utc().timestamp() as f64 + day_seconds)
}
