//! Geographic locations in radians.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use crate::angle::{degrees_to_radians, normalize_pi, radians_to_degrees};
use crate::error::ParseError;

/// A point on the spherical Earth.
///
/// Latitude is held in [-π/2, π/2] and longitude in (-π, π]; both are
/// enforced by the constructors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Location {
    /// Latitude in radians, positive north.
    pub latitude: f64,
    /// Longitude in radians, positive east.
    pub longitude: f64,
}

impl Location {
    /// Build from radians, clamping latitude and wrapping longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Location {
            latitude: latitude.clamp(-FRAC_PI_2, FRAC_PI_2),
            longitude: normalize_pi(longitude),
        }
    }

    /// Build from decimal degrees.
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Location::new(degrees_to_radians(latitude), degrees_to_radians(longitude))
    }

    /// Both components are finite and inside their invariant ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-FRAC_PI_2..=FRAC_PI_2).contains(&self.latitude)
            && self.longitude > -PI
            && self.longitude <= PI
    }

    /// Latitude in decimal degrees.
    pub fn latitude_degrees(&self) -> f64 {
        radians_to_degrees(self.latitude)
    }

    /// Longitude in decimal degrees.
    pub fn longitude_degrees(&self) -> f64 {
        radians_to_degrees(self.longitude)
    }

    /// Parse a "latitude, longitude" pair.
    ///
    /// Each half accepts `D.ddd`, `D M.mmm` or `D M S.sss` with an optional
    /// NSEW suffix; fields are separated by whitespace. The comma between
    /// the halves is required.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let (lat, lon) = input
            .split_once(',')
            .ok_or_else(|| ParseError::MissingPair(input.to_string()))?;
        Ok(Location::from_degrees(
            parse_coordinate(lat)?,
            parse_coordinate(lon)?,
        ))
    }
}

/// Parse one coordinate into decimal degrees.
///
/// A hemisphere suffix of `S` or `W` negates the numeric value; `N` and `E`
/// leave it unchanged. The suffix may be its own token or attached to the
/// last numeric field.
pub fn parse_coordinate(input: &str) -> Result<f64, ParseError> {
    let mut tokens: Vec<String> = input.split_whitespace().map(str::to_string).collect();

    let mut negate = false;
    if let Some(last) = tokens.last_mut() {
        if let Some(suffix) = last.chars().last().filter(|c| c.is_ascii_alphabetic()) {
            match suffix.to_ascii_uppercase() {
                'S' | 'W' => negate = true,
                'N' | 'E' => {}
                other => return Err(ParseError::UnknownSuffix(other.to_string())),
            }
            last.pop();
            if last.is_empty() {
                tokens.pop();
            }
        }
    }

    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    if tokens.len() > 3 {
        return Err(ParseError::TooManyFields(tokens.len()));
    }

    let fields: Vec<f64> = tokens
        .iter()
        .map(|t| {
            t.parse::<f64>()
                .map_err(|_| ParseError::InvalidNumber(t.clone()))
        })
        .collect::<Result<_, _>>()?;

    let sign = if fields[0].is_sign_negative() { -1.0 } else { 1.0 };
    let mut degrees = fields[0].abs();
    if let Some(minutes) = fields.get(1) {
        degrees += minutes / 60.0;
    }
    if let Some(seconds) = fields.get(2) {
        degrees += seconds / 3600.0;
    }
    degrees *= sign;

    if negate {
        degrees = -degrees;
    }
    Ok(degrees)
}

impl fmt::Display for Location {
    /// Decimal degrees, parseable back through [`Location::parse`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}, {:.6}",
            self.latitude_degrees(),
            self.longitude_degrees()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_degrees_minutes_pair() {
        // Galway Bay
        let loc = Location::parse("53 9.395 N, 9 2.119 W").unwrap();
        assert!((loc.latitude_degrees() - 53.1565833).abs() < 1e-6);
        assert!((loc.longitude_degrees() - -9.03531667).abs() < 1e-6);
    }

    #[test]
    fn test_parse_decimal_and_dms_forms() {
        assert!((parse_coordinate("53.25").unwrap() - 53.25).abs() < 1e-12);
        assert!((parse_coordinate("-9.5").unwrap() + 9.5).abs() < 1e-12);
        assert!((parse_coordinate("53 30").unwrap() - 53.5).abs() < 1e-12);
        assert!((parse_coordinate("53 30 36.0").unwrap() - 53.51).abs() < 1e-12);
        assert!((parse_coordinate("53 30 36.0 S").unwrap() + 53.51).abs() < 1e-12);
        assert!((parse_coordinate("9.5W").unwrap() + 9.5).abs() < 1e-12);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(parse_coordinate(""), Err(ParseError::Empty));
        assert_eq!(parse_coordinate("W"), Err(ParseError::Empty));
        assert_eq!(
            parse_coordinate("1 2 3 4"),
            Err(ParseError::TooManyFields(4))
        );
        assert!(matches!(
            parse_coordinate("53 9.395 Q"),
            Err(ParseError::UnknownSuffix(_))
        ));
        assert!(matches!(
            parse_coordinate("fifty three"),
            Err(ParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            Location::parse("53.0 9.0"),
            Err(ParseError::MissingPair(_))
        ));
    }

    #[test]
    fn test_display_round_trips() {
        let original = Location::from_degrees(53.1565833, -9.0353167);
        let reparsed = Location::parse(&original.to_string()).unwrap();
        assert!((original.latitude_degrees() - reparsed.latitude_degrees()).abs() < 1e-6);
        assert!((original.longitude_degrees() - reparsed.longitude_degrees()).abs() < 1e-6);
    }

    #[test]
    fn test_constructor_enforces_invariants() {
        let loc = Location::from_degrees(95.0, 270.0);
        assert!(loc.is_valid());
        assert!((loc.latitude - FRAC_PI_2).abs() < 1e-12);
        assert!((loc.longitude_degrees() + 90.0).abs() < 1e-9);
    }
}
