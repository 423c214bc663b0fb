//! Mission definition and lifecycle.
//!
//! A mission is loaded once at startup from a declarative TOML file and
//! stays immutable for the whole voyage; only [`MissionStatus`] evolves.
//! Angles in the file are degrees and are converted to radians on load;
//! unknown fields are ignored.

pub mod status;
pub mod supervisor;

pub use status::{MissionState, MissionStatus};
pub use supervisor::Supervisor;

use std::fs;
use std::path::Path;

use serde::Deserialize;

use pelorus::angle::degrees_to_radians;
use pelorus::{Location, Waypoint};

use crate::error::{Error, Result};

/// Where the boat goes into the water.
#[derive(Debug, Clone)]
pub struct Launch {
    pub site: String,
    pub location: Location,
}

/// An immutable voyage plan.
#[derive(Debug, Clone)]
pub struct Mission {
    pub title: String,
    pub url: String,
    pub description: String,
    pub launch: Launch,
    /// Goals, in visiting order.
    pub attractors: Vec<Waypoint>,
    /// Hazards, unordered.
    pub repellors: Vec<Waypoint>,
}

impl Mission {
    /// Load a mission file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!(
                "failed to read mission file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        Mission::from_toml(&content)
    }

    /// Parse the TOML rendering of the mission document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawMission = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse mission file: {}", e)))?;

        if raw.attractors.is_empty() {
            return Err(Error::Config(
                "mission has no attractors; nowhere to sail".to_string(),
            ));
        }

        Ok(Mission {
            title: raw.title,
            url: raw.url,
            description: raw.description,
            launch: Launch {
                site: raw.launch.site,
                location: Location::from_degrees(raw.launch.latitude, raw.launch.longitude),
            },
            attractors: raw
                .attractors
                .iter()
                .map(|w| w.to_waypoint(true))
                .collect(),
            repellors: raw
                .repellors
                .iter()
                .map(|w| w.to_waypoint(false))
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawMission {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
    launch: RawLaunch,
    #[serde(default)]
    attractors: Vec<RawWaypoint>,
    #[serde(default)]
    repellors: Vec<RawWaypoint>,
}

#[derive(Debug, Deserialize)]
struct RawLaunch {
    #[serde(default)]
    site: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct RawWaypoint {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    name: String,
    /// Approach corridor direction, degrees.
    #[serde(default)]
    normal: f64,
    /// Coverage radius, nautical miles.
    #[serde(default)]
    range: f64,
}

impl RawWaypoint {
    fn to_waypoint(&self, attractor: bool) -> Waypoint {
        let location = Location::from_degrees(self.latitude, self.longitude);
        let normal = degrees_to_radians(self.normal);
        if attractor {
            Waypoint::attractor(location, normal, self.range, &self.name)
        } else {
            Waypoint::repellor(location, normal, self.range, &self.name)
        }
    }
}
