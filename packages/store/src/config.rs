//! # Placement defaults — `placement.toml`
//!
//! The parameters the editor and the auto-placement endpoints fall back to when
//! a request leaves them out. The server reads them from the `[placement]`
//! section of its settings; they can also be kept in a standalone TOML file.
//!
//! ```toml
//! [beacons]
//! step = 5.0        # grid spacing in meters
//! rssi = 70.0       # RSSI assigned to auto-placed beacons
//!
//! [antennas]
//! height = 2.0      # installation height in meters
//! angle = 0.0       # operating angle in degrees
//!
//! [limits]
//! hit_tolerance = 0.5
//! max_grid_points = 250000
//! max_barrier_vertices = 10000
//! ```
//!
//! All structs derive `Default`, so a missing or empty file is equivalent to the
//! default configuration.

use serde::{Deserialize, Serialize};

/// Top-level placement configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementDefaults {
    #[serde(default)]
    pub beacons: BeaconDefaults,
    #[serde(default)]
    pub antennas: AntennaDefaults,
    #[serde(default)]
    pub limits: Limits,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BeaconDefaults {
    #[serde(default = "default_beacon_step")]
    pub step: f64,
    #[serde(default = "default_beacon_rssi")]
    pub rssi: f64,
}

fn default_beacon_step() -> f64 {
    5.0
}

fn default_beacon_rssi() -> f64 {
    70.0
}

impl Default for BeaconDefaults {
    fn default() -> Self {
        Self {
            step: default_beacon_step(),
            rssi: default_beacon_rssi(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AntennaDefaults {
    #[serde(default = "default_antenna_height")]
    pub height: f64,
    #[serde(default)]
    pub angle: f64,
}

fn default_antenna_height() -> f64 {
    2.0
}

impl Default for AntennaDefaults {
    fn default() -> Self {
        Self {
            height: default_antenna_height(),
            angle: 0.0,
        }
    }
}

/// Guard rails for interactive and auto-placement operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Radius in meters within which a click hits a device or barrier edge.
    #[serde(default = "default_hit_tolerance")]
    pub hit_tolerance: f64,
    /// Upper bound on grid candidates for a single auto-placement run.
    #[serde(default = "default_max_grid_points")]
    pub max_grid_points: usize,
    /// Upper bound on the total number of barrier vertices a placement run
    /// tests candidates against.
    #[serde(default = "default_max_barrier_vertices")]
    pub max_barrier_vertices: usize,
}

fn default_hit_tolerance() -> f64 {
    0.5
}

fn default_max_grid_points() -> usize {
    250_000
}

fn default_max_barrier_vertices() -> usize {
    10_000
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            hit_tolerance: default_hit_tolerance(),
            max_grid_points: default_max_grid_points(),
            max_barrier_vertices: default_max_barrier_vertices(),
        }
    }
}

impl PlacementDefaults {
    /// Builder method to set the beacon grid step.
    pub fn with_beacon_step(mut self, step: f64) -> Self {
        self.beacons.step = step;
        self
    }

    /// Builder method to set the antenna installation parameters.
    pub fn with_antenna(mut self, height: f64, angle: f64) -> Self {
        self.antennas.height = height;
        self.antennas.angle = angle;
        self
    }

    /// Parse from TOML string.
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Serialize to TOML string.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
