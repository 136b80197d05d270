//! # Domain models for projects, users and map layouts
//!
//! Everything here is `Serialize + Deserialize` with camelCase field names so the
//! same types serve as the JSON wire format of the HTTP API.
//!
//! ## Persistence records
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`Project`] | A saved layout owned by exactly one user. `map_data` is kept as an opaque JSON value so clients can store extra fields without the server rejecting them. |
//! | [`NewProject`] / [`ProjectUpdate`] | Create and partial-update payloads. `None` in an update keeps the current value. |
//! | [`User`] | An account row including the Argon2 password hash. |
//! | [`UserInfo`] | The client-safe projection of [`User`]. |
//!
//! ## Layout
//!
//! [`MapData`] is the typed view of a project's `mapData`: the floor-plan image
//! reference, its extent in meters, and the three overlay collections
//! ([`Beacon`], [`Antenna`], [`Barrier`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Coordinate, Polygon};

/// A saved map layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub map_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Parse `map_data` into its typed form.
    pub fn layout(&self) -> Result<MapData, serde_json::Error> {
        MapData::from_value(&self.map_data)
    }
}

/// Payload for creating a project.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub map_data: Option<serde_json::Value>,
}

/// Partial update; absent fields keep their current value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub map_data: Option<serde_json::Value>,
}

/// Full account record.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// User information safe to send to the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl UserInfo {
    /// Get display name, falling back to email if name is not set.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// A floor plan with its overlays.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    #[serde(default)]
    pub map_image_src: String,
    pub map_width_meters: f64,
    pub map_height_meters: f64,
    #[serde(default)]
    pub beacons: Vec<Beacon>,
    #[serde(default)]
    pub antennas: Vec<Antenna>,
    #[serde(default)]
    pub barriers: Vec<Barrier>,
}

impl MapData {
    pub fn new(map_image_src: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            map_image_src: map_image_src.into(),
            map_width_meters: width,
            map_height_meters: height,
            ..Default::default()
        }
    }

    pub fn from_value(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    pub fn extent(&self) -> Extent {
        Extent {
            width: self.map_width_meters,
            height: self.map_height_meters,
        }
    }
}

/// Real-world size of the map image in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A simulated BLE transmitter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Beacon {
    pub id: String,
    pub position: Coordinate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<f64>,
}

/// A simulated receiver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Antenna {
    pub id: String,
    pub position: Coordinate,
    /// Installation height in meters.
    pub height: f64,
    /// Operating angle in degrees.
    pub angle: f64,
    /// Coverage radius in meters.
    pub range: f64,
}

/// A polygonal exclusion zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Barrier {
    pub id: String,
    pub coordinates: Polygon,
}
