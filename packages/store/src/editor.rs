//! # Layout editor — interaction state over a [`MapData`]
//!
//! The editor is the headless half of the map canvas: it owns the overlay
//! collections and the active interaction mode, and turns pointer events given
//! in map meters into edits. Rendering is left to whatever front end drives it.
//!
//! Modes are mutually exclusive. [`Editor::toggle`] switches a mode on and every
//! other mode off, or back to [`Mode::Idle`] when the mode was already active.
//! Auto-placement and loading a new floor plan also return to `Idle`.
//!
//! | Mode | [`Editor::click`] effect | Other operations allowed |
//! |------|--------------------------|--------------------------|
//! | `PlaceBeacons` | adds a beacon at the click | — |
//! | `PlaceAntennas` | adds an antenna with the current antenna parameters | — |
//! | `DrawBarriers` | none | [`finish_barrier`](Editor::finish_barrier) |
//! | `EditBeacons` | none | [`move_beacon`](Editor::move_beacon) |
//! | `EditAntennas` | none | [`move_antenna`](Editor::move_antenna) |
//! | `DeleteBeacons` / `DeleteAntennas` | removes the nearest device within the hit tolerance | — |
//! | `DeleteBarriers` | removes the first barrier containing the click or with an edge within tolerance | — |
//!
//! [`reshape_barrier`](Editor::reshape_barrier) works in every mode except
//! `DrawBarriers`: vertex editing is switched off while a new outline is drawn.

use tracing::debug;
use uuid::Uuid;

use crate::config::PlacementDefaults;
use crate::geometry::{distance, Coordinate, Polygon, Ring};
use crate::models::{Antenna, Barrier, Beacon, MapData};
use crate::placement::{
    antenna_range, place_antennas, place_beacons, AntennaParams, BeaconParams, MapAreas,
    PlacementError,
};

/// Active interaction mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Idle,
    PlaceBeacons,
    PlaceAntennas,
    DrawBarriers,
    EditBeacons,
    EditAntennas,
    DeleteBeacons,
    DeleteAntennas,
    DeleteBarriers,
}

/// Overlay visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layers {
    pub beacons: bool,
    pub antennas: bool,
    pub barriers: bool,
    pub antenna_ranges: bool,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            beacons: true,
            antennas: true,
            barriers: true,
            antenna_ranges: true,
        }
    }
}

/// What a single editor operation changed.
#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    BeaconAdded(String),
    AntennaAdded(String),
    BarrierAdded(String),
    BeaconMoved(String),
    AntennaMoved(String),
    BarrierReshaped(String),
    BeaconRemoved(String),
    AntennaRemoved(String),
    BarrierRemoved(String),
    Cleared { removed: usize },
    AutoPlaced { placed: usize },
    /// The click hit nothing or the mode does not react to it.
    Nothing,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum EditError {
    #[error("Operation requires {expected:?} mode, editor is in {actual:?}")]
    WrongMode { expected: Mode, actual: Mode },

    #[error("No {kind} with id {id}")]
    UnknownId { kind: &'static str, id: String },

    #[error("Barriers cannot be reshaped while drawing")]
    DrawingInProgress,

    #[error("A barrier needs at least three distinct vertices")]
    DegenerateBarrier,

    #[error(transparent)]
    Placement(#[from] PlacementError),
}

/// Headless map canvas controller.
#[derive(Clone, Debug)]
pub struct Editor {
    map: MapData,
    mode: Mode,
    layers: Layers,
    defaults: PlacementDefaults,
}

impl Editor {
    pub fn new(map: MapData, defaults: PlacementDefaults) -> Self {
        Self {
            map,
            mode: Mode::Idle,
            layers: Layers::default(),
            defaults,
        }
    }

    pub fn map_data(&self) -> &MapData {
        &self.map
    }

    pub fn into_map_data(self) -> MapData {
        self.map
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn layers(&self) -> Layers {
        self.layers
    }

    pub fn layers_mut(&mut self) -> &mut Layers {
        &mut self.layers
    }

    pub fn defaults(&self) -> &PlacementDefaults {
        &self.defaults
    }

    /// Adjust the parameters used by manual and automatic antenna placement.
    pub fn set_antenna_params(&mut self, height: f64, angle: f64) {
        self.defaults.antennas.height = height;
        self.defaults.antennas.angle = angle;
    }

    pub fn set_beacon_params(&mut self, step: f64, rssi: f64) {
        self.defaults.beacons.step = step;
        self.defaults.beacons.rssi = rssi;
    }

    /// Coverage radius a newly placed antenna gets.
    pub fn antenna_range(&self) -> f64 {
        antenna_range(self.defaults.antennas.height, self.defaults.antennas.angle)
    }

    /// Enable `mode` exclusively, or return to idle if it is already active.
    pub fn toggle(&mut self, mode: Mode) -> Mode {
        self.mode = if self.mode == mode { Mode::Idle } else { mode };
        self.mode
    }

    /// Replace the floor plan. Devices and barriers are cleared.
    pub fn load_map(
        &mut self,
        image_src: impl Into<String>,
        width: f64,
        height: f64,
    ) -> Result<(), EditError> {
        let map = MapData::new(image_src, width, height);
        if !map.extent().is_valid() {
            return Err(PlacementError::InvalidExtent { width, height }.into());
        }
        self.map = map;
        self.mode = Mode::Idle;
        Ok(())
    }

    /// React to a click at `at` according to the current mode.
    pub fn click(&mut self, at: Coordinate) -> EditOutcome {
        let tolerance = self.defaults.limits.hit_tolerance;
        match self.mode {
            Mode::PlaceBeacons => {
                let id = format!("beacon-{}", Uuid::new_v4());
                self.map.beacons.push(Beacon {
                    id: id.clone(),
                    position: at,
                    rssi: None,
                });
                EditOutcome::BeaconAdded(id)
            }
            Mode::PlaceAntennas => {
                let id = format!("antenna-{}", Uuid::new_v4());
                self.map.antennas.push(Antenna {
                    id: id.clone(),
                    position: at,
                    height: self.defaults.antennas.height,
                    angle: self.defaults.antennas.angle,
                    range: self.antenna_range(),
                });
                EditOutcome::AntennaAdded(id)
            }
            Mode::DeleteBeacons => {
                match nearest(self.map.beacons.iter().map(|b| b.position), at, tolerance) {
                    Some(index) => EditOutcome::BeaconRemoved(self.map.beacons.remove(index).id),
                    None => EditOutcome::Nothing,
                }
            }
            Mode::DeleteAntennas => {
                match nearest(self.map.antennas.iter().map(|a| a.position), at, tolerance) {
                    Some(index) => EditOutcome::AntennaRemoved(self.map.antennas.remove(index).id),
                    None => EditOutcome::Nothing,
                }
            }
            Mode::DeleteBarriers => {
                let hit = self.map.barriers.iter().position(|b| {
                    b.coordinates.contains(at) || b.coordinates.distance_to_boundary(at) <= tolerance
                });
                match hit {
                    Some(index) => EditOutcome::BarrierRemoved(self.map.barriers.remove(index).id),
                    None => EditOutcome::Nothing,
                }
            }
            Mode::Idle | Mode::DrawBarriers | Mode::EditBeacons | Mode::EditAntennas => {
                EditOutcome::Nothing
            }
        }
    }

    fn require(&self, expected: Mode) -> Result<(), EditError> {
        if self.mode != expected {
            return Err(EditError::WrongMode {
                expected,
                actual: self.mode,
            });
        }
        Ok(())
    }

    /// Complete a drawn barrier polygon.
    pub fn finish_barrier(&mut self, rings: Vec<Vec<Coordinate>>) -> Result<EditOutcome, EditError> {
        self.require(Mode::DrawBarriers)?;
        let polygon = barrier_polygon(rings)?;
        let id = format!("barrier-{}", Uuid::new_v4());
        self.map.barriers.push(Barrier {
            id: id.clone(),
            coordinates: polygon,
        });
        Ok(EditOutcome::BarrierAdded(id))
    }

    /// Replace the geometry of an existing barrier. Not available while a
    /// barrier is being drawn.
    pub fn reshape_barrier(
        &mut self,
        id: &str,
        rings: Vec<Vec<Coordinate>>,
    ) -> Result<EditOutcome, EditError> {
        if self.mode == Mode::DrawBarriers {
            return Err(EditError::DrawingInProgress);
        }
        let polygon = barrier_polygon(rings)?;
        let barrier = self
            .map
            .barriers
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| unknown("barrier", id))?;
        barrier.coordinates = polygon;
        Ok(EditOutcome::BarrierReshaped(id.to_string()))
    }

    pub fn move_beacon(&mut self, id: &str, to: Coordinate) -> Result<EditOutcome, EditError> {
        self.require(Mode::EditBeacons)?;
        let beacon = self
            .map
            .beacons
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| unknown("beacon", id))?;
        beacon.position = to;
        Ok(EditOutcome::BeaconMoved(id.to_string()))
    }

    pub fn move_antenna(&mut self, id: &str, to: Coordinate) -> Result<EditOutcome, EditError> {
        self.require(Mode::EditAntennas)?;
        let antenna = self
            .map
            .antennas
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| unknown("antenna", id))?;
        antenna.position = to;
        Ok(EditOutcome::AntennaMoved(id.to_string()))
    }

    pub fn clear_beacons(&mut self) -> EditOutcome {
        let removed = std::mem::take(&mut self.map.beacons).len();
        EditOutcome::Cleared { removed }
    }

    pub fn clear_antennas(&mut self) -> EditOutcome {
        let removed = std::mem::take(&mut self.map.antennas).len();
        EditOutcome::Cleared { removed }
    }

    pub fn clear_barriers(&mut self) -> EditOutcome {
        let removed = std::mem::take(&mut self.map.barriers).len();
        EditOutcome::Cleared { removed }
    }

    /// Replace all beacons with a fresh grid avoiding barriers.
    pub fn auto_place_beacons(&mut self) -> Result<EditOutcome, EditError> {
        let params = BeaconParams {
            step: self.defaults.beacons.step,
            rssi: self.defaults.beacons.rssi,
        };
        let beacons = place_beacons(
            self.map.extent(),
            params,
            &self.map.barriers,
            &self.defaults.limits,
        )?;
        let placed = beacons.len();
        self.map.beacons = beacons;
        self.mode = Mode::Idle;
        debug!(placed, "Auto-placed beacons");
        Ok(EditOutcome::AutoPlaced { placed })
    }

    /// Replace all antennas with a fresh grid avoiding barriers.
    pub fn auto_place_antennas(&mut self) -> Result<EditOutcome, EditError> {
        let params = AntennaParams {
            height: self.defaults.antennas.height,
            angle: self.defaults.antennas.angle,
        };
        let placement = place_antennas(
            self.map.extent(),
            params,
            &self.map.barriers,
            &self.defaults.limits,
        )?;
        let placed = placement.antennas.len();
        self.map.antennas = placement.antennas;
        self.mode = Mode::Idle;
        debug!(placed, range = placement.range, "Auto-placed antennas");
        Ok(EditOutcome::AutoPlaced { placed })
    }

    pub fn areas(&self) -> MapAreas {
        MapAreas::of(&self.map)
    }
}

fn unknown(kind: &'static str, id: &str) -> EditError {
    EditError::UnknownId {
        kind,
        id: id.to_string(),
    }
}

fn barrier_polygon(rings: Vec<Vec<Coordinate>>) -> Result<Polygon, EditError> {
    let polygon = Polygon::new(rings.into_iter().map(Ring::new).collect());
    match polygon.exterior() {
        Some(exterior) if exterior.vertex_count() >= 3 => Ok(polygon),
        _ => Err(EditError::DegenerateBarrier),
    }
}

/// Index of the point closest to `at` within `tolerance`.
fn nearest(points: impl Iterator<Item = Coordinate>, at: Coordinate, tolerance: f64) -> Option<usize> {
    points
        .enumerate()
        .map(|(i, p)| (i, distance(p, at)))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
