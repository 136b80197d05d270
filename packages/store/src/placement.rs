//! # Auto-placement on a regular grid
//!
//! Candidate positions are the centres of a square grid laid over the map:
//! `x = step/2 + i·step` for every `i` with `x < width`, likewise for `y`. The
//! scan is row-major (`y` outer, `x` inner) so generated ids follow reading
//! order from the map origin. Candidates inside any barrier polygon (boundary
//! included) are dropped.
//!
//! Antennas do not take a step directly: their coverage radius is derived from
//! installation height and angle by [`antenna_range`], and the grid step is
//! three quarters of that radius so neighbouring coverage circles overlap.

use thiserror::Error;
use tracing::debug;

use crate::config::Limits;
use crate::geometry::{BoundingBox, Coordinate, Polygon};
use crate::models::{Antenna, Barrier, Beacon, Extent, MapData};

/// Minimum coverage radius any antenna is given, in meters.
pub const MIN_ANTENNA_RANGE: f64 = 10.0;

/// Ratio between antenna grid step and coverage radius.
pub const ANTENNA_STEP_RATIO: f64 = 0.75;

#[derive(Debug, Error, PartialEq)]
pub enum PlacementError {
    #[error("Map dimensions must be positive numbers, got {width} x {height}")]
    InvalidExtent { width: f64, height: f64 },

    #[error("Placement step must be a positive number, got {0}")]
    InvalidStep(f64),

    #[error("Antenna {field} must be a finite number")]
    InvalidAntennaParam { field: &'static str },

    #[error("Grid of {requested} points exceeds the limit of {limit}")]
    TooManyPoints { requested: usize, limit: usize },

    #[error("Barriers have {requested} vertices in total, exceeding the limit of {limit}")]
    TooManyVertices { requested: usize, limit: usize },
}

/// Coverage radius for an antenna mounted at `height` meters with the given
/// operating `angle` in degrees.
pub fn antenna_range(height: f64, angle: f64) -> f64 {
    MIN_ANTENNA_RANGE.max(5.0 + height * 2.0 + angle / 360.0 * 5.0)
}

/// Grid step used when auto-placing antennas with coverage `range`.
pub fn antenna_step(range: f64) -> f64 {
    range * ANTENNA_STEP_RATIO
}

/// Number of grid centres along an axis of length `length`, saturating at `cap`.
fn axis_count(length: f64, step: f64, cap: usize) -> usize {
    // Smallest n with step/2 + n*step >= length.
    let n = (length / step - 0.5).ceil();
    let mut count = if n <= 0.0 {
        0
    } else if n >= cap as f64 {
        cap
    } else {
        n as usize
    };
    // The closed form can be off by one after float rounding; settle it
    // against the exact per-index test.
    while count < cap && Grid::coord(step, count) < length {
        count += 1;
    }
    while count > 0 && Grid::coord(step, count - 1) >= length {
        count -= 1;
    }
    count
}

/// A validated placement grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    extent: Extent,
    step: f64,
    columns: usize,
    rows: usize,
}

impl Grid {
    /// Validate `extent` and `step` and size the grid, refusing grids with more
    /// than `max_points` candidates.
    pub fn new(extent: Extent, step: f64, max_points: usize) -> Result<Self, PlacementError> {
        if !extent.is_valid() {
            return Err(PlacementError::InvalidExtent {
                width: extent.width,
                height: extent.height,
            });
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(PlacementError::InvalidStep(step));
        }
        let cap = max_points.saturating_add(1);
        let columns = axis_count(extent.width, step, cap);
        let rows = axis_count(extent.height, step, cap);
        let requested = columns.saturating_mul(rows);
        if requested > max_points {
            return Err(PlacementError::TooManyPoints {
                requested,
                limit: max_points,
            });
        }
        Ok(Self {
            extent,
            step,
            columns,
            rows,
        })
    }

    fn coord(step: f64, index: usize) -> f64 {
        step / 2.0 + index as f64 * step
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Total number of candidates before barrier exclusion.
    pub fn len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Candidate points in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.rows).flat_map(move |j| {
            let y = Self::coord(self.step, j);
            (0..self.columns).map(move |i| [Self::coord(self.step, i), y])
        })
    }
}

/// Barrier polygons prepared for repeated containment tests.
pub struct Obstacles<'a> {
    shapes: Vec<(BoundingBox, &'a Polygon)>,
}

impl<'a> Obstacles<'a> {
    pub fn new(barriers: &'a [Barrier]) -> Self {
        let shapes = barriers
            .iter()
            .filter_map(|b| Some((b.coordinates.bounding_box()?, &b.coordinates)))
            .collect();
        Self { shapes }
    }

    /// Whether `point` lies inside or on the edge of any barrier.
    pub fn blocks(&self, point: Coordinate) -> bool {
        self.shapes
            .iter()
            .any(|(bbox, polygon)| bbox.contains(point) && polygon.contains(point))
    }
}

/// Refuse barrier sets whose combined vertex count exceeds `limit`. Every
/// candidate is tested against every edge, so this bounds the scan cost
/// together with the grid size.
pub fn check_barriers(barriers: &[Barrier], limit: usize) -> Result<(), PlacementError> {
    let requested = barriers
        .iter()
        .flat_map(|b| b.coordinates.rings())
        .fold(0usize, |total, ring| total.saturating_add(ring.points().len()));
    if requested > limit {
        return Err(PlacementError::TooManyVertices { requested, limit });
    }
    Ok(())
}

/// Grid points of `grid` that are not blocked by any barrier.
pub fn free_points(grid: &Grid, barriers: &[Barrier]) -> Vec<Coordinate> {
    let obstacles = Obstacles::new(barriers);
    let points: Vec<Coordinate> = grid.points().filter(|p| !obstacles.blocks(*p)).collect();
    debug!(
        candidates = grid.len(),
        placed = points.len(),
        barriers = barriers.len(),
        "Grid scan complete"
    );
    points
}

/// Inputs for beacon auto-placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeaconParams {
    pub step: f64,
    pub rssi: f64,
}

/// Inputs for antenna auto-placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AntennaParams {
    pub height: f64,
    pub angle: f64,
}

impl AntennaParams {
    fn validate(&self) -> Result<(), PlacementError> {
        if !self.height.is_finite() {
            return Err(PlacementError::InvalidAntennaParam { field: "height" });
        }
        if !self.angle.is_finite() {
            return Err(PlacementError::InvalidAntennaParam { field: "angle" });
        }
        Ok(())
    }

    pub fn range(&self) -> f64 {
        antenna_range(self.height, self.angle)
    }

    pub fn step(&self) -> f64 {
        antenna_step(self.range())
    }
}

/// Place beacons on every free grid point.
pub fn place_beacons(
    extent: Extent,
    params: BeaconParams,
    barriers: &[Barrier],
    limits: &Limits,
) -> Result<Vec<Beacon>, PlacementError> {
    let grid = Grid::new(extent, params.step, limits.max_grid_points)?;
    check_barriers(barriers, limits.max_barrier_vertices)?;
    Ok(free_points(&grid, barriers)
        .into_iter()
        .enumerate()
        .map(|(n, position)| Beacon {
            id: format!("beacon-auto-{n}"),
            position,
            rssi: Some(params.rssi),
        })
        .collect())
}

/// Result of antenna auto-placement.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct AntennaPlacement {
    pub range: f64,
    pub step: f64,
    pub antennas: Vec<Antenna>,
}

/// Place antennas on every free grid point, spacing derived from `params`.
pub fn place_antennas(
    extent: Extent,
    params: AntennaParams,
    barriers: &[Barrier],
    limits: &Limits,
) -> Result<AntennaPlacement, PlacementError> {
    params.validate()?;
    let range = params.range();
    let step = antenna_step(range);
    let grid = Grid::new(extent, step, limits.max_grid_points)?;
    check_barriers(barriers, limits.max_barrier_vertices)?;
    let antennas = free_points(&grid, barriers)
        .into_iter()
        .enumerate()
        .map(|(n, position)| Antenna {
            id: format!("antenna-auto-{n}"),
            position,
            height: params.height,
            angle: params.angle,
            range,
        })
        .collect();
    Ok(AntennaPlacement {
        range,
        step,
        antennas,
    })
}

/// Area breakdown of a map.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapAreas {
    pub total_area: f64,
    pub barrier_area: f64,
    pub movable_area: f64,
}

impl MapAreas {
    pub fn of(map: &MapData) -> Self {
        let total_area = map.extent().area();
        let barrier_area: f64 = map.barriers.iter().map(|b| b.coordinates.area()).sum();
        Self {
            total_area,
            barrier_area,
            movable_area: (total_area - barrier_area).max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 1_000_000;

    fn limits() -> Limits {
        Limits {
            max_grid_points: LIMIT,
            ..Limits::default()
        }
    }

    fn barrier(id: &str, polygon: Polygon) -> Barrier {
        Barrier {
            id: id.to_string(),
            coordinates: polygon,
        }
    }

    #[test]
    fn test_antenna_range_formula() {
        // Small installations are clamped to the minimum radius.
        assert_eq!(antenna_range(2.0, 0.0), 10.0);
        assert_eq!(antenna_range(0.0, 0.0), 10.0);
        assert_eq!(antenna_range(5.0, 0.0), 15.0);
        assert_eq!(antenna_range(5.0, 360.0), 20.0);
        assert_eq!(antenna_range(4.0, 180.0), 15.5);
        assert_eq!(antenna_step(20.0), 15.0);
    }

    #[test]
    fn test_grid_points_are_cell_centres() {
        let grid = Grid::new(Extent::new(10.0, 5.0), 5.0, LIMIT).unwrap();
        assert_eq!(grid.columns(), 2);
        assert_eq!(grid.rows(), 1);
        let points: Vec<_> = grid.points().collect();
        assert_eq!(points, vec![[2.5, 2.5], [7.5, 2.5]]);
    }

    #[test]
    fn test_grid_count_matches_exact_rule() {
        for &(width, height, step) in &[
            (100.0, 100.0, 5.0),
            (12.0, 7.0, 5.0),
            (1.0, 1.0, 5.0),
            (33.3, 17.1, 0.7),
            (50.0, 20.0, 7.5),
        ] {
            let grid = Grid::new(Extent::new(width, height), step, LIMIT).unwrap();
            let along = |length: f64| (0..).take_while(|&i| step / 2.0 + i as f64 * step < length).count();
            let expected = along(width) * along(height);
            assert_eq!(grid.len(), expected, "{width}x{height} step {step}");
            assert_eq!(grid.points().count(), expected);
            // Never more than ceil(w/step) * ceil(h/step).
            let bound = (width / step).ceil() * (height / step).ceil();
            assert!(grid.len() as f64 <= bound);
        }
    }

    #[test]
    fn test_grid_rejects_bad_input() {
        assert_eq!(
            Grid::new(Extent::new(0.0, 10.0), 1.0, LIMIT),
            Err(PlacementError::InvalidExtent {
                width: 0.0,
                height: 10.0
            })
        );
        assert_eq!(
            Grid::new(Extent::new(10.0, 10.0), 0.0, LIMIT),
            Err(PlacementError::InvalidStep(0.0))
        );
        assert!(matches!(
            Grid::new(Extent::new(10.0, 10.0), f64::NAN, LIMIT),
            Err(PlacementError::InvalidStep(_))
        ));
        assert!(matches!(
            Grid::new(Extent::new(1000.0, 1000.0), 1.0, 100),
            Err(PlacementError::TooManyPoints { limit: 100, .. })
        ));
        // Absurd extents are refused without walking the axis.
        assert!(matches!(
            Grid::new(Extent::new(1e300, 1e300), 1.0, 100),
            Err(PlacementError::TooManyPoints { .. })
        ));
        assert_eq!(
            Grid::new(Extent::new(10.0, 10.0), 5.0, 4).map(|g| g.len()),
            Ok(4)
        );
    }

    #[test]
    fn test_place_beacons_without_barriers() {
        let beacons = place_beacons(
            Extent::new(20.0, 10.0),
            BeaconParams { step: 5.0, rssi: 70.0 },
            &[],
            &limits(),
        )
        .unwrap();
        assert_eq!(beacons.len(), 8);
        assert_eq!(beacons[0].id, "beacon-auto-0");
        assert_eq!(beacons[0].position, [2.5, 2.5]);
        assert_eq!(beacons[7].id, "beacon-auto-7");
        assert_eq!(beacons[7].position, [17.5, 7.5]);
        assert!(beacons.iter().all(|b| b.rssi == Some(70.0)));
    }

    #[test]
    fn test_place_beacons_skips_barriers() {
        // Covers the left half of a 20x10 map.
        let barriers = vec![barrier("wall", Polygon::rectangle([0.0, 0.0], [10.0, 10.0]))];
        let beacons = place_beacons(
            Extent::new(20.0, 10.0),
            BeaconParams { step: 5.0, rssi: 60.0 },
            &barriers,
            &limits(),
        )
        .unwrap();
        assert_eq!(beacons.len(), 4);
        assert!(beacons.iter().all(|b| b.position[0] > 10.0));
        // Ids are contiguous over the placed beacons only.
        let ids: Vec<_> = beacons.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["beacon-auto-0", "beacon-auto-1", "beacon-auto-2", "beacon-auto-3"]);
    }

    #[test]
    fn test_no_device_inside_any_barrier() {
        let barriers = vec![
            barrier(
                "triangle",
                Polygon::from_exterior(vec![[3.0, 3.0], [40.0, 5.0], [10.0, 30.0]]),
            ),
            barrier("box", Polygon::rectangle([30.0, 30.0], [45.0, 48.0])),
        ];
        let extent = Extent::new(50.0, 50.0);
        let params = BeaconParams { step: 1.5, rssi: 70.0 };
        let beacons = place_beacons(extent, params, &barriers, &limits()).unwrap();
        let grid = Grid::new(extent, 1.5, LIMIT).unwrap();
        assert!(beacons.len() < grid.len());
        for beacon in &beacons {
            for b in &barriers {
                assert!(!b.coordinates.contains(beacon.position), "{:?}", beacon.position);
            }
        }
    }

    #[test]
    fn test_point_on_barrier_edge_is_excluded() {
        // Grid centres at x = 2.5 fall exactly on this barrier's right edge.
        let barriers = vec![barrier("edge", Polygon::rectangle([0.0, 0.0], [2.5, 10.0]))];
        let beacons = place_beacons(
            Extent::new(10.0, 5.0),
            BeaconParams { step: 5.0, rssi: 70.0 },
            &barriers,
            &limits(),
        )
        .unwrap();
        assert_eq!(beacons.len(), 1);
        assert_eq!(beacons[0].position, [7.5, 2.5]);
    }

    #[test]
    fn test_barrier_hole_allows_placement() {
        let barriers = vec![barrier(
            "donut",
            Polygon::new(vec![
                crate::geometry::Ring::new(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]),
                crate::geometry::Ring::new(vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0]]),
            ]),
        )];
        let beacons = place_beacons(
            Extent::new(10.0, 10.0),
            BeaconParams { step: 10.0, rssi: 70.0 },
            &barriers,
            &limits(),
        )
        .unwrap();
        assert_eq!(beacons.len(), 1);
        assert_eq!(beacons[0].position, [5.0, 5.0]);
    }

    #[test]
    fn test_place_antennas_uses_derived_step() {
        let placement = place_antennas(
            Extent::new(30.0, 15.0),
            AntennaParams { height: 2.0, angle: 0.0 },
            &[],
            &limits(),
        )
        .unwrap();
        assert_eq!(placement.range, 10.0);
        assert_eq!(placement.step, 7.5);
        // Columns at 3.75, 11.25, 18.75, 26.25; rows at 3.75, 11.25.
        assert_eq!(placement.antennas.len(), 8);
        let first = &placement.antennas[0];
        assert_eq!(first.id, "antenna-auto-0");
        assert_eq!(first.position, [3.75, 3.75]);
        assert_eq!(first.height, 2.0);
        assert_eq!(first.range, 10.0);
    }

    #[test]
    fn test_place_antennas_rejects_non_finite_params() {
        let err = place_antennas(
            Extent::new(30.0, 15.0),
            AntennaParams { height: f64::NAN, angle: 0.0 },
            &[],
            &limits(),
        )
        .unwrap_err();
        assert_eq!(err, PlacementError::InvalidAntennaParam { field: "height" });
    }

    #[test]
    fn test_oversized_barriers_are_rejected() {
        // A 2000-vertex circle, twice.
        let circle: Vec<Coordinate> = (0..2000)
            .map(|i| {
                let t = i as f64 / 2000.0 * std::f64::consts::TAU;
                [50.0 + 20.0 * t.cos(), 50.0 + 20.0 * t.sin()]
            })
            .collect();
        let barriers = vec![
            barrier("a", Polygon::from_exterior(circle.clone())),
            barrier("b", Polygon::from_exterior(circle)),
        ];
        let tight = Limits {
            max_barrier_vertices: 3000,
            ..Limits::default()
        };
        let err = place_beacons(
            Extent::new(100.0, 100.0),
            BeaconParams { step: 1.0, rssi: 70.0 },
            &barriers,
            &tight,
        )
        .unwrap_err();
        // Rings are closed, so each circle carries one repeated vertex.
        assert_eq!(
            err,
            PlacementError::TooManyVertices {
                requested: 4002,
                limit: 3000
            }
        );
        assert!(matches!(
            place_antennas(
                Extent::new(100.0, 100.0),
                AntennaParams { height: 2.0, angle: 0.0 },
                &barriers,
                &tight,
            ),
            Err(PlacementError::TooManyVertices { .. })
        ));

        // Within the default budget the same barriers are accepted.
        assert!(place_beacons(
            Extent::new(100.0, 100.0),
            BeaconParams { step: 10.0, rssi: 70.0 },
            &barriers,
            &Limits::default(),
        )
        .is_ok());
    }

    #[test]
    fn test_map_areas() {
        let mut map = MapData::new("plan.png", 20.0, 10.0);
        map.barriers.push(barrier("a", Polygon::rectangle([0.0, 0.0], [5.0, 4.0])));
        map.barriers.push(barrier("b", Polygon::rectangle([10.0, 0.0], [12.0, 2.0])));
        let areas = MapAreas::of(&map);
        assert_eq!(areas.total_area, 200.0);
        assert_eq!(areas.barrier_area, 24.0);
        assert_eq!(areas.movable_area, 176.0);

        // Overlapping barriers never drive the movable area negative.
        map.barriers.push(barrier("c", Polygon::rectangle([0.0, 0.0], [20.0, 10.0])));
        assert_eq!(MapAreas::of(&map).movable_area, 0.0);
    }
}
