//! # Planar geometry in map meters
//!
//! Barriers are stored as GeoJSON-style polygons: a list of closed rings where
//! ring 0 is the outer boundary and every further ring is a hole. This module
//! provides the handful of operations the placement engine and the editor need
//! on top of that layout.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`Coordinate`] | An `[x, y]` pair in meters, origin at the bottom-left of the map image. |
//! | [`Ring`] | A closed ring. [`Ring::new`] repeats the first vertex at the end if the input is open. |
//! | [`Polygon`] | Outer ring plus holes. Answers containment, area and boundary distance queries. |
//! | [`BoundingBox`] | Axis-aligned extent, used to skip polygons cheaply during grid scans. |
//!
//! ## Containment rule
//!
//! [`Ring::contains`] uses ray casting and counts points lying on an edge as
//! contained. [`Polygon::contains`] is "inside the outer ring and not strictly
//! inside any hole", so a point on a hole's edge still belongs to the polygon.
//! The net effect is that barrier boundaries are closed sets: nothing is ever
//! auto-placed exactly on a barrier edge.

use serde::{Deserialize, Serialize};

/// An `[x, y]` position in meters.
pub type Coordinate = [f64; 2];

const EPSILON: f64 = 1e-9;

/// A closed ring of coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct Ring {
    points: Vec<Coordinate>,
}

impl Ring {
    /// Build a ring, closing it if the last point differs from the first.
    pub fn new(mut points: Vec<Coordinate>) -> Self {
        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
            if points.len() > 1 && first != last {
                points.push(first);
            }
        }
        Self { points }
    }

    /// All points including the repeated closing vertex.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    /// Iterate over the ring's edges as `(start, end)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (Coordinate, Coordinate)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// Number of distinct vertices (the closing vertex is not counted).
    pub fn vertex_count(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    fn is_degenerate(&self) -> bool {
        self.vertex_count() < 3
    }

    /// Shoelace area, positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        self.edges()
            .map(|(a, b)| a[0] * b[1] - b[0] * a[1])
            .sum::<f64>()
            / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Ray-casting containment; points on an edge are contained.
    pub fn contains(&self, point: Coordinate) -> bool {
        if self.is_degenerate() {
            return false;
        }
        if self.on_boundary(point) {
            return true;
        }
        self.strictly_contains(point)
    }

    /// Ray-casting containment that ignores the boundary.
    fn strictly_contains(&self, point: Coordinate) -> bool {
        let [x, y] = point;
        let mut inside = false;
        for (a, b) in self.edges() {
            let (xi, yi) = (a[0], a[1]);
            let (xj, yj) = (b[0], b[1]);
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
        }
        inside
    }

    fn on_boundary(&self, point: Coordinate) -> bool {
        self.distance_to_boundary(point) <= EPSILON
    }

    /// Minimum distance from `point` to any edge of the ring.
    pub fn distance_to_boundary(&self, point: Coordinate) -> f64 {
        self.edges()
            .map(|(a, b)| distance_to_segment(point, a, b))
            .fold(f64::INFINITY, f64::min)
    }
}

impl From<Vec<Coordinate>> for Ring {
    fn from(points: Vec<Coordinate>) -> Self {
        Ring::new(points)
    }
}

impl From<Ring> for Vec<Coordinate> {
    fn from(ring: Ring) -> Self {
        ring.points
    }
}

/// A polygon made of an outer ring and zero or more holes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    rings: Vec<Ring>,
}

impl Polygon {
    pub fn new(rings: Vec<Ring>) -> Self {
        Self { rings }
    }

    /// Convenience constructor for a hole-free polygon.
    pub fn from_exterior(points: Vec<Coordinate>) -> Self {
        Self::new(vec![Ring::new(points)])
    }

    /// Axis-aligned rectangle spanning `min` to `max`.
    pub fn rectangle(min: Coordinate, max: Coordinate) -> Self {
        Self::from_exterior(vec![
            [min[0], min[1]],
            [max[0], min[1]],
            [max[0], max[1]],
            [min[0], max[1]],
        ])
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    pub fn exterior(&self) -> Option<&Ring> {
        self.rings.first()
    }

    pub fn holes(&self) -> &[Ring] {
        self.rings.get(1..).unwrap_or(&[])
    }

    /// Inside the outer ring and not strictly inside any hole.
    pub fn contains(&self, point: Coordinate) -> bool {
        let Some(exterior) = self.exterior() else {
            return false;
        };
        if !exterior.contains(point) {
            return false;
        }
        !self
            .holes()
            .iter()
            .any(|hole| !hole.is_degenerate() && !hole.on_boundary(point) && hole.strictly_contains(point))
    }

    /// Outer area minus hole areas, clamped at zero.
    pub fn area(&self) -> f64 {
        let Some(exterior) = self.exterior() else {
            return 0.0;
        };
        let holes: f64 = self.holes().iter().map(Ring::area).sum();
        (exterior.area() - holes).max(0.0)
    }

    /// Minimum distance from `point` to any ring edge.
    pub fn distance_to_boundary(&self, point: Coordinate) -> f64 {
        self.rings
            .iter()
            .map(|ring| ring.distance_to_boundary(point))
            .fold(f64::INFINITY, f64::min)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of(self.exterior()?.points().iter().copied())
    }
}

/// Axis-aligned extent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl BoundingBox {
    pub fn of(points: impl IntoIterator<Item = Coordinate>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bbox = BoundingBox { min: first, max: first };
        for [x, y] in points {
            bbox.min = [bbox.min[0].min(x), bbox.min[1].min(y)];
            bbox.max = [bbox.max[0].max(x), bbox.max[1].max(y)];
        }
        Some(bbox)
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point[0] >= self.min[0]
            && point[0] <= self.max[0]
            && point[1] >= self.min[1]
            && point[1] <= self.max[1]
    }
}

/// Euclidean distance between two coordinates.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

fn distance_to_segment(p: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return distance(p, a);
    }
    let t = (((p[0] - a[0]) * dx + (p[1] - a[1]) * dy) / len_sq).clamp(0.0, 1.0);
    distance(p, [a[0] + t * dx, a[1] + t * dy])
}
