//! Tile geometry as loaded from the map document.

use serde::{Deserialize, Serialize};

use crate::TileId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned bounds of a polygon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Bounds of a point set, `None` when the set is empty.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for p in &points[1..] {
            bounds.min_x = bounds.min_x.min(p.x);
            bounds.min_y = bounds.min_y.min(p.y);
            bounds.max_x = bounds.max_x.max(p.x);
            bounds.max_y = bounds.max_y.max(p.y);
        }
        Some(bounds)
    }

    /// True when the gap between the boxes is at most `slack` on both axes.
    pub fn overlaps_within(&self, other: &BoundingBox, slack: f64) -> bool {
        let x_overlap = !(self.max_x < other.min_x - slack || other.max_x < self.min_x - slack);
        let y_overlap = !(self.max_y < other.min_y - slack || other.max_y < self.min_y - slack);
        x_overlap && y_overlap
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// One tile of the map document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileGeometry {
    pub id: TileId,
    pub polygon: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_y: Option<f64>,
}

impl TileGeometry {
    pub fn new(id: TileId, polygon: Vec<Point>) -> Self {
        Self {
            id,
            polygon,
            center_x: None,
            center_y: None,
        }
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.polygon)
    }

    /// Fewer than three vertices cannot enclose an area.
    pub fn is_degenerate(&self) -> bool {
        self.polygon.len() < 3
    }

    /// Closed edge list: consecutive vertex pairs, wrapping last to first.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        polygon_edges(&self.polygon)
    }

    pub fn centroid(&self) -> Option<Point> {
        polygon_centroid(&self.polygon)
    }

    pub fn contains(&self, point: Point) -> bool {
        point_in_polygon(point, &self.polygon)
    }
}

/// The full map document: canvas size plus tile list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapGeometry {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub tiles: Vec<TileGeometry>,
}

impl MapGeometry {
    pub fn tile(&self, id: TileId) -> Option<&TileGeometry> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn tile_ids(&self) -> impl Iterator<Item = TileId> + '_ {
        self.tiles.iter().map(|t| t.id)
    }

    /// Hit-test a map coordinate. Overlapping tiles resolve to the lowest id.
    pub fn tile_at(&self, point: Point) -> Option<TileId> {
        self.tiles
            .iter()
            .filter(|t| !t.is_degenerate() && t.contains(point))
            .map(|t| t.id)
            .min()
    }
}

pub fn polygon_edges(polygon: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| (polygon[i], polygon[(i + 1) % n]))
}

/// Area centroid via the shoelace formula.
///
/// Zero-area polygons fall back to the vertex mean so callers always get a
/// usable label anchor.
pub fn polygon_centroid(polygon: &[Point]) -> Option<Point> {
    if polygon.is_empty() {
        return None;
    }

    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (a, b) in polygon_edges(polygon) {
        let cross = a.x * b.y - b.x * a.y;
        area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    area /= 2.0;

    if area.abs() < f64::EPSILON {
        let n = polygon.len() as f64;
        let sum = polygon.iter().fold(Point::default(), |acc, p| acc + *p);
        return Some(Point::new(sum.x / n, sum.y / n));
    }

    Some(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
}

/// Even-odd ray casting test.
pub fn point_in_polygon(point: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Keep `point` inside `polygon`, snapping to the nearest boundary point when
/// it falls outside. Used to clamp dragged label anchors.
pub fn constrain_to_polygon(point: Point, polygon: &[Point]) -> Point {
    if polygon.is_empty() || point_in_polygon(point, polygon) {
        return point;
    }

    let mut best: Option<(f64, Point)> = None;
    for (a, b) in polygon_edges(polygon) {
        let q = closest_point_on_segment(point, a, b);
        let d = point.distance(q);
        match best {
            None => best = Some((d, q)),
            Some((best_d, _)) if d < best_d => best = Some((d, q)),
            _ => {}
        }
    }
    best.map(|(_, q)| q).unwrap_or(point)
}

fn closest_point_on_segment(point: Point, a: Point, b: Point) -> Point {
    let ab = b - a;
    let length_sq = ab.dot(ab);
    if length_sq == 0.0 {
        return a;
    }
    let t = ((point - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    a + ab * t
}
