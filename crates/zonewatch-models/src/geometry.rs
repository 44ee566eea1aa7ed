//! Polygon geometry in image pixel space.

use serde::{Deserialize, Serialize};

/// A polygon vertex in image pixel coordinates.
///
/// Serialized as a two-element `[x, y]` array to match the wire format used
/// by the dashboard and the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Signed shoelace area of a polygon, in pixels squared.
///
/// Returns 0.0 for fewer than three vertices. The sign depends on winding
/// order; callers interested in degeneracy should compare `abs()` to zero.
pub fn polygon_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        acc += a.x * b.y - b.x * a.y;
    }
    acc / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_serializes_as_array() {
        let p = Point::new(10.0, 20.5);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[10.0,20.5]");

        let back: Point = serde_json::from_str("[3, 4]").unwrap();
        assert_eq!(back, Point::new(3.0, 4.0));
    }

    #[test]
    fn test_polygon_area_square() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert_eq!(polygon_area(&square).abs(), 100.0);
    }

    #[test]
    fn test_polygon_area_degenerate() {
        let line = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(10.0, 10.0),
        ];
        assert_eq!(polygon_area(&line).abs(), 0.0);
    }
}
