//! Point arithmetic shared by the measure and draw tools.

use bevy::math::DVec3;

/// Position in survey space: easting, northing, height in metres.
pub type WorldPoint = DVec3;

/// Fewest committed vertices a finalised line or polygon may have.
pub const MIN_SHAPE_VERTICES: usize = 2;

/// Straight-line distance between two survey points.
pub fn distance(a: WorldPoint, b: WorldPoint) -> f64 {
    a.distance(b)
}

pub fn midpoint(a: WorldPoint, b: WorldPoint) -> WorldPoint {
    (a + b) * 0.5
}

/// Label text for a measured distance, rounded to two decimals.
pub fn format_distance(metres: f64) -> String {
    format!("{metres:.2} meters")
}

/// Whether a vertex list can be persisted as a shape.
pub fn is_valid_vertex_list(vertices: &[WorldPoint]) -> bool {
    vertices.len() >= MIN_SHAPE_VERTICES && vertices.iter().all(|v| v.is_finite())
}

/// Sum of segment lengths along an open vertex list.
pub fn polyline_length(vertices: &[WorldPoint]) -> f64 {
    vertices.windows(2).map(|pair| distance(pair[0], pair[1])).sum()
}

/// Horizontal area enclosed by a ring (shoelace over easting/northing).
/// The ring is closed implicitly; fewer than three vertices enclose nothing.
pub fn planar_area(ring: &[WorldPoint]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }

    let twice_area: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();

    twice_area.abs() * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let a = WorldPoint::new(0.0, 0.0, 0.0);
        let b = WorldPoint::new(3.0, 4.0, 0.0);
        assert_eq!(distance(a, b), 5.0);
        assert_eq!(midpoint(a, b), WorldPoint::new(1.5, 2.0, 0.0));
    }

    #[test]
    fn distance_label_uses_two_decimals() {
        assert_eq!(format_distance(5.0), "5.00 meters");
        assert_eq!(format_distance(12.345_6), "12.35 meters");
        assert_eq!(format_distance(0.0), "0.00 meters");
    }

    #[test]
    fn single_vertex_is_not_a_shape() {
        let p = WorldPoint::new(1.0, 1.0, 0.0);
        assert!(!is_valid_vertex_list(&[]));
        assert!(!is_valid_vertex_list(&[p]));
        assert!(is_valid_vertex_list(&[p, p + WorldPoint::X]));
        assert!(!is_valid_vertex_list(&[p, WorldPoint::new(f64::NAN, 0.0, 0.0)]));
    }

    #[test]
    fn square_area_and_perimeter() {
        let ring = [
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(10.0, 0.0, 0.0),
            WorldPoint::new(10.0, 10.0, 0.0),
            WorldPoint::new(0.0, 10.0, 0.0),
        ];
        assert_eq!(planar_area(&ring), 100.0);
        assert_eq!(polyline_length(&ring), 30.0);
        assert_eq!(planar_area(&ring[..2]), 0.0);
    }
}
