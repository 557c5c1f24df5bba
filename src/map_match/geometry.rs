use geo::{EuclideanDistance, Line, Point};

/// Euclidean distance between two points
pub fn point_distance(p1: Point<f64>, p2: Point<f64>) -> f64 {
    p1.euclidean_distance(&p2)
}

/// Minimum Euclidean distance from `point` to the closed segment
///
/// # Algorithm
/// Projection parameter `t = (p - a) · (b - a) / |b - a|²`, clamped to
/// `[0, 1]`, so points projecting past either end measure to that endpoint.
/// Zero-length segments (including ones whose squared length underflows to
/// 0) fall back to `point_distance`.
pub fn point_to_segment_distance(segment: &Line<f64>, point: Point<f64>) -> f64 {
    let start = Point::from(segment.start);
    let dx = segment.dx();
    let dy = segment.dy();

    let segment_length_sq = dx * dx + dy * dy;
    if segment_length_sq == 0.0 {
        return point_distance(start, point);
    }

    let px = point.x() - start.x();
    let py = point.y() - start.y();

    let t = ((px * dx + py * dy) / segment_length_sq).clamp(0.0, 1.0);

    let closest = Point::new(start.x() + t * dx, start.y() + t * dy);
    point_distance(closest, point)
}

/// Closest approach between two segments, approximated by the four
/// endpoint-to-segment distances.
///
/// Segments that cross away from all four endpoints do not report 0 here.
pub fn segment_gap(s1: &Line<f64>, s2: &Line<f64>) -> f64 {
    let d1 = point_to_segment_distance(s1, s2.start_point());
    let d2 = point_to_segment_distance(s1, s2.end_point());
    let d3 = point_to_segment_distance(s2, s1.start_point());
    let d4 = point_to_segment_distance(s2, s1.end_point());
    d1.min(d2).min(d3).min(d4)
}
