//! `PathSpec` ↔ kurbo conversion and curve distance queries.

use kurbo::{BezPath, CubicBez, Line, ParamCurveNearest, QuadBez};
use wf_core::{PathSegment, PathSpec, Point};

/// Accuracy passed to kurbo's nearest-point solver.
const NEAREST_ACCURACY: f64 = 1e-3;

fn kp(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

/// Build a kurbo path for painting or export.
pub fn to_bez_path(path: &PathSpec) -> BezPath {
    let mut bez = BezPath::new();
    bez.move_to(kp(path.start));
    for seg in &path.segments {
        match *seg {
            PathSegment::Line { to } => bez.line_to(kp(to)),
            PathSegment::Quad { control, to } => bez.quad_to(kp(control), kp(to)),
            PathSegment::Cubic { c1, c2, to } => bez.curve_to(kp(c1), kp(c2), kp(to)),
        }
    }
    bez
}

/// Shortest distance from `p` to any segment of the path.
pub fn distance_to(path: &PathSpec, p: Point) -> f32 {
    let target = kp(p);
    let mut prev = kp(path.start);
    let mut best = f64::INFINITY;
    for seg in &path.segments {
        let d2 = match *seg {
            PathSegment::Line { to } => Line::new(prev, kp(to)).nearest(target, NEAREST_ACCURACY).distance_sq,
            PathSegment::Quad { control, to } => QuadBez::new(prev, kp(control), kp(to))
                .nearest(target, NEAREST_ACCURACY)
                .distance_sq,
            PathSegment::Cubic { c1, c2, to } => CubicBez::new(prev, kp(c1), kp(c2), kp(to))
                .nearest(target, NEAREST_ACCURACY)
                .distance_sq,
        };
        best = best.min(d2);
        prev = kp(seg.end());
    }
    best.sqrt() as f32
}

/// Index at which a waypoint placed at `p` keeps the route's order: the
/// segment of the path closest to `p`.
pub fn insertion_index(path: &PathSpec, p: Point) -> usize {
    let target = kp(p);
    let mut prev = kp(path.start);
    let mut best = (f64::INFINITY, 0);
    for (i, seg) in path.segments.iter().enumerate() {
        let end = kp(seg.end());
        let d2 = Line::new(prev, end).nearest(target, NEAREST_ACCURACY).distance_sq;
        if d2 < best.0 {
            best = (d2, i);
        }
        prev = end;
    }
    best.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn distance_to_line_segments() {
        let path = PathSpec {
            start: Point::new(0.0, 0.0),
            segments: smallvec![
                PathSegment::Line { to: Point::new(100.0, 0.0) },
                PathSegment::Line { to: Point::new(100.0, 100.0) },
            ],
        };
        assert!((distance_to(&path, Point::new(50.0, 10.0)) - 10.0).abs() < 0.01);
        assert!((distance_to(&path, Point::new(110.0, 50.0)) - 10.0).abs() < 0.01);
    }

    #[test]
    fn quad_distance_at_apex() {
        let path = PathSpec {
            start: Point::new(0.0, 0.0),
            segments: smallvec![PathSegment::Quad {
                control: Point::new(50.0, 60.0),
                to: Point::new(100.0, 0.0),
            }],
        };
        // Apex of the quad sits at half the control offset.
        assert!(distance_to(&path, Point::new(50.0, 30.0)) < 0.1);
    }

    #[test]
    fn insertion_index_picks_closest_leg() {
        let path = PathSpec {
            start: Point::new(0.0, 0.0),
            segments: smallvec![
                PathSegment::Line { to: Point::new(100.0, 0.0) },
                PathSegment::Line { to: Point::new(100.0, 100.0) },
            ],
        };
        assert_eq!(insertion_index(&path, Point::new(40.0, 3.0)), 0);
        assert_eq!(insertion_index(&path, Point::new(97.0, 70.0)), 1);
    }

    #[test]
    fn bez_path_has_one_element_per_segment_plus_move() {
        let path = PathSpec {
            start: Point::new(0.0, 0.0),
            segments: smallvec![PathSegment::Line { to: Point::new(10.0, 0.0) }],
        };
        assert_eq!(to_bez_path(&path).elements().len(), 2);
    }
}
