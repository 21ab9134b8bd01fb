//! Discretised spline paths

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
use super::{HolonomicSpline, Params, PoseWithMotion};
use util::maths::angle_modulus;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Bounds the subdivision of a spline whose segments never satisfy the limits.
const MAX_SUBDIVISION_DEPTH: u32 = 24;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path made of short, nearly straight segments, with the arc length to
/// each point.
#[derive(Debug, Clone)]
pub struct Path {
    points: Vec<PoseWithMotion>,

    /// Units: meters
    distances_m: Vec<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Discretise a chain of splines.
    ///
    /// The first point of each spline after the first is dropped as it
    /// duplicates the end of the previous spline.
    pub fn from_splines(splines: &[HolonomicSpline], params: &Params) -> Self {
        let mut points = Vec::new();

        for (i, spline) in splines.iter().enumerate() {
            let samples = parameterize(spline, params);
            let skip = if i == 0 { 0 } else { 1 };
            points.extend(samples.into_iter().skip(skip));
        }

        Self::from_points(points)
    }

    pub fn from_points(points: Vec<PoseWithMotion>) -> Self {
        let mut distances_m = Vec::with_capacity(points.len());
        let mut total = 0.0;

        for (i, point) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].distance_m(point);
            }
            distances_m.push(total);
        }

        Self {
            points,
            distances_m,
        }
    }

    pub fn points(&self) -> &[PoseWithMotion] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total arc length of the path.
    ///
    /// Units: meters
    pub fn length_m(&self) -> f64 {
        self.distances_m.last().copied().unwrap_or(0.0)
    }

    /// The point at the given arc length from the start, interpolated along
    /// the arc between the bracketing points.
    ///
    /// Distances outside the path are clamped to its ends. Returns `None` for
    /// an empty path.
    pub fn sample(&self, distance_m: f64) -> Option<PoseWithMotion> {
        let first = *self.points.first()?;
        let last = *self.points.last()?;

        let i = self.distances_m.partition_point(|d| *d < distance_m);

        if i == 0 {
            return Some(first);
        }
        if i >= self.points.len() {
            return Some(last);
        }

        let d0 = self.distances_m[i - 1];
        let d1 = self.distances_m[i];
        let frac = if d1 > d0 {
            (distance_m - d0) / (d1 - d0)
        }
        else {
            0.0
        };

        Some(self.points[i - 1].interpolate(&self.points[i], frac))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Subdivide a spline into segments which satisfy the limits in `params`.
pub fn parameterize(spline: &HolonomicSpline, params: &Params) -> Vec<PoseWithMotion> {
    let mut points = vec![spline.pose_with_motion(0.0)];
    get_segment_arc(spline, &mut points, 0.0, 1.0, params, 0);
    points
}

/// Append the end of the segment `[t0, t1]` if it is short enough, otherwise
/// split it in half and recurse.
fn get_segment_arc(
    spline: &HolonomicSpline,
    points: &mut Vec<PoseWithMotion>,
    t0: f64,
    t1: f64,
    params: &Params,
    depth: u32,
) {
    let p0 = spline.pose_with_motion(t0);
    let p1 = spline.pose_with_motion(t1);

    // Segment as seen by the path, in the frame of its start
    let twist = p0.course_pose().log(&p1.course_pose());
    let heading_change = angle_modulus(p1.pose.heading_rad - p0.pose.heading_rad);

    let too_long = twist.dx_m.abs() > params.max_dx_m
        || twist.dy_m.abs() > params.max_dy_m
        || twist.dtheta_rad.abs() > params.max_dtheta_rad
        || heading_change.abs() > params.max_dtheta_rad;

    if too_long && depth < MAX_SUBDIVISION_DEPTH {
        let t_mid = 0.5 * (t0 + t1);
        get_segment_arc(spline, points, t0, t_mid, params, depth + 1);
        get_segment_arc(spline, points, t_mid, t1, params, depth + 1);
    }
    else {
        points.push(p1);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geom::Pose2;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_straight_path() {
        let spline = HolonomicSpline::new(
            &Pose2::new(0.0, 0.0, 0.0),
            &Pose2::new(1.0, 0.0, 0.0),
            0.0,
            0.0,
        );
        let params = Params::default();
        let path = Path::from_splines(&[spline], &params);

        assert_abs_diff_eq!(path.length_m(), 1.0, epsilon = 1e-9);

        // Every segment is within the limits
        for pair in path.points().windows(2) {
            assert!(pair[0].distance_m(&pair[1]) <= params.max_dx_m + 1e-9);
        }

        let mid = path.sample(0.5).unwrap();
        assert_abs_diff_eq!(mid.pose.x(), 0.5, epsilon = 1e-9);

        // Clamped at the ends
        assert_abs_diff_eq!(path.sample(-1.0).unwrap().pose.x(), 0.0);
        assert_abs_diff_eq!(path.sample(5.0).unwrap().pose.x(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_joined_splines() {
        let a = Pose2::new(0.0, 0.0, 0.0);
        let b = Pose2::new(1.0, 1.0, FRAC_PI_2);
        let c = Pose2::new(1.0, 2.0, FRAC_PI_2);
        let params = Params::default();

        let first = parameterize(&HolonomicSpline::new(&a, &b, 0.0, 0.0), &params);
        let second = parameterize(&HolonomicSpline::new(&b, &c, 0.0, 0.0), &params);

        let path = Path::from_splines(
            &[
                HolonomicSpline::new(&a, &b, 0.0, 0.0),
                HolonomicSpline::new(&b, &c, 0.0, 0.0),
            ],
            &params,
        );

        // The shared waypoint only appears once
        assert_eq!(path.len(), first.len() + second.len() - 1);

        // Distances increase monotonically
        for pair in path.points().windows(2) {
            assert!(pair[0].distance_m(&pair[1]) > 0.0);
        }
    }

    #[test]
    fn test_empty_path() {
        let path = Path::from_points(Vec::new());
        assert!(path.is_empty());
        assert!(path.sample(0.0).is_none());
        assert_eq!(path.length_m(), 0.0);
    }
}
