//! Quintic splines for holonomic paths
//!
//! The translation of the path follows the robot's course (direction of
//! travel) while the robot heading is interpolated by a separate spline, so
//! the two can differ.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;

// Internal
use super::PoseWithMotion;
use crate::geom::Pose2;
use util::maths::angle_modulus;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Scale of the end tangents relative to the distance between the end points.
const TANGENT_SCALE: f64 = 1.2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Quintic polynomial `a t^5 + b t^4 + c t^3 + d t^2 + e t + f` over t in
/// [0, 1], built from the value and first two derivatives at each end.
#[derive(Debug, Clone, Copy)]
pub struct Spline1d {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

/// Path segment between two waypoints with independent heading.
#[derive(Debug, Clone, Copy)]
pub struct HolonomicSpline {
    x: Spline1d,
    y: Spline1d,

    /// Heading change relative to `heading_0_rad`.
    theta: Spline1d,

    heading_0_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Spline1d {
    /// Build from the value, first and second derivatives at t = 0 and t = 1.
    pub fn new(x0: f64, x1: f64, dx0: f64, dx1: f64, ddx0: f64, ddx1: f64) -> Self {
        Self {
            a: -6.0 * x0 - 3.0 * dx0 - 0.5 * ddx0 + 0.5 * ddx1 - 3.0 * dx1 + 6.0 * x1,
            b: 15.0 * x0 + 8.0 * dx0 + 1.5 * ddx0 - ddx1 + 7.0 * dx1 - 15.0 * x1,
            c: -10.0 * x0 - 6.0 * dx0 - 1.5 * ddx0 + 0.5 * ddx1 - 4.0 * dx1 + 10.0 * x1,
            d: 0.5 * ddx0,
            e: dx0,
            f: x0,
        }
    }

    pub fn value(&self, t: f64) -> f64 {
        ((((self.a * t + self.b) * t + self.c) * t + self.d) * t + self.e) * t + self.f
    }

    pub fn deriv(&self, t: f64) -> f64 {
        (((5.0 * self.a * t + 4.0 * self.b) * t + 3.0 * self.c) * t + 2.0 * self.d) * t + self.e
    }

    pub fn deriv2(&self, t: f64) -> f64 {
        ((20.0 * self.a * t + 12.0 * self.b) * t + 6.0 * self.c) * t + 2.0 * self.d
    }
}

impl HolonomicSpline {
    /// Build a spline between two waypoints.
    ///
    /// The waypoint headings give the course at each end, `heading_0_rad` and
    /// `heading_1_rad` are the robot headings. The heading turns the short way
    /// round and starts and ends with zero rate.
    pub fn new(p0: &Pose2, p1: &Pose2, heading_0_rad: f64, heading_1_rad: f64) -> Self {
        let scale = TANGENT_SCALE * p0.distance_m(p1);

        let x = Spline1d::new(
            p0.x(),
            p1.x(),
            p0.heading_rad.cos() * scale,
            p1.heading_rad.cos() * scale,
            0.0,
            0.0,
        );
        let y = Spline1d::new(
            p0.y(),
            p1.y(),
            p0.heading_rad.sin() * scale,
            p1.heading_rad.sin() * scale,
            0.0,
            0.0,
        );

        let delta = angle_modulus(heading_1_rad - heading_0_rad);
        let theta = Spline1d::new(0.0, delta, 0.0, 0.0, 0.0, 0.0);

        Self {
            x,
            y,
            theta,
            heading_0_rad,
        }
    }

    pub fn point(&self, t: f64) -> Vector2<f64> {
        Vector2::new(self.x.value(t), self.y.value(t))
    }

    /// Direction of travel.
    pub fn course_rad(&self, t: f64) -> f64 {
        self.y.deriv(t).atan2(self.x.deriv(t))
    }

    pub fn heading_rad(&self, t: f64) -> f64 {
        angle_modulus(self.heading_0_rad + self.theta.value(t))
    }

    /// Rate of travel along the path with respect to the parameter.
    ///
    /// Units: meters
    pub fn velocity(&self, t: f64) -> f64 {
        self.x.deriv(t).hypot(self.y.deriv(t))
    }

    /// Units: 1/meters
    pub fn curvature(&self, t: f64) -> f64 {
        let dx = self.x.deriv(t);
        let dy = self.y.deriv(t);
        let ddx = self.x.deriv2(t);
        let ddy = self.y.deriv2(t);

        let speed_sq = dx * dx + dy * dy;
        if speed_sq < 1e-12 {
            return 0.0;
        }

        (dx * ddy - ddx * dy) / (speed_sq * speed_sq.sqrt())
    }

    /// Change of heading per distance travelled.
    ///
    /// Units: radians/meter
    pub fn heading_rate(&self, t: f64) -> f64 {
        let v = self.velocity(t);
        if v < 1e-12 {
            return 0.0;
        }

        self.theta.deriv(t) / v
    }

    pub fn pose_with_motion(&self, t: f64) -> PoseWithMotion {
        let point = self.point(t);

        PoseWithMotion {
            pose: Pose2::new(point[0], point[1], self.heading_rad(t)),
            course_rad: self.course_rad(t),
            curvature_m: self.curvature(t),
            heading_rate_radm: self.heading_rate(t),
        }
    }
}
