//! Geometry
//!
//! Coordinates, working planes and the handful of floating point formulas the
//! passes need. Every formula here returns to `Decimal` at its boundary.

pub mod arc;
pub mod coord;

pub use arc::{ArcFault, Circle, center_from_radius, circle_through, sagitta, sweep, turn};
pub use coord::{Axes, Axis, Coord};

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use coord::to_f64;

/// Working plane for arcs (`G17`, `G18`, `G19`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Plane {
    #[default]
    XY,
    ZX,
    YZ,
}

impl Plane {
    /// The in-plane axes, ordered so that a positive turn is counter-clockwise
    /// (`G3`) when looking down the normal.
    pub fn axes(self) -> (Axis, Axis) {
        match self {
            Plane::XY => (Axis::X, Axis::Y),
            Plane::ZX => (Axis::Z, Axis::X),
            Plane::YZ => (Axis::Y, Axis::Z),
        }
    }

    pub fn normal(self) -> Axis {
        match self {
            Plane::XY => Axis::Z,
            Plane::ZX => Axis::Y,
            Plane::YZ => Axis::X,
        }
    }

    /// Centre offset letters matching [`Plane::axes`]
    pub fn offset_letters(self) -> (char, char) {
        match self {
            Plane::XY => ('I', 'J'),
            Plane::ZX => ('K', 'I'),
            Plane::YZ => ('J', 'K'),
        }
    }

    /// Plane selected by a `G` word value, if it is one of `G17`..`G19`
    pub fn from_code(code: Decimal) -> Option<Plane> {
        if code == Decimal::from(17) {
            Some(Plane::XY)
        } else if code == Decimal::from(18) {
            Some(Plane::ZX)
        } else if code == Decimal::from(19) {
            Some(Plane::YZ)
        } else {
            None
        }
    }
}

/// Round a floating point result back to `precision` decimal places.
/// `None` when the value is not finite or out of `Decimal` range.
pub fn round_to(value: f64, precision: u32) -> Option<Decimal> {
    Decimal::from_f64(value).map(|d| d.round_dp(precision).normalize())
}

/// Distance from `p` to the segment `a`-`b` in 3D, unset axes counting as zero.
/// A distance too large to represent comes back as `Decimal::MAX`.
pub fn distance_to_segment(p: &Coord, a: &Coord, b: &Coord, precision: u32) -> Decimal {
    let ab = b.subtract(a);
    let ap = p.subtract(a);
    let (abx, aby, abz) = (to_f64(ab.x()), to_f64(ab.y()), to_f64(ab.z()));
    let (apx, apy, apz) = (to_f64(ap.x()), to_f64(ap.y()), to_f64(ap.z()));

    let len2 = abx * abx + aby * aby + abz * abz;
    if len2 == 0.0 {
        return round_to(p.distance_f64(a), precision).unwrap_or(Decimal::MAX);
    }

    let t = ((apx * abx + apy * aby + apz * abz) / len2).clamp(0.0, 1.0);
    let (dx, dy, dz) = (apx - t * abx, apy - t * aby, apz - t * abz);
    round_to(dx.hypot(dy).hypot(dz), precision).unwrap_or(Decimal::MAX)
}
