//! Circle math in a working plane. Points are `(first, second)` pairs in the
//! order given by [`Plane::axes`](super::Plane::axes).

use std::f64::consts::TAU;
use std::fmt;

const EPSILON: f64 = 1e-12;

/// Why an `R`-form arc has no centre
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArcFault {
    /// Start and end coincide, which a radius cannot describe
    Degenerate,
    /// Radius shorter than half the chord
    RadiusTooSmall { radius: f64, half_chord: f64 },
}

impl fmt::Display for ArcFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArcFault::Degenerate => write!(f, "arc start and end coincide"),
            ArcFault::RadiusTooSmall { radius, half_chord } => write!(
                f,
                "radius {radius:.4} is smaller than half the chord ({half_chord:.4})"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: (f64, f64),
    pub radius: f64,
}

impl Circle {
    /// How far `p` lies from the circumference
    pub fn deviation(&self, p: (f64, f64)) -> f64 {
        ((p.0 - self.center.0).hypot(p.1 - self.center.1) - self.radius).abs()
    }
}

/// Centre offset (relative to `start`) of the arc from `start` to `end` with
/// the given signed radius. A negative radius selects the arc longer than a
/// half circle. Radii up to `slack` short of the half chord are accepted as a
/// half circle.
pub fn center_from_radius(
    start: (f64, f64),
    end: (f64, f64),
    radius: f64,
    clockwise: bool,
    slack: f64,
) -> Result<(f64, f64), ArcFault> {
    let x = end.0 - start.0;
    let y = end.1 - start.1;
    let chord = x.hypot(y);
    if chord < EPSILON {
        return Err(ArcFault::Degenerate);
    }

    let mut h_x2 = 4.0 * radius * radius - x * x - y * y;
    if h_x2 < 0.0 {
        let half_chord = chord / 2.0;
        if radius.abs() + slack < half_chord {
            return Err(ArcFault::RadiusTooSmall {
                radius: radius.abs(),
                half_chord,
            });
        }
        h_x2 = 0.0;
    }

    let mut h = -h_x2.sqrt() / chord;
    if !clockwise {
        h = -h;
    }
    if radius < 0.0 {
        h = -h;
    }

    Ok((0.5 * (x - y * h), 0.5 * (y + x * h)))
}

/// Circle through three points, `None` when they are collinear
pub fn circle_through(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> Option<Circle> {
    let d = 2.0 * (a.0 * (b.1 - c.1) + b.0 * (c.1 - a.1) + c.0 * (a.1 - b.1));
    if d.abs() < EPSILON {
        return None;
    }

    let a2 = a.0 * a.0 + a.1 * a.1;
    let b2 = b.0 * b.0 + b.1 * b.1;
    let c2 = c.0 * c.0 + c.1 * c.1;
    let ux = (a2 * (b.1 - c.1) + b2 * (c.1 - a.1) + c2 * (a.1 - b.1)) / d;
    let uy = (a2 * (c.0 - b.0) + b2 * (a.0 - c.0) + c2 * (b.0 - a.0)) / d;

    Some(Circle {
        center: (ux, uy),
        radius: (a.0 - ux).hypot(a.1 - uy),
    })
}

/// Signed turn at `b` walking `a` → `b` → `c`; positive is counter-clockwise
pub fn turn(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0)
}

/// Angle swept going from `start` to `end` around `center`, in `(0, 2π]`
pub fn sweep(center: (f64, f64), start: (f64, f64), end: (f64, f64), clockwise: bool) -> f64 {
    let a0 = (start.1 - center.1).atan2(start.0 - center.0);
    let a1 = (end.1 - center.1).atan2(end.0 - center.0);
    let raw = if clockwise { a0 - a1 } else { a1 - a0 };
    let swept = raw.rem_euclid(TAU);
    if swept < EPSILON { TAU } else { swept }
}

/// Largest gap between a chord of length `chord` and its arc
pub fn sagitta(radius: f64, chord: f64) -> f64 {
    let half = chord / 2.0;
    radius - (radius * radius - half * half).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn clockwise_minor_arc_centre_lies_right_of_chord() {
        let offset = center_from_radius((0.0, 0.0), (2.0, 0.0), 2f64.sqrt(), true, 0.0).unwrap();
        assert!(close(offset, (1.0, -1.0)));
    }

    #[test]
    fn counter_clockwise_minor_arc_centre_lies_left_of_chord() {
        let offset =
            center_from_radius((0.0, 0.0), (2.0, 0.0), 2f64.sqrt(), false, 0.0).unwrap();
        assert!(close(offset, (1.0, 1.0)));
    }

    #[test]
    fn negative_radius_selects_major_arc() {
        let offset =
            center_from_radius((0.0, 0.0), (2.0, 0.0), -(2f64.sqrt()), true, 0.0).unwrap();
        assert!(close(offset, (1.0, 1.0)));
        let swept = sweep((1.0, 1.0), (0.0, 0.0), (2.0, 0.0), true);
        assert!((swept - 1.5 * PI).abs() < 1e-9);
    }

    #[test]
    fn half_circle_within_slack() {
        let offset = center_from_radius((0.0, 0.0), (2.0, 0.0), 0.9999, true, 0.001).unwrap();
        assert!(close(offset, (1.0, 0.0)));
    }

    #[test]
    fn radius_too_small_is_reported() {
        let err = center_from_radius((0.0, 0.0), (2.0, 0.0), 0.5, true, 0.001).unwrap_err();
        assert!(matches!(err, ArcFault::RadiusTooSmall { .. }));
        assert!(err.to_string().contains("smaller than half the chord"));
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let err = center_from_radius((1.0, 1.0), (1.0, 1.0), 3.0, false, 0.0).unwrap_err();
        assert_eq!(err, ArcFault::Degenerate);
    }

    #[test]
    fn circle_through_three_points() {
        let circle = circle_through((1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)).unwrap();
        assert!(close(circle.center, (0.0, 0.0)));
        assert!((circle.radius - 1.0).abs() < 1e-9);
        assert!(circle.deviation((0.0, -1.0)) < 1e-9);
    }

    #[test]
    fn collinear_points_have_no_circle() {
        assert!(circle_through((0.0, 0.0), (1.0, 1.0), (2.0, 2.0)).is_none());
    }

    #[test]
    fn turn_sign_and_sweep() {
        assert!(turn((1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)) > 0.0);
        let swept = sweep((0.0, 0.0), (1.0, 0.0), (0.0, 1.0), false);
        assert!((swept - FRAC_PI_2).abs() < 1e-9);
        let full = sweep((0.0, 0.0), (1.0, 0.0), (1.0, 0.0), true);
        assert!((full - TAU).abs() < 1e-9);
    }

    #[test]
    fn sagitta_of_half_circle_is_radius() {
        assert!((sagitta(1.0, 2.0) - 1.0).abs() < 1e-12);
        assert!(sagitta(10.0, 0.1) < 1e-3);
    }
}
