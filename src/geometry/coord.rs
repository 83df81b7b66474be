//! Three-axis coordinates with a record of which axes were actually specified.
//!
//! A `Coord` never changes once built. Every operation returns a fresh value,
//! and the `Axes` mask travels with it so downstream passes can tell an axis
//! that is really zero from one that was never mentioned.
//!
//! Some operations (`distance`, `coplanar`, `from_pair`, `to_xy`) are not
//! used by the passes in this crate; they round out the public point model
//! for library callers.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};

use super::Plane;

/// A single linear axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }

    pub fn from_letter(letter: char) -> Option<Axis> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Axis::X => 0b001,
            Axis::Y => 0b010,
            Axis::Z => 0b100,
        }
    }
}

/// Bitmask over `{X, Y, Z}`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Axes(u8);

impl Axes {
    pub const NONE: Axes = Axes(0);
    pub const X: Axes = Axes(0b001);
    pub const Y: Axes = Axes(0b010);
    pub const Z: Axes = Axes(0b100);
    pub const ALL: Axes = Axes(0b111);

    pub fn has(self, axis: Axis) -> bool {
        self.0 & axis.bit() != 0
    }

    /// True when every axis in `other` is also in `self`
    pub fn contains(self, other: Axes) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn with(self, axis: Axis) -> Axes {
        Axes(self.0 | axis.bit())
    }

    pub fn without(self, axis: Axis) -> Axes {
        Axes(self.0 & !axis.bit())
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |axis| self.has(*axis))
    }
}

impl From<Axis> for Axes {
    fn from(axis: Axis) -> Self {
        Axes(axis.bit())
    }
}

impl BitOr for Axes {
    type Output = Axes;

    fn bitor(self, rhs: Axes) -> Axes {
        Axes(self.0 | rhs.0)
    }
}

impl BitOrAssign for Axes {
    fn bitor_assign(&mut self, rhs: Axes) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Axes {
    type Output = Axes;

    fn bitand(self, rhs: Axes) -> Axes {
        Axes(self.0 & rhs.0)
    }
}

impl Not for Axes {
    type Output = Axes;

    fn not(self) -> Axes {
        Axes(!self.0 & Axes::ALL.0)
    }
}

impl fmt::Debug for Axes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "Axes(-)");
        }
        let letters: String = self.iter().map(Axis::letter).collect();
        write!(f, "Axes({letters})")
    }
}

/// A point in machine space.
///
/// Equality compares the three values *and* the set mask, so `X0` with only
/// X set differs from an all-zero point with every axis set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Coord {
    x: Decimal,
    y: Decimal,
    z: Decimal,
    set: Axes,
}

impl Coord {
    /// Fully specified point
    pub fn new(x: Decimal, y: Decimal, z: Decimal) -> Self {
        Self {
            x,
            y,
            z,
            set: Axes::ALL,
        }
    }

    /// Point with nothing specified
    pub fn unset() -> Self {
        Self::default()
    }

    /// Build from two values, filling the axes other than `dropped` in X, Y, Z
    /// order. The dropped axis stays zero and unset.
    pub fn from_pair(dropped: Axis, first: Decimal, second: Decimal) -> Self {
        let mut remaining = Axis::ALL.into_iter().filter(|axis| *axis != dropped);
        let mut coord = Coord::unset();
        if let Some(axis) = remaining.next() {
            coord = coord.with(axis, first);
        }
        if let Some(axis) = remaining.next() {
            coord = coord.with(axis, second);
        }
        coord
    }

    pub fn x(&self) -> Decimal {
        self.x
    }

    pub fn y(&self) -> Decimal {
        self.y
    }

    pub fn z(&self) -> Decimal {
        self.z
    }

    pub fn set(&self) -> Axes {
        self.set
    }

    pub fn get(&self, axis: Axis) -> Decimal {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn is_set(&self, axis: Axis) -> bool {
        self.set.has(axis)
    }

    /// Copy of `self` with `axis` replaced and marked as set
    pub fn with(&self, axis: Axis, value: Decimal) -> Coord {
        let mut next = *self;
        match axis {
            Axis::X => next.x = value,
            Axis::Y => next.y = value,
            Axis::Z => next.z = value,
        }
        next.set = next.set.with(axis);
        next
    }

    /// Copy of `self` restricted to the axes in `mask`; the others become
    /// zero and unset.
    pub fn masked(&self, mask: Axes) -> Coord {
        Axis::ALL
            .into_iter()
            .filter(|axis| mask.has(*axis) && self.is_set(*axis))
            .fold(Coord::unset(), |acc, axis| acc.with(axis, self.get(axis)))
    }

    /// Per axis: take `other`'s value when `other` has it set and either
    /// `self` does not, or `overwrite` is true. Otherwise keep `self`'s value
    /// and set bit.
    pub fn merge(&self, other: &Coord, overwrite: bool) -> Coord {
        Axis::ALL.into_iter().fold(*self, |acc, axis| {
            if other.is_set(axis) && (overwrite || !self.is_set(axis)) {
                acc.with(axis, other.get(axis))
            } else {
                acc
            }
        })
    }

    /// Per-axis sum. The result has every axis either operand had set.
    pub fn add(&self, other: &Coord) -> Coord {
        Coord {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
            set: self.set | other.set,
        }
    }

    /// Per-axis difference `self - other`, set mask as in [`Coord::add`].
    pub fn subtract(&self, other: &Coord) -> Coord {
        Coord {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
            set: self.set | other.set,
        }
    }

    /// Euclidean distance over all three axes, unset axes counting as zero.
    ///
    /// Computed as the hypotenuse of the X/Y hypotenuse and Z.
    pub fn distance(&self, other: &Coord) -> Decimal {
        let d = self.subtract(other);
        let planar = to_f64(d.x).hypot(to_f64(d.y));
        Decimal::from_f64(planar.hypot(to_f64(d.z))).unwrap_or(Decimal::MAX)
    }

    /// Same as [`Coord::distance`] without leaving floating point
    pub fn distance_f64(&self, other: &Coord) -> f64 {
        let d = self.subtract(other);
        to_f64(d.x).hypot(to_f64(d.y)).hypot(to_f64(d.z))
    }

    /// True for a single point; for several, true when all of them share the
    /// exact same X, the same Y, or the same Z.
    pub fn coplanar(coords: &[Coord]) -> bool {
        match coords.len() {
            0 => false,
            1 => true,
            _ => !Coord::ortho(coords).is_empty(),
        }
    }

    /// Axes on which every point has exactly the same value
    pub fn ortho(coords: &[Coord]) -> Axes {
        let Some((first, rest)) = coords.split_first() else {
            return Axes::NONE;
        };
        Axis::ALL
            .into_iter()
            .filter(|axis| rest.iter().all(|c| c.get(*axis) == first.get(*axis)))
            .fold(Axes::NONE, Axes::with)
    }

    /// Project onto `plane`, returning the two in-plane values in the plane's
    /// axis order.
    pub fn to_point(&self, plane: Plane) -> (f64, f64) {
        let (first, second) = plane.axes();
        (to_f64(self.get(first)), to_f64(self.get(second)))
    }

    /// Drop Z, keeping X and Y with their set bits
    pub fn to_xy(&self) -> Coord {
        self.masked(Axes::X | Axes::Y)
    }

    /// Both in-plane axes of `plane` are set
    pub fn has_coord_pair(&self, plane: Plane) -> bool {
        let (first, second) = plane.axes();
        self.is_set(first) && self.is_set(second)
    }

    pub fn is_fully_set(&self) -> bool {
        self.set == Axes::ALL
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for axis in self.set.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}{}", axis.letter(), self.get(axis).normalize())?;
            first = false;
        }
        Ok(())
    }
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
