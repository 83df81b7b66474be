//! Envelope clipping
//!
//! Keeps the toolpath inside an axis-aligned box. Moves ending outside are
//! dropped, or cut at the boundary when truncation is on. The augmenter has
//! already resolved every line against the unclipped path, so the first
//! move written after a gap restates whatever it needs to start from where
//! the tool really is.

use std::collections::VecDeque;
use std::f64::consts::FRAC_PI_2;

use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::diagnostics::Diagnostic;
use crate::geometry::{Axis, Coord, coord::to_f64, round_to, sweep};
use crate::line::{DistanceMode, Line, Motion, Token};
use crate::pipeline::arc_center::{ArcCenterOptions, radius_offset};
use crate::pipeline::modal::ModalWriter;

/// Allowed values on one axis; a missing bound is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Range {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl Range {
    pub fn contains(&self, value: Decimal) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    fn contains_f64(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= to_f64(min))
            && self.max.is_none_or(|max| value <= to_f64(max))
    }
}

/// Axis-aligned working envelope. Axes without a range are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub x: Option<Range>,
    pub y: Option<Range>,
    pub z: Option<Range>,
}

impl Envelope {
    pub fn range(&self, axis: Axis) -> Option<Range> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
        .filter(|r| r.min.is_some() || r.max.is_some())
    }

    pub fn is_unbounded(&self) -> bool {
        Axis::ALL.into_iter().all(|axis| self.range(axis).is_none())
    }

    /// Unknown axes count as inside
    pub fn contains(&self, point: &Coord) -> bool {
        Axis::ALL.into_iter().all(|axis| {
            !point.is_set(axis) || self.range(axis).is_none_or(|r| r.contains(point.get(axis)))
        })
    }

    /// Every bounded axis is known at `point`
    fn pins(&self, point: &Coord) -> bool {
        Axis::ALL
            .into_iter()
            .all(|axis| self.range(axis).is_none() || point.is_set(axis))
    }

    /// Liang–Barsky: the part of `a`→`b` inside the envelope as parameters
    /// `(t0, t1)` along the segment, `None` when it misses entirely.
    pub fn clip_segment(&self, a: &Coord, b: &Coord) -> Option<(f64, f64)> {
        let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
        for axis in Axis::ALL {
            let Some(range) = self.range(axis) else {
                continue;
            };
            let p0 = to_f64(a.get(axis));
            let delta = to_f64(b.get(axis)) - p0;
            let edges = [
                range.min.map(|min| (-delta, p0 - to_f64(min))),
                range.max.map(|max| (delta, to_f64(max) - p0)),
            ];
            for (p, q) in edges.into_iter().flatten() {
                if p == 0.0 {
                    if q < 0.0 {
                        return None;
                    }
                    continue;
                }
                let r = q / p;
                if p < 0.0 {
                    if r > t1 {
                        return None;
                    }
                    t0 = t0.max(r);
                } else {
                    if r < t0 {
                        return None;
                    }
                    t1 = t1.min(r);
                }
            }
        }
        Some((t0, t1))
    }

    /// The arc from `line.start` to `line.position` around the centre at
    /// `offset` from its start stays inside. Ends are checked by the caller;
    /// this looks at the extremes the arc passes through in its plane.
    fn holds_arc(&self, line: &Line, offset: (f64, f64)) -> bool {
        let plane = line.plane;
        let (first, second) = plane.axes();
        let start = line.start.to_point(plane);
        let end = line.position.to_point(plane);
        let center = (start.0 + offset.0, start.1 + offset.1);
        let radius = (start.0 - center.0).hypot(start.1 - center.1);
        let clockwise = line.motion.is_some_and(|m| m.is_clockwise());
        let total = sweep(center, start, end, clockwise);

        (0..4).all(|quadrant| {
            let angle = FRAC_PI_2 * quadrant as f64;
            let extreme = (center.0 + radius * angle.cos(), center.1 + radius * angle.sin());
            if sweep(center, start, extreme, clockwise) > total {
                return true;
            }
            self.range(first).is_none_or(|r| r.contains_f64(extreme.0))
                && self.range(second).is_none_or(|r| r.contains_f64(extreme.1))
        })
    }
}

/// Point at `t` along `a`→`b`
fn lerp(a: &Coord, b: &Coord, t: f64, precision: u32) -> Option<Coord> {
    if t >= 1.0 {
        return Some(*b);
    }
    b.set().iter().try_fold(Coord::unset(), |acc, axis| {
        let from = to_f64(a.get(axis));
        let to = to_f64(b.get(axis));
        Some(acc.with(axis, round_to(from + (to - from) * t, precision)?))
    })
}

/// Words that belong to the move itself and go away with it
fn is_move_word(token: &Token) -> bool {
    token.axis().is_some()
        || token.motion().is_some()
        || matches!(token.letter, 'F' | 'I' | 'J' | 'K' | 'R')
}

/// The clipping stage
pub struct Clip<I> {
    inner: I,
    envelope: Envelope,
    truncate: bool,
    arcs: ArcCenterOptions,
    /// Where the written program leaves the tool
    last: Coord,
    ready: VecDeque<Line>,
    writer: ModalWriter,
}

impl<I> Clip<I> {
    pub fn new(inner: I, envelope: Envelope, truncate: bool, arcs: ArcCenterOptions) -> Self {
        Self {
            inner,
            envelope,
            truncate,
            arcs,
            last: Coord::unset(),
            ready: VecDeque::new(),
            writer: ModalWriter::default(),
        }
    }

    /// Drop a move that ends outside. Any other command written on the same
    /// line stays behind on a line of its own.
    fn discard(&mut self, mut line: Line) {
        debug!("line {}: {} is outside the envelope, dropped", line.number, line);
        line.tokens.retain(|t| !is_move_word(t));
        if line.tokens.is_empty() {
            return;
        }
        debug!("line {}: kept {} from the dropped move", line.number, line);
        line.target = Coord::unset();
        self.emit(line);
    }

    /// Centre of an arc as an offset from its start, from `I`/`J`/`K` or
    /// worked out from `R`
    fn arc_offset(&self, line: &Line) -> Option<(f64, f64)> {
        let (first, second) = line.plane.offset_letters();
        if line.find(first).is_some() || line.find(second).is_some() {
            return Some((
                line.value(first).map(to_f64).unwrap_or(0.0),
                line.value(second).map(to_f64).unwrap_or(0.0),
            ));
        }
        let radius = line.value('R')?;
        if !line.start.has_coord_pair(line.plane) || !line.position.has_coord_pair(line.plane) {
            return None;
        }
        radius_offset(line, radius, &self.arcs).ok()
    }

    /// Queue `line` for output. An absolute move that no longer starts where
    /// the written program left the tool restates its axes.
    fn emit(&mut self, mut line: Line) {
        if line.is_motion() && line.distance == DistanceMode::Absolute && line.start != self.last
        {
            line.restate_from(&self.last);
        }
        if line.has_axis_words() || line.consumes_axes() {
            self.last = line.position;
        }
        self.ready.push_back(line);
    }

    /// Straight move from the written position to `to`, standing in for `line`
    fn straight_to(&self, line: &Line, to: Coord, motion: Motion) -> Line {
        let mut piece = line.clone();
        piece.tokens.retain(|t| t.axis().is_none() && !matches!(t.letter, 'I' | 'J' | 'K' | 'R'));
        if let Some(word) = piece.tokens.iter_mut().find(|t| t.motion().is_some()) {
            *word = motion.token();
        }
        piece.motion = Some(motion);
        piece.position = to;
        piece.restate_from(&self.last);
        piece
    }

    fn clip_straight(&mut self, line: Line) {
        let from = self.last;
        let end = line.position;

        if !self.truncate || !self.envelope.pins(&from) || !self.envelope.pins(&end) {
            if self.envelope.contains(&end) {
                self.emit(line);
            } else {
                self.discard(line);
            }
            return;
        }

        match self.envelope.clip_segment(&from, &end) {
            Some((_, t1)) if t1 >= 1.0 => self.emit(line),
            Some((t0, t1)) if t1 > 0.0 && t1 > t0 => {
                let Some(exit) = lerp(&from, &end, t1, self.arcs.precision).filter(|p| *p != from)
                else {
                    self.discard(line);
                    return;
                };
                debug!("line {}: cut at the envelope boundary at {}", line.number, exit);
                let motion = line.motion.unwrap_or(Motion::Linear);
                let piece = self.straight_to(&line, exit, motion);
                self.emit(piece);
            }
            _ => self.discard(line),
        }
    }

    fn clip_arc(&mut self, mut line: Line) {
        if !self.envelope.contains(&line.position) {
            self.discard(line);
            return;
        }
        let reason = match self.arc_offset(&line) {
            None => "arc centre unknown, replaced by a straight move",
            Some(offset)
                if line.start == self.last
                    && self.envelope.contains(&line.start)
                    && self.envelope.holds_arc(&line, offset) =>
            {
                self.emit(line);
                return;
            }
            Some(_) => "arc leaves the envelope, replaced by a straight move",
        };

        line.flag(Diagnostic::warning(line.number, reason));
        let straight = self.straight_to(&line, line.position, Motion::Linear);
        self.emit(straight);
    }
}

impl<I: Iterator<Item = Line>> Iterator for Clip<I> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                let (prefix, line) = self.writer.settle(line);
                return match prefix {
                    Some(prefix) => {
                        self.ready.push_front(line);
                        Some(prefix)
                    }
                    None => Some(line),
                };
            }

            let mut line = self.inner.next()?;
            if self.envelope.is_unbounded() {
                return Some(line);
            }

            if !line.is_motion() {
                self.emit(line);
            } else if line.distance == DistanceMode::Incremental {
                if line.start != self.last {
                    line.flag(Diagnostic::warning(
                        line.number,
                        "relative move after clipped moves starts from a different position",
                    ));
                }
                self.emit(line);
            } else if line.motion.is_some_and(|m| m.is_arc()) {
                self.clip_arc(line);
            } else {
                self.clip_straight(line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{TokenizeOptions, tokenize};
    use crate::pipeline::augment::Augment;

    fn envelope(max_x: i64) -> Envelope {
        Envelope {
            x: Some(Range {
                min: Some(Decimal::ZERO),
                max: Some(Decimal::from(max_x)),
            }),
            ..Envelope::default()
        }
    }

    fn clip(text: &str, envelope: Envelope, truncate: bool) -> Vec<Line> {
        Clip::new(
            Augment::new(tokenize(text.lines(), TokenizeOptions::default())),
            envelope,
            truncate,
            ArcCenterOptions::default(),
        )
        .collect()
    }

    fn rendered(text: &str, envelope: Envelope, truncate: bool) -> Vec<String> {
        clip(text, envelope, truncate)
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn unbounded_envelope_passes_everything() {
        let text = "G0 X-100 Y0\nG1 X100 F50";
        assert_eq!(
            rendered(text, Envelope::default(), false),
            vec!["G0 X-100 Y0", "G1 X100 F50"]
        );
    }

    #[test]
    fn moves_ending_outside_are_dropped() {
        let text = "G0 X0 Y0\nG1 X5 Y1 F100\nX20 Y2\nX6 Y3";
        assert_eq!(
            rendered(text, envelope(10), false),
            vec!["G0 X0 Y0", "G1 X5 Y1 F100", "X6 Y3"]
        );
    }

    #[test]
    fn commands_on_a_dropped_move_are_kept() {
        let text = "G0 X0 Y0\nG0 X20 Y0 M3 S12000\nG1 X5 F100";
        assert_eq!(
            rendered(text, envelope(10), false),
            vec!["G0 X0 Y0", "M3 S12000", "G1 X5 F100"]
        );
    }

    #[test]
    fn modal_codes_on_a_dropped_move_are_kept() {
        let text = "G0 X0 Y0\nG90 G17 G1 X20 F100\nX5";
        assert_eq!(
            rendered(text, envelope(10), false),
            vec!["G0 X0 Y0", "G90 G17", "G1 X5 F100"]
        );
    }

    #[test]
    fn first_move_after_a_gap_restates_what_was_lost() {
        // Y and the feed were only ever written on the dropped line
        let text = "G0 X0 Y0\nG1 X20 Y5 F300\nX6";
        assert_eq!(
            rendered(text, envelope(10), false),
            vec!["G0 X0 Y0", "G1 X6 Y5 F300"]
        );
    }

    #[test]
    fn truncation_stops_at_the_boundary() {
        let text = "G0 X0 Y0\nG1 X20 Y10 F100\nX5 Y10";
        assert_eq!(
            rendered(text, envelope(10), true),
            vec!["G0 X0 Y0", "G1 X10 Y5 F100", "X5 Y10"]
        );
    }

    #[test]
    fn truncation_keeps_moves_fully_inside() {
        let text = "G0 X1 Y0\nG1 X9 Y0";
        assert_eq!(
            rendered(text, envelope(10), true),
            vec!["G0 X1 Y0", "G1 X9 Y0"]
        );
    }

    #[test]
    fn position_tracking_follows_the_unclipped_path() {
        // Y3 is only known from the dropped move
        let lines = clip("G0 X0 Y0\nG1 X20 Y3\nX5", envelope(10), false);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].position.y(), Decimal::from(3));
        assert_eq!(lines[1].to_string(), "G1 X5 Y3");
    }

    #[test]
    fn arc_crossing_the_boundary_becomes_a_straight_move() {
        // clockwise half circle through X-5, left of the envelope
        let text = "G0 X0 Y0\nG2 X0 Y10 I0 J5";
        let lines = clip(text, envelope(10), false);
        assert_eq!(lines[1].to_string(), "G1 Y10");
        assert!(lines[1].is_flagged());
    }

    #[test]
    fn radius_arc_crossing_the_boundary_becomes_a_straight_move() {
        // same half circle written with R
        let text = "G0 X0 Y0\nG2 X0 Y10 R5";
        let lines = clip(text, envelope(10), false);
        assert_eq!(lines[1].to_string(), "G1 Y10");
        assert_eq!(lines[1].diagnostics.len(), 1);
    }

    #[test]
    fn radius_arc_inside_is_kept() {
        let text = "G0 X0 Y0\nG3 X0 Y10 R5";
        assert_eq!(
            rendered(text, envelope(10), false),
            vec!["G0 X0 Y0", "G3 X0 Y10 R5"]
        );
    }

    #[test]
    fn impossible_radius_arc_is_straightened() {
        let text = "G0 X0 Y0\nG2 X10 Y0 R2";
        let lines = clip(text, envelope(10), false);
        assert_eq!(lines[1].to_string(), "G1 X10");
        assert!(lines[1].diagnostics[0].message.contains("centre unknown"));
    }

    #[test]
    fn arc_inside_is_kept() {
        let text = "G0 X0 Y0\nG3 X0 Y10 I0 J5";
        assert_eq!(
            rendered(text, envelope(10), false),
            vec!["G0 X0 Y0", "G3 X0 Y10 I0 J5"]
        );
    }

    #[test]
    fn non_motion_lines_pass() {
        let text = "G21\nM3 S1000\nG0 X50\nM5";
        assert_eq!(
            rendered(text, envelope(10), false),
            vec!["G21", "M3 S1000", "M5"]
        );
    }
}
