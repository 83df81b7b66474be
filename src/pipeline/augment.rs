//! Modal augmentation
//!
//! Walks the stream carrying the machine's modal state and writes the
//! resolved context (motion mode, plane, distance mode, feed, start and end
//! positions) onto every line. The state is an explicit accumulator: each
//! step consumes the previous state and hands back the next one.

use log::debug;
use rust_decimal::Decimal;

use crate::diagnostics::Diagnostic;
use crate::geometry::{Axis, Coord, Plane};
use crate::line::{DistanceMode, Line, Motion};

/// Modal state of the machine between two lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalState {
    pub motion: Option<Motion>,
    /// Absolute position; axes never specified stay unset
    pub position: Coord,
    pub feed: Option<Decimal>,
    pub plane: Plane,
    pub distance: DistanceMode,
    /// A spline, probe or canned cycle mode is active
    pub other_motion: bool,
}

impl ModalState {
    /// Apply `line` to this state, returning the following state and the
    /// line annotated with its resolved context.
    pub fn step(self, mut line: Line) -> (ModalState, Line) {
        let mut next = self.clone();

        for token in &line.tokens {
            match token.letter {
                'G' => {
                    if let Some(motion) = token.motion() {
                        next.motion = Some(motion);
                        next.other_motion = false;
                    } else if token.is_other_motion() {
                        next.motion = None;
                        next.other_motion = true;
                    } else if token.is('G', 80) {
                        next.motion = None;
                        next.other_motion = false;
                    } else if let Some(plane) = Plane::from_code(token.value) {
                        next.plane = plane;
                    } else if token.is('G', 90) {
                        next.distance = DistanceMode::Absolute;
                    } else if token.is('G', 91) {
                        next.distance = DistanceMode::Incremental;
                    }
                }
                'F' => next.feed = Some(token.value),
                _ => {}
            }
        }

        let written = line
            .tokens
            .iter()
            .filter_map(|t| t.axis().map(|axis| (axis, t.value)))
            .fold(Coord::unset(), |acc, (axis, value)| acc.with(axis, value));

        line.start = self.position;
        line.motion = next.motion;
        line.plane = next.plane;
        line.distance = next.distance;
        line.feed = next.feed;

        if line.consumes_axes() || (next.other_motion && !written.set().is_empty()) {
            debug!("line {}: position unknown after {}", line.number, line);
            line.target = written;
            next.position = Coord::unset();
        } else if !written.set().is_empty() {
            let target = match next.distance {
                DistanceMode::Absolute => written,
                DistanceMode::Incremental => offset_known(&self.position, &written),
            };
            if next.motion.is_none() && !line.is_verbatim() {
                // nothing selected yet, or cancelled by G80
                line.flag(Diagnostic::warning(
                    line.number,
                    "axis words without an active motion mode",
                ));
            }
            line.target = target;
            // a relative move on an unknown axis leaves it unknown
            next.position = self.position.merge(&target, true);
        } else {
            line.target = Coord::unset();
        }

        line.position = next.position;
        (next, line)
    }
}

/// Absolute values for incremental words, for the axes whose base is known
fn offset_known(base: &Coord, delta: &Coord) -> Coord {
    Axis::ALL
        .into_iter()
        .filter(|axis| delta.is_set(*axis) && base.is_set(*axis))
        .fold(Coord::unset(), |acc, axis| {
            acc.with(axis, base.get(axis) + delta.get(axis))
        })
}

/// The augmenter stage
pub struct Augment<I> {
    inner: I,
    state: ModalState,
}

impl<I> Augment<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            state: ModalState::default(),
        }
    }
}

impl<I: Iterator<Item = Line>> Iterator for Augment<I> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        let line = self.inner.next()?;
        let (state, line) = std::mem::take(&mut self.state).step(line);
        self.state = state;
        Some(line)
    }
}
