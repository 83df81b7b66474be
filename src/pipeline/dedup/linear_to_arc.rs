//! Runs of short linear moves replaced by arcs

use std::collections::VecDeque;
use std::f64::consts::{PI, TAU};

use log::debug;
use rust_decimal::Decimal;

use crate::geometry::{Axes, Circle, Coord, circle_through, coord::to_f64, round_to, sagitta, sweep, turn};
use crate::line::{Line, Motion, Token};
use crate::pipeline::modal::ModalWriter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcFitOptions {
    /// Largest distance any original point or chord may stray from the arc
    pub tolerance: Decimal,
    pub min_segments: usize,
    pub max_segments: usize,
    pub max_radius: Decimal,
    pub precision: u32,
}

impl Default for ArcFitOptions {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(5, 4),
            min_segments: 3,
            max_segments: 64,
            max_radius: Decimal::from(1000),
            precision: 4,
        }
    }
}

struct Fit {
    circle: Circle,
    clockwise: bool,
}

/// Fit one arc through `points`, walked in order. Every point must lie on
/// the circle, every chord must hug it, the walk must keep turning the same
/// way and it must not close on itself.
fn fit_arc(points: &[(f64, f64)], options: &ArcFitOptions) -> Option<Fit> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let circle = circle_through(points[0], points[n / 2], points[n - 1])?;
    if circle.radius > to_f64(options.max_radius) {
        return None;
    }

    let tolerance = to_f64(options.tolerance);
    if points.iter().any(|p| circle.deviation(*p) > tolerance) {
        return None;
    }

    let direction = turn(points[0], points[1], points[2]);
    if points
        .windows(3)
        .any(|w| turn(w[0], w[1], w[2]) * direction <= 0.0)
    {
        return None;
    }
    let clockwise = direction < 0.0;

    let mut swept = 0.0;
    for w in points.windows(2) {
        let chord = (w[1].0 - w[0].0).hypot(w[1].1 - w[0].1);
        if sagitta(circle.radius, chord) > tolerance {
            return None;
        }
        let step = sweep(circle.center, w[0], w[1], clockwise);
        if step >= PI {
            return None;
        }
        swept += step;
    }
    if swept >= TAU - 1e-9 {
        return None;
    }

    Some(Fit { circle, clockwise })
}

fn is_candidate(line: &Line) -> bool {
    line.is_plain_move()
        && line.motion == Some(Motion::Linear)
        && line.comment.is_none()
        && line.start.has_coord_pair(line.plane)
}

/// Replaces runs of at least `min_segments` consecutive coplanar `G1` moves
/// by a single `G2`/`G3` when one arc reproduces all of them within
/// tolerance. Runs are grown greedily and cut at `max_segments`.
pub struct DedupLinearToArc<I> {
    inner: I,
    options: ArcFitOptions,
    run: Vec<Line>,
    ready: VecDeque<Line>,
    writer: ModalWriter,
    exhausted: bool,
}

impl<I> DedupLinearToArc<I> {
    pub fn new(inner: I, options: ArcFitOptions) -> Self {
        Self {
            inner,
            options,
            run: Vec::new(),
            ready: VecDeque::new(),
            writer: ModalWriter::default(),
            exhausted: false,
        }
    }

    fn points<'a>(&'a self, extra: Option<&'a Line>) -> Vec<(f64, f64)> {
        let Some(first) = self.run.first().or(extra) else {
            return Vec::new();
        };
        let plane = first.plane;
        std::iter::once(first.start.to_point(plane))
            .chain(
                self.run
                    .iter()
                    .chain(extra)
                    .map(|l| l.position.to_point(plane)),
            )
            .collect()
    }

    fn accepts(&self, line: &Line) -> bool {
        let (Some(first), Some(last)) = (self.run.first(), self.run.last()) else {
            return false;
        };
        let normal = first.plane.normal();
        is_candidate(line)
            && line.plane == first.plane
            && line.feed == first.feed
            && line.start == last.position
            && Coord::ortho(&[first.start, line.position]).has(normal)
            && fit_arc(&self.points(Some(line)), &self.options).is_some()
    }

    fn push(&mut self, line: Line) {
        if self.accepts(&line) {
            self.run.push(line);
            if self.run.len() >= self.options.max_segments {
                self.flush();
            }
            return;
        }

        self.flush();
        if is_candidate(&line) {
            self.run.push(line);
        } else {
            self.ready.push_back(line);
        }
    }

    fn flush(&mut self) {
        if self.run.len() >= self.options.min_segments
            && let Some(fit) = fit_arc(&self.points(None), &self.options)
            && let Some(arc) = self.arc_line(&self.run, &fit)
        {
            debug!(
                "lines {}-{}: {} moves replaced by an arc of radius {:.4}",
                self.run[0].number,
                self.run[self.run.len() - 1].number,
                self.run.len(),
                fit.circle.radius
            );
            self.run.clear();
            self.ready.push_back(arc);
            return;
        }
        self.ready.extend(self.run.drain(..));
    }

    /// `None` when the centre offsets cannot be written as numbers
    fn arc_line(&self, run: &[Line], fit: &Fit) -> Option<Line> {
        let first = &run[0];
        let last = &run[run.len() - 1];
        let plane = first.plane;
        let (a, b) = plane.axes();
        let motion = if fit.clockwise {
            Motion::ArcCw
        } else {
            Motion::ArcCcw
        };

        let mut axes = [a, b];
        axes.sort();
        let mut tokens = vec![motion.token()];
        tokens.extend(
            axes.iter()
                .map(|axis| Token::new(axis.letter(), last.position.get(*axis))),
        );

        let (start_a, start_b) = first.start.to_point(plane);
        let (letter_a, letter_b) = plane.offset_letters();
        let mut offsets = [
            Token::new(
                letter_a,
                round_to(fit.circle.center.0 - start_a, self.options.precision)?,
            ),
            Token::new(
                letter_b,
                round_to(fit.circle.center.1 - start_b, self.options.precision)?,
            ),
        ];
        offsets.sort_by_key(|t| t.letter);
        tokens.extend(offsets);

        if run.iter().any(|l| l.find('F').is_some())
            && let Some(feed) = first.feed
        {
            tokens.push(Token::new('F', feed));
        }

        let mut arc = Line::new(first.number, tokens);
        arc.motion = Some(motion);
        arc.plane = plane;
        arc.distance = first.distance;
        arc.feed = first.feed;
        arc.start = first.start;
        arc.position = last.position;
        arc.target = last.position.masked(Axes::from(a) | Axes::from(b));
        Some(arc)
    }
}

impl<I: Iterator<Item = Line>> Iterator for DedupLinearToArc<I> {
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
            if self.exhausted {
                return None;
            }
            match self.inner.next() {
                Some(line) => self.push(line),
                None => {
                    self.exhausted = true;
                    self.flush();
                }
            }
        }
    }
}
