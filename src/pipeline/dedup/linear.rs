//! Collinear linear moves

use log::debug;
use rust_decimal::Decimal;

use crate::geometry::distance_to_segment;
use crate::line::{Line, Motion};

/// Drops the middle point of two consecutive `G1` moves when it lies within
/// `tolerance` of the straight line from the first move's start to the
/// second move's end.
///
/// The window is A→B→C where B is the end of the first move. When B goes,
/// C is rewritten to state everything it needs to stand alone after A. A
/// collapsed C is emitted straight away, so one pass never removes two
/// neighbouring points; run the pass again to go further.
pub struct DedupLinear<I> {
    inner: I,
    tolerance: Decimal,
    precision: u32,
    held: Option<Line>,
}

impl<I> DedupLinear<I> {
    pub fn new(inner: I, tolerance: Decimal, precision: u32) -> Self {
        Self {
            inner,
            tolerance,
            precision,
            held: None,
        }
    }

    fn collapsible(&self, b: &Line, c: &Line) -> bool {
        is_candidate(b)
            && is_candidate(c)
            && b.comment.is_none()
            && b.feed == c.feed
            && b.position == c.start
            && distance_to_segment(&b.position, &b.start, &c.position, self.precision)
                <= self.tolerance
    }
}

fn is_candidate(line: &Line) -> bool {
    line.is_plain_move() && line.motion == Some(Motion::Linear)
}

/// Fold `b` into `c`, which from now on starts where `b` started
fn absorb(b: &Line, c: &mut Line) {
    c.restate_from(&b.start);
    if b.motion_word().is_some() {
        c.ensure_motion_word(Motion::Linear);
    }
    if b.find('F').is_some()
        && let Some(feed) = c.feed
    {
        c.ensure_feed(feed);
    }
}

impl<I: Iterator<Item = Line>> Iterator for DedupLinear<I> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        loop {
            let Some(mut c) = self.inner.next() else {
                return self.held.take();
            };
            let Some(b) = self.held.take() else {
                self.held = Some(c);
                continue;
            };

            if self.collapsible(&b, &c) {
                debug!("line {}: collinear point {} dropped", b.number, b.position);
                absorb(&b, &mut c);
                return Some(c);
            }
            self.held = Some(c);
            return Some(b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{TokenizeOptions, tokenize};
    use crate::pipeline::augment::Augment;

    fn run(text: &str, tolerance: &str) -> Vec<String> {
        DedupLinear::new(
            Augment::new(tokenize(text.lines(), TokenizeOptions::default())),
            tolerance.parse().unwrap(),
            4,
        )
        .map(|l| l.to_string())
        .collect()
    }

    #[test]
    fn collinear_point_is_dropped() {
        assert_eq!(
            run("G1 X0 Y0\nG1 X1 Y0\nG1 X2 Y0", "0.0005"),
            vec!["G1 X0 Y0", "G1 X2 Y0"]
        );
    }

    #[test]
    fn point_exactly_on_the_line_is_dropped_at_zero_tolerance() {
        assert_eq!(
            run("G1 X0 Y0\nG1 X1 Y0\nG1 X2 Y0", "0"),
            vec!["G1 X0 Y0", "G1 X2 Y0"]
        );
    }

    #[test]
    fn point_off_the_line_is_kept() {
        assert_eq!(
            run("G1 X0 Y0\nG1 X1 Y0.01\nG1 X2 Y0", "0.0005"),
            vec!["G1 X0 Y0", "G1 X1 Y0.01", "G1 X2 Y0"]
        );
        assert_eq!(
            run("G1 X0 Y0\nG1 X1 Y0.01\nG1 X2 Y0", "0.02"),
            vec!["G1 X0 Y0", "G1 X2 Y0"]
        );
    }

    #[test]
    fn kept_line_restates_what_it_relied_on() {
        assert_eq!(
            run("G0 X0 Y0\nG1 X1 Y1 F300\nX2", "0.0005"),
            vec!["G0 X0 Y0", "G1 X1 Y1 F300", "X2"]
        );
        assert_eq!(
            run("G0 X0 Y0\nG1 X0 Y1\nG1 X1 Y1 F300\nX2", "0.0005"),
            vec!["G0 X0 Y0", "G1 X0 Y1", "G1 X2 F300"]
        );
        assert_eq!(
            run("G1 X0 Y0 F100\nG1 X1 Y1 F300\nX2 Y2", "0.0005"),
            vec!["G1 X0 Y0 F100", "G1 X2 Y2 F300"]
        );
        assert_eq!(
            run("G0 X0 Y0\nG1 X1 Y1 F300\nX2 Y2", "0.0005"),
            vec!["G0 X0 Y0", "G1 X2 Y2 F300"]
        );
    }

    #[test]
    fn feed_change_blocks_the_collapse() {
        assert_eq!(
            run("G1 X0 Y0 F100\nX1\nX2 F200", "0.0005"),
            vec!["G1 X0 Y0 F100", "X1", "X2 F200"]
        );
    }

    #[test]
    fn rapids_are_left_alone() {
        assert_eq!(
            run("G0 X0 Y0\nG0 X1 Y0\nG0 X2 Y0", "0.0005"),
            vec!["G0 X0 Y0", "G0 X1 Y0", "G0 X2 Y0"]
        );
    }

    #[test]
    fn one_pass_drops_every_other_point() {
        let text = "G1 X0 Y0\nX1\nX2\nX3\nX4";
        assert_eq!(run(text, "0.0005"), vec!["G1 X0 Y0", "X2", "X4"]);
    }

    #[test]
    fn first_and_last_points_survive() {
        let out = run("G1 X0 Y0\nX1\nX2", "0.0005");
        assert_eq!(out.first().map(String::as_str), Some("G1 X0 Y0"));
        assert_eq!(out.last().map(String::as_str), Some("X2"));
    }
}
