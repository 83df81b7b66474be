//! Whole lines repeated back to back

use log::debug;

use crate::line::{DistanceMode, Line};

/// Codes that act every time they are read, so writing them twice is not
/// the same as writing them once: dwell, pauses, subprogram calls
const REPEATING_CODES: [(char, i64); 5] = [('G', 4), ('M', 0), ('M', 1), ('M', 60), ('M', 98)];

/// Drops a line whose written text is identical to the line emitted just
/// before it.
pub struct DedupLine<I> {
    inner: I,
    last: Option<String>,
}

impl<I> DedupLine<I> {
    pub fn new(inner: I) -> Self {
        Self { inner, last: None }
    }
}

/// Writing this line a second time in a row changes nothing. A flagged line
/// is never dropped, so its diagnostics reach the report.
fn is_idempotent(line: &Line) -> bool {
    if line.is_verbatim() || line.is_flagged() {
        return false;
    }
    if REPEATING_CODES
        .iter()
        .any(|(letter, code)| line.has_word(*letter, *code))
    {
        return false;
    }
    if line.has_axis_words() {
        // a relative move goes further, an arc goes round again, and a
        // cycle drills again
        return line.is_motion()
            && line.distance == DistanceMode::Absolute
            && line.motion.is_some_and(|m| !m.is_arc());
    }
    true
}

impl<I: Iterator<Item = Line>> Iterator for DedupLine<I> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        loop {
            let line = self.inner.next()?;
            let text = line.to_string();
            if is_idempotent(&line) && self.last.as_deref() == Some(text.as_str()) {
                debug!("line {}: repeats the previous line, dropped", line.number);
                continue;
            }
            self.last = Some(text);
            return Some(line);
        }
    }
}
