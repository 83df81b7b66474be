//! Modal words that restate what is already in effect

use log::{debug, warn};
use rust_decimal::Decimal;

use crate::line::{DistanceMode, Line};

/// Letters whose value is not remembered by the machine from one line to the
/// next, or which select a command rather than set a value
pub const NON_MODAL_LETTERS: [char; 11] = ['G', 'M', 'N', 'O', 'P', 'I', 'J', 'K', 'R', 'L', 'T'];

/// Drops a word for one of the selected letters when the nearest earlier
/// line carrying that letter had the same value. A line left with nothing to
/// say is dropped.
///
/// Axis letters are only dropped from absolute straight moves, and the
/// remembered axis values are forgotten whenever the position stops being
/// what the text says it is.
pub struct DedupSelectTokens<I> {
    inner: I,
    letters: Vec<char>,
    last: Vec<(char, Option<Decimal>)>,
}

impl<I> DedupSelectTokens<I> {
    pub fn new(inner: I, letters: &[char]) -> Self {
        let mut accepted: Vec<char> = Vec::new();
        for letter in letters.iter().map(char::to_ascii_uppercase) {
            if NON_MODAL_LETTERS.contains(&letter) {
                warn!("'{letter}' words are not modal and will not be deduplicated");
            } else if !accepted.contains(&letter) {
                accepted.push(letter);
            }
        }

        Self {
            inner,
            last: accepted.iter().map(|l| (*l, None)).collect(),
            letters: accepted,
        }
    }

    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    fn remembered(&self, letter: char) -> Option<Decimal> {
        self.last
            .iter()
            .find(|(l, _)| *l == letter)
            .and_then(|(_, v)| *v)
    }

    fn remember(&mut self, letter: char, value: Decimal) {
        if let Some(slot) = self.last.iter_mut().find(|(l, _)| *l == letter) {
            slot.1 = Some(value);
        }
    }

    fn forget_axes(&mut self) {
        for (letter, value) in self.last.iter_mut() {
            if matches!(letter, 'X' | 'Y' | 'Z') {
                *value = None;
            }
        }
    }
}

impl<I: Iterator<Item = Line>> Iterator for DedupSelectTokens<I> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        loop {
            let mut line = self.inner.next()?;
            if self.letters.is_empty() {
                return Some(line);
            }
            if line.is_verbatim() {
                for (_, value) in self.last.iter_mut() {
                    *value = None;
                }
                return Some(line);
            }

            let absolute = line.is_motion() && line.distance == DistanceMode::Absolute;
            let straight = absolute && line.motion.is_some_and(|m| !m.is_arc());
            if line.consumes_axes() || (line.has_axis_words() && !absolute) {
                self.forget_axes();
            }

            let before = line.tokens.len();
            let mut kept = Vec::with_capacity(before);
            for token in std::mem::take(&mut line.tokens) {
                if !self.letters.contains(&token.letter) {
                    kept.push(token);
                    continue;
                }
                let is_axis = token.axis().is_some();
                if is_axis && !absolute {
                    kept.push(token);
                    continue;
                }
                let repeated = self.remembered(token.letter) == Some(token.value);
                self.remember(token.letter, token.value);
                if repeated && (!is_axis || straight) {
                    continue;
                }
                kept.push(token);
            }
            line.tokens = kept;

            if line.tokens.len() != before {
                debug!(
                    "line {}: dropped {} word(s) already in effect",
                    line.number,
                    before - line.tokens.len()
                );
            }
            if line.is_noop() {
                debug!("line {}: nothing left, dropped", line.number);
                continue;
            }
            return Some(line);
        }
    }
}
