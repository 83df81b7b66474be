//! Back to text

use crate::line::Line;

/// Canonical text for every line, in order
pub struct Join<I> {
    inner: I,
}

impl<I> Join<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I: Iterator<Item = Line>> Iterator for Join<I> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next().map(|line| line.to_string())
    }
}
