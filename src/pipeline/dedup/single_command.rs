//! One command per line

use std::collections::VecDeque;

use log::debug;

use crate::line::{Line, Token};

/// `M` codes that stop the program; a controller runs them after the move
const STOP_CODES: [i64; 5] = [0, 1, 2, 30, 60];

/// Splits lines carrying several `G`/`M` commands into one line per command,
/// in the order they were written.
///
/// A controller runs the words of one line in a fixed order, with the move
/// near the end. Splitting is only safe when the written order agrees, so a
/// line where anything but a program stop follows the move is left intact,
/// as is a line whose move shares its axis words with `G28`, `G92` and the
/// like.
pub struct SingleCommandPerLine<I> {
    inner: I,
    queue: VecDeque<Line>,
}

impl<I> SingleCommandPerLine<I> {
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            queue: VecDeque::new(),
        }
    }
}

impl<I: Iterator<Item = Line>> Iterator for SingleCommandPerLine<I> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        if let Some(line) = self.queue.pop_front() {
            return Some(line);
        }

        let line = self.inner.next()?;
        if line.is_verbatim() {
            return Some(line);
        }

        match split(&line) {
            Some(parts) => {
                debug!("line {}: split into {} lines", line.number, parts.len());
                self.queue.extend(parts);
                self.queue.pop_front()
            }
            None => Some(line),
        }
    }
}

struct Segment {
    command: Option<Token>,
    words: Vec<Token>,
}

impl Segment {
    fn is_motion(&self) -> bool {
        self.command
            .is_some_and(|c| c.motion().is_some() || c.is_other_motion())
    }

    fn is_stop(&self) -> bool {
        self.command
            .is_some_and(|c| STOP_CODES.iter().any(|code| c.is('M', *code)))
    }
}

fn split(line: &Line) -> Option<Vec<Line>> {
    if line.tokens.iter().filter(|t| t.is_command()).count() < 2 {
        return None;
    }
    if line.consumes_axes() && line.motion_word().is_some() {
        return None;
    }

    let mut segments: Vec<Segment> = Vec::new();
    for token in &line.tokens {
        if token.is_command() {
            segments.push(Segment {
                command: Some(*token),
                words: vec![*token],
            });
        } else if let Some(last) = segments.last_mut() {
            last.words.push(*token);
        } else {
            segments.push(Segment {
                command: None,
                words: vec![*token],
            });
        }
    }

    let motions: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_motion())
        .map(|(i, _)| i)
        .collect();
    if motions.len() > 1 {
        return None;
    }
    if let Some(&at) = motions.first()
        && !segments[at + 1..].iter().all(Segment::is_stop)
    {
        return None;
    }

    // Axis words belong to the move, or to a bare move after the commands
    // when the line has no motion word.
    let consumer = line.consumes_axes();
    let mut stray = Vec::new();
    for segment in segments.iter_mut() {
        if segment.is_motion() || consumer {
            continue;
        }
        let (axes, rest): (Vec<Token>, Vec<Token>) = segment
            .words
            .drain(..)
            .partition(|t| matches!(t.letter, 'X' | 'Y' | 'Z' | 'I' | 'J' | 'K' | 'R'));
        segment.words = rest;
        stray.extend(axes);
    }
    if !stray.is_empty() {
        match motions.first() {
            Some(&at) => segments[at].words.extend(stray),
            None => {
                let at = segments
                    .iter()
                    .position(Segment::is_stop)
                    .unwrap_or(segments.len());
                segments.insert(
                    at,
                    Segment {
                        command: None,
                        words: stray,
                    },
                );
            }
        }
    }

    let mut parts: Vec<Line> = segments
        .into_iter()
        .filter(|s| !s.words.is_empty())
        .map(|s| Line::new(line.number, s.words))
        .collect();
    if let Some(first) = parts.first_mut() {
        first.comment = line.comment.clone();
        first.diagnostics = line.diagnostics.clone();
    }
    Some(parts)
}
