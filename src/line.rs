//! Lines and tokens
//!
//! A `Line` keeps two views of one block: the sparse token list that will be
//! written back out, and the modal context resolved by the augmenter. Passes
//! after augmentation read the resolved fields; they only touch the tokens to
//! keep the text equivalent to what they decided.

use std::fmt;

use rust_decimal::Decimal;

use crate::diagnostics::Diagnostic;
use crate::geometry::{Axes, Axis, Coord, Plane};

/// One letter/value word such as `G1`, `X12.5` or `F300`.
///
/// Values compare numerically, so `G01` equals `G1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub letter: char,
    pub value: Decimal,
}

impl Token {
    pub fn new(letter: char, value: Decimal) -> Self {
        Self {
            letter: letter.to_ascii_uppercase(),
            value,
        }
    }

    /// `letter` with an integer code, e.g. `Token::code('G', 1)`
    pub fn code(letter: char, code: i64) -> Self {
        Self::new(letter, Decimal::from(code))
    }

    pub fn is(&self, letter: char, code: i64) -> bool {
        self.letter == letter && self.value == Decimal::from(code)
    }

    /// `G` and `M` words start a command; everything else is a parameter
    pub fn is_command(&self) -> bool {
        matches!(self.letter, 'G' | 'M')
    }

    pub fn axis(&self) -> Option<Axis> {
        Axis::from_letter(self.letter)
    }

    /// Group 1 codes outside [`Motion`]: splines, probing and canned cycles
    pub fn is_other_motion(&self) -> bool {
        self.letter == 'G' && OTHER_MOTION.iter().any(|c| self.value.normalize().to_string() == *c)
    }

    pub fn motion(&self) -> Option<Motion> {
        if self.letter == 'G' {
            Motion::from_code(self.value)
        } else {
            None
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.value.normalize())
    }
}

/// Motion modes of modal group 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Rapid,
    Linear,
    ArcCw,
    ArcCcw,
}

impl Motion {
    pub fn from_code(code: Decimal) -> Option<Motion> {
        [Motion::Rapid, Motion::Linear, Motion::ArcCw, Motion::ArcCcw]
            .into_iter()
            .find(|m| Decimal::from(m.code()) == code)
    }

    pub fn code(self) -> i64 {
        match self {
            Motion::Rapid => 0,
            Motion::Linear => 1,
            Motion::ArcCw => 2,
            Motion::ArcCcw => 3,
        }
    }

    pub fn token(self) -> Token {
        Token::code('G', self.code())
    }

    pub fn is_arc(self) -> bool {
        matches!(self, Motion::ArcCw | Motion::ArcCcw)
    }

    pub fn is_clockwise(self) -> bool {
        self == Motion::ArcCw
    }
}

/// `G90` / `G91`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceMode {
    #[default]
    Absolute,
    Incremental,
}

const OTHER_MOTION: [&str; 17] = [
    "5", "5.1", "38.2", "38.3", "38.4", "38.5", "73", "76", "81", "82", "83", "84", "85", "86",
    "87", "88", "89",
];

/// Non-modal `G` codes whose axis words are not a move in the current mode
const AXIS_CONSUMERS: [&str; 9] = ["10", "28", "28.1", "30", "30.1", "53", "92", "92.1", "92.2"];

/// One logical block of a program
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    /// 1-based line number in the input file
    pub number: usize,
    pub tokens: Vec<Token>,
    pub comment: Option<String>,
    /// Original text, written out unchanged when set
    pub raw: Option<String>,

    // Modal context resolved by the augmenter
    pub motion: Option<Motion>,
    pub plane: Plane,
    pub distance: DistanceMode,
    pub feed: Option<Decimal>,
    /// Position before this line
    pub start: Coord,
    /// Axes written on this line, in absolute terms
    pub target: Coord,
    /// Position after this line
    pub position: Coord,

    pub diagnostics: Vec<Diagnostic>,
}

impl Line {
    pub fn new(number: usize, tokens: Vec<Token>) -> Self {
        Self {
            number,
            tokens,
            ..Self::default()
        }
    }

    /// A line written back exactly as read
    pub fn verbatim(number: usize, raw: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            number,
            tokens,
            raw: Some(raw.into()),
            ..Self::default()
        }
    }

    pub fn flag(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_verbatim(&self) -> bool {
        self.raw.is_some()
    }

    pub fn is_flagged(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Nothing to write at all
    pub fn is_noop(&self) -> bool {
        self.tokens.is_empty() && self.comment.is_none() && self.raw.is_none()
    }

    pub fn is_comment(&self) -> bool {
        self.tokens.is_empty() && self.raw.is_none() && self.comment.is_some()
    }

    pub fn find(&self, letter: char) -> Option<&Token> {
        self.tokens.iter().find(|t| t.letter == letter)
    }

    pub fn value(&self, letter: char) -> Option<Decimal> {
        self.find(letter).map(|t| t.value)
    }

    pub fn has_word(&self, letter: char, code: i64) -> bool {
        self.tokens.iter().any(|t| t.is(letter, code))
    }

    /// Motion word written on this line, if any
    pub fn motion_word(&self) -> Option<Motion> {
        self.tokens.iter().find_map(Token::motion)
    }

    pub fn has_axis_words(&self) -> bool {
        self.tokens.iter().any(|t| t.axis().is_some())
    }

    /// Line carries `G10`, `G28`, `G30`, `G53` or `G92`, which use the axis
    /// words for something other than a modal move.
    pub fn consumes_axes(&self) -> bool {
        self.tokens.iter().any(|t| {
            t.letter == 'G' && AXIS_CONSUMERS.iter().any(|c| t.value.normalize().to_string() == *c)
        })
    }

    /// The line moves the tool in its resolved motion mode
    pub fn is_motion(&self) -> bool {
        self.raw.is_none()
            && self.motion.is_some()
            && self.has_axis_words()
            && !self.consumes_axes()
    }

    /// A move that geometric passes may drop or rewrite: absolute, starting
    /// from a position that already knows every axis it moves, unflagged, and
    /// made only of the motion word, axis words and a feed.
    pub fn is_plain_move(&self) -> bool {
        self.is_motion()
            && self.distance == DistanceMode::Absolute
            && self.diagnostics.is_empty()
            && !self.start.set().is_empty()
            && self.start.set() == self.position.set()
            && self
                .tokens
                .iter()
                .all(|t| t.axis().is_some() || t.letter == 'F' || t.motion().is_some())
    }

    /// Replace the axis word for `axis`, or insert it next to its neighbours
    pub fn set_axis(&mut self, axis: Axis, value: Decimal) {
        let token = Token::new(axis.letter(), value);
        if let Some(existing) = self.tokens.iter_mut().find(|t| t.axis() == Some(axis)) {
            *existing = token;
            return;
        }

        let index = if let Some(i) = self
            .tokens
            .iter()
            .rposition(|t| t.axis().is_some_and(|a| a < axis))
        {
            i + 1
        } else if let Some(i) = self.tokens.iter().position(|t| t.axis().is_some()) {
            i
        } else {
            self.tokens.iter().take_while(|t| t.is_command()).count()
        };
        self.tokens.insert(index, token);
    }

    /// Write the motion word explicitly unless the line already has one
    pub fn ensure_motion_word(&mut self, motion: Motion) {
        if self.motion_word().is_none() {
            self.tokens.insert(0, motion.token());
        }
    }

    /// Add `F` at the end of the line unless it already has one
    pub fn ensure_feed(&mut self, feed: Decimal) {
        if self.find('F').is_none() {
            self.tokens.push(Token::new('F', feed));
        }
    }

    /// Restate every axis where this line's end point differs from `from`,
    /// and mark `from` as the new start.
    pub fn restate_from(&mut self, from: &Coord) {
        for axis in Axis::ALL {
            let differs = !from.is_set(axis) || from.get(axis) != self.position.get(axis);
            if self.position.is_set(axis) && differs {
                self.set_axis(axis, self.position.get(axis));
            }
        }
        self.target = self.position.masked(self.explicit_axes());
        self.start = *from;
    }

    /// Axes that have a word on this line
    pub fn explicit_axes(&self) -> Axes {
        self.tokens
            .iter()
            .filter_map(Token::axis)
            .fold(Axes::NONE, Axes::with)
    }
}

/// Canonical text: single spaces, normalised numbers, comment last
impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw) = &self.raw {
            return write!(f, "{raw}");
        }

        let mut first = true;
        for token in &self.tokens {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{token}")?;
            first = false;
        }

        if let Some(comment) = &self.comment {
            if !first {
                write!(f, " ")?;
            }
            if comment.contains('(') || comment.contains(')') {
                write!(f, ";{comment}")?;
            } else {
                write!(f, "({comment})")?;
            }
        }
        Ok(())
    }
}
