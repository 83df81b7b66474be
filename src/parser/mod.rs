//! GCode Parser
//!
//! Turns raw text lines into [`Line`]s of [`Token`]s. Comments and blank
//! space are stripped and numbers normalised; a line holding anything the
//! lexer could not place is kept verbatim and flagged rather than rewritten.

pub mod lexer;

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::diagnostics::Diagnostic;
use crate::line::{Line, Token};
pub use lexer::{Lexeme, lex_line};

/// Knobs for the tokenizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizeOptions {
    pub keep_comments: bool,
    pub strip_line_numbers: bool,
}

impl Default for TokenizeOptions {
    fn default() -> Self {
        Self {
            keep_comments: false,
            strip_line_numbers: true,
        }
    }
}

/// Parse one input line. Returns `None` when nothing is left to emit.
pub fn parse_line(number: usize, text: &str, options: &TokenizeOptions) -> Option<Line> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "%" {
        return Some(Line::verbatim(number, trimmed, Vec::new()));
    }

    let mut tokens = Vec::new();
    let mut comments = Vec::new();
    let mut malformed = Vec::new();

    for lexeme in lex_line(trimmed) {
        match lexeme {
            Lexeme::Word { letter, number: text } => match parse_number(&text) {
                Some(value) => {
                    if letter == 'N' && options.strip_line_numbers {
                        continue;
                    }
                    tokens.push(Token::new(letter, value));
                }
                None => malformed.push(format!("{letter}{text}")),
            },
            Lexeme::Comment(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    comments.push(text.to_string());
                }
            }
            Lexeme::Malformed(text) => malformed.push(text),
        }
    }

    if !malformed.is_empty() {
        let mut line = Line::verbatim(number, trimmed, tokens);
        line.flag(Diagnostic::warning(
            number,
            format!(
                "unrecognised text {} kept unchanged",
                malformed
                    .iter()
                    .map(|m| format!("'{m}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        ));
        return Some(line);
    }

    let comment = if options.keep_comments && !comments.is_empty() {
        Some(comments.join(" "))
    } else {
        None
    };

    if tokens.is_empty() && comment.is_none() {
        return None;
    }

    let mut line = Line::new(number, tokens);
    line.comment = comment;
    Some(line)
}

/// Parse the number part of a word: optional sign, digits with at most one
/// point, either side of the point may be empty but not both.
fn parse_number(text: &str) -> Option<Decimal> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let valid = !digits.is_empty()
        && digits != "."
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if !valid {
        return None;
    }

    let mut normalised = String::with_capacity(digits.len() + 2);
    if negative {
        normalised.push('-');
    }
    if digits.starts_with('.') {
        normalised.push('0');
    }
    normalised.push_str(digits.strip_suffix('.').unwrap_or(digits));

    Decimal::from_str(&normalised).ok()
}

/// The tokenizer stage: raw text lines in, [`Line`]s out, one per non-empty
/// input line, numbered from 1 in input order.
pub struct Tokenize<I> {
    lines: I,
    options: TokenizeOptions,
    number: usize,
}

impl<I, S> Iterator for Tokenize<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        loop {
            let text = self.lines.next()?;
            self.number += 1;
            if let Some(line) = parse_line(self.number, text.as_ref(), &self.options) {
                return Some(line);
            }
        }
    }
}

pub fn tokenize<I, S>(lines: I, options: TokenizeOptions) -> Tokenize<I::IntoIter>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Tokenize {
        lines: lines.into_iter(),
        options,
        number: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Line {
        parse_line(1, text, &TokenizeOptions::default()).expect("line")
    }

    #[test]
    fn test_parse_simple_command() {
        let line = parse("G1 X10 Y20");
        assert_eq!(line.tokens.len(), 3);
        assert_eq!(line.tokens[0], Token::code('G', 1));
        assert_eq!(line.tokens[1].letter, 'X');
        assert_eq!(line.tokens[1].value, Decimal::from(10));
        assert!(!line.is_verbatim());
    }

    #[test]
    fn test_numbers_are_normalised() {
        assert_eq!(parse("g01 x.50 y+1. z-.25").to_string(), "G1 X0.5 Y1 Z-0.25");
        assert_eq!(parse("G1 X1.2300").to_string(), "G1 X1.23");
    }

    #[test]
    fn test_comments_stripped_by_default() {
        assert_eq!(parse("G1 X10 ; move to X10").to_string(), "G1 X10");
        assert!(parse_line(1, "; only a comment", &TokenizeOptions::default()).is_none());
        assert!(parse_line(1, "(header)", &TokenizeOptions::default()).is_none());
    }

    #[test]
    fn test_comments_kept_on_request() {
        let options = TokenizeOptions {
            keep_comments: true,
            ..TokenizeOptions::default()
        };
        let line = parse_line(1, "(header)", &options).unwrap();
        assert!(line.is_comment());
        assert_eq!(line.to_string(), "(header)");
    }

    #[test]
    fn test_line_numbers_stripped() {
        assert_eq!(parse("N120 G0 Z5").to_string(), "G0 Z5");
        let options = TokenizeOptions {
            strip_line_numbers: false,
            ..TokenizeOptions::default()
        };
        assert_eq!(
            parse_line(1, "N120 G0 Z5", &options).unwrap().to_string(),
            "N120 G0 Z5"
        );
    }

    #[test]
    fn test_malformed_line_kept_verbatim_and_flagged() {
        let line = parse("G1 X1.2.3 Y4   ");
        assert!(line.is_verbatim());
        assert!(line.is_flagged());
        assert_eq!(line.to_string(), "G1 X1.2.3 Y4");
        assert_eq!(line.tokens, vec![Token::code('G', 1), Token::code('Y', 4)]);
        assert!(line.diagnostics[0].message.contains("'X1.2.3'"));
    }

    #[test]
    fn test_percent_marker_passes_unflagged() {
        let line = parse("%");
        assert!(line.is_verbatim());
        assert!(!line.is_flagged());
    }

    #[test]
    fn test_parse_number_rejects_garbage() {
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number("1-2"), None);
        assert_eq!(parse_number("+-1"), None);
        assert_eq!(parse_number("-.5"), Some("-0.5".parse().unwrap()));
    }

    #[test]
    fn test_tokenize_numbers_input_lines() {
        let lines: Vec<Line> = tokenize(["G0 X0", "", "  ", "G1 X1"], TokenizeOptions::default())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[1].number, 4);
    }

    #[test]
    fn test_retokenizing_joined_output_is_stable() {
        let first = parse("g0 x1.0 (c) y.5 f100.");
        let second = parse(&first.to_string());
        assert_eq!(first.tokens, second.tokens);
        assert_eq!(first.to_string(), second.to_string());
    }
}
