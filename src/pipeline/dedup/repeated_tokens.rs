//! Repeated words within one line

use log::debug;

use crate::diagnostics::Diagnostic;
use crate::line::{Line, Token};

/// Modal groups whose members override each other on one line
const MODAL_GROUPS: [(&str, char, &[&str]); 8] = [
    (
        "motion",
        'G',
        &[
            "0", "1", "2", "3", "33", "38.2", "38.3", "38.4", "38.5", "73", "76", "80", "81",
            "82", "83", "84", "85", "86", "87", "88", "89",
        ],
    ),
    ("plane", 'G', &["17", "18", "19"]),
    ("units", 'G', &["20", "21"]),
    ("cutter compensation", 'G', &["40", "41", "42"]),
    ("coordinate system", 'G', &["54", "55", "56", "57", "58", "59"]),
    ("distance", 'G', &["90", "91"]),
    ("feed mode", 'G', &["93", "94", "95"]),
    ("spindle", 'M', &["3", "4", "5"]),
];

fn modal_group(token: &Token) -> Option<&'static str> {
    let code = token.value.normalize().to_string();
    MODAL_GROUPS
        .iter()
        .find(|(_, letter, codes)| *letter == token.letter && codes.contains(&code.as_str()))
        .map(|(name, _, _)| *name)
}

/// Drops a word when the same word already appears earlier on its line.
///
/// Two different values for the same parameter letter cannot both be meant,
/// and neither can two codes from one modal group, so such lines are flagged
/// and left alone. Other `G` or `M` codes on one line are separate commands
/// and are never touched.
pub struct DedupRepeatedTokens<I> {
    inner: I,
}

impl<I> DedupRepeatedTokens<I> {
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I: Iterator<Item = Line>> Iterator for DedupRepeatedTokens<I> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        let mut line = self.inner.next()?;
        if !line.is_verbatim() {
            dedup_line(&mut line);
        }
        Some(line)
    }
}

fn dedup_line(line: &mut Line) {
    let before = line.tokens.len();
    let mut kept = Vec::with_capacity(before);
    let mut conflicts = Vec::new();
    let mut overridden = Vec::new();

    for token in line.tokens.drain(..) {
        if kept.contains(&token) {
            continue;
        }
        if !token.is_command()
            && kept.iter().any(|k: &Token| k.letter == token.letter)
            && !conflicts.contains(&token.letter)
        {
            conflicts.push(token.letter);
        }
        if let Some(group) = modal_group(&token)
            && kept.iter().any(|k| modal_group(k) == Some(group))
            && !overridden.contains(&group)
        {
            overridden.push(group);
        }
        kept.push(token);
    }
    line.tokens = kept;

    if line.tokens.len() != before {
        debug!(
            "line {}: dropped {} repeated word(s)",
            line.number,
            before - line.tokens.len()
        );
    }
    for letter in conflicts {
        line.flag(Diagnostic::warning(
            line.number,
            format!("conflicting values for {letter}"),
        ));
    }
    for group in overridden {
        line.flag(Diagnostic::warning(
            line.number,
            format!("conflicting {group} codes"),
        ));
    }
}
