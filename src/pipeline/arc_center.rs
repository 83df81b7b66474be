//! `R`-form arcs rewritten with explicit centre offsets

use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::diagnostics::Diagnostic;
use crate::geometry::{ArcFault, center_from_radius, coord::to_f64, round_to};
use crate::line::{Line, Token};

/// Which way `G2` turns when looking down the plane normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcConvention {
    /// `G2` is clockwise, as on every common controller
    #[default]
    Standard,
    /// `G2` is counter-clockwise
    Inverted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcCenterOptions {
    pub convention: ArcConvention,
    /// How far a radius may fall short of half the chord and still be
    /// accepted as a half circle
    pub slack: Decimal,
    pub precision: u32,
}

impl Default for ArcCenterOptions {
    fn default() -> Self {
        Self {
            convention: ArcConvention::Standard,
            slack: Decimal::new(5, 4),
            precision: 4,
        }
    }
}

pub struct ArcRadiusToCenter<I> {
    inner: I,
    options: ArcCenterOptions,
}

impl<I> ArcRadiusToCenter<I> {
    pub fn new(inner: I, options: ArcCenterOptions) -> Self {
        Self { inner, options }
    }
}

impl<I: Iterator<Item = Line>> Iterator for ArcRadiusToCenter<I> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        let mut line = self.inner.next()?;
        if uses_radius(&line) {
            convert(&mut line, &self.options);
        }
        Some(line)
    }
}

fn uses_radius(line: &Line) -> bool {
    line.is_motion()
        && line.motion.is_some_and(|m| m.is_arc())
        && line.find('R').is_some()
        && !line.tokens.iter().any(|t| matches!(t.letter, 'I' | 'J' | 'K'))
}

fn convert(line: &mut Line, options: &ArcCenterOptions) {
    let plane = line.plane;
    if !line.start.has_coord_pair(plane) || !line.position.has_coord_pair(plane) {
        line.flag(Diagnostic::warning(
            line.number,
            "arc start position unknown, radius form kept",
        ));
        return;
    }

    let Some(index) = line.tokens.iter().position(|t| t.letter == 'R') else {
        return;
    };
    let radius = line.tokens[index].value;

    match radius_offset(line, radius, options) {
        Ok((first, second)) => {
            let (first_letter, second_letter) = plane.offset_letters();
            let (Some(first), Some(second)) = (
                round_to(first, options.precision),
                round_to(second, options.precision),
            ) else {
                line.flag(Diagnostic::error(
                    line.number,
                    "cannot convert radius arc: centre out of range",
                ));
                return;
            };
            let mut offsets = [
                Token::new(first_letter, first),
                Token::new(second_letter, second),
            ];
            offsets.sort_by_key(|t| t.letter);
            debug!(
                "line {}: R{} becomes {} {}",
                line.number,
                radius.normalize(),
                offsets[0],
                offsets[1]
            );
            line.tokens.splice(index..=index, offsets);
        }
        Err(fault) => {
            line.flag(Diagnostic::error(
                line.number,
                format!("cannot convert radius arc: {fault}"),
            ));
        }
    }
}

/// Centre of the arc `line` describes with `radius`, as an offset from its
/// start in the line's plane
pub(crate) fn radius_offset(
    line: &Line,
    radius: Decimal,
    options: &ArcCenterOptions,
) -> Result<(f64, f64), ArcFault> {
    let clockwise = line.motion.is_some_and(|m| m.is_clockwise())
        != (options.convention == ArcConvention::Inverted);
    center_from_radius(
        line.start.to_point(line.plane),
        line.position.to_point(line.plane),
        to_f64(radius),
        clockwise,
        to_f64(options.slack),
    )
}
