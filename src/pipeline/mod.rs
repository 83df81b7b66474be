//! The cleaning pipeline
//!
//! Every stage is an iterator adapter over [`Line`]s, pulled one line at a
//! time from the output end. [`LineStream`] puts the stages on any line
//! iterator so a pipeline reads in stage order:
//!
//! ```
//! use gcode_cleaner::parser::{TokenizeOptions, tokenize};
//! use gcode_cleaner::pipeline::LineStream;
//!
//! let out: Vec<String> = tokenize(["G1 X0 Y0", "G1 X1 Y0", "G1 X2 Y0"], TokenizeOptions::default())
//!     .augment()
//!     .dedup_linear("0.0005".parse().unwrap(), 4)
//!     .join()
//!     .collect();
//! assert_eq!(out, vec!["G1 X0 Y0", "G1 X2 Y0"]);
//! ```

pub mod arc_center;
pub mod augment;
pub mod clip;
pub mod dedup;
pub mod join;
pub(crate) mod modal;

pub use arc_center::{ArcCenterOptions, ArcConvention, ArcRadiusToCenter};
pub use augment::{Augment, ModalState};
pub use clip::{Clip, Envelope, Range};
pub use dedup::{
    ArcFitOptions, DedupLine, DedupLinear, DedupLinearToArc, DedupRepeatedTokens,
    DedupSelectTokens, SingleCommandPerLine,
};
pub use join::Join;

use log::debug;
use rust_decimal::Decimal;

use crate::config::CleanConfig;
use crate::line::Line;
use crate::parser::tokenize;

/// Pipeline stages as methods on any stream of lines
pub trait LineStream: Iterator<Item = Line> + Sized {
    fn dedup_repeated_tokens(self) -> DedupRepeatedTokens<Self> {
        DedupRepeatedTokens::new(self)
    }

    fn single_command_per_line(self) -> SingleCommandPerLine<Self> {
        SingleCommandPerLine::new(self)
    }

    fn augment(self) -> Augment<Self> {
        Augment::new(self)
    }

    fn arc_radius_to_center(self, options: ArcCenterOptions) -> ArcRadiusToCenter<Self> {
        ArcRadiusToCenter::new(self, options)
    }

    /// `arcs` locates the centre of radius arcs that reach the clipper
    fn clip(self, envelope: Envelope, truncate: bool, arcs: ArcCenterOptions) -> Clip<Self> {
        Clip::new(self, envelope, truncate, arcs)
    }

    fn dedup_linear(self, tolerance: Decimal, precision: u32) -> DedupLinear<Self> {
        DedupLinear::new(self, tolerance, precision)
    }

    fn dedup_linear_to_arc(self, options: ArcFitOptions) -> DedupLinearToArc<Self> {
        DedupLinearToArc::new(self, options)
    }

    fn dedup_select_tokens(self, letters: &[char]) -> DedupSelectTokens<Self> {
        DedupSelectTokens::new(self, letters)
    }

    fn dedup_line(self) -> DedupLine<Self> {
        DedupLine::new(self)
    }

    fn join(self) -> Join<Self> {
        Join::new(self)
    }
}

impl<I: Iterator<Item = Line>> LineStream for I {}

/// The configured sequence of stages
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: CleanConfig,
}

impl Pipeline {
    pub fn new(config: CleanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Cleaned lines for `input`, lazily
    pub fn lines<'a, I, S>(&self, input: I) -> Box<dyn Iterator<Item = Line> + Send + 'a>
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: Send + 'a,
        S: AsRef<str>,
    {
        let config = &self.config;
        let stages = config.stages;
        let mut stream: Box<dyn Iterator<Item = Line> + Send + 'a> =
            Box::new(tokenize(input, config.tokenize_options()));

        if stages.repeated_tokens {
            stream = Box::new(stream.dedup_repeated_tokens());
        }
        if stages.single_command {
            stream = Box::new(stream.single_command_per_line());
        }
        stream = Box::new(stream.augment());
        if stages.arc_center {
            stream = Box::new(stream.arc_radius_to_center(config.arc_center_options()));
        }
        if stages.clip && !config.envelope.is_unbounded() {
            stream = Box::new(stream.clip(
                config.envelope,
                config.truncate,
                config.arc_center_options(),
            ));
        }
        if stages.linear {
            for _ in 0..config.linear_passes {
                stream = Box::new(stream.dedup_linear(config.linear_tolerance, config.precision));
            }
        }
        if stages.linear_to_arc {
            stream = Box::new(stream.dedup_linear_to_arc(config.arc_fit_options()));
        }
        if stages.select_tokens && !config.select_letters.is_empty() {
            stream = Box::new(stream.dedup_select_tokens(&config.select_letters));
        }
        if stages.dedup_line {
            stream = Box::new(stream.dedup_line());
        }

        debug!("pipeline built: {:?}", stages);
        stream
    }

    /// Cleaned text for `input`, one string per output line
    pub fn run<'a, I, S>(&self, input: I) -> Join<Box<dyn Iterator<Item = Line> + Send + 'a>>
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: Send + 'a,
        S: AsRef<str>,
    {
        self.lines(input).join()
    }

    /// Clean a whole program held in memory
    pub fn clean_text(&self, text: &str) -> String {
        self.run(text.lines()).fold(String::new(), |mut out, line| {
            out.push_str(&line);
            out.push('\n');
            out
        })
    }
}
