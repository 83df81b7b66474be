//! G-code cleaner
//!
//! Shrinks and normalises CNC G-code programs without changing the path the
//! tool follows.
//!
//! This library provides:
//! - A tokenizer and modal augmenter resolving every line's position
//! - Deduplication passes for tokens, lines, collinear moves and arcs
//! - Envelope clipping and `R`-arc conversion
//! - Streaming file I/O and configuration management

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod geometry;
pub mod io;
pub mod line;
pub mod parser;
pub mod pipeline;

pub use config::{CleanConfig, Config};
pub use diagnostics::{Diagnostic, Report, Severity};
pub use line::{Line, Token};
pub use parser::{parse_line, tokenize};
pub use pipeline::{LineStream, Pipeline};
