//! Deduplication passes
//!
//! Each pass removes one kind of redundancy and leaves everything else
//! alone. `repeated_tokens` and `single_command` work on tokens alone and
//! run before the augmenter; the rest rely on the resolved context.

pub mod line;
pub mod linear;
pub mod linear_to_arc;
pub mod repeated_tokens;
pub mod select_tokens;
pub mod single_command;

pub use line::DedupLine;
pub use linear::DedupLinear;
pub use linear_to_arc::{ArcFitOptions, DedupLinearToArc};
pub use repeated_tokens::DedupRepeatedTokens;
pub use select_tokens::{DedupSelectTokens, NON_MODAL_LETTERS};
pub use single_command::SingleCommandPerLine;
