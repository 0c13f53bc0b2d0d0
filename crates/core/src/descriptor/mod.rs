//! Free-text release title → structured descriptor parsing.
//!
//! Parsing is rule-table driven: each field (quality, codec, HDR, audio,
//! source label, languages, season pack) is owned by one ordered table in
//! `rules`, and `parse` combines them into an immutable `StreamDescriptor`.

mod parser;
mod rules;
mod types;

pub use parser::{parse, parse_size_bytes};
pub use types::*;
