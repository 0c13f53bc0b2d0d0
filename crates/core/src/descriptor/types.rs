//! Parsed stream descriptor types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Video quality classification.
///
/// Everything below 1080p lands in `Other`, which is also the fallback when
/// no quality token is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Uhd4k,
    FullHd1080p,
    #[default]
    Other,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Uhd4k => write!(f, "4K"),
            Quality::FullHd1080p => write!(f, "1080p"),
            Quality::Other => write!(f, "720p/Other"),
        }
    }
}

/// High dynamic range flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HdrKind {
    DolbyVision,
    Hdr10Plus,
    Hdr10,
}

impl fmt::Display for HdrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdrKind::DolbyVision => write!(f, "Dolby Vision"),
            HdrKind::Hdr10Plus => write!(f, "HDR10+"),
            HdrKind::Hdr10 => write!(f, "HDR10"),
        }
    }
}

/// Structured metadata derived from a raw result.
///
/// A pure function of the `RawResult` it was parsed from; unrecognized
/// fields stay empty rather than guessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hdr: Option<HdrKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Size in bytes (0 when the source reported none).
    pub size_bytes: u64,
    pub seeders: u32,
    /// Release source label (e.g., "BluRay", "WEB-DL").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_label: Option<String>,
    /// Language tokens found in the title, normalized to canonical names.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub languages: BTreeSet<String>,
    /// Whole-season release (never shown alongside per-episode results).
    pub season_pack: bool,
    /// Name of the source that returned the result.
    pub source: String,
    /// Already present in the debrid cache.
    pub cached: bool,
    /// Directly playable URL; bypasses the debrid lifecycle entirely.
    pub direct_url: bool,
}
