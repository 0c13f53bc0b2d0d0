//! Result ranking: quality bucketing, source filtering, sorting, and
//! season-pack separation.
//!
//! All functions are synchronous and pure; sorting is stable so equal sizes
//! keep their discovery order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::descriptor::{Quality, StreamDescriptor};

/// Quality bucket selector. Buckets are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBucket {
    FourK,
    FullHd,
    /// Everything below 1080p. Only populated when the selected source
    /// filter names an unlimited source; bounded sources aren't expected to
    /// surface this tier reliably.
    Extra,
}

impl QualityBucket {
    fn matches(&self, quality: Quality) -> bool {
        matches!(
            (self, quality),
            (QualityBucket::FourK, Quality::Uhd4k)
                | (QualityBucket::FullHd, Quality::FullHd1080p)
                | (QualityBucket::Extra, Quality::Other)
        )
    }
}

/// Sort order within a quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    SizeDesc,
    SizeAsc,
}

/// Ranks parsed descriptors into the views a picker UI consumes.
#[derive(Debug, Clone)]
pub struct Ranker {
    bucket_cap: usize,
    unlimited_sources: HashSet<String>,
}

impl Ranker {
    /// Create a ranker with the given per-bucket cap.
    pub fn new(bucket_cap: usize) -> Self {
        Self {
            bucket_cap,
            unlimited_sources: HashSet::new(),
        }
    }

    /// Flag sources whose results are never capped.
    pub fn with_unlimited_sources<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unlimited_sources = names.into_iter().map(Into::into).collect();
        self
    }

    /// Select, filter, and sort one quality bucket.
    ///
    /// Season packs are always excluded (they have their own listing). The
    /// per-bucket cap applies only outside addon/cached-only mode and never
    /// to results of unlimited sources.
    pub fn bucket(
        &self,
        descriptors: &[StreamDescriptor],
        bucket: QualityBucket,
        source_filter: Option<&str>,
        order: SortOrder,
        cached_only: bool,
    ) -> Vec<StreamDescriptor> {
        // The Extra bucket is defined for all sources but deliberately only
        // served when the active filter is an unlimited source.
        if bucket == QualityBucket::Extra {
            match source_filter {
                Some(name) if self.unlimited_sources.contains(name) => {}
                _ => return Vec::new(),
            }
        }

        let mut selected: Vec<StreamDescriptor> = descriptors
            .iter()
            .filter(|d| !d.season_pack)
            .filter(|d| bucket.matches(d.quality))
            .filter(|d| source_filter.is_none_or(|name| d.source == name))
            .cloned()
            .collect();

        // Stable sort: equal sizes keep discovery order
        match order {
            SortOrder::SizeAsc => selected.sort_by_key(|d| d.size_bytes),
            SortOrder::SizeDesc => selected.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes)),
        }

        let uncapped = cached_only
            || source_filter.is_some()
            || selected.iter().all(|d| self.unlimited_sources.contains(&d.source));
        if !uncapped {
            selected.truncate(self.bucket_cap);
        }

        selected
    }

    /// Season packs as a separate listing, always sorted by size descending
    /// regardless of the caller's sort order.
    pub fn season_packs(&self, descriptors: &[StreamDescriptor]) -> Vec<StreamDescriptor> {
        let mut packs: Vec<StreamDescriptor> = descriptors
            .iter()
            .filter(|d| d.season_pack)
            .cloned()
            .collect();
        packs.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
        packs
    }
}
