//! Raw result → structured descriptor parsing.
//!
//! `parse` is pure and deterministic: the same raw result always yields the
//! same descriptor, and a title no rule recognizes degrades to empty fields
//! instead of failing the whole result set.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::source::RawResult;

use super::rules;
use super::types::StreamDescriptor;

/// Matches a free-text size, e.g. "1.5 GB", "700 MB", or a bare "50".
static SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*([0-9]*\.?[0-9]+)\s*([a-z]+)?\s*$").unwrap());

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Parse a free-text size string into bytes.
///
/// Unknown or missing units fall back to MB; a string with no parsable
/// number yields 0.
pub fn parse_size_bytes(size: &str) -> u64 {
    let Some(caps) = SIZE_RE.captures(size) else {
        return 0;
    };
    let Ok(value) = caps[1].parse::<f64>() else {
        return 0;
    };

    let multiplier = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
        Some(unit) => match unit.as_str() {
            "gb" | "gib" => GB,
            "mb" | "mib" => MB,
            "kb" | "kib" => KB,
            _ => MB,
        },
        None => MB,
    };

    (value * multiplier) as u64
}

/// Derive a structured descriptor from a raw result.
pub fn parse(raw: &RawResult) -> StreamDescriptor {
    let title = &raw.title;

    let size_bytes = raw.size_bytes.unwrap_or_else(|| {
        raw.size.as_deref().map(parse_size_bytes).unwrap_or(0)
    });

    // A single-episode pattern always wins over whole-season markers
    let season_pack = !rules::is_single_episode(title) && rules::has_season_marker(title);

    StreamDescriptor {
        quality: rules::quality_for(title),
        codec: rules::codec_for(title).map(str::to_string),
        hdr: rules::hdr_for(title),
        audio: rules::audio_for(title).map(str::to_string),
        size_bytes,
        seeders: raw.seeders,
        source_label: rules::source_label_for(title).map(str::to_string),
        languages: rules::languages_for(title),
        season_pack,
        source: raw.source.clone(),
        cached: raw.cached,
        direct_url: raw.url.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{HdrKind, Quality};

    fn raw(title: &str) -> RawResult {
        RawResult {
            source: "torrentio".to_string(),
            title: title.to_string(),
            size: None,
            size_bytes: None,
            seeders: 0,
            leechers: 0,
            publish_date: None,
            info_hash: Some("abc123".to_string()),
            url: None,
            file_index: None,
            cached: false,
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        let input = raw("Show.Name.S01E05.2160p.DV.HDR10.x265.TrueHD.Atmos.MULTI.WEB-DL");
        let first = parse(&input);
        let second = parse(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_full_title() {
        let mut input = raw("Show.Name.S01E05.2160p.DV.x265.Atmos.MULTI.French.WEB-DL");
        input.size = Some("4.2 GB".to_string());
        input.seeders = 42;

        let descriptor = parse(&input);
        assert_eq!(descriptor.quality, Quality::Uhd4k);
        assert_eq!(descriptor.codec.as_deref(), Some("HEVC"));
        assert_eq!(descriptor.hdr, Some(HdrKind::DolbyVision));
        assert_eq!(descriptor.audio.as_deref(), Some("Atmos"));
        assert_eq!(descriptor.source_label.as_deref(), Some("WEB-DL"));
        assert!(descriptor.languages.contains("Multi"));
        assert!(descriptor.languages.contains("French"));
        assert!(!descriptor.season_pack);
        assert_eq!(descriptor.seeders, 42);
        assert_eq!(descriptor.size_bytes, (4.2 * GB) as u64);
        assert!(!descriptor.direct_url);
    }

    #[test]
    fn test_parse_unrecognized_title_degrades() {
        let descriptor = parse(&raw("completely unrelated text"));
        assert_eq!(descriptor.quality, Quality::Other);
        assert!(descriptor.codec.is_none());
        assert!(descriptor.hdr.is_none());
        assert!(descriptor.audio.is_none());
        assert!(descriptor.source_label.is_none());
        assert!(descriptor.languages.is_empty());
        assert!(!descriptor.season_pack);
        assert_eq!(descriptor.size_bytes, 0);
    }

    #[test]
    fn test_size_parsing_gb() {
        assert_eq!(parse_size_bytes("1.5 GB"), (1.5 * GB) as u64);
    }

    #[test]
    fn test_size_parsing_mb() {
        assert_eq!(parse_size_bytes("700 MB"), (700.0 * MB) as u64);
    }

    #[test]
    fn test_size_parsing_no_unit_defaults_to_mb() {
        assert_eq!(parse_size_bytes("50"), (50.0 * MB) as u64);
    }

    #[test]
    fn test_size_parsing_unknown_unit_defaults_to_mb() {
        assert_eq!(parse_size_bytes("50 potato"), (50.0 * MB) as u64);
    }

    #[test]
    fn test_size_parsing_missing_value() {
        assert_eq!(parse_size_bytes(""), 0);
        assert_eq!(parse_size_bytes("GB"), 0);
        assert_eq!(parse_size_bytes("n/a"), 0);
    }

    #[test]
    fn test_size_numeric_field_preferred() {
        let mut input = raw("Show.S01E01.1080p");
        input.size_bytes = Some(12345);
        input.size = Some("1.5 GB".to_string());
        assert_eq!(parse(&input).size_bytes, 12345);
    }

    #[test]
    fn test_season_pack_detection() {
        assert!(parse(&raw("Show.Name.S01.Complete.1080p")).season_pack);
        assert!(parse(&raw("Show.Name.Season.2.1080p")).season_pack);
        assert!(parse(&raw("Show.S01-S08.1080p")).season_pack);
        assert!(!parse(&raw("Show.Name.S01E05.1080p")).season_pack);
        // Episode pattern wins even when season markers are present
        assert!(!parse(&raw("Show.Name.S01E05.Complete.1080p")).season_pack);
        assert!(!parse(&raw("Movie.Name.2022.1080p")).season_pack);
    }

    #[test]
    fn test_direct_url_flag() {
        let mut input = raw("Some.Stream.1080p");
        input.info_hash = None;
        input.url = Some("https://cdn.example/stream.mp4".to_string());
        assert!(parse(&input).direct_url);
    }

    #[test]
    fn test_cached_flag_carried() {
        let mut input = raw("Show.S01E01.1080p");
        input.cached = true;
        assert!(parse(&input).cached);
    }
}
