//! Ordered classification rule tables for release titles.
//!
//! Each descriptor field is owned by one table. Within a table the first
//! matching rule wins, so precedence lives in the data, not in code order.
//! Tables are compiled once and are safe to use from any thread.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::BTreeSet;

use super::types::{HdrKind, Quality};

fn compile<T: Copy>(rules: &[(&str, T)]) -> Vec<(Regex, T)> {
    rules
        .iter()
        .map(|(pattern, value)| (Regex::new(pattern).unwrap(), *value))
        .collect()
}

/// Quality tokens, highest first (2160p/4K before 1080p before 720p).
static QUALITY_RULES: Lazy<Vec<(Regex, Quality)>> = Lazy::new(|| {
    compile(&[
        (r"(?i)\b(2160p|4k|uhd)\b", Quality::Uhd4k),
        (r"(?i)\b(1080p|fhd)\b", Quality::FullHd1080p),
        (r"(?i)\b720p\b", Quality::Other),
    ])
});

static CODEC_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"(?i)\b(x265|h[ ._-]?265|hevc)\b", "HEVC"),
        (r"(?i)\b(x264|h[ ._-]?264|avc)\b", "H.264"),
        (r"(?i)\bav1\b", "AV1"),
        (r"(?i)\b(xvid|divx)\b", "XviD"),
    ])
});

static HDR_RULES: Lazy<Vec<(Regex, HdrKind)>> = Lazy::new(|| {
    compile(&[
        (r"(?i)\b(dolby[ ._-]?vision|dovi|dv)\b", HdrKind::DolbyVision),
        (r"(?i)\bhdr10(\+|plus)", HdrKind::Hdr10Plus),
        (r"(?i)\bhdr(10)?\b", HdrKind::Hdr10),
    ])
});

static AUDIO_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"(?i)\batmos\b", "Atmos"),
        (r"(?i)\btrue[ ._-]?hd\b", "TrueHD"),
        (r"(?i)\bdts[ ._-]?hd\b", "DTS-HD"),
        (r"(?i)\bdts\b", "DTS"),
        (r"(?i)\b(ddp|dd\+|e[ ._-]?ac3)", "DD+"),
        (r"(?i)\b(dd[0-9.]*|ac3)\b", "DD"),
        (r"(?i)\baac\b", "AAC"),
        (r"(?i)\bflac\b", "FLAC"),
    ])
});

static SOURCE_LABEL_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"(?i)\bremux\b", "REMUX"),
        (r"(?i)\b(blu[ ._-]?ray|bdrip|brrip)\b", "BluRay"),
        (r"(?i)\bweb[ ._-]?dl\b", "WEB-DL"),
        (r"(?i)\bwebrip\b", "WEBRip"),
        (r"(?i)\bweb\b", "WEB-DL"),
        (r"(?i)\bhdtv\b", "HDTV"),
        (r"(?i)\b(hd)?cam(rip)?\b", "CAM"),
        (r"(?i)\b(dvdrip|dvd)\b", "DVDRip"),
    ])
});

/// Language tokens. Unlike the tables above, every matching rule contributes
/// (a release can legitimately carry several languages).
static LANGUAGE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    compile(&[
        (r"(?i)\bmulti\b", "Multi"),
        (r"(?i)\bdual([ ._-]?audio)?\b", "Dual Audio"),
        (r"(?i)\b(english|eng)\b", "English"),
        (r"(?i)\b(spanish|latino|castellano)\b", "Spanish"),
        (r"(?i)\b(french|vostfr)\b", "French"),
        (r"(?i)\bgerman\b", "German"),
        (r"(?i)\b(italian|ita)\b", "Italian"),
        (r"(?i)\b(portuguese|pt[ ._-]?br)\b", "Portuguese"),
        (r"(?i)\b(russian|rus)\b", "Russian"),
        (r"(?i)\bhindi\b", "Hindi"),
        (r"(?i)\btamil\b", "Tamil"),
        (r"(?i)\btelugu\b", "Telugu"),
        (r"(?i)\b(japanese|jpn)\b", "Japanese"),
        (r"(?i)\b(korean|kor)\b", "Korean"),
        (r"(?i)\b(chinese|mandarin)\b", "Chinese"),
    ])
});

/// Single-episode patterns. When one of these matches, the release is a
/// specific episode no matter what whole-season markers are also present.
static EPISODE_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"(?i)\bs\d{1,2}[ ._-]?e\d{1,3}\b", r"(?i)\b\d{1,2}x\d{2,3}\b"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

/// Whole-season markers ("Season 2", "Complete", "S01-S08", bare "S03").
static SEASON_MARKER_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bseason[ ._-]?\d{1,2}\b",
        r"(?i)\bcomplete\b",
        r"(?i)\bs\d{1,2}[ ._-]?-[ ._-]?s?\d{1,2}\b",
        r"(?i)\bs\d{1,2}\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

fn first_match<T: Copy>(rules: &[(Regex, T)], title: &str) -> Option<T> {
    rules
        .iter()
        .find(|(re, _)| re.is_match(title))
        .map(|(_, value)| *value)
}

pub(crate) fn quality_for(title: &str) -> Quality {
    first_match(&QUALITY_RULES, title).unwrap_or_default()
}

pub(crate) fn codec_for(title: &str) -> Option<&'static str> {
    first_match(&CODEC_RULES, title)
}

pub(crate) fn hdr_for(title: &str) -> Option<HdrKind> {
    first_match(&HDR_RULES, title)
}

pub(crate) fn audio_for(title: &str) -> Option<&'static str> {
    first_match(&AUDIO_RULES, title)
}

pub(crate) fn source_label_for(title: &str) -> Option<&'static str> {
    first_match(&SOURCE_LABEL_RULES, title)
}

pub(crate) fn languages_for(title: &str) -> BTreeSet<String> {
    LANGUAGE_RULES
        .iter()
        .filter(|(re, _)| re.is_match(title))
        .map(|(_, name)| name.to_string())
        .collect()
}

pub(crate) fn is_single_episode(title: &str) -> bool {
    EPISODE_RULES.iter().any(|re| re.is_match(title))
}

pub(crate) fn has_season_marker(title: &str) -> bool {
    SEASON_MARKER_RULES.iter().any(|re| re.is_match(title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_first_match_wins() {
        // 2160p outranks the 1080p token also present in the title
        assert_eq!(
            quality_for("Movie.2160p.1080p.weird.title"),
            Quality::Uhd4k
        );
        assert_eq!(quality_for("Movie.4K.HDR"), Quality::Uhd4k);
        assert_eq!(quality_for("Movie.1080p.BluRay"), Quality::FullHd1080p);
        assert_eq!(quality_for("Movie.720p.WEB"), Quality::Other);
    }

    #[test]
    fn test_quality_unrecognized_defaults_to_other() {
        assert_eq!(quality_for("Movie.DVDRip.XviD"), Quality::Other);
    }

    #[test]
    fn test_codec_lookup() {
        assert_eq!(codec_for("Movie.2160p.x265"), Some("HEVC"));
        assert_eq!(codec_for("Movie.1080p.HEVC"), Some("HEVC"));
        assert_eq!(codec_for("Movie.1080p.H.264"), Some("H.264"));
        assert_eq!(codec_for("Movie.AV1.opus"), Some("AV1"));
        assert_eq!(codec_for("Movie.1080p"), None);
    }

    #[test]
    fn test_hdr_lookup() {
        assert_eq!(hdr_for("Movie.2160p.DV.HDR10"), Some(HdrKind::DolbyVision));
        assert_eq!(hdr_for("Movie.2160p.HDR10+"), Some(HdrKind::Hdr10Plus));
        assert_eq!(hdr_for("Movie.2160p.HDR"), Some(HdrKind::Hdr10));
        assert_eq!(hdr_for("Movie.1080p.SDR"), None);
    }

    #[test]
    fn test_audio_lookup() {
        assert_eq!(audio_for("Movie.TrueHD.Atmos"), Some("Atmos"));
        assert_eq!(audio_for("Movie.TrueHD.7.1"), Some("TrueHD"));
        assert_eq!(audio_for("Movie.DDP5.1"), Some("DD+"));
        assert_eq!(audio_for("Movie.DD5.1"), Some("DD"));
        assert_eq!(audio_for("Movie.AAC"), Some("AAC"));
        assert_eq!(audio_for("Movie.1080p"), None);
    }

    #[test]
    fn test_source_label_lookup() {
        assert_eq!(source_label_for("Movie.2160p.REMUX"), Some("REMUX"));
        assert_eq!(source_label_for("Movie.1080p.BluRay.x264"), Some("BluRay"));
        assert_eq!(source_label_for("Movie.1080p.WEB-DL"), Some("WEB-DL"));
        assert_eq!(source_label_for("Movie.1080p.WEBRip"), Some("WEBRip"));
        assert_eq!(source_label_for("Movie.720p.HDTV"), Some("HDTV"));
        assert_eq!(source_label_for("Movie.plain"), None);
    }

    #[test]
    fn test_languages_collects_all_matches() {
        let langs = languages_for("Movie.1080p.MULTI.English.French");
        assert!(langs.contains("Multi"));
        assert!(langs.contains("English"));
        assert!(langs.contains("French"));
        assert_eq!(langs.len(), 3);
    }

    #[test]
    fn test_languages_word_boundaries() {
        // "ita" must not match inside "Digital"
        assert!(languages_for("Movie.Digital.1080p").is_empty());
        assert!(languages_for("Movie.ITA.1080p").contains("Italian"));
    }

    #[test]
    fn test_single_episode_patterns() {
        assert!(is_single_episode("Show.Name.S01E05.1080p"));
        assert!(is_single_episode("Show.Name.s01e05"));
        assert!(is_single_episode("Show.Name.1x05.720p"));
        assert!(!is_single_episode("Show.Name.S01.Complete"));
    }

    #[test]
    fn test_season_markers() {
        assert!(has_season_marker("Show.Name.Season.2.1080p"));
        assert!(has_season_marker("Show.Name.S01.Complete.1080p"));
        assert!(has_season_marker("Show.S01-S08.1080p"));
        assert!(has_season_marker("Show.Name.S03.1080p"));
        assert!(!has_season_marker("Movie.Name.2022.1080p"));
    }
}
