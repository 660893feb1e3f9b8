//! Title/artist attribution from freeform video titles
//!
//! Two modes:
//! - Uploader-anchored: the uploader is the artist, and its name is stripped
//!   out of the title together with decorative qualifiers like "(Official Video)".
//! - Separator heuristic: the title is split on the first matching separator
//!   pattern and the shorter half is taken as the artist.
//!
//! Both cascades are ordered lists of pure matchers; the first match wins,
//! not the best one.

use crate::model::{Attribution, ResolutionMethod, UNKNOWN_ARTIST};
use regex::Regex;
use std::sync::OnceLock;

/// Matcher used when the uploader is known: returns the title with the
/// uploader's name removed
type UploaderMatcher = fn(title: &str, uploader: &str) -> Option<String>;

/// Matcher used without an uploader: returns the two halves of the title
type SeparatorMatcher = fn(title: &str) -> Option<(String, String)>;

const UPLOADER_MATCHERS: &[(&str, UploaderMatcher)] = &[
    ("uploader-prefix", strip_uploader_prefix),
    ("uploader-suffix", strip_uploader_suffix),
    ("uploader-quote", strip_uploader_quote),
    ("uploader-paren", strip_uploader_paren),
    ("uploader-by", strip_uploader_by),
];

const SEPARATOR_MATCHERS: &[(&str, SeparatorMatcher)] = &[
    ("dash", split_dash),
    ("colon", split_colon),
    ("quote", split_quote),
    ("paren", split_paren),
    ("by", split_by),
    ("featuring", split_featuring),
];

/// Words that mark a half as a featured-artist credit rather than the main artist
const FEATURE_MARKERS: &[&str] = &["feat", "ft", "featuring"];

/// Resolve a (title, artist) pair. Never fails.
pub fn resolve(raw_title: &str, uploader: Option<&str>) -> Attribution {
    resolve_traced(raw_title, uploader).0
}

/// Resolve a (title, artist) pair and report which mode produced it
pub fn resolve_traced(raw_title: &str, uploader: Option<&str>) -> (Attribution, ResolutionMethod) {
    if let Some(uploader) = uploader.map(str::trim).filter(|u| !u.is_empty()) {
        let title = resolve_with_uploader(raw_title, uploader);
        return (
            Attribution::new(title, uploader),
            ResolutionMethod::UploaderAnchored,
        );
    }

    for (name, matcher) in SEPARATOR_MATCHERS {
        let Some((part1, part2)) = matcher(raw_title) else {
            continue;
        };
        let (trimmed1, trimmed2) = (part1.trim(), part2.trim());
        if trimmed1.is_empty() || trimmed2.is_empty() {
            continue;
        }

        log::debug!("Title {:?} split by {} pattern", raw_title, name);
        // Lengths of the raw captures decide, surrounding whitespace included
        let attribution = if is_artist_first(&part1, &part2) {
            Attribution::new(trimmed2, trimmed1)
        } else {
            Attribution::new(trimmed1, trimmed2)
        };
        return (attribution, ResolutionMethod::Separator);
    }

    log::debug!("No separator pattern matched title {:?}", raw_title);
    (
        Attribution::new(raw_title.trim(), UNKNOWN_ARTIST),
        ResolutionMethod::Unresolved,
    )
}

/// Strip decorative qualifiers such as "(Official Video)" or "[HD]".
///
/// Repeats until nothing changes, so applying it twice is the same as once.
pub fn strip_qualifiers(title: &str) -> String {
    let re = qualifier_regex();
    let mut current = title.trim().to_string();
    loop {
        let next = re.replace_all(&current, " ").trim().to_string();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn resolve_with_uploader(raw_title: &str, uploader: &str) -> String {
    let working = UPLOADER_MATCHERS
        .iter()
        .find_map(|(name, matcher)| {
            matcher(raw_title, uploader).map(|title| {
                log::debug!("Stripped uploader from title using {} pattern", name);
                title
            })
        })
        .unwrap_or_else(|| raw_title.to_string());

    strip_qualifiers(&working)
}

/// The shorter half is the artist, unless it carries a featuring credit.
/// Lengths are compared in characters so CJK titles are not skewed.
fn is_artist_first(part1: &str, part2: &str) -> bool {
    let lowered = part1.to_lowercase();
    part1.chars().count() < part2.chars().count()
        && !FEATURE_MARKERS.iter().any(|m| lowered.contains(m))
}

fn qualifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let words = r"official\s+music\s+video|official\s+video|official\s+audio|lyrics?|hd|4k";
        let pattern = format!(r"(?i)\s*(?:\((?:{words})\)|\[(?:{words})\])\s*");
        Regex::new(&pattern).expect("qualifier pattern is valid")
    })
}

fn capture_one(pattern: &str, title: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(title)?;
    Some(caps.get(1)?.as_str().trim().to_string())
}

fn capture_pair(re: &Regex, title: &str) -> Option<(String, String)> {
    let caps = re.captures(title)?;
    Some((
        caps.get(1)?.as_str().to_string(),
        caps.get(2)?.as_str().to_string(),
    ))
}

fn strip_uploader_prefix(title: &str, uploader: &str) -> Option<String> {
    let u = regex::escape(uploader);
    capture_one(&format!(r"(?i)^{u}\s*[-–—:：]\s*(.+)$"), title)
}

fn strip_uploader_suffix(title: &str, uploader: &str) -> Option<String> {
    let u = regex::escape(uploader);
    capture_one(&format!(r"(?i)^(.+?)\s*[-–—:：]\s*{u}$"), title)
}

fn strip_uploader_quote(title: &str, uploader: &str) -> Option<String> {
    let u = regex::escape(uploader);
    capture_one(&format!(r"(?i)^{u}\s*[「『]\s*(.+?)\s*[」』]$"), title)
}

fn strip_uploader_paren(title: &str, uploader: &str) -> Option<String> {
    let u = regex::escape(uploader);
    capture_one(&format!(r"(?i)^(.+?)\s*\(\s*{u}\s*\)$"), title)
}

fn strip_uploader_by(title: &str, uploader: &str) -> Option<String> {
    let u = regex::escape(uploader);
    capture_one(&format!(r"(?i)^(.+?)\s*by\s+{u}$"), title)
}

macro_rules! separator_matcher {
    ($name:ident, $pattern:expr) => {
        fn $name(title: &str) -> Option<(String, String)> {
            static RE: OnceLock<Regex> = OnceLock::new();
            let re = RE.get_or_init(|| Regex::new($pattern).expect("separator pattern is valid"));
            capture_pair(re, title)
        }
    };
}

separator_matcher!(split_dash, r"^(.+?)\s*[-–—]\s*(.+)$");
separator_matcher!(split_colon, r"^(.+?)\s*[:|：]\s*(.+)$");
separator_matcher!(split_quote, r"^(.+?)\s*[「『]\s*(.+?)\s*[」』]$");
separator_matcher!(split_paren, r"^(.+?)\s*\(\s*(.+?)\s*\)$");
separator_matcher!(split_by, r"(?i)^(.+?)\s*by\s+(.+)$");
separator_matcher!(
    split_featuring,
    r"(?i)^(.+?)\s*(?:featuring|feat\.?|ft\.?)\s+(.+)$"
);
