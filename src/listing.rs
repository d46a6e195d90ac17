#![forbid(unsafe_code)]

//! Parser for the dashcam's recording inventory.
//!
//! The device answers `GET /blackvue_vod.cgi` with a `\r\n`-delimited text
//! body. Every real entry looks like `n:/Record/<identifier>.mp4,s:1000000`;
//! a bare `v:1.00` line is a protocol version marker, not a recording.

use std::fmt;

const ENTRY_PREFIX: &str = "n:/Record/";
const ENTRY_SUFFIX: &str = ".mp4,s:1000000";
const VERSION_MARKER: &str = "v:1.00";

pub const MEDIA_EXT: &str = ".mp4";
pub const THUMBNAIL_EXT: &str = ".thm";

/// Camera orientation encoded in the last character of an identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Category {
    Front,
    Rear,
    Unknown,
}

impl Category {
    /// Classifies an identifier by its trailing orientation tag. Anything
    /// that ends in neither `F` nor `R` is `Unknown` and never fetched.
    pub fn of(identifier: &str) -> Self {
        match identifier.as_bytes().last() {
            Some(b'F') => Category::Front,
            Some(b'R') => Category::Rear,
            _ => Category::Unknown,
        }
    }
}

/// Base name of one recording, shared by its media file and thumbnail.
///
/// The device stores `<identifier>.mp4` and `<identifier>.thm` side by side;
/// this type derives both artifact names from the bare identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Recording(String);

impl Recording {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn category(&self) -> Category {
        Category::of(&self.0)
    }

    /// File name of the video itself.
    pub fn media_name(&self) -> String {
        format!("{}{}", self.0, MEDIA_EXT)
    }

    /// File name of the preview thumbnail.
    pub fn thumbnail_name(&self) -> String {
        format!("{}{}", self.0, THUMBNAIL_EXT)
    }

    /// Both artifact names, media first. A recording is fetched by walking
    /// this pair in order.
    pub fn artifact_names(&self) -> [String; 2] {
        [self.media_name(), self.thumbnail_name()]
    }
}

impl fmt::Display for Recording {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One inventory response, bucketed by orientation in listing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub front: Vec<Recording>,
    pub rear: Vec<Recording>,
    pub unknown: Vec<Recording>,
}

impl Listing {
    fn push(&mut self, recording: Recording) {
        match recording.category() {
            Category::Front => self.front.push(recording),
            Category::Rear => self.rear.push(recording),
            Category::Unknown => self.unknown.push(recording),
        }
    }

    /// Number of recordings across all three buckets.
    pub fn total(&self) -> usize {
        self.front.len() + self.rear.len() + self.unknown.len()
    }
}

/// Parses a raw inventory body into a categorized listing.
///
/// Lines that don't match the entry shape are kept as-is and land in the
/// `Unknown` bucket rather than raising an error. Empty lines (the body
/// usually ends with a trailing `\r\n`) produce nothing.
pub fn parse_listing(body: &str) -> Listing {
    let mut listing = Listing::default();

    for line in body.split("\r\n") {
        if line.is_empty() {
            continue;
        }
        let entry = line.strip_prefix(ENTRY_PREFIX).unwrap_or(line);
        let entry = entry.strip_suffix(ENTRY_SUFFIX).unwrap_or(entry);
        if entry == VERSION_MARKER {
            continue;
        }
        listing.push(Recording::new(entry));
    }

    listing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifiers(recordings: &[Recording]) -> Vec<&str> {
        recordings.iter().map(Recording::as_str).collect()
    }

    #[test]
    fn classifies_by_trailing_tag() {
        assert_eq!(Category::of("20230101_120000_NF"), Category::Front);
        assert_eq!(Category::of("20230101_120000_NR"), Category::Rear);
        assert_eq!(Category::of("20230101_120000_NG"), Category::Unknown);
        assert_eq!(Category::of(""), Category::Unknown);
    }

    #[test]
    fn parses_front_rear_and_version_marker() {
        let body = "n:/Record/20230101_F.mp4,s:1000000\r\n\
                    n:/Record/20230101_R.mp4,s:1000000\r\n\
                    v:1.00\r\n";
        let listing = parse_listing(body);
        assert_eq!(identifiers(&listing.front), ["20230101_F"]);
        assert_eq!(identifiers(&listing.rear), ["20230101_R"]);
        assert!(listing.unknown.is_empty());
    }

    #[test]
    fn trailing_delimiter_adds_no_entry() {
        let listing = parse_listing("n:/Record/20230101_F.mp4,s:1000000\r\n\r\n");
        assert_eq!(listing.total(), 1);
    }

    #[test]
    fn empty_body_parses_to_empty_listing() {
        assert_eq!(parse_listing(""), Listing::default());
        assert_eq!(parse_listing("\r\n"), Listing::default());
    }

    #[test]
    fn malformed_lines_fall_through_to_unknown() {
        let listing = parse_listing("garbage line\r\nn:/Record/odd_entry.gps,s:5\r\n");
        // The fixed prefix is stripped even when the rest doesn't match; what
        // remains is kept verbatim for diagnostics.
        assert_eq!(
            identifiers(&listing.unknown),
            ["garbage line", "odd_entry.gps,s:5"]
        );
        assert!(listing.front.is_empty());
        assert!(listing.rear.is_empty());
    }

    #[test]
    fn every_line_is_kept_exactly_once() {
        let body = "n:/Record/20230101_120000_NF.mp4,s:1000000\r\n\
                    n:/Record/20230101_120000_NR.mp4,s:1000000\r\n\
                    n:/Record/20230101_120100_EF.mp4,s:1000000\r\n\
                    n:/Record/20230101_120100_ER.mp4,s:1000000\r\n\
                    v:1.00\r\n\
                    n:/Record/weird.mp4,s:1000000\r\n";
        let listing = parse_listing(body);
        // Six lines, minus the marker and the trailing empty segment.
        assert_eq!(listing.total(), 5);
        assert_eq!(listing.front.len(), 2);
        assert_eq!(listing.rear.len(), 2);
        assert_eq!(listing.unknown.len(), 1);
    }

    #[test]
    fn listing_order_is_preserved_within_a_category() {
        let body = "n:/Record/b_F.mp4,s:1000000\r\n\
                    n:/Record/a_F.mp4,s:1000000\r\n";
        let listing = parse_listing(body);
        assert_eq!(identifiers(&listing.front), ["b_F", "a_F"]);
    }

    #[test]
    fn artifact_names_round_trip_to_the_identifier() {
        let recording = Recording::new("20230101_120000_NF");
        assert_eq!(recording.media_name(), "20230101_120000_NF.mp4");
        assert_eq!(recording.thumbnail_name(), "20230101_120000_NF.thm");
        assert_eq!(
            recording.media_name().strip_suffix(MEDIA_EXT).unwrap(),
            recording.as_str()
        );
        assert_eq!(
            recording
                .thumbnail_name()
                .strip_suffix(THUMBNAIL_EXT)
                .unwrap(),
            recording.as_str()
        );
    }
}
