//! Marker grammars.
//!
//! A document is first sniffed to decide which grammars apply, then every
//! selected grammar scans the text independently. Results are merged in the
//! fixed precedence order of [`Grammar::PRECEDENCE`]: a marker whose source
//! span overlaps one already accepted from a higher-precedence grammar is
//! dropped and reported as an issue. The merged markers are finally sorted in
//! reading order.
//!
//! The pasted-segments grammar is the exception: when its signal is present it
//! runs alone.

mod blocks;
mod highlight;
mod inline;
mod segments;

use std::ops::Range;

use tracing::{debug, info, warn};

use crate::{
    document::DocumentText,
    my_regex::{
        header_block_re, highlight_header_re, labeled_title_re, segment_header_re,
        starting_timestamp_re,
    },
    types::MediaMarker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// `[CLIP ...]` / `[SCREENSHOT ...]` bracket markers
    Inline,
    /// `SEGMENT:`/`TITLE:` lines with `TIME:` and `DURATION:` fields
    Labeled,
    /// `#### Title (N minutes)` with a `STARTING TIMESTAMP:` line
    HeaderBlock,
    /// `## Title -- MM:SS` with emoji bullets
    Highlight,
    /// Pasted `Segment N: ...` paragraphs
    PastedSegments,
}

impl Grammar {
    /// Order in which grammars are merged when several apply
    pub const PRECEDENCE: [Grammar; 4] = [
        Grammar::Inline,
        Grammar::Labeled,
        Grammar::HeaderBlock,
        Grammar::Highlight,
    ];

    /// Quick structural sniff of the document to select the grammars to run
    pub fn detect(text: &str, lines: &[Line<'_>]) -> Vec<Grammar> {
        let has_segments = any_line(lines, |l| segment_header_re().is_match(l))
            && text.to_uppercase().contains("TIMESTAMP");
        if has_segments {
            return vec![Grammar::PastedSegments];
        }

        Self::PRECEDENCE
            .into_iter()
            .filter(|grammar| match grammar {
                Grammar::Inline => text.contains("[CLIP") || text.contains("[SCREENSHOT"),
                Grammar::Labeled => any_line(lines, |l| labeled_title_re().is_match(l)),
                Grammar::HeaderBlock => {
                    any_line(lines, |l| header_block_re().is_match(l))
                        && any_line(lines, |l| starting_timestamp_re().is_match(l))
                }
                Grammar::Highlight => any_line(lines, |l| highlight_header_re().is_match(l)),
                Grammar::PastedSegments => false,
            })
            .collect()
    }

    fn scan(self, text: &str, lines: &[Line<'_>], ctx: &mut ScanContext) -> Vec<Found> {
        match self {
            Grammar::Inline => inline::scan(text, ctx),
            Grammar::Labeled => blocks::scan_labeled(text, lines, ctx),
            Grammar::HeaderBlock => blocks::scan_headers(text, lines, ctx),
            Grammar::Highlight => highlight::scan(text, lines, ctx),
            Grammar::PastedSegments => segments::scan(text, lines, ctx),
        }
    }
}

fn any_line(lines: &[Line<'_>], f: impl Fn(&str) -> bool) -> bool {
    lines.iter().any(|l| f(l.text))
}

/// Output of a parse pass
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Markers in reading order
    pub markers: Vec<MediaMarker>,
    /// The cleaned document text the marker spans refer to
    pub text: String,
    /// Markers that looked intended but were skipped, with the reason
    pub issues: Vec<String>,
}

/// Settings shared by the grammars
#[derive(Debug)]
pub(crate) struct ScanContext {
    /// Clip length used by block grammars when the author gave none
    pub default_clip_secs: u64,
    pub issues: Vec<String>,
}

impl ScanContext {
    pub fn skip(&mut self, reason: String) {
        warn!("Skipping marker: {reason}");
        self.issues.push(reason);
    }
}

/// A marker along with the byte range of its source span
#[derive(Debug)]
pub(crate) struct Found {
    pub range: Range<usize>,
    pub marker: MediaMarker,
}

impl Found {
    /// Build from a block of lines, the span covering them all
    pub fn from_lines(
        text: &str,
        lines: &[Line<'_>],
        first: usize,
        last: usize,
        build: impl FnOnce(&str) -> MediaMarker,
    ) -> Self {
        let range = lines[first].start..lines[last].end();
        let marker = build(&text[range.clone()]);
        Self { range, marker }
    }
}

/// A line of the document text with its byte offset
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub start: usize,
    pub text: &'a str,
}

impl Line<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

pub fn index_lines(text: &str) -> Vec<Line<'_>> {
    let mut start = 0;
    text.split('\n')
        .map(|line| {
            let l = Line { start, text: line };
            start += line.len() + 1;
            l
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Parser {
    default_clip_secs: u64,
}

impl Parser {
    pub fn new(default_clip_secs: u64) -> Self {
        Self { default_clip_secs }
    }

    pub fn parse(&self, document: &DocumentText) -> ParsedDocument {
        self.parse_text(document.full_text())
    }

    /// Parse already cleaned text
    pub fn parse_text(&self, text: String) -> ParsedDocument {
        let lines = index_lines(&text);
        let grammars = Grammar::detect(&text, &lines);
        debug!("Grammars selected: {grammars:?}");

        let mut ctx = ScanContext {
            default_clip_secs: self.default_clip_secs,
            issues: Vec::new(),
        };

        let mut accepted: Vec<Found> = Vec::new();
        for grammar in grammars {
            for found in grammar.scan(&text, &lines, &mut ctx) {
                let overlaps = accepted
                    .iter()
                    .any(|a| a.range.start < found.range.end && found.range.start < a.range.end);
                if overlaps {
                    let first_line = found.marker.source_span.lines().next().unwrap_or_default();
                    ctx.skip(format!(
                        "{grammar:?} marker '{first_line}' overlaps an earlier marker"
                    ));
                } else {
                    accepted.push(found);
                }
            }
        }

        drop(lines);

        accepted.sort_by_key(|found| found.range.start);
        let markers: Vec<MediaMarker> = accepted.into_iter().map(|f| f.marker).collect();

        info!("{} markers found", markers.len());
        for (i, marker) in markers.iter().enumerate() {
            debug!("Marker {}: {marker}", i + 1);
        }

        ParsedDocument {
            markers,
            text,
            issues: ctx.issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::types::{Alignment, MarkerKind};

    fn parse(text: &str) -> ParsedDocument {
        Parser::new(120).parse(&DocumentText::from_text(text))
    }

    #[test]
    fn screenshot_with_alignment() {
        let parsed = parse(r#"[SCREENSHOT timestamp="1:30" align="left"]Caption A"#);
        assert_eq!(parsed.markers.len(), 1);

        let marker = &parsed.markers[0];
        assert_eq!(marker.kind, MarkerKind::Screenshot);
        assert_eq!(marker.timestamp, 90);
        assert_eq!(marker.alignment, Alignment::Left);
        assert_eq!(marker.caption, "Caption A");
        assert_eq!(marker.duration, None);
    }

    #[test]
    fn clip_defaults_to_center() {
        let parsed = parse(r#"[CLIP timestamp="00:02:00" duration="15"]Intro"#);
        assert_eq!(parsed.markers.len(), 1);

        let marker = &parsed.markers[0];
        assert_eq!(marker.kind, MarkerKind::Clip);
        assert_eq!(marker.timestamp, 120);
        assert_eq!(marker.duration, Some(15));
        assert_eq!(marker.alignment, Alignment::Center);
        assert_eq!(marker.caption, "Intro");
    }

    #[test]
    fn markers_come_in_reading_order() {
        let parsed = parse(indoc! {r#"
            Intro text.

            [CLIP timestamp="10" duration="5"]First
            [SCREENSHOT timestamp="20"]Second [CLIP timestamp="30" duration="5" align=right]Third
        "#});

        let timestamps: Vec<u64> = parsed.markers.iter().map(|m| m.timestamp).collect();
        assert_eq!(timestamps, [10, 20, 30]);
        assert_eq!(parsed.markers[1].caption, "Second");
        assert_eq!(parsed.markers[2].alignment, Alignment::Right);
    }

    #[test]
    fn spans_are_substrings_of_the_text() {
        let parsed = parse(indoc! {r#"
            Look: [SCREENSHOT timestamp="4119.6" align="center"]Decimal
            #### Deep dive (3 minutes)
            STARTING TIMESTAMP: 00:10:00
            Some words.
        "#});

        assert_eq!(parsed.markers.len(), 2);
        for marker in &parsed.markers {
            assert!(parsed.text.contains(&marker.source_span), "{marker:?}");
        }
        assert_eq!(parsed.markers[0].timestamp, 4119);
        assert_eq!(parsed.markers[1].duration, Some(180));
    }

    #[test]
    fn malformed_markers_are_left_alone() {
        let parsed = parse(indoc! {r#"
            [CLIP timestamp="1:30"]No duration
            [SCREENSHOT timestamp="soon"]Bad time
            [SCREENSHOT timestamp="5"]Good
        "#});

        assert_eq!(parsed.markers.len(), 1);
        assert_eq!(parsed.markers[0].caption, "Good");
        assert_eq!(parsed.issues.len(), 2, "{:?}", parsed.issues);
        assert!(parsed.issues[0].contains("without duration"));
        assert!(parsed.text.contains("[CLIP timestamp=\"1:30\"]No duration"));
    }

    #[test]
    fn sub_second_clips_are_still_parsed() {
        let parsed = parse(r#"[CLIP timestamp="5" duration="0"]Blink"#);
        assert_eq!(parsed.markers[0].duration, Some(0));
    }

    #[test]
    fn weaker_grammars_coexist() {
        let parsed = parse(indoc! {r#"
            [SCREENSHOT timestamp="1:00"]Inline shot

            SEGMENT: Opening | TIME: 0:30 | DURATION: 1 minute

            ## Best moment -- 0:45
            🔹 **STARTING TIMESTAMP:** 00:05:00
        "#});

        let kinds: Vec<(MarkerKind, u64)> =
            parsed.markers.iter().map(|m| (m.kind, m.timestamp)).collect();
        assert_eq!(
            kinds,
            [
                (MarkerKind::Screenshot, 60),
                (MarkerKind::Clip, 30),
                (MarkerKind::Clip, 300),
            ]
        );
    }

    #[test]
    fn a_segment_and_the_screenshot_under_it_both_survive() {
        let parsed = parse(indoc! {r#"
            SEGMENT: Intro | TIME: 1:00 | DURATION: 30
            [SCREENSHOT timestamp="70"]Shot inside
        "#});

        let kinds: Vec<(MarkerKind, u64)> =
            parsed.markers.iter().map(|m| (m.kind, m.timestamp)).collect();
        assert_eq!(kinds, [(MarkerKind::Clip, 60), (MarkerKind::Screenshot, 70)]);
        assert_eq!(parsed.markers[0].duration, Some(30));
        assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
    }

    #[test]
    fn overlapping_markers_are_reported() {
        let parsed = parse(r#"SEGMENT: Intro [SCREENSHOT timestamp="70"]Shot | TIME: 1:00"#);

        assert_eq!(parsed.markers.len(), 1);
        assert_eq!(parsed.markers[0].kind, MarkerKind::Screenshot);
        assert_eq!(parsed.issues.len(), 1);
        assert!(parsed.issues[0].contains("overlaps"), "{:?}", parsed.issues);
    }

    #[test]
    fn pasted_segments_run_alone() {
        let parsed = parse(indoc! {r#"
            Segment 1: Welcome (2 minutes)
            STARTING TIMESTAMP: 00:00:10
            The host says hello.

            Segment 2: Demo
            STARTING TIMESTAMP: 00:04:00
            [SCREENSHOT timestamp="1:00"]Ignored here
        "#});

        assert_eq!(parsed.markers.len(), 2);
        assert!(parsed.markers.iter().all(|m| m.kind == MarkerKind::Clip));
        assert_eq!(parsed.markers[0].duration, Some(120));
        assert_eq!(parsed.markers[1].timestamp, 240);
        assert_eq!(parsed.markers[1].duration, Some(120));
    }

    #[test]
    fn detection_without_signal_selects_nothing() {
        let text = "Just a plain article.\n\n# Heading";
        let lines = index_lines(text);
        assert!(Grammar::detect(text, &lines).is_empty());
    }
}
