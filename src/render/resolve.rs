//! Marker to media file resolution.
//!
//! Every resolved marker is swapped for a placeholder in the working text,
//! the figures themselves are kept aside until the markdown pass is done.
//!
//! 1. Exact: the marker source span is still in the text and the file the
//!    extraction gives to the marker exists.
//! 2. Proximity: the span drifted, but a bracket marker of the same kind with
//!    a timestamp within the tolerance is still in the text.
//! 3. Positional: bracket markers still in the text get the files of their
//!    kind no marker claimed yet, sorted by name, in order.
//!
//! What is left is a [`RenderingGap`] and stays in the text as written.

use std::{collections::HashSet, fmt::Display, ops::Range};

use tracing::{debug, warn};

use super::figure::figure_html;
use crate::{
    media_index::MediaIndex,
    my_regex::{attribute_re, relaxed_marker_re},
    types::{
        timestamp::{format_hms, parse_time},
        Alignment, MarkerKind, MediaMarker,
    },
};

/// Stands for a figure in the working text, see [`placeholder`]
pub(super) const FIGURE_MARK: char = '\u{FFFC}';

pub(super) fn placeholder(n: usize) -> String {
    format!("{FIGURE_MARK}{n}{FIGURE_MARK}")
}

/// A marker no media file could be found for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderingGap {
    pub kind: MarkerKind,
    pub timestamp: Option<u64>,
    /// Text left in the article
    pub span: String,
}

impl Display for RenderingGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "No media file for the {} marker", self.kind)?;
        if let Some(t) = self.timestamp {
            write!(f, " at {}", format_hms(t))?;
        }
        write!(f, ": '{}'", self.span)
    }
}

/// Working text with its figures taken out
#[derive(Debug, Default)]
pub(super) struct Resolved {
    pub text: String,
    pub figures: Vec<String>,
    pub gaps: Vec<RenderingGap>,
}

/// A bracket marker as currently written in the text
#[derive(Debug)]
struct Occurrence {
    range: Range<usize>,
    kind: MarkerKind,
    timestamp: Option<u64>,
    alignment: Alignment,
    caption: String,
}

fn occurrences(text: &str) -> Vec<Occurrence> {
    relaxed_marker_re()
        .captures_iter(text)
        .map(|cap| {
            let kind = match &cap["kind"] {
                "CLIP" => MarkerKind::Clip,
                _ => MarkerKind::Screenshot,
            };
            let mut timestamp = None;
            let mut alignment = None;
            for attr in attribute_re().captures_iter(&cap["attrs"]) {
                match &attr["key"] {
                    "timestamp" => timestamp = parse_time(&attr["value"]).ok(),
                    "align" => alignment = Some(attr["value"].to_owned()),
                    _ => {}
                }
            }
            Occurrence {
                range: cap.get(0).map(|m| m.range()).unwrap_or_default(),
                kind,
                timestamp,
                alignment: Alignment::parse_lenient(alignment.as_deref()),
                caption: cap["caption"].trim().to_owned(),
            }
        })
        .collect()
}

pub(super) struct Resolver<'a> {
    index: &'a MediaIndex,
    tolerance: u64,
    used: HashSet<String>,
    out: Resolved,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a MediaIndex, tolerance: u64, text: &str) -> Self {
        Self {
            index,
            tolerance,
            used: HashSet::new(),
            out: Resolved {
                text: text.to_owned(),
                ..Default::default()
            },
        }
    }

    pub fn resolve(mut self, markers: &[MediaMarker]) -> Resolved {
        let mut seqs = [0usize; 2];
        let mut pending = Vec::new();

        for marker in markers {
            let seq = &mut seqs[marker.kind as usize];
            *seq += 1;

            // Identical clips share one file, so a file already claimed may
            // be claimed again by its own marker
            let file = self.index.expected_file_name(*seq, marker);
            let resolved = self.index.contains(marker.kind, &file)
                && (self.exact(marker, &file) || self.proximity(marker, &file));
            if !resolved {
                pending.push(marker);
            }
        }

        self.positional();

        // Block markers the positional pass cannot see
        for marker in pending {
            let in_text = self.out.text.contains(&marker.source_span);
            if in_text && !relaxed_marker_re().is_match(&marker.source_span) {
                self.gap(RenderingGap {
                    kind: marker.kind,
                    timestamp: Some(marker.timestamp),
                    span: marker.source_span.clone(),
                });
            }
        }

        self.out
    }

    fn exact(&mut self, marker: &MediaMarker, file: &str) -> bool {
        let span = marker.source_span.as_str();
        let Some(start) = self.out.text.find(span).filter(|_| !span.is_empty()) else {
            return false;
        };

        let figure = self.figure(marker.kind, file, marker.alignment, &marker.caption);
        self.replace(start..start + span.len(), figure, file);
        true
    }

    fn proximity(&mut self, marker: &MediaMarker, file: &str) -> bool {
        let found = occurrences(&self.out.text).into_iter().find(|occ| {
            occ.kind == marker.kind
                && occ
                    .timestamp
                    .is_some_and(|t| t.abs_diff(marker.timestamp) <= self.tolerance)
        });
        let Some(occ) = found else {
            return false;
        };

        debug!(
            "{} marker at {}s found by proximity at {:?}s",
            marker.kind, marker.timestamp, occ.timestamp
        );
        let figure = self.figure(occ.kind, file, occ.alignment, &occ.caption);
        self.replace(occ.range, figure, file);
        true
    }

    fn positional(&mut self) {
        let mut pools = [MarkerKind::Clip, MarkerKind::Screenshot].map(|kind| {
            self.index
                .files(kind)
                .filter(|f| !self.used.contains(*f))
                .map(str::to_owned)
                .collect::<Vec<_>>()
                .into_iter()
        });

        // Replacing shifts the ranges, walk the text backward once the
        // assignment order is settled
        let mut assigned = Vec::new();
        for occ in occurrences(&self.out.text) {
            match pools[occ.kind as usize].next() {
                Some(file) => assigned.push((occ, file)),
                None => {
                    let span = self.out.text[occ.range.clone()].to_owned();
                    self.gap(RenderingGap {
                        kind: occ.kind,
                        timestamp: occ.timestamp,
                        span,
                    });
                }
            }
        }

        // Figures are numbered in reading order
        let first = self.out.figures.len();
        for (occ, file) in &assigned {
            debug!("{} marker {:?} assigned {file} by position", occ.kind, occ.caption);
            let figure = self.figure(occ.kind, file, occ.alignment, &occ.caption);
            self.out.figures.push(figure);
            self.used.insert(file.clone());
        }
        for (i, (occ, _)) in assigned.iter().enumerate().rev() {
            self.out
                .text
                .replace_range(occ.range.clone(), &placeholder(first + i));
        }
    }

    fn figure(&self, kind: MarkerKind, file: &str, alignment: Alignment, caption: &str) -> String {
        figure_html(kind, &self.index.href(file), alignment, caption)
    }

    fn replace(&mut self, range: Range<usize>, figure: String, file: &str) {
        let n = self.out.figures.len();
        self.out.figures.push(figure);
        self.out.text.replace_range(range, &placeholder(n));
        self.used.insert(file.to_owned());
    }

    fn gap(&mut self, gap: RenderingGap) {
        warn!("{gap}");
        self.out.gaps.push(gap);
    }
}
