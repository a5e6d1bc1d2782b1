use tracing::debug;

use super::{Found, Line, ScanContext};
use crate::{
    my_regex::{
        header_block_re, labeled_duration_re, labeled_time_re, labeled_title_re,
        paren_duration_re, relaxed_marker_re, starting_timestamp_re,
    },
    result::Result,
    types::{
        timestamp::{parse_duration, parse_time},
        Alignment, MediaMarker,
    },
};

/// Value after the first colon of a `KEY: value` field
fn field_value(field: &str) -> &str {
    field.split_once(':').map_or(field, |(_, v)| v).trim()
}

fn is_keyword_line(line: &str) -> bool {
    labeled_title_re().is_match(line)
        || labeled_time_re().is_match(line)
        || labeled_duration_re().is_match(line)
}

/// A bracket marker line belongs to the inline grammar, never to a description
fn holds_marker(line: &str) -> bool {
    relaxed_marker_re().is_match(line)
}

/// Join a title and an optional description into a caption
pub(super) fn caption_of(title: &str, description: &[&str]) -> String {
    let description = description.join(" ");
    if description.is_empty() {
        title.to_owned()
    } else if title.is_empty() {
        description
    } else {
        format!("{title} - {description}")
    }
}

/// Duration written in the `(N minutes)` parentheses of a title, if any
pub(super) fn paren_duration(title: &str) -> Option<Result<u64>> {
    paren_duration_re()
        .captures(title)
        .map(|cap| parse_duration(&cap["duration"]))
}

/// Title without its `(N minutes)` parentheses
pub(super) fn strip_paren_duration(title: &str) -> String {
    paren_duration_re().replace(title, "").trim().to_owned()
}

/// `SEGMENT: Title` blocks, with the `TIME:` and `DURATION:` fields either
/// joined on the same line by pipes or on the following lines.
/// Non-keyword lines up to the next blank line form the description.
pub(super) fn scan_labeled(text: &str, lines: &[Line<'_>], ctx: &mut ScanContext) -> Vec<Found> {
    let mut found = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].text;
        if !labeled_title_re().is_match(line) {
            i += 1;
            continue;
        }

        let first = i;
        let parts: Vec<&str> = line.split('|').map(str::trim).collect();
        let title = field_value(parts[0]);

        let (time_field, duration_field) = if parts.len() > 1 {
            let time = parts[1..]
                .iter()
                .find(|p| labeled_time_re().is_match(p))
                .copied();
            let duration = parts[1..]
                .iter()
                .find(|p| labeled_duration_re().is_match(p))
                .copied();
            (time, duration)
        } else {
            let next_is = |idx: usize, re: &regex::Regex| {
                lines.get(idx).map(|l| l.text).filter(|l| re.is_match(l))
            };
            let time = next_is(i + 1, labeled_time_re());
            if time.is_some() {
                i += 1;
            }
            let duration = time.and_then(|_| next_is(i + 1, labeled_duration_re()));
            if duration.is_some() {
                i += 1;
            }
            (time, duration)
        };

        let Some(time_field) = time_field else {
            ctx.skip(format!("No time found for segment '{title}'"));
            i += 1;
            continue;
        };

        let mut description = Vec::new();
        while let Some(next) = lines.get(i + 1) {
            if next.is_blank() || is_keyword_line(next.text) || holds_marker(next.text) {
                break;
            }
            description.push(next.text.trim());
            i += 1;
        }
        let last = i;
        i += 1;

        let timestamp = match parse_time(field_value(time_field)) {
            Ok(t) => t,
            Err(err) => {
                ctx.skip(format!("{err} for segment '{title}'"));
                continue;
            }
        };
        let duration = match duration_field.map(|d| parse_duration(field_value(d))) {
            None => ctx.default_clip_secs,
            Some(Ok(d)) => d,
            Some(Err(err)) => {
                ctx.skip(format!("{err} for segment '{title}'"));
                continue;
            }
        };

        let caption = caption_of(title, &description);
        found.push(Found::from_lines(text, lines, first, last, |span| {
            MediaMarker::clip(timestamp, duration, Alignment::Center, &caption, span)
        }));
    }

    found
}

/// `#### Title (N minutes)` blocks followed by a `STARTING TIMESTAMP:` line
/// and a free description, up to the next blank line.
/// A header without a timestamp is an ordinary heading and is left alone.
pub(super) fn scan_headers(text: &str, lines: &[Line<'_>], ctx: &mut ScanContext) -> Vec<Found> {
    let mut found = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(cap) = header_block_re().captures(lines[i].text) else {
            i += 1;
            continue;
        };
        let raw_title = cap["title"].trim();

        let first = i;
        let mut time_text = None;
        let mut description = Vec::new();
        while let Some(next) = lines.get(i + 1) {
            if next.is_blank() || header_block_re().is_match(next.text) || holds_marker(next.text)
            {
                break;
            }
            match starting_timestamp_re().captures(next.text) {
                Some(ts) => time_text = Some(ts.name("time").unwrap().as_str()),
                None => description.push(next.text.trim()),
            }
            i += 1;
        }
        let last = i;
        i += 1;

        let Some(time_text) = time_text else {
            debug!("Header '{raw_title}' has no starting timestamp, not a segment");
            continue;
        };

        let timestamp = match parse_time(time_text) {
            Ok(t) => t,
            Err(err) => {
                ctx.skip(format!("{err} for segment '{raw_title}'"));
                continue;
            }
        };
        let duration = match paren_duration(raw_title) {
            None => ctx.default_clip_secs,
            Some(Ok(d)) => d,
            Some(Err(err)) => {
                ctx.skip(format!("{err} for segment '{raw_title}'"));
                continue;
            }
        };

        let caption = caption_of(&strip_paren_duration(raw_title), &description);
        found.push(Found::from_lines(text, lines, first, last, |span| {
            MediaMarker::clip(timestamp, duration, Alignment::Center, &caption, span)
        }));
    }

    found
}
