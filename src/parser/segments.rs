use super::{
    blocks::{caption_of, paren_duration, strip_paren_duration},
    Found, Line, ScanContext,
};
use crate::{
    my_regex::{any_header_re, segment_header_re, segment_time_re},
    types::{timestamp::parse_time, Alignment, MediaMarker},
};

/// Pasted `Segment N: Title (N minutes)` paragraphs.
///
/// A segment runs until the next segment or markdown header. Its time comes
/// from a `STARTING TIMESTAMP:`/`TIMESTAMP:`/`TIME:` line, every other
/// non-empty line is description.
pub(super) fn scan(text: &str, lines: &[Line<'_>], ctx: &mut ScanContext) -> Vec<Found> {
    let mut found = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(header) = segment_header_re().captures(lines[i].text) else {
            i += 1;
            continue;
        };
        let raw_title = header["title"].trim();

        let first = i;
        let mut last = i;
        let mut time_text = None;
        let mut description = Vec::new();
        while let Some(next) = lines.get(i + 1) {
            if segment_header_re().is_match(next.text) || any_header_re().is_match(next.text) {
                break;
            }
            i += 1;
            if next.is_blank() {
                continue;
            }
            last = i;
            match segment_time_re().captures(next.text) {
                Some(cap) if time_text.is_none() => {
                    time_text = Some(cap.name("time").unwrap().as_str())
                }
                _ => description.push(next.text.trim()),
            }
        }
        i += 1;

        let title = strip_paren_duration(raw_title);
        let Some(time_text) = time_text else {
            ctx.skip(format!("No starting timestamp for '{title}'"));
            continue;
        };

        let timestamp = match parse_time(time_text) {
            Ok(t) => t,
            Err(err) => {
                ctx.skip(format!("{err} for '{title}'"));
                continue;
            }
        };
        let duration = match paren_duration(raw_title) {
            None => ctx.default_clip_secs,
            Some(Ok(d)) => d,
            Some(Err(err)) => {
                ctx.skip(format!("{err} for '{title}'"));
                continue;
            }
        };

        let caption = caption_of(&title, &description);
        found.push(Found::from_lines(text, lines, first, last, |span| {
            MediaMarker::clip(timestamp, duration, Alignment::Center, &caption, span)
        }));
    }

    found
}
