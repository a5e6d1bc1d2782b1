use super::{blocks::caption_of, Found, Line, ScanContext};
use crate::{
    my_regex::{highlight_description_re, highlight_header_re, highlight_timestamp_re},
    types::{
        timestamp::{parse_duration, parse_time},
        Alignment, MediaMarker,
    },
};

/// Highlight-reel blocks:
///
/// ```text
/// ## Title -- 02:00
/// 🔹 **STARTING TIMESTAMP:** 00:14:05
/// 🔹 **CONTENT DESCRIPTION:** What happens
/// ```
///
/// The header carries the duration, the description bullet is optional.
pub(super) fn scan(text: &str, lines: &[Line<'_>], ctx: &mut ScanContext) -> Vec<Found> {
    let mut found = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(header) = highlight_header_re().captures(lines[i].text) else {
            i += 1;
            continue;
        };
        let title = header["title"].trim();

        let first = i;
        let mut time_text = None;
        let mut description = Vec::new();
        while let Some(next) = lines.get(i + 1) {
            if let Some(cap) = highlight_timestamp_re().captures(next.text) {
                time_text = Some(cap.name("time").unwrap().as_str());
            } else if let Some(cap) = highlight_description_re().captures(next.text) {
                description.push(cap.name("desc").unwrap().as_str().trim());
            } else {
                break;
            }
            i += 1;
        }
        let last = i;
        i += 1;

        let Some(time_text) = time_text else {
            ctx.skip(format!("No starting timestamp for highlight '{title}'"));
            continue;
        };

        let parsed = parse_time(time_text)
            .and_then(|t| Ok((t, parse_duration(&header["duration"])?)));
        let (timestamp, duration) = match parsed {
            Ok(v) => v,
            Err(err) => {
                ctx.skip(format!("{err} for highlight '{title}'"));
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
