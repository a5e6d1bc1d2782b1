use regex::Captures;

use super::{Found, ScanContext};
use crate::{
    my_regex::{attribute_re, clip_re, relaxed_marker_re, screenshot_re},
    result::Result,
    types::{
        timestamp::{parse_duration, parse_time},
        Alignment, MediaMarker,
    },
};

/// Find every bracket marker. A clip without a `duration` attribute never
/// matches: it stays in the text as written and is reported.
pub(super) fn scan(text: &str, ctx: &mut ScanContext) -> Vec<Found> {
    for cap in relaxed_marker_re().captures_iter(text) {
        let has_duration = attribute_re()
            .captures_iter(&cap["attrs"])
            .any(|attr| &attr["key"] == "duration");
        if &cap["kind"] == "CLIP" && !has_duration {
            ctx.skip(format!("Clip without duration in '{}'", &cap[0]));
        }
    }

    let clips = clip_re().captures_iter(text).filter_map(|cap| {
        let found = build(&cap, |span| {
            let timestamp = parse_time(&cap["time"])?;
            let duration = parse_duration(&cap["duration"])?;
            Ok(MediaMarker::clip(
                timestamp,
                duration,
                alignment(&cap),
                &cap["caption"],
                span,
            ))
        });
        keep(found, &cap, ctx)
    });
    let mut found: Vec<Found> = clips.collect();

    let screenshots: Vec<Found> = screenshot_re()
        .captures_iter(text)
        .filter_map(|cap| {
            let found = build(&cap, |span| {
                let timestamp = parse_time(&cap["time"])?;
                Ok(MediaMarker::screenshot(
                    timestamp,
                    alignment(&cap),
                    &cap["caption"],
                    span,
                ))
            });
            keep(found, &cap, ctx)
        })
        .collect();

    found.extend(screenshots);
    found
}

fn alignment(cap: &Captures<'_>) -> Alignment {
    Alignment::parse_lenient(cap.name("align").map(|m| m.as_str()))
}

fn build<F>(cap: &Captures<'_>, f: F) -> Result<Found>
where
    F: FnOnce(&str) -> Result<MediaMarker>,
{
    let whole = cap.get(0).unwrap();
    let marker = f(whole.as_str())?;
    Ok(Found {
        range: whole.range(),
        marker,
    })
}

fn keep(found: Result<Found>, cap: &Captures<'_>, ctx: &mut ScanContext) -> Option<Found> {
    match found {
        Ok(found) => Some(found),
        Err(err) => {
            ctx.skip(format!("{err} in '{}'", &cap[0]));
            None
        }
    }
}
