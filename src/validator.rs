use std::collections::HashSet;

use tracing::warn;

use crate::{
    my_regex::{attribute_re, relaxed_marker_re},
    types::{timestamp::parse_time, MarkerKind, MediaMarker},
};

/// Flag suspicious markers. Never fails and never touches the markers: every
/// marker flagged here is still extracted.
pub fn validate(markers: &[MediaMarker]) -> Vec<String> {
    let mut warnings = Vec::new();
    let mut seen: HashSet<(MarkerKind, u64)> = HashSet::new();

    for marker in markers {
        if !seen.insert((marker.kind, marker.timestamp)) {
            warnings.push(format!(
                "Duplicate timestamp {}s found for {} markers",
                marker.timestamp, marker.kind
            ));
        }

        if marker.kind == MarkerKind::Clip {
            match marker.duration {
                Some(d) if d < 1 => warnings.push(format!(
                    "Clip at {}s has a duration less than 1 second",
                    marker.timestamp
                )),
                Some(_) => {}
                None => warnings.push(format!(
                    "Clip at {}s has no duration",
                    marker.timestamp
                )),
            }
        }

        if let Some(stored) = stored_timestamp(&marker.source_span) {
            if parse_time(stored).is_err() {
                warnings.push(format!(
                    "Unparsable timestamp '{stored}' in '{}'",
                    marker.source_span
                ));
            }
        }
    }

    for warning in &warnings {
        warn!("{warning}");
    }
    warnings
}

/// The raw `timestamp` attribute of a bracket marker span
fn stored_timestamp(span: &str) -> Option<&str> {
    let cap = relaxed_marker_re().captures(span)?;
    let attrs = cap.name("attrs")?.as_str();
    attribute_re()
        .captures_iter(attrs)
        .find(|a| &a["key"] == "timestamp")
        .and_then(|a| a.name("value"))
        .map(|v| v.as_str())
}
