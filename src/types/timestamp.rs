use crate::{
    my_regex::duration_words_re,
    result::{Error, Result},
};

/// Parse a point in time into whole seconds.
///
/// Accepted shapes: bare seconds (`"90"`), `M:SS` and `H:MM:SS`. A fraction
/// of second is truncated (`"4119.6"`, `"00:14:05.5"`).
/// Anything else is a [`Error::MalformedTimestamp`].
pub fn parse_time(text: &str) -> Result<u64> {
    let text = text.trim();
    parse_clock(text).ok_or_else(|| Error::MalformedTimestamp(text.to_owned()))
}

/// Parse a length of time into whole seconds.
///
/// Accepts every shape of [`parse_time`] as well as free text such as
/// `"2 minutes"`, `"1.5 minutes"` or `"1 minute 30 seconds"`, where the parts
/// are summed and the total truncated to the second.
pub fn parse_duration(text: &str) -> Result<u64> {
    let trimmed = text.trim();
    if let Some(secs) = parse_clock(trimmed) {
        return Ok(secs);
    }

    let malformed = || Error::MalformedDuration(trimmed.to_owned());
    let mut total: Option<u64> = None;
    for cap in duration_words_re().captures_iter(trimmed) {
        let unit = cap["unit"].to_lowercase();
        let factor: u64 = if unit.starts_with('h') {
            3600
        } else if unit.starts_with('m') {
            60
        } else {
            1
        };

        let (int, frac) = match cap["n"].split_once('.') {
            Some((int, frac)) => (int, Some(frac)),
            None => (&cap["n"], None),
        };
        let whole: u64 = int.parse().map_err(|_| malformed())?;
        let mut secs = whole.checked_mul(factor).ok_or_else(malformed)?;
        if let Some(frac) = frac {
            let frac: f64 = format!("0.{frac}").parse().map_err(|_| malformed())?;
            secs = secs
                .checked_add((frac * factor as f64) as u64)
                .ok_or_else(malformed)?;
        }

        total = Some(
            total
                .unwrap_or(0)
                .checked_add(secs)
                .ok_or_else(malformed)?,
        );
    }

    total.ok_or_else(malformed)
}

/// Format seconds as `H:MM:SS`, hours not padded (`90` -> `0:01:30`)
pub fn format_hms(secs: u64) -> String {
    format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Same as [`format_hms`] but usable in a file name (`90` -> `0-01-30`)
pub fn format_file_hms(secs: u64) -> String {
    format_hms(secs).replace(':', "-")
}

fn parse_clock(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }

    let Some((clock, seconds)) = text.rsplit_once(':') else {
        return parse_seconds(text);
    };

    let parts: Vec<&str> = clock.split(':').collect();
    if parts.len() > 2 || parts.iter().any(|p| !is_digits(p)) {
        return None;
    }

    let mut secs: u64 = 0;
    for part in parts {
        secs = secs.checked_mul(60)?.checked_add(part.parse().ok()?)?;
    }
    secs.checked_mul(60)?.checked_add(parse_seconds(seconds)?)
}

/// Bare seconds, decimals being truncated
fn parse_seconds(text: &str) -> Option<u64> {
    match text.split_once('.') {
        None if is_digits(text) => text.parse().ok(),
        Some((int, frac)) if is_digits(int) && (frac.is_empty() || is_digits(frac)) => {
            int.parse().ok()
        }
        _ => None,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
