use std::sync::OnceLock;

use regex::Regex;

// Every marker grammar in one place, assembled from small named pieces

/// A double-quoted attribute value
macro_rules! quoted {
    ($name:literal) => {
        concat!(r#""(?P<"#, $name, r#">[^"]+)""#)
    };
}
/// The timestamp attribute
macro_rules! tstamp_attr {
    () => {
        concat!(r#"\s+timestamp=""#, r#"(?P<time>[^"]+)""#)
    };
}
/// The duration attribute, mandatory for clips
macro_rules! duration_attr {
    () => {
        concat!(r#"\s+duration="#, quoted!("duration"))
    };
}
/// An optional align attribute: `align="x"`, `align=x`, or nothing at all
macro_rules! opt_align {
    () => {
        r#"(?:\s+align\s*=?\s*"?(?P<align>[^"\]\s]+)"?)?\s*"#
    };
}
/// Everything after the closing bracket up to the next marker or the line end
macro_rules! caption {
    () => {
        r#"\](?P<caption>[^\[\n]*)"#
    };
}

/// Pattern 1: A clip, e.g. `[CLIP timestamp="1:30" duration="15" align="left"]Caption`
const CLIP: &str = concat!(r"\[CLIP", tstamp_attr!(), duration_attr!(), opt_align!(), caption!());

/// Pattern 2: A screenshot, e.g. `[SCREENSHOT timestamp="1:30" align=right]Caption`
const SCREENSHOT: &str = concat!(r"\[SCREENSHOT", tstamp_attr!(), opt_align!(), caption!());

/// Any bracket marker whatever its attributes look like, used to find
/// markers whose text drifted from what was parsed
const RELAXED_MARKER: &str =
    concat!(r"\[(?P<kind>CLIP|SCREENSHOT)(?P<attrs>(?:\s[^\]\n]*)?)", caption!());

/// One `key=value` pair inside the attributes of a relaxed marker
const ATTRIBUTE: &str = r#"(?P<key>timestamp|duration|align)\s*=\s*"?(?P<value>[^"\s\]]+)"?"#;

/// `SEGMENT: Title` or `TITLE: Title`, possibly followed by `| TIME: ... | DURATION: ...`
const LABELED_TITLE: &str = r"(?i)^(?:segment|title)\s*:";
const LABELED_TIME: &str = r"(?i)^(?:time|timestamp)\s*:";
const LABELED_DURATION: &str = r"(?i)^duration\s*:";

/// `#### Title (3 minutes)`
const HEADER_BLOCK: &str = r"^####\s*(?P<title>.+)$";
const PAREN_DURATION: &str =
    r"(?i)\((?P<duration>\d+(?:\.\d+)?\s*(?:minutes?|mins?|seconds?|secs?)|\d+(?::\d+)+)\)";
const STARTING_TIMESTAMP: &str = r"^STARTING TIMESTAMP:\s*(?P<time>\S+)";

/// `## Title -- 2:00` followed by emoji bullets
const HIGHLIGHT_HEADER: &str = r"^##\s+(?P<title>.+?)\s+--\s+(?P<duration>\d+(?::\d+)*)\s*$";
const HIGHLIGHT_TIMESTAMP: &str =
    r"^🔹\s*\*\*STARTING TIMESTAMP:\*\*\s*(?P<time>\d+(?::\d+)*(?:\.\d+)?)";
const HIGHLIGHT_DESCRIPTION: &str = r"^🔹\s*\*\*CONTENT DESCRIPTION:\*\*\s*(?P<desc>.*)$";

/// `Segment 3: Title (2 minutes)`, optionally behind markdown hashes
const SEGMENT_HEADER: &str = r"(?i)^#{0,6}\s*(?P<title>segment\s+\d+\b.*)$";
/// Any markdown header, ending a pasted segment
const ANY_HEADER: &str = r"^#{1,6}\s";
/// A free `TIME:`/`TIMESTAMP:`/`STARTING TIMESTAMP:` line inside a pasted segment
const SEGMENT_TIME: &str = r"(?i)^(?:starting\s+)?(?:time|timestamp)\s*:\s*(?P<time>\S+)";

/// `2 minutes`, `1.5 hrs`, `30 secs`, the amount not glued to a word or a dot
const DURATION_WORDS: &str = concat!(
    r"(?i)(?:^|[^\w.])(?P<n>\d+(?:\.\d+)?)\s*",
    r"(?P<unit>hours?|hrs?|minutes?|mins?|seconds?|secs?)\b"
);

// Article markdown

/// Backslash escapes left by Word exports: `\#`, `\1.`, `\-`
const ESCAPED: &str = r"\\([#.\-])";
const HEADING: &str = r"^(?P<hashes>#{1,6})\s+(?P<text>.+?)\s*#*$";
const NUMBERED_ITEM: &str = r"^(?P<n>\d+)[.)]\s+(?P<text>.*)$";
const BULLET_ITEM: &str = r"^[-*•]\s+(?P<text>.*)$";
const BOLD: &str = r"\*\*(?P<t>[^*\n]+?)\*\*";
const ITALIC: &str = r"\*(?P<t>[^*\s][^*\n]*?)\*";
/// A figure placeholder, the number between two U+FFFC
const FIGURE_REF: &str = "\u{FFFC}(?P<n>\\d+)\u{FFFC}";
/// HTML the author wrote that must not be wrapped in a paragraph
const BLOCK_TAG: &str = r"(?i)<(?:h[1-6]|ul|ol|li|figure|div|table|blockquote|pre|p)[\s>]";

macro_rules! lazy_re {
    ($fn_name:ident, $pattern:expr) => {
        pub fn $fn_name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).unwrap())
        }
    };
}

lazy_re!(clip_re, CLIP);
lazy_re!(screenshot_re, SCREENSHOT);
lazy_re!(relaxed_marker_re, RELAXED_MARKER);
lazy_re!(attribute_re, ATTRIBUTE);
lazy_re!(labeled_title_re, LABELED_TITLE);
lazy_re!(labeled_time_re, LABELED_TIME);
lazy_re!(labeled_duration_re, LABELED_DURATION);
lazy_re!(header_block_re, HEADER_BLOCK);
lazy_re!(paren_duration_re, PAREN_DURATION);
lazy_re!(starting_timestamp_re, STARTING_TIMESTAMP);
lazy_re!(highlight_header_re, HIGHLIGHT_HEADER);
lazy_re!(highlight_timestamp_re, HIGHLIGHT_TIMESTAMP);
lazy_re!(highlight_description_re, HIGHLIGHT_DESCRIPTION);
lazy_re!(segment_header_re, SEGMENT_HEADER);
lazy_re!(any_header_re, ANY_HEADER);
lazy_re!(segment_time_re, SEGMENT_TIME);
lazy_re!(duration_words_re, DURATION_WORDS);
lazy_re!(escaped_re, ESCAPED);
lazy_re!(heading_re, HEADING);
lazy_re!(numbered_item_re, NUMBERED_ITEM);
lazy_re!(bullet_item_re, BULLET_ITEM);
lazy_re!(bold_re, BOLD);
lazy_re!(italic_re, ITALIC);
lazy_re!(figure_ref_re, FIGURE_REF);
lazy_re!(block_tag_re, BLOCK_TAG);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pattern_compiles() {
        for re in [
            clip_re(),
            screenshot_re(),
            relaxed_marker_re(),
            attribute_re(),
            labeled_title_re(),
            labeled_time_re(),
            labeled_duration_re(),
            header_block_re(),
            paren_duration_re(),
            starting_timestamp_re(),
            highlight_header_re(),
            highlight_timestamp_re(),
            highlight_description_re(),
            segment_header_re(),
            any_header_re(),
            segment_time_re(),
            duration_words_re(),
            escaped_re(),
            heading_re(),
            numbered_item_re(),
            bullet_item_re(),
            bold_re(),
            italic_re(),
            figure_ref_re(),
            block_tag_re(),
        ] {
            assert!(!re.as_str().is_empty());
        }
    }

    #[test]
    fn clip_requires_a_duration() {
        assert!(clip_re().is_match(r#"[CLIP timestamp="1:30" duration="15"]Intro"#));
        assert!(!clip_re().is_match(r#"[CLIP timestamp="1:30"]Intro"#));
        assert!(!clip_re().is_match(r#"[CLIP timestamp="1:30" align="left"]Intro"#));
    }

    #[test]
    fn align_accepts_both_spellings() {
        for text in [
            r#"[SCREENSHOT timestamp="10" align="right"]x"#,
            r#"[SCREENSHOT timestamp="10" align=right]x"#,
        ] {
            let cap = screenshot_re().captures(text).unwrap();
            assert_eq!(&cap["align"], "right");
        }
    }

    #[test]
    fn captions_stop_at_the_next_marker() {
        let text = r#"[SCREENSHOT timestamp="1"]One [SCREENSHOT timestamp="2"]Two"#;
        let captions: Vec<_> = screenshot_re()
            .captures_iter(text)
            .map(|c| c["caption"].trim().to_owned())
            .collect();
        assert_eq!(captions, ["One", "Two"]);
    }
}
