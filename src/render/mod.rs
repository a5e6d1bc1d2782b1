//! Article reassembly: markers are swapped for figures, then the markdown
//! structure of the text is turned into HTML.

mod figure;
mod markdown;
mod resolve;

use tracing::{debug, info};

pub use figure::STYLESHEET;
pub use resolve::RenderingGap;

use crate::{media_index::MediaIndex, types::MediaMarker};

use self::figure::escape_text;

/// Body of the article and the markers left unresolved in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub gaps: Vec<RenderingGap>,
}

#[derive(Debug)]
pub struct Renderer<'a> {
    index: &'a MediaIndex,
    /// Largest timestamp difference, in seconds, for a drifted marker to
    /// still match
    tolerance: u64,
}

impl<'a> Renderer<'a> {
    pub fn new(index: &'a MediaIndex, tolerance: u64) -> Self {
        Self { index, tolerance }
    }

    /// Render the text the markers were parsed from. The output only depends
    /// on the inputs.
    pub fn render(&self, text: &str, markers: &[MediaMarker]) -> Rendered {
        let resolved = resolve::Resolver::new(self.index, self.tolerance, text).resolve(markers);
        debug!(
            "{} figures placed, {} markers unresolved",
            resolved.figures.len(),
            resolved.gaps.len()
        );

        let text = markdown::unescape(&resolved.text);
        let html = markdown::to_html(&text, &resolved.figures);
        info!("Article rendered ({} bytes)", html.len());

        Rendered {
            html,
            gaps: resolved.gaps,
        }
    }
}

/// Wrap an article body into the final file content
pub fn page(title: &str, body: &str, standalone: bool) -> String {
    if !standalone {
        return format!("<style>\n{STYLESHEET}</style>\n{body}\n");
    }

    format!(
        "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
<title>{}</title>
<style>
{STYLESHEET}</style>
</head>
<body>
<article>
{body}
</article>
</body>
</html>
",
        escape_text(title)
    )
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::{parser::Parser, types::MarkerKind};

    const DOCUMENT: &str = indoc! {r#"
        # Match report

        The kick off [SCREENSHOT timestamp="1:30" align="left"]Kick off
        Key moments:
        1. Opening goal
        2. Red card

        1. Second half
        [CLIP timestamp="00:02:00" duration="15"]Intro
    "#};

    fn index() -> MediaIndex {
        let mut index = MediaIndex::new("match", "match");
        index.insert("match_screenshot_001_at_0-01-30.jpg");
        index.insert("match_clip_from_0-02-00_duration_0-00-15.mp4");
        index
    }

    #[test]
    fn full_article() {
        let parsed = Parser::new(120).parse_text(DOCUMENT.to_owned());
        let index = index();
        let rendered = Renderer::new(&index, 5).render(&parsed.text, &parsed.markers);

        assert!(rendered.gaps.is_empty());
        assert_eq!(
            rendered.html,
            indoc! {r#"
                <h1 id="match-report">Match report</h1>
                <p>The kick off</p>
                <figure class="align-left"><img src="match/match_screenshot_001_at_0-01-30.jpg" alt="Kick off"><figcaption>Kick off</figcaption></figure>
                <p>Key moments:</p>
                <ol>
                <li value="1">Opening goal</li>
                <li value="2">Red card</li>
                </ol>
                <ol>
                <li value="1">Second half</li>
                </ol>
                <figure class="align-center"><video controls preload="metadata"><source src="match/match_clip_from_0-02-00_duration_0-00-15.mp4" type="video/mp4">Your browser does not support the video tag.</video><figcaption>Intro</figcaption></figure>"#}
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let parsed = Parser::new(120).parse_text(DOCUMENT.to_owned());
        let index = index();
        let renderer = Renderer::new(&index, 5);

        let first = renderer.render(&parsed.text, &parsed.markers);
        let second = renderer.render(&parsed.text, &parsed.markers);
        assert_eq!(first, second);
    }

    #[test]
    fn drifted_marker_never_leaks() {
        let parsed = Parser::new(120).parse_text(DOCUMENT.to_owned());
        let edited = parsed.text.replace(
            r#"[SCREENSHOT timestamp="1:30" align="left"]Kick off"#,
            r#"[SCREENSHOT timestamp="1:34" align="left"]Kick-off!"#,
        );
        let index = index();
        let rendered = Renderer::new(&index, 5).render(&edited, &parsed.markers);

        assert!(!rendered.html.contains("[SCREENSHOT"));
        assert!(rendered.html.contains("match_screenshot_001_at_0-01-30.jpg"));
        assert!(rendered.html.contains("<figcaption>Kick-off!</figcaption>"));
    }

    #[test]
    fn missing_media_is_reported_and_left_as_written() {
        let text = r#"Look [SCREENSHOT timestamp="9"]Gone"#;
        let parsed = Parser::new(120).parse_text(text.to_owned());
        let index = MediaIndex::new("match", "match");
        let rendered = Renderer::new(&index, 5).render(&parsed.text, &parsed.markers);

        assert_eq!(rendered.gaps.len(), 1);
        assert_eq!(rendered.gaps[0].kind, MarkerKind::Screenshot);
        assert_eq!(rendered.html, format!("<p>{text}</p>"));
    }

    #[test]
    fn page_wrapping() {
        let full = page("A & B", "<p>x</p>", true);
        assert!(full.starts_with("<!DOCTYPE html>"));
        assert!(full.contains("<title>A &amp; B</title>"));
        assert!(full.contains("<article>\n<p>x</p>\n</article>"));

        let fragment = page("A", "<p>x</p>", false);
        assert!(fragment.starts_with("<style>\nfigure {"));
        assert!(fragment.ends_with("</style>\n<p>x</p>\n"));
    }
}
