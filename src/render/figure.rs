use std::borrow::Cow;

use crate::types::{Alignment, MarkerKind};

/// Figures styling, shared by every generated article
pub const STYLESHEET: &str = "\
figure {
    margin: 2em auto;
    text-align: center;
}

figure.align-center {
    width: 100%;
}

figure.align-left {
    float: left;
    width: 50%;
    margin: 0.5em 1.5em 1em 0;
}

figure.align-right {
    float: right;
    width: 50%;
    margin: 0.5em 0 1em 1.5em;
}

figure img,
figure video {
    max-width: 100%;
    height: auto;
}

figcaption {
    color: #666;
    font-size: 0.9em;
    margin-top: 0.5em;
}

h1, h2, h3, h4, h5, h6 {
    clear: both;
}
";

/// A `<figure>` holding an image or a video, on a single line
pub fn figure_html(kind: MarkerKind, href: &str, alignment: Alignment, caption: &str) -> String {
    let href = escape_attr(href);
    let caption = caption.trim();

    let media = match kind {
        MarkerKind::Screenshot => {
            format!(r#"<img src="{href}" alt="{}">"#, escape_attr(caption))
        }
        MarkerKind::Clip => format!(
            r#"<video controls preload="metadata"><source src="{href}" type="video/mp4">Your browser does not support the video tag.</video>"#
        ),
    };

    let figcaption = if caption.is_empty() {
        String::new()
    } else {
        format!("<figcaption>{}</figcaption>", escape_text(caption))
    };

    format!(
        r#"<figure class="align-{}">{media}{figcaption}</figure>"#,
        alignment.as_str()
    )
}

/// Escape text content. Quotes are kept as written.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    )
}

/// Escape an attribute value
pub fn escape_attr(text: &str) -> Cow<'_, str> {
    let text = escape_text(text);
    if text.contains('"') {
        Cow::Owned(text.replace('"', "&quot;"))
    } else {
        text
    }
}
