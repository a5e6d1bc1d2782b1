//! The little markdown an article is written in: ATX headings, bullet and
//! numbered lists, `**bold**`, `*italic*` and blank-line separated paragraphs.

use std::collections::HashMap;

use heck::ToKebabCase;

use super::resolve::FIGURE_MARK;
use crate::my_regex::{
    block_tag_re, bold_re, bullet_item_re, escaped_re, figure_ref_re, heading_re, italic_re,
    numbered_item_re,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bullet,
    Numbered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            ListKind::Bullet => "ul",
            ListKind::Numbered => "ol",
        }
    }
}

/// One line, or part of a line, of the article
#[derive(Debug, PartialEq, Eq)]
enum Piece<'t> {
    Blank,
    Figure(usize),
    Heading(usize, &'t str),
    Item(ListKind, Option<&'t str>, &'t str),
    Text(&'t str),
}

fn classify(line: &str) -> Piece<'_> {
    if line.is_empty() {
        Piece::Blank
    } else if let Some(cap) = heading_re().captures(line) {
        let level = cap.name("hashes").map_or(1, |m| m.len());
        Piece::Heading(level, cap.name("text").map_or("", |m| m.as_str()))
    } else if let Some(cap) = numbered_item_re().captures(line) {
        let n = cap.name("n").map(|m| m.as_str());
        Piece::Item(ListKind::Numbered, n, cap.name("text").map_or("", |m| m.as_str()))
    } else if let Some(cap) = bullet_item_re().captures(line) {
        Piece::Item(ListKind::Bullet, None, cap.name("text").map_or("", |m| m.as_str()))
    } else {
        Piece::Text(line)
    }
}

/// Split a line around its figure placeholders
fn split_figures(line: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for cap in figure_ref_re().captures_iter(line) {
        let Some(whole) = cap.get(0) else { continue };
        let Ok(n) = cap["n"].parse() else { continue };

        let before = line[last..whole.start()].trim();
        if !before.is_empty() {
            pieces.push(classify(before));
        }
        pieces.push(Piece::Figure(n));
        last = whole.end();
    }

    let rest = line[last..].trim();
    if !rest.is_empty() || pieces.is_empty() {
        pieces.push(classify(rest));
    }
    pieces
}

/// Escape `&` and `<` unless they already start an entity or a tag, so
/// that HTML typed by the author goes through
fn escape_loose(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        let rest = &text[i + c.len_utf8()..];
        match c {
            '<' if !starts_tag(rest) => out.push_str("&lt;"),
            '&' if !starts_entity(rest) => out.push_str("&amp;"),
            c => out.push(c),
        }
    }
    out
}

fn starts_tag(rest: &str) -> bool {
    rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!')
}

fn starts_entity(rest: &str) -> bool {
    let Some((name, _)) = rest.split_once(';') else {
        return false;
    };
    let name = name.strip_prefix('#').unwrap_or(name);
    !name.is_empty() && name.len() <= 10 && name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Escaped text with its inline emphasis turned into tags
fn inline(text: &str) -> String {
    let text = escape_loose(text);
    let text = bold_re().replace_all(&text, "<strong>$t</strong>");
    italic_re().replace_all(&text, "<em>$t</em>").into_owned()
}

#[derive(Debug, Default)]
struct Writer {
    blocks: Vec<String>,
    paragraph: Vec<String>,
    list: Option<ListKind>,
    after_blank: bool,
    ids: HashMap<String, usize>,
}

impl Writer {
    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let content = std::mem::take(&mut self.paragraph).join("\n");
        if block_tag_re().is_match(&content) {
            self.blocks.push(content);
        } else {
            self.blocks.push(format!("<p>{content}</p>"));
        }
    }

    fn close_list(&mut self) {
        if let Some(kind) = self.list.take() {
            self.blocks.push(format!("</{}>", kind.tag()));
        }
    }

    fn heading_id(&mut self, text: &str) -> String {
        let base = text.to_kebab_case();
        let base = if base.is_empty() { "section".to_owned() } else { base };
        let count = self.ids.entry(base.clone()).or_insert(0);
        *count += 1;
        match *count {
            1 => base,
            n => format!("{base}-{n}"),
        }
    }

    fn push(&mut self, piece: Piece<'_>, figures: &[String]) {
        match piece {
            Piece::Blank => {
                self.flush_paragraph();
                self.after_blank = true;
                return;
            }
            Piece::Figure(n) => {
                self.flush_paragraph();
                self.close_list();
                if let Some(figure) = figures.get(n) {
                    self.blocks.push(figure.clone());
                }
            }
            Piece::Heading(level, text) => {
                self.flush_paragraph();
                self.close_list();
                let id = self.heading_id(text);
                self.blocks
                    .push(format!(r#"<h{level} id="{id}">{}</h{level}>"#, inline(text)));
            }
            Piece::Item(kind, value, text) => {
                self.flush_paragraph();
                // A numbered item right after a blank line starts a new list
                let restart = kind == ListKind::Numbered && self.after_blank;
                if self.list != Some(kind) || restart {
                    self.close_list();
                    self.blocks.push(format!("<{}>", kind.tag()));
                    self.list = Some(kind);
                }
                let li = match value {
                    Some(n) => format!(r#"<li value="{n}">{}</li>"#, inline(text)),
                    None => format!("<li>{}</li>", inline(text)),
                };
                self.blocks.push(li);
            }
            Piece::Text(text) => {
                self.close_list();
                self.paragraph.push(inline(text));
            }
        }
        self.after_blank = false;
    }

    fn finish(mut self) -> String {
        self.flush_paragraph();
        self.close_list();
        self.blocks.join("\n")
    }
}

/// Undo the escaping added by Word markdown exports (`\#`, `1\.`)
pub(super) fn unescape(text: &str) -> String {
    escaped_re().replace_all(text, "$1").into_owned()
}

/// Turn the working text into HTML, the `n`-th figure placeholder being
/// replaced by `figures[n]`
pub(super) fn to_html(text: &str, figures: &[String]) -> String {
    let mut writer = Writer::default();
    for line in text.lines() {
        let line = line.trim();
        if line.contains(FIGURE_MARK) {
            for piece in split_figures(line) {
                writer.push(piece, figures);
            }
        } else {
            writer.push(classify(line), figures);
        }
    }
    writer.finish()
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::render::resolve::placeholder;

    #[test]
    fn restarted_numbering_makes_two_lists() {
        let html = to_html("1. A\n2. B\n\n1. C", &[]);
        assert_eq!(
            html,
            indoc! {r#"
                <ol>
                <li value="1">A</li>
                <li value="2">B</li>
                </ol>
                <ol>
                <li value="1">C</li>
                </ol>"#}
        );
    }

    #[test]
    fn original_numbers_are_kept() {
        let html = to_html("3. Three\n7. Seven", &[]);
        assert!(html.contains(r#"<li value="3">Three</li>"#));
        assert!(html.contains(r#"<li value="7">Seven</li>"#));
        assert_eq!(html.matches("<ol>").count(), 1);
    }

    #[test]
    fn bullets_continue_across_blank_lines() {
        let html = to_html("- a\n\n- b\nAfter", &[]);
        assert_eq!(html, "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n<p>After</p>");
    }

    #[test]
    fn headings_and_figures_close_lists() {
        let text = format!("- a\n## Next part\n1. b\n{}\n- c", placeholder(0));
        let html = to_html(&text, &["<figure>F</figure>".to_owned()]);
        assert_eq!(
            html,
            indoc! {r#"
                <ul>
                <li>a</li>
                </ul>
                <h2 id="next-part">Next part</h2>
                <ol>
                <li value="1">b</li>
                </ol>
                <figure>F</figure>
                <ul>
                <li>c</li>
                </ul>"#}
        );
    }

    #[test]
    fn paragraphs_and_inline_figures() {
        let text = format!(
            "First line\nsecond *line*\n\nSee {} then **more**",
            placeholder(0)
        );
        let html = to_html(&text, &["<figure>F</figure>".to_owned()]);
        assert_eq!(
            html,
            indoc! {"
                <p>First line
                second <em>line</em></p>
                <p>See</p>
                <figure>F</figure>
                <p>then <strong>more</strong></p>"}
        );
    }

    #[test]
    fn raw_block_html_is_not_wrapped() {
        let html = to_html("<div>kept</div>\n\na < b & c &amp; d", &[]);
        assert_eq!(html, "<div>kept</div>\n<p>a &lt; b &amp; c &amp; d</p>");
    }

    #[test]
    fn word_escapes_are_removed() {
        assert_eq!(unescape(r"\## Title"), "## Title");
        assert_eq!(unescape(r"1\. First"), "1. First");
        assert_eq!(unescape(r"\- not a bullet"), "- not a bullet");
        assert_eq!(unescape(r"[CLIP]\n"), r"[CLIP]\n");
    }

    #[test]
    fn duplicate_headings_get_distinct_ids() {
        let html = to_html("# Intro\n# Intro", &[]);
        assert!(html.contains(r#"id="intro""#));
        assert!(html.contains(r#"id="intro-2""#));
    }
}
