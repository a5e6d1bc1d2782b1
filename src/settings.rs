use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use miette::{Context, IntoDiagnostic};
use serde::Deserialize;
use tracing::debug;

use crate::{outside::TitleCard, result::Result};

/// Tunables of the pipeline, read from an optional TOML file then from the
/// `VIDPOST_*` environment variables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How far apart, in seconds, a drifted marker may be from the parsed one
    pub match_tolerance_secs: u64,
    /// Clip length of the block grammars when a segment gives none
    pub default_clip_secs: u64,
    pub html_file_name: String,
    /// Suffix the output folder with the processing date
    pub timestamped_output: bool,
    /// Write a whole HTML document instead of a stylesheet and a fragment
    pub standalone_html: bool,
    /// Put a card with the segment title before every clip of a reel
    pub title_cards: bool,
    pub title_card_secs: u64,
    pub title_card_width: u32,
    pub title_card_height: u32,
    /// Any color ffmpeg knows, by name or `0xRRGGBB`
    pub title_card_background: String,
    pub title_card_text_color: String,
    pub title_card_font_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            match_tolerance_secs: 5,
            default_clip_secs: 120,
            html_file_name: "blog_post.html".to_owned(),
            timestamped_output: true,
            standalone_html: true,
            title_cards: false,
            title_card_secs: 2,
            title_card_width: 1280,
            title_card_height: 720,
            title_card_background: "black".to_owned(),
            title_card_text_color: "white".to_owned(),
            title_card_font_size: 48,
        }
    }
}

impl Settings {
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(file) = file {
            debug!("Reading settings from {}", file.display());
            builder = builder.add_source(File::from(file).format(FileFormat::Toml));
        }

        let settings = builder
            .add_source(Environment::with_prefix("VIDPOST").try_parsing(true))
            .build()
            .and_then(|config| config.try_deserialize::<Settings>())
            .into_diagnostic()
            .wrap_err("Invalid settings")?;

        debug!("{settings:?}");
        Ok(settings)
    }

    /// Card announcing `title` in a highlight reel
    pub fn title_card<'a>(&'a self, title: &'a str) -> TitleCard<'a> {
        TitleCard {
            title,
            secs: self.title_card_secs,
            width: self.title_card_width,
            height: self.title_card_height,
            background: &self.title_card_background,
            text_color: &self.title_card_text_color,
            font_size: self.title_card_font_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vidpost.toml");
        std::fs::write(
            &path,
            indoc! {r#"
                match_tolerance_secs = 8
                html_file_name = "index.html"
            "#},
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.match_tolerance_secs, 8);
        assert_eq!(settings.html_file_name, "index.html");
        assert_eq!(settings.default_clip_secs, 120);
        assert!(settings.standalone_html);
        assert!(!settings.title_cards);
    }

    #[test]
    fn title_card_style_comes_from_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vidpost.toml");
        std::fs::write(
            &path,
            indoc! {r#"
                title_cards = true
                title_card_secs = 3
                title_card_background = "navy"
            "#},
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        let card = settings.title_card("Opening goal");
        assert!(settings.title_cards);
        assert_eq!(card.title, "Opening goal");
        assert_eq!(card.secs, 3);
        assert_eq!(card.background, "navy");
        assert_eq!(card.text_color, "white");
        assert_eq!((card.width, card.height), (1280, 720));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
