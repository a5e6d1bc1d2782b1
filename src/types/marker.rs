use std::{fmt::Display, str::FromStr};

use super::{timestamp::format_hms, Extension};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerKind {
    Clip,
    Screenshot,
}

impl MarkerKind {
    /// Keyword used by the bracket syntax
    pub fn keyword(self) -> &'static str {
        match self {
            MarkerKind::Clip => "CLIP",
            MarkerKind::Screenshot => "SCREENSHOT",
        }
    }

    pub fn extension(self) -> Extension {
        match self {
            MarkerKind::Clip => Extension::Mp4,
            MarkerKind::Screenshot => Extension::Jpg,
        }
    }
}

impl Display for MarkerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    /// Parse the alignment written by an author, falling back to [`Alignment::Center`]
    pub fn parse_lenient(text: Option<&str>) -> Self {
        text.and_then(|t| t.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_matches('"').to_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" | "centre" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(format!("Unknown alignment '{other}'")),
        }
    }
}

/// One media annotation found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaMarker {
    pub kind: MarkerKind,
    pub timestamp: u64,
    /// Only set for clips
    pub duration: Option<u64>,
    pub alignment: Alignment,
    pub caption: String,
    /// Exact text the marker was parsed from, used as replacement anchor
    pub source_span: String,
}

impl MediaMarker {
    pub fn screenshot(timestamp: u64, alignment: Alignment, caption: &str, span: &str) -> Self {
        Self {
            kind: MarkerKind::Screenshot,
            timestamp,
            duration: None,
            alignment,
            caption: caption.trim().to_owned(),
            source_span: span.to_owned(),
        }
    }

    pub fn clip(
        timestamp: u64,
        duration: u64,
        alignment: Alignment,
        caption: &str,
        span: &str,
    ) -> Self {
        Self {
            kind: MarkerKind::Clip,
            timestamp,
            duration: Some(duration),
            alignment,
            caption: caption.trim().to_owned(),
            source_span: span.to_owned(),
        }
    }
}

impl Display for MediaMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>10} at {:>8}", self.kind, format_hms(self.timestamp))?;
        if let Some(duration) = self.duration {
            write!(f, " for {:>8}", format_hms(duration))?;
        }
        write!(f, " [{}] {}", self.alignment.as_str(), self.caption)
    }
}
