//! Naming scheme of the extracted media and the index of the files produced
//! for one document.

use std::{collections::BTreeSet, path::Path};

use miette::{Context, IntoDiagnostic};
use tracing::debug;

use crate::{
    result::Result,
    types::{timestamp::format_file_hms, Extension, MarkerKind, MediaMarker},
};

const SCREENSHOT_TAG: &str = "_screenshot_";
const CLIP_TAG: &str = "_clip_from_";

/// `<stem>_screenshot_<seq:03>_at_<H-MM-SS>.jpg`, `seq` starting at 1
pub fn screenshot_file_name(stem: &str, seq: usize, timestamp: u64) -> String {
    format!(
        "{stem}{SCREENSHOT_TAG}{seq:03}_at_{}{}",
        format_file_hms(timestamp),
        MarkerKind::Screenshot.extension().with_dot()
    )
}

/// `<stem>_clip_from_<H-MM-SS>_duration_<H-MM-SS>.mp4`
pub fn clip_file_name(stem: &str, start: u64, duration: u64) -> String {
    format!(
        "{stem}{CLIP_TAG}{}_duration_{}{}",
        format_file_hms(start),
        format_file_hms(duration),
        MarkerKind::Clip.extension().with_dot()
    )
}

/// File name the extraction produces for a marker, `seq` being its 1-based
/// position among the markers of the same kind
pub fn expected_file_name(stem: &str, seq: usize, marker: &MediaMarker) -> String {
    match marker.kind {
        MarkerKind::Screenshot => screenshot_file_name(stem, seq, marker.timestamp),
        MarkerKind::Clip => clip_file_name(stem, marker.timestamp, marker.duration.unwrap_or(0)),
    }
}

/// Kind of media a file name belongs to, if it follows the naming scheme
pub fn classify(file_name: &str) -> Option<MarkerKind> {
    match Extension::from_path(file_name)? {
        Extension::Jpg if file_name.contains(SCREENSHOT_TAG) => Some(MarkerKind::Screenshot),
        Extension::Mp4 if file_name.contains(CLIP_TAG) => Some(MarkerKind::Clip),
        _ => None,
    }
}

/// The media files available for one rendered article
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaIndex {
    screenshots: BTreeSet<String>,
    clips: BTreeSet<String>,
    /// Stem of the video the media were extracted from
    stem: String,
    /// Path of the media directory relative to the HTML file
    href_prefix: String,
}

impl MediaIndex {
    pub fn new(stem: impl Into<String>, href_prefix: impl Into<String>) -> Self {
        Self {
            stem: stem.into(),
            href_prefix: href_prefix.into(),
            ..Default::default()
        }
    }

    /// Index every file of `dir` following the naming scheme
    pub fn scan_dir(
        dir: &Path,
        stem: impl Into<String>,
        href_prefix: impl Into<String>,
    ) -> Result<Self> {
        let mut index = Self::new(stem, href_prefix);
        let entries = std::fs::read_dir(dir)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not list media directory {}", dir.display()))?;

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !index.insert(name) {
                    debug!("Ignoring {name}, not an extracted media");
                }
            }
        }
        Ok(index)
    }

    /// Add a file if its name follows the naming scheme
    pub fn insert(&mut self, file_name: &str) -> bool {
        match classify(file_name) {
            Some(kind) => self.set_mut(kind).insert(file_name.to_owned()),
            None => false,
        }
    }

    /// File name the extraction gives to a marker, see [`expected_file_name`]
    pub fn expected_file_name(&self, seq: usize, marker: &MediaMarker) -> String {
        expected_file_name(&self.stem, seq, marker)
    }

    pub fn contains(&self, kind: MarkerKind, file_name: &str) -> bool {
        self.set(kind).contains(file_name)
    }

    /// Files of one kind, sorted by name
    pub fn files(&self, kind: MarkerKind) -> impl Iterator<Item = &str> {
        self.set(kind).iter().map(String::as_str)
    }

    /// Link to a media file from the HTML file, every path segment
    /// percent-encoded
    pub fn href(&self, file_name: &str) -> String {
        self.href_prefix
            .split('/')
            .chain([file_name])
            .filter(|segment| !segment.is_empty())
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/")
    }

    fn set(&self, kind: MarkerKind) -> &BTreeSet<String> {
        match kind {
            MarkerKind::Screenshot => &self.screenshots,
            MarkerKind::Clip => &self.clips,
        }
    }

    fn set_mut(&mut self, kind: MarkerKind) -> &mut BTreeSet<String> {
        match kind {
            MarkerKind::Screenshot => &mut self.screenshots,
            MarkerKind::Clip => &mut self.clips,
        }
    }
}
