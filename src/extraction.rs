use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::{
    io::file_stem,
    media_index::expected_file_name,
    outside::MediaExtractor,
    result::{err_msg, Error, Result},
    types::{MarkerKind, MediaMarker},
};

/// One media file written for a marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    /// Position of the marker in the whole marker list
    pub marker_index: usize,
    pub kind: MarkerKind,
    pub output_path: PathBuf,
    pub file_name: String,
}

/// Everything written by a successful extraction
#[derive(Debug, Clone, Default)]
pub struct ExtractionBatch {
    pub records: Vec<ExtractionRecord>,
    /// Markers skipped without failing the batch
    pub warnings: Vec<String>,
}

/// A file about to be written for a marker
#[derive(Debug)]
struct Planned<'m> {
    marker_index: usize,
    marker: &'m MediaMarker,
    file_name: String,
    output_path: PathBuf,
}

/// Drives a [`MediaExtractor`] over the markers of a document.
///
/// The batch is all or nothing: when one extraction fails, every file the
/// batch wrote, including the partial output of the failing call, is deleted
/// before the error is returned. Files it never asked for are left alone.
#[derive(Debug)]
pub struct ExtractionCoordinator<'a> {
    extractor: &'a dyn MediaExtractor,
}

impl<'a> ExtractionCoordinator<'a> {
    pub fn new(extractor: &'a dyn MediaExtractor) -> Self {
        Self { extractor }
    }

    pub fn extract_all(
        &self,
        video: &Path,
        output_dir: &Path,
        markers: &[MediaMarker],
    ) -> Result<ExtractionBatch> {
        if !video.is_file() {
            return Err(Error::InputNotFound(video.to_path_buf()));
        }
        if markers.is_empty() {
            info!("No marker, nothing to extract");
            return Ok(ExtractionBatch::default());
        }
        std::fs::create_dir_all(output_dir)?;

        let stem = file_stem(video);
        let screenshots = plan(&stem, output_dir, markers, MarkerKind::Screenshot);
        let clips = plan(&stem, output_dir, markers, MarkerKind::Clip);

        let mut batch = ExtractionBatch::default();
        let mut attempted = Vec::new();
        let res = self
            .extract_screenshots(video, &screenshots, &mut batch, &mut attempted)
            .and_then(|_| self.extract_clips(video, &clips, &mut batch, &mut attempted));

        match res {
            Ok(()) => {
                info!("{} media files extracted", batch.records.len());
                Ok(batch)
            }
            Err(err) => {
                error!("Extraction failed, removing the files of the batch: {err}");
                rollback(&attempted);
                Err(Error::ExtractionFailure(err.to_string()))
            }
        }
    }

    fn extract_screenshots(
        &self,
        video: &Path,
        planned: &[Planned<'_>],
        batch: &mut ExtractionBatch,
        attempted: &mut Vec<PathBuf>,
    ) -> Result<()> {
        if planned.is_empty() {
            return Ok(());
        }

        let video_duration = match self.extractor.probe_duration(video) {
            Ok(d) => Some(d),
            Err(err) => {
                batch
                    .warnings
                    .push(format!("Could not measure the video duration: {err}"));
                None
            }
        };

        let mut kept = Vec::with_capacity(planned.len());
        for p in planned {
            match video_duration {
                Some(d) if p.marker.timestamp > d => {
                    let msg = format!(
                        "Screenshot at {}s is beyond the video duration ({d}s), skipped",
                        p.marker.timestamp
                    );
                    warn!("{msg}");
                    batch.warnings.push(msg);
                }
                _ => kept.push(p),
            }
        }

        info!("Extracting {} screenshots", kept.len());
        let shots: Vec<(u64, PathBuf)> = kept
            .iter()
            .map(|p| (p.marker.timestamp, p.output_path.clone()))
            .collect();
        attempted.extend(shots.iter().map(|(_, output)| output.clone()));
        self.extractor.extract_screenshots(video, &shots)?;

        for p in kept {
            if p.output_path.is_file() {
                batch.records.push(p.record(MarkerKind::Screenshot));
            } else {
                let msg = format!("No frame could be read at {}s", p.marker.timestamp);
                warn!("{msg}");
                batch.warnings.push(msg);
            }
        }
        Ok(())
    }

    fn extract_clips(
        &self,
        video: &Path,
        planned: &[Planned<'_>],
        batch: &mut ExtractionBatch,
        attempted: &mut Vec<PathBuf>,
    ) -> Result<()> {
        for (i, p) in planned.iter().enumerate() {
            let Some(duration) = p.marker.duration else {
                batch
                    .warnings
                    .push(format!("Clip at {}s has no duration, skipped", p.marker.timestamp));
                continue;
            };

            info!(
                "Extracting clip {}/{} at {}s",
                i + 1,
                planned.len(),
                p.marker.timestamp
            );
            attempted.push(p.output_path.clone());
            self.extractor
                .extract_clip(video, p.marker.timestamp, duration, &p.output_path)
                .map_err(|err| err_msg(format!("clip at {}s: {err}", p.marker.timestamp)))?;
            batch.records.push(p.record(MarkerKind::Clip));
        }
        Ok(())
    }
}

impl Planned<'_> {
    fn record(&self, kind: MarkerKind) -> ExtractionRecord {
        ExtractionRecord {
            marker_index: self.marker_index,
            kind,
            output_path: self.output_path.clone(),
            file_name: self.file_name.clone(),
        }
    }
}

/// Output file of every marker of one kind, numbered within that kind
fn plan<'m>(
    stem: &str,
    output_dir: &Path,
    markers: &'m [MediaMarker],
    kind: MarkerKind,
) -> Vec<Planned<'m>> {
    markers
        .iter()
        .enumerate()
        .filter(|(_, m)| m.kind == kind)
        .enumerate()
        .map(|(seq, (marker_index, marker))| {
            let file_name = expected_file_name(stem, seq + 1, marker);
            Planned {
                marker_index,
                marker,
                output_path: output_dir.join(&file_name),
                file_name,
            }
        })
        .collect()
}

/// Best effort removal: a file that cannot be removed is only logged
fn rollback(paths: &[PathBuf]) {
    for path in paths {
        if !path.exists() {
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(()) => info!("Removed {}", path.display()),
            Err(err) => error!("Could not remove {}: {err}", path.display()),
        }
    }
}
