use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::{
    document::DocumentText,
    extraction::ExtractionCoordinator,
    io::{file_stem, output_folder, write_atomic},
    media_index::MediaIndex,
    outside::MediaExtractor,
    parser::Parser,
    render::{page, Renderer},
    result::{Error, Result},
    settings::Settings,
    validator::validate,
};

/// Outcome of one document processing. Either a success, possibly with
/// warnings, or a failure with its errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingReport {
    pub success: bool,
    pub html_path: Option<PathBuf>,
    pub media_dir: Option<PathBuf>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Parse, validate, extract then render, one stage after the other
#[derive(Debug)]
pub struct Pipeline<'a> {
    settings: &'a Settings,
    extractor: &'a dyn MediaExtractor,
}

impl<'a> Pipeline<'a> {
    pub fn new(settings: &'a Settings, extractor: &'a dyn MediaExtractor) -> Self {
        Self {
            settings,
            extractor,
        }
    }

    pub fn process(&self, document: &Path, video: &Path, out: &Path) -> ProcessingReport {
        let mut report = ProcessingReport::default();

        match self.run(document, video, out, &mut report) {
            Ok(()) => {
                report.success = true;
                info!("Processing done with {} warnings", report.warnings.len());
            }
            Err(err) => {
                error!("Processing failed: {err}");
                report.errors.push(err.to_string());
            }
        }
        report
    }

    fn run(
        &self,
        document: &Path,
        video: &Path,
        out: &Path,
        report: &mut ProcessingReport,
    ) -> Result<()> {
        // Nothing is written before both inputs are known to exist
        for input in [document, video] {
            if !input.is_file() {
                return Err(Error::InputNotFound(input.to_path_buf()));
            }
        }

        let text = DocumentText::load(document)?;
        let parsed = Parser::new(self.settings.default_clip_secs).parse(&text);
        info!("{} markers found", parsed.markers.len());
        report.warnings.extend(parsed.issues.iter().cloned());
        report.warnings.extend(validate(&parsed.markers));

        let stem = file_stem(video);
        let folder = output_folder(out, &stem, self.settings.timestamped_output)?;
        let media_dir = folder.join(&stem);
        std::fs::create_dir_all(&media_dir)?;
        report.media_dir = Some(media_dir.clone());

        let batch = match ExtractionCoordinator::new(self.extractor).extract_all(
            video,
            &media_dir,
            &parsed.markers,
        ) {
            Ok(batch) => batch,
            Err(err) => {
                // Only succeeds on the emptied folders
                let _ = std::fs::remove_dir(&media_dir);
                let _ = std::fs::remove_dir(&folder);
                report.media_dir = None;
                return Err(err);
            }
        };
        report.warnings.extend(batch.warnings);

        // What is really on disk is what the article can link to
        let index = MediaIndex::scan_dir(&media_dir, &stem, &stem)?;
        for record in &batch.records {
            if !index.contains(record.kind, &record.file_name) {
                let msg = format!("{} is missing from {}", record.file_name, media_dir.display());
                warn!("{msg}");
                report.warnings.push(msg);
            }
        }
        let rendered = Renderer::new(&index, self.settings.match_tolerance_secs)
            .render(&parsed.text, &parsed.markers);
        report
            .warnings
            .extend(rendered.gaps.iter().map(|gap| gap.to_string()));

        let title = file_stem(document);
        let html = page(&title, &rendered.html, self.settings.standalone_html);
        let html_path = folder.join(&self.settings.html_file_name);
        write_atomic(&html_path, &html)?;
        info!("Article written to {}", html_path.display());

        report.html_path = Some(html_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::extraction::tests::{fake_video, FakeExtractor};

    const POST: &str = indoc! {r#"
        # Derby day

        [SCREENSHOT timestamp="1:30" align="left"]Kick off
        [SCREENSHOT timestamp="1:30"]Same moment
        [CLIP timestamp="00:02:00" duration="0"]Too short
        [CLIP timestamp="5:00" duration="15"]Winner
    "#};

    fn settings() -> Settings {
        Settings {
            timestamped_output: false,
            ..Default::default()
        }
    }

    fn inputs(dir: &Path) -> (PathBuf, PathBuf) {
        let document = dir.join("post.txt");
        std::fs::write(&document, POST).unwrap();
        (document, fake_video(dir))
    }

    #[test]
    fn full_run() {
        let dir = tempfile::tempdir().unwrap();
        let (document, video) = inputs(dir.path());
        let out = dir.path().join("out");
        let fake = FakeExtractor {
            duration: Some(600),
            ..Default::default()
        };
        let settings = settings();

        let report = Pipeline::new(&settings, &fake).process(&document, &video, &out);

        assert!(report.success, "{report:?}");
        assert!(report.errors.is_empty());
        // Duplicate screenshot timestamp and the too short clip
        assert_eq!(report.warnings.len(), 2, "{:?}", report.warnings);

        let html_path = report.html_path.unwrap();
        assert_eq!(html_path, out.join("match").join("blog_post.html"));
        let html = std::fs::read_to_string(html_path).unwrap();
        assert!(html.contains(r#"<h1 id="derby-day">Derby day</h1>"#));
        assert_eq!(html.matches("<figure").count(), 4);
        assert!(!html.contains("[SCREENSHOT"));
        assert!(html.contains(r#"src="match/match_screenshot_002_at_0-01-30.jpg""#));

        let media_dir = report.media_dir.unwrap();
        assert_eq!(std::fs::read_dir(media_dir).unwrap().count(), 4);
    }

    #[test]
    fn extraction_failure_leaves_no_media() {
        let dir = tempfile::tempdir().unwrap();
        let (document, video) = inputs(dir.path());
        let out = dir.path().join("out");
        let fake = FakeExtractor {
            fail_at: Some(300),
            duration: Some(600),
            ..Default::default()
        };
        let settings = settings();

        let report = Pipeline::new(&settings, &fake).process(&document, &video, &out);

        assert!(!report.success);
        assert_eq!(report.errors.len(), 1);
        assert!(report.html_path.is_none());
        assert!(!out.join("match").exists());
    }

    #[test]
    fn missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (document, _) = inputs(dir.path());
        let out = dir.path().join("out");
        let fake = FakeExtractor::default();
        let settings = settings();

        let report = Pipeline::new(&settings, &fake).process(
            &document,
            &dir.path().join("missing.mp4"),
            &out,
        );

        assert!(!report.success);
        assert!(report.errors[0].contains("missing.mp4"));
        assert!(!out.exists());
    }
}
