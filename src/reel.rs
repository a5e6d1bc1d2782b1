use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    document::DocumentText,
    extraction::ExtractionCoordinator,
    io::{file_stem, named_tempfile_in},
    outside::{JoinMode, MediaExtractor},
    parser::Parser,
    result::{bail, err_msg, Error, Result},
    settings::Settings,
    types::{timestamp::format_hms, Extension, MarkerKind, MediaMarker},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reel {
    pub path: PathBuf,
    /// Number of clips joined
    pub clips: usize,
    pub warnings: Vec<String>,
}

/// Join every clip of the document, in reading order, into
/// `<out>/<video_stem>_highlight_reel.mp4`.
///
/// With `settings.title_cards`, each clip is preceded by a card showing its
/// caption, or its start time when it has none.
/// The clips and cards are made in a temporary directory removed on return.
pub fn make_reel(
    extractor: &dyn MediaExtractor,
    settings: &Settings,
    document: &Path,
    video: &Path,
    out: &Path,
) -> Result<Reel> {
    for input in [document, video] {
        if !input.is_file() {
            return Err(Error::InputNotFound(input.to_path_buf()));
        }
    }

    let text = DocumentText::load(document)?;
    let parsed = Parser::new(settings.default_clip_secs).parse(&text);
    let clips: Vec<MediaMarker> = parsed
        .markers
        .into_iter()
        .filter(|m| m.kind == MarkerKind::Clip)
        .collect();
    if clips.is_empty() {
        return bail(format!("No clip found in {}", document.display()));
    }
    info!("Making a highlight reel out of {} clips", clips.len());

    let workdir = tempfile::tempdir()?;
    let batch = ExtractionCoordinator::new(extractor).extract_all(video, workdir.path(), &clips)?;
    let mut records = batch.records;
    records.sort_by_key(|r| r.marker_index);

    let mut parts: Vec<PathBuf> = Vec::with_capacity(records.len() * 2);
    for (i, record) in records.iter().enumerate() {
        if settings.title_cards {
            let marker = &clips[record.marker_index];
            let title = match marker.caption.trim() {
                "" => format_hms(marker.timestamp),
                caption => caption.to_owned(),
            };
            let card = workdir.path().join(format!("card_{:03}.mp4", i + 1));
            extractor
                .title_card(&settings.title_card(&title), &card)
                .map_err(|err| err_msg(format!("title card '{title}': {err}")))?;
            parts.push(card);
        }
        parts.push(record.output_path.clone());
    }

    let mode = if settings.title_cards {
        JoinMode::Reencode {
            width: settings.title_card_width,
            height: settings.title_card_height,
        }
    } else {
        JoinMode::Copy
    };

    std::fs::create_dir_all(out)?;
    let path = out.join(format!("{}_highlight_reel.mp4", file_stem(video)));
    let reel = named_tempfile_in(out, Extension::Mp4)?;
    extractor.concat_clips(&parts, reel.path(), mode)?;
    reel.persist(&path).map_err(|err| err.error)?;
    info!("Highlight reel written to {}", path.display());

    let mut warnings = parsed.issues;
    warnings.extend(batch.warnings);
    Ok(Reel {
        path,
        clips: records.len(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::extraction::tests::{fake_video, FakeExtractor};

    #[test]
    fn clips_are_joined_in_reading_order() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("reel.txt");
        std::fs::write(
            &document,
            indoc! {"
                ## Opening goal -- 00:30
                🔹 **STARTING TIMESTAMP:** 00:14:05

                ## Late drama -- 01:00
                🔹 **STARTING TIMESTAMP:** 01:29:00
                🔹 **CONTENT DESCRIPTION:** Last minute winner
            "},
        )
        .unwrap();
        let video = fake_video(dir.path());
        let out = dir.path().join("out");
        let fake = FakeExtractor::default();

        let reel = make_reel(&fake, &Settings::default(), &document, &video, &out).unwrap();

        assert_eq!(reel.path, out.join("match_highlight_reel.mp4"));
        assert_eq!(reel.clips, 2);
        assert_eq!(std::fs::read(&reel.path).unwrap(), b"reel");
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
        assert_eq!(
            *fake.calls.borrow(),
            ["clip 845+30", "clip 5340+60", "concat x2"]
        );
    }

    #[test]
    fn title_cards_come_before_their_clip() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("reel.txt");
        std::fs::write(
            &document,
            indoc! {r#"
                [CLIP timestamp="1:00" duration="10"]Opening goal
                [CLIP timestamp="2:00" duration="5"]
            "#},
        )
        .unwrap();
        let video = fake_video(dir.path());
        let out = dir.path().join("out");
        let fake = FakeExtractor::default();
        let settings = Settings {
            title_cards: true,
            title_card_secs: 3,
            ..Default::default()
        };

        let reel = make_reel(&fake, &settings, &document, &video, &out).unwrap();

        assert_eq!(reel.clips, 2);
        assert_eq!(
            *fake.calls.borrow(),
            [
                "clip 60+10",
                "clip 120+5",
                "card 'Opening goal' 3s",
                "card '0:02:00' 3s",
                "concat x4 at 1280x720",
            ]
        );
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 1);
    }

    #[test]
    fn a_document_without_clip_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let document = dir.path().join("post.txt");
        std::fs::write(&document, r#"[SCREENSHOT timestamp="3"]Only a picture"#).unwrap();
        let video = fake_video(dir.path());
        let out = dir.path().join("out");

        let res = make_reel(
            &FakeExtractor::default(),
            &Settings::default(),
            &document,
            &video,
            &out,
        );
        assert!(res.is_err());
        assert!(!out.exists());
    }
}
