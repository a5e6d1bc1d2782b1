use std::{
    ffi::OsStr,
    fmt::Debug,
    io::Write,
    path::{Path, PathBuf},
};

use miette::IntoDiagnostic;
use tracing::debug;

use super::command::{
    assert_success_command, run_command, Capture, FFMPEG, FFPROBE, FFXXX_DEFAULT_ARGS,
};
use crate::result::{err_msg, Result};

/// The video primitives the pipeline relies on.
///
/// Every method writes to the exact output path it is given, overwriting any
/// existing file.
pub trait MediaExtractor: Debug {
    /// Length of the video in whole seconds
    fn probe_duration(&self, video: &Path) -> Result<u64>;

    /// Write one JPEG frame per `(timestamp, output)` pair
    fn extract_screenshots(&self, video: &Path, shots: &[(u64, PathBuf)]) -> Result<()>;

    /// Copy `duration` seconds of the video starting at `start` without re-encoding
    fn extract_clip(&self, video: &Path, start: u64, duration: u64, output: &Path) -> Result<()>;

    /// Join clips in the given order
    fn concat_clips(&self, clips: &[PathBuf], output: &Path, mode: JoinMode) -> Result<()>;

    /// Render a still card showing `card.title`, with a silent audio track
    fn title_card(&self, card: &TitleCard<'_>, output: &Path) -> Result<()>;
}

/// How [`MediaExtractor::concat_clips`] joins its inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMode {
    /// Stream copy, every input sharing the same codecs
    Copy,
    /// Scale every input to one frame size and re-encode, for inputs of
    /// different origins such as title cards and clips
    Reencode { width: u32, height: u32 },
}

/// A title card put before a clip of a highlight reel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCard<'a> {
    pub title: &'a str,
    pub secs: u64,
    pub width: u32,
    pub height: u32,
    pub background: &'a str,
    pub text_color: &'a str,
    pub font_size: u32,
}

/// Escape a filter option value for use inside a `-vf` graph: first for the
/// option parser, then for the graph parser, see ffmpeg-filters(1)
/// "Notes on filtergraph escaping"
fn escape_filter_value(value: &str) -> String {
    fn escape(text: &str, special: &[char]) -> String {
        let mut escaped = String::with_capacity(text.len());
        for c in text.chars() {
            if special.contains(&c) {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    let option = escape(value, &['\\', '\'', ':']);
    escape(&option, &['\\', '\'', '[', ']', ',', ';'])
}

/// Interface for the [ffmpeg](https://ffmpeg.org) and ffprobe programs
#[derive(Debug)]
pub struct Ffmpeg;

impl Ffmpeg {
    /// Verify that the `ffmpeg` and `ffprobe` binaries are reachable
    pub fn new() -> Result<Self> {
        assert_success_command(FFMPEG, |cmd| cmd.arg("-version"))?;
        assert_success_command(FFPROBE, |cmd| cmd.arg("-version"))?;

        Ok(Self)
    }
}

impl MediaExtractor for Ffmpeg {
    fn probe_duration(&self, video: &Path) -> Result<u64> {
        let res = run_command(
            FFPROBE,
            |cmd| {
                cmd.args(["-v", "error"])
                    .args(["-of", "json"])
                    .arg("-show_format")
                    .arg("--")
                    .arg(video)
            },
            Capture::STDOUT,
        )?;
        if !res.status.success() {
            return Err(err_msg(format!("{FFPROBE} failed ({})", res.status)));
        }

        let json = serde_json::from_slice::<serde_json::Value>(&res.stdout).into_diagnostic()?;
        let duration = json
            .get("format")
            .and_then(|format| format.get("duration"))
            .and_then(|duration| duration.as_str())
            .ok_or_else(|| err_msg("Key 'format.duration' not found in ffprobe output"))?;

        let secs: f64 = duration
            .parse()
            .map_err(|_| err_msg(format!("Invalid duration '{duration}' in ffprobe output")))?;
        debug!("{} lasts {secs}s", video.display());
        Ok(secs as u64)
    }

    fn extract_screenshots(&self, video: &Path, shots: &[(u64, PathBuf)]) -> Result<()> {
        for (timestamp, output) in shots {
            assert_success_command(FFMPEG, |cmd| {
                cmd.args(FFXXX_DEFAULT_ARGS)
                    .arg("-y")
                    .args(["-ss", &timestamp.to_string()])
                    .args([OsStr::new("-i"), video.as_os_str()])
                    .args(["-frames:v", "1"])
                    .args(["-q:v", "2"])
                    .arg("--")
                    .arg(output)
            })?;
        }
        Ok(())
    }

    fn extract_clip(&self, video: &Path, start: u64, duration: u64, output: &Path) -> Result<()> {
        assert_success_command(FFMPEG, |cmd| {
            cmd.args(FFXXX_DEFAULT_ARGS)
                .arg("-y")
                .args(["-ss", &start.to_string()])
                .args([OsStr::new("-i"), video.as_os_str()])
                .args(["-t", &duration.to_string()])
                .args(["-c", "copy"])
                .arg("--")
                .arg(output)
        })
    }

    fn concat_clips(&self, clips: &[PathBuf], output: &Path, mode: JoinMode) -> Result<()> {
        match mode {
            JoinMode::Copy => concat_copy(clips, output),
            JoinMode::Reencode { width, height } => concat_reencode(clips, output, width, height),
        }
    }

    fn title_card(&self, card: &TitleCard<'_>, output: &Path) -> Result<()> {
        // drawtext reads the title from a file, sparing a second level of escaping
        let mut text = tempfile::Builder::new().suffix(".txt").tempfile()?;
        write!(text, "{}", card.title)?;
        text.flush()?;

        let color = format!(
            "color=c={}:s={}x{}:d={}:r=30",
            card.background, card.width, card.height, card.secs
        );
        let drawtext = format!(
            "drawtext=textfile={}:fontcolor={}:fontsize={}:x=(w-text_w)/2:y=(h-text_h)/2",
            escape_filter_value(&text.path().to_string_lossy()),
            card.text_color,
            card.font_size
        );
        debug!("Title card '{}': {drawtext}", card.title);

        assert_success_command(FFMPEG, |cmd| {
            cmd.args(FFXXX_DEFAULT_ARGS)
                .arg("-y")
                .args(["-f", "lavfi", "-i", &color])
                .args(["-f", "lavfi", "-i", "anullsrc=channel_layout=stereo:sample_rate=44100"])
                .args(["-vf", &drawtext])
                .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
                .args(["-c:a", "aac"])
                .arg("-shortest")
                .arg("--")
                .arg(output)
        })
    }
}

/// The concat demuxer reads its inputs from a list file
fn concat_copy(clips: &[PathBuf], output: &Path) -> Result<()> {
    let mut list = tempfile::Builder::new().suffix(".txt").tempfile()?;
    for clip in clips {
        let clip = clip.canonicalize()?;
        let escaped = clip.to_string_lossy().replace('\'', r"'\''");
        writeln!(list, "file '{escaped}'")?;
    }
    list.flush()?;

    assert_success_command(FFMPEG, |cmd| {
        cmd.args(FFXXX_DEFAULT_ARGS)
            .arg("-y")
            .args(["-f", "concat"])
            .args(["-safe", "0"])
            .args([OsStr::new("-i"), list.path().as_os_str()])
            .args(["-c", "copy"])
            .arg("--")
            .arg(output)
    })
}

/// The concat filter, every input first fitted into a `width`x`height` frame
fn concat_reencode(clips: &[PathBuf], output: &Path, width: u32, height: u32) -> Result<()> {
    let mut graph = String::new();
    let mut streams = String::new();
    for i in 0..clips.len() {
        graph.push_str(&format!(
            "[{i}:v]scale={width}:{height}:force_original_aspect_ratio=decrease,\
             pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps=30[v{i}];\
             [{i}:a]aresample=44100[a{i}];"
        ));
        streams.push_str(&format!("[v{i}][a{i}]"));
    }
    graph.push_str(&format!("{streams}concat=n={}:v=1:a=1[v][a]", clips.len()));

    assert_success_command(FFMPEG, |cmd| {
        cmd.args(FFXXX_DEFAULT_ARGS).arg("-y");
        for clip in clips {
            cmd.args([OsStr::new("-i"), clip.as_os_str()]);
        }
        cmd.args(["-filter_complex", &graph])
            .args(["-map", "[v]", "-map", "[a]"])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
            .args(["-c:a", "aac"])
            .arg("--")
            .arg(output)
    })
}
