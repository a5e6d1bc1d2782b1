mod command;
mod ffmpeg;

pub use ffmpeg::{Ffmpeg, JoinMode, MediaExtractor, TitleCard};
