use std::path::PathBuf;

use clap::{command, value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

use crate::logging::level_from_flags;

macro_rules! arg_env {
    ($v:literal) => {
        concat!("VIDPOST_", $v)
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Render the article and extract its media
    Process {
        document: PathBuf,
        video: PathBuf,
        out: PathBuf,
        json: bool,
    },
    /// Only list what the document asks for
    Parse { document: PathBuf },
    /// Join every clip of the document into one video
    Reel {
        document: PathBuf,
        video: PathBuf,
        out: PathBuf,
        title_cards: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub action: Action,
    pub config: Option<PathBuf>,
    pub log_level: Level,
}

fn document_arg() -> Arg {
    Arg::new("document")
        .help("The annotated document, a Word .docx or a text file")
        .required(true)
        .value_parser(value_parser!(PathBuf))
}

fn video_arg() -> Arg {
    Arg::new("video")
        .help("The video the markers refer to")
        .required(true)
        .value_parser(value_parser!(PathBuf))
}

fn out_arg() -> Arg {
    Arg::new("out")
        .help("The directory the results are written into")
        .long("out")
        .short('o')
        .env(arg_env!("OUT"))
        .default_value("processed_blogs")
        .value_parser(value_parser!(PathBuf))
}

pub fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .help("A TOML settings file")
                .long("config")
                .short('c')
                .env(arg_env!("CONFIG"))
                .global(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .help("Log more, twice for everything")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .help("Only log warnings and errors")
                .long("quiet")
                .short('q')
                .global(true)
                .conflicts_with("verbose")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("process")
                .about("Extract the media of a document and write its HTML article")
                .arg(document_arg())
                .arg(video_arg())
                .arg(out_arg())
                .arg(
                    Arg::new("json")
                        .help("Print the processing report as JSON")
                        .long("json")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("parse")
                .about("List the markers of a document and what looks wrong with them")
                .arg(document_arg()),
        )
        .subcommand(
            Command::new("reel")
                .about("Join every clip of a document into a highlight reel")
                .arg(document_arg())
                .arg(video_arg())
                .arg(out_arg())
                .arg(
                    Arg::new("title-cards")
                        .help("Show the caption of each clip on a card before it")
                        .long("title-cards")
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Parse the process arguments, exiting on invalid ones
pub fn parse_args() -> Args {
    from_matches(&cli().get_matches())
}

fn path(matches: &ArgMatches, id: &str) -> PathBuf {
    matches.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

fn from_matches(matches: &ArgMatches) -> Args {
    let action = match matches.subcommand() {
        Some(("process", sub)) => Action::Process {
            document: path(sub, "document"),
            video: path(sub, "video"),
            out: path(sub, "out"),
            json: sub.get_flag("json"),
        },
        Some(("reel", sub)) => Action::Reel {
            document: path(sub, "document"),
            video: path(sub, "video"),
            out: path(sub, "out"),
            title_cards: sub.get_flag("title-cards"),
        },
        Some((_, sub)) => Action::Parse {
            document: path(sub, "document"),
        },
        None => unreachable!("a subcommand is required"),
    };

    Args {
        action,
        config: matches.get_one::<PathBuf>("config").cloned(),
        log_level: level_from_flags(matches.get_count("verbose"), matches.get_flag("quiet")),
    }
}
