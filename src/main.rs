mod cli;
mod document;
mod extraction;
mod io;
mod logging;
mod media_index;
mod my_regex;
mod outside;
mod parser;
mod pipeline;
mod reel;
mod render;
mod result;
mod settings;
mod types;
mod validator;

use std::path::Path;

use miette::{bail, IntoDiagnostic};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::{
    cli::Action,
    document::DocumentText,
    outside::Ffmpeg,
    parser::Parser,
    pipeline::{Pipeline, ProcessingReport},
    settings::Settings,
    validator::validate,
};

fn main() -> miette::Result<()> {
    // Initialize the environment & CLI
    let args = cli::parse_args();
    logging::init_logging(args.log_level)?;
    debug!("{args:?}");

    let settings = Settings::load(args.config.as_deref())?;

    match args.action {
        Action::Parse { document } => list_markers(&settings, &document),
        Action::Process {
            document,
            video,
            out,
            json,
        } => {
            let ffmpeg = Ffmpeg::new()?;
            let report = Pipeline::new(&settings, &ffmpeg).process(&document, &video, &out);

            if json {
                let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
                println!("{json}");
            } else {
                print_report(&report);
            }

            if !report.success {
                bail!("Processing of {} failed", document.display());
            }
            Ok(())
        }
        Action::Reel {
            document,
            video,
            out,
            title_cards,
        } => {
            let settings = Settings {
                title_cards: settings.title_cards || title_cards,
                ..settings
            };
            let ffmpeg = Ffmpeg::new()?;
            let reel = reel::make_reel(&ffmpeg, &settings, &document, &video, &out)?;

            print_warnings(&reel.warnings);
            println!(
                "{} {} clips joined into {}",
                "Done:".green(),
                reel.clips,
                reel.path.display()
            );
            Ok(())
        }
    }
}

/// Dry run: what the document asks for, without touching any video
fn list_markers(settings: &Settings, document: &Path) -> miette::Result<()> {
    let text = DocumentText::load(document)?;
    let parsed = Parser::new(settings.default_clip_secs).parse(&text);

    println!("{} markers found", parsed.markers.len().bold());
    for (i, marker) in parsed.markers.iter().enumerate() {
        println!("{:>4}. {marker}", i + 1);
    }

    let mut warnings = parsed.issues;
    warnings.extend(validate(&parsed.markers));
    print_warnings(&warnings);
    Ok(())
}

fn print_report(report: &ProcessingReport) {
    if let Some(html) = &report.html_path {
        println!("{} {}", "Article:".green(), html.display());
    }
    if let Some(media) = &report.media_dir {
        println!("{} {}", "Media:".green(), media.display());
    }
    print_warnings(&report.warnings);
    for error in &report.errors {
        println!("{} {error}", "Error:".red());
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("{} {warning}", "Warning:".yellow());
    }
}
