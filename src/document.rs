use std::{
    fs::File,
    io::Read,
    path::Path,
};

use miette::{Context, IntoDiagnostic};
use quick_xml::{events::Event, Reader};
use tracing::{debug, info};

use crate::result::{Error, Result};

/// The ordered paragraphs of a document. Blank paragraphs are kept as empty
/// strings so that the author's spacing survives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentText {
    paragraphs: Vec<String>,
}

impl DocumentText {
    pub fn from_paragraphs(paragraphs: Vec<String>) -> Self {
        Self { paragraphs }
    }

    /// One paragraph per line
    pub fn from_text(text: &str) -> Self {
        Self::from_paragraphs(text.lines().map(str::to_owned).collect())
    }

    /// Load a `.docx` Word document or, for any other extension, a text file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }

        info!("Reading document {}", path.display());
        let is_docx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));

        let document = if is_docx {
            Self::from_paragraphs(read_docx_paragraphs(path)?)
        } else {
            let text = std::fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not read text file {}", path.display()))?;
            Self::from_text(&text)
        };

        debug!("{} paragraphs read", document.paragraphs().len());
        Ok(document)
    }

    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Every line trimmed and joined with `\n`. Marker spans refer to this text.
    pub fn full_text(&self) -> String {
        self.paragraphs
            .iter()
            .flat_map(|p| p.split('\n'))
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn read_docx_paragraphs(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).into_diagnostic()?;
    let mut archive = zip::ZipArchive::new(file)
        .into_diagnostic()
        .wrap_err_with(|| format!("{} is not a valid docx archive", path.display()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .into_diagnostic()
        .wrap_err("Missing word/document.xml")?
        .read_to_string(&mut xml)
        .into_diagnostic()?;

    parse_document_xml(&xml).map_err(|err| {
        err.wrap_err_with(|| format!("Could not parse the content of {}", path.display()))
    })
}

/// Walk `word/document.xml`: every `w:p` is a paragraph made of its `w:t` runs
fn parse_document_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event().into_diagnostic()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:p" => current.clear(),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(e) if in_text => {
                current.push_str(&e.unescape().into_diagnostic()?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}
