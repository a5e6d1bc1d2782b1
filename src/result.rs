use std::{
    fmt::{Debug, Display},
    path::PathBuf,
};

use miette::miette;

#[derive(Debug)]
pub enum Error {
    /// The document or the video does not exist
    InputNotFound(PathBuf),

    /// A time value that is neither seconds, `M:SS` nor `H:MM:SS`
    MalformedTimestamp(String),

    /// A duration that could not be understood
    MalformedDuration(String),

    /// One media extraction failed. The whole batch is considered failed
    ExtractionFailure(String),

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Miette(miette!("{err}"))
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::Miette(err) => err,
            err => miette!("{err}"),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InputNotFound(path) => write!(f, "Input file not found: {}", path.display()),
            Error::MalformedTimestamp(text) => write!(f, "Malformed timestamp: '{text}'"),
            Error::MalformedDuration(text) => write!(f, "Malformed duration: '{text}'"),
            Error::ExtractionFailure(reason) => write!(f, "Media extraction failed: {reason}"),
            Error::Miette(report) => write!(f, "{report}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }
}

/// Create an error out of a simple message
pub fn err_msg<D>(msg: D) -> Error
where
    D: Display + Debug + Send + Sync + 'static,
{
    Error::Miette(miette!("{msg}"))
}

/// Shortcut for returning an error out of a simple message
pub fn bail<T, D>(msg: D) -> Result<T>
where
    D: Display + Debug + Send + Sync + 'static,
{
    Err(err_msg(msg))
}

pub type Result<T> = std::result::Result<T, Error>;
