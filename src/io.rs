use std::{
    io::Write,
    path::{Path, PathBuf},
};

use miette::{Context, IntoDiagnostic};
use tempfile::NamedTempFile;
use time::{format_description, OffsetDateTime};

use crate::{
    result::{bail, Result},
    types::Extension,
};

/// File name without its extension, empty if there is none
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Folder the results of one run are written into: `<out>/<stem>` or
/// `<out>/<stem>_<YYYYMMDD_HHMMSS>`. An existing folder is never reused.
pub fn output_folder(out: &Path, stem: &str, timestamped: bool) -> Result<PathBuf> {
    let name = if timestamped {
        let format = format_description::parse("[year][month][day]_[hour][minute][second]")
            .into_diagnostic()?;
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        format!("{stem}_{}", now.format(&format).into_diagnostic()?)
    } else {
        stem.to_owned()
    };

    let folder = find_unused_name(out, &name)?;
    std::fs::create_dir_all(&folder)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not create output folder {}", folder.display()))?;
    Ok(folder)
}

/// First of `<name>`, `<name> (2)`, `<name> (3)`, ... that does not exist in `dir`
pub fn find_unused_name(dir: &Path, name: &str) -> Result<PathBuf> {
    let mut output = dir.join(name);
    if !output.exists() {
        return Ok(output);
    }

    for n in 2u16.. {
        output.set_file_name(format!("{name} ({n})"));
        if !output.exists() {
            return Ok(output);
        }
    }

    bail("Code is broken or you have really REALLY too much folders with the same name")
}

/// Write a file through a temporary sibling so that readers never see it half written
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut file = tempfile::Builder::new()
        .prefix(".vidpost")
        .tempfile_in(dir)?;
    file.write_all(content.as_bytes())?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Create a named temporary file in `dir` and return its handle.
///
/// The file destructor will be called at the handle drop.
/// **As such, one must not simply get the file path and drop the handle.**
pub fn named_tempfile_in(dir: &Path, extension: Extension) -> Result<NamedTempFile> {
    Ok(tempfile::Builder::new()
        .prefix(".vidpost")
        .suffix(extension.with_dot())
        .tempfile_in(dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_are_never_reused() {
        let dir = tempfile::tempdir().unwrap();

        let first = output_folder(dir.path(), "match", false).unwrap();
        let second = output_folder(dir.path(), "match", false).unwrap();
        assert_eq!(first, dir.path().join("match"));
        assert_eq!(second, dir.path().join("match (2)"));
        assert!(second.is_dir());
    }

    #[test]
    fn timestamped_folder_name() {
        let dir = tempfile::tempdir().unwrap();
        let folder = output_folder(dir.path(), "match", true).unwrap();
        let name = folder.file_name().unwrap().to_str().unwrap();

        let suffix = name.strip_prefix("match_").unwrap();
        assert_eq!(suffix.len(), "20240101_120000".len());
        assert_eq!(&suffix[8..9], "_");
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blog_post.html");

        write_atomic(&path, "old").unwrap();
        write_atomic(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
