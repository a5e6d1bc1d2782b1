use std::path::Path;

/// File container of an extracted media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Jpg,
    Mp4,
}

impl Extension {
    /// Return the extension with the leading dot.
    /// e.g. ".ext"
    pub fn with_dot(self) -> &'static str {
        match self {
            Extension::Jpg => ".jpg",
            Extension::Mp4 => ".mp4",
        }
    }

    /// Parse the path file extension.
    /// Return None in case of no or invalid extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "jpg" | "jpeg" => Some(Self::Jpg),
                "mp4" => Some(Self::Mp4),
                _ => None,
            })
    }
}
