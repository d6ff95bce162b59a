//! Shareable-link codec for playpen workspaces.
//!
//! A share link carries a whole multi-file workspace in a URL query
//! parameter. Current links use `c`: JSON, gzipped, then URL-safe base64
//! without padding. Two older link formats are still decoded: `files`
//! (base64 JSON file array plus a `lang` parameter) and the original
//! single-buffer `code` parameter.

mod codec;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use playpen_protocol::Language;
use playpen_protocol::SourceFile;

pub use codec::decode_query_pairs;
pub use codec::decode_url;
pub use codec::encode;
pub use codec::encode_uncompressed;
pub use codec::share_url;

/// The workspace state a share link round-trips.
///
/// Field names are part of the wire format shared with existing links; do
/// not rename them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareState {
    #[serde(rename = "lang")]
    pub language: Language,
    pub files: Vec<SourceFile>,
    #[serde(rename = "activeFile")]
    pub active_file: String,
}

impl ShareState {
    /// Build a snapshot for encoding. File names must be unique and
    /// `active_file`, when given, must name one of the files; `None` selects
    /// the first file.
    pub fn new(
        language: Language,
        files: Vec<SourceFile>,
        active_file: Option<String>,
    ) -> Result<Self, ShareError> {
        let Some(first) = files.first() else {
            return Err(ShareError::Empty);
        };
        for (i, file) in files.iter().enumerate() {
            if files[..i].iter().any(|other| other.name == file.name) {
                return Err(ShareError::DuplicateFile(file.name.clone()));
            }
        }
        let active_file = active_file.unwrap_or_else(|| first.name.clone());
        if !files.iter().any(|file| file.name == active_file) {
            return Err(ShareError::MissingActiveFile(active_file));
        }
        Ok(Self {
            language,
            files,
            active_file,
        })
    }

    /// Clamp `active_file` to a file that actually exists, falling back to
    /// the first file. Links hand-edited or produced by older clients can
    /// name a file that is not in the list.
    pub fn normalized(mut self) -> Self {
        if !self.files.iter().any(|file| file.name == self.active_file) {
            if let Some(first) = self.files.first() {
                self.active_file = first.name.clone();
            }
        }
        self
    }
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share payload is not valid base64")]
    Base64,
    #[error("share payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("gzip stream failed: {0}")]
    Gzip(#[from] std::io::Error),
    #[error("share payload is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("share link names an unknown language: {0}")]
    UnknownLanguage(String),
    #[error("share payload contains no files")]
    Empty,
    #[error("duplicate file name in snapshot: {0}")]
    DuplicateFile(String),
    #[error("active file {0} is not in the snapshot")]
    MissingActiveFile(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn new_defaults_the_active_file_to_the_first_entry() {
        let state = ShareState::new(
            Language::Python,
            vec![
                SourceFile::new("main.py", "print(1)"),
                SourceFile::new("util.py", "x = 1"),
            ],
            None,
        )
        .unwrap();
        assert_eq!(state.active_file, "main.py");
    }

    #[test]
    fn new_rejects_duplicates_and_unknown_active_files() {
        let err = ShareState::new(
            Language::Python,
            vec![
                SourceFile::new("main.py", "print(1)"),
                SourceFile::new("main.py", "print(2)"),
            ],
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ShareError::DuplicateFile(name) if name == "main.py"));

        let err = ShareState::new(
            Language::Python,
            vec![SourceFile::new("main.py", "print(1)")],
            Some("other.py".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, ShareError::MissingActiveFile(name) if name == "other.py"));

        let err = ShareState::new(Language::Python, Vec::new(), None).unwrap_err();
        assert!(matches!(err, ShareError::Empty));
    }
}
