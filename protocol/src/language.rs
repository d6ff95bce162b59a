use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Languages the execution backend knows how to compile and run.
///
/// Only Eiffel supports the `verify` operation (AutoProof-style static
/// verification); everything else is compile/run only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    C,
    Cpp,
    Java,
    Eiffel,
}

impl Language {
    /// Canonical source-file extension, used when a share link has to
    /// synthesize a filename for bare code.
    pub fn extension(self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Eiffel => "e",
        }
    }

    /// Default filename for a single-file program in this language.
    pub fn default_file_name(self) -> String {
        format!("main.{}", self.extension())
    }

    /// Guess the language from a source-file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Some(Language::Python),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            "e" => Some(Language::Eiffel),
            _ => None,
        }
    }

    pub fn supports_verification(self) -> bool {
        matches!(self, Language::Eiffel)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Eiffel => "eiffel",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError(pub String);

impl fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown language `{}`", self.0)
    }
}

impl std::error::Error for ParseLanguageError {}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" => Ok(Language::Python),
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            "eiffel" => Ok(Language::Eiffel),
            other => Err(ParseLanguageError(other.to_string())),
        }
    }
}
