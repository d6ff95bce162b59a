use std::io::Read;
use std::io::Write;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::engine::general_purpose::URL_SAFE;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use url::Url;

use playpen_protocol::Language;
use playpen_protocol::SourceFile;

use crate::ShareError;
use crate::ShareState;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Encode a workspace into the current `c` token: JSON, gzip, URL-safe
/// base64 without padding.
pub fn encode(state: &ShareState) -> Result<String, ShareError> {
    let json = serde_json::to_vec(state)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok(URL_SAFE_NO_PAD.encode(compressed))
}

/// Encode without compression. The decoder accepts plain JSON in the same
/// `c` parameter, so these tokens stay interchangeable with [`encode`]'s;
/// they are just longer.
pub fn encode_uncompressed(state: &ShareState) -> Result<String, ShareError> {
    let json = serde_json::to_vec(state)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Append the share token to a base URL.
pub fn share_url(base: &Url, state: &ShareState) -> Result<Url, ShareError> {
    let token = encode(state)?;
    let mut url = base.clone();
    url.query_pairs_mut().append_pair("c", &token);
    Ok(url)
}

/// Decode a workspace from a full URL. `None` means nothing usable was
/// found; the caller falls back to its default startup state.
pub fn decode_url(url: &Url) -> Option<ShareState> {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    decode_query_pairs(&pairs)
}

/// Decode a workspace from already-split query pairs.
///
/// Every format this system has ever emitted is tried, newest first: the
/// compressed `c` token, the `files` array, then the original single-buffer
/// `code` parameter. A broken payload falls through to the next format;
/// old links keep working and corruption never surfaces as an error.
pub fn decode_query_pairs(pairs: &[(String, String)]) -> Option<ShareState> {
    let param = |name: &str| {
        pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    if let Some(token) = param("c") {
        match decode_token(token) {
            Ok(state) => return Some(state.normalized()),
            Err(err) => tracing::debug!("compressed share token rejected: {err}"),
        }
    }
    if let Some(files) = param("files") {
        match decode_legacy_snapshot(files) {
            Ok(state) => return Some(state.normalized()),
            Err(err) => tracing::debug!("legacy files parameter rejected: {err}"),
        }
    }
    if let Some(code) = param("code") {
        match decode_legacy_code(code, param("lang")) {
            Ok(state) => return Some(state),
            Err(err) => tracing::debug!("legacy code parameter rejected: {err}"),
        }
    }
    None
}

fn decode_token(token: &str) -> Result<ShareState, ShareError> {
    let raw = decode_base64_tolerant(token)?;
    let json = if raw.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(raw.as_slice());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        out
    } else {
        raw
    };
    let state: ShareState = serde_json::from_slice(&json)?;
    if state.files.is_empty() {
        return Err(ShareError::Empty);
    }
    Ok(state)
}

// The `files` parameter carries the whole snapshot object uncompressed:
// base64 of `{"lang": ..., "files": [...], "activeFile": ...}`.
fn decode_legacy_snapshot(files_b64: &str) -> Result<ShareState, ShareError> {
    let json = decode_base64_tolerant(files_b64)?;
    let state: ShareState = serde_json::from_slice(&json)?;
    if state.files.is_empty() {
        return Err(ShareError::Empty);
    }
    Ok(state)
}

fn decode_legacy_code(code_b64: &str, lang: Option<&str>) -> Result<ShareState, ShareError> {
    let content = decode_base64_tolerant(code_b64)?;
    let content = String::from_utf8(content)?;
    if content.trim().is_empty() {
        return Err(ShareError::Empty);
    }
    let language = parse_lang(lang)?;
    let name = language.default_file_name();
    Ok(ShareState {
        language,
        files: vec![SourceFile::new(name.clone(), content)],
        active_file: name,
    })
}

// Missing `lang` means the link predates multi-language support and is
// python; an unrecognized value is a broken link.
fn parse_lang(lang: Option<&str>) -> Result<Language, ShareError> {
    match lang {
        None => Ok(Language::Python),
        Some(raw) => {
            Language::from_str(raw).map_err(|_| ShareError::UnknownLanguage(raw.to_string()))
        }
    }
}

/// Accept any common base64 alphabet/padding combination. Tokens pass
/// through URL encoders and chat clients that re-pad, strip padding, or turn
/// `+` into a space.
fn decode_base64_tolerant(token: &str) -> Result<Vec<u8>, ShareError> {
    let cleaned = token.replace(' ', "+");
    for engine in [&URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD] {
        if let Ok(bytes) = engine.decode(cleaned.as_bytes()) {
            return Ok(bytes);
        }
    }
    Err(ShareError::Base64)
}
