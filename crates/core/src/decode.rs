use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{error::DecodeError, model::RuleDocument};

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub path: String,
    pub size_bytes: u64,
    pub has_bom: bool,
}

#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub source: SourceInfo,
    pub document: RuleDocument,
}

/// Splits off a leading UTF-8 byte-order mark.
pub fn strip_bom(bytes: &[u8]) -> (&[u8], bool) {
    match bytes.strip_prefix(&UTF8_BOM[..]) {
        Some(rest) => (rest, true),
        None => (bytes, false),
    }
}

pub fn decode_bytes(bytes: &[u8]) -> Result<RuleDocument, serde_json::Error> {
    let (body, _) = strip_bom(bytes);
    let root: serde_json::Value = serde_json::from_slice(body)?;
    Ok(RuleDocument::new(root))
}

pub fn decode(path: &Path) -> Result<RuleDocument, DecodeError> {
    decode_file(path).map(|d| d.document)
}

pub fn decode_file(path: &Path) -> Result<DecodedFile, DecodeError> {
    let bytes = read_bytes(path)?;
    decode_loaded(path, &bytes)
}

/// Decode bytes already read from `path`.
pub fn decode_loaded(path: &Path, bytes: &[u8]) -> Result<DecodedFile, DecodeError> {
    let (_, has_bom) = strip_bom(bytes);

    let document = decode_bytes(bytes).map_err(|source| DecodeError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        path = %path.display(),
        size_bytes = bytes.len(),
        has_bom,
        "decoded rule file"
    );

    Ok(DecodedFile {
        source: SourceInfo {
            path: path.display().to_string(),
            size_bytes: bytes.len() as u64,
            has_bom,
        },
        document,
    })
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, DecodeError> {
    std::fs::read(path).map_err(|source| DecodeError::FileAccess {
        path: PathBuf::from(path),
        source,
    })
}

/// Escaped previews of both ends of a file, for eyeballing the raw encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteDump {
    pub size_bytes: u64,
    pub has_bom: bool,
    pub head: String,
    pub tail: String,
}

impl ByteDump {
    pub fn from_bytes(bytes: &[u8], head: usize, tail: usize) -> Self {
        let (_, has_bom) = strip_bom(bytes);
        let head_end = head.min(bytes.len());
        let tail_start = bytes.len().saturating_sub(tail);
        Self {
            size_bytes: bytes.len() as u64,
            has_bom,
            head: escape_bytes(&bytes[..head_end]),
            tail: escape_bytes(&bytes[tail_start..]),
        }
    }
}

fn escape_bytes(bytes: &[u8]) -> String {
    bytes.escape_ascii().to_string()
}
