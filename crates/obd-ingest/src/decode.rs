//! Text decoding for exported CSV files.
//!
//! A BOM decides the encoding outright (UTF-8 or UTF-16 LE/BE). Without one
//! the candidates are tried strictly, in order: UTF-8, Shift_JIS (cp932),
//! UTF-16 LE, windows-1252. The first that decodes without error wins.

use std::path::Path;

use encoding_rs::{SHIFT_JIS, WINDOWS_1252};
use tracing::debug;

use crate::IngestError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Bytes windows-1252 leaves unassigned. encoding_rs maps them to C1
/// controls; a file containing them is not treated as windows-1252.
const CP1252_UNASSIGNED: &[u8] = &[0x81, 0x8D, 0x8F, 0x90, 0x9D];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf8Bom,
    ShiftJis,
    Utf16Le,
    Utf16Be,
    Windows1252,
}

/// Sniff the encoding and decode.
pub fn decode_text(bytes: &[u8]) -> Result<(String, TextEncoding), IngestError> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        let s = String::from_utf8(rest.to_vec())
            .map_err(|e| IngestError::Encoding(format!("invalid UTF-8 after BOM: {e}")))?;
        return Ok((s, TextEncoding::Utf8Bom));
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes)
            .map(|s| (s, TextEncoding::Utf16Le))
            .ok_or_else(|| IngestError::Encoding("invalid UTF-16 LE after BOM".to_string()));
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes)
            .map(|s| (s, TextEncoding::Utf16Be))
            .ok_or_else(|| IngestError::Encoding("invalid UTF-16 BE after BOM".to_string()));
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok((s.to_string(), TextEncoding::Utf8));
    }
    if let Some(s) = SHIFT_JIS.decode_without_bom_handling_and_without_replacement(bytes) {
        return Ok((s.into_owned(), TextEncoding::ShiftJis));
    }
    if let Some(s) = decode_utf16(bytes, u16::from_le_bytes) {
        return Ok((s, TextEncoding::Utf16Le));
    }
    if !bytes.iter().any(|b| CP1252_UNASSIGNED.contains(b)) {
        if let Some(s) = WINDOWS_1252.decode_without_bom_handling_and_without_replacement(bytes) {
            return Ok((s.into_owned(), TextEncoding::Windows1252));
        }
    }

    Err(IngestError::Encoding(
        "tried UTF-8, Shift_JIS, UTF-16, windows-1252".to_string(),
    ))
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| unit([c[0], c[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// Read and decode a whole file.
pub fn read_text_file(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path)
        .map_err(|e| IngestError::Io(format!("read '{}': {e}", path.display())))?;
    let (text, enc) = decode_text(&bytes)?;
    debug!(path = %path.display(), encoding = ?enc, bytes = bytes.len(), "decoded input file");
    Ok(text)
}
