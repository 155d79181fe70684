//! Encoding-resilient text loading.
//!
//! IPRESS exports have shipped as UTF-8, Windows-1252, and Latin-1 over
//! the years, with no declaration anywhere in the file. The loader
//! sniffs a bounded prefix to pick a first candidate, then walks a fixed
//! fallback list until one encoding decodes the whole file without
//! malformed sequences.

use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::IngestError;

/// How many leading bytes to sniff. Sampling the prefix is enough to
/// spot a BOM or confirm UTF-8 without reading multi-hundred-MB exports
/// twice.
const SNIFF_LEN: usize = 64 * 1024;

/// A fully decoded text file and the encoding that produced it.
#[derive(Debug)]
pub struct DecodedText {
    /// The decoded contents.
    pub text: String,
    /// Name of the encoding that decoded without errors.
    pub encoding: &'static str,
}

/// Reads a file of unknown encoding into a `String`.
///
/// Candidate order: BOM-declared or sniffed encoding first, then UTF-8,
/// then Windows-1252 (the WHATWG superset of Latin-1, which is where
/// `encoding_rs` routes the `latin1` label). The first candidate that
/// decodes the entire file without malformed sequences wins.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file cannot be read, or
/// [`IngestError::Encoding`] if every candidate reports malformed
/// sequences.
pub fn read_to_string(path: &Path) -> Result<DecodedText, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    decode_bytes(&bytes).ok_or_else(|| IngestError::Encoding {
        path: path.display().to_string(),
        tried: candidate_names(&bytes),
    })
}

/// Decodes a byte buffer with the sniff-then-fallback strategy.
///
/// Returns `None` only if every candidate reports malformed sequences,
/// which cannot happen while Windows-1252 (total over all bytes) is the
/// last candidate; the path exists so the contract stays honest if the
/// fallback list changes.
#[must_use]
pub fn decode_bytes(bytes: &[u8]) -> Option<DecodedText> {
    for encoding in candidates(bytes) {
        let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
        if !had_errors {
            log::debug!("Decoded {} bytes as {}", bytes.len(), encoding.name());
            return Some(DecodedText {
                text: text.into_owned(),
                encoding: encoding.name(),
            });
        }
        log::debug!("Rejected {}: malformed sequences", encoding.name());
    }
    None
}

/// Builds the ordered candidate list: sniffed guess first, then the
/// fixed fallbacks, with duplicates removed.
fn candidates(bytes: &[u8]) -> Vec<&'static Encoding> {
    let mut list: Vec<&'static Encoding> = Vec::with_capacity(3);
    if let Some(guess) = sniff(bytes) {
        list.push(guess);
    }
    for fallback in [UTF_8, WINDOWS_1252] {
        if !list.iter().any(|e| *e == fallback) {
            list.push(fallback);
        }
    }
    list
}

fn candidate_names(bytes: &[u8]) -> String {
    candidates(bytes)
        .iter()
        .map(|e| e.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Guesses an encoding from the leading bytes.
///
/// A BOM is authoritative. Otherwise, a prefix that validates as UTF-8
/// (allowing a multi-byte sequence cut off at the sample boundary)
/// suggests UTF-8; a prefix with high bytes that do not validate
/// suggests Windows-1252. A pure-ASCII prefix returns no guess and
/// lets the fallback list decide.
fn sniff(bytes: &[u8]) -> Option<&'static Encoding> {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(bytes) {
        return Some(encoding);
    }

    let prefix = &bytes[..bytes.len().min(SNIFF_LEN)];
    if prefix.is_ascii() {
        return None;
    }

    match std::str::from_utf8(prefix) {
        Ok(_) => Some(UTF_8),
        Err(e) => {
            // A sequence truncated by the sample boundary is not evidence
            // against UTF-8: UTF-8 sequences are at most 4 bytes long.
            if e.error_len().is_none() && prefix.len() - e.valid_up_to() < 4 {
                Some(UTF_8)
            } else {
                Some(WINDOWS_1252)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf8_with_accents() {
        let decoded = decode_bytes("Código Único,Condición\n".as_bytes()).unwrap();
        assert_eq!(decoded.encoding, "UTF-8");
        assert!(decoded.text.contains("Código Único"));
    }

    #[test]
    fn decodes_windows_1252() {
        // "Código" with the o-acute as the single byte 0xF3
        let bytes = b"C\xF3digo,Estado\n";
        let decoded = decode_bytes(bytes).unwrap();
        assert_eq!(decoded.encoding, "windows-1252");
        assert!(decoded.text.contains("Código"));
    }

    #[test]
    fn strips_utf8_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Estado\nACTIVADO\n");
        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded.encoding, "UTF-8");
        assert!(decoded.text.starts_with("Estado"));
    }

    #[test]
    fn ascii_decodes_as_utf8() {
        let decoded = decode_bytes(b"a,b,c\n1,2,3\n").unwrap();
        assert_eq!(decoded.encoding, "UTF-8");
        assert_eq!(decoded.text, "a,b,c\n1,2,3\n");
    }

    #[test]
    fn truncated_utf8_sequence_at_sample_boundary_still_guesses_utf8() {
        // Valid UTF-8 followed by the first byte of a two-byte sequence
        let mut bytes = "año ".repeat(10).into_bytes();
        bytes.push(0xC3);
        // Full-buffer decode repairs nothing, so UTF-8 reports errors and
        // the fallback lands on Windows-1252; the sniff itself must not
        // have misclassified the valid prefix.
        let decoded = decode_bytes(&bytes).unwrap();
        assert_eq!(decoded.encoding, "windows-1252");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_to_string(Path::new("/nonexistent/ipress.csv")).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
    }
}
