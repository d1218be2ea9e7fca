use flate2::read::MultiGzDecoder;
use log::{error, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::decoder::decode;
use crate::document::ParsedDocument;
use crate::error::{DecodeError, Result};

pub const READ_ERROR: &str = "Error reading file.";
pub const PARSE_ERROR: &str = "Failed to parse VCF file content.";

/// Limits applied to a file before it is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        UploadPolicy {
            max_bytes: 5 * 1024 * 1024,
            allowed_extensions: vec![".vcf".to_string(), ".vcf.gz".to_string()],
        }
    }
}

impl UploadPolicy {
    pub fn check(&self, path: &Path, size: u64) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.iter().any(|ext| name.ends_with(ext)) {
            return Err(DecodeError::UnsupportedExtension {
                path: path.to_path_buf(),
            });
        }
        if size > self.max_bytes {
            return Err(DecodeError::FileTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Read the text of a VCF file, gunzipping it if it starts with the gzip magic.
/// Invalid UTF-8 is replaced rather than rejected and a leading byte order mark is dropped.
/// `policy.max_bytes` bounds the decompressed text as well as the file on disk.
pub fn read_text(path: &Path, policy: &UploadPolicy) -> Result<String> {
    let file = File::open(path)?;
    policy.check(path, file.metadata()?.len())?;

    let mut reader = BufReader::new(file);
    let is_gzip = {
        let buf = reader.fill_buf()?;
        buf.len() >= 2 && buf[0] == 0x1f && buf[1] == 0x8b
    };
    let limit = policy.max_bytes;
    let mut bytes = Vec::new();
    if is_gzip {
        log::debug!("{}: detected gzip layer", path.display());
        MultiGzDecoder::new(reader)
            .take(limit.saturating_add(1))
            .read_to_end(&mut bytes)?;
    } else {
        reader
            .take(limit.saturating_add(1))
            .read_to_end(&mut bytes)?;
    }
    if bytes.len() as u64 > limit {
        return Err(DecodeError::FileTooLarge {
            size: bytes.len() as u64,
            limit,
        });
    }
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
}

/// Read and decode a file. Never fails: problems are reported through
/// `ParsedDocument::error` with the other fields left empty.
pub fn read_document(path: &Path, policy: &UploadPolicy) -> ParsedDocument {
    let text = match read_text(path, policy) {
        Ok(text) => text,
        Err(e) => {
            error!("{}: {}", path.display(), e);
            return ParsedDocument::failed(format!("{} {}", READ_ERROR, e));
        }
    };
    decode_guarded(&text)
}

/// Decode text, turning a panic inside the decoder into an error document.
pub fn decode_guarded(text: &str) -> ParsedDocument {
    match std::panic::catch_unwind(|| decode(text)) {
        Ok(doc) => {
            info!(
                "decoded {} metadata lines and {} variants",
                doc.metadata.len(),
                doc.variants.len()
            );
            doc
        }
        Err(_) => {
            warn!("decoder panicked; returning an error document");
            ParsedDocument::failed(PARSE_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_policy_extensions() {
        let policy = UploadPolicy::default();
        assert!(policy.check(Path::new("a.vcf"), 10).is_ok());
        assert!(policy.check(Path::new("dir/A.VCF.GZ"), 10).is_ok());
        assert!(matches!(
            policy.check(Path::new("a.txt"), 10),
            Err(DecodeError::UnsupportedExtension { .. })
        ));
        assert!(matches!(
            policy.check(&PathBuf::from("a.vcf"), 5 * 1024 * 1024 + 1),
            Err(DecodeError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_error_document() {
        let doc = read_document(Path::new("/nonexistent/dir/in.vcf"), &UploadPolicy::default());
        assert!(doc.error.as_deref().unwrap().starts_with(READ_ERROR));
        assert!(doc.variants.is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bom.vcf");
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice(b"#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n22\t1\trs1\tA\tG\t.\tPASS\tGENE=CYP2D6\n");
        std::fs::write(&path, bytes).unwrap();

        let doc = read_document(&path, &UploadPolicy::default());
        assert_eq!(doc.header.len(), 8);
        assert_eq!(doc.header[0], "CHROM");
        assert_eq!(doc.variants.len(), 1);
        assert_eq!(doc.variants[0].chromosome, "22");
    }

    #[test]
    fn test_decode_guarded_ok() {
        let doc = decode_guarded("1\t2\t.\tA\tC\n");
        assert!(doc.is_ok());
        assert_eq!(doc.variants.len(), 1);
    }
}
