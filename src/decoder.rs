//! Line-oriented decoder for VCF text.
//!
//! Decoding is best-effort: data lines with fewer than five columns are
//! skipped, INFO parts without a key are dropped and a POS that is not an
//! integer is kept as `None`. None of these are reported to the caller.

use log::{debug, log_enabled, trace, Level};

use crate::document::ParsedDocument;
use crate::genotypes::Genotype;
use crate::header::FIXED_COLUMNS;
use crate::variant::{InfoMap, VariantRecord, FLAG_VALUE};

/// Minimum columns for a data line: CHROM POS ID REF ALT.
pub const MIN_COLUMNS: usize = 5;

const FILTER_COLUMN: usize = 6;
const INFO_COLUMN: usize = 7;

/// Decode the full text of one VCF file.
pub fn decode(content: &str) -> ParsedDocument {
    let mut doc = ParsedDocument::default();

    for (lineno, line) in content.split('\n').enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with("##") {
            doc.metadata.push(line.trim().to_string());
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            // only the last header line counts
            doc.header = header.trim().split('\t').map(|c| c.to_string()).collect();
            continue;
        }
        match decode_record(line) {
            Some(record) => {
                if log_enabled!(Level::Trace) {
                    trace!("line {}: {:?}", lineno + 1, record);
                }
                doc.variants.push(record);
            }
            None => debug!(
                "line {}: skipping data line with fewer than {} columns",
                lineno + 1,
                MIN_COLUMNS
            ),
        }
    }
    doc
}

/// Decode one data line. Returns None if it has fewer than five columns.
pub fn decode_record(line: &str) -> Option<VariantRecord> {
    let fields: Vec<&str> = line.trim().split('\t').collect();
    if fields.len() < MIN_COLUMNS {
        return None;
    }

    let position = parse_position(fields[1]);
    if position.is_none() {
        debug!("non-numeric position '{}' kept without coordinate", fields[1]);
    }
    let (info, gene) = parse_info(fields.get(INFO_COLUMN).copied().unwrap_or(""));
    let genotypes = fields
        .iter()
        .skip(FIXED_COLUMNS)
        .map(|s| Genotype::from_sample(s))
        .collect();

    Some(VariantRecord {
        chromosome: fields[0].to_string(),
        position,
        id: fields[2].to_string(),
        reference_allele: fields[3].to_string(),
        alternate_allele: fields[4].to_string(),
        // a line may have five columns only; FILTER is then absent rather than an error.
        filter_status: fields.get(FILTER_COLUMN).map(|s| s.to_string()),
        info,
        gene,
        genotypes,
    })
}

/// Parse an INFO column into its key/value map and the gene symbol, if annotated.
///
/// Parts are split on the first `=`. A part without a value is a flag and is
/// stored as `"true"`; a part without a key is ignored. The last `GENE` or
/// `Gene` part decides the gene.
pub fn parse_info(column: &str) -> (InfoMap, Option<String>) {
    let mut info = InfoMap::default();
    let mut gene = None;
    for part in column.split(';') {
        let (key, value) = match part.split_once('=') {
            Some((k, v)) => (k, Some(v).filter(|v| !v.is_empty())),
            None => (part, None),
        };
        if key.is_empty() {
            continue;
        }
        if key == "GENE" || key == "Gene" {
            gene = value.map(|v| v.to_string());
        }
        info.insert(key.to_string(), value.unwrap_or(FLAG_VALUE).to_string());
    }
    (info, gene)
}

/// Parse the leading integer of a POS field: optional whitespace, an
/// optional sign, then digits. Trailing text is ignored, so `"12abc"` is 12.
/// Returns None when no digits are present or the value overflows.
pub fn parse_position(field: &str) -> Option<i64> {
    let s = field.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}
