use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::header;
use crate::variant::VariantRecord;

/// Result of decoding one VCF file.
///
/// When `error` is set the file could not be read or decoded and the other
/// fields are empty and must not be trusted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// `##` lines, trimmed, in file order.
    pub metadata: Vec<String>,
    /// Columns of the last `#` line, without the marker.
    pub header: Vec<String>,
    pub variants: Vec<VariantRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Quality metrics reported alongside an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub vcf_parsing_success: bool,
    pub variants_detected: usize,
    pub genes_identified: Vec<String>,
}

impl ParsedDocument {
    /// A document carrying only a failure message.
    pub fn failed(message: impl Into<String>) -> Self {
        ParsedDocument {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn sample_names(&self) -> &[String] {
        header::sample_names(&self.header)
    }

    pub fn file_format(&self) -> Option<&str> {
        header::metadata_value(&self.metadata, "fileformat")
    }

    /// Distinct gene symbols annotated on the variants, sorted.
    pub fn genes(&self) -> Vec<String> {
        self.variants
            .iter()
            .filter_map(|v| v.gene.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            vcf_parsing_success: self.is_ok(),
            variants_detected: self.variants.len(),
            genes_identified: self.genes(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;

    #[test]
    fn test_failed_document() {
        let doc = ParsedDocument::failed("Error reading file.");
        assert!(!doc.is_ok());
        assert!(doc.metadata.is_empty() && doc.header.is_empty() && doc.variants.is_empty());
        let s = doc.summary();
        assert!(!s.vcf_parsing_success);
        assert_eq!(s.variants_detected, 0);
    }

    #[test]
    fn test_summary_genes_are_unique_and_sorted() {
        let doc = decode(
            "1\t1\t.\tA\tC\t.\tPASS\tGENE=TPMT\n1\t2\t.\tA\tC\t.\tPASS\tGENE=CYP2D6\n1\t3\t.\tA\tC\t.\tPASS\tGene=TPMT\n1\t4\t.\tA\tC\t.\tPASS\tDB\n",
        );
        let s = doc.summary();
        assert!(s.vcf_parsing_success);
        assert_eq!(s.variants_detected, 4);
        assert_eq!(s.genes_identified, vec!["CYP2D6", "TPMT"]);
    }

    #[test]
    fn test_json_shape() {
        let doc = decode("##fileformat=VCFv4.2\n22\tx\trs1\tA\tG\n");
        let value: serde_json::Value = serde_json::from_str(&doc.to_json(false).unwrap()).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["metadata"][0], "##fileformat=VCFv4.2");
        assert!(value["variants"][0]["position"].is_null());
        assert!(value["variants"][0]["filter_status"].is_null());
        assert!(value["variants"][0].get("gene").is_none());

        let failed: serde_json::Value =
            serde_json::from_str(&ParsedDocument::failed("boom").to_json(true).unwrap()).unwrap();
        assert_eq!(failed["error"], "boom");
        assert_eq!(failed["variants"].as_array().map(|a| a.len()), Some(0));
    }

    #[test]
    fn test_json_round_trip() {
        let doc = decode("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n2\t9\t.\tA\tG\t.\tPASS\tGENE=DPYD;DB\tGT\t1|0\n");
        let back: ParsedDocument = serde_json::from_str(&doc.to_json(false).unwrap()).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.sample_names(), &["S1"]);
    }
}
