//! Pharmacogene panel: the genes a report is built from and the drugs that map to them.

use serde::{Deserialize, Serialize};

use crate::document::ParsedDocument;

pub const TARGET_GENES: [&str; 6] = ["CYP2D6", "CYP2C19", "CYP2C9", "SLCO1B1", "TPMT", "DPYD"];

const DRUG_GENES: [(&str, &str); 6] = [
    ("WARFARIN", "CYP2C9"),
    ("CLOPIDOGREL", "CYP2C19"),
    ("CODEINE", "CYP2D6"),
    ("SIMVASTATIN", "SLCO1B1"),
    ("AZATHIOPRINE", "TPMT"),
    ("FLUOROURACIL", "DPYD"),
];

/// A variant on one of the panel genes, in the shape reported downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelVariant {
    pub rsid: String,
    pub gene: String,
    pub star: Option<String>,
    pub chromosome: String,
    pub position: Option<i64>,
}

pub fn is_target_gene(gene: &str) -> bool {
    TARGET_GENES.contains(&gene)
}

/// Gene that governs response to `drug`. Case-insensitive.
pub fn drug_gene(drug: &str) -> Option<&'static str> {
    let drug = drug.trim().to_ascii_uppercase();
    DRUG_GENES
        .iter()
        .find(|(d, _)| *d == drug)
        .map(|(_, g)| *g)
}

/// Variants annotated with a panel gene, in file order.
pub fn panel_variants(doc: &ParsedDocument) -> Vec<PanelVariant> {
    doc.variants
        .iter()
        .filter_map(|v| {
            let gene = v.gene.as_deref().filter(|g| is_target_gene(g))?;
            Some(PanelVariant {
                rsid: v.id.clone(),
                gene: gene.to_string(),
                star: v.star_allele().map(|s| s.to_string()),
                chromosome: v.chromosome.clone(),
                position: v.position,
            })
        })
        .collect()
}

/// Panel variants on the gene that governs `drug`. None when the drug is not on the panel.
pub fn panel_variants_for_drug(doc: &ParsedDocument, drug: &str) -> Option<Vec<PanelVariant>> {
    let gene = drug_gene(drug)?;
    Some(
        panel_variants(doc)
            .into_iter()
            .filter(|p| p.gene == gene)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;

    #[test]
    fn test_drug_gene() {
        assert_eq!(drug_gene("codeine"), Some("CYP2D6"));
        assert_eq!(drug_gene(" Warfarin "), Some("CYP2C9"));
        assert_eq!(drug_gene("aspirin"), None);
    }

    #[test]
    fn test_panel_variants() {
        let doc = decode(
            "10\t94781859\trs4244285\tG\tA\t.\tPASS\tGENE=CYP2C19;STAR=*2\n\
             1\t100\trs1\tA\tC\t.\tPASS\tGENE=BRCA1\n\
             22\t42130692\trs3892097\tC\tT\t.\tPASS\tGene=CYP2D6\n\
             1\t200\trs2\tA\tC\t.\tPASS\tDB\n",
        );
        let panel = panel_variants(&doc);
        assert_eq!(panel.len(), 2);
        assert_eq!(
            panel[0],
            PanelVariant {
                rsid: "rs4244285".to_string(),
                gene: "CYP2C19".to_string(),
                star: Some("*2".to_string()),
                chromosome: "10".to_string(),
                position: Some(94781859),
            }
        );
        assert_eq!(panel[1].gene, "CYP2D6");
        assert_eq!(panel[1].star, None);
    }

    #[test]
    fn test_panel_variants_for_drug() {
        let doc = decode(
            "10\t94781859\trs4244285\tG\tA\t.\tPASS\tGENE=CYP2C19;STAR=*2\n\
             22\t42130692\trs3892097\tC\tT\t.\tPASS\tGENE=CYP2D6;STAR\n",
        );
        let codeine = panel_variants_for_drug(&doc, "Codeine").unwrap();
        assert_eq!(codeine.len(), 1);
        assert_eq!(codeine[0].rsid, "rs3892097");
        // a bare STAR flag carries no allele
        assert_eq!(codeine[0].star, None);

        let clopidogrel = panel_variants_for_drug(&doc, "CLOPIDOGREL").unwrap();
        assert_eq!(clopidogrel[0].star.as_deref(), Some("*2"));
        assert!(panel_variants_for_drug(&doc, "warfarin").unwrap().is_empty());
        assert!(panel_variants_for_drug(&doc, "aspirin").is_none());
    }
}
