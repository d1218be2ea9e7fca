use mlua::{Lua, MetaMethod, UserDataFields, UserDataMethods};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenotypeAllele {
    Unphased(i32),
    Phased(i32),
    UnphasedMissing,
    PhasedMissing,
}

impl GenotypeAllele {
    fn new(index: Option<i32>, phased: bool) -> Self {
        match (index, phased) {
            (Some(i), true) => GenotypeAllele::Phased(i),
            (Some(i), false) => GenotypeAllele::Unphased(i),
            (None, true) => GenotypeAllele::PhasedMissing,
            (None, false) => GenotypeAllele::UnphasedMissing,
        }
    }

    pub fn index(&self) -> Option<i32> {
        match self {
            GenotypeAllele::Unphased(i) | GenotypeAllele::Phased(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_phased(&self) -> bool {
        matches!(
            self,
            GenotypeAllele::Phased(_) | GenotypeAllele::PhasedMissing
        )
    }
}

impl fmt::Display for GenotypeAllele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index() {
            Some(i) => write!(f, "{}", i),
            None => write!(f, "."),
        }
    }
}

/// The GT call of one sample, e.g. `0|1` or `./.`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Genotype(Vec<GenotypeAllele>);

impl Genotype {
    /// Parse the GT subfield of a sample column. Anything after the first `:` is ignored.
    /// Returns None for text that is not a genotype.
    pub fn from_sample(sample: &str) -> Option<Self> {
        let gt = sample.split(':').next().unwrap_or(sample).trim();
        if gt.is_empty() {
            return None;
        }
        let mut alleles = Vec::new();
        let mut rest = gt;
        // separator preceding the current allele; None for the first one.
        let mut sep: Option<char> = None;
        loop {
            let end = rest.find(|c: char| c == '/' || c == '|').unwrap_or(rest.len());
            let (token, tail) = rest.split_at(end);
            let index = match token {
                "." => None,
                t => Some(t.parse::<i32>().ok().filter(|i| *i >= 0)?),
            };
            let next_sep = tail.chars().next();
            let phased = match sep {
                Some(c) => c == '|',
                None => next_sep == Some('|'),
            };
            alleles.push(GenotypeAllele::new(index, phased));
            match next_sep {
                Some(c) => {
                    sep = Some(c);
                    rest = &tail[1..];
                }
                None => break,
            }
        }
        Some(Genotype(alleles))
    }

    pub fn alleles(&self) -> &[GenotypeAllele] {
        &self.0
    }

    pub fn is_phased(&self) -> bool {
        self.0.len() > 1 && self.0[1..].iter().all(|a| a.is_phased())
    }

    pub fn is_missing(&self) -> bool {
        self.0.iter().all(|a| a.index().is_none())
    }

    /// Number of called alleles that are not the reference allele.
    pub fn alt_count(&self) -> usize {
        self.0
            .iter()
            .filter(|a| matches!(a.index(), Some(i) if i > 0))
            .count()
    }

    pub fn is_hom_ref(&self) -> bool {
        !self.is_missing() && self.0.iter().all(|a| a.index() == Some(0))
    }

    pub fn is_het(&self) -> bool {
        let called: Vec<i32> = self.0.iter().filter_map(|a| a.index()).collect();
        called.len() > 1 && called.iter().any(|i| *i != called[0])
    }

    pub fn is_hom_alt(&self) -> bool {
        let called: Vec<i32> = self.0.iter().filter_map(|a| a.index()).collect();
        called.len() == self.0.len() && called[0] > 0 && called.iter().all(|i| *i == called[0])
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Genotype(alleles) = self;
        write!(f, "{}", alleles[0])?;
        for allele in alleles[1..].iter() {
            let sep = if allele.is_phased() { "|" } else { "/" };
            write!(f, "{}{}", sep, allele)?;
        }
        Ok(())
    }
}

impl FromStr for Genotype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genotype::from_sample(s).ok_or_else(|| format!("invalid genotype: '{}'", s))
    }
}

impl From<Genotype> for String {
    fn from(g: Genotype) -> Self {
        g.to_string()
    }
}

impl TryFrom<String> for Genotype {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

pub fn register_genotypes(lua: &Lua) -> mlua::Result<()> {
    lua.register_userdata_type::<Genotype>(|reg| {
        reg.add_meta_method(MetaMethod::ToString, |_, this: &Genotype, ()| {
            Ok(this.to_string())
        });
        reg.add_field_method_get("alleles", |_, this: &Genotype| {
            Ok(this.0.iter().map(|a| a.index()).collect::<Vec<_>>())
        });
        reg.add_field_method_get("phased", |_, this: &Genotype| Ok(this.is_phased()));
        reg.add_field_method_get("alt_count", |_, this: &Genotype| Ok(this.alt_count()));
        reg.add_field_method_get("missing", |_, this: &Genotype| Ok(this.is_missing()));
    })
}
