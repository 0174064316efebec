//! Genotype classification
//!
//! Buckets the samples of one record by the value of a FORMAT tag
//! (normally `GT`):
//!
//! | tokens              | class    |
//! |---------------------|----------|
//! | all `0`             | hom-ref  |
//! | all equal, not `0`  | hom-var  |
//! | all called, differ  | het-var  |
//! | all `.` (or empty)  | missing  |
//!
//! A partially missing call such as `0/.` falls in none of the four buckets
//! and is reported under [`Classification::unclassified`].

use crate::core::alleles::{
    allele_base, is_all_missing, is_missing_allele, is_phased, split_genotype, to_iupac, Bases,
    PHASED_SEP, UNPHASED_SEP,
};
use crate::core::RecordResult;
use crate::formats::vcf::Record;
use indexmap::IndexMap;

/// Default FORMAT tag for genotype queries
pub const DEFAULT_TAG: &str = "GT";

/// sample name -> tag value (raw or converted)
pub type SampleValues = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenotypeClass {
    HomRef,
    HomVar,
    HetVar,
    Missing,
}

/// Classify one call from its allele tokens
///
/// Returns `None` for partially missing calls.
pub fn classify_tokens(tokens: &[&str]) -> Option<GenotypeClass> {
    let missing = tokens.iter().filter(|t| is_missing_allele(t)).count();
    if missing == tokens.len() {
        return Some(GenotypeClass::Missing);
    }
    if missing > 0 {
        return None;
    }

    let first = tokens[0];
    if tokens.iter().all(|t| *t == first) {
        if first == "0" {
            Some(GenotypeClass::HomRef)
        } else {
            Some(GenotypeClass::HomVar)
        }
    } else {
        Some(GenotypeClass::HetVar)
    }
}

/// Classify a raw genotype value such as `0/1` or `1|1`
#[inline]
pub fn classify_value(value: &str) -> Option<GenotypeClass> {
    classify_tokens(&split_genotype(value))
}

/// Every bucket for one record and one tag, computed in a single pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub hom_ref: SampleValues,
    pub hom_var: SampleValues,
    pub het_var: SampleValues,
    /// Raw values, never converted
    pub missing: SampleValues,
    /// Samples whose value contains `|`
    pub phased: Vec<String>,
    /// Partially missing calls
    pub unclassified: Vec<String>,
}

impl Classification {
    pub fn class_of(&self, sample: &str) -> Option<GenotypeClass> {
        if self.hom_ref.contains_key(sample) {
            Some(GenotypeClass::HomRef)
        } else if self.hom_var.contains_key(sample) {
            Some(GenotypeClass::HomVar)
        } else if self.het_var.contains_key(sample) {
            Some(GenotypeClass::HetVar)
        } else if self.missing.contains_key(sample) {
            Some(GenotypeClass::Missing)
        } else {
            None
        }
    }

    /// Number of samples in the four buckets
    pub fn classified_count(&self) -> usize {
        self.hom_ref.len() + self.hom_var.len() + self.het_var.len() + self.missing.len()
    }
}

/// Genotype queries over one record
#[derive(Debug, Clone, Copy)]
pub struct GenotypeProperty<'r> {
    record: &'r Record,
}

impl<'r> GenotypeProperty<'r> {
    pub fn new(record: &'r Record) -> Self {
        Self { record }
    }

    fn render(&self, value: &str, bases: Bases) -> RecordResult<String> {
        Ok(to_iupac(self.record.ref_alt(), value, bases)?)
    }

    /// `(sample, raw value)` for every sample
    fn values(&self, tag: &str) -> RecordResult<Vec<(&'r str, &'r str)>> {
        let record = self.record;
        record
            .sample_names
            .iter()
            .map(|name| Ok((name.as_str(), record.tag_value(name, tag)?)))
            .collect()
    }

    /// Samples whose raw value satisfies `pred`, rendered per `bases`
    fn select<F>(&self, tag: &str, bases: Bases, mut pred: F) -> RecordResult<SampleValues>
    where
        F: FnMut(&str) -> RecordResult<bool>,
    {
        let mut out = SampleValues::new();
        for (name, value) in self.values(tag)? {
            if pred(value)? {
                out.insert(name.to_string(), self.render(value, bases)?);
            }
        }
        Ok(out)
    }

    /// Bucket every sample in one pass
    pub fn classify(&self, tag: &str, bases: Bases) -> RecordResult<Classification> {
        let mut result = Classification::default();
        for (name, value) in self.values(tag)? {
            if is_phased(value) {
                result.phased.push(name.to_string());
            }
            match classify_value(value) {
                Some(GenotypeClass::HomRef) => {
                    result.hom_ref.insert(name.to_string(), self.render(value, bases)?);
                }
                Some(GenotypeClass::HomVar) => {
                    result.hom_var.insert(name.to_string(), self.render(value, bases)?);
                }
                Some(GenotypeClass::HetVar) => {
                    result.het_var.insert(name.to_string(), self.render(value, bases)?);
                }
                Some(GenotypeClass::Missing) => {
                    result.missing.insert(name.to_string(), value.to_string());
                }
                None => result.unclassified.push(name.to_string()),
            }
        }
        Ok(result)
    }

    fn bucket(&self, tag: &str, bases: Bases, class: GenotypeClass) -> RecordResult<SampleValues> {
        self.select(tag, bases, |v| Ok(classify_value(v) == Some(class)))
    }

    pub fn is_homref(&self, tag: &str, bases: Bases) -> RecordResult<SampleValues> {
        self.bucket(tag, bases, GenotypeClass::HomRef)
    }

    pub fn is_homvar(&self, tag: &str, bases: Bases) -> RecordResult<SampleValues> {
        self.bucket(tag, bases, GenotypeClass::HomVar)
    }

    pub fn is_hetvar(&self, tag: &str, bases: Bases) -> RecordResult<SampleValues> {
        self.bucket(tag, bases, GenotypeClass::HetVar)
    }

    /// Fully missing calls, raw values
    pub fn is_missing(&self, tag: &str) -> RecordResult<SampleValues> {
        self.bucket(tag, Bases::Numeric, GenotypeClass::Missing)
    }

    /// Samples carrying `allele`, given either as an index (`"1"`) or a base
    /// (`"A"`)
    pub fn has_allele(&self, allele: &str, tag: &str, bases: Bases) -> RecordResult<SampleValues> {
        let ref_alt = self.record.ref_alt();
        self.select(tag, bases, |value| {
            Ok(split_genotype(value).into_iter().any(|token| {
                token == allele
                    || (!is_missing_allele(token)
                        && allele_base(ref_alt, token).is_ok_and(|base| base == allele))
            }))
        })
    }

    /// Samples whose genotype equals `genotype` in numeric or base form
    pub fn has_var(&self, genotype: &str, tag: &str, bases: Bases) -> RecordResult<SampleValues> {
        self.select(tag, bases, |value| {
            Ok(value == genotype || self.render(value, Bases::Iupac)? == genotype)
        })
    }

    /// Samples with no called allele (`.`, `./.`, `.|.`), raw values
    pub fn has_no_var(&self, tag: &str) -> RecordResult<SampleValues> {
        self.select(tag, Bases::Numeric, |value| Ok(is_all_missing(value)))
    }

    /// Samples whose value contains `|`
    pub fn has_phased(&self, tag: &str, bases: Bases) -> RecordResult<SampleValues> {
        self.select(tag, bases, |value| Ok(value.contains(PHASED_SEP)))
    }

    /// Samples whose value contains `/` and no `|`
    pub fn has_unphased(&self, tag: &str, bases: Bases) -> RecordResult<SampleValues> {
        self.select(tag, bases, |value| {
            Ok(value.contains(UNPHASED_SEP) && !value.contains(PHASED_SEP))
        })
    }

    pub fn has_snp(&self) -> bool {
        self.record.has_snp()
    }

    pub fn has_indel(&self) -> bool {
        self.record.has_indel()
    }
}
