//! Allele utilities
//!
//! Conversion between numeric genotype calls (`0/1`, `1|2`, `./.`) and the
//! nucleotide strings they index in a record's REF/ALT list.
//!
//! The REF/ALT list ("ref_alt") is always `[REF, ALT1, ALT2, ...]`, so
//! allele index `0` is REF and index `k` is the k-th ALT allele.

use crate::core::error::{AlleleError, AlleleResult};
use std::fmt;
use std::str::FromStr;

/// Marker for a missing allele call
pub const MISSING: &str = ".";

/// Unphased genotype separator
pub const UNPHASED_SEP: char = '/';

/// Phased genotype separator
pub const PHASED_SEP: char = '|';

/// How genotype values are rendered in query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bases {
    /// Keep allele indices as written (`0/1`)
    #[default]
    Numeric,
    /// Replace indices with REF/ALT nucleotides (`A/G`)
    Iupac,
}

impl FromStr for Bases {
    type Err = AlleleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "numeric" => Ok(Bases::Numeric),
            "iupac" => Ok(Bases::Iupac),
            _ => Err(AlleleError::UnknownBasesMode { value: s.to_string() }),
        }
    }
}

impl fmt::Display for Bases {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bases::Numeric => write!(f, "numeric"),
            Bases::Iupac => write!(f, "iupac"),
        }
    }
}

/// Split a genotype value into per-allele tokens on `/` or `|`
///
/// # Examples
/// ```
/// use fast_vcfparser::core::alleles::split_genotype;
///
/// assert_eq!(split_genotype("0/1"), vec!["0", "1"]);
/// assert_eq!(split_genotype("1|2|."), vec!["1", "2", "."]);
/// assert_eq!(split_genotype("1"), vec!["1"]);
/// ```
#[inline]
pub fn split_genotype(value: &str) -> Vec<&str> {
    value.split([UNPHASED_SEP, PHASED_SEP]).collect()
}

/// Separator used when re-joining converted tokens
///
/// `/` wins whenever it is present, otherwise `|`.
#[inline]
pub fn genotype_separator(value: &str) -> char {
    if value.contains(UNPHASED_SEP) {
        UNPHASED_SEP
    } else {
        PHASED_SEP
    }
}

/// Whether a genotype value is phased (contains `|`)
#[inline]
pub fn is_phased(value: &str) -> bool {
    value.contains(PHASED_SEP)
}

/// Whether one allele token is a missing call
///
/// An empty token (e.g. a blank GT under `GT:DP` written as `:7`) counts as
/// missing, same as `.`.
#[inline]
pub fn is_missing_allele(token: &str) -> bool {
    token == MISSING || token.is_empty()
}

/// Whether every allele token of a genotype value is missing
#[inline]
pub fn is_all_missing(value: &str) -> bool {
    value.split([UNPHASED_SEP, PHASED_SEP]).all(is_missing_allele)
}

/// Look up the nucleotide string for one numeric allele token
pub fn allele_base<'a, S: AsRef<str>>(ref_alt: &'a [S], token: &str) -> AlleleResult<&'a str> {
    let index: usize = token
        .parse()
        .map_err(|_| AlleleError::InvalidIndex { token: token.to_string() })?;
    ref_alt
        .get(index)
        .map(|s| s.as_ref())
        .ok_or(AlleleError::IndexOutOfRange { index, len: ref_alt.len() })
}

/// Convert a numeric genotype to REF/ALT bases
///
/// With [`Bases::Numeric`] the value is returned unchanged. Otherwise each
/// non-missing token `i` becomes `ref_alt[i]`, `.` stays `.`, and tokens are
/// re-joined with the value's own separator.
///
/// # Examples
/// ```
/// use fast_vcfparser::core::alleles::{to_iupac, Bases};
///
/// let ref_alt = ["G", "A", "C"];
/// assert_eq!(to_iupac(&ref_alt, "0/1", Bases::Iupac).unwrap(), "G/A");
/// assert_eq!(to_iupac(&ref_alt, "2|.", Bases::Iupac).unwrap(), "C|.");
/// assert_eq!(to_iupac(&ref_alt, "0/1", Bases::Numeric).unwrap(), "0/1");
/// ```
pub fn to_iupac<S: AsRef<str>>(ref_alt: &[S], numeric: &str, bases: Bases) -> AlleleResult<String> {
    if bases == Bases::Numeric {
        return Ok(numeric.to_string());
    }

    let sep = genotype_separator(numeric);
    let mut out = String::with_capacity(numeric.len() * 2);
    for (i, token) in split_genotype(numeric).into_iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        if token == MISSING {
            out.push_str(MISSING);
        } else {
            out.push_str(allele_base(ref_alt, token)?);
        }
    }
    Ok(out)
}

/// Convert a base genotype (`A/G`) back to allele indices (`0/1`)
///
/// Each base is replaced with the index of its first occurrence in
/// `ref_alt`; `.` stays `.`.
pub fn iupac_to_numeric<S: AsRef<str>>(ref_alt: &[S], iupac: &str) -> AlleleResult<String> {
    let sep = genotype_separator(iupac);
    let mut out = String::with_capacity(iupac.len());
    for (i, base) in split_genotype(iupac).into_iter().enumerate() {
        if i > 0 {
            out.push(sep);
        }
        if base == MISSING {
            out.push_str(MISSING);
            continue;
        }
        let index = ref_alt
            .iter()
            .position(|a| a.as_ref() == base)
            .ok_or_else(|| AlleleError::UnknownBase { base: base.to_string() })?;
        out.push_str(&index.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bases_from_str() {
        assert_eq!("numeric".parse::<Bases>().unwrap(), Bases::Numeric);
        assert_eq!("IUPAC".parse::<Bases>().unwrap(), Bases::Iupac);
        assert!(matches!(
            "iupca".parse::<Bases>(),
            Err(AlleleError::UnknownBasesMode { .. })
        ));
    }

    #[test]
    fn test_to_iupac_conversion() {
        let ref_alt = ["A", "G", "T"];
        assert_eq!(to_iupac(&ref_alt, "0/1", Bases::Iupac).unwrap(), "A/G");
        assert_eq!(to_iupac(&ref_alt, "1|2", Bases::Iupac).unwrap(), "G|T");
    }

    #[test]
    fn test_to_iupac_missing_data() {
        let ref_alt = ["A", "G"];
        assert_eq!(to_iupac(&ref_alt, "./.", Bases::Iupac).unwrap(), "./.");
        assert_eq!(to_iupac(&ref_alt, ".", Bases::Iupac).unwrap(), ".");
        assert_eq!(to_iupac(&ref_alt, "0/.", Bases::Iupac).unwrap(), "A/.");
    }

    #[test]
    fn test_to_iupac_haploid_and_polyploid() {
        let ref_alt = ["AT", "A"];
        assert_eq!(to_iupac(&ref_alt, "1", Bases::Iupac).unwrap(), "A");
        assert_eq!(to_iupac(&ref_alt, "0/0/1/1", Bases::Iupac).unwrap(), "AT/AT/A/A");
    }

    #[test]
    fn test_to_iupac_index_out_of_range() {
        let ref_alt = ["A", "G"];
        let err = to_iupac(&ref_alt, "0/3", Bases::Iupac).unwrap_err();
        assert_eq!(err, AlleleError::IndexOutOfRange { index: 3, len: 2 });
    }

    #[test]
    fn test_to_iupac_invalid_token() {
        let ref_alt = ["A", "G"];
        let err = to_iupac(&ref_alt, "0/x", Bases::Iupac).unwrap_err();
        assert_eq!(err, AlleleError::InvalidIndex { token: "x".to_string() });
    }

    #[test]
    fn test_numeric_passthrough_skips_validation() {
        let ref_alt = ["A"];
        assert_eq!(to_iupac(&ref_alt, "5/7", Bases::Numeric).unwrap(), "5/7");
    }

    #[test]
    fn test_iupac_to_numeric() {
        let ref_alt = ["A", "G", "T"];
        assert_eq!(iupac_to_numeric(&ref_alt, "A/G").unwrap(), "0/1");
        assert_eq!(iupac_to_numeric(&ref_alt, "G|T").unwrap(), "1|2");
        assert_eq!(iupac_to_numeric(&ref_alt, "./T").unwrap(), "./2");
    }

    #[test]
    fn test_iupac_to_numeric_unknown_base() {
        let ref_alt = ["A", "G"];
        let err = iupac_to_numeric(&ref_alt, "A/C").unwrap_err();
        assert_eq!(err, AlleleError::UnknownBase { base: "C".to_string() });
    }

    #[test]
    fn test_genotype_helpers() {
        assert!(is_phased("0|1"));
        assert!(!is_phased("0/1"));
        assert!(is_all_missing("./."));
        assert!(is_all_missing(".|."));
        assert!(is_all_missing("."));
        assert!(!is_all_missing("0/."));
        assert!(is_all_missing(""));
        assert!(is_all_missing("/."));
        assert!(is_missing_allele(""));
        assert!(!is_missing_allele("0"));
        assert_eq!(genotype_separator("0|1/2"), '/');
        assert_eq!(genotype_separator("1"), '|');
    }
}
