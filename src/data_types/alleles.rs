
use serde::{Deserialize, Serialize};

/// The star-allele label assigned when no defining variant is observed for a gene
pub const REFERENCE_ALLELE: &str = "*1";

/// Functional effect tag for a star allele
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize, strum_macros::Display, strum_macros::EnumString)]
pub enum AlleleFunction {
    /// Fully functional allele
    #[serde(alias = "Normal function", alias = "normal")]
    #[strum(serialize = "Normal", ascii_case_insensitive)]
    Normal,
    /// Partially functional allele
    #[serde(alias = "Decreased function", alias = "decreased")]
    #[strum(serialize = "Decreased", ascii_case_insensitive)]
    Decreased,
    /// Non-functional allele
    #[serde(alias = "No function", alias = "no_function", alias = "no-function")]
    #[strum(to_string = "NoFunction", serialize = "No function", ascii_case_insensitive)]
    NoFunction,
    /// Allele with increased activity, e.g. a gene duplication haplotype
    #[serde(alias = "Increased function", alias = "increased")]
    #[strum(serialize = "Increased", ascii_case_insensitive)]
    Increased,
    /// Uncharacterized allele
    #[default]
    #[serde(alias = "Uncertain function", alias = "unknown")]
    #[strum(serialize = "Unknown", ascii_case_insensitive)]
    Unknown
}

impl AlleleFunction {
    /// Sort rank with the most deleterious function first.
    /// Used by the ambiguity tie-break in the allele solver.
    pub fn deleterious_rank(&self) -> u8 {
        match self {
            AlleleFunction::NoFunction => 0,
            AlleleFunction::Decreased => 1,
            AlleleFunction::Normal => 2,
            AlleleFunction::Increased => 3,
            AlleleFunction::Unknown => 4
        }
    }

    /// The numeric weight this function contributes to an activity score.
    /// Returns None when the function is uncharacterized, which makes the score non-computable.
    pub fn activity_weight(&self) -> Option<f64> {
        match self {
            AlleleFunction::Normal => Some(1.0),
            AlleleFunction::Decreased => Some(0.5),
            AlleleFunction::NoFunction => Some(0.0),
            AlleleFunction::Increased => Some(2.0),
            AlleleFunction::Unknown => None
        }
    }
}

/// A gene plus an unordered pair of star-allele labels.
/// The pair is canonicalized by a lexicographic sort at construction, so
/// {*4,*1} and {*1,*4} always produce the same lookup key and output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Diplotype {
    /// The gene this diplotype belongs to
    gene: String,
    /// First star allele in canonical order
    allele1: String,
    /// Second star allele in canonical order
    allele2: String,
    /// Set when the pair was picked by the ambiguity tie-break instead of direct observation
    low_confidence: bool
}

impl Diplotype {
    /// Creates a new diplotype, canonicalizing the allele pair order.
    /// # Arguments
    /// * `gene` - the gene name
    /// * `allele_a` - one star-allele label
    /// * `allele_b` - the other star-allele label
    /// * `low_confidence` - true if the pair came from the ambiguity tie-break
    pub fn new(gene: &str, allele_a: &str, allele_b: &str, low_confidence: bool) -> Self {
        let (allele1, allele2) = if allele_a <= allele_b {
            (allele_a.to_string(), allele_b.to_string())
        } else {
            (allele_b.to_string(), allele_a.to_string())
        };

        Self {
            gene: gene.to_string(),
            allele1, allele2,
            low_confidence
        }
    }

    /// Creates the default homozygous reference diplotype (*1/*1) for a gene.
    /// # Arguments
    /// * `gene` - the gene name
    pub fn homozygous_reference(gene: &str) -> Self {
        Self::new(gene, REFERENCE_ALLELE, REFERENCE_ALLELE, false)
    }

    /// Returns the canonical "a/b" key used for table lookups and output
    pub fn diplotype_string(&self) -> String {
        format!("{}/{}", self.allele1, self.allele2)
    }

    /// Returns true if both alleles are the reference label
    pub fn is_homozygous_reference(&self) -> bool {
        self.allele1 == REFERENCE_ALLELE && self.allele2 == REFERENCE_ALLELE
    }

    // getters
    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn allele1(&self) -> &str {
        &self.allele1
    }

    pub fn allele2(&self) -> &str {
        &self.allele2
    }

    pub fn is_low_confidence(&self) -> bool {
        self.low_confidence
    }
}
