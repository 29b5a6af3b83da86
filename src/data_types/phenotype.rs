
use serde::{Deserialize, Serialize};

use crate::data_types::alleles::Diplotype;

/// Confidence assigned to an exact diplotype table hit
pub const CONFIDENCE_EXACT: f64 = 1.0;
/// Confidence assigned to the activity-score formula fallback
pub const CONFIDENCE_FORMULA: f64 = 0.6;
/// Confidence assigned to an indeterminate outcome
pub const CONFIDENCE_INDETERMINATE: f64 = 0.0;
/// Cap applied when the diplotype itself came from the ambiguity tie-break
pub const CONFIDENCE_AMBIGUOUS_CAP: f64 = 0.5;

/// The closed set of metabolizer phenotypes
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, strum_macros::Display, strum_macros::EnumString)]
pub enum Phenotype {
    #[serde(alias = "Poor Metabolizer")]
    #[strum(to_string = "Poor", serialize = "Poor Metabolizer", ascii_case_insensitive)]
    Poor,
    #[serde(alias = "Intermediate Metabolizer")]
    #[strum(to_string = "Intermediate", serialize = "Intermediate Metabolizer", ascii_case_insensitive)]
    Intermediate,
    #[serde(alias = "Normal Metabolizer")]
    #[strum(to_string = "Normal", serialize = "Normal Metabolizer", ascii_case_insensitive)]
    Normal,
    #[serde(alias = "Rapid Metabolizer")]
    #[strum(to_string = "Rapid", serialize = "Rapid Metabolizer", ascii_case_insensitive)]
    Rapid,
    #[serde(alias = "Ultrarapid Metabolizer")]
    #[strum(to_string = "Ultrarapid", serialize = "Ultrarapid Metabolizer", ascii_case_insensitive)]
    Ultrarapid,
    /// Valid low-confidence outcome when an allele function is uncharacterized; not an error
    #[strum(serialize = "Indeterminate", ascii_case_insensitive)]
    Indeterminate
}

impl Phenotype {
    /// Buckets a computed activity score into a phenotype.
    /// Thresholds follow the CPIC activity-score convention.
    /// # Arguments
    /// * `score` - the summed activity weight of both alleles
    pub fn from_activity_score(score: f64) -> Self {
        if score <= 0.0 {
            Phenotype::Poor
        } else if score <= 1.0 {
            Phenotype::Intermediate
        } else if score <= 2.0 {
            Phenotype::Normal
        } else if score <= 2.5 {
            Phenotype::Rapid
        } else {
            Phenotype::Ultrarapid
        }
    }

    /// Returns the human-readable expanded phenotype name
    pub fn expanded_name(&self) -> &'static str {
        match self {
            Phenotype::Poor => "Poor Metabolizer",
            Phenotype::Intermediate => "Intermediate Metabolizer",
            Phenotype::Normal => "Normal Metabolizer",
            Phenotype::Rapid => "Rapid Metabolizer",
            Phenotype::Ultrarapid => "Ultrarapid Metabolizer",
            Phenotype::Indeterminate => "Indeterminate"
        }
    }
}

/// One gene's phenotype prediction, fully recomputed on each analysis run
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PhenotypePrediction {
    /// The gene the prediction is for
    gene: String,
    /// The canonical diplotype key, e.g. "*1/*4"
    diplotype: String,
    /// The predicted metabolizer phenotype
    phenotype: Phenotype,
    /// The human-readable expanded phenotype name
    phenotype_name: String,
    /// The numeric activity score; None when not computable
    activity_score: Option<f64>,
    /// Confidence in [0, 1]
    confidence: f64,
    /// True when the diplotype came from the unphased ambiguity tie-break
    ambiguous_phasing: bool
}

impl PhenotypePrediction {
    /// Creates a new prediction for a resolved diplotype.
    /// A low-confidence diplotype caps the final confidence, regardless of how the phenotype was found.
    /// # Arguments
    /// * `diplotype` - the canonical diplotype the phenotype was derived from
    /// * `phenotype` - the predicted phenotype
    /// * `activity_score` - the activity score, if one was computable
    /// * `confidence` - the base confidence from the prediction path
    pub fn new(diplotype: &Diplotype, phenotype: Phenotype, activity_score: Option<f64>, confidence: f64) -> Self {
        let ambiguous_phasing = diplotype.is_low_confidence();
        let confidence = if ambiguous_phasing {
            confidence.min(CONFIDENCE_AMBIGUOUS_CAP)
        } else {
            confidence
        };

        Self {
            gene: diplotype.gene().to_string(),
            diplotype: diplotype.diplotype_string(),
            phenotype,
            phenotype_name: phenotype.expanded_name().to_string(),
            activity_score,
            confidence,
            ambiguous_phasing
        }
    }

    // getters
    pub fn gene(&self) -> &str {
        &self.gene
    }

    pub fn diplotype(&self) -> &str {
        &self.diplotype
    }

    pub fn phenotype(&self) -> Phenotype {
        self.phenotype
    }

    pub fn phenotype_name(&self) -> &str {
        &self.phenotype_name
    }

    pub fn activity_score(&self) -> Option<f64> {
        self.activity_score
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn is_ambiguous_phasing(&self) -> bool {
        self.ambiguous_phasing
    }
}
