
use serde::{Deserialize, Serialize};

/// The closed set of drug risk categories
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, strum_macros::Display, strum_macros::EnumString)]
pub enum RiskCategory {
    #[strum(serialize = "Safe", ascii_case_insensitive)]
    Safe,
    #[serde(alias = "Adjust Dosage")]
    #[strum(to_string = "Adjust Dosage", serialize = "AdjustDosage", ascii_case_insensitive)]
    AdjustDosage,
    #[strum(serialize = "Toxic", ascii_case_insensitive)]
    Toxic,
    #[strum(serialize = "Ineffective", ascii_case_insensitive)]
    Ineffective,
    #[strum(serialize = "Unknown", ascii_case_insensitive)]
    Unknown
}

/// Severity levels with a fixed total ordering; the derived Ord is what
/// the report aggregation relies on, so the variant order here is load-bearing.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, strum_macros::Display, strum_macros::EnumString)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    #[strum(to_string = "none", ascii_case_insensitive)]
    None=0,
    #[strum(to_string = "low", ascii_case_insensitive)]
    Low,
    #[strum(to_string = "moderate", ascii_case_insensitive)]
    Moderate,
    #[strum(to_string = "high", ascii_case_insensitive)]
    High,
    #[strum(to_string = "critical", ascii_case_insensitive)]
    Critical
}

impl Severity {
    /// Returns true if this severity should raise a flag in the overall report
    pub fn is_flagged(&self) -> bool {
        *self >= Severity::High
    }
}

/// One drug's risk assessment for one governing gene.
/// A drug mapped to multiple genes produces one of these per gene.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DrugRiskAssessment {
    /// The drug name exactly as requested by the caller
    drug: String,
    /// The governing gene; None when the drug is entirely unknown to the table
    gene: Option<String>,
    /// The risk category
    risk_category: RiskCategory,
    /// The severity of the finding
    severity: Severity,
    /// Confidence in [0, 1]
    confidence: f64,
    /// Guideline citation text, when available
    citation: Option<String>,
    /// Clinical recommendation text
    recommendation: String
}

impl DrugRiskAssessment {
    /// Creates a new assessment from an interaction table hit.
    /// # Arguments
    /// * `drug` - the drug name as requested, echoed verbatim
    /// * `gene` - the governing gene
    /// * `risk_category` - the looked-up risk category
    /// * `severity` - the looked-up severity
    /// * `confidence` - the table's confidence for this interaction
    /// * `citation` - optional guideline citation
    /// * `recommendation` - the recommendation text
    pub fn new(
        drug: &str, gene: &str, risk_category: RiskCategory, severity: Severity,
        confidence: f64, citation: Option<String>, recommendation: String
    ) -> Self {
        Self {
            drug: drug.to_string(),
            gene: Some(gene.to_string()),
            risk_category, severity, confidence,
            citation, recommendation
        }
    }

    /// Creates the single assessment for a drug the interaction table knows nothing about.
    /// # Arguments
    /// * `drug` - the drug name as requested, echoed verbatim
    pub fn unknown_drug(drug: &str) -> Self {
        Self {
            drug: drug.to_string(),
            gene: None,
            risk_category: RiskCategory::Unknown,
            severity: Severity::None,
            confidence: 0.0,
            citation: None,
            recommendation: format!("No pharmacogenomic guidance exists for {drug}.")
        }
    }

    /// Creates the degraded assessment for a known drug whose (gene, phenotype)
    /// combination is not tabulated. Never fabricates a category.
    /// # Arguments
    /// * `drug` - the drug name as requested, echoed verbatim
    /// * `gene` - the governing gene that lacked an entry
    pub fn unknown_interaction(drug: &str, gene: &str) -> Self {
        Self {
            drug: drug.to_string(),
            gene: Some(gene.to_string()),
            risk_category: RiskCategory::Unknown,
            severity: Severity::None,
            confidence: 0.0,
            citation: None,
            recommendation: format!("No guideline entry covers {drug} for the predicted {gene} phenotype.")
        }
    }

    // getters
    pub fn drug(&self) -> &str {
        &self.drug
    }

    pub fn gene(&self) -> Option<&str> {
        self.gene.as_deref()
    }

    pub fn risk_category(&self) -> RiskCategory {
        self.risk_category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn citation(&self) -> Option<&str> {
        self.citation.as_deref()
    }

    pub fn recommendation(&self) -> &str {
        &self.recommendation
    }
}

/// The overall risk level derived from the full assessment list; no hidden state
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverallRisk {
    /// The worst severity observed across all assessments
    level: Severity,
    /// The drug names of every assessment at or above High severity, in assessment order
    flags: Vec<String>
}

impl OverallRisk {
    /// Derives the overall risk from an assessment list.
    /// # Arguments
    /// * `assessments` - all produced per-drug assessments
    pub fn from_assessments(assessments: &[DrugRiskAssessment]) -> Self {
        let level = assessments.iter()
            .map(|a| a.severity())
            .max()
            .unwrap_or(Severity::None);

        let flags = assessments.iter()
            .filter(|a| a.severity().is_flagged())
            .map(|a| a.drug().to_string())
            .collect();

        Self {
            level, flags
        }
    }

    // getters
    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }
}
