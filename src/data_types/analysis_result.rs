
use serde::Serialize;

use crate::data_types::phenotype::PhenotypePrediction;
use crate::data_types::risk::{DrugRiskAssessment, OverallRisk};

/// File-level accounting for a decoded variant file
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FileSummary {
    /// Declared file format version, if the header carried one
    file_format: Option<String>,
    /// Sample names declared on the column header line
    sample_names: Vec<String>,
    /// Total number of successfully decoded records
    total_records: usize,
    /// Number of records that matched a pharmacogene table entry
    matched_records: usize,
    /// Number of data lines skipped as malformed
    skipped_lines: usize,
    /// Rendered decode errors, possibly truncated by the analysis config
    decode_errors: Vec<String>
}

impl FileSummary {
    /// Creates a new summary from decode accounting.
    /// # Arguments
    /// * `file_format` - declared format version
    /// * `sample_names` - sample columns from the header
    /// * `total_records` - decoded record count
    /// * `matched_records` - count of records matched to the knowledge table
    /// * `skipped_lines` - count of malformed data lines
    /// * `decode_errors` - rendered per-line errors, already capped
    pub fn new(
        file_format: Option<String>, sample_names: Vec<String>,
        total_records: usize, matched_records: usize,
        skipped_lines: usize, decode_errors: Vec<String>
    ) -> Self {
        Self {
            file_format, sample_names,
            total_records, matched_records,
            skipped_lines, decode_errors
        }
    }

    // getters
    pub fn file_format(&self) -> Option<&str> {
        self.file_format.as_deref()
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn matched_records(&self) -> usize {
        self.matched_records
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn decode_errors(&self) -> &[String] {
        &self.decode_errors
    }
}

/// The complete output of one analysis run.
/// Contains no timestamps or randomness, so identical inputs serialize identically.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// File-level metadata and decode accounting
    summary: FileSummary,
    /// One prediction per pharmacogene in the knowledge table, in table order
    phenotypes: Vec<PhenotypePrediction>,
    /// Per-drug assessments in request order; multi-gene drugs contribute one entry per gene
    assessments: Vec<DrugRiskAssessment>,
    /// The aggregate risk over all assessments
    overall_risk: OverallRisk
}

impl AnalysisResult {
    /// Assembles the final result, deriving the overall risk from the assessments.
    /// # Arguments
    /// * `summary` - file-level accounting
    /// * `phenotypes` - the per-gene predictions
    /// * `assessments` - the per-drug assessments
    pub fn new(
        summary: FileSummary, phenotypes: Vec<PhenotypePrediction>,
        assessments: Vec<DrugRiskAssessment>
    ) -> Self {
        let overall_risk = OverallRisk::from_assessments(&assessments);
        Self {
            summary, phenotypes, assessments, overall_risk
        }
    }

    // getters
    pub fn summary(&self) -> &FileSummary {
        &self.summary
    }

    pub fn phenotypes(&self) -> &[PhenotypePrediction] {
        &self.phenotypes
    }

    pub fn assessments(&self) -> &[DrugRiskAssessment] {
        &self.assessments
    }

    pub fn overall_risk(&self) -> &OverallRisk {
        &self.overall_risk
    }
}
