
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::data_types::analysis_result::AnalysisResult;
use crate::data_types::phenotype::PhenotypePrediction;

/// This is a wrapper for writing the per-drug risk table to a file
pub struct RiskSummaryWriter<'a> {
    /// The full analysis we are summarizing
    results: &'a AnalysisResult
}

/// Contains all the data written to each row of our summary file
#[derive(Serialize)]
struct RiskSummaryRow {
    /// The requested drug name, echoed as provided
    drug: String,
    /// The governing gene, or "N/A" for an unrecognized drug
    gene: String,
    /// The resolved diplotype for the gene
    diplotype: String,
    /// The predicted metabolizer phenotype
    phenotype: String,
    /// The activity score backing the phenotype, if computable
    activity_score: String,
    /// The assessed risk category
    risk_category: String,
    /// The assessed severity
    severity: String,
    /// Confidence in the assessment
    confidence: f64,
    /// True if the severity is high enough to flag
    flagged: bool
}

impl<'a> RiskSummaryWriter<'a> {
    pub fn new(results: &'a AnalysisResult) -> Self {
        Self { results }
    }

    /// Will write the summary out to the given file path
    /// # Arguments
    /// * `filename` - the filename for the output (tsv/csv)
    pub fn write_summary(&self, filename: &Path) -> csv::Result<()> {
        // modify the delimiter to "," if it ends with .csv
        let is_csv: bool = filename.extension().unwrap_or_default() == "csv";
        let delimiter: u8 = if is_csv { b',' } else { b'\t' };
        let mut csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_path(filename)?;

        // one row per assessment, in report order
        for assessment in self.results.assessments().iter() {
            let prediction = assessment.gene()
                .and_then(|gene| {
                    self.results.phenotypes().iter().find(|p| p.gene() == gene)
                });
            let row = RiskSummaryRow::new(assessment.drug(), assessment.gene(), prediction,
                assessment.risk_category().to_string(), assessment.severity().to_string(),
                assessment.confidence(), assessment.severity().is_flagged());
            csv_writer.serialize(&row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

impl RiskSummaryRow {
    /// Creates a new row from an assessment and its backing prediction, if any
    fn new(
        drug: &str, gene: Option<&str>, prediction: Option<&PhenotypePrediction>,
        risk_category: String, severity: String, confidence: f64, flagged: bool
    ) -> Self {
        let (diplotype, phenotype, activity_score) = match prediction {
            Some(p) => (
                p.diplotype().to_string(),
                p.phenotype_name().to_string(),
                p.activity_score().map(|s| format!("{s:.1}")).unwrap_or_else(|| "N/A".to_string())
            ),
            None => ("N/A".to_string(), "N/A".to_string(), "N/A".to_string())
        };
        Self {
            drug: drug.to_string(),
            gene: gene.unwrap_or("N/A").to_string(),
            diplotype,
            phenotype,
            activity_score,
            risk_category,
            severity,
            confidence,
            flagged
        }
    }
}
