
use derive_builder::Builder;
use log::{debug, warn};

use crate::allele_solver::solve_diplotype;
use crate::data_types::analysis_result::{AnalysisResult, FileSummary};
use crate::data_types::phenotype::PhenotypePrediction;
use crate::data_types::risk::DrugRiskAssessment;
use crate::database::pgx_database::PgxDatabase;
use crate::parsing::vcf_reader::{decode_variant_file, VcfError};
use crate::phenotype_caller::predict_phenotype;
use crate::risk_solver::assess_drug;
use crate::variant_filter::filter_variants;

/// Controls the per-request knobs of an analysis run
#[derive(Builder, Clone, Debug)]
#[builder(default)]
pub struct AnalysisConfig {
    /// The sample to analyze; None selects the first sample column
    sample_name: Option<String>,
    /// Maximum number of decode errors rendered into the result summary
    max_reported_errors: usize
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        // these settings are set to reasonable defaults for unit tests
        // main.rs will set each of them manually based on user input
        Self {
            sample_name: None,
            max_reported_errors: 50
        }
    }
}

/// The failures that abort an analysis request outright.
/// Per-line decode problems, unknown drugs, and indeterminate phenotypes are
/// all surfaced inside a successful result instead.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("no drugs were requested for assessment")]
    EmptyDrugList,
    #[error(transparent)]
    Decode(#[from] VcfError)
}

/// Runs the full resolution pipeline for one request.
///
/// The stages run as a strict sequential pipeline: decode, filter, resolve
/// diplotypes, predict phenotypes, assess drugs, aggregate. The call is
/// stateless and reads only the injected database, so independent requests may
/// run concurrently against the same `PgxDatabase` without synchronization.
/// Identical inputs produce identical results; nothing here consults a clock
/// or randomness.
/// # Arguments
/// * `file_content` - the raw variant file bytes, plain text or gzipped
/// * `drug_names` - the drugs to assess, in request order
/// * `database` - the knowledge tables, loaded once at startup
/// * `config` - per-request settings
/// # Errors
/// * if the drug list contains no usable names
/// * if the file yields no decodable records
pub fn analyze(
    file_content: &[u8], drug_names: &[String],
    database: &PgxDatabase, config: &AnalysisConfig
) -> Result<AnalysisResult, AnalysisError> {
    let requested_drugs: Vec<&String> = drug_names.iter()
        .filter(|d| !d.trim().is_empty())
        .collect();
    if requested_drugs.is_empty() {
        return Err(AnalysisError::EmptyDrugList);
    }

    // stage 1: decode
    let decoded = decode_variant_file(file_content)?;
    debug!(
        "Decoded {} records, {} malformed lines skipped",
        decoded.records.len(), decoded.errors.len()
    );

    // stage 2: filter to the pharmacogene tables
    let sample_index = resolve_sample_index(config.sample_name.as_deref(), &decoded.metadata);
    let filtered = filter_variants(&decoded.records, database, sample_index);

    // stages 3 + 4: one diplotype and phenotype per known pharmacogene, in table order;
    // genes with zero matches intentionally resolve to the reference diplotype
    let phenotypes: Vec<PhenotypePrediction> = database.genes().iter()
        .map(|gene| {
            let diplotype = solve_diplotype(gene, filtered.matches_for_gene(gene));
            predict_phenotype(&diplotype, database)
        })
        .collect();

    // stage 5: per-drug assessments, in request order
    let assessments: Vec<DrugRiskAssessment> = requested_drugs.iter()
        .flat_map(|drug| assess_drug(drug.as_str(), &phenotypes, database))
        .collect();

    // stage 6: aggregate
    let decode_errors: Vec<String> = decoded.errors.iter()
        .take(config.max_reported_errors)
        .map(|e| e.to_string())
        .collect();
    let summary = FileSummary::new(
        decoded.metadata.file_format().map(|s| s.to_string()),
        decoded.metadata.sample_names().to_vec(),
        decoded.records.len(),
        filtered.matched_records(),
        decoded.errors.len(),
        decode_errors
    );

    Ok(AnalysisResult::new(summary, phenotypes, assessments))
}

/// Resolves the sample column to analyze, falling back to the first sample
/// with a warning when a requested name is absent.
/// # Arguments
/// * `sample_name` - the configured sample name, if any
/// * `metadata` - the decoded file metadata
fn resolve_sample_index(sample_name: Option<&str>, metadata: &crate::parsing::vcf_reader::VcfMetadata) -> usize {
    match sample_name {
        Some(name) => match metadata.sample_index(name) {
            Some(index) => index,
            None => {
                warn!("Sample {name:?} not found in file, defaulting to the first sample column.");
                0
            }
        },
        None => 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::phenotype::Phenotype;
    use crate::data_types::risk::{RiskCategory, Severity};
    use crate::database::pgx_database::test_database;

    const HEADER: &str = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tPATIENT1\n";

    fn drugs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_poor_metabolizer_scenario() {
        // homozygous 1/1 at the *4-defining site and nothing else for CYP2D6
        let content = format!(
            "{HEADER}chr22\t42126611\trs3892097\tC\tT\t50\tPASS\t.\tGT\t1/1\n"
        );
        let database = test_database();
        let result = analyze(content.as_bytes(), &drugs(&["codeine"]), &database, &Default::default()).unwrap();

        let cyp2d6 = result.phenotypes().iter().find(|p| p.gene() == "CYP2D6").unwrap();
        assert_eq!(cyp2d6.diplotype(), "*4/*4");
        assert_eq!(cyp2d6.phenotype(), Phenotype::Poor);
        assert_eq!(cyp2d6.activity_score(), Some(0.0));
        assert_eq!(cyp2d6.confidence(), 1.0);

        assert_eq!(result.assessments().len(), 1);
        assert_eq!(result.assessments()[0].risk_category(), RiskCategory::Ineffective);
        assert_eq!(result.assessments()[0].severity(), Severity::High);

        assert_eq!(result.overall_risk().level(), Severity::High);
        assert_eq!(result.overall_risk().flags(), &["codeine".to_string()]);
    }

    #[test]
    fn test_no_variant_defaults() {
        // a decodable file with no pharmacogene hits at all
        let content = format!("{HEADER}chr1\t1000\trs111\tA\tG\t50\tPASS\t.\tGT\t0/1\n");
        let database = test_database();
        let result = analyze(content.as_bytes(), &drugs(&["codeine"]), &database, &Default::default()).unwrap();

        // every known pharmacogene reports the reference diplotype at full confidence
        assert_eq!(result.phenotypes().len(), 2);
        for prediction in result.phenotypes() {
            assert_eq!(prediction.diplotype(), "*1/*1");
            assert_eq!(prediction.phenotype(), Phenotype::Normal);
            assert_eq!(prediction.confidence(), 1.0);
        }
        assert_eq!(result.summary().matched_records(), 0);
        assert_eq!(result.summary().total_records(), 1);
    }

    #[test]
    fn test_unknown_drug_echoed_verbatim() {
        let content = format!("{HEADER}chr1\t1000\t.\tA\tG\t50\tPASS\t.\tGT\t0/1\n");
        let database = test_database();
        let result = analyze(content.as_bytes(), &drugs(&["WoNdErDrUg"]), &database, &Default::default()).unwrap();

        assert_eq!(result.assessments().len(), 1);
        assert_eq!(result.assessments()[0].drug(), "WoNdErDrUg");
        assert_eq!(result.assessments()[0].risk_category(), RiskCategory::Unknown);
        assert_eq!(result.overall_risk().level(), Severity::None);
    }

    #[test]
    fn test_warfarin_unconfigured_gene() {
        let content = format!("{HEADER}chr22\t42126611\trs3892097\tC\tT\t50\tPASS\t.\tGT\t1/1\n");
        let database = test_database();
        let result = analyze(content.as_bytes(), &drugs(&["warfarin"]), &database, &Default::default()).unwrap();

        assert_eq!(result.assessments().len(), 1);
        assert_eq!(result.assessments()[0].risk_category(), RiskCategory::Unknown);
        assert_eq!(result.assessments()[0].severity(), Severity::None);
    }

    #[test]
    fn test_partial_decode_failures_reported() {
        let content = format!(
            "{HEADER}chr22\t42126611\trs3892097\tC\tT\t50\tPASS\t.\tGT\t0/1\n\
             chr22\tbroken\trs1\tC\tT\t50\tPASS\t.\tGT\t0/1\n\
             chr10\t94781859\trs4244285\tG\tA\t50\tPASS\t.\tGT\t0/1\n"
        );
        let database = test_database();
        let result = analyze(content.as_bytes(), &drugs(&["codeine"]), &database, &Default::default()).unwrap();
        assert_eq!(result.summary().total_records(), 2);
        assert_eq!(result.summary().skipped_lines(), 1);
        assert_eq!(result.summary().decode_errors().len(), 1);
        assert!(result.summary().decode_errors()[0].contains("line 4"));
        assert_eq!(result.summary().matched_records(), 2);
    }

    #[test]
    fn test_error_report_cap() {
        let mut content = HEADER.to_string();
        content.push_str("chr22\t42126611\trs3892097\tC\tT\t50\tPASS\t.\tGT\t0/1\n");
        for _ in 0..10 {
            content.push_str("chr22\tbad\t.\tC\tT\t50\tPASS\t.\tGT\t0/1\n");
        }
        let database = test_database();
        let config = AnalysisConfigBuilder::default()
            .max_reported_errors(3usize)
            .build()
            .unwrap();
        let result = analyze(content.as_bytes(), &drugs(&["codeine"]), &database, &config).unwrap();
        assert_eq!(result.summary().skipped_lines(), 10);
        assert_eq!(result.summary().decode_errors().len(), 3);
    }

    #[test]
    fn test_fatal_inputs() {
        let database = test_database();
        let result = analyze(b"", &drugs(&["codeine"]), &database, &Default::default());
        assert!(matches!(result, Err(AnalysisError::Decode(VcfError::EmptyOrUnparsableFile))));

        let content = format!("{HEADER}chr1\t1000\t.\tA\tG\t50\tPASS\t.\tGT\t0/1\n");
        let result = analyze(content.as_bytes(), &[], &database, &Default::default());
        assert!(matches!(result, Err(AnalysisError::EmptyDrugList)));

        let result = analyze(content.as_bytes(), &drugs(&["  ", ""]), &database, &Default::default());
        assert!(matches!(result, Err(AnalysisError::EmptyDrugList)));
    }

    #[test]
    fn test_idempotent_results() {
        let content = format!(
            "{HEADER}chr22\t42126611\trs3892097\tC\tT\t50\tPASS\t.\tGT\t0/1\n\
             chr10\t94781859\trs4244285\tG\tA\t50\tPASS\t.\tGT\t1/1\n"
        );
        let database = test_database();
        let drug_list = drugs(&["codeine", "clopidogrel", "amitriptyline"]);

        let first = analyze(content.as_bytes(), &drug_list, &database, &Default::default()).unwrap();
        let second = analyze(content.as_bytes(), &drug_list, &database, &Default::default()).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_sample_selection() {
        let content = "\
##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tPATIENT1\tPATIENT2
chr22\t42126611\trs3892097\tC\tT\t50\tPASS\t.\tGT\t0/0\t1/1
";
        let database = test_database();

        let config = AnalysisConfigBuilder::default()
            .sample_name(Some("PATIENT2".to_string()))
            .build()
            .unwrap();
        let result = analyze(content.as_bytes(), &drugs(&["codeine"]), &database, &config).unwrap();
        let cyp2d6 = result.phenotypes().iter().find(|p| p.gene() == "CYP2D6").unwrap();
        assert_eq!(cyp2d6.diplotype(), "*4/*4");

        // default is the first sample, which is homozygous reference here
        let result = analyze(content.as_bytes(), &drugs(&["codeine"]), &database, &Default::default()).unwrap();
        let cyp2d6 = result.phenotypes().iter().find(|p| p.gene() == "CYP2D6").unwrap();
        assert_eq!(cyp2d6.diplotype(), "*1/*1");
    }
}
