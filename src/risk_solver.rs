
use log::debug;

use crate::data_types::phenotype::PhenotypePrediction;
use crate::data_types::risk::DrugRiskAssessment;
use crate::database::pgx_database::PgxDatabase;

/// Assesses one requested drug against the phenotype predictions.
///
/// Matching is trimmed and case-insensitive, but the requested name is echoed
/// verbatim in every produced assessment. A drug the interaction table has never
/// heard of yields exactly one Unknown assessment; a known drug yields one
/// assessment per governing gene, each independently degraded to Unknown when
/// the (drug, gene, phenotype) triple is not tabulated.
/// # Arguments
/// * `drug` - the requested drug name, as provided by the caller
/// * `predictions` - the per-gene phenotype predictions for this patient
/// * `database` - the knowledge tables
pub fn assess_drug(drug: &str, predictions: &[PhenotypePrediction], database: &PgxDatabase) -> Vec<DrugRiskAssessment> {
    let drug_key = drug.trim().to_ascii_lowercase();
    let genes = database.drug_genes(&drug_key);
    if genes.is_empty() {
        debug!("No interaction entries for requested drug {drug:?}");
        return vec![DrugRiskAssessment::unknown_drug(drug)];
    }

    genes.iter()
        .map(|gene| {
            let Some(prediction) = predictions.iter().find(|p| p.gene() == gene.as_str()) else {
                // the interaction table governs a gene we resolved no phenotype for
                debug!("{drug:?}: no phenotype prediction available for {gene}");
                return DrugRiskAssessment::unknown_interaction(drug, gene);
            };

            match database.interaction(&drug_key, gene, prediction.phenotype()) {
                Some(entry) => DrugRiskAssessment::new(
                    drug, gene, entry.risk_category, entry.severity,
                    entry.confidence, entry.citation.clone(), entry.recommendation.clone()
                ),
                None => {
                    debug!("{drug:?}: no entry for {gene} / {}", prediction.phenotype());
                    DrugRiskAssessment::unknown_interaction(drug, gene)
                }
            }
        })
        .collect()
}
