
use log::debug;

use crate::data_types::alleles::{AlleleFunction, Diplotype, REFERENCE_ALLELE};
use crate::data_types::phenotype::{
    Phenotype, PhenotypePrediction,
    CONFIDENCE_EXACT, CONFIDENCE_FORMULA, CONFIDENCE_INDETERMINATE
};
use crate::database::pgx_database::PgxDatabase;

/// Predicts the metabolizer phenotype for a resolved diplotype.
///
/// An exact (gene, diplotype) table hit is preferred; on a miss the phenotype is
/// derived from the summed activity weights of the two alleles. If either
/// allele's function is uncharacterized the result is Indeterminate rather than
/// a guessed phenotype.
/// # Arguments
/// * `diplotype` - the canonical diplotype for one gene
/// * `database` - the knowledge tables
pub fn predict_phenotype(diplotype: &Diplotype, database: &PgxDatabase) -> PhenotypePrediction {
    let gene = diplotype.gene();
    let key = diplotype.diplotype_string();

    if let Some(entry) = database.diplotype_entry(gene, &key) {
        return PhenotypePrediction::new(
            diplotype, entry.phenotype, Some(entry.activity_score), CONFIDENCE_EXACT
        );
    }

    debug!("{gene} {key}: no tabulated phenotype, falling back to activity score");
    let weights = (
        allele_activity_weight(database, gene, diplotype.allele1()),
        allele_activity_weight(database, gene, diplotype.allele2())
    );
    match weights {
        (Some(w1), Some(w2)) => {
            let score = w1 + w2;
            PhenotypePrediction::new(
                diplotype, Phenotype::from_activity_score(score), Some(score), CONFIDENCE_FORMULA
            )
        },
        _ => {
            // at least one allele has no computable weight
            PhenotypePrediction::new(
                diplotype, Phenotype::Indeterminate, None, CONFIDENCE_INDETERMINATE
            )
        }
    }
}

/// Returns the activity weight of one allele, treating the reference label as fully
/// functional and an untabulated or uncharacterized allele as non-computable.
/// # Arguments
/// * `database` - the knowledge tables
/// * `gene` - the gene name
/// * `label` - the star-allele label
fn allele_activity_weight(database: &PgxDatabase, gene: &str, label: &str) -> Option<f64> {
    if label == REFERENCE_ALLELE {
        return AlleleFunction::Normal.activity_weight();
    }
    database.allele_function(gene, label)
        .unwrap_or(AlleleFunction::Unknown)
        .activity_weight()
}
