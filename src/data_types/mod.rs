
/// Star-allele functional effects and diplotype definitions
pub mod alleles;
/// The assembled output of a full analysis run
pub mod analysis_result;
/// Metabolizer phenotypes and per-gene predictions
pub mod phenotype;
/// Risk categories, severities, per-drug assessments, and the overall roll-up
pub mod risk;
/// Contains variant record definitions, genotype calls, and checks
pub mod variants;
