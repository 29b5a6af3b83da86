
use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data_types::alleles::AlleleFunction;
use crate::data_types::phenotype::Phenotype;
use crate::data_types::risk::{RiskCategory, Severity};
use crate::data_types::variants::normalize_chromosome;

/// One row of the variant-to-allele table: a single variant observation that defines a star allele
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VariantAlleleDef {
    /// The gene the star allele belongs to
    pub gene: String,
    /// Chromosome of the defining variant
    pub chromosome: String,
    /// 1-based position of the defining variant
    pub position: u64,
    /// Optional cross-reference identifier, e.g. an rsID
    #[serde(default)]
    pub rsid: Option<String>,
    /// The alternate allele that defines the star allele
    pub alternate: String,
    /// The star-allele label this variant defines
    pub star_allele: String,
    /// The functional effect of the star allele
    pub function: AlleleFunction
}

/// One row of the diplotype-to-phenotype table
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DiplotypePhenotypeDef {
    /// The gene the entry applies to
    pub gene: String,
    /// The diplotype key, e.g. "*1/*4"; canonicalized at load
    pub diplotype: String,
    /// The tabulated phenotype
    pub phenotype: Phenotype,
    /// The tabulated activity score
    pub activity_score: f64
}

/// One row of the drug-gene interaction table
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DrugGeneInteractionDef {
    /// The drug name; matching is case-insensitive
    pub drug: String,
    /// The governing gene
    pub gene: String,
    /// The phenotype the guidance applies to
    pub phenotype: Phenotype,
    /// The resulting risk category
    pub risk_category: RiskCategory,
    /// The resulting severity
    pub severity: Severity,
    /// Confidence in this guidance, in [0, 1]
    pub confidence: f64,
    /// CPIC citation text, when available
    #[serde(default)]
    pub citation: Option<String>,
    /// The recommendation text
    pub recommendation: String
}

/// The on-disk shape of the knowledge tables
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PgxDatabaseConfig {
    /// Optional free-form database version label
    #[serde(default)]
    pub version: Option<String>,
    /// The variant-to-allele table
    pub allele_definitions: Vec<VariantAlleleDef>,
    /// The diplotype-to-phenotype table
    pub diplotype_phenotypes: Vec<DiplotypePhenotypeDef>,
    /// The drug-gene interaction table
    pub drug_interactions: Vec<DrugGeneInteractionDef>
}

#[derive(thiserror::Error, Debug)]
pub enum DatabaseError {
    #[error("the variant-to-allele table is empty")]
    EmptyAlleleTable,
    #[error("diplotype key {key:?} for {gene} is not of the form \"a/b\"")]
    MalformedDiplotypeKey { gene: String, key: String },
    #[error("duplicate diplotype entry for {gene} {key}")]
    DuplicateDiplotypeEntry { gene: String, key: String },
    #[error("conflicting functions for {gene} {star_allele}")]
    ConflictingAlleleFunction { gene: String, star_allele: String },
    #[error("duplicate interaction entry for {drug} / {gene} / {phenotype}")]
    DuplicateInteraction { drug: String, gene: String, phenotype: Phenotype },
    #[error("interaction confidence {confidence} for {drug} / {gene} is outside [0, 1]")]
    ConfidenceRange { drug: String, gene: String, confidence: f64 }
}

/// The read-only knowledge tables plus the lookup indices built over them.
/// Loaded once at process start and shared by reference across all requests;
/// nothing here is mutated after construction.
#[derive(Clone, Debug)]
pub struct PgxDatabase {
    /// Optional version label from the config
    version: Option<String>,
    /// All variant-to-allele rows, in config order
    allele_definitions: Vec<VariantAlleleDef>,
    /// All diplotype-to-phenotype rows with canonicalized keys
    diplotype_phenotypes: Vec<DiplotypePhenotypeDef>,
    /// All interaction rows
    drug_interactions: Vec<DrugGeneInteractionDef>,
    /// Gene names in first-seen config order
    genes: Vec<String>,
    /// lowercase rsID -> allele definition indices
    rsid_lookup: FxHashMap<String, Vec<usize>>,
    /// (normalized chromosome, position) -> allele definition indices
    position_lookup: FxHashMap<(String, u64), Vec<usize>>,
    /// (gene, star allele) -> functional effect
    function_lookup: FxHashMap<(String, String), AlleleFunction>,
    /// (gene, canonical diplotype key) -> diplotype table index
    diplotype_lookup: FxHashMap<(String, String), usize>,
    /// lowercase drug -> governing genes in first-seen order
    drug_gene_lookup: FxHashMap<String, Vec<String>>,
    /// (lowercase drug, gene, phenotype) -> interaction table index
    interaction_lookup: FxHashMap<(String, String, Phenotype), usize>
}

impl PgxDatabase {
    /// Builds a database from parsed config, validating entries and constructing the indices.
    /// # Arguments
    /// * `config` - the parsed knowledge tables
    /// # Errors
    /// * if the variant-to-allele table is empty
    /// * if a diplotype key is malformed or duplicated
    /// * if a star allele is tagged with conflicting functions
    /// * if an interaction is duplicated or carries an out-of-range confidence
    pub fn new(config: PgxDatabaseConfig) -> Result<Self, DatabaseError> {
        let PgxDatabaseConfig {
            version, allele_definitions, mut diplotype_phenotypes, drug_interactions
        } = config;

        if allele_definitions.is_empty() {
            return Err(DatabaseError::EmptyAlleleTable);
        }

        // variant-to-allele indices
        let mut genes: Vec<String> = vec![];
        let mut seen_genes: FxHashSet<String> = Default::default();
        let mut rsid_lookup: FxHashMap<String, Vec<usize>> = Default::default();
        let mut position_lookup: FxHashMap<(String, u64), Vec<usize>> = Default::default();
        let mut function_lookup: FxHashMap<(String, String), AlleleFunction> = Default::default();
        for (index, def) in allele_definitions.iter().enumerate() {
            if seen_genes.insert(def.gene.clone()) {
                genes.push(def.gene.clone());
            }

            if let Some(rsid) = def.rsid.as_deref() {
                rsid_lookup.entry(rsid.to_ascii_lowercase()).or_default().push(index);
            }
            position_lookup.entry((normalize_chromosome(&def.chromosome), def.position))
                .or_default()
                .push(index);

            let function_key = (def.gene.clone(), def.star_allele.clone());
            if let Some(&existing) = function_lookup.get(&function_key) {
                if existing != def.function {
                    return Err(DatabaseError::ConflictingAlleleFunction {
                        gene: def.gene.clone(),
                        star_allele: def.star_allele.clone()
                    });
                }
            } else {
                function_lookup.insert(function_key, def.function);
            }
        }

        // diplotype-to-phenotype index, canonicalizing each key on the way in
        let mut diplotype_lookup: FxHashMap<(String, String), usize> = Default::default();
        for (index, entry) in diplotype_phenotypes.iter_mut().enumerate() {
            let canonical = canonicalize_diplotype_key(&entry.diplotype)
                .ok_or_else(|| DatabaseError::MalformedDiplotypeKey {
                    gene: entry.gene.clone(),
                    key: entry.diplotype.clone()
                })?;
            entry.diplotype = canonical.clone();

            let previous = diplotype_lookup.insert((entry.gene.clone(), canonical), index);
            if previous.is_some() {
                return Err(DatabaseError::DuplicateDiplotypeEntry {
                    gene: entry.gene.clone(),
                    key: entry.diplotype.clone()
                });
            }
        }

        // drug interaction indices
        let mut drug_gene_lookup: FxHashMap<String, Vec<String>> = Default::default();
        let mut interaction_lookup: FxHashMap<(String, String, Phenotype), usize> = Default::default();
        for (index, entry) in drug_interactions.iter().enumerate() {
            if !(0.0..=1.0).contains(&entry.confidence) {
                return Err(DatabaseError::ConfidenceRange {
                    drug: entry.drug.clone(),
                    gene: entry.gene.clone(),
                    confidence: entry.confidence
                });
            }

            let drug_key = entry.drug.trim().to_ascii_lowercase();
            let gene_list = drug_gene_lookup.entry(drug_key.clone()).or_default();
            if !gene_list.contains(&entry.gene) {
                gene_list.push(entry.gene.clone());
            }

            let previous = interaction_lookup.insert(
                (drug_key, entry.gene.clone(), entry.phenotype), index
            );
            if previous.is_some() {
                return Err(DatabaseError::DuplicateInteraction {
                    drug: entry.drug.clone(),
                    gene: entry.gene.clone(),
                    phenotype: entry.phenotype
                });
            }

            // a gene without allele definitions will always resolve *1/*1-less, i.e. degrade to Unknown
            if !seen_genes.contains(&entry.gene) {
                warn!("Interaction for {} references {}, which has no allele definitions.", entry.drug, entry.gene);
            }
        }

        Ok(Self {
            version,
            allele_definitions, diplotype_phenotypes, drug_interactions,
            genes,
            rsid_lookup, position_lookup, function_lookup,
            diplotype_lookup, drug_gene_lookup, interaction_lookup
        })
    }

    /// Loads and validates a database from a JSON file (optionally gzipped).
    /// # Arguments
    /// * `filename` - the path of the JSON config
    /// # Errors
    /// * if the file cannot be opened or parsed
    /// * if validation of the parsed tables fails
    pub fn from_json(filename: &Path) -> anyhow::Result<Self> {
        let config: PgxDatabaseConfig = crate::util::json_io::load_json(filename)?;
        Ok(Self::new(config)?)
    }

    /// Returns the allele definitions matched by a cross-reference identifier.
    /// # Arguments
    /// * `identifier` - the record's ID field, matched case-insensitively
    pub fn match_identifier(&self, identifier: &str) -> Vec<&VariantAlleleDef> {
        self.rsid_lookup.get(&identifier.to_ascii_lowercase())
            .map(|indices| indices.iter().map(|&i| &self.allele_definitions[i]).collect())
            .unwrap_or_default()
    }

    /// Returns the allele definitions matched by genomic coordinates.
    /// # Arguments
    /// * `chromosome` - the record's chromosome, any naming convention
    /// * `position` - the record's 1-based position
    pub fn match_position(&self, chromosome: &str, position: u64) -> Vec<&VariantAlleleDef> {
        self.position_lookup.get(&(normalize_chromosome(chromosome), position))
            .map(|indices| indices.iter().map(|&i| &self.allele_definitions[i]).collect())
            .unwrap_or_default()
    }

    /// Returns the functional effect tagged for a star allele, if the table defines one.
    /// # Arguments
    /// * `gene` - the gene name
    /// * `star_allele` - the star-allele label
    pub fn allele_function(&self, gene: &str, star_allele: &str) -> Option<AlleleFunction> {
        self.function_lookup.get(&(gene.to_string(), star_allele.to_string())).copied()
    }

    /// Returns the tabulated entry for a canonical diplotype key, if present.
    /// # Arguments
    /// * `gene` - the gene name
    /// * `diplotype_key` - the canonical "a/b" key
    pub fn diplotype_entry(&self, gene: &str, diplotype_key: &str) -> Option<&DiplotypePhenotypeDef> {
        self.diplotype_lookup.get(&(gene.to_string(), diplotype_key.to_string()))
            .map(|&i| &self.diplotype_phenotypes[i])
    }

    /// Returns the governing genes for a drug, or an empty slice for an unknown drug.
    /// # Arguments
    /// * `drug_key` - the trimmed, lowercased drug name
    pub fn drug_genes(&self, drug_key: &str) -> &[String] {
        self.drug_gene_lookup.get(drug_key)
            .map(|genes| genes.as_slice())
            .unwrap_or_default()
    }

    /// Returns the interaction entry for a (drug, gene, phenotype) triple, if tabulated.
    /// # Arguments
    /// * `drug_key` - the trimmed, lowercased drug name
    /// * `gene` - the governing gene
    /// * `phenotype` - the predicted phenotype
    pub fn interaction(&self, drug_key: &str, gene: &str, phenotype: Phenotype) -> Option<&DrugGeneInteractionDef> {
        self.interaction_lookup.get(&(drug_key.to_string(), gene.to_string(), phenotype))
            .map(|&i| &self.drug_interactions[i])
    }

    // getters
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// All pharmacogenes with allele definitions, in first-seen table order
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn allele_definitions(&self) -> &[VariantAlleleDef] {
        &self.allele_definitions
    }
}

/// Canonicalizes an "a/b" diplotype key by sorting the two labels; None if not a pair.
/// # Arguments
/// * `key` - the raw diplotype key
fn canonicalize_diplotype_key(key: &str) -> Option<String> {
    let (a, b) = key.split_once('/')?;
    if a.is_empty() || b.is_empty() || b.contains('/') {
        return None;
    }
    if a <= b {
        Some(format!("{a}/{b}"))
    } else {
        Some(format!("{b}/{a}"))
    }
}

/// Builds a small CYP2D6 / CYP2C19 database used by tests across the crate.
/// The warfarin entry deliberately references a gene with no allele definitions.
#[cfg(test)]
pub fn test_database() -> PgxDatabase {
    let config = PgxDatabaseConfig {
        version: Some("test-1".to_string()),
        allele_definitions: vec![
            VariantAlleleDef {
                gene: "CYP2D6".to_string(), chromosome: "chr22".to_string(), position: 42126611,
                rsid: Some("rs3892097".to_string()), alternate: "T".to_string(),
                star_allele: "*4".to_string(), function: AlleleFunction::NoFunction
            },
            VariantAlleleDef {
                gene: "CYP2D6".to_string(), chromosome: "chr22".to_string(), position: 42130692,
                rsid: Some("rs1065852".to_string()), alternate: "A".to_string(),
                star_allele: "*10".to_string(), function: AlleleFunction::Decreased
            },
            VariantAlleleDef {
                gene: "CYP2D6".to_string(), chromosome: "chr22".to_string(), position: 42129754,
                rsid: Some("rs28371706".to_string()), alternate: "T".to_string(),
                star_allele: "*17".to_string(), function: AlleleFunction::Decreased
            },
            VariantAlleleDef {
                gene: "CYP2C19".to_string(), chromosome: "chr10".to_string(), position: 94781859,
                rsid: Some("rs4244285".to_string()), alternate: "A".to_string(),
                star_allele: "*2".to_string(), function: AlleleFunction::NoFunction
            },
            VariantAlleleDef {
                gene: "CYP2C19".to_string(), chromosome: "chr10".to_string(), position: 94761900,
                rsid: Some("rs12248560".to_string()), alternate: "T".to_string(),
                star_allele: "*17".to_string(), function: AlleleFunction::Increased
            }
        ],
        diplotype_phenotypes: vec![
            DiplotypePhenotypeDef {
                gene: "CYP2D6".to_string(), diplotype: "*1/*1".to_string(),
                phenotype: Phenotype::Normal, activity_score: 2.0
            },
            DiplotypePhenotypeDef {
                gene: "CYP2D6".to_string(), diplotype: "*1/*4".to_string(),
                phenotype: Phenotype::Intermediate, activity_score: 1.0
            },
            DiplotypePhenotypeDef {
                gene: "CYP2D6".to_string(), diplotype: "*4/*4".to_string(),
                phenotype: Phenotype::Poor, activity_score: 0.0
            },
            DiplotypePhenotypeDef {
                gene: "CYP2C19".to_string(), diplotype: "*1/*1".to_string(),
                phenotype: Phenotype::Normal, activity_score: 2.0
            },
            DiplotypePhenotypeDef {
                gene: "CYP2C19".to_string(), diplotype: "*1/*17".to_string(),
                phenotype: Phenotype::Rapid, activity_score: 2.5
            },
            DiplotypePhenotypeDef {
                gene: "CYP2C19".to_string(), diplotype: "*2/*2".to_string(),
                phenotype: Phenotype::Poor, activity_score: 0.0
            }
        ],
        drug_interactions: vec![
            DrugGeneInteractionDef {
                drug: "codeine".to_string(), gene: "CYP2D6".to_string(),
                phenotype: Phenotype::Poor, risk_category: RiskCategory::Ineffective,
                severity: Severity::High, confidence: 0.95,
                citation: Some("CPIC codeine/CYP2D6 guideline".to_string()),
                recommendation: "Avoid codeine; select a non-tramadol alternative analgesic.".to_string()
            },
            DrugGeneInteractionDef {
                drug: "codeine".to_string(), gene: "CYP2D6".to_string(),
                phenotype: Phenotype::Ultrarapid, risk_category: RiskCategory::Toxic,
                severity: Severity::Critical, confidence: 0.95,
                citation: Some("CPIC codeine/CYP2D6 guideline".to_string()),
                recommendation: "Avoid codeine due to toxicity risk from rapid morphine formation.".to_string()
            },
            DrugGeneInteractionDef {
                drug: "codeine".to_string(), gene: "CYP2D6".to_string(),
                phenotype: Phenotype::Normal, risk_category: RiskCategory::Safe,
                severity: Severity::None, confidence: 0.95,
                citation: Some("CPIC codeine/CYP2D6 guideline".to_string()),
                recommendation: "Use label-recommended dosing.".to_string()
            },
            DrugGeneInteractionDef {
                drug: "clopidogrel".to_string(), gene: "CYP2C19".to_string(),
                phenotype: Phenotype::Poor, risk_category: RiskCategory::Ineffective,
                severity: Severity::Critical, confidence: 0.9,
                citation: Some("CPIC clopidogrel/CYP2C19 guideline".to_string()),
                recommendation: "Consider prasugrel or ticagrelor.".to_string()
            },
            DrugGeneInteractionDef {
                drug: "warfarin".to_string(), gene: "CYP2C9".to_string(),
                phenotype: Phenotype::Poor, risk_category: RiskCategory::AdjustDosage,
                severity: Severity::High, confidence: 0.85,
                citation: Some("CPIC warfarin guideline".to_string()),
                recommendation: "Reduce starting dose.".to_string()
            },
            DrugGeneInteractionDef {
                drug: "amitriptyline".to_string(), gene: "CYP2D6".to_string(),
                phenotype: Phenotype::Poor, risk_category: RiskCategory::AdjustDosage,
                severity: Severity::Moderate, confidence: 0.8,
                citation: Some("CPIC TCA guideline".to_string()),
                recommendation: "Consider a 50% dose reduction.".to_string()
            },
            DrugGeneInteractionDef {
                drug: "amitriptyline".to_string(), gene: "CYP2C19".to_string(),
                phenotype: Phenotype::Poor, risk_category: RiskCategory::AdjustDosage,
                severity: Severity::Moderate, confidence: 0.8,
                citation: Some("CPIC TCA guideline".to_string()),
                recommendation: "Consider an alternative tricyclic.".to_string()
            }
        ]
    };
    PgxDatabase::new(config).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_and_position_matching() {
        let database = test_database();
        let by_rsid = database.match_identifier("RS3892097");
        assert_eq!(by_rsid.len(), 1);
        assert_eq!(by_rsid[0].star_allele, "*4");

        // "22" and "chr22" are the same chromosome
        let by_position = database.match_position("22", 42126611);
        assert_eq!(by_position.len(), 1);
        assert_eq!(by_position[0].star_allele, "*4");

        assert!(database.match_identifier("rs0").is_empty());
        assert!(database.match_position("22", 1).is_empty());
    }

    #[test]
    fn test_gene_order_is_stable() {
        let database = test_database();
        assert_eq!(database.genes(), &["CYP2D6".to_string(), "CYP2C19".to_string()]);
    }

    #[test]
    fn test_diplotype_key_canonicalized_at_load() {
        let mut config = PgxDatabaseConfig {
            allele_definitions: test_database().allele_definitions().to_vec(),
            ..Default::default()
        };
        config.diplotype_phenotypes.push(DiplotypePhenotypeDef {
            gene: "CYP2D6".to_string(), diplotype: "*4/*1".to_string(),
            phenotype: Phenotype::Intermediate, activity_score: 1.0
        });
        let database = PgxDatabase::new(config).unwrap();
        assert!(database.diplotype_entry("CYP2D6", "*1/*4").is_some());
    }

    #[test]
    fn test_duplicate_diplotype_rejected() {
        let mut config = PgxDatabaseConfig {
            allele_definitions: test_database().allele_definitions().to_vec(),
            ..Default::default()
        };
        // same key after canonicalization
        for key in ["*1/*4", "*4/*1"] {
            config.diplotype_phenotypes.push(DiplotypePhenotypeDef {
                gene: "CYP2D6".to_string(), diplotype: key.to_string(),
                phenotype: Phenotype::Intermediate, activity_score: 1.0
            });
        }
        let result = PgxDatabase::new(config);
        assert!(matches!(result, Err(DatabaseError::DuplicateDiplotypeEntry { .. })));
    }

    #[test]
    fn test_empty_allele_table_rejected() {
        let result = PgxDatabase::new(PgxDatabaseConfig::default());
        assert!(matches!(result, Err(DatabaseError::EmptyAlleleTable)));
    }

    #[test]
    fn test_drug_lookups() {
        let database = test_database();
        assert_eq!(database.drug_genes("codeine"), &["CYP2D6".to_string()]);
        assert_eq!(
            database.drug_genes("amitriptyline"),
            &["CYP2D6".to_string(), "CYP2C19".to_string()]
        );
        assert!(database.drug_genes("aspirin").is_empty());

        let interaction = database.interaction("codeine", "CYP2D6", Phenotype::Poor).unwrap();
        assert_eq!(interaction.risk_category, RiskCategory::Ineffective);
        assert!(database.interaction("codeine", "CYP2D6", Phenotype::Intermediate).is_none());
    }

    #[test]
    fn test_confidence_range_rejected() {
        let mut config = PgxDatabaseConfig {
            allele_definitions: test_database().allele_definitions().to_vec(),
            ..Default::default()
        };
        config.drug_interactions.push(DrugGeneInteractionDef {
            drug: "codeine".to_string(), gene: "CYP2D6".to_string(),
            phenotype: Phenotype::Poor, risk_category: RiskCategory::Ineffective,
            severity: Severity::High, confidence: 1.5,
            citation: None, recommendation: "bad".to_string()
        });
        let result = PgxDatabase::new(config);
        assert!(matches!(result, Err(DatabaseError::ConfidenceRange { .. })));
    }
}
