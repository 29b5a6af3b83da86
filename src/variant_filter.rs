
use indexmap::IndexMap;
use log::debug;

use crate::data_types::alleles::AlleleFunction;
use crate::data_types::variants::{GenotypeCall, VariantRecord};
use crate::database::pgx_database::PgxDatabase;

/// One decoded record matched to a star-allele definition, paired with the sample's call
#[derive(Clone, Debug)]
pub struct MatchedVariant {
    /// Index of the source record in the decoded sequence
    record_index: usize,
    /// The star-allele label the matched table entry defines
    star_allele: String,
    /// The functional effect of that star allele
    function: AlleleFunction,
    /// The 1-based ALT index on the record that matched the table entry
    allele_index: usize,
    /// The selected sample's genotype call; None when uncalled
    genotype: Option<GenotypeCall>
}

impl MatchedVariant {
    // getters
    pub fn record_index(&self) -> usize {
        self.record_index
    }

    pub fn star_allele(&self) -> &str {
        &self.star_allele
    }

    pub fn function(&self) -> AlleleFunction {
        self.function
    }

    pub fn allele_index(&self) -> usize {
        self.allele_index
    }

    pub fn genotype(&self) -> Option<GenotypeCall> {
        self.genotype
    }
}

/// The output of the filtering stage: per-gene accumulations in file order
#[derive(Debug, Default)]
pub struct FilterResult {
    /// gene -> matched variants, accumulated in file order
    gene_matches: IndexMap<String, Vec<MatchedVariant>>,
    /// Number of distinct records that matched at least one table entry
    matched_records: usize
}

impl FilterResult {
    /// Returns the matches accumulated for one gene; empty when nothing matched
    /// # Arguments
    /// * `gene` - the gene name
    pub fn matches_for_gene(&self, gene: &str) -> &[MatchedVariant] {
        self.gene_matches.get(gene)
            .map(|matches| matches.as_slice())
            .unwrap_or_default()
    }

    // getters
    pub fn gene_matches(&self) -> &IndexMap<String, Vec<MatchedVariant>> {
        &self.gene_matches
    }

    pub fn matched_records(&self) -> usize {
        self.matched_records
    }
}

/// Selects the records relevant to the pharmacogene tables.
/// Matching tries the cross-reference identifier first, then (chromosome, position);
/// records matching neither are dropped. The matched table entry must also name an
/// alternate allele the record actually declares.
/// # Arguments
/// * `records` - the decoded records, in file order
/// * `database` - the knowledge tables
/// * `sample_index` - which sample's genotype calls to carry forward
pub fn filter_variants(records: &[VariantRecord], database: &PgxDatabase, sample_index: usize) -> FilterResult {
    let mut result = FilterResult::default();

    for (record_index, record) in records.iter().enumerate() {
        // identifier match takes priority; coordinates are the fallback
        let mut candidates = match record.identifier() {
            Some(identifier) => database.match_identifier(identifier),
            None => vec![]
        };
        if candidates.is_empty() {
            candidates = database.match_position(record.chromosome(), record.position());
        }

        let mut record_matched = false;
        for definition in candidates {
            let Some(allele_index) = record.alternate_index(&definition.alternate) else {
                // the table entry's defining ALT is not observed on this record
                continue;
            };

            debug!(
                "Record {} ({}:{}) matched {} {}",
                record_index, record.chromosome(), record.position(),
                definition.gene, definition.star_allele
            );
            result.gene_matches.entry(definition.gene.clone())
                .or_default()
                .push(MatchedVariant {
                    record_index,
                    star_allele: definition.star_allele.clone(),
                    function: definition.function,
                    allele_index,
                    genotype: record.sample_call(sample_index)
                });
            record_matched = true;
        }

        if record_matched {
            result.matched_records += 1;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::pgx_database::test_database;

    fn record(chrom: &str, pos: u64, id: Option<&str>, alts: &[&str], call: Option<GenotypeCall>) -> VariantRecord {
        VariantRecord::new(
            chrom.to_string(), pos, id.map(|s| s.to_string()),
            "C".to_string(), alts.iter().map(|s| s.to_string()).collect(), None,
            "PASS".to_string(), Default::default(), vec![call]
        ).unwrap()
    }

    #[test]
    fn test_identifier_match_first() {
        let database = test_database();
        // the rsID matches *4 even though the coordinates are elsewhere
        let records = vec![
            record("chr5", 12345, Some("rs3892097"), &["T"], Some(GenotypeCall::new(0, 1, false)))
        ];
        let result = filter_variants(&records, &database, 0);
        assert_eq!(result.matched_records(), 1);
        let matches = result.matches_for_gene("CYP2D6");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].star_allele(), "*4");
        assert_eq!(matches[0].allele_index(), 1);
    }

    #[test]
    fn test_position_fallback() {
        let database = test_database();
        let records = vec![
            // no rsID; "22" still matches the table's "chr22"
            record("22", 42126611, None, &["T"], Some(GenotypeCall::new(1, 1, false)))
        ];
        let result = filter_variants(&records, &database, 0);
        assert_eq!(result.matched_records(), 1);
        assert_eq!(result.matches_for_gene("CYP2D6").len(), 1);
    }

    #[test]
    fn test_irrelevant_records_dropped() {
        let database = test_database();
        let records = vec![
            record("chr1", 1000, Some("rs999999"), &["A"], Some(GenotypeCall::new(0, 1, false))),
            // right position, but the defining ALT is not among the record's ALTs
            record("chr22", 42126611, None, &["G"], Some(GenotypeCall::new(0, 1, false)))
        ];
        let result = filter_variants(&records, &database, 0);
        assert_eq!(result.matched_records(), 0);
        assert!(result.gene_matches().is_empty());
    }

    #[test]
    fn test_accumulation_follows_file_order() {
        let database = test_database();
        let records = vec![
            record("chr22", 42130692, Some("rs1065852"), &["A"], Some(GenotypeCall::new(0, 1, false))),
            record("chr10", 94781859, Some("rs4244285"), &["A"], Some(GenotypeCall::new(0, 1, false))),
            record("chr22", 42126611, Some("rs3892097"), &["T"], Some(GenotypeCall::new(0, 1, false)))
        ];
        let result = filter_variants(&records, &database, 0);
        assert_eq!(result.matched_records(), 3);

        let cyp2d6 = result.matches_for_gene("CYP2D6");
        assert_eq!(cyp2d6.len(), 2);
        assert_eq!(cyp2d6[0].star_allele(), "*10");
        assert_eq!(cyp2d6[1].star_allele(), "*4");
        assert_eq!(cyp2d6[0].record_index(), 0);
        assert_eq!(cyp2d6[1].record_index(), 2);

        assert_eq!(result.matches_for_gene("CYP2C19").len(), 1);
    }

    #[test]
    fn test_multiallelic_alt_selection() {
        let database = test_database();
        // the defining ALT is the second alternate, so the matched index must be 2
        let records = vec![
            record("chr22", 42126611, Some("rs3892097"), &["A", "T"], Some(GenotypeCall::new(0, 2, false)))
        ];
        let result = filter_variants(&records, &database, 0);
        let matches = result.matches_for_gene("CYP2D6");
        assert_eq!(matches[0].allele_index(), 2);
    }

    #[test]
    fn test_missing_sample_call_carried_as_none() {
        let database = test_database();
        let records = vec![
            record("chr22", 42126611, Some("rs3892097"), &["T"], None)
        ];
        let result = filter_variants(&records, &database, 0);
        let matches = result.matches_for_gene("CYP2D6");
        assert_eq!(matches[0].genotype(), None);
    }
}
