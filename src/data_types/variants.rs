
use indexmap::IndexMap;

/// Zygosity of a genotype call relative to one particular alternate allele
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Zygosity {
    HomozygousReference=0,
    Heterozygous,
    HomozygousAlternate,
    Unknown // make sure Unknown is always the last one in the list
}

#[derive(thiserror::Error, Debug)]
pub enum VariantError {
    #[error("position must be a positive integer")]
    NonPositivePosition,
    #[error("reference allele is empty")]
    EmptyReference,
    #[error("alternate allele list is empty")]
    EmptyAlternateList,
    #[error("alternate allele {index} is empty")]
    EmptyAlternate { index: usize },
    #[error("allele {allele:?} contains symbols outside {{A,C,G,T,N}} and is not a structural token")]
    InvalidAlleleSymbols { allele: String },
    #[error("genotype allele index {index} is out of range for {allele_count} alleles")]
    AlleleIndexRange { index: usize, allele_count: usize }
}

/// A single genotype call for one sample at one variant site.
/// Index 0 is the reference allele, index k is the k-th alternate allele.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GenotypeCall {
    /// The first allele index of the call
    allele0: usize,
    /// The second allele index of the call
    allele1: usize,
    /// If true, the call came through with phase information ('|' separator)
    phased: bool
}

impl GenotypeCall {
    /// Creates a new genotype call from a pair of allele indices.
    /// # Arguments
    /// * `allele0` - the first allele index, 0 = REF
    /// * `allele1` - the second allele index, 0 = REF
    /// * `phased` - true if the call was phased
    pub fn new(allele0: usize, allele1: usize, phased: bool) -> Self {
        Self {
            allele0, allele1, phased
        }
    }

    /// Counts how many of the two call indices match the given allele index.
    /// # Arguments
    /// * `allele_index` - the allele index to count, usually an ALT index
    pub fn count_allele(&self, allele_index: usize) -> u8 {
        let mut count = 0;
        if self.allele0 == allele_index {
            count += 1;
        }
        if self.allele1 == allele_index {
            count += 1;
        }
        count
    }

    /// Returns the zygosity of this call relative to one alternate allele index.
    /// # Arguments
    /// * `allele_index` - the alternate allele index of interest
    pub fn zygosity(&self, allele_index: usize) -> Zygosity {
        match self.count_allele(allele_index) {
            0 => Zygosity::HomozygousReference,
            1 => Zygosity::Heterozygous,
            2 => Zygosity::HomozygousAlternate,
            _ => unreachable!()
        }
    }

    /// Returns true if both indices reference the reference allele (0/0)
    pub fn is_homozygous_reference(&self) -> bool {
        self.allele0 == 0 && self.allele1 == 0
    }

    /// Returns the largest allele index in the call
    pub fn max_allele_index(&self) -> usize {
        self.allele0.max(self.allele1)
    }

    // getters
    pub fn allele0(&self) -> usize {
        self.allele0
    }

    pub fn allele1(&self) -> usize {
        self.allele1
    }

    pub fn is_phased(&self) -> bool {
        self.phased
    }
}

/// One decoded variant line: a genomic position, the observed alleles, and per-sample calls.
/// Records are created once by the decoder and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct VariantRecord {
    /// The chromosome name, stored exactly as read
    chromosome: String,
    /// The coordinate of the variant, 1-based
    position: u64,
    /// Optional cross-reference identifier, e.g. an rsID
    identifier: Option<String>,
    /// The reference allele, stored as read
    reference: String,
    /// The alternate alleles, ordered as declared on the line
    alternates: Vec<String>,
    /// Optional quality score
    quality: Option<f64>,
    /// Filter status field, e.g. "PASS"
    filter: String,
    /// Open-ended key/value annotations, insertion ordered
    info: IndexMap<String, String>,
    /// One optional genotype call per sample; None means the call was absent ('./.')
    genotypes: Vec<Option<GenotypeCall>>
}

impl VariantRecord {
    /// Creates a new variant record, enforcing the record-level invariants.
    /// # Arguments
    /// * `chromosome` - chromosome name as read from the file
    /// * `position` - 1-based coordinate, must be > 0
    /// * `identifier` - optional cross-reference ID
    /// * `reference` - the reference allele
    /// * `alternates` - the declared alternate alleles, must be non-empty
    /// * `quality` - optional quality score
    /// * `filter` - filter status field
    /// * `info` - annotation key/value pairs
    /// * `genotypes` - one optional call per sample
    /// # Errors
    /// * if the position is zero
    /// * if the reference or any alternate allele is empty or uses invalid symbols
    /// * if a genotype call references an allele index that does not exist
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chromosome: String, position: u64, identifier: Option<String>,
        reference: String, alternates: Vec<String>, quality: Option<f64>,
        filter: String, info: IndexMap<String, String>, genotypes: Vec<Option<GenotypeCall>>
    ) -> Result<Self, VariantError> {
        if position == 0 {
            return Err(VariantError::NonPositivePosition);
        }
        if reference.is_empty() {
            return Err(VariantError::EmptyReference);
        }
        if !is_valid_allele(&reference) {
            return Err(VariantError::InvalidAlleleSymbols { allele: reference });
        }
        if alternates.is_empty() {
            return Err(VariantError::EmptyAlternateList);
        }
        for (index, alt) in alternates.iter().enumerate() {
            if alt.is_empty() {
                return Err(VariantError::EmptyAlternate { index });
            }
            if !is_valid_allele(alt) {
                return Err(VariantError::InvalidAlleleSymbols { allele: alt.clone() });
            }
        }

        // every call index must point at an allele we actually have
        let allele_count = alternates.len() + 1;
        for call in genotypes.iter().flatten() {
            if call.max_allele_index() >= allele_count {
                return Err(VariantError::AlleleIndexRange {
                    index: call.max_allele_index(),
                    allele_count
                });
            }
        }

        Ok(Self {
            chromosome, position, identifier,
            reference, alternates, quality,
            filter, info, genotypes
        })
    }

    /// Returns the 1-based ALT allele index whose sequence matches `alternate`, ignoring case.
    /// # Arguments
    /// * `alternate` - the alternate allele sequence to search for
    pub fn alternate_index(&self, alternate: &str) -> Option<usize> {
        self.alternates.iter()
            .position(|alt| alt.eq_ignore_ascii_case(alternate))
            .map(|p| p + 1)
    }

    /// Returns the genotype call for a sample, or None if the sample is absent or uncalled.
    /// # Arguments
    /// * `sample_index` - the index of the sample column
    pub fn sample_call(&self, sample_index: usize) -> Option<GenotypeCall> {
        self.genotypes.get(sample_index).copied().flatten()
    }

    /// Returns the chromosome in a normalized form for lookups
    pub fn normalized_chromosome(&self) -> String {
        normalize_chromosome(&self.chromosome)
    }

    // getters
    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alternates(&self) -> &[String] {
        &self.alternates
    }

    pub fn quality(&self) -> Option<f64> {
        self.quality
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn info(&self) -> &IndexMap<String, String> {
        &self.info
    }

    pub fn genotypes(&self) -> &[Option<GenotypeCall>] {
        &self.genotypes
    }
}

/// Normalizes a chromosome name for case-insensitive, prefix-insensitive matching.
/// # Arguments
/// * `raw` - the chromosome name as read from a file or table
pub fn normalize_chromosome(raw: &str) -> String {
    let lowered = raw.to_ascii_lowercase();
    match lowered.strip_prefix("chr") {
        Some(stripped) => stripped.to_string(),
        None => lowered
    }
}

/// Returns true if the allele is over {A,C,G,T,N} (any case) or is a structural shorthand token.
/// # Arguments
/// * `allele` - the allele sequence to check
fn is_valid_allele(allele: &str) -> bool {
    // symbolic ALTs like <DEL>, breakend notation, and the spanning-deletion marker pass through
    if allele == "*" || (allele.starts_with('<') && allele.ends_with('>')) {
        return true;
    }
    if allele.contains('[') || allele.contains(']') {
        return true;
    }

    allele.chars().all(|c| matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T' | 'N'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_record(genotypes: Vec<Option<GenotypeCall>>) -> Result<VariantRecord, VariantError> {
        VariantRecord::new(
            "chr22".to_string(), 42126611, Some("rs3892097".to_string()),
            "C".to_string(), vec!["T".to_string()], Some(50.0),
            "PASS".to_string(), Default::default(), genotypes
        )
    }

    #[test]
    fn test_basic_record() {
        let record = basic_record(vec![Some(GenotypeCall::new(0, 1, false))]).unwrap();
        assert_eq!(record.chromosome(), "chr22");
        assert_eq!(record.normalized_chromosome(), "22");
        assert_eq!(record.position(), 42126611);
        assert_eq!(record.identifier(), Some("rs3892097"));
        assert_eq!(record.alternate_index("t"), Some(1));
        assert_eq!(record.alternate_index("G"), None);
        assert_eq!(record.sample_call(0), Some(GenotypeCall::new(0, 1, false)));
        assert_eq!(record.sample_call(1), None);
    }

    #[test]
    fn test_record_invariants() {
        let result = VariantRecord::new(
            "1".to_string(), 0, None,
            "A".to_string(), vec!["C".to_string()], None,
            "PASS".to_string(), Default::default(), vec![]
        );
        assert!(matches!(result, Err(VariantError::NonPositivePosition)));

        let result = VariantRecord::new(
            "1".to_string(), 100, None,
            "A".to_string(), vec![], None,
            "PASS".to_string(), Default::default(), vec![]
        );
        assert!(matches!(result, Err(VariantError::EmptyAlternateList)));

        let result = VariantRecord::new(
            "1".to_string(), 100, None,
            "A".to_string(), vec!["XYZ".to_string()], None,
            "PASS".to_string(), Default::default(), vec![]
        );
        assert!(matches!(result, Err(VariantError::InvalidAlleleSymbols { .. })));

        // genotype index 2 does not exist when there is only one ALT
        let result = basic_record(vec![Some(GenotypeCall::new(0, 2, false))]);
        assert!(matches!(result, Err(VariantError::AlleleIndexRange { index: 2, allele_count: 2 })));
    }

    #[test]
    fn test_symbolic_alleles() {
        let record = VariantRecord::new(
            "1".to_string(), 100, None,
            "A".to_string(), vec!["<DEL>".to_string(), "*".to_string()], None,
            "PASS".to_string(), Default::default(), vec![]
        ).unwrap();
        assert_eq!(record.alternates().len(), 2);
    }

    #[test]
    fn test_genotype_zygosity() {
        let hom_ref = GenotypeCall::new(0, 0, false);
        assert!(hom_ref.is_homozygous_reference());
        assert_eq!(hom_ref.zygosity(1), Zygosity::HomozygousReference);

        let het = GenotypeCall::new(0, 1, false);
        assert_eq!(het.count_allele(1), 1);
        assert_eq!(het.zygosity(1), Zygosity::Heterozygous);

        let hom_alt = GenotypeCall::new(1, 1, true);
        assert!(hom_alt.is_phased());
        assert_eq!(hom_alt.count_allele(1), 2);
        assert_eq!(hom_alt.zygosity(1), Zygosity::HomozygousAlternate);

        // multi-allelic: 1/2 is heterozygous for both ALT indices
        let multi = GenotypeCall::new(1, 2, false);
        assert_eq!(multi.zygosity(1), Zygosity::Heterozygous);
        assert_eq!(multi.zygosity(2), Zygosity::Heterozygous);
    }

    #[test]
    fn test_normalize_chromosome() {
        assert_eq!(normalize_chromosome("chr22"), "22");
        assert_eq!(normalize_chromosome("CHRX"), "x");
        assert_eq!(normalize_chromosome("22"), "22");
        assert_eq!(normalize_chromosome("MT"), "mt");
    }
}
