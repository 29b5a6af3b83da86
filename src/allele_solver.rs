
use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use crate::data_types::alleles::{AlleleFunction, Diplotype, REFERENCE_ALLELE};
use crate::variant_filter::MatchedVariant;

/// Resolves one gene's diplotype from its accumulated variant matches.
///
/// Each matched variant contributes copies of its defining star allele according
/// to the sample's genotype call: none when homozygous reference or uncalled, one
/// when heterozygous for the defining ALT, two when homozygous. The diplotype is
/// then read off the multiset of contributed copies, defaulting missing slots to
/// the reference allele.
///
/// When more than two copies are implied, true phase cannot be recovered from
/// unphased calls; the two most deleterious copies are kept and the result is
/// flagged low-confidence. That is a documented conservative policy, not an
/// inference of the real phase.
/// # Arguments
/// * `gene` - the gene being resolved
/// * `matches` - the accumulated matches for this gene, in file order
pub fn solve_diplotype(gene: &str, matches: &[MatchedVariant]) -> Diplotype {
    // a star allele defined by multiple variants contributes the max copy count
    // observed across them, not the sum; they describe the same haplotype
    let mut copy_counts: IndexMap<&str, (AlleleFunction, u8)> = IndexMap::new();
    for matched in matches {
        let copies = matched.genotype()
            .map(|call| call.count_allele(matched.allele_index()))
            .unwrap_or(0);
        if copies == 0 {
            continue;
        }

        let entry = copy_counts.entry(matched.star_allele())
            .or_insert((matched.function(), 0));
        entry.1 = entry.1.max(copies);
    }

    let observed: Vec<(&str, AlleleFunction)> = copy_counts.iter()
        .flat_map(|(&label, &(function, copies))| {
            std::iter::repeat((label, function)).take(copies as usize)
        })
        .collect();

    match observed.len() {
        0 => Diplotype::homozygous_reference(gene),
        1 => Diplotype::new(gene, REFERENCE_ALLELE, observed[0].0, false),
        2 => Diplotype::new(gene, observed[0].0, observed[1].0, false),
        n => {
            // ambiguous without phase information; keep the most deleterious pair
            let ranked: Vec<&str> = observed.iter()
                .sorted_by_key(|(label, function)| (function.deleterious_rank(), *label))
                .map(|(label, _function)| *label)
                .collect();
            debug!("{gene}: {n} allele copies observed, tie-breaking to {{{}, {}}}", ranked[0], ranked[1]);
            Diplotype::new(gene, ranked[0], ranked[1], true)
        }
    }
}
