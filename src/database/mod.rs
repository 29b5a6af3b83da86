/*!
# Database module
The static pharmacogenomic knowledge tables and the indices built over them at load time.
*/

/// The knowledge tables: variant-to-allele, diplotype-to-phenotype, and drug-gene interactions
pub mod pgx_database;
