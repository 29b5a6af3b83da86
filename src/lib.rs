
/// Resolves a gene's diplotype from its defining variant matches
pub mod allele_solver;
/// End-to-end analysis entry point tying the pipeline together
pub mod analysis;
/// Command line interface functionality
pub mod cli;
/// Contains various shared data types
pub mod data_types;
/// The pharmacogenomic knowledge database and its lookup indices
pub mod database;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Predicts metabolizer phenotypes from resolved diplotypes
pub mod phenotype_caller;
/// Assesses drug risk from phenotype predictions
pub mod risk_solver;
/// Various utility functions that tend to be very generic
pub mod util;
/// Screens decoded variant records against the allele definitions
pub mod variant_filter;
/// All output writers
pub mod writers;
