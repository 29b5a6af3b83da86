/*!
# Parsing module
Contains the logic for parsing input files into meaningful structs / data.
*/

/// Streaming decoder for the tab-delimited variant file format
pub mod vcf_reader;
