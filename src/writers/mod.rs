
/*!
Module for writers of the various output files.
*/

/// Contains the writer for the per-drug risk summary table
pub mod summary;
