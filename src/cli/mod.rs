
/*!
Module for the command line interface components.
*/

/// Contains the settings and checks for the analyze subcommand
pub mod analyze;
/// Contains the core CLI, including subcommand definitions
pub mod core;
