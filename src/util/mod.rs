
/*!
Catch-all for utility functionality.
*/

/// Generic JSON load/save with transparent gzip handling
pub mod json_io;
