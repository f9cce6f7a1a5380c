//! Utility functions for URL handling and export formatting.
//!
//! - [`url_parts`] - Lossless URL splitting and origin swapping
//! - [`encoding`] - Percent-encoding for query components
//! - [`csv`] - CSV field quoting for audit exports

pub mod csv;
pub mod encoding;
pub mod url_parts;
