//! Message assembly: `Date:` derivation and `.eml` output.

pub mod date;
pub mod eml;
