//! Capture query strings for each shipped grammar, grouped by language (spec.md §4.1).
//!
//! Every query exposes the same four named captures the registry expects:
//! `@definition.*`, `@import.*`, `@inheritance.*`, `@call.*` — exact capture names are read
//! by [`super::ParserRegistry`]'s generic extraction pass, not hardcoded per language.

pub mod python;
pub mod rust;
pub mod typescript;
