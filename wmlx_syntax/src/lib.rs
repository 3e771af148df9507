//! The WML translatable-string extraction core.
//!
//! Two loosely coupled engines feed one another. The scanner
//! ([`scan`]) walks configuration source line by line through a
//! deterministic state dispatcher, recognizing directives, tags,
//! attribute assignments, and both quoted string forms, and reports
//! completed strings to a collector. The expansion driver ([`expand`])
//! takes every captured string that still contains macro references,
//! builds a call tree ([`ast`], [`parse`]), resolves arguments upward
//! through the cross-reference index ([`xref`]), and materializes the
//! finite set of concrete strings for the catalog.
//!
//! File discovery, option handling, the corpus indexer, and catalog
//! serialization live with the driver; this crate consumes pre-loaded
//! line buffers and a read-only index.

pub use wmlx_errors as errors;
pub use wmlx_pos::{FileName, Loc, MacroId};

pub mod ast;
pub mod catalog;
pub mod expand;
pub mod globals;
pub mod json;
pub mod parse;
pub mod scan;
pub mod session;
pub mod xref;

pub use crate::catalog::{CatalogEntry, ExtractedString, StringFlags, StringSink};
pub use crate::expand::{catalog_entries, expand_sentence};
pub use crate::scan::{scan_source, Machine, ScannerContext, ScriptScanner, SkipScript};
pub use crate::session::ScanSession;
pub use crate::xref::{CallSite, Definition, MacroIndex};
