#![forbid(unsafe_code)]

//! Translation catalogs for the Geometry Shapes plugin.
//!
//! Loads Qt Linguist `.ts` documents into an immutable [`Catalog`] keyed by
//! (context, source string, optional comment), and answers lookups with a
//! graceful fallback to the untranslated source text.
//!
//! # Example
//!
//! ```
//! use shapes_i18n::parse::load_str;
//!
//! let catalog = load_str(
//!     r#"<?xml version="1.0" encoding="utf-8"?>
//! <!DOCTYPE TS>
//! <TS version="2.1" language="nl" sourcelanguage="en">
//! <context>
//!     <name>RectangleGeometryTool</name>
//!     <message>
//!         <source>Size x/y</source>
//!         <translation>Afmetingen x/y</translation>
//!     </message>
//! </context>
//! </TS>"#,
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     catalog.lookup("RectangleGeometryTool", "Size x/y", None).unwrap(),
//!     "Afmetingen x/y"
//! );
//! assert_eq!(catalog.lookup("Unknown", "Nonexistent", None).unwrap(), "Nonexistent");
//! ```

pub mod catalog;
pub mod config;
pub mod coverage;
pub mod error;
pub mod model;
pub mod numerus;
pub mod parse;
pub mod translator;
pub mod writer;

pub use catalog::{Catalog, CatalogBuilder};
pub use config::I18nConfig;
pub use coverage::{ContextCoverage, CoverageReport};
pub use error::CatalogError;
pub use model::{Context, Location, Message, Resolution, TranslationState};
pub use numerus::NumerusRule;
pub use translator::Translator;
