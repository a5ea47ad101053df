//! Markup I/O for document trees.
//!
//! Parsing goes through `roxmltree`; writing is a small escaping serializer.

mod parse;
mod write;

pub use parse::{parse_document, parse_document_with};
pub use write::{save_markup, write_document, write_document_pretty, XML_DECLARATION};
