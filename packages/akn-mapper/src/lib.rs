//! AKN Mapper - Bidirectional schema mapping between Akoma Ntoso and editor HTML.
//!
//! Editor plugins declare how legal-XML elements appear in the editing
//! surface. This crate normalizes those declarations, composes them in the
//! order the editor activates plugins, and walks document trees in either
//! direction: `to` when a document is loaded into the editor, `from` when
//! editor content is saved.
//!
//! # Example
//!
//! ```
//! use akn_mapper::{create_leos_registry, Direction, SchemaMapper, LEOS_PLUGINS};
//! use akn_mapper::xml::{parse_document, write_document};
//!
//! let mut mapper = SchemaMapper::new(create_leos_registry().unwrap())
//!     .with_active(LEOS_PLUGINS.iter().copied());
//!
//! let akn = parse_document("<recital><num>(1)</num><mp>Whereas...</mp></recital>").unwrap();
//! let html = mapper.transform(Direction::To, &akn).unwrap();
//! assert_eq!(
//!     write_document(&html),
//!     r#"<p data-akn-name="recital"><p data-akn-num="">(1)</p><p>Whereas...</p></p>"#
//! );
//!
//! let back = mapper.transform(Direction::From, &html).unwrap();
//! assert_eq!(back, akn);
//! ```
//!
//! # Architecture
//!
//! The mapper is organized into several modules:
//!
//! - [`config`]: Configuration constants, validation and pass options
//! - [`types`]: Document tree types and the transformation direction
//! - [`error`]: Error types and Result alias
//! - [`rules`]: Rule declarations, normalization, registry and resolution
//! - [`hierarchy`]: Depth-specific rules for self-nesting constructs
//! - [`transform`]: The recursive transformation engine
//! - [`mapper`]: Registry, resolution cache and engine behind one type
//! - [`profile`]: Editor profile files
//! - [`xml`]: Markup parsing and serialization
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod mapper;
pub mod profile;
pub mod rules;
pub mod transform;
pub mod types;
pub mod xml;

// Re-export commonly used items
pub use config::{validate_plugin_id, TransformOptions, UnmatchedElementPolicy};
pub use error::{MapperError, Result};
pub use hierarchy::{HierarchicalExpander, HierarchyProfile};
pub use mapper::SchemaMapper;
pub use profile::EditorProfile;
pub use rules::{
    create_leos_registry, normalize, ElementRule, NormalizedRuleSet, ResolvedRuleSet, RuleOverride,
    RuleRegistry, RuleResolver, LEOS_PLUGINS,
};
pub use transform::{TransformEngine, TransformStats};
pub use types::{Direction, DocumentNode, Element};
