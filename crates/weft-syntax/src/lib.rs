//! weft stylesheet syntax
//!
//! Parses CSS text into a node tree with exact position metadata, and prints
//! a tree back to text plus a source map. Every node carries its provenance
//! ([`Origin`]) by value, so trees composed from several documents keep each
//! contributor's identity all the way into the emitted map.
//!
//! # Example
//!
//! ```
//! use weft_syntax::Parser;
//!
//! let sheet = Parser::parse("", "input.css").unwrap();
//! assert!(sheet.nodes.is_empty());
//! ```

pub mod node;
pub mod origin;
pub mod parser;
pub mod printer;
pub mod sourcemap;

pub use node::{AtRule, Comment, Declaration, Layer, Node, Rule, Stylesheet};
pub use origin::{Origin, Position, SourceArena, SourceFile, SourceId};
pub use parser::Parser;
pub use printer::{MapOptions, PrintResult, Printer};
pub use sourcemap::{MapMode, Mapping, SourceMap};

/// Parse error with position information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Syntax error at line {line}, column {column}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}
