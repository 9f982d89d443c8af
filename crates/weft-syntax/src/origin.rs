//! Source identities and node provenance.
//!
//! Every node in a stylesheet carries an [`Origin`] by value: which document
//! it came from and where in that document. Origins are never derived from a
//! node's current position in a tree: splicing nodes between documents keeps
//! the original identity, which is what makes composed source maps correct.

use crate::sourcemap::SourceMap;

/// A position in source text: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Index of a document in a [`SourceArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub usize);

/// A document identity registered in the arena.
///
/// `prev_map` holds the source map the document arrived with, if it was
/// already the output of an earlier compilation; printed origins are resolved
/// through it so mappings chain back to the true original file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub prev_map: Option<SourceMap>,
}

/// The arena of documents contributing nodes to a stylesheet.
///
/// Nodes reference documents by [`SourceId`] index rather than holding a
/// back-pointer, so trees can be spliced together without rewriting any
/// node's provenance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceArena {
    files: Vec<SourceFile>,
}

impl SourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document by name, reusing the existing id if the name is
    /// already present.
    pub fn intern(&mut self, name: &str) -> SourceId {
        self.intern_with_prev(name, None)
    }

    /// Register a document carrying a previous source map.
    ///
    /// If the name is already present, an existing `prev_map` is kept; a new
    /// one is only attached to a fresh entry.
    pub fn intern_with_prev(&mut self, name: &str, prev_map: Option<SourceMap>) -> SourceId {
        if let Some(idx) = self.files.iter().position(|f| f.name == name) {
            return SourceId(idx);
        }
        self.files.push(SourceFile {
            name: name.to_string(),
            prev_map,
        });
        SourceId(self.files.len() - 1)
    }

    pub fn get(&self, id: SourceId) -> &SourceFile {
        &self.files[id.0]
    }

    pub fn contains(&self, id: SourceId) -> bool {
        id.0 < self.files.len()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }

    /// Fold another arena into this one, returning the translation table:
    /// `table[other_id.0]` is the id the same document has in `self`.
    ///
    /// Documents are deduplicated by name, so splicing the same file twice
    /// does not produce duplicate sources-table entries.
    pub fn merge(&mut self, other: &SourceArena) -> Vec<SourceId> {
        other
            .files
            .iter()
            .map(|f| self.intern_with_prev(&f.name, f.prev_map.clone()))
            .collect()
    }
}

/// Provenance of a node: document identity plus start/end positions.
///
/// A freshly synthesized node (no prior text) gets a point origin at the
/// directive marker that produced it; a parsed or spliced node keeps the
/// origin of its own text forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub source: SourceId,
    pub start: Position,
    pub end: Position,
}

impl Origin {
    pub fn new(source: SourceId, start: Position, end: Position) -> Self {
        Self { source, start, end }
    }

    /// A zero-width origin, used for synthesized nodes that map back to a
    /// single marker position.
    pub fn point(source: SourceId, at: Position) -> Self {
        Self {
            source,
            start: at,
            end: at,
        }
    }

    /// Remap the source id through an arena-merge translation table.
    pub fn rebase(self, table: &[SourceId]) -> Self {
        Self {
            source: table[self.source.0],
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_intern_dedups_by_name() {
        let mut arena = SourceArena::new();
        let a = arena.intern("input.css");
        let b = arena.intern("other.css");
        let c = arena.intern("input.css");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_merge_returns_translation_table() {
        let mut left = SourceArena::new();
        left.intern("main.css");

        let mut right = SourceArena::new();
        right.intern("components.css");
        right.intern("main.css");

        let table = left.merge(&right);
        assert_eq!(table, vec![SourceId(1), SourceId(0)]);
        assert_eq!(left.len(), 2);
        assert_eq!(left.get(SourceId(1)).name, "components.css");
    }

    #[test]
    fn test_rebase_keeps_positions() {
        let origin = Origin::new(
            SourceId(0),
            Position::new(3, 2),
            Position::new(3, 20),
        );
        let rebased = origin.rebase(&[SourceId(4)]);
        assert_eq!(rebased.source, SourceId(4));
        assert_eq!(rebased.start, Position::new(3, 2));
        assert_eq!(rebased.end, Position::new(3, 20));
    }

    #[test]
    fn test_point_origin_is_zero_width() {
        let origin = Origin::point(SourceId(0), Position::new(2, 0));
        assert_eq!(origin.start, origin.end);
    }

    #[test]
    fn test_intern_keeps_existing_prev_map() {
        let mut arena = SourceArena::new();
        let prev = SourceMap {
            file: None,
            sources: vec!["original.css".into()],
            mappings: Vec::new(),
        };
        let a = arena.intern_with_prev("input.css", Some(prev));
        let b = arena.intern_with_prev("input.css", None);
        assert_eq!(a, b);
        assert!(arena.get(a).prev_map.is_some());
    }
}
