//! Stylesheet printer.
//!
//! Emits the final CSS text with a fixed grammar (two-space indents, one
//! declaration per line, a blank line between top-level statements) and
//! records one source-map mapping per printed node. The mapping list is
//! computed the same way in every [`MapMode`]; the mode only chooses how the
//! map travels with the text.

use crate::node::{AtRule, Comment, Declaration, Node, Rule, Stylesheet};
use crate::origin::{Origin, Position};
use crate::sourcemap::{MapMode, Mapping, SourceMap};

#[derive(Debug, Clone, Default)]
pub struct MapOptions {
    pub mode: MapMode,
    /// Name written into the `sourceMappingURL` comment in `File` mode.
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintResult {
    pub css: String,
    pub map: SourceMap,
}

pub struct Printer<'a> {
    sheet: &'a Stylesheet,
    out: String,
    line: usize,
    column: usize,
    map: SourceMap,
}

impl<'a> Printer<'a> {
    pub fn print(sheet: &'a Stylesheet, options: &MapOptions) -> PrintResult {
        // Every document in the arena contributed nodes to this tree, so the
        // sources table starts from the arena; a replaced marker must not
        // erase its document's entry. Documents carrying a `prev` map are
        // transitional identities; they enter the table only if a lookup
        // through their map misses.
        let mut sources = Vec::with_capacity(sheet.sources.len());
        for idx in 0..sheet.sources.len() {
            let file = sheet.sources.get(crate::origin::SourceId(idx));
            if file.prev_map.is_none() {
                sources.push(file.name.clone());
            }
        }

        let mut printer = Printer {
            sheet,
            out: String::new(),
            line: 1,
            column: 0,
            map: SourceMap {
                file: options.file.clone(),
                sources,
                mappings: Vec::new(),
            },
        };

        for (idx, node) in sheet.nodes.iter().enumerate() {
            if idx > 0 {
                printer.push("\n\n");
            }
            printer.print_node(node, 0);
        }
        if !sheet.nodes.is_empty() {
            printer.push("\n");
        }

        match options.mode {
            MapMode::Off => {}
            MapMode::Inline => {
                let comment = printer.map.inline_comment();
                printer.push(&comment);
                printer.push("\n");
            }
            MapMode::File => {
                let name = options.file.clone().unwrap_or_else(|| "out.css.map".into());
                let comment = SourceMap::file_comment(&name);
                printer.push(&comment);
                printer.push("\n");
            }
        }

        PrintResult {
            css: printer.out,
            map: printer.map,
        }
    }

    fn print_node(&mut self, node: &Node, depth: usize) {
        match node {
            Node::Comment(c) => self.print_comment(c, depth),
            Node::Declaration(d) => self.print_declaration(d, depth),
            Node::Rule(r) => self.print_rule(r, depth),
            Node::AtRule(a) => self.print_at_rule(a, depth),
        }
    }

    fn print_comment(&mut self, comment: &Comment, depth: usize) {
        self.indent(depth);
        self.record(comment.origin, true);
        if comment.text.starts_with('!') {
            self.push(&format!("/*{} */", comment.text));
        } else {
            self.push(&format!("/* {} */", comment.text));
        }
    }

    fn print_declaration(&mut self, decl: &Declaration, depth: usize) {
        self.indent(depth);
        let text = if decl.important {
            format!("{}: {} !important;", decl.property, decl.value)
        } else {
            format!("{}: {};", decl.property, decl.value)
        };
        // End column excludes the trailing semicolon.
        let end = self.column + text.len() - 1;
        self.record_with_end(decl.origin, Some(end), true);
        self.push(&text);
    }

    fn print_rule(&mut self, rule: &Rule, depth: usize) {
        self.indent(depth);
        self.record(rule.origin, false);
        self.push(&format!("{} {{", rule.selector));
        for child in &rule.nodes {
            self.push("\n");
            self.print_node(child, depth + 1);
        }
        self.push("\n");
        self.indent(depth);
        self.record_close(rule.origin);
        self.push("}");
    }

    fn print_at_rule(&mut self, at: &AtRule, depth: usize) {
        self.indent(depth);
        self.record(at.origin, false);
        let header = if at.params.is_empty() {
            format!("@{}", at.name)
        } else {
            format!("@{} {}", at.name, at.params)
        };
        match &at.block {
            None => {
                self.push(&format!("{header};"));
            }
            Some(block) => {
                self.push(&format!("{header} {{"));
                for child in block {
                    self.push("\n");
                    self.print_node(child, depth + 1);
                }
                self.push("\n");
                self.indent(depth);
                self.record_close(at.origin);
                self.push("}");
            }
        }
    }

    // --- Mapping helpers ---

    /// Record a mapping at the current output position for a node start.
    /// `span_original` carries the original end column through for nodes
    /// printed as a single run of text (declarations, comments).
    fn record(&mut self, origin: Origin, span_original: bool) {
        self.record_with_end(origin, None, span_original);
    }

    fn record_with_end(
        &mut self,
        origin: Origin,
        generated_end: Option<usize>,
        span_original: bool,
    ) {
        let (source, original, original_end) = self.resolve(origin, span_original);
        self.map.mappings.push(Mapping {
            generated: Position::new(self.line, self.column),
            generated_end,
            source,
            original,
            original_end,
        });
    }

    /// Map a closing brace back to the node's end position (for point
    /// origins this is the marker itself).
    fn record_close(&mut self, origin: Origin) {
        let file = self.sheet.sources.get(origin.source);
        let (source, original) = match file
            .prev_map
            .as_ref()
            .and_then(|prev| prev.original_position_for(origin.end.line, origin.end.column))
        {
            Some((name, pos)) => (self.source_index(&name.to_string()), pos),
            None => {
                let name = file.name.clone();
                (self.source_index(&name), origin.end)
            }
        };
        self.map.mappings.push(Mapping {
            generated: Position::new(self.line, self.column),
            generated_end: None,
            source,
            original,
            original_end: None,
        });
    }

    /// Resolve an origin to a sources-table index and original position,
    /// chaining through the document's `prev` map when it has one.
    ///
    /// Provenance is an invariant here, not an error path: an origin that
    /// does not name a real arena entry is a compiler defect.
    fn resolve(
        &mut self,
        origin: Origin,
        span_original: bool,
    ) -> (usize, Position, Option<usize>) {
        debug_assert!(
            self.sheet.sources.contains(origin.source),
            "node origin references a document outside the arena"
        );
        let file = self.sheet.sources.get(origin.source);

        if let Some(prev) = &file.prev_map {
            if let Some((name, pos)) =
                prev.original_position_for(origin.start.line, origin.start.column)
            {
                let name = name.to_string();
                let idx = self.source_index(&name);
                return (idx, pos, None);
            }
        }

        let name = file.name.clone();
        let idx = self.source_index(&name);
        let original_end = if span_original
            && origin.start != origin.end
            && origin.start.line == origin.end.line
        {
            Some(origin.end.column)
        } else {
            None
        };
        (idx, origin.start, original_end)
    }

    fn source_index(&mut self, name: &String) -> usize {
        if let Some(idx) = self.map.sources.iter().position(|s| s == name) {
            return idx;
        }
        self.map.sources.push(name.clone());
        self.map.sources.len() - 1
    }

    // --- Text helpers ---

    fn indent(&mut self, depth: usize) {
        self.push(&"  ".repeat(depth));
    }

    fn push(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += 1;
            }
        }
        self.out.push_str(text);
    }
}
