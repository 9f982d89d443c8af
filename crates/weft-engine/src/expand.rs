//! Directive expansion.
//!
//! Single depth-first, left-to-right pass over the input tree replacing the
//! three marker kinds:
//!
//! - `@tailwind <layer>`: replaced by that layer's generated rule set. Base
//!   rules are spliced from the embedded definitions document and keep its
//!   identity; synthesized rules carry the marker's point origin.
//! - `@apply <candidates> [!important]`: declarations inlined into the
//!   enclosing rule at the marker's slot, origins pointing into the
//!   conceptual generated-utilities document. Unresolvable candidates are a
//!   hard error here, unlike scanning.
//! - `@layer <name> { ... }`: children tagged with the layer for the
//!   orderer. Origins are never rewritten, even for nodes spliced in from
//!   another parsed document.
//!
//! Re-running on marker-free output is a no-op.

use std::collections::HashSet;

use weft_candidate::CandidateRejection;
use weft_syntax::{
    AtRule, Comment, Declaration, Layer, Node, Origin, Parser, Position, Rule, SourceArena,
    Stylesheet,
};

use crate::order;
use crate::registry::{Registry, DEFINITIONS_DOC, PREFLIGHT};
use crate::synthesize::synthesize;
use crate::utility::{resolve_utility, Unresolved};
use crate::variant::resolve_variants;
use crate::ExpandError;

/// Why one candidate produced no rule. The scanner drops these silently;
/// `@apply` escalates them. The policy lives with the caller, never here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerateFailure {
    #[error(transparent)]
    Candidate(#[from] CandidateRejection),
    #[error(transparent)]
    Resolution(#[from] Unresolved),
}

/// Expand every directive marker in the sheet against the observed
/// candidate set, then fix the cascade order. No partial output: the first
/// fatal error aborts the pass.
pub fn expand(
    sheet: Stylesheet,
    registry: &Registry,
    candidates: &[String],
) -> Result<Stylesheet, ExpandError> {
    let Stylesheet { mut sources, nodes } = sheet;

    let mut expander = Expander::new(registry, candidates);
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        expander.expand_top(node, &mut out, &mut sources)?;
    }

    if expander.expanded_any {
        let banner = expander.banner(&mut sources);
        out.insert(0, banner);
    }

    Ok(Stylesheet {
        sources,
        nodes: order::order(out),
    })
}

struct Expander<'a> {
    registry: &'a Registry,
    /// Deduplicated, first-encounter order. This fixes order-key
    /// assignment and keeps output byte-stable across runs.
    candidates: Vec<String>,
    next_order_key: u64,
    /// Next free line in the conceptual generated-utilities document that
    /// `@apply` declarations map into.
    apply_line: usize,
    expanded_any: bool,
}

impl<'a> Expander<'a> {
    fn new(registry: &'a Registry, candidates: &[String]) -> Self {
        let mut seen = HashSet::new();
        let candidates = candidates
            .iter()
            .filter(|c| seen.insert(c.as_str()))
            .cloned()
            .collect();
        Self {
            registry,
            candidates,
            next_order_key: 0,
            apply_line: PREFLIGHT.lines().count() + 2,
            expanded_any: false,
        }
    }

    fn expand_top(
        &mut self,
        node: Node,
        out: &mut Vec<Node>,
        sources: &mut SourceArena,
    ) -> Result<(), ExpandError> {
        match node {
            Node::AtRule(at) if at.name == "tailwind" => self.expand_tailwind(at, out, sources),
            Node::AtRule(at) if at.name == "layer" => self.expand_layer(at, out, sources),
            Node::AtRule(at) if at.name == "apply" => {
                Err(err("@apply is only valid inside a rule", at.origin, sources))
            }
            Node::AtRule(mut at) => {
                if let Some(block) = at.block.take() {
                    at.block = Some(self.expand_block(block, sources)?);
                }
                out.push(Node::AtRule(at));
                Ok(())
            }
            Node::Rule(rule) => {
                let expanded = self.expand_rule(rule, sources)?;
                out.push(expanded);
                Ok(())
            }
            other => {
                out.push(other);
                Ok(())
            }
        }
    }

    // --- @tailwind ---

    fn expand_tailwind(
        &mut self,
        at: AtRule,
        out: &mut Vec<Node>,
        sources: &mut SourceArena,
    ) -> Result<(), ExpandError> {
        let params = at.params.trim();
        if params.is_empty() {
            return Err(err("expected a layer name after @tailwind", at.origin, sources));
        }
        let Some(layer) = Layer::from_name(params) else {
            return Err(err(
                &format!("unknown layer '{params}' in @tailwind"),
                at.origin,
                sources,
            ));
        };

        self.expanded_any = true;
        let marker = Origin::point(at.origin.source, at.origin.start);

        match layer {
            Layer::Base => self.splice_base(out, sources),
            Layer::Components => {
                if self.registry.container && self.candidates.iter().any(|c| c == "container") {
                    self.push_container_rules(marker, out);
                }
            }
            Layer::Utilities => {
                let candidates = self.candidates.clone();
                for token in &candidates {
                    // Scanned content is mostly noise; failures never abort
                    // and never log.
                    if let Ok(node) = self.try_generate(token, marker, Layer::Utilities) {
                        out.push(node);
                    }
                }
            }
        }
        Ok(())
    }

    /// Splice the embedded base stylesheet. Its nodes were parsed from the
    /// definitions document and keep that identity; the sources table must
    /// list it alongside the input file.
    fn splice_base(&mut self, out: &mut Vec<Node>, sources: &mut SourceArena) {
        if !self.registry.preflight {
            return;
        }
        let preflight = Parser::parse(PREFLIGHT, DEFINITIONS_DOC)
            .expect("embedded preflight stylesheet must parse");
        let table = sources.merge(&preflight.sources);
        for mut node in preflight.nodes {
            node.rebase_origins(&table);
            node.set_layer(Layer::Base);
            node.set_order_key(self.next_key());
            out.push(node);
        }
    }

    fn push_container_rules(&mut self, origin: Origin, out: &mut Vec<Node>) {
        let mut base = Node::Rule(Rule {
            selector: ".container".to_string(),
            nodes: vec![Node::Declaration(Declaration {
                property: "width".to_string(),
                value: "100%".to_string(),
                important: self.registry.important,
                origin,
            })],
            origin,
            layer: None,
            order_key: None,
        });
        base.set_layer(Layer::Components);
        base.set_order_key(self.next_key());
        out.push(base);

        for (_, width) in self.registry.theme.screens_by_width() {
            let inner = Node::Rule(Rule {
                selector: ".container".to_string(),
                nodes: vec![Node::Declaration(Declaration {
                    property: "max-width".to_string(),
                    value: width.clone(),
                    important: self.registry.important,
                    origin,
                })],
                origin,
                layer: None,
                order_key: None,
            });
            let mut wrapped = Node::AtRule(AtRule {
                name: "media".to_string(),
                params: format!("(min-width: {width})"),
                block: Some(vec![inner]),
                origin,
                layer: None,
                order_key: None,
            });
            wrapped.set_layer(Layer::Components);
            wrapped.set_order_key(self.next_key());
            out.push(wrapped);
        }
    }

    /// The shared pure resolution pipeline: parse, resolve variants,
    /// resolve declarations, synthesize. Callers decide what a failure
    /// means.
    fn try_generate(
        &mut self,
        token: &str,
        origin: Origin,
        layer: Layer,
    ) -> Result<Node, GenerateFailure> {
        let spec = weft_candidate::parse(token)?;
        let plan = resolve_variants(&spec.variants, self.registry)?;
        let mut decls = resolve_utility(&spec, self.registry)?;
        if self.registry.important {
            for decl in &mut decls {
                decl.important = true;
            }
        }
        Ok(synthesize(&spec, &plan, decls, origin, layer, self.next_key()))
    }

    // --- @layer ---

    fn expand_layer(
        &mut self,
        at: AtRule,
        out: &mut Vec<Node>,
        sources: &mut SourceArena,
    ) -> Result<(), ExpandError> {
        let params = at.params.trim().to_string();
        if params.is_empty() {
            return Err(err("@layer requires a name", at.origin, sources));
        }

        let known = if at.block.is_some() {
            Layer::from_name(&params)
        } else {
            // `@layer a, b;` order statements are plain CSS.
            None
        };

        match known {
            None => {
                // A native cascade layer: user CSS, passed through with only
                // its nested `@apply` markers expanded.
                let mut at = at;
                if let Some(block) = at.block.take() {
                    at.block = Some(self.expand_block(block, sources)?);
                }
                out.push(Node::AtRule(at));
                Ok(())
            }
            Some(layer) => {
                self.expanded_any = true;
                let block = at.block.unwrap_or_default();
                let children = self.expand_block(block, sources)?;
                for mut child in children {
                    // Tag for the orderer; the child's own origin is
                    // untouched even when it was spliced from another
                    // document.
                    child.set_layer(layer);
                    child.set_order_key(self.next_key());
                    out.push(child);
                }
                Ok(())
            }
        }
    }

    // --- @apply ---

    fn expand_apply(
        &mut self,
        at: AtRule,
        out: &mut Vec<Node>,
        sources: &mut SourceArena,
    ) -> Result<(), ExpandError> {
        let mut tokens: Vec<&str> = at.params.split_whitespace().collect();
        let mut forced = false;
        if tokens
            .last()
            .is_some_and(|t| t.eq_ignore_ascii_case("!important"))
        {
            tokens.pop();
            forced = true;
        }
        if tokens.is_empty() {
            return Err(err(
                "@apply requires at least one utility class",
                at.origin,
                sources,
            ));
        }

        let defs = sources.intern(DEFINITIONS_DOC);
        for token in tokens {
            let spec = weft_candidate::parse(token).map_err(|e| {
                err(&format!("cannot apply '{token}': {e}"), at.origin, sources)
            })?;
            if !spec.variants.is_empty() {
                return Err(err(
                    &format!("cannot apply '{token}': variants are not supported in @apply"),
                    at.origin,
                    sources,
                ));
            }
            let decls = resolve_utility(&spec, self.registry).map_err(|e| {
                err(&format!("cannot apply '{token}': {e}"), at.origin, sources)
            })?;

            // Each declaration maps to its position in the utility's own
            // generated form, printed at the current end of the
            // definitions document.
            let rule_line = self.apply_line;
            for (idx, decl) in decls.iter().enumerate() {
                let line = rule_line + 1 + idx;
                let mut text_len = decl.property.len() + 2 + decl.value.len();
                if decl.important {
                    text_len += " !important".len();
                }
                out.push(Node::Declaration(Declaration {
                    property: decl.property.clone(),
                    value: decl.value.clone(),
                    important: decl.important || forced || self.registry.important,
                    origin: Origin::new(
                        defs,
                        Position::new(line, 2),
                        Position::new(line, 2 + text_len),
                    ),
                }));
            }
            // Selector line, declarations, closing brace, blank separator.
            self.apply_line = rule_line + decls.len() + 3;
            self.expanded_any = true;
        }
        Ok(())
    }

    // --- Recursive walks ---

    fn expand_rule(&mut self, rule: Rule, sources: &mut SourceArena) -> Result<Node, ExpandError> {
        let Rule {
            selector,
            nodes,
            origin,
            layer,
            order_key,
        } = rule;

        let mut children = Vec::with_capacity(nodes.len());
        for child in nodes {
            match child {
                Node::AtRule(at) if at.name == "apply" => {
                    self.expand_apply(at, &mut children, sources)?;
                }
                Node::AtRule(at) if at.name == "tailwind" => {
                    return Err(err(
                        "@tailwind is only valid at the top level of the stylesheet",
                        at.origin,
                        sources,
                    ));
                }
                Node::Rule(nested) => children.push(self.expand_rule(nested, sources)?),
                Node::AtRule(mut at) => {
                    if let Some(block) = at.block.take() {
                        at.block = Some(self.expand_block(block, sources)?);
                    }
                    children.push(Node::AtRule(at));
                }
                other => children.push(other),
            }
        }

        Ok(Node::Rule(Rule {
            selector,
            nodes: children,
            origin,
            layer,
            order_key,
        }))
    }

    fn expand_block(
        &mut self,
        nodes: Vec<Node>,
        sources: &mut SourceArena,
    ) -> Result<Vec<Node>, ExpandError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            match node {
                Node::Rule(rule) => out.push(self.expand_rule(rule, sources)?),
                Node::AtRule(at) if at.name == "apply" => {
                    return Err(err(
                        "@apply is only valid inside a rule",
                        at.origin,
                        sources,
                    ));
                }
                Node::AtRule(at) if at.name == "tailwind" => {
                    return Err(err(
                        "@tailwind is only valid at the top level of the stylesheet",
                        at.origin,
                        sources,
                    ));
                }
                Node::AtRule(mut at) => {
                    if let Some(block) = at.block.take() {
                        at.block = Some(self.expand_block(block, sources)?);
                    }
                    out.push(Node::AtRule(at));
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }

    // --- Misc ---

    fn banner(&self, sources: &mut SourceArena) -> Node {
        let defs = sources.intern(DEFINITIONS_DOC);
        Node::Comment(Comment {
            text: format!(
                "! weft v{} | MIT License | https://github.com/weft-css/weft",
                env!("CARGO_PKG_VERSION")
            ),
            origin: Origin::point(defs, Position::new(1, 0)),
        })
    }

    fn next_key(&mut self) -> u64 {
        let key = self.next_order_key;
        self.next_order_key += 1;
        key
    }
}

fn err(message: &str, origin: Origin, sources: &SourceArena) -> ExpandError {
    ExpandError {
        message: message.to_string(),
        file: sources.get(origin.source).name.clone(),
        line: origin.start.line,
        column: origin.start.column,
    }
}
