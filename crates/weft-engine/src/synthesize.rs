//! Rule synthesis.
//!
//! Combines a wrapping plan and resolved declarations into a finished tree
//! node: escaped class selector at the innermost level, at-rule wrappers
//! folded outward in stack order, layer tag and order key on the outermost
//! node. Every synthesized node carries the triggering marker's point
//! origin.

use weft_candidate::UtilitySpec;
use weft_syntax::{AtRule, Declaration, Layer, Node, Origin, Rule};

use crate::selector::escape_class;
use crate::utility::ResolvedDeclaration;
use crate::variant::{Wrapper, WrappingPlan};

/// Build the output node for one candidate.
pub fn synthesize(
    spec: &UtilitySpec,
    plan: &WrappingPlan,
    declarations: Vec<ResolvedDeclaration>,
    origin: Origin,
    layer: Layer,
    order_key: u64,
) -> Node {
    let mut selector = format!(".{}", escape_class(&spec.raw));
    let mut at_rules: Vec<(String, String)> = Vec::new();

    for wrapper in &plan.wrappers {
        match wrapper {
            Wrapper::Suffix(suffix) => selector.push_str(suffix),
            Wrapper::Parent(pattern) => selector = pattern.replace('&', &selector),
            Wrapper::AtRule { name, params } => {
                at_rules.push((name.clone(), params.clone()));
            }
        }
    }

    let nodes = declarations
        .into_iter()
        .map(|decl| {
            Node::Declaration(Declaration {
                property: decl.property,
                value: decl.value,
                important: decl.important,
                origin,
            })
        })
        .collect();

    let mut node = Node::Rule(Rule {
        selector,
        nodes,
        origin,
        layer: None,
        order_key: None,
    });

    // Stack order is innermost-first, so folding in order leaves the last
    // written variant as the outermost at-rule.
    for (name, params) in at_rules {
        node = Node::AtRule(AtRule {
            name,
            params,
            block: Some(vec![node]),
            origin,
            layer: None,
            order_key: None,
        });
    }

    node.set_layer(layer);
    node.set_order_key(order_key);
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::theme::Config;
    use crate::utility::resolve_utility;
    use crate::variant::resolve_variants;
    use pretty_assertions::assert_eq;
    use weft_syntax::{Position, SourceId};

    fn build(token: &str) -> Node {
        let registry = Registry::new(&Config::default());
        let spec = weft_candidate::parse(token).unwrap();
        let plan = resolve_variants(&spec.variants, &registry).unwrap();
        let decls = resolve_utility(&spec, &registry).unwrap();
        let origin = Origin::point(SourceId(0), Position::new(2, 0));
        synthesize(&spec, &plan, decls, origin, Layer::Utilities, 7)
    }

    #[test]
    fn test_plain_utility_rule() {
        let Node::Rule(rule) = build("underline") else {
            panic!("expected rule");
        };
        assert_eq!(rule.selector, ".underline");
        assert_eq!(rule.layer, Some(Layer::Utilities));
        assert_eq!(rule.order_key, Some(7));
        assert_eq!(rule.nodes.len(), 1);
    }

    #[test]
    fn test_suffix_variant_on_escaped_selector() {
        let Node::Rule(rule) = build("hover:underline") else {
            panic!("expected rule");
        };
        assert_eq!(rule.selector, ".hover\\:underline:hover");
    }

    #[test]
    fn test_parent_variant_wraps_selector() {
        let Node::Rule(rule) = build("group-hover:underline") else {
            panic!("expected rule");
        };
        assert_eq!(rule.selector, ".group:hover .group-hover\\:underline");
    }

    #[test]
    fn test_last_variant_is_outermost_wrapper() {
        // sm is written first, dark last: dark must be the outer at-rule.
        let Node::AtRule(outer) = build("sm:dark:underline") else {
            panic!("expected at-rule");
        };
        assert_eq!(outer.params, "(prefers-color-scheme: dark)");
        assert_eq!(outer.layer, Some(Layer::Utilities));
        let Some(Node::AtRule(inner)) = outer.block.as_deref().map(|b| &b[0]) else {
            panic!("expected nested at-rule");
        };
        assert_eq!(inner.params, "(min-width: 640px)");
        let Some(Node::Rule(rule)) = inner.block.as_deref().map(|b| &b[0]) else {
            panic!("expected innermost rule");
        };
        assert_eq!(rule.selector, ".sm\\:dark\\:underline");
    }

    #[test]
    fn test_synthesized_nodes_share_marker_origin() {
        let node = build("dark:underline");
        let origin = node.origin();
        assert_eq!(origin.start, origin.end);
        assert_eq!(origin.start, Position::new(2, 0));
        let Node::AtRule(outer) = node else {
            panic!("expected at-rule");
        };
        let block = outer.block.unwrap();
        assert_eq!(block[0].origin(), origin);
    }
}
