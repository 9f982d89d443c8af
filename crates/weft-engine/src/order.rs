//! Cascade ordering.
//!
//! Stable sort of top-level statements after expansion. Layer-tagged nodes
//! cluster at the position of the first tagged statement, ranked base <
//! components < utilities regardless of how the input ordered its markers;
//! within a layer the order key (first-discovered order) decides, never
//! alphabetical, never specificity. Untagged user content keeps its position
//! relative to the layer block. Duplicate selector chains stay distinct.

use weft_syntax::Node;

pub fn order(nodes: Vec<Node>) -> Vec<Node> {
    let Some(anchor) = nodes.iter().position(|n| n.layer().is_some()) else {
        return nodes;
    };

    let mut keyed: Vec<((usize, u8, u64, usize), Node)> = nodes
        .into_iter()
        .enumerate()
        .map(|(idx, node)| {
            let key = match node.layer() {
                Some(layer) => (
                    anchor,
                    layer.rank(),
                    node.order_key().unwrap_or(idx as u64),
                    idx,
                ),
                None => (idx, 0, 0, idx),
            };
            (key, node)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, node)| node).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weft_syntax::{Layer, Node, Origin, Position, Rule, SourceId};

    fn rule(selector: &str, layer: Option<Layer>, order_key: Option<u64>) -> Node {
        Node::Rule(Rule {
            selector: selector.to_string(),
            nodes: Vec::new(),
            origin: Origin::point(SourceId(0), Position::new(1, 0)),
            layer,
            order_key,
        })
    }

    fn selectors(nodes: &[Node]) -> Vec<&str> {
        nodes
            .iter()
            .map(|n| match n {
                Node::Rule(r) => r.selector.as_str(),
                _ => panic!("expected rule"),
            })
            .collect()
    }

    #[test]
    fn test_layers_rank_regardless_of_input_order() {
        let nodes = vec![
            rule(".u", Some(Layer::Utilities), Some(0)),
            rule(".b", Some(Layer::Base), Some(1)),
            rule(".c", Some(Layer::Components), Some(2)),
        ];
        assert_eq!(selectors(&order(nodes)), vec![".b", ".c", ".u"]);
    }

    #[test]
    fn test_order_key_breaks_ties_within_layer() {
        let nodes = vec![
            rule(".z", Some(Layer::Utilities), Some(0)),
            rule(".a", Some(Layer::Utilities), Some(1)),
        ];
        // First-discovered order, not alphabetical.
        assert_eq!(selectors(&order(nodes)), vec![".z", ".a"]);
    }

    #[test]
    fn test_untagged_content_keeps_relative_position() {
        let nodes = vec![
            rule(".before", None, None),
            rule(".u", Some(Layer::Utilities), Some(0)),
            rule(".after", None, None),
        ];
        assert_eq!(selectors(&order(nodes)), vec![".before", ".u", ".after"]);
    }

    #[test]
    fn test_duplicates_are_not_merged() {
        let nodes = vec![
            rule(".same", Some(Layer::Utilities), Some(0)),
            rule(".same", Some(Layer::Utilities), Some(1)),
        ];
        assert_eq!(selectors(&order(nodes)), vec![".same", ".same"]);
    }

    #[test]
    fn test_ordering_is_idempotent() {
        let nodes = vec![
            rule(".b", Some(Layer::Base), Some(0)),
            rule(".user", None, None),
            rule(".u", Some(Layer::Utilities), Some(1)),
        ];
        let once = order(nodes);
        let twice = order(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_no_tags_is_a_no_op() {
        let nodes = vec![rule(".a", None, None), rule(".b", None, None)];
        assert_eq!(selectors(&order(nodes)), vec![".a", ".b"]);
    }
}
