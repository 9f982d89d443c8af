//! Variant resolution.
//!
//! Interprets a candidate's variant stack against the registry, producing a
//! wrapping plan. Variants apply innermost-first in the order written, so
//! the LAST listed variant becomes the OUTERMOST wrapper in the output:
//! `sm:dark:underline` nests the min-width query inside the color-scheme
//! query. The plan records wrappers in written order; the synthesizer folds
//! them outward.

use weft_candidate::VariantToken;

use crate::registry::{Registry, ResolvedVariant};
use crate::utility::Unresolved;

/// One selector or at-rule wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wrapper {
    /// Pseudo-class suffix appended to the compound selector.
    Suffix(String),
    /// Parent pattern; `&` marks where the compound selector lands.
    Parent(String),
    /// At-rule wrapper.
    AtRule { name: String, params: String },
}

/// The ordered wrapping plan for one candidate, innermost-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappingPlan {
    pub wrappers: Vec<Wrapper>,
}

/// Resolve a variant stack. An unknown named variant fails the whole
/// candidate; an arbitrary selector template must contain the `&` anchor.
pub fn resolve_variants(
    variants: &[VariantToken],
    registry: &Registry,
) -> Result<WrappingPlan, Unresolved> {
    let mut wrappers = Vec::with_capacity(variants.len());

    for variant in variants {
        match variant {
            VariantToken::Named(name) => {
                let resolved = registry
                    .variant(name)
                    .ok_or_else(|| Unresolved::UnknownVariant(name.clone()))?;
                wrappers.push(match resolved {
                    ResolvedVariant::Suffix(suffix) => Wrapper::Suffix(suffix),
                    ResolvedVariant::Parent(pattern) => Wrapper::Parent(pattern),
                    ResolvedVariant::Media(params) => Wrapper::AtRule {
                        name: "media".to_string(),
                        params,
                    },
                });
            }
            VariantToken::Arbitrary(template) => {
                wrappers.push(resolve_arbitrary(template)?);
            }
        }
    }

    Ok(WrappingPlan { wrappers })
}

fn resolve_arbitrary(template: &str) -> Result<Wrapper, Unresolved> {
    if let Some(rest) = template.strip_prefix('@') {
        let split = rest
            .find(|c: char| c.is_whitespace() || c == '(')
            .unwrap_or(rest.len());
        let name = rest[..split].to_string();
        let params = rest[split..].trim().to_string();
        if name.is_empty() {
            return Err(Unresolved::InvalidVariantTemplate(template.to_string()));
        }
        return Ok(Wrapper::AtRule { name, params });
    }

    if !template.contains('&') {
        return Err(Unresolved::InvalidVariantTemplate(template.to_string()));
    }
    Ok(Wrapper::Parent(template.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Config;
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        Registry::new(&Config::default())
    }

    fn plan(token: &str) -> Result<WrappingPlan, Unresolved> {
        let spec = weft_candidate::parse(token).unwrap();
        resolve_variants(&spec.variants, &registry())
    }

    #[test]
    fn test_suffix_variant() {
        assert_eq!(
            plan("hover:underline").unwrap().wrappers,
            vec![Wrapper::Suffix(":hover".into())]
        );
    }

    #[test]
    fn test_media_variant() {
        assert_eq!(
            plan("dark:underline").unwrap().wrappers,
            vec![Wrapper::AtRule {
                name: "media".into(),
                params: "(prefers-color-scheme: dark)".into()
            }]
        );
    }

    #[test]
    fn test_parent_variant() {
        assert_eq!(
            plan("group-hover:underline").unwrap().wrappers,
            vec![Wrapper::Parent(".group:hover &".into())]
        );
    }

    #[test]
    fn test_stack_keeps_written_order() {
        assert_eq!(
            plan("sm:dark:underline").unwrap().wrappers,
            vec![
                Wrapper::AtRule {
                    name: "media".into(),
                    params: "(min-width: 640px)".into()
                },
                Wrapper::AtRule {
                    name: "media".into(),
                    params: "(prefers-color-scheme: dark)".into()
                },
            ]
        );
    }

    #[test]
    fn test_unknown_variant_fails_whole_candidate() {
        assert!(matches!(
            plan("sparkle:underline"),
            Err(Unresolved::UnknownVariant(_))
        ));
    }

    #[test]
    fn test_arbitrary_selector_variant() {
        assert_eq!(
            plan("[&:nth-child(3)]:underline").unwrap().wrappers,
            vec![Wrapper::Parent("&:nth-child(3)".into())]
        );
    }

    #[test]
    fn test_arbitrary_selector_requires_anchor() {
        assert!(matches!(
            plan("[:nth-child(3)]:underline"),
            Err(Unresolved::InvalidVariantTemplate(_))
        ));
    }

    #[test]
    fn test_arbitrary_at_rule_variant() {
        assert_eq!(
            plan("[@supports(display:grid)]:underline").unwrap().wrappers,
            vec![Wrapper::AtRule {
                name: "supports".into(),
                params: "(display:grid)".into()
            }]
        );
    }
}
