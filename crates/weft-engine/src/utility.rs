//! Utility resolution.
//!
//! Turns a parsed candidate's base + value into concrete declarations via
//! the registry tables. This is one pure function shared by free scanning
//! and `@apply`; an [`Unresolved`] result carries no policy. The scanner
//! discards it, `@apply` escalates it.

use weft_candidate::{UtilitySpec, ValueToken};

use crate::registry::{ColorUtility, Registry, Scale, UtilityDef, ValueKind, ValueUtility};

/// A resolved `property: value` pair, in template-declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDeclaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

/// Why a candidate did not resolve. Deterministic; never transient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unresolved {
    #[error("unknown utility '{0}'")]
    UnknownUtility(String),
    #[error("unknown variant '{0}'")]
    UnknownVariant(String),
    #[error("arbitrary variant '{0}' has no '&' placeholder")]
    InvalidVariantTemplate(String),
    #[error("'{base}' has no value '{value}'")]
    UnknownValue { base: String, value: String },
    #[error("'{value}' is not a valid value for '{base}'")]
    InvalidArbitrary { base: String, value: String },
    #[error("'{0}' requires a value")]
    MissingValue(String),
    #[error("'{0}' does not take a value")]
    UnexpectedValue(String),
    #[error("'{0}' does not support a modifier")]
    UnexpectedModifier(String),
    #[error("'{0}' cannot be negated")]
    UnexpectedNegative(String),
}

/// Resolve a candidate's declarations. Importance here reflects the
/// candidate's own flag; callers may force it further (global `important`
/// config, `@apply ... !important`).
pub fn resolve_utility(
    spec: &UtilitySpec,
    registry: &Registry,
) -> Result<Vec<ResolvedDeclaration>, Unresolved> {
    let def = registry
        .utility(&spec.base)
        .ok_or_else(|| Unresolved::UnknownUtility(spec.base.clone()))?;

    match def {
        UtilityDef::Static(decls) => {
            if spec.value.is_some() {
                return Err(Unresolved::UnexpectedValue(spec.base.clone()));
            }
            if spec.negative {
                return Err(Unresolved::UnexpectedNegative(spec.base.clone()));
            }
            if spec.modifier.is_some() {
                return Err(Unresolved::UnexpectedModifier(spec.base.clone()));
            }
            Ok(decls
                .iter()
                .map(|(property, value)| ResolvedDeclaration {
                    property: (*property).to_string(),
                    value: (*value).to_string(),
                    important: spec.important,
                })
                .collect())
        }
        UtilityDef::Color(color) => resolve_color(spec, registry, color),
        UtilityDef::Value(value) => resolve_value(spec, registry, value),
    }
}

fn resolve_color(
    spec: &UtilitySpec,
    registry: &Registry,
    def: &ColorUtility,
) -> Result<Vec<ResolvedDeclaration>, Unresolved> {
    if spec.negative {
        return Err(Unresolved::UnexpectedNegative(spec.base.clone()));
    }

    let raw = match &spec.value {
        None => {
            let Some(bare) = def.bare else {
                return Err(Unresolved::MissingValue(spec.base.clone()));
            };
            if spec.modifier.is_some() {
                return Err(Unresolved::UnexpectedModifier(spec.base.clone()));
            }
            return Ok(bare
                .iter()
                .map(|(property, value)| ResolvedDeclaration {
                    property: (*property).to_string(),
                    value: (*value).to_string(),
                    important: spec.important,
                })
                .collect());
        }
        Some(ValueToken::Named(token)) => {
            registry
                .theme
                .color(token)
                .ok_or_else(|| Unresolved::UnknownValue {
                    base: spec.base.clone(),
                    value: token.clone(),
                })?
        }
        Some(ValueToken::Arbitrary(literal)) => {
            if !is_color(literal) {
                return Err(Unresolved::InvalidArbitrary {
                    base: spec.base.clone(),
                    value: literal.clone(),
                });
            }
            literal.clone()
        }
    };

    let value = match &spec.modifier {
        None => raw,
        Some(modifier) => with_alpha(&raw, modifier).ok_or_else(|| {
            Unresolved::UnexpectedModifier(spec.base.clone())
        })?,
    };

    Ok(def
        .properties
        .iter()
        .map(|property| ResolvedDeclaration {
            property: (*property).to_string(),
            value: value.clone(),
            important: spec.important,
        })
        .collect())
}

fn resolve_value(
    spec: &UtilitySpec,
    registry: &Registry,
    def: &ValueUtility,
) -> Result<Vec<ResolvedDeclaration>, Unresolved> {
    if spec.modifier.is_some() {
        return Err(Unresolved::UnexpectedModifier(spec.base.clone()));
    }

    let raw = match &spec.value {
        None => {
            let Some(bare) = def.bare else {
                return Err(Unresolved::MissingValue(spec.base.clone()));
            };
            if spec.negative {
                return Err(Unresolved::UnexpectedNegative(spec.base.clone()));
            }
            return Ok(bare
                .iter()
                .map(|(property, value)| ResolvedDeclaration {
                    property: (*property).to_string(),
                    value: (*value).to_string(),
                    important: spec.important,
                })
                .collect());
        }
        Some(ValueToken::Named(token)) => lookup_named(token, registry, def)
            .ok_or_else(|| Unresolved::UnknownValue {
                base: spec.base.clone(),
                value: token.clone(),
            })?,
        Some(ValueToken::Arbitrary(literal)) => {
            if !matches_kind(literal, def.kind) {
                return Err(Unresolved::InvalidArbitrary {
                    base: spec.base.clone(),
                    value: literal.clone(),
                });
            }
            literal.clone()
        }
    };

    let value = if spec.negative {
        if !def.supports_negative {
            return Err(Unresolved::UnexpectedNegative(spec.base.clone()));
        }
        negate(&raw)
    } else {
        raw
    };

    Ok(def
        .properties
        .iter()
        .map(|property| ResolvedDeclaration {
            property: (*property).to_string(),
            value: value.clone(),
            important: spec.important,
        })
        .collect())
}

fn lookup_named(token: &str, registry: &Registry, def: &ValueUtility) -> Option<String> {
    if let Some((_, value)) = def.extra.iter().find(|(key, _)| *key == token) {
        return Some((*value).to_string());
    }
    match def.scale {
        Scale::Spacing => registry.theme.spacing(token),
        Scale::Fixed(table) => table
            .iter()
            .find(|(key, _)| *key == token)
            .map(|(_, value)| (*value).to_string()),
    }
}

/// Negation happens at emission time, on the resolved literal.
fn negate(value: &str) -> String {
    if let Some(stripped) = value.strip_prefix('-') {
        return stripped.to_string();
    }
    if value == "0" || value == "0px" || value == "0em" || value == "0rem" {
        return value.to_string();
    }
    if value.starts_with("calc(") || value.starts_with("var(") {
        return format!("calc({value} * -1)");
    }
    format!("-{value}")
}

// --- Arbitrary-value namespace predicates ---

fn matches_kind(value: &str, kind: ValueKind) -> bool {
    match kind {
        ValueKind::Any => !value.is_empty(),
        ValueKind::Number => value.parse::<f64>().is_ok(),
        ValueKind::Length => is_length(value),
        ValueKind::Color => is_color(value),
    }
}

fn is_length(value: &str) -> bool {
    if value == "0" || value == "auto" {
        return true;
    }
    if value.starts_with("calc(") || value.starts_with("var(") {
        return true;
    }
    const UNITS: &[&str] = &[
        "px", "rem", "em", "%", "vh", "vw", "vmin", "vmax", "ch", "ex", "pt", "cm", "mm",
        "in",
    ];
    UNITS.iter().any(|unit| {
        value
            .strip_suffix(unit)
            .is_some_and(|n| n.parse::<f64>().is_ok())
    })
}

fn is_color(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8)
            && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if value.starts_with("rgb(")
        || value.starts_with("rgba(")
        || value.starts_with("hsl(")
        || value.starts_with("hsla(")
        || value.starts_with("var(")
    {
        return true;
    }
    value == "currentColor"
        || value == "transparent"
        || value == "inherit"
        || (!value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Apply an alpha modifier to a hex color, producing `rgb(r g b / a)`.
/// Only hex colors compose with a modifier; anything else rejects.
fn with_alpha(color: &str, modifier: &str) -> Option<String> {
    let hex = color.strip_prefix('#')?;
    let (r, g, b) = match hex.len() {
        3 => (
            u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?,
            u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?,
            u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?,
        ),
        6 => (
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        ),
        _ => return None,
    };
    let alpha: f64 = modifier.parse().ok()?;
    // Integer modifiers are percentages (`/50`), fractional ones are raw
    // alpha (`/[0.35]`).
    let alpha = if alpha > 1.0 { alpha / 100.0 } else { alpha };
    if !(0.0..=1.0).contains(&alpha) {
        return None;
    }
    Some(format!("rgb({r} {g} {b} / {})", format_alpha(alpha)))
}

fn format_alpha(alpha: f64) -> String {
    if (alpha - 1.0).abs() < f64::EPSILON {
        "1".to_string()
    } else {
        let s = format!("{alpha:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
