//! Utility and variant lookup tables.
//!
//! Everything pluggable is discovered at configuration-load time and frozen
//! into a [`Registry`]: a closed, tagged set of utility definitions, a
//! variant table, the theme, and the embedded base-layer stylesheet. The
//! resolvers dispatch over these tags; there is no open registration after
//! construction.

use std::collections::BTreeMap;

use crate::theme::{Config, Theme};

/// The embedded base-layer definitions. Expanded in place of
/// `@tailwind base`, parsed under [`DEFINITIONS_DOC`] so its rules carry
/// their own document identity into the sources table.
pub const PREFLIGHT: &str = include_str!("preflight.css");

/// Identity of the compiler's own definitions document.
pub const DEFINITIONS_DOC: &str = "weft.css";

/// How a utility's value is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// The theme's spacing table.
    Spacing,
    /// A fixed token table owned by the definition.
    Fixed(&'static [(&'static str, &'static str)]),
}

/// Accepted namespace for arbitrary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Length,
    Color,
    Number,
    Any,
}

/// A value-taking utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueUtility {
    pub properties: &'static [&'static str],
    pub scale: Scale,
    /// Keyword values accepted alongside the scale (`auto`, `full`, ...).
    pub extra: &'static [(&'static str, &'static str)],
    pub kind: ValueKind,
    pub supports_negative: bool,
    /// Declarations for the bare base with no value (`rounded`, `border`).
    pub bare: Option<&'static [(&'static str, &'static str)]>,
}

/// A color utility: value resolved through the theme's color tables, with
/// an optional alpha modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorUtility {
    pub properties: &'static [&'static str],
    pub bare: Option<&'static [(&'static str, &'static str)]>,
}

/// The closed set of utility shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtilityDef {
    Static(&'static [(&'static str, &'static str)]),
    Color(ColorUtility),
    Value(ValueUtility),
}

/// The closed set of variant shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantDef {
    /// Pseudo-class suffix appended to the compound selector.
    Suffix(&'static str),
    /// Parent pattern with `&` standing for the compound selector.
    Parent(&'static str),
    /// Media-query wrapper.
    Media(&'static str),
}

/// A variant resolved against the registry; screens come back as owned
/// media params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVariant {
    Suffix(String),
    Parent(String),
    Media(String),
}

pub struct Registry {
    pub theme: Theme,
    pub important: bool,
    pub preflight: bool,
    pub container: bool,
    utilities: BTreeMap<&'static str, UtilityDef>,
    variants: BTreeMap<&'static str, VariantDef>,
}

impl Registry {
    pub fn new(config: &Config) -> Self {
        Self {
            theme: config.theme.clone(),
            important: config.important,
            preflight: config.core_plugins.preflight,
            container: config.core_plugins.container,
            utilities: builtin_utilities(),
            variants: builtin_variants(),
        }
    }

    pub fn utility(&self, base: &str) -> Option<&UtilityDef> {
        self.utilities.get(base)
    }

    pub fn variant(&self, name: &str) -> Option<ResolvedVariant> {
        if let Some(def) = self.variants.get(name) {
            return Some(match def {
                VariantDef::Suffix(s) => ResolvedVariant::Suffix((*s).to_string()),
                VariantDef::Parent(p) => ResolvedVariant::Parent((*p).to_string()),
                VariantDef::Media(q) => ResolvedVariant::Media((*q).to_string()),
            });
        }
        let width = self.theme.screen(name)?;
        Some(ResolvedVariant::Media(format!("(min-width: {width})")))
    }
}

const FONT_WEIGHTS: &[(&str, &str)] = &[
    ("thin", "100"),
    ("extralight", "200"),
    ("light", "300"),
    ("normal", "400"),
    ("medium", "500"),
    ("semibold", "600"),
    ("bold", "700"),
    ("extrabold", "800"),
    ("black", "900"),
];

const LEADINGS: &[(&str, &str)] = &[
    ("none", "1"),
    ("tight", "1.25"),
    ("snug", "1.375"),
    ("normal", "1.5"),
    ("relaxed", "1.625"),
    ("loose", "2"),
];

const TRACKINGS: &[(&str, &str)] = &[
    ("tighter", "-0.05em"),
    ("tight", "-0.025em"),
    ("normal", "0em"),
    ("wide", "0.025em"),
    ("wider", "0.05em"),
    ("widest", "0.1em"),
];

const RADII: &[(&str, &str)] = &[
    ("none", "0px"),
    ("sm", "0.125rem"),
    ("md", "0.375rem"),
    ("lg", "0.5rem"),
    ("xl", "0.75rem"),
    ("2xl", "1rem"),
    ("full", "9999px"),
];

const SHADOWS: &[(&str, &str)] = &[
    ("sm", "0 1px 2px 0 rgb(0 0 0 / 0.05)"),
    (
        "md",
        "0 4px 6px -1px rgb(0 0 0 / 0.1), 0 2px 4px -2px rgb(0 0 0 / 0.1)",
    ),
    (
        "lg",
        "0 10px 15px -3px rgb(0 0 0 / 0.1), 0 4px 6px -4px rgb(0 0 0 / 0.1)",
    ),
    ("none", "0 0 #0000"),
];

const OPACITIES: &[(&str, &str)] = &[
    ("0", "0"),
    ("25", "0.25"),
    ("50", "0.5"),
    ("75", "0.75"),
    ("100", "1"),
];

const Z_INDICES: &[(&str, &str)] = &[
    ("0", "0"),
    ("10", "10"),
    ("20", "20"),
    ("30", "30"),
    ("40", "40"),
    ("50", "50"),
    ("auto", "auto"),
];

const NO_EXTRA: &[(&str, &str)] = &[];
const AUTO: &[(&str, &str)] = &[("auto", "auto")];
const SIZE_W: &[(&str, &str)] = &[("auto", "auto"), ("full", "100%"), ("screen", "100vw")];
const SIZE_H: &[(&str, &str)] = &[("auto", "auto"), ("full", "100%"), ("screen", "100vh")];
const INSET_EXTRA: &[(&str, &str)] = &[("auto", "auto"), ("full", "100%")];

fn spacing(
    properties: &'static [&'static str],
    extra: &'static [(&'static str, &'static str)],
    supports_negative: bool,
) -> UtilityDef {
    UtilityDef::Value(ValueUtility {
        properties,
        scale: Scale::Spacing,
        extra,
        kind: ValueKind::Length,
        supports_negative,
        bare: None,
    })
}

fn fixed(
    properties: &'static [&'static str],
    table: &'static [(&'static str, &'static str)],
    kind: ValueKind,
    supports_negative: bool,
    bare: Option<&'static [(&'static str, &'static str)]>,
) -> UtilityDef {
    UtilityDef::Value(ValueUtility {
        properties,
        scale: Scale::Fixed(table),
        extra: NO_EXTRA,
        kind,
        supports_negative,
        bare,
    })
}

fn builtin_utilities() -> BTreeMap<&'static str, UtilityDef> {
    use UtilityDef::{Color, Static};

    let mut map: BTreeMap<&'static str, UtilityDef> = BTreeMap::new();

    // Display
    map.insert("block", Static(&[("display", "block")]));
    map.insert("inline-block", Static(&[("display", "inline-block")]));
    map.insert("inline", Static(&[("display", "inline")]));
    map.insert("flex", Static(&[("display", "flex")]));
    map.insert("inline-flex", Static(&[("display", "inline-flex")]));
    map.insert("grid", Static(&[("display", "grid")]));
    map.insert("hidden", Static(&[("display", "none")]));

    // Position
    map.insert("relative", Static(&[("position", "relative")]));
    map.insert("absolute", Static(&[("position", "absolute")]));
    map.insert("fixed", Static(&[("position", "fixed")]));
    map.insert("sticky", Static(&[("position", "sticky")]));
    map.insert("static", Static(&[("position", "static")]));

    // Flexbox
    map.insert("flex-row", Static(&[("flex-direction", "row")]));
    map.insert("flex-col", Static(&[("flex-direction", "column")]));
    map.insert("flex-wrap", Static(&[("flex-wrap", "wrap")]));
    map.insert("flex-nowrap", Static(&[("flex-wrap", "nowrap")]));
    map.insert("items-start", Static(&[("align-items", "flex-start")]));
    map.insert("items-center", Static(&[("align-items", "center")]));
    map.insert("items-end", Static(&[("align-items", "flex-end")]));
    map.insert("items-stretch", Static(&[("align-items", "stretch")]));
    map.insert("items-baseline", Static(&[("align-items", "baseline")]));
    map.insert("justify-start", Static(&[("justify-content", "flex-start")]));
    map.insert("justify-center", Static(&[("justify-content", "center")]));
    map.insert("justify-end", Static(&[("justify-content", "flex-end")]));
    map.insert(
        "justify-between",
        Static(&[("justify-content", "space-between")]),
    );
    map.insert(
        "justify-around",
        Static(&[("justify-content", "space-around")]),
    );

    // Typography
    map.insert("italic", Static(&[("font-style", "italic")]));
    map.insert("not-italic", Static(&[("font-style", "normal")]));
    map.insert("underline", Static(&[("text-decoration-line", "underline")]));
    map.insert("overline", Static(&[("text-decoration-line", "overline")]));
    map.insert(
        "line-through",
        Static(&[("text-decoration-line", "line-through")]),
    );
    map.insert("no-underline", Static(&[("text-decoration-line", "none")]));
    map.insert("uppercase", Static(&[("text-transform", "uppercase")]));
    map.insert("lowercase", Static(&[("text-transform", "lowercase")]));
    map.insert("capitalize", Static(&[("text-transform", "capitalize")]));
    map.insert("normal-case", Static(&[("text-transform", "none")]));
    map.insert(
        "truncate",
        Static(&[
            ("overflow", "hidden"),
            ("text-overflow", "ellipsis"),
            ("white-space", "nowrap"),
        ]),
    );
    map.insert(
        "antialiased",
        Static(&[
            ("-webkit-font-smoothing", "antialiased"),
            ("-moz-osx-font-smoothing", "grayscale"),
        ]),
    );
    map.insert("text-left", Static(&[("text-align", "left")]));
    map.insert("text-center", Static(&[("text-align", "center")]));
    map.insert("text-right", Static(&[("text-align", "right")]));
    map.insert("text-justify", Static(&[("text-align", "justify")]));
    map.insert(
        "text-xs",
        Static(&[("font-size", "0.75rem"), ("line-height", "1rem")]),
    );
    map.insert(
        "text-sm",
        Static(&[("font-size", "0.875rem"), ("line-height", "1.25rem")]),
    );
    map.insert(
        "text-base",
        Static(&[("font-size", "1rem"), ("line-height", "1.5rem")]),
    );
    map.insert(
        "text-lg",
        Static(&[("font-size", "1.125rem"), ("line-height", "1.75rem")]),
    );
    map.insert(
        "text-xl",
        Static(&[("font-size", "1.25rem"), ("line-height", "1.75rem")]),
    );
    map.insert(
        "text-2xl",
        Static(&[("font-size", "1.5rem"), ("line-height", "2rem")]),
    );
    map.insert(
        "text-3xl",
        Static(&[("font-size", "1.875rem"), ("line-height", "2.25rem")]),
    );
    map.insert(
        "text-4xl",
        Static(&[("font-size", "2.25rem"), ("line-height", "2.5rem")]),
    );
    map.insert(
        "font-sans",
        Static(&[("font-family", "ui-sans-serif, system-ui, sans-serif")]),
    );
    map.insert(
        "font-serif",
        Static(&[("font-family", "ui-serif, Georgia, serif")]),
    );
    map.insert(
        "font-mono",
        Static(&[("font-family", "ui-monospace, SFMono-Regular, monospace")]),
    );
    map.insert(
        "font",
        fixed(&["font-weight"], FONT_WEIGHTS, ValueKind::Number, false, None),
    );
    map.insert(
        "leading",
        fixed(&["line-height"], LEADINGS, ValueKind::Length, false, None),
    );
    map.insert(
        "tracking",
        fixed(&["letter-spacing"], TRACKINGS, ValueKind::Length, true, None),
    );

    // Colors
    map.insert(
        "bg",
        Color(ColorUtility {
            properties: &["background-color"],
            bare: None,
        }),
    );
    map.insert(
        "text",
        Color(ColorUtility {
            properties: &["color"],
            bare: None,
        }),
    );
    map.insert(
        "border",
        Color(ColorUtility {
            properties: &["border-color"],
            bare: Some(&[("border-width", "1px")]),
        }),
    );

    // Spacing
    map.insert("p", spacing(&["padding"], NO_EXTRA, false));
    map.insert("px", spacing(&["padding-left", "padding-right"], NO_EXTRA, false));
    map.insert("py", spacing(&["padding-top", "padding-bottom"], NO_EXTRA, false));
    map.insert("pt", spacing(&["padding-top"], NO_EXTRA, false));
    map.insert("pr", spacing(&["padding-right"], NO_EXTRA, false));
    map.insert("pb", spacing(&["padding-bottom"], NO_EXTRA, false));
    map.insert("pl", spacing(&["padding-left"], NO_EXTRA, false));
    map.insert("m", spacing(&["margin"], AUTO, true));
    map.insert("mx", spacing(&["margin-left", "margin-right"], AUTO, true));
    map.insert("my", spacing(&["margin-top", "margin-bottom"], AUTO, true));
    map.insert("mt", spacing(&["margin-top"], AUTO, true));
    map.insert("mr", spacing(&["margin-right"], AUTO, true));
    map.insert("mb", spacing(&["margin-bottom"], AUTO, true));
    map.insert("ml", spacing(&["margin-left"], AUTO, true));
    map.insert("gap", spacing(&["gap"], NO_EXTRA, false));
    map.insert("gap-x", spacing(&["column-gap"], NO_EXTRA, false));
    map.insert("gap-y", spacing(&["row-gap"], NO_EXTRA, false));

    // Sizing
    map.insert("w", spacing(&["width"], SIZE_W, false));
    map.insert("h", spacing(&["height"], SIZE_H, false));
    map.insert("min-w", spacing(&["min-width"], SIZE_W, false));
    map.insert("max-w", spacing(&["max-width"], SIZE_W, false));
    map.insert("min-h", spacing(&["min-height"], SIZE_H, false));
    map.insert("max-h", spacing(&["max-height"], SIZE_H, false));

    // Placement
    map.insert("inset", spacing(&["inset"], INSET_EXTRA, true));
    map.insert("inset-x", spacing(&["left", "right"], INSET_EXTRA, true));
    map.insert("inset-y", spacing(&["top", "bottom"], INSET_EXTRA, true));
    map.insert("top", spacing(&["top"], INSET_EXTRA, true));
    map.insert("right", spacing(&["right"], INSET_EXTRA, true));
    map.insert("bottom", spacing(&["bottom"], INSET_EXTRA, true));
    map.insert("left", spacing(&["left"], INSET_EXTRA, true));

    // Misc scales
    map.insert(
        "rounded",
        fixed(
            &["border-radius"],
            RADII,
            ValueKind::Length,
            false,
            Some(&[("border-radius", "0.25rem")]),
        ),
    );
    map.insert(
        "shadow",
        fixed(
            &["box-shadow"],
            SHADOWS,
            ValueKind::Any,
            false,
            Some(&[(
                "box-shadow",
                "0 1px 3px 0 rgb(0 0 0 / 0.1), 0 1px 2px -1px rgb(0 0 0 / 0.1)",
            )]),
        ),
    );
    map.insert(
        "opacity",
        fixed(&["opacity"], OPACITIES, ValueKind::Number, false, None),
    );
    map.insert(
        "z",
        fixed(&["z-index"], Z_INDICES, ValueKind::Number, true, None),
    );

    map
}

fn builtin_variants() -> BTreeMap<&'static str, VariantDef> {
    use VariantDef::{Media, Parent, Suffix};

    let mut map: BTreeMap<&'static str, VariantDef> = BTreeMap::new();

    // Pseudo-class state
    map.insert("hover", Suffix(":hover"));
    map.insert("focus", Suffix(":focus"));
    map.insert("focus-within", Suffix(":focus-within"));
    map.insert("focus-visible", Suffix(":focus-visible"));
    map.insert("active", Suffix(":active"));
    map.insert("visited", Suffix(":visited"));
    map.insert("disabled", Suffix(":disabled"));
    map.insert("checked", Suffix(":checked"));
    map.insert("first", Suffix(":first-child"));
    map.insert("last", Suffix(":last-child"));
    map.insert("odd", Suffix(":nth-child(odd)"));
    map.insert("even", Suffix(":nth-child(even)"));

    // Parent state
    map.insert("group-hover", Parent(".group:hover &"));
    map.insert("group-focus", Parent(".group:focus &"));
    map.insert("peer-hover", Parent(".peer:hover ~ &"));
    map.insert("peer-focus", Parent(".peer:focus ~ &"));
    map.insert("peer-checked", Parent(".peer:checked ~ &"));

    // Media state
    map.insert("dark", Media("(prefers-color-scheme: dark)"));
    map.insert("motion-safe", Media("(prefers-reduced-motion: no-preference)"));
    map.insert("motion-reduce", Media("(prefers-reduced-motion: reduce)"));
    map.insert("print", Media("print"));

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        Registry::new(&Config::default())
    }

    #[test]
    fn test_static_utility_lookup() {
        let reg = registry();
        let Some(UtilityDef::Static(decls)) = reg.utility("flex") else {
            panic!("flex should be a static utility");
        };
        assert_eq!(*decls, [("display", "flex")]);
        assert!(reg.utility("bogus").is_none());
    }

    #[test]
    fn test_candidate_roots_cover_the_table() {
        // Every registered utility must be parseable as a candidate base.
        let reg = registry();
        for base in reg.utilities.keys() {
            assert!(
                weft_candidate::is_utility_root(base),
                "'{base}' is registered but not a candidate root"
            );
        }
    }

    #[test]
    fn test_variant_lookup() {
        let reg = registry();
        assert_eq!(
            reg.variant("hover"),
            Some(ResolvedVariant::Suffix(":hover".into()))
        );
        assert_eq!(
            reg.variant("dark"),
            Some(ResolvedVariant::Media("(prefers-color-scheme: dark)".into()))
        );
        assert_eq!(reg.variant("nope"), None);
    }

    #[test]
    fn test_screen_variants_come_from_theme() {
        let reg = registry();
        assert_eq!(
            reg.variant("sm"),
            Some(ResolvedVariant::Media("(min-width: 640px)".into()))
        );
        assert_eq!(
            reg.variant("2xl"),
            Some(ResolvedVariant::Media("(min-width: 1536px)".into()))
        );
    }

    #[test]
    fn test_preflight_parses_under_its_own_identity() {
        let sheet = weft_syntax::Parser::parse(PREFLIGHT, DEFINITIONS_DOC).unwrap();
        assert!(!sheet.nodes.is_empty());
        assert_eq!(sheet.sources.len(), 1);
        assert_eq!(sheet.sources.names().next(), Some(DEFINITIONS_DOC));
    }
}
