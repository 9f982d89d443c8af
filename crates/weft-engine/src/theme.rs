//! Design-token configuration.
//!
//! The deserializable surface the engine consumes: theme scales, core-plugin
//! toggles, the global-importance override, and the map-output mode. Unknown
//! keys (like `content`, which belongs to the external scanner) are accepted
//! and ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use weft_syntax::MapMode;

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default, rename = "corePlugins")]
    pub core_plugins: CorePlugins,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub map: MapMode,
}

impl Config {
    /// Load a config from its JSON form.
    pub fn from_json(json: &str) -> Result<Config, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Named token tables. Colors are keyed family → shade, with a `DEFAULT`
/// shade for single-value colors like `black`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Theme {
    #[serde(default = "default_screens")]
    pub screens: BTreeMap<String, String>,
    #[serde(default = "default_colors")]
    pub colors: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default = "default_spacing")]
    pub spacing: BTreeMap<String, String>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            screens: default_screens(),
            colors: default_colors(),
            spacing: default_spacing(),
        }
    }
}

impl Theme {
    /// Resolve a color token: `red-500` through the family scale, `black`
    /// through the family's `DEFAULT` shade.
    pub fn color(&self, token: &str) -> Option<String> {
        if let Some(scale) = self.colors.get(token) {
            return scale.get("DEFAULT").cloned();
        }
        let (family, shade) = token.rsplit_once('-')?;
        self.colors.get(family)?.get(shade).cloned()
    }

    pub fn spacing(&self, token: &str) -> Option<String> {
        self.spacing.get(token).cloned()
    }

    pub fn screen(&self, name: &str) -> Option<String> {
        self.screens.get(name).cloned()
    }

    /// Screens in ascending width order, for deterministic responsive
    /// output. Falls back to name order for non-pixel values.
    pub fn screens_by_width(&self) -> Vec<(String, String)> {
        let mut screens: Vec<(String, String)> = self
            .screens
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        screens.sort_by(|a, b| {
            let wa = parse_px(&a.1);
            let wb = parse_px(&b.1);
            wa.partial_cmp(&wb)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        screens
    }
}

/// Per-group enable toggles for built-in rule sets.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorePlugins {
    #[serde(default = "default_true")]
    pub preflight: bool,
    #[serde(default = "default_true")]
    pub container: bool,
}

impl Default for CorePlugins {
    fn default() -> Self {
        Self {
            preflight: true,
            container: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn parse_px(value: &str) -> f64 {
    value
        .strip_suffix("px")
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(f64::MAX)
}

fn default_screens() -> BTreeMap<String, String> {
    [
        ("sm", "640px"),
        ("md", "768px"),
        ("lg", "1024px"),
        ("xl", "1280px"),
        ("2xl", "1536px"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_colors() -> BTreeMap<String, BTreeMap<String, String>> {
    fn scale(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    [
        ("black", scale(&[("DEFAULT", "#000000")])),
        ("white", scale(&[("DEFAULT", "#ffffff")])),
        ("transparent", scale(&[("DEFAULT", "transparent")])),
        (
            "gray",
            scale(&[
                ("100", "#f3f4f6"),
                ("300", "#d1d5db"),
                ("500", "#6b7280"),
                ("700", "#374151"),
                ("900", "#111827"),
            ]),
        ),
        (
            "red",
            scale(&[
                ("100", "#fee2e2"),
                ("300", "#fca5a5"),
                ("500", "#ef4444"),
                ("700", "#b91c1c"),
                ("900", "#7f1d1d"),
            ]),
        ),
        (
            "green",
            scale(&[
                ("100", "#dcfce7"),
                ("300", "#86efac"),
                ("500", "#22c55e"),
                ("700", "#15803d"),
                ("900", "#14532d"),
            ]),
        ),
        (
            "blue",
            scale(&[
                ("100", "#dbeafe"),
                ("300", "#93c5fd"),
                ("500", "#3b82f6"),
                ("700", "#1d4ed8"),
                ("900", "#1e3a8a"),
            ]),
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_spacing() -> BTreeMap<String, String> {
    [
        ("0", "0px"),
        ("px", "1px"),
        ("0.5", "0.125rem"),
        ("1", "0.25rem"),
        ("1.5", "0.375rem"),
        ("2", "0.5rem"),
        ("2.5", "0.625rem"),
        ("3", "0.75rem"),
        ("4", "1rem"),
        ("5", "1.25rem"),
        ("6", "1.5rem"),
        ("8", "2rem"),
        ("10", "2.5rem"),
        ("12", "3rem"),
        ("16", "4rem"),
        ("20", "5rem"),
        ("24", "6rem"),
        ("32", "8rem"),
        ("40", "10rem"),
        ("48", "12rem"),
        ("64", "16rem"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_from_empty_json() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.core_plugins.preflight);
        assert!(!config.important);
        assert_eq!(config.map, MapMode::Off);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = Config::from_json(r#"{"content": ["src/**/*.html"]}"#).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_core_plugin_toggle() {
        let config = Config::from_json(r#"{"corePlugins": {"preflight": false}}"#).unwrap();
        assert!(!config.core_plugins.preflight);
        assert!(config.core_plugins.container);
    }

    #[test]
    fn test_map_mode_variants() {
        let config = Config::from_json(r#"{"map": true}"#).unwrap();
        assert_eq!(config.map, MapMode::File);
        let config = Config::from_json(r#"{"map": {"inline": true}}"#).unwrap();
        assert_eq!(config.map, MapMode::Inline);
    }

    #[test]
    fn test_color_lookup_through_scale() {
        let theme = Theme::default();
        assert_eq!(theme.color("red-500").as_deref(), Some("#ef4444"));
        assert_eq!(theme.color("black").as_deref(), Some("#000000"));
        assert_eq!(theme.color("red-450"), None);
        assert_eq!(theme.color("mauve-500"), None);
    }

    #[test]
    fn test_custom_theme_overrides_defaults() {
        let config = Config::from_json(
            r##"{"theme": {"colors": {"brand": {"500": "#123456"}}}}"##,
        )
        .unwrap();
        assert_eq!(config.theme.color("brand-500").as_deref(), Some("#123456"));
        // Replacing the table drops the defaults, as the original does.
        assert_eq!(config.theme.color("red-500"), None);
    }

    #[test]
    fn test_screens_sorted_by_width() {
        let theme = Theme::default();
        let names: Vec<String> = theme
            .screens_by_width()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["sm", "md", "lg", "xl", "2xl"]);
    }
}
