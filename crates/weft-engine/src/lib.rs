//! weft engine
//!
//! Expands directive markers in a parsed stylesheet into generated rules, in
//! deterministic cascade order, preserving exact provenance for every
//! emitted fragment.
//!
//! ```text
//! Stylesheet + candidates + Config → compile() → Stylesheet → Printer
//! ```

pub mod expand;
pub mod order;
pub mod registry;
pub mod selector;
pub mod synthesize;
pub mod theme;
pub mod utility;
pub mod variant;

use weft_syntax::{MapOptions, Parser, Printer, SourceMap, Stylesheet, SyntaxError};

pub use expand::GenerateFailure;
pub use registry::{Registry, DEFINITIONS_DOC, PREFLIGHT};
pub use theme::{Config, CorePlugins, Theme};
pub use utility::Unresolved;

/// Fatal expansion error, reported once with the offending origin. No
/// partial output is produced for a pass that hits one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Expand error at {file}:{line}:{column}: {message}")]
pub struct ExpandError {
    pub message: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
}

/// Any failure of the full build pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
}

/// The printed result. The map is always computed; `config.map` only
/// decides how it is attached to the CSS text.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    pub css: String,
    pub map: SourceMap,
}

/// Expand a parsed stylesheet against the observed candidate set.
pub fn compile(
    input: Stylesheet,
    candidates: &[String],
    config: &Config,
) -> Result<Stylesheet, ExpandError> {
    let registry = Registry::new(config);
    expand::expand(input, &registry, candidates)
}

/// Parse, expand, and print in one step.
pub fn build(
    css: &str,
    file_name: &str,
    candidates: &[String],
    config: &Config,
) -> Result<BuildOutput, BuildError> {
    let sheet = Parser::parse(css, file_name)?;
    let expanded = compile(sheet, candidates, config)?;
    let result = Printer::print(
        &expanded,
        &MapOptions {
            mode: config.map,
            file: None,
        },
    );
    Ok(BuildOutput {
        css: result.css,
        map: result.map,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn candidates(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    fn run(css: &str, tokens: &[&str]) -> BuildOutput {
        build(css, "input.css", &candidates(tokens), &Config::default()).unwrap()
    }

    // =========================================================================
    // Determinism
    // =========================================================================

    #[test]
    fn test_identical_input_gives_byte_identical_output() {
        let tokens = &["underline", "hover:bg-red-500", "sm:dark:flex", "-mt-4"];
        let a = run("@tailwind base;\n\n@tailwind utilities;\n", tokens);
        let b = run("@tailwind base;\n\n@tailwind utilities;\n", tokens);
        assert_eq!(a.css, b.css);
        assert_eq!(a.map.annotations(), b.map.annotations());
    }

    #[test]
    fn test_reprocessing_expanded_output_is_stable() {
        let first = run("@tailwind utilities;\n", &["underline"]);
        // No markers remain, so a second pass is a plain reprint.
        let second = run(&first.css, &["underline"]);
        assert_eq!(first.css, second.css);
    }

    // =========================================================================
    // Sources-table properties
    // =========================================================================

    #[test]
    fn test_base_only_has_exactly_two_sources() {
        let output = run("@tailwind base;\n", &[]);
        assert_eq!(output.map.sources.len(), 2);
        assert!(output.map.sources.contains(&DEFINITIONS_DOC.to_string()));
        assert!(output.map.sources.contains(&"input.css".to_string()));
    }

    #[test]
    fn test_no_mapping_escapes_the_arena() {
        let output = run(
            "@tailwind base;\n\n@tailwind utilities;\n",
            &["underline", "hover:bg-red-500"],
        );
        for mapping in &output.map.mappings {
            assert!(mapping.source < output.map.sources.len());
        }
        assert!(!output.map.sources.iter().any(|s| s == "<no source>"));
    }

    #[test]
    fn test_utilities_map_back_to_the_marker() {
        let output = run("@tailwind utilities;\n", &["text-red-500"]);
        assert!(output.css.contains(".text-red-500 {"));
        assert!(output.css.contains("color: #ef4444;"));
        // Generated rule lines all map to the marker at input.css:1:0.
        let input_idx = output
            .map
            .sources
            .iter()
            .position(|s| s == "input.css")
            .unwrap();
        let marker_mappings = output
            .map
            .mappings
            .iter()
            .filter(|m| m.source == input_idx)
            .count();
        assert!(marker_mappings >= 3);
    }

    // =========================================================================
    // @apply
    // =========================================================================

    #[test]
    fn test_apply_expands_into_enclosing_rule() {
        let output = run(
            ".with-declaration {\n  background-color: red;\n  @apply h-4 w-4 bg-green-500;\n}\n",
            &[],
        );
        let expected = "\
.with-declaration {
  background-color: red;
  height: 1rem;
  width: 1rem;
  background-color: #22c55e;
}";
        assert!(output.css.contains(expected), "got:\n{}", output.css);
    }

    #[test]
    fn test_apply_unknown_utility_fails_the_build() {
        let err = build(
            ".x { @apply no-such-utility; }",
            "input.css",
            &[],
            &Config::default(),
        )
        .unwrap_err();
        let BuildError::Expand(err) = err else {
            panic!("expected expand error");
        };
        assert!(err.message.contains("no-such-utility"));
        assert_eq!(err.file, "input.css");
    }

    // =========================================================================
    // Map transport modes
    // =========================================================================

    #[test]
    fn test_map_modes_share_identical_annotations() {
        let css = "@tailwind utilities;\n";
        let tokens = candidates(&["text-red-500"]);

        let default_mode = build(css, "input.css", &tokens, &Config::default()).unwrap();
        let file_mode = build(
            css,
            "input.css",
            &tokens,
            &Config::from_json(r#"{"map": true}"#).unwrap(),
        )
        .unwrap();
        let inline_mode = build(
            css,
            "input.css",
            &tokens,
            &Config::from_json(r#"{"map": {"inline": true}}"#).unwrap(),
        )
        .unwrap();

        assert_eq!(
            default_mode.map.annotations(),
            file_mode.map.annotations()
        );
        assert_eq!(
            default_mode.map.annotations(),
            inline_mode.map.annotations()
        );
        assert!(inline_mode.css.contains("sourceMappingURL=data:"));
        assert!(file_mode.css.contains("sourceMappingURL=out.css.map"));
        assert!(!default_mode.css.contains("sourceMappingURL"));
    }

    // =========================================================================
    // Global importance
    // =========================================================================

    #[test]
    fn test_global_important_override() {
        let output = build(
            "@tailwind utilities;\n",
            "input.css",
            &candidates(&["underline"]),
            &Config::from_json(r#"{"important": true}"#).unwrap(),
        )
        .unwrap();
        assert!(output
            .css
            .contains("text-decoration-line: underline !important;"));
    }

    // =========================================================================
    // Layer ordering end to end
    // =========================================================================

    #[test]
    fn test_layers_print_in_rank_order() {
        let output = run(
            "@tailwind base;\n\n@tailwind components;\n\n@tailwind utilities;\n",
            &["container", "underline"],
        );
        let base_pos = output.css.find("box-sizing: border-box").unwrap();
        let components_pos = output.css.find(".container").unwrap();
        let utilities_pos = output.css.find(".underline").unwrap();
        assert!(base_pos < components_pos);
        assert!(components_pos < utilities_pos);
    }

    #[test]
    fn test_banner_is_first_statement() {
        let output = run("@tailwind utilities;\n", &["underline"]);
        assert!(output.css.starts_with("/*! weft v"));
    }
}
