//! WASM bindings for the weft compiler.
//!
//! Exposes `compile()` to JavaScript via wasm-bindgen.
//! Returns a JS object `{ css, map }` or throws on error.

use wasm_bindgen::prelude::*;
use weft_engine::Config;

/// Compile an input stylesheet against a candidate list.
///
/// `candidates` is a JS array of strings; `config` is the JSON config object
/// (or undefined for defaults). Returns `{ css: string, map: string }` with
/// the map in its standard JSON form. Throws a JS error if parsing,
/// expansion, or config deserialization fails.
#[wasm_bindgen]
pub fn compile(css: &str, candidates: JsValue, config: JsValue) -> Result<JsValue, JsError> {
    let candidates: Vec<String> = if candidates.is_undefined() || candidates.is_null() {
        Vec::new()
    } else {
        serde_wasm_bindgen::from_value(candidates)
            .map_err(|e| JsError::new(&format!("Invalid candidates array: {e}")))?
    };

    let config: Config = if config.is_undefined() || config.is_null() {
        Config::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsError::new(&format!("Invalid config: {e}")))?
    };

    let output = weft_engine::build(css, "input.css", &candidates, &config)
        .map_err(|e| JsError::new(&e.to_string()))?;

    // Serialize to a plain JS object { css, map }
    let js_obj = js_sys::Object::new();
    js_sys::Reflect::set(&js_obj, &"css".into(), &output.css.into())
        .map_err(|_| JsError::new("Failed to set css property"))?;
    js_sys::Reflect::set(&js_obj, &"map".into(), &output.map.to_json().into())
        .map_err(|_| JsError::new("Failed to set map property"))?;

    Ok(js_obj.into())
}

/// Get the compiler version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Native tests (non-WASM): verify the compile pipeline works
    // =========================================================================

    fn native_compile(css: &str, candidates: &[&str]) -> weft_engine::BuildOutput {
        let candidates: Vec<String> = candidates.iter().map(|s| s.to_string()).collect();
        weft_engine::build(css, "input.css", &candidates, &Config::default()).unwrap()
    }

    #[test]
    fn test_empty_document() {
        let output = native_compile("", &[]);
        assert_eq!(output.css, "");
        assert!(output.map.mappings.is_empty());
    }

    #[test]
    fn test_utilities_pipeline() {
        let output = native_compile("@tailwind utilities;\n", &["underline", "bg-red-500"]);
        assert!(output.css.contains(".underline {"));
        assert!(output.css.contains("background-color: #ef4444;"));
        assert!(!output.css.contains("@tailwind"));
    }

    #[test]
    fn test_apply_pipeline() {
        let output = native_compile(".btn {\n  @apply underline h-4;\n}\n", &[]);
        assert!(output.css.contains("text-decoration-line: underline;"));
        assert!(output.css.contains("height: 1rem;"));
        assert!(!output.css.contains("@apply"));
    }

    #[test]
    fn test_apply_error_propagates() {
        let candidates: Vec<String> = Vec::new();
        let err = weft_engine::build(
            ".btn { @apply nonsense-utility; }",
            "input.css",
            &candidates,
            &Config::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("nonsense-utility"));
    }

    #[test]
    fn test_multiple_compiles_share_no_state() {
        let out1 = native_compile("@tailwind utilities;\n", &["underline"]);
        let out2 = native_compile("@tailwind utilities;\n", &["flex"]);
        assert!(out1.css.contains(".underline"));
        assert!(!out1.css.contains(".flex"));
        assert!(out2.css.contains(".flex"));
        assert!(!out2.css.contains(".underline"));
    }

    #[test]
    fn test_version() {
        let v = version();
        assert!(!v.is_empty());
        assert!(v.contains('.'));
    }
}
