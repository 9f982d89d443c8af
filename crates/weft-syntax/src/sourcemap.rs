//! Source maps.
//!
//! A [`SourceMap`] is the list of generated-position → original-position
//! mappings produced by the printer, plus the table of distinct document
//! names that contributed them. The mapping list is the canonical content;
//! [`MapMode`] only selects the transport (nothing, an external-file
//! reference, or an inline base64 payload) and never changes the mappings.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::{Deserialize, Deserializer};

use crate::origin::Position;

/// One generated → original mapping. `source` indexes [`SourceMap::sources`].
/// End columns are present for declarations, absent for block open/close
/// lines and point-origin nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated: Position,
    pub generated_end: Option<usize>,
    pub source: usize,
    pub original: Position,
    pub original_end: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    pub file: Option<String>,
    pub sources: Vec<String>,
    pub mappings: Vec<Mapping>,
}

impl SourceMap {
    /// Render mappings as `"genLine:genCol[-end] -> origLine:origCol[-end]"`
    /// strings. This is the comparison form used by the test suite; it is
    /// transport-independent.
    pub fn annotations(&self) -> Vec<String> {
        self.mappings
            .iter()
            .map(|m| {
                let mut s = format!("{}:{}", m.generated.line, m.generated.column);
                if let Some(end) = m.generated_end {
                    s.push_str(&format!("-{end}"));
                }
                s.push_str(&format!(" -> {}:{}", m.original.line, m.original.column));
                if let Some(end) = m.original_end {
                    s.push_str(&format!("-{end}"));
                }
                s
            })
            .collect()
    }

    /// Resolve a position in this map's generated output back to its
    /// original document. Used to chain through a `prev` map when input was
    /// itself compiler output. Picks the closest mapping at or before the
    /// queried position.
    pub fn original_position_for(
        &self,
        line: usize,
        column: usize,
    ) -> Option<(&str, Position)> {
        let mut best: Option<&Mapping> = None;
        for m in &self.mappings {
            if m.generated.line > line
                || (m.generated.line == line && m.generated.column > column)
            {
                break;
            }
            best = Some(m);
        }
        let m = best?;
        Some((self.sources.get(m.source)?.as_str(), m.original))
    }

    /// Standard v3 JSON form with base64-VLQ mappings.
    pub fn to_json(&self) -> String {
        let mut encoded = String::new();
        let mut current_line = 1usize;
        let mut prev_gen_col = 0i64;
        let mut prev_source = 0i64;
        let mut prev_orig_line = 0i64;
        let mut prev_orig_col = 0i64;
        let mut first_on_line = true;

        for m in &self.mappings {
            while current_line < m.generated.line {
                encoded.push(';');
                current_line += 1;
                prev_gen_col = 0;
                first_on_line = true;
            }
            if !first_on_line {
                encoded.push(',');
            }
            first_on_line = false;

            let gen_col = m.generated.column as i64;
            let source = m.source as i64;
            let orig_line = (m.original.line - 1) as i64;
            let orig_col = m.original.column as i64;

            vlq_encode(gen_col - prev_gen_col, &mut encoded);
            vlq_encode(source - prev_source, &mut encoded);
            vlq_encode(orig_line - prev_orig_line, &mut encoded);
            vlq_encode(orig_col - prev_orig_col, &mut encoded);

            prev_gen_col = gen_col;
            prev_source = source;
            prev_orig_line = orig_line;
            prev_orig_col = orig_col;
        }

        let json = serde_json::json!({
            "version": 3,
            "file": self.file,
            "sources": self.sources,
            "names": [],
            "mappings": encoded,
        });
        json.to_string()
    }

    /// Parse a standard v3 map back into mapping form. End columns are not
    /// part of the wire format, so they come back as `None`. Used to load a
    /// `prev` map when the input document is itself compiler output.
    pub fn from_json(json: &str) -> Result<SourceMap, serde_json::Error> {
        #[derive(serde::Deserialize)]
        struct Raw {
            #[serde(default)]
            file: Option<String>,
            #[serde(default)]
            sources: Vec<String>,
            #[serde(default)]
            mappings: String,
        }

        let raw: Raw = serde_json::from_str(json)?;
        let mut mappings = Vec::new();
        let mut source = 0i64;
        let mut orig_line = 0i64;
        let mut orig_col = 0i64;

        for (line_idx, line) in raw.mappings.split(';').enumerate() {
            let mut gen_col = 0i64;
            for segment in line.split(',').filter(|s| !s.is_empty()) {
                let fields = vlq_decode(segment);
                // A bare generated column carries no original position.
                if fields.len() < 4 {
                    continue;
                }
                gen_col += fields[0];
                source += fields[1];
                orig_line += fields[2];
                orig_col += fields[3];
                mappings.push(Mapping {
                    generated: Position::new(line_idx + 1, gen_col as usize),
                    generated_end: None,
                    source: source as usize,
                    original: Position::new((orig_line + 1) as usize, orig_col as usize),
                    original_end: None,
                });
            }
        }

        Ok(SourceMap {
            file: raw.file,
            sources: raw.sources,
            mappings,
        })
    }

    /// The trailing comment for inline transport.
    pub fn inline_comment(&self) -> String {
        format!(
            "/*# sourceMappingURL=data:application/json;base64,{} */",
            STANDARD.encode(self.to_json())
        )
    }

    /// The trailing comment for external-file transport.
    pub fn file_comment(map_file: &str) -> String {
        format!("/*# sourceMappingURL={map_file} */")
    }
}

/// How a computed source map travels with the output. The mapping content is
/// identical in every mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MapMode {
    #[default]
    Off,
    File,
    Inline,
}

impl<'de> Deserialize<'de> for MapMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Options {
                #[serde(default)]
                inline: bool,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Flag(false) => MapMode::Off,
            Repr::Flag(true) => MapMode::File,
            Repr::Options { inline: true } => MapMode::Inline,
            Repr::Options { inline: false } => MapMode::File,
        })
    }
}

const VLQ_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn vlq_encode(value: i64, out: &mut String) {
    let mut v: u64 = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (v & 0b1_1111) as usize;
        v >>= 5;
        if v != 0 {
            digit |= 0b10_0000;
        }
        out.push(VLQ_CHARS[digit] as char);
        if v == 0 {
            break;
        }
    }
}

fn vlq_decode(segment: &str) -> Vec<i64> {
    let mut fields = Vec::new();
    let mut value = 0u64;
    let mut shift = 0u32;
    for ch in segment.bytes() {
        let Some(digit) = VLQ_CHARS.iter().position(|c| *c == ch) else {
            break;
        };
        value |= ((digit as u64) & 0b1_1111) << shift;
        if digit & 0b10_0000 != 0 {
            shift += 5;
            continue;
        }
        let magnitude = (value >> 1) as i64;
        fields.push(if value & 1 == 1 { -magnitude } else { magnitude });
        value = 0;
        shift = 0;
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mapping(
        gen: (usize, usize),
        gen_end: Option<usize>,
        source: usize,
        orig: (usize, usize),
        orig_end: Option<usize>,
    ) -> Mapping {
        Mapping {
            generated: Position::new(gen.0, gen.1),
            generated_end: gen_end,
            source,
            original: Position::new(orig.0, orig.1),
            original_end: orig_end,
        }
    }

    #[test]
    fn test_vlq_known_values() {
        let mut s = String::new();
        vlq_encode(0, &mut s);
        assert_eq!(s, "A");
        s.clear();
        vlq_encode(1, &mut s);
        assert_eq!(s, "C");
        s.clear();
        vlq_encode(-1, &mut s);
        assert_eq!(s, "D");
        s.clear();
        vlq_encode(16, &mut s);
        assert_eq!(s, "gB");
    }

    #[test]
    fn test_annotation_formats() {
        let map = SourceMap {
            file: None,
            sources: vec!["input.css".into()],
            mappings: vec![
                mapping((2, 0), None, 0, (2, 0), None),
                mapping((3, 2), Some(20), 0, (3, 2), Some(20)),
            ],
        };
        assert_eq!(
            map.annotations(),
            vec!["2:0 -> 2:0".to_string(), "3:2-20 -> 3:2-20".to_string()]
        );
    }

    #[test]
    fn test_original_position_lookup() {
        let map = SourceMap {
            file: None,
            sources: vec!["a.css".into(), "b.css".into()],
            mappings: vec![
                mapping((1, 0), None, 0, (10, 0), None),
                mapping((2, 2), None, 1, (20, 4), None),
            ],
        };
        assert_eq!(
            map.original_position_for(2, 6),
            Some(("b.css", Position::new(20, 4)))
        );
        assert_eq!(
            map.original_position_for(1, 0),
            Some(("a.css", Position::new(10, 0)))
        );
        assert_eq!(map.original_position_for(0, 0), None);
    }

    #[test]
    fn test_map_mode_deserialization() {
        assert_eq!(
            serde_json::from_str::<MapMode>("false").unwrap(),
            MapMode::Off
        );
        assert_eq!(
            serde_json::from_str::<MapMode>("true").unwrap(),
            MapMode::File
        );
        assert_eq!(
            serde_json::from_str::<MapMode>("{\"inline\": true}").unwrap(),
            MapMode::Inline
        );
        assert_eq!(
            serde_json::from_str::<MapMode>("{\"inline\": false}").unwrap(),
            MapMode::File
        );
    }

    #[test]
    fn test_json_shape() {
        let map = SourceMap {
            file: Some("out.css".into()),
            sources: vec!["input.css".into()],
            mappings: vec![mapping((1, 0), None, 0, (1, 0), None)],
        };
        let json = map.to_json();
        assert!(json.contains("\"version\":3"));
        assert!(json.contains("input.css"));
        assert!(json.contains("\"mappings\":\"AAAA\""));
    }

    #[test]
    fn test_vlq_decode_inverts_encode() {
        for value in [0i64, 1, -1, 16, -16, 123, -456, 1024] {
            let mut s = String::new();
            vlq_encode(value, &mut s);
            assert_eq!(vlq_decode(&s), vec![value], "{value}");
        }
        assert_eq!(vlq_decode("AAAA"), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_json_round_trip() {
        let map = SourceMap {
            file: Some("out.css".into()),
            sources: vec!["a.css".into(), "b.css".into()],
            mappings: vec![
                mapping((1, 0), None, 0, (2, 0), None),
                mapping((2, 2), None, 1, (40, 4), None),
                mapping((2, 10), None, 1, (40, 12), None),
                mapping((4, 0), None, 0, (3, 0), None),
            ],
        };
        let parsed = SourceMap::from_json(&map.to_json()).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(SourceMap::from_json("not json").is_err());
    }

    #[test]
    fn test_inline_comment_is_base64_payload() {
        let map = SourceMap {
            file: None,
            sources: vec!["input.css".into()],
            mappings: Vec::new(),
        };
        let comment = map.inline_comment();
        assert!(comment.starts_with("/*# sourceMappingURL=data:application/json;base64,"));
        assert!(comment.ends_with(" */"));
    }
}
