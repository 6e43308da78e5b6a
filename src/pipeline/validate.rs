//! Validation & shaping: parse the extracted window and check its shape.
//!
//! Parsing is strict about the container (an object for the analysis, an
//! array of objects for the deck) and raises [`DeckError::DecodeError`]
//! otherwise. Everything past that is lenient: missing keys, fields of the
//! wrong JSON type, unknown slide types, and ordering anomalies become
//! [`DeckWarning`]s. Mistyped fields are coerced to their documented shape
//! and `null` reads as absent. Nothing else about the records is touched.

use crate::error::{DeckError, DeckWarning};
use crate::output::{AnalysisResult, BlockKind, SlideRecord, SlideType};
use crate::pipeline::extract::{extract_json, JsonKind};
use serde_json::{Map, Value};
use tracing::debug;

/// Documented JSON shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldShape {
    Text,
    List,
}

impl FieldShape {
    fn describe(self) -> &'static str {
        match self {
            FieldShape::Text => "a string",
            FieldShape::List => "a list of strings",
        }
    }
}

const ANALYSIS_FIELDS: [(&str, FieldShape); 9] = [
    ("product_name", FieldShape::Text),
    ("product_summary", FieldShape::Text),
    ("strengths", FieldShape::List),
    ("target_market", FieldShape::Text),
    ("market_size", FieldShape::Text),
    ("competitors", FieldShape::List),
    ("market_challenges", FieldShape::List),
    ("price_range", FieldShape::Text),
    ("blue_ocean_hint", FieldShape::Text),
];

const SLIDE_FIELDS: [(&str, FieldShape); 3] = [
    ("title", FieldShape::Text),
    ("content", FieldShape::Text),
    ("type", FieldShape::Text),
];

/// Extract and parse an analysis object from raw model text.
pub fn parse_analysis(raw: &str) -> Result<(AnalysisResult, Vec<DeckWarning>), DeckError> {
    let window = extract_json(raw, JsonKind::Object);
    let mut map = match serde_json::from_str::<Value>(window)? {
        Value::Object(map) => map,
        other => {
            return Err(DeckError::DecodeError {
                detail: format!("expected a JSON object, got {}", type_name(&other)),
            })
        }
    };

    let mut warnings = Vec::new();
    coerce_fields(&mut map, &ANALYSIS_FIELDS, None, &mut warnings);

    let analysis: AnalysisResult = serde_json::from_value(Value::Object(map))?;
    warnings.extend(
        analysis
            .missing_keys()
            .into_iter()
            .map(|key| DeckWarning::MissingAnalysisKey {
                key: key.to_string(),
            }),
    );
    Ok((analysis, warnings))
}

/// Extract and parse a slide array from raw model text.
///
/// Slides come back in emitted order, along with any field-type warnings.
pub fn parse_slides(raw: &str) -> Result<(Vec<SlideRecord>, Vec<DeckWarning>), DeckError> {
    let window = extract_json(raw, JsonKind::Array);
    let items = match serde_json::from_str::<Value>(window)? {
        Value::Array(items) => items,
        other => {
            return Err(DeckError::DecodeError {
                detail: format!("expected a JSON array, got {}", type_name(&other)),
            })
        }
    };

    let mut warnings = Vec::new();
    let mut slides = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let n = i + 1;
        let mut map = match item {
            Value::Object(map) => map,
            other => {
                return Err(DeckError::DecodeError {
                    detail: format!("slide {} is {}, not an object", n, type_name(&other)),
                })
            }
        };
        coerce_fields(&mut map, &SLIDE_FIELDS, Some(n), &mut warnings);
        let slide = serde_json::from_value(Value::Object(map)).map_err(|e| {
            DeckError::DecodeError {
                detail: format!("slide {}: {}", n, e),
            }
        })?;
        slides.push(slide);
    }
    Ok((slides, warnings))
}

/// Bring each listed field to its documented shape, warning on every change.
///
/// `null` is dropped without a warning; the field then reads as missing and
/// is reported by the presence checks.
fn coerce_fields(
    map: &mut Map<String, Value>,
    fields: &[(&str, FieldShape)],
    slide: Option<usize>,
    warnings: &mut Vec<DeckWarning>,
) {
    for &(field, shape) in fields {
        let Some(value) = map.remove(field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let found = type_name(&value);
        let (coerced, changed) = match (shape, value) {
            (FieldShape::Text, Value::String(s)) => (Value::String(s), false),
            (FieldShape::Text, other) => (Value::String(to_text(&other)), true),
            (FieldShape::List, Value::Array(items)) => {
                let all_strings = items.iter().all(Value::is_string);
                let items = items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(|v| Value::String(to_text(v)))
                    .collect();
                (Value::Array(items), !all_strings)
            }
            (FieldShape::List, other) => (Value::Array(vec![Value::String(to_text(&other))]), true),
        };
        if changed {
            warnings.push(DeckWarning::UnexpectedFieldType {
                slide,
                field: field.to_string(),
                expected: shape.describe().to_string(),
                found: found.to_string(),
            });
        }
        map.insert(field.to_string(), coerced);
    }
}

/// Strings pass through; everything else becomes its compact JSON text.
fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Check a parsed deck against the structure the output rules ask for.
///
/// Rules checked, in order:
/// 1. at least `min_slides` slides
/// 2. every slide has a title and content
/// 3. every slide has one of the six documented types
/// 4. first slide is `cover`, last slide is `summary`
/// 5. middle slides never step backwards in the documented type order
/// 6. at most one diagram/chart block per slide, and chart blocks are JSON
pub fn validate_deck(slides: &[SlideRecord], min_slides: usize) -> Vec<DeckWarning> {
    let mut warnings = Vec::new();

    if slides.len() < min_slides {
        warnings.push(DeckWarning::TooFewSlides {
            count: slides.len(),
            min: min_slides,
        });
    }

    for (i, slide) in slides.iter().enumerate() {
        let n = i + 1;
        if slide.title.trim().is_empty() {
            warnings.push(DeckWarning::EmptyTitle { slide: n });
        }
        if slide.content.trim().is_empty() {
            warnings.push(DeckWarning::EmptyContent { slide: n });
        }
        match (&slide.slide_type, slide.kind()) {
            (None, _) => warnings.push(DeckWarning::MissingSlideType { slide: n }),
            (Some(value), None) => warnings.push(DeckWarning::UnknownSlideType {
                slide: n,
                value: value.clone(),
            }),
            _ => {}
        }
        check_embedded_blocks(n, slide, &mut warnings);
    }

    if let Some(first) = slides.first() {
        if first.kind() != Some(SlideType::Cover) {
            warnings.push(DeckWarning::CoverNotFirst {
                found: first.slide_type.clone(),
            });
        }
    }
    if let Some(last) = slides.last() {
        if last.kind() != Some(SlideType::Summary) {
            warnings.push(DeckWarning::SummaryNotLast {
                found: last.slide_type.clone(),
            });
        }
    }

    check_order(slides, &mut warnings);

    if !warnings.is_empty() {
        debug!("Deck validation produced {} warnings", warnings.len());
    }
    warnings
}

/// Flag slides whose type ranks before the highest type seen so far.
///
/// Cover and summary placement is reported separately, so those two types
/// are left out of the ordering check.
fn check_order(slides: &[SlideRecord], warnings: &mut Vec<DeckWarning>) {
    let mut highest: Option<SlideType> = None;
    for (i, slide) in slides.iter().enumerate() {
        let Some(kind) = slide.kind() else { continue };
        if matches!(kind, SlideType::Cover | SlideType::Summary) {
            continue;
        }
        match highest {
            Some(prev) if kind < prev => warnings.push(DeckWarning::OutOfOrder {
                slide: i + 1,
                value: kind.to_string(),
                after: prev.to_string(),
            }),
            _ => highest = Some(kind),
        }
    }
}

fn check_embedded_blocks(n: usize, slide: &SlideRecord, warnings: &mut Vec<DeckWarning>) {
    let visual: Vec<_> = slide
        .embedded_blocks()
        .into_iter()
        .filter(|b| b.kind.is_visual())
        .collect();

    if visual.len() > 1 {
        warnings.push(DeckWarning::TooManyEmbeddedBlocks {
            slide: n,
            count: visual.len(),
        });
    }

    for block in visual.iter().filter(|b| b.kind == BlockKind::Chart) {
        if let Err(e) = serde_json::from_str::<Value>(&block.body) {
            warnings.push(DeckWarning::InvalidChartSpec {
                slide: n,
                detail: e.to_string(),
            });
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn slide(title: &str, content: &str, kind: &str) -> SlideRecord {
        SlideRecord {
            title: title.into(),
            content: content.into(),
            slide_type: Some(kind.into()),
            ..Default::default()
        }
    }

    fn well_formed() -> Vec<SlideRecord> {
        ["cover", "analysis", "analysis", "proposal", "flow", "pricing", "summary"]
            .iter()
            .enumerate()
            .map(|(i, k)| slide(&format!("Slide {}", i + 1), "- point", k))
            .collect()
    }

    #[test]
    fn analysis_all_keys_no_warnings() {
        let raw = r#"```json
{"product_name":"W","product_summary":"s","strengths":["a"],"target_market":"t","market_size":"m","competitors":["c"],"market_challenges":["x"],"price_range":"p","blue_ocean_hint":"b"}
```"#;
        let (a, warnings) = parse_analysis(raw).unwrap();
        assert_eq!(a.product_name.as_deref(), Some("W"));
        assert!(warnings.is_empty(), "got: {warnings:?}");
    }

    #[test]
    fn analysis_missing_keys_become_warnings() {
        let (a, warnings) = parse_analysis(r#"{"product_name": "Widget"}"#).unwrap();
        assert_eq!(a.product_name.as_deref(), Some("Widget"));
        assert_eq!(warnings.len(), 8);
        assert!(warnings.contains(&DeckWarning::MissingAnalysisKey {
            key: "price_range".into()
        }));
    }

    #[test]
    fn analysis_without_object_is_decode_error() {
        let err = parse_analysis("I could not analyse this product.").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn analysis_malformed_json_is_decode_error() {
        let err = parse_analysis(r#"{"product_name": "Widget",}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn analysis_mistyped_fields_are_coerced_with_warnings() {
        let raw = r#"{"product_name":"W","product_summary":"s","strengths":"fast and cheap","target_market":"t","market_size":2000000000,"competitors":["c", 7, null],"market_challenges":["x"],"price_range":null,"blue_ocean_hint":true}"#;
        let (a, warnings) = parse_analysis(raw).unwrap();

        assert_eq!(a.strengths, Some(vec!["fast and cheap".to_string()]));
        assert_eq!(a.market_size.as_deref(), Some("2000000000"));
        assert_eq!(a.competitors, Some(vec!["c".to_string(), "7".to_string()]));
        assert_eq!(a.blue_ocean_hint.as_deref(), Some("true"));
        assert_eq!(a.price_range, None);

        assert!(warnings.contains(&DeckWarning::UnexpectedFieldType {
            slide: None,
            field: "market_size".into(),
            expected: "a string".into(),
            found: "a number".into(),
        }));
        assert!(warnings.contains(&DeckWarning::UnexpectedFieldType {
            slide: None,
            field: "strengths".into(),
            expected: "a list of strings".into(),
            found: "a string".into(),
        }));
        assert!(warnings.contains(&DeckWarning::MissingAnalysisKey {
            key: "price_range".into()
        }));
        assert_eq!(warnings.len(), 5, "got: {warnings:?}");
    }

    #[test]
    fn analysis_object_field_is_stringified() {
        let (a, warnings) = parse_analysis(r#"{"market_size": {"tam": "2B"}}"#).unwrap();
        assert_eq!(a.market_size.as_deref(), Some(r#"{"tam":"2B"}"#));
        assert!(warnings
            .iter()
            .any(|w| matches!(w, DeckWarning::UnexpectedFieldType { field, .. } if field == "market_size")));
    }

    #[test]
    fn slides_with_mistyped_fields_parse() {
        let raw = r#"[{"title":null,"content":"x","type":"cover"},{"title":2024,"content":["a","b"],"type":"summary"}]"#;
        let (slides, warnings) = parse_slides(raw).unwrap();

        assert_eq!(slides[0].title, "");
        assert_eq!(slides[1].title, "2024");
        assert_eq!(slides[1].content, r#"["a","b"]"#);
        assert_eq!(
            warnings,
            vec![
                DeckWarning::UnexpectedFieldType {
                    slide: Some(2),
                    field: "title".into(),
                    expected: "a string".into(),
                    found: "a number".into(),
                },
                DeckWarning::UnexpectedFieldType {
                    slide: Some(2),
                    field: "content".into(),
                    expected: "a string".into(),
                    found: "an array".into(),
                },
            ]
        );
        assert!(validate_deck(&slides, 2).contains(&DeckWarning::EmptyTitle { slide: 1 }));
    }

    #[test]
    fn slides_parse_in_emitted_order() {
        let raw = r#"[{"title":"B","content":"x","type":"summary"},{"title":"A","content":"y","type":"cover"}]"#;
        let (slides, warnings) = parse_slides(raw).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(slides[0].title, "B");
        assert_eq!(slides[1].title, "A");
    }

    #[test]
    fn slides_non_object_element_is_decode_error() {
        let err = parse_slides(r#"[{"title":"A"}, "oops"]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
        assert!(err.to_string().contains("slide 2"));
    }

    #[test]
    fn slides_without_array_is_decode_error() {
        let err = parse_slides("Sorry, something went wrong.").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }

    #[test]
    fn empty_array_parses() {
        assert!(parse_slides("[]").unwrap().0.is_empty());
    }

    #[test]
    fn well_formed_deck_has_no_warnings() {
        assert!(validate_deck(&well_formed(), 6).is_empty());
    }

    #[test]
    fn too_few_slides() {
        let deck = vec![slide("C", "c", "cover"), slide("S", "s", "summary")];
        let w = validate_deck(&deck, 6);
        assert_eq!(w, vec![DeckWarning::TooFewSlides { count: 2, min: 6 }]);
    }

    #[test]
    fn cover_and_summary_placement() {
        let mut deck = well_formed();
        deck.swap(0, 6);
        let w = validate_deck(&deck, 6);
        assert!(w.contains(&DeckWarning::CoverNotFirst {
            found: Some("summary".into())
        }));
        assert!(w.contains(&DeckWarning::SummaryNotLast {
            found: Some("cover".into())
        }));
    }

    #[test]
    fn out_of_order_middle_slide() {
        let mut deck = well_formed();
        // flow before proposal
        deck.swap(3, 4);
        let w = validate_deck(&deck, 6);
        assert_eq!(
            w,
            vec![DeckWarning::OutOfOrder {
                slide: 5,
                value: "proposal".into(),
                after: "flow".into(),
            }]
        );
    }

    #[test]
    fn unknown_and_missing_types() {
        let mut deck = well_formed();
        deck[2].slide_type = Some("appendix".into());
        deck[3].slide_type = None;
        let w = validate_deck(&deck, 6);
        assert!(w.contains(&DeckWarning::UnknownSlideType {
            slide: 3,
            value: "appendix".into()
        }));
        assert!(w.contains(&DeckWarning::MissingSlideType { slide: 4 }));
    }

    #[test]
    fn empty_title_and_content() {
        let mut deck = well_formed();
        deck[1].title = " ".into();
        deck[1].content.clear();
        let w = validate_deck(&deck, 6);
        assert!(w.contains(&DeckWarning::EmptyTitle { slide: 2 }));
        assert!(w.contains(&DeckWarning::EmptyContent { slide: 2 }));
    }

    #[test]
    fn embedded_block_rules() {
        let mut deck = well_formed();
        deck[1].content =
            "```mermaid\ngraph TD\n  A --> B\n```\n\n```chart\n{\"type\": \"bar\"}\n```".into();
        deck[2].content = "Share:\n```chart\n{\"type\": \"pie\",}\n```".into();
        let w = validate_deck(&deck, 6);
        assert!(w.contains(&DeckWarning::TooManyEmbeddedBlocks { slide: 2, count: 2 }));
        assert!(w
            .iter()
            .any(|x| matches!(x, DeckWarning::InvalidChartSpec { slide: 3, .. })));
        assert_eq!(w.len(), 2, "got: {w:?}");
    }

    #[test]
    fn unclosed_block_is_not_counted() {
        let mut deck = well_formed();
        deck[1].content =
            "```mermaid\ngraph TD\n  A --> B\n\n```chart\n{\"type\": \"bar\"}\n```".into();
        assert!(validate_deck(&deck, 6).is_empty());
    }
}
