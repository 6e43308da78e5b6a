//! Output types: the structured shapes recovered from model replies.
//!
//! Both shapes are deliberately lenient at the type level. The model is the
//! effective author of the deck, so fields it forgot stay `None` / empty and
//! are reported as [`DeckWarning`]s instead of being patched with defaults.
//! Unknown fields are captured in `extra` and survive re-serialisation.

use crate::error::{DeckError, DeckWarning};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

// ── Analysis ─────────────────────────────────────────────────────────────

/// The model's reading of the product, returned by the analyze stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strengths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_market: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_challenges: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blue_ocean_hint: Option<String>,
    /// Keys the model added beyond the documented set.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    /// Every key the analysis prompt asks for, in prompt order.
    pub const REQUIRED_KEYS: [&'static str; 9] = [
        "product_name",
        "product_summary",
        "strengths",
        "target_market",
        "market_size",
        "competitors",
        "market_challenges",
        "price_range",
        "blue_ocean_hint",
    ];

    /// Documented keys the model did not supply.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let present = [
            self.product_name.is_some(),
            self.product_summary.is_some(),
            self.strengths.is_some(),
            self.target_market.is_some(),
            self.market_size.is_some(),
            self.competitors.is_some(),
            self.market_challenges.is_some(),
            self.price_range.is_some(),
            self.blue_ocean_hint.is_some(),
        ];
        Self::REQUIRED_KEYS
            .iter()
            .zip(present)
            .filter(|(_, p)| !p)
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_keys().is_empty()
    }

    /// Render as the context block threaded into the generate stage.
    pub fn to_context(&self) -> Result<String, DeckError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DeckError::Internal(format!("Failed to serialise analysis: {e}")))
    }
}

/// Result of the analyze entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub analysis: AnalysisResult,
    /// The ingested product text, echoed back for the generate call.
    pub product_info: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DeckWarning>,
}

// ── Slides ───────────────────────────────────────────────────────────────

/// The six slide roles, in their documented deck order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideType {
    Cover,
    Analysis,
    Proposal,
    Flow,
    Pricing,
    Summary,
}

impl SlideType {
    pub const ALL: [SlideType; 6] = [
        SlideType::Cover,
        SlideType::Analysis,
        SlideType::Proposal,
        SlideType::Flow,
        SlideType::Pricing,
        SlideType::Summary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SlideType::Cover => "cover",
            SlideType::Analysis => "analysis",
            SlideType::Proposal => "proposal",
            SlideType::Flow => "flow",
            SlideType::Pricing => "pricing",
            SlideType::Summary => "summary",
        }
    }
}

impl fmt::Display for SlideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlideType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        SlideType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(s)
    }
}

/// One slide as emitted by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    #[serde(default)]
    pub title: String,
    /// Markdown body; may embed fenced diagram/chart blocks.
    #[serde(default)]
    pub content: String,
    /// Raw type string; see [`SlideRecord::kind`] for the typed view.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub slide_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SlideRecord {
    /// The slide type if it is one of the documented six.
    pub fn kind(&self) -> Option<SlideType> {
        self.slide_type.as_deref().and_then(|s| s.parse().ok())
    }

    /// Fenced sub-blocks embedded in the content, in order of appearance.
    pub fn embedded_blocks(&self) -> Vec<EmbeddedBlock> {
        embedded_blocks(&self.content)
    }
}

/// Language of a fenced block inside slide content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// ` ```mermaid ` — diagram source.
    Mermaid,
    /// ` ```chart ` — chart specification (JSON).
    Chart,
    /// Any other tagged or untagged fence.
    Other(String),
}

impl BlockKind {
    fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "mermaid" => BlockKind::Mermaid,
            "chart" | "chartjs" | "chart.js" => BlockKind::Chart,
            other => BlockKind::Other(other.to_string()),
        }
    }

    /// Diagram and chart blocks count toward the one-per-slide rule.
    pub fn is_visual(&self) -> bool {
        matches!(self, BlockKind::Mermaid | BlockKind::Chart)
    }
}

/// A fenced specification block pulled out of slide content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedBlock {
    pub kind: BlockKind,
    pub body: String,
}

static RE_FENCE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]*```[ \t]*([A-Za-z0-9_.+-]*)[ \t]*$").unwrap());

/// Scan markdown for fenced blocks.
///
/// A bare ` ``` ` line closes the open block. A tagged fence line while a
/// block is open starts a new block and drops the unclosed one, as does the
/// end of input.
pub fn embedded_blocks(markdown: &str) -> Vec<EmbeddedBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<(BlockKind, Vec<&str>)> = None;

    for line in markdown.lines() {
        let Some(caps) = RE_FENCE_LINE.captures(line) else {
            if let Some((_, body)) = open.as_mut() {
                body.push(line);
            }
            continue;
        };
        let tag = &caps[1];
        match open.take() {
            Some((kind, body)) if tag.is_empty() => blocks.push(EmbeddedBlock {
                kind,
                body: body.join("\n"),
            }),
            _ => open = Some((BlockKind::from_tag(tag), Vec::new())),
        }
    }
    blocks
}

/// A generated deck: slides in emitted order plus any shape warnings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    pub slides: Vec<SlideRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<DeckWarning>,
}

impl Deck {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_round_trips_all_keys() {
        let json = r#"{
            "product_name": "StockPilot",
            "product_summary": "Inventory SaaS.",
            "strengths": ["cheap", "simple"],
            "target_market": "small retailers",
            "market_size": "$2B",
            "competitors": ["X", "Y"],
            "market_challenges": ["churn"],
            "price_range": "$50/mo",
            "blue_ocean_hint": "franchise owners"
        }"#;
        let a: AnalysisResult = serde_json::from_str(json).unwrap();
        assert!(a.is_complete());
        assert_eq!(a.strengths.as_deref(), Some(&["cheap".to_string(), "simple".to_string()][..]));

        let back: AnalysisResult = serde_json::from_str(&a.to_context().unwrap()).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn analysis_missing_keys_reported() {
        let a: AnalysisResult =
            serde_json::from_str(r#"{"product_name": "Widget", "price_range": "free"}"#).unwrap();
        let missing = a.missing_keys();
        assert_eq!(missing.len(), 7);
        assert!(missing.contains(&"blue_ocean_hint"));
        assert!(!missing.contains(&"product_name"));
    }

    #[test]
    fn analysis_extra_keys_preserved() {
        let a: AnalysisResult =
            serde_json::from_str(r#"{"product_name": "W", "confidence": 0.8}"#).unwrap();
        assert_eq!(a.extra.get("confidence"), Some(&serde_json::json!(0.8)));
        assert!(a.to_context().unwrap().contains("confidence"));
    }

    #[test]
    fn slide_type_parsing() {
        assert_eq!("cover".parse::<SlideType>(), Ok(SlideType::Cover));
        assert_eq!(" Summary ".parse::<SlideType>(), Ok(SlideType::Summary));
        assert!("intro".parse::<SlideType>().is_err());
        assert!(SlideType::Cover < SlideType::Analysis);
        assert!(SlideType::Pricing < SlideType::Summary);
    }

    #[test]
    fn slide_record_lenient_fields() {
        let s: SlideRecord = serde_json::from_str(r#"{"title": "Hi", "notes": "n"}"#).unwrap();
        assert_eq!(s.content, "");
        assert_eq!(s.kind(), None);
        assert_eq!(s.extra.get("notes"), Some(&serde_json::json!("n")));

        let s: SlideRecord =
            serde_json::from_str(r#"{"title": "T", "content": "c", "type": "flow"}"#).unwrap();
        assert_eq!(s.kind(), Some(SlideType::Flow));
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"type\":\"flow\""), "got: {json}");
    }

    #[test]
    fn embedded_blocks_found() {
        let content = "Intro text\n\n```mermaid\ngraph TD\n    A --> B\n```\n\nand\n```chart\n{\"type\": \"bar\"}\n```\n";
        let blocks = embedded_blocks(content);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Mermaid);
        assert_eq!(blocks[0].body, "graph TD\n    A --> B");
        assert_eq!(blocks[1].kind, BlockKind::Chart);
        assert_eq!(blocks[1].body, "{\"type\": \"bar\"}");
    }

    #[test]
    fn embedded_blocks_other_language() {
        let blocks = embedded_blocks("```python\nprint(1)\n```");
        assert_eq!(blocks, vec![EmbeddedBlock {
            kind: BlockKind::Other("python".into()),
            body: "print(1)".into(),
        }]);
        assert!(!blocks[0].kind.is_visual());
    }

    #[test]
    fn unclosed_block_does_not_swallow_next() {
        let content = "```mermaid\ngraph TD\n  A --> B\n\nThen:\n```chart\n{\"type\": \"pie\"}\n```\n";
        let blocks = embedded_blocks(content);
        assert_eq!(blocks, vec![EmbeddedBlock {
            kind: BlockKind::Chart,
            body: "{\"type\": \"pie\"}".into(),
        }]);
        assert!(embedded_blocks("```chart\n{\"type\": \"bar\"}").is_empty());
    }

    #[test]
    fn crlf_fences_and_untagged_blocks() {
        let blocks = embedded_blocks("```\r\nplain\r\n```\r\n```mermaid\r\ngraph LR\r\n```");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].kind, BlockKind::Other(String::new()));
        assert_eq!(blocks[0].body, "plain");
        assert_eq!(blocks[1].kind, BlockKind::Mermaid);
        assert_eq!(blocks[1].body, "graph LR");
    }

    #[test]
    fn no_blocks_in_plain_markdown() {
        assert!(embedded_blocks("- one\n- **two**\n\n| a | b |").is_empty());
    }
}
