//! Structured response extraction: narrow raw model text to its JSON payload.
//!
//! ## Why brackets, not fences?
//!
//! Models are told to answer with bare JSON but routinely wrap it in a
//! ` ```json ... ``` ` fence, or add a sentence before and after. Slide
//! content, however, legitimately carries its own fenced blocks (` ```mermaid `
//! diagrams, ` ```chart ` specifications) *inside* JSON string values.
//! Splitting on triple backticks cuts the payload at the first inner fence.
//!
//! So the fence pass strips **at most one** outer pair, and the payload
//! boundary is the outermost bracket span: first opening bracket of the
//! expected kind, last closing bracket of that kind. Bracket-like characters
//! strictly inside the span are never inspected.
//!
//! This stage never parses. When no bracket pair is found the input comes
//! back byte-identical so the JSON decoder reports one uniform error.

/// The top-level JSON container expected from a model reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    /// `{ ... }` — the product analysis.
    Object,
    /// `[ ... ]` — the slide deck.
    Array,
}

impl JsonKind {
    pub fn open(self) -> char {
        match self {
            JsonKind::Object => '{',
            JsonKind::Array => '[',
        }
    }

    pub fn close(self) -> char {
        match self {
            JsonKind::Object => '}',
            JsonKind::Array => ']',
        }
    }
}

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Return the best-effort JSON span of the given kind inside `raw`.
///
/// Steps:
/// 1. trim surrounding whitespace
/// 2. strip a single leading ` ```json ` (or bare ` ``` `) opener and, if
///    present, a single trailing ` ``` ` closer
/// 3. take the first opening and the last closing bracket of `kind`
/// 4. return that inclusive span when `close > open`
/// 5. otherwise return `raw` unchanged
///
/// The result always borrows from `raw`, and applying the function to its
/// own output is a no-op.
pub fn extract_json(raw: &str, kind: JsonKind) -> &str {
    let text = strip_outer_fence(raw.trim());

    let start = text.find(kind.open());
    let end = text.rfind(kind.close());
    match (start, end) {
        (Some(start), Some(end)) if end > start => &text[start..end + kind.close().len_utf8()],
        _ => raw,
    }
}

/// Strip exactly one outer fence pair, leaving any inner fences intact.
fn strip_outer_fence(text: &str) -> &str {
    let opener = if text.starts_with(JSON_FENCE) {
        JSON_FENCE
    } else if text.starts_with(FENCE) {
        FENCE
    } else {
        return text;
    };

    let inner = text[opener.len()..].trim();
    match inner.strip_suffix(FENCE) {
        Some(body) => body.trim(),
        None => inner,
    }
}
