//! Parser for AI rewrite responses.
//!
//! The expected response shape is a `SUMMARY:` line followed by one fenced
//! code block tagged with the language:
//!
//! ````text
//! SUMMARY: replaced the loop with a comprehension
//! ```python
//! squares = [x * x for x in xs]
//! ```
//! ````
//!
//! Parsing is total: every input yields code and a summary. Responses that
//! do not follow the contract degrade through a lenient fallback rule before
//! being reported as unrecognized, in which case the original code is kept.

const SUMMARY_MARKER: &str = "SUMMARY:";
const FENCE: &str = "```";
/// Tag used by the prompt's own output-format heading, never a code block.
const OUTPUT_TAG: &str = "output";
const COMMENT_PREFIXES: &[&str] = &["#", "//", "/*"];

pub const UNPARSEABLE_SUMMARY: &str = "No changes made (could not parse AI response)";

/// Result of parsing one AI response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// A tagged, closed fence with a non-empty body.
    Parsed { code: String, summary: String },
    /// Code recovered from the first fence by the lenient rule.
    Fallback { code: String, summary: String },
    /// Nothing usable; carries the original code.
    Unrecognized { code: String, summary: String },
}

impl ParsedResponse {
    pub fn code(&self) -> &str {
        match self {
            Self::Parsed { code, .. } | Self::Fallback { code, .. } | Self::Unrecognized { code, .. } => code,
        }
    }

    pub fn summary(&self) -> &str {
        match self {
            Self::Parsed { summary, .. } | Self::Fallback { summary, .. } | Self::Unrecognized { summary, .. } => {
                summary
            }
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self, Self::Unrecognized { .. })
    }

    pub fn into_parts(self) -> (String, String) {
        match self {
            Self::Parsed { code, summary } | Self::Fallback { code, summary } | Self::Unrecognized { code, summary } => {
                (code, summary)
            }
        }
    }
}

/// Parse `response`, keeping `original` when no code can be extracted.
pub fn parse_response(response: &str, original: &str) -> ParsedResponse {
    let summary = extract_summary(response);
    let segments: Vec<&str> = response.split(FENCE).collect();

    if let Some(code) = tagged_block(&segments) {
        return ParsedResponse::Parsed { code, summary };
    }

    if let Some(code) = first_fence_body(&segments) {
        return ParsedResponse::Fallback { code, summary };
    }

    ParsedResponse::Unrecognized {
        code: original.to_string(),
        summary: UNPARSEABLE_SUMMARY.to_string(),
    }
}

fn extract_summary(response: &str) -> String {
    response
        .split_once(SUMMARY_MARKER)
        .map(|(_, rest)| rest.split(FENCE).next().unwrap_or_default().trim().to_string())
        .unwrap_or_default()
}

/// Strip surrounding blank lines but keep the first line's indentation.
fn trim_body(body: &str) -> &str {
    body.trim_start_matches(['\r', '\n']).trim_end()
}

/// First closed fence whose opening line carries a non-output tag and whose body is non-empty.
///
/// Odd segments are fence interiors; a segment is closed when another follows it.
fn tagged_block(segments: &[&str]) -> Option<String> {
    segments
        .iter()
        .enumerate()
        .skip(1)
        .step_by(2)
        .filter(|(i, _)| i + 1 < segments.len())
        .find_map(|(_, interior)| {
            let (tag, body) = interior.split_once('\n').unwrap_or((interior, ""));
            let tag = tag.trim();
            let body = trim_body(body);
            let usable = !tag.is_empty() && !tag.to_lowercase().starts_with(OUTPUT_TAG) && !body.trim().is_empty();
            usable.then(|| body.to_string())
        })
}

/// Content between the first fence and the next one (or the end of input).
///
/// A leading line that is not a comment is taken to be a misplaced language tag and dropped.
fn first_fence_body(segments: &[&str]) -> Option<String> {
    let interior = segments.get(1)?;
    let (first_line, rest) = interior.split_once('\n').unwrap_or((interior, ""));
    let first = first_line.trim();

    let body = if !first.is_empty() && !COMMENT_PREFIXES.iter().any(|p| first.starts_with(p)) {
        rest
    } else {
        interior
    };

    let body = trim_body(body);
    (!body.trim().is_empty()).then(|| body.to_string())
}
