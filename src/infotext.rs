//! Parsing of generation infotext for the generation data panel
//!
//! An infotext is the multi-line parameter summary produced alongside each
//! generated image:
//!
//! ```text
//! a lighthouse at dusk, oil painting
//! Negative prompt: blurry, bad
//! Steps: 30, Sampler: Euler a, CFG scale: 7, Seed: 889387345, Size: 512x512
//! ```
//!
//! The prompt line is shown as-is, while the negative prompt and the
//! parameter line are split so keys can be rendered in bold.

use std::sync::OnceLock;

use regex::Regex;

const NEGATIVE_PROMPT_PREFIX: &str = "Negative prompt:";
const PARAMETERS_PREFIX: &str = "Steps:";

/// One line of a parsed infotext
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoLine {
    /// `Negative prompt: ...`, holding the text after the colon
    NegativePrompt(String),
    /// The `Steps: ...` line as ordered key/value pairs
    Parameters(Vec<(String, String)>),
    /// Any other line, typically the prompt
    Plain(String),
}

fn parameter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Matches either key: "value with, commas" or key: value
    PATTERN.get_or_init(|| Regex::new(r#"([^:]+): ("[^"]*"|[^,]*),?"#).expect("valid pattern"))
}

/// Split an infotext into typed lines
pub fn parse_infotext(text: &str) -> Vec<InfoLine> {
    text.split('\n').map(parse_line).collect()
}

fn parse_line(line: &str) -> InfoLine {
    if let Some(rest) = line.strip_prefix(NEGATIVE_PROMPT_PREFIX) {
        return InfoLine::NegativePrompt(rest.to_string());
    }
    if line.starts_with(PARAMETERS_PREFIX) {
        return InfoLine::Parameters(parse_parameters(line));
    }
    InfoLine::Plain(line.to_string())
}

/// Split a `key: value, key: value` line
///
/// Repeated keys keep the position of their first occurrence and the value
/// of their last one.
pub fn parse_parameters(line: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for caps in parameter_pattern().captures_iter(line) {
        let key = caps[1].trim().to_string();
        let value = caps[2].trim_matches(|c| c == ' ' || c == '"').to_string();
        match pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => pairs.push((key, value)),
        }
    }
    pairs
}
