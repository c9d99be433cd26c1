//! Named rule bundles.

use super::RuleConfig;
use serde_json::json;

pub const PRESET_NAMES: &[&str] = &["google", "jquery"];

/// Returns the rule configuration for a preset, or `None` if the name is unknown.
pub fn load(name: &str) -> Option<RuleConfig> {
    let preset = match name {
        "jquery" => json!({
            "requireCurlyBraces": ["if", "else", "for", "while", "do", "try", "catch"],
            "requireSpaceAfterKeywords": [
                "if", "else", "for", "while", "do", "switch", "return", "try", "catch"
            ],
            "requireSpacesInsideParentheses": {
                "all": true,
                "except": ["{", "}", "[", "]", "function"]
            },
            "requireCamelCaseOrUpperCaseIdentifiers": true,
            "maximumLineLength": { "value": 100, "allowComments": true },
            "validateQuoteMarks": "\"",
            "disallowMixedSpacesAndTabs": true,
            "disallowTrailingWhitespace": true,
            "disallowMultipleLineBreaks": true,
            "disallowMultipleVarDecl": true,
            "disallowKeywords": ["with"],
            "validateLineBreaks": "LF",
            "requireLineFeedAtFileEnd": true
        }),
        "google" => json!({
            "requireCurlyBraces": ["if", "else", "for", "while", "do", "try", "catch"],
            "requireSpaceAfterKeywords": [
                "if", "else", "for", "while", "do", "switch", "return", "try", "catch"
            ],
            "disallowSpacesInsideParentheses": true,
            "requireCamelCaseOrUpperCaseIdentifiers": "ignoreProperties",
            "maximumLineLength": { "value": 80, "allowUrlComments": true },
            "validateQuoteMarks": "'",
            "disallowMixedSpacesAndTabs": true,
            "disallowTrailingWhitespace": true,
            "disallowMultipleLineBreaks": true,
            "disallowMultipleVarDecl": true,
            "disallowKeywords": ["with"],
            "validateLineBreaks": "LF",
            "requireLineFeedAtFileEnd": true
        }),
        _ => return None,
    };
    preset.as_object().cloned()
}
