//! Text transformation: ordered replacements and the word-count cutoff
//!
//! Rules are compiled once at configuration load; transforming a message can
//! never fail after that.

use regex::Regex;

use crate::config::{ReplacementRule, RuleKind};
use crate::{ChatvoxError, Result};

/// A replacement rule whose pattern has been validated
#[derive(Clone, Debug)]
pub enum CompiledRule {
    Literal { pattern: String, replacement: String },
    Pattern { regex: Regex, replacement: String },
}

/// Compile replacement rules, preserving their configured order.
///
/// Malformed patterns surface here as `RuleError`, never at transform time.
pub fn compile_rules(rules: &[ReplacementRule]) -> Result<Vec<CompiledRule>> {
    let mut compiled = Vec::with_capacity(rules.len());

    for rule in rules {
        if rule.pattern.is_empty() {
            return Err(ChatvoxError::RuleError(
                "Replacement pattern is empty".to_string(),
            ));
        }

        match rule.kind {
            RuleKind::Literal => compiled.push(CompiledRule::Literal {
                pattern: rule.pattern.clone(),
                replacement: rule.replacement.clone(),
            }),
            RuleKind::Regex => {
                let regex = Regex::new(&rule.pattern).map_err(|e| {
                    ChatvoxError::RuleError(format!(
                        "Invalid pattern '{}': {}",
                        rule.pattern, e
                    ))
                })?;
                compiled.push(CompiledRule::Pattern {
                    regex,
                    replacement: rule.replacement.clone(),
                });
            }
        }
    }

    Ok(compiled)
}

/// Apply every rule in order, each replacing all non-overlapping occurrences
/// in the current text. Earlier rules may create text matched by later ones;
/// that ordering is intentional.
pub fn apply_rules(text: &str, rules: &[CompiledRule]) -> String {
    let mut current = text.to_string();

    for rule in rules {
        current = match rule {
            CompiledRule::Literal {
                pattern,
                replacement,
            } => current.replace(pattern.as_str(), replacement),
            CompiledRule::Pattern { regex, replacement } => regex
                .replace_all(&current, replacement.as_str())
                .into_owned(),
        };
    }

    current
}

/// Keep at most `limit` whitespace-delimited words, in original order,
/// rejoined with single spaces. A limit of zero or below yields nothing.
pub fn limit_words(text: &str, limit: i32) -> String {
    if limit <= 0 {
        return String::new();
    }

    text.split_whitespace()
        .take(limit as usize)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled(rules: &[ReplacementRule]) -> Vec<CompiledRule> {
        compile_rules(rules).unwrap()
    }

    #[test]
    fn test_rules_apply_in_declared_order() {
        let rules = compiled(&[
            ReplacementRule::literal("a", "b"),
            ReplacementRule::literal("b", "c"),
        ]);
        assert_eq!(apply_rules("a", &rules), "c");
    }

    #[test]
    fn test_rule_replaces_all_occurrences() {
        let rules = compiled(&[ReplacementRule::literal("lol", "laughing")]);
        assert_eq!(
            apply_rules("lol that was lol", &rules),
            "laughing that was laughing"
        );
    }

    #[test]
    fn test_literal_match_is_case_sensitive() {
        let rules = compiled(&[ReplacementRule::literal("GG", "good game")]);
        assert_eq!(apply_rules("gg GG", &rules), "gg good game");
    }

    #[test]
    fn test_regex_rule_with_captures() {
        let rules = compiled(&[ReplacementRule::regex(r"(?i)\bkek(w?)\b", "lul$1")]);
        assert_eq!(apply_rules("KEKW kek", &rules), "lulW lul");
    }

    #[test]
    fn test_malformed_regex_is_a_rule_error() {
        let err = compile_rules(&[ReplacementRule::regex("[unclosed", "x")]).unwrap_err();
        assert!(matches!(err, ChatvoxError::RuleError(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(compile_rules(&[ReplacementRule::literal("", "x")]).is_err());
        assert!(compile_rules(&[ReplacementRule::regex("", "x")]).is_err());
    }

    #[test]
    fn test_limit_truncates_without_reordering() {
        assert_eq!(limit_words("the quick brown fox", 2), "the quick");
    }

    #[test]
    fn test_limit_zero_or_negative_yields_empty() {
        assert_eq!(limit_words("the quick brown fox", 0), "");
        assert_eq!(limit_words("the quick brown fox", -3), "");
    }

    #[test]
    fn test_limit_larger_than_input_keeps_everything() {
        assert_eq!(limit_words("two words", 50), "two words");
    }

    #[test]
    fn test_limit_normalizes_whitespace() {
        assert_eq!(limit_words("spaced   out\ttext", 3), "spaced out text");
    }
}
