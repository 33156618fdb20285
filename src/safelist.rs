//! Safelist matching.
//!
//! Literal rules match a class name exactly. Pattern rules are tested the way
//! the Tailwind CLI tests them: an unanchored regex search against the bare
//! class name. `red` keeps both `bg-red-500` and `text-red-100`, and `.*`
//! keeps everything.

use crate::config::{PatternRule, SafelistRule};
use crate::errors::{DescriptorError, Result};
use indexmap::IndexSet;
use regex::Regex;
use regex_syntax::hir::{Class, Hir, HirKind, Look};
use std::collections::HashSet;

/// A compiled pattern rule
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub rule: PatternRule,
    regex: Regex,
}

impl CompiledPattern {
    pub fn compile(rule: &PatternRule) -> Result<Self> {
        let full = rule.regex_source()?;

        let regex = Regex::new(&full).map_err(|e| DescriptorError::Regex {
            pattern: rule.pattern.clone(),
            message: e.to_string(),
        })?;

        Ok(Self {
            rule: rule.clone(),
            regex,
        })
    }

    pub fn is_match(&self, class: &str) -> bool {
        self.regex.is_match(class)
    }
}

/// Whether an unanchored search for `rule` succeeds on every class name.
///
/// Class names never contain a newline, so `.` counts as any character.
pub fn matches_every_class(rule: &PatternRule) -> bool {
    let Ok(source) = rule.regex_source() else {
        return false;
    };
    match regex_syntax::Parser::new().parse(&source) {
        Ok(hir) => search_always_matches(&hir),
        Err(_) => false,
    }
}

fn search_always_matches(hir: &Hir) -> bool {
    if matches_empty_anywhere(hir) {
        return true;
    }

    match hir.kind() {
        // a lone `^` or `$` matches the empty string at one end
        HirKind::Look(look) => is_start(*look) || is_end(*look),
        HirKind::Capture(capture) => search_always_matches(&capture.sub),
        HirKind::Concat(parts) => {
            let mut middle: &[Hir] = parts;

            let anchored_start = middle.first().is_some_and(|h| is_look(h, is_start));
            if anchored_start {
                middle = &middle[1..];
            }
            let anchored_end = middle.last().is_some_and(|h| is_look(h, is_end));
            if anchored_end {
                middle = &middle[..middle.len() - 1];
            }

            let middle = Hir::concat(middle.to_vec());
            match (anchored_start, anchored_end) {
                (true, true) => matches_whole_string(&middle),
                (true, false) | (false, true) => matches_empty_anywhere(&middle),
                (false, false) => false,
            }
        }
        _ => false,
    }
}

/// Can match the empty string with no assertion that could fail
fn matches_empty_anywhere(hir: &Hir) -> bool {
    let props = hir.properties();
    props.minimum_len() == Some(0) && props.look_set().is_empty()
}

/// `X*` where `X` accepts any character but a newline
fn matches_whole_string(hir: &Hir) -> bool {
    match hir.kind() {
        HirKind::Capture(capture) => matches_whole_string(&capture.sub),
        HirKind::Repetition(rep) => rep.min == 0 && rep.max.is_none() && matches_any_char(&rep.sub),
        _ => false,
    }
}

fn matches_any_char(hir: &Hir) -> bool {
    match hir.kind() {
        HirKind::Capture(capture) => matches_any_char(&capture.sub),
        HirKind::Class(Class::Unicode(class)) => {
            let mut missing = class.clone();
            missing.negate();
            missing
                .ranges()
                .iter()
                .all(|r| r.start() == '\n' && r.end() == '\n')
        }
        HirKind::Class(Class::Bytes(class)) => {
            let mut missing = class.clone();
            missing.negate();
            missing
                .ranges()
                .iter()
                .all(|r| r.start() == b'\n' && r.end() == b'\n')
        }
        _ => false,
    }
}

fn is_look(hir: &Hir, accept: fn(Look) -> bool) -> bool {
    matches!(hir.kind(), HirKind::Look(look) if accept(*look))
}

fn is_start(look: Look) -> bool {
    matches!(look, Look::Start | Look::StartLF | Look::StartCRLF)
}

fn is_end(look: Look) -> bool {
    matches!(look, Look::End | Look::EndLF | Look::EndCRLF)
}

/// Union of all safelist rules of a descriptor
#[derive(Debug, Clone, Default)]
pub struct Safelist {
    literals: HashSet<String>,
    patterns: Vec<CompiledPattern>,
    match_everything: bool,
}

impl Safelist {
    /// Compile every rule; the first invalid pattern aborts compilation.
    pub fn compile(rules: &[SafelistRule]) -> Result<Self> {
        let mut safelist = Self::default();

        for rule in rules {
            match rule {
                SafelistRule::Literal(class) => {
                    safelist.literals.insert(class.clone());
                }
                SafelistRule::Pattern(pattern) => {
                    safelist.match_everything |= pattern.is_match_everything();
                    safelist.patterns.push(CompiledPattern::compile(pattern)?);
                }
            }
        }

        Ok(safelist)
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty() && self.patterns.is_empty()
    }

    /// Scan-based elimination is disabled when this is true
    pub fn matches_everything(&self) -> bool {
        self.match_everything
    }

    /// Whether a class is kept by any rule
    pub fn retains(&self, class: &str) -> bool {
        self.literals.contains(class) || self.patterns.iter().any(|p| p.is_match(class))
    }

    /// The safelisted part of a class universe.
    ///
    /// Literal entries are kept only when the universe contains them; the
    /// build tool cannot generate CSS for names it doesn't know. Pattern
    /// rules with variants also yield `variant:class` for each match.
    pub fn expand<'a, I>(&self, universe: I) -> IndexSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut kept = IndexSet::new();

        for class in universe {
            if self.literals.contains(class) {
                kept.insert(class.to_string());
            }

            for pattern in &self.patterns {
                if !pattern.is_match(class) {
                    continue;
                }
                kept.insert(class.to_string());
                for variant in &pattern.rule.variants {
                    kept.insert(format!("{}:{}", variant, class));
                }
            }
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(source: &str) -> SafelistRule {
        SafelistRule::Pattern(PatternRule::new(source))
    }

    #[test]
    fn test_literal_rules_match_exactly() {
        let safelist = Safelist::compile(&[SafelistRule::Literal("bg-red-500".into())]).unwrap();
        assert!(safelist.retains("bg-red-500"));
        assert!(!safelist.retains("bg-red-50"));
        assert!(!safelist.matches_everything());
    }

    #[test]
    fn test_patterns_are_unanchored() {
        let safelist = Safelist::compile(&[pattern("red")]).unwrap();
        assert!(safelist.retains("bg-red-500"));
        assert!(safelist.retains("text-red-100"));
        assert!(!safelist.retains("bg-blue-500"));
    }

    #[test]
    fn test_match_everything() {
        let safelist = Safelist::compile(&[pattern("/.*/")]).unwrap();
        assert!(safelist.matches_everything());
        for class in ["flex", "font-sans", "", "md:hover:bg-[#fff]"] {
            assert!(safelist.retains(class), "{:?} should be retained", class);
        }
    }

    #[test]
    fn test_patterns_matching_empty_string_match_everything() {
        let samples = ["flex", "font-sans", "md:hover:bg-[#fff]", "-"];

        for source in ["", "//", "(hover:)?", "x*", "^", "^.*$", "(.*)", "[\\s\\S]*", "/.*/i"] {
            let safelist = Safelist::compile(&[pattern(source)]).unwrap();
            assert!(safelist.matches_everything(), "{:?} should match everything", source);
            for class in samples {
                assert!(safelist.retains(class), "{:?} should retain {:?}", source, class);
            }
        }
    }

    #[test]
    fn test_partial_patterns_do_not_match_everything() {
        for source in ["^$", "^a*$", "\\b", "bg-.*", "^bg-", "red", "/(/"] {
            assert!(
                !matches_every_class(&PatternRule::new(source)),
                "{:?} should not match everything",
                source
            );
        }
    }

    #[test]
    fn test_case_insensitive_flag() {
        let safelist = Safelist::compile(&[pattern("/^BG-/i")]).unwrap();
        assert!(safelist.retains("bg-red-500"));
        assert!(!safelist.retains("text-bg-500"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = Safelist::compile(&[pattern("bg-(red")]).unwrap_err();
        assert!(matches!(err, DescriptorError::Regex { .. }));
        assert!(err.to_string().contains("bg-(red"));

        let err = Safelist::compile(&[pattern("/bg/x")]).unwrap_err();
        assert!(err.to_string().contains("unsupported flag"));
    }

    #[test]
    fn test_expand_with_variants() {
        let rules = vec![
            SafelistRule::Literal("flex".into()),
            SafelistRule::Literal("not-generated".into()),
            SafelistRule::Pattern(PatternRule {
                pattern: "^bg-(red|green)-500$".into(),
                variants: vec!["hover".into()],
            }),
        ];
        let safelist = Safelist::compile(&rules).unwrap();

        let universe = ["flex", "grid", "bg-red-500", "bg-blue-500", "bg-green-500"];
        let kept: Vec<_> = safelist.expand(universe).into_iter().collect();

        assert_eq!(
            kept,
            vec![
                "flex",
                "bg-red-500",
                "hover:bg-red-500",
                "bg-green-500",
                "hover:bg-green-500",
            ]
        );
    }
}
