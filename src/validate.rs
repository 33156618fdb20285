use crate::config::{ConfigDescriptor, SafelistRule};
use crate::errors::{DescriptorError, Result};
use crate::safelist::CompiledPattern;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Theme categories the build tool knows how to extend
pub const KNOWN_THEME_CATEGORIES: &[&str] = &[
    "animation",
    "aspectRatio",
    "backgroundImage",
    "borderRadius",
    "borderWidth",
    "boxShadow",
    "colors",
    "columns",
    "container",
    "cursor",
    "fontFamily",
    "fontSize",
    "fontWeight",
    "gridTemplateColumns",
    "gridTemplateRows",
    "height",
    "keyframes",
    "letterSpacing",
    "lineHeight",
    "maxWidth",
    "minHeight",
    "minWidth",
    "opacity",
    "screens",
    "spacing",
    "transitionDuration",
    "transitionTimingFunction",
    "width",
    "zIndex",
];

/// Spellings that state the match-everything override outright
const EXPLICIT_MATCH_EVERYTHING: &[&str] = &[".*", "^.*$", "^.*", ".*$", "(.*)", "[\\s\\S]*"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single finding, located by a dotted path such as `safelist[0].pattern`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub location: String,
    pub message: String,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}: {}", level, self.location, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    fn error(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue {
            severity: Severity::Error,
            location: location.into(),
            message: message.into(),
        });
    }

    fn warning(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.issues.push(Issue {
            severity: Severity::Warning,
            location: location.into(),
            message: message.into(),
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// No errors; warnings are allowed
    pub fn is_ok(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn into_result(self) -> Result<()> {
        let errors: Vec<String> = self.errors().map(|i| i.to_string()).collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DescriptorError::Invalid(errors))
        }
    }
}

/// Check the descriptor for problems the build tool would trip over at load time
pub fn validate(config: &ConfigDescriptor) -> ValidationReport {
    let mut report = ValidationReport::default();

    check_content(config, &mut report);
    check_safelist(config, &mut report);
    check_theme(config, &mut report);

    tracing::debug!(
        errors = report.errors().count(),
        warnings = report.warnings().count(),
        "validated descriptor"
    );

    report
}

fn check_content(config: &ConfigDescriptor, report: &mut ValidationReport) {
    if config.content.is_empty() {
        report.warning("content", "no content globs; no classes will be generated");
    }

    let mut seen = HashSet::new();
    for (index, glob) in config.content.iter().enumerate() {
        let location = format!("content[{}]", index);

        if glob.trim().is_empty() {
            report.error(location, "empty glob pattern");
            continue;
        }
        if let Err(e) = glob::Pattern::new(glob) {
            report.error(location, format!("invalid glob '{}': {}", glob, e));
            continue;
        }
        if !seen.insert(glob.as_str()) {
            report.warning(location, format!("duplicate glob '{}'", glob));
        }
    }
}

fn check_safelist(config: &ConfigDescriptor, report: &mut ValidationReport) {
    let mut match_everything = 0;

    for (index, rule) in config.safelist.iter().enumerate() {
        match rule {
            SafelistRule::Literal(class) => {
                if class.trim().is_empty() {
                    report.error(format!("safelist[{}]", index), "empty class name");
                }
            }
            SafelistRule::Pattern(pattern) => {
                let location = format!("safelist[{}].pattern", index);
                let (source, _) = pattern.source_and_flags();
                if source.is_empty() {
                    report.error(location, "empty pattern keeps every class");
                    continue;
                }
                if let Err(e) = CompiledPattern::compile(pattern) {
                    report.error(location, e.to_string());
                    continue;
                }
                if !pattern.is_match_everything() {
                    continue;
                }

                match_everything += 1;
                if match_everything > 1 {
                    report.warning(location, "redundant match-everything pattern");
                } else if !EXPLICIT_MATCH_EVERYTHING.contains(&source) {
                    let message = format!(
                        "'{}' can match an empty string, so it keeps every class; \
                         write '.*' if that is intended",
                        source
                    );
                    report.warning(location, message);
                }
            }
        }
    }
}

fn check_theme(config: &ConfigDescriptor, report: &mut ValidationReport) {
    for (category, tokens) in config.theme.extend.iter() {
        if !KNOWN_THEME_CATEGORIES.contains(&category.as_str()) {
            report.warning(
                format!("theme.extend.{}", category),
                "unknown theme category",
            );
        }
        for (token, values) in tokens {
            if values.is_empty() {
                report.error(
                    format!("theme.extend.{}.{}", category, token),
                    "token has no values",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PatternRule, FONT_FAMILY};

    #[test]
    fn test_bundled_descriptor_is_clean() {
        let report = validate(&ConfigDescriptor::load().unwrap());
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_empty_content_is_only_a_warning() {
        let report = validate(&ConfigDescriptor::default());
        assert!(report.is_ok());
        assert_eq!(report.warnings().count(), 1);
        assert_eq!(report.issues[0].location, "content");
    }

    #[test]
    fn test_invalid_glob_and_pattern() {
        let mut config = ConfigDescriptor::default();
        config.content = vec!["./app/[*.html".into(), "./a/**/*.py".into(), "./a/**/*.py".into()];
        config.safelist = vec![
            SafelistRule::Pattern(PatternRule::new("bg-(")),
            SafelistRule::Literal(" ".into()),
        ];

        let report = validate(&config);
        assert!(!report.is_ok());

        let locations: Vec<_> = report.issues.iter().map(|i| i.location.as_str()).collect();
        assert_eq!(
            locations,
            vec!["content[0]", "content[2]", "safelist[0].pattern", "safelist[1]"]
        );
        assert_eq!(report.errors().count(), 3);

        let err = report.into_result().unwrap_err();
        assert!(err.to_string().contains("content[0]"));
    }

    #[test]
    fn test_duplicate_match_everything_warns() {
        let mut config = ConfigDescriptor::load().unwrap();
        config.safelist.push(SafelistRule::Pattern(PatternRule::new("/.*/")));

        let report = validate(&config);
        assert!(report.is_ok());
        let warning = report.warnings().next().unwrap();
        assert_eq!(warning.location, "safelist[1].pattern");
    }

    #[test]
    fn test_empty_and_implicit_match_everything_patterns() {
        let mut config = ConfigDescriptor::load().unwrap();
        config.safelist = vec![
            SafelistRule::Pattern(PatternRule::new("")),
            SafelistRule::Pattern(PatternRule::new("//")),
            SafelistRule::Pattern(PatternRule::new("(hover:)?")),
        ];
        assert!(config.matches_everything());

        let report = validate(&config);
        let rendered: Vec<_> = report.issues.iter().map(|i| i.to_string()).collect();
        assert_eq!(rendered.len(), 3);
        assert_eq!(rendered[0], "error: safelist[0].pattern: empty pattern keeps every class");
        assert_eq!(rendered[1], "error: safelist[1].pattern: empty pattern keeps every class");
        let implicit = "warning: safelist[2].pattern: '(hover:)?' can match an empty string";
        assert!(rendered[2].starts_with(implicit), "{}", rendered[2]);
    }

    #[test]
    fn test_theme_checks() {
        let mut config = ConfigDescriptor::load().unwrap();
        config.theme.extend.insert_token("fontFamilly", "sans", vec!["Inter".into()]);
        config.theme.extend.insert_token(FONT_FAMILY, "mono", vec![]);

        let report = validate(&config);
        let rendered: Vec<_> = report.issues.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "error: theme.extend.fontFamily.mono: token has no values",
                "warning: theme.extend.fontFamilly: unknown theme category",
            ]
        );
    }
}
