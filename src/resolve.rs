use crate::config::ConfigDescriptor;
use crate::errors::{DescriptorError, Result};
use crate::safelist::Safelist;
use crate::scanner::ScanResult;
use crate::theme::Theme;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every class name the build tool is able to generate.
///
/// Scanning and the safelist only ever select from this set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassUniverse {
    classes: IndexSet<String>,
}

impl ClassUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a newline-separated class list; blank lines and `#` comments are skipped
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DescriptorError::ConfigError {
            message: format!("Failed to read class list {}: {}", path.display(), e),
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    /// Add the utilities a resolved theme provides
    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.classes.extend(theme.utilities());
        self
    }

    pub fn insert(&mut self, class: impl Into<String>) -> bool {
        self.classes.insert(class.into())
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ClassUniverse {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Why a class ended up in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassSource {
    Scan,
    Safelist,
    Both,
}

/// Outcome of applying a descriptor to a scan
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Classes found by scanning that the build tool can generate
    pub from_scan: IndexSet<String>,
    /// Classes kept by the safelist, including variant expansions
    pub from_safelist: IndexSet<String>,
    /// Union of both, sorted
    pub retained: IndexSet<String>,
    /// Base theme with `theme.extend` merged in
    pub theme: Theme,
    pub matches_everything: bool,
}

impl Resolution {
    pub fn source_of(&self, class: &str) -> Option<ClassSource> {
        match (self.from_scan.contains(class), self.from_safelist.contains(class)) {
            (true, true) => Some(ClassSource::Both),
            (true, false) => Some(ClassSource::Scan),
            (false, true) => Some(ClassSource::Safelist),
            (false, false) => None,
        }
    }
}

/// Work out which classes the build would emit for this descriptor.
///
/// The theme's utilities are added to `universe` before selection, so a
/// theme extension such as `fontFamily.display` makes `font-display` available.
pub fn resolve(
    config: &ConfigDescriptor,
    scan: &ScanResult,
    universe: &ClassUniverse,
) -> Result<Resolution> {
    let safelist = Safelist::compile(&config.safelist)?;
    let theme = Theme::base().extended(&config.theme.extend);
    let universe = universe.clone().with_theme(&theme);

    let from_scan: IndexSet<String> = scan
        .classes()
        .filter(|class| universe.contains(class))
        .map(str::to_string)
        .collect();

    let from_safelist = safelist.expand(universe.iter());

    let mut retained: IndexSet<String> = from_scan.union(&from_safelist).cloned().collect();
    retained.sort();

    if safelist.matches_everything() {
        tracing::info!(
            universe = universe.len(),
            "safelist matches everything; scan-based elimination disabled"
        );
    }
    tracing::debug!(
        scanned = from_scan.len(),
        safelisted = from_safelist.len(),
        retained = retained.len(),
        "resolved classes"
    );

    Ok(Resolution {
        from_scan,
        from_safelist,
        retained,
        theme,
        matches_everything: safelist.matches_everything(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PatternRule, SafelistRule};

    fn scan_of(classes: &[&str]) -> ScanResult {
        let mut scan = ScanResult::default();
        for class in classes {
            scan.candidates
                .insert(class.to_string(), vec!["index.html:1".to_string()]);
        }
        scan
    }

    #[test]
    fn test_scan_only() {
        let mut config = ConfigDescriptor::load().unwrap();
        config.safelist.clear();

        let universe: ClassUniverse = ["flex", "grid", "p-4"].into_iter().collect();
        let resolution = resolve(&config, &scan_of(&["flex", "hello", "p-4"]), &universe).unwrap();

        let retained: Vec<_> = resolution.retained.iter().map(String::as_str).collect();
        assert_eq!(retained, vec!["flex", "p-4"]);
        assert_eq!(resolution.source_of("flex"), Some(ClassSource::Scan));
        assert_eq!(resolution.source_of("grid"), None);
        assert!(!resolution.matches_everything);
    }

    #[test]
    fn test_match_everything_keeps_universe() {
        let config = ConfigDescriptor::load().unwrap();
        let universe: ClassUniverse = ["flex", "grid", "bg-red-500"].into_iter().collect();

        let resolution = resolve(&config, &scan_of(&["flex"]), &universe).unwrap();

        assert!(resolution.matches_everything);
        assert_eq!(resolution.retained.len(), 6);
        assert!(resolution.retained.contains("font-sans"));
        assert!(resolution.retained.contains("bg-red-500"));
        assert_eq!(resolution.source_of("flex"), Some(ClassSource::Both));
        assert_eq!(resolution.source_of("grid"), Some(ClassSource::Safelist));
    }

    #[test]
    fn test_match_everything_with_variants_exceeds_universe() {
        let mut config = ConfigDescriptor::load().unwrap();
        config.safelist = vec![SafelistRule::Pattern(PatternRule {
            pattern: ".*".into(),
            variants: vec!["hover".into()],
        })];
        let universe: ClassUniverse = ["flex"].into_iter().collect();

        let resolution = resolve(&config, &scan_of(&["flex"]), &universe).unwrap();

        assert!(resolution.matches_everything);
        let retained: Vec<_> = resolution.retained.iter().map(String::as_str).collect();
        assert_eq!(
            retained,
            vec![
                "flex",
                "font-mono",
                "font-sans",
                "font-serif",
                "hover:flex",
                "hover:font-mono",
                "hover:font-sans",
                "hover:font-serif",
            ]
        );
    }

    #[test]
    fn test_implicit_match_everything_is_reported() {
        let universe: ClassUniverse = ["flex", "grid", "p-4"].into_iter().collect();

        for source in ["", "(hover:)?"] {
            let mut config = ConfigDescriptor::load().unwrap();
            config.safelist = vec![SafelistRule::Pattern(PatternRule::new(source))];

            let resolution = resolve(&config, &ScanResult::default(), &universe).unwrap();
            assert!(resolution.matches_everything, "{:?}", source);
            assert_eq!(resolution.retained.len(), 6, "{:?}", source);
        }
    }

    #[test]
    fn test_variant_expansion_is_retained() {
        let mut config = ConfigDescriptor::load().unwrap();
        config.safelist = vec![SafelistRule::Pattern(PatternRule {
            pattern: "^bg-red-".into(),
            variants: vec!["hover".into()],
        })];
        let universe: ClassUniverse = ["bg-red-500", "bg-blue-500"].into_iter().collect();

        let resolution = resolve(&config, &ScanResult::default(), &universe).unwrap();
        let retained: Vec<_> = resolution.retained.iter().map(String::as_str).collect();
        assert_eq!(retained, vec!["bg-red-500", "hover:bg-red-500"]);
    }

    #[test]
    fn test_universe_parse() {
        let universe = ClassUniverse::parse("# generated\nflex\n\n  grid  \nflex\n");
        assert_eq!(universe.iter().collect::<Vec<_>>(), vec!["flex", "grid"]);
    }
}
