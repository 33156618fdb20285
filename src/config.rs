use crate::errors::{DescriptorError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The project's descriptor, as shipped next to the crate manifest.
pub const BUNDLED_DESCRIPTOR: &str = include_str!("../tailwind.config.json");

/// Conventional file name the build tool looks for.
pub const DEFAULT_CONFIG_FILE: &str = "tailwind.config.json";

/// Theme category holding font-family stacks.
pub const FONT_FAMILY: &str = "fontFamily";

/// Token name to ordered fallback values, e.g. `sans -> [Inter, system-ui, sans-serif]`
pub type TokenMap = IndexMap<String, Vec<String>>;

/// Build configuration consumed by the Tailwind CLI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDescriptor {
    /// Glob patterns of files to scan for class names
    pub content: Vec<String>,

    /// Classes kept regardless of what the scan finds
    #[serde(default)]
    pub safelist: Vec<SafelistRule>,

    /// Theme configuration
    #[serde(default)]
    pub theme: ThemeConfig,

    /// Plugin references, applied in order by the build tool
    #[serde(default)]
    pub plugins: Vec<String>,
}

/// A single safelist entry: either an exact class name or a pattern rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SafelistRule {
    Literal(String),
    Pattern(PatternRule),
}

/// `{ pattern: /.../, variants: [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    /// Regex source, bare (`bg-.*`) or as a JS literal (`/bg-.*/i`)
    pub pattern: String,

    /// Variants to generate for every matching class
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

impl PatternRule {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            variants: Vec::new(),
        }
    }

    /// Split the authored pattern into regex source and JS flags.
    ///
    /// `/foo/i` yields `("foo", "i")`; anything not shaped like a JS regex
    /// literal is taken verbatim with no flags.
    pub fn source_and_flags(&self) -> (&str, &str) {
        let raw = self.pattern.trim();
        if raw.len() >= 2 && raw.starts_with('/') {
            if let Some(end) = raw.rfind('/') {
                if end > 0 {
                    let flags = &raw[end + 1..];
                    if flags.chars().all(|c| c.is_ascii_alphabetic()) {
                        return (&raw[1..end], flags);
                    }
                }
            }
        }
        (raw, "")
    }

    /// Regex source with JS flags turned into inline flags.
    ///
    /// `i`, `m` and `s` carry over; `g`, `y` and `u` mean nothing for a
    /// single test and are dropped. Any other flag is an error.
    pub fn regex_source(&self) -> Result<String> {
        let (source, flags) = self.source_and_flags();

        let mut inline = String::new();
        for flag in flags.chars() {
            match flag {
                'i' | 'm' | 's' => inline.push(flag),
                'g' | 'y' | 'u' => {}
                other => {
                    return Err(DescriptorError::Regex {
                        pattern: self.pattern.clone(),
                        message: format!("unsupported flag '{}'", other),
                    })
                }
            }
        }

        if inline.is_empty() {
            Ok(source.to_string())
        } else {
            Ok(format!("(?{}){}", inline, source))
        }
    }

    /// Whether this rule matches every possible class name.
    ///
    /// Decided on the parsed pattern, so `""` and `(hover:)?` count as well
    /// as `.*`. Invalid patterns never match everything.
    pub fn is_match_everything(&self) -> bool {
        crate::safelist::matches_every_class(self)
    }
}

/// `theme` section. Only `extend` is modelled; the base theme is never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub extend: ThemeExtend,
}

/// Category name (`fontFamily`, `colors`, ...) to its extended tokens
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeExtend(pub IndexMap<String, TokenMap>);

impl ThemeExtend {
    pub fn category(&self, name: &str) -> Option<&TokenMap> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TokenMap)> {
        self.0.iter()
    }

    /// Insert or replace a single token inside a category
    pub fn insert_token(&mut self, category: &str, token: &str, values: Vec<String>) {
        self.0
            .entry(category.to_string())
            .or_default()
            .insert(token.to_string(), values);
    }
}

/// On-disk formats the descriptor can be read from and written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(DescriptorError::ConfigError {
                message: format!(
                    "Unsupported config file format: {}. Use .yaml, .yml, or .json",
                    path.display()
                ),
            }),
        }
    }
}

impl ConfigDescriptor {
    /// Load the project descriptor.
    ///
    /// The descriptor is static data; loading it twice yields equal values.
    pub fn load() -> Result<Self> {
        Self::from_json_str(BUNDLED_DESCRIPTOR)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| DescriptorError::ConfigError {
            message: format!("Failed to parse JSON config: {}", e),
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| DescriptorError::ConfigError {
            message: format!("Failed to parse YAML config: {}", e),
        })
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        Self::from_yaml_str(&read_config(path)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        Self::from_json_str(&read_config(path)?)
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<Self> {
        let descriptor = match ConfigFormat::from_path(path)? {
            ConfigFormat::Yaml => Self::from_yaml_file(path)?,
            ConfigFormat::Json => Self::from_json_file(path)?,
        };
        tracing::debug!(
            path = %path.display(),
            globs = descriptor.content.len(),
            safelist = descriptor.safelist.len(),
            "loaded descriptor"
        );
        Ok(descriptor)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_string_as(&self, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Json => self.to_json_string(),
            ConfigFormat::Yaml => self.to_yaml_string(),
        }
    }

    /// `theme.extend.fontFamily`, if present
    pub fn font_family(&self) -> Option<&TokenMap> {
        self.theme.extend.category(FONT_FAMILY)
    }

    /// Pattern rules in authored order
    pub fn pattern_rules(&self) -> impl Iterator<Item = &PatternRule> {
        self.safelist.iter().filter_map(|rule| match rule {
            SafelistRule::Pattern(p) => Some(p),
            SafelistRule::Literal(_) => None,
        })
    }

    /// True when a safelist pattern keeps every class, turning off
    /// scan-based elimination for the whole project.
    pub fn matches_everything(&self) -> bool {
        self.pattern_rules().any(PatternRule::is_match_everything)
    }

    /// Layer `other` on top of this descriptor
    pub fn merge(mut self, other: Self) -> Self {
        for glob in other.content {
            if !self.content.contains(&glob) {
                self.content.push(glob);
            }
        }

        for rule in other.safelist {
            if !self.safelist.contains(&rule) {
                self.safelist.push(rule);
            }
        }

        for (category, tokens) in other.theme.extend.0 {
            self.theme
                .extend
                .0
                .entry(category)
                .or_default()
                .extend(tokens);
        }

        for plugin in other.plugins {
            if !self.plugins.contains(&plugin) {
                self.plugins.push(plugin);
            }
        }

        self
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| DescriptorError::ConfigError {
        message: format!("Failed to read config file {}: {}", path.display(), e),
    })
}
