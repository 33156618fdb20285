use crate::config::{ThemeExtend, TokenMap, FONT_FAMILY};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Resolved design tokens: a base theme with `theme.extend` merged in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(IndexMap<String, TokenMap>);

impl Theme {
    /// The build tool's default font-family stacks
    pub fn base() -> Self {
        let mut fonts = TokenMap::new();
        fonts.insert(
            "sans".into(),
            strings(&[
                "ui-sans-serif",
                "system-ui",
                "sans-serif",
                "Apple Color Emoji",
                "Segoe UI Emoji",
                "Segoe UI Symbol",
                "Noto Color Emoji",
            ]),
        );
        fonts.insert(
            "serif".into(),
            strings(&["ui-serif", "Georgia", "Cambria", "Times New Roman", "Times", "serif"]),
        );
        fonts.insert(
            "mono".into(),
            strings(&[
                "ui-monospace",
                "SFMono-Regular",
                "Menlo",
                "Monaco",
                "Consolas",
                "Liberation Mono",
                "Courier New",
                "monospace",
            ]),
        );

        let mut categories = IndexMap::new();
        categories.insert(FONT_FAMILY.to_string(), fonts);
        Self(categories)
    }

    /// Merge an extension into this theme.
    ///
    /// Tokens named by the extension replace the base token of the same name;
    /// every other base token is kept.
    pub fn extended(mut self, extend: &ThemeExtend) -> Self {
        for (category, tokens) in extend.iter() {
            let target = self.0.entry(category.clone()).or_default();
            for (token, values) in tokens {
                target.insert(token.clone(), values.clone());
            }
        }
        self
    }

    pub fn category(&self, name: &str) -> Option<&TokenMap> {
        self.0.get(name)
    }

    pub fn font_family(&self) -> Option<&TokenMap> {
        self.category(FONT_FAMILY)
    }

    /// CSS value for a `font-<token>` utility, quoting names with spaces
    pub fn font_family_css(&self, token: &str) -> Option<String> {
        let values = self.font_family()?.get(token)?;
        let rendered: Vec<String> = values
            .iter()
            .map(|name| {
                if name.contains(' ') {
                    format!("\"{}\"", name)
                } else {
                    name.clone()
                }
            })
            .collect();
        Some(rendered.join(", "))
    }

    /// Utility classes this theme makes available
    pub fn utilities(&self) -> Vec<String> {
        self.font_family()
            .map(|fonts| fonts.keys().map(|token| format!("font-{}", token)).collect())
            .unwrap_or_default()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
