use std::fmt;

use serde::{Deserialize, Serialize};

/// Color theme forwarded to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    HighContrast,
}

impl Theme {
    pub fn name(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::HighContrast => "high-contrast",
        }
    }

    /// Get theme by name
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "high-contrast" | "highcontrast" | "hc" => Some(Theme::HighContrast),
            _ => None,
        }
    }

    /// List available built-in themes
    pub fn builtin_names() -> &'static [&'static str] {
        &["light", "dark", "high-contrast"]
    }

    pub fn is_dark(&self) -> bool {
        !matches!(self, Theme::Light)
    }

    /// Style class applied to the grid container
    pub fn grid_class(&self) -> &'static str {
        if self.is_dark() {
            "ag-theme-alpine-dark"
        } else {
            "ag-theme-alpine"
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(Theme::by_name("Dark"), Some(Theme::Dark));
        assert_eq!(Theme::by_name("high-contrast"), Some(Theme::HighContrast));
        assert_eq!(Theme::by_name("solarized"), None);
        for name in Theme::builtin_names() {
            assert_eq!(Theme::by_name(name).map(|t| t.name()), Some(*name));
        }
    }

    #[test]
    fn test_grid_class() {
        assert_eq!(Theme::Light.grid_class(), "ag-theme-alpine");
        assert_eq!(Theme::Dark.grid_class(), "ag-theme-alpine-dark");
        assert_eq!(Theme::HighContrast.grid_class(), "ag-theme-alpine-dark");
    }
}
