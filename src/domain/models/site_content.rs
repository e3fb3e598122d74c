use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SITE_CONTENT_ID: &str = "site";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteContent {
    pub business_name: String,
    pub notification_email: Option<String>,
    pub palette_id: String,
    pub hero_title: String,
    pub hero_subtitle: String,
    pub features: BTreeMap<String, bool>,
}

impl Default for SiteContent {
    fn default() -> Self {
        Self {
            business_name: "Studio".to_string(),
            notification_email: None,
            palette_id: "classic".to_string(),
            hero_title: String::new(),
            hero_subtitle: String::new(),
            features: BTreeMap::new(),
        }
    }
}

impl SiteContent {
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    pub id: &'static str,
    pub primary: &'static str,
    pub accent: &'static str,
    pub background: &'static str,
    pub text: &'static str,
}

const PALETTES: [ColorPalette; 3] = [
    ColorPalette { id: "classic", primary: "#1f2937", accent: "#b45309", background: "#ffffff", text: "#111827" },
    ColorPalette { id: "sage", primary: "#3f6212", accent: "#a3a380", background: "#f7f7f2", text: "#1c1917" },
    ColorPalette { id: "rose", primary: "#9f1239", accent: "#fda4af", background: "#fff1f2", text: "#3f0d1a" },
];

impl ColorPalette {
    /// Unknown ids fall back to the first palette.
    pub fn by_id(id: &str) -> ColorPalette {
        PALETTES
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap_or_else(|| PALETTES[0].clone())
    }
}
