use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `[es] Title` or `es: Title`
static RE_TITLE_LANGUAGE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\[([A-Za-z]{2})\]|([A-Za-z]{2}):)\s").unwrap());

/// ISO 639-1 language codes that have voices in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "pt")]
    Portuguese,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 6] = [
        LanguageCode::English,
        LanguageCode::Spanish,
        LanguageCode::French,
        LanguageCode::German,
        LanguageCode::Italian,
        LanguageCode::Portuguese,
    ];

    /// Get the ISO 639-1 code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::English => "en",
            LanguageCode::Spanish => "es",
            LanguageCode::French => "fr",
            LanguageCode::German => "de",
            LanguageCode::Italian => "it",
            LanguageCode::Portuguese => "pt",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim().to_lowercase();
        Self::ALL.into_iter().find(|language| language.as_str() == code)
    }

    /// Language announced by a title prefix such as `[es] ...` or `de: ...`
    pub fn from_title_prefix(title: &str) -> Option<Self> {
        let captures = RE_TITLE_LANGUAGE_PREFIX.captures(title)?;
        let code = captures.get(1).or_else(|| captures.get(2))?;
        Self::from_code(code.as_str())
    }
}

impl Default for LanguageCode {
    fn default() -> Self {
        LanguageCode::English
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
