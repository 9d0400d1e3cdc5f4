use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::language::LanguageCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Interpret a loose hint such as "Male", "f" or "female"
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_lowercase().as_str() {
            "male" | "m" | "man" => Some(Gender::Male),
            "female" | "f" | "woman" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// A synthesis voice known at process start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub provider: String,
    pub label: String,
    /// Model file for local engines, or a provider-side voice reference
    pub model_ref: String,
    pub language: LanguageCode,
    pub gender: Option<Gender>,
    pub speaker_id: Option<u32>,
}

/// What the caller asked for: a voice id or gender word, plus the language
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceHint {
    pub preferred: Option<String>,
    pub language: LanguageCode,
}

impl VoiceHint {
    pub fn new(preferred: Option<String>, language: LanguageCode) -> Self {
        Self {
            preferred: preferred.filter(|p| !p.trim().is_empty()),
            language,
        }
    }

    /// The gender implied by the hint, either directly or through a catalog voice
    pub fn gender(&self, catalog: &VoiceCatalog) -> Option<Gender> {
        let preferred = self.preferred.as_deref()?;
        Gender::from_hint(preferred).or_else(|| catalog.get(preferred).and_then(|v| v.gender))
    }
}

/// Static voice table, looked up by id or resolved by language and gender
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    voices: BTreeMap<String, Voice>,
    order: Vec<String>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<Voice>) -> Self {
        let mut catalog = Self {
            voices: BTreeMap::new(),
            order: Vec::new(),
        };
        for voice in voices {
            catalog.register(voice);
        }
        catalog
    }

    fn register(&mut self, voice: Voice) {
        if !self.voices.contains_key(&voice.id) {
            self.order.push(voice.id.clone());
        }
        self.voices.insert(voice.id.clone(), voice);
    }

    pub fn get(&self, id: &str) -> Option<&Voice> {
        self.voices.get(id)
    }

    pub fn list(&self) -> impl Iterator<Item = &Voice> {
        self.order.iter().filter_map(|id| self.voices.get(id))
    }

    /// Preferred id if known, else the first voice matching language (and
    /// gender when given), else the first registered voice.
    pub fn resolve(
        &self,
        language: LanguageCode,
        gender: Option<Gender>,
        preferred_id: Option<&str>,
    ) -> Option<&Voice> {
        if let Some(voice) = preferred_id.and_then(|id| self.get(id)) {
            return Some(voice);
        }

        self.list()
            .find(|v| v.language == language && (gender.is_none() || v.gender == gender))
            .or_else(|| self.list().next())
    }

    /// Resolve a caller hint against this catalog
    pub fn resolve_hint(&self, hint: &VoiceHint) -> Option<&Voice> {
        self.resolve(hint.language, hint.gender(self), hint.preferred.as_deref())
    }
}

impl Default for VoiceCatalog {
    /// The piper voices shipped with the sidecar image
    fn default() -> Self {
        let piper = |id: &str, label: &str, model: &str, language, gender| Voice {
            id: id.to_string(),
            provider: "piper".to_string(),
            label: label.to_string(),
            model_ref: format!("/opt/piper/models/{}", model),
            language,
            gender: Some(gender),
            speaker_id: None,
        };

        Self::new(vec![
            piper(
                "en_us_m_lessac_med",
                "EN US (male) Lessac Medium",
                "en/en_US/lessac/en_US-lessac-medium.onnx",
                LanguageCode::English,
                Gender::Male,
            ),
            piper(
                "en_us_f_kristin_med",
                "EN US (female) Kristin Medium",
                "en/en_US/kristin/en_US-kristin-medium.onnx",
                LanguageCode::English,
                Gender::Female,
            ),
            piper(
                "en_gb_f_alba_med",
                "EN GB (female) Alba Medium",
                "en/en_GB/alba/en_GB-alba-medium.onnx",
                LanguageCode::English,
                Gender::Female,
            ),
            piper(
                "en_gb_f_jenny_med",
                "EN GB (female) Jenny Dioco Medium",
                "en/en_GB/jenny_dioco/en_GB-jenny_dioco-medium.onnx",
                LanguageCode::English,
                Gender::Female,
            ),
            piper(
                "es_es_m_davefx_med",
                "ES ES (male) Davefx Medium",
                "es/es_ES/davefx/es_ES-davefx-medium.onnx",
                LanguageCode::Spanish,
                Gender::Male,
            ),
            piper(
                "de_de_m_thorsten_med",
                "DE DE (male) Thorsten Medium",
                "de/de_DE/thorsten/de_DE-thorsten-medium.onnx",
                LanguageCode::German,
                Gender::Male,
            ),
        ])
    }
}
