use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::InferenceError;

const BUNDLED_REMEDIES: &str = include_str!("../../resources/home_remedies.json");
const GENERAL_KEY: &str = "general";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Hi,
}

impl Locale {
    /// "hi", "hindi" or "हिंदी" select Hindi; anything else English.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "hi" | "hindi" | "हिंदी" => Self::Hi,
            _ => Self::En,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalizedRemedies {
    #[serde(default)]
    pub en: Vec<String>,
    #[serde(default)]
    pub hi: Vec<String>,
}

impl LocalizedRemedies {
    fn get(&self, locale: Locale) -> &[String] {
        match locale {
            Locale::En => &self.en,
            Locale::Hi => &self.hi,
        }
    }
}

/// Home-remedy reference keyed by normalised symptom ("stomach_pain"),
/// with a "general" entry used when no symptom matches.
#[derive(Debug, Clone)]
pub struct RemedyReference {
    entries: BTreeMap<String, LocalizedRemedies>,
}

impl RemedyReference {
    /// Load a reference file.
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::ReferenceDataLoad(path.display().to_string(), e.to_string())
        })?;
        Self::from_json(&json, &path.display().to_string())
    }

    /// Reference shipped with the binary.
    pub fn bundled() -> Result<Self, InferenceError> {
        Self::from_json(BUNDLED_REMEDIES, "home_remedies.json")
    }

    /// Deployment override if present, bundled reference otherwise.
    pub fn load_or_bundled(path: &Path) -> Result<Self, InferenceError> {
        if path.exists() {
            Self::load(path)
        } else {
            Self::bundled()
        }
    }

    fn from_json(json: &str, name: &str) -> Result<Self, InferenceError> {
        let entries: BTreeMap<String, LocalizedRemedies> = serde_json::from_str(json)
            .map_err(|e| InferenceError::ReferenceDataParse(name.to_string(), e.to_string()))?;
        Ok(Self { entries })
    }

    /// Reference text for the reported symptoms, one bulleted block per
    /// matched symptom. Falls back to the general tips.
    pub fn reference_text(&self, symptoms: &[String], locale: Locale) -> String {
        let mut text = String::new();

        for symptom in symptoms {
            let key = symptom.trim().to_lowercase().replace(' ', "_");
            let Some(entry) = self.entries.get(&key) else {
                continue;
            };
            if key == GENERAL_KEY {
                continue;
            }
            let title = title_case(symptom.trim());
            match locale {
                Locale::En => text.push_str(&format!("\n\n**Home remedies for {title}:**\n")),
                Locale::Hi => text.push_str(&format!("\n\n**{title} के लिए घरेलू उपचार:**\n")),
            }
            push_bullets(&mut text, entry.get(locale));
        }

        if text.is_empty() {
            if let Some(general) = self.entries.get(GENERAL_KEY) {
                match locale {
                    Locale::En => text.push_str("\n**General health tips:**\n"),
                    Locale::Hi => text.push_str("\n**सामान्य स्वास्थ्य सुझाव:**\n"),
                }
                push_bullets(&mut text, general.get(locale));
            }
        }

        text
    }
}

fn push_bullets(text: &mut String, items: &[String]) {
    for item in items {
        text.push_str("• ");
        text.push_str(item);
        text.push('\n');
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
