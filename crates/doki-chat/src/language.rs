//! Language preference and the system instruction table.
//!
//! Every instruction is the shared health-assistant policy followed by a
//! language-specific suffix. The mapping is plain data: adding a language
//! means adding a row to [`PROFILES`] and a variant to [`Language`].

use serde::Serialize;

use crate::types::LanguageInfo;

/// Disclaimer every instruction must carry.
pub const SAFETY_DISCLAIMER: &str =
    "Always emphasize that you provide general health information, not medical diagnosis";

/// Shared base policy for all languages.
pub const BASE_POLICY: &str = "You are DOKI, a helpful AI health assistant designed specifically for Kenya. You provide health information, guidance, and support while being culturally sensitive to Kenyan healthcare needs.

IMPORTANT GUIDELINES:
- Always emphasize that you provide general health information, not medical diagnosis
- Recommend consulting qualified healthcare professionals for serious concerns
- Be aware of Kenya's healthcare system (NHIF/SHIF, public vs private facilities)
- Consider common health challenges in Kenya (malaria, typhoid, respiratory infections)
- Be sensitive to economic constraints many Kenyans face
- Provide practical, actionable advice
- If asked about emergency situations, always recommend immediate medical attention

NEVER:
- Provide specific medical diagnoses
- Recommend specific medications or dosages
- Replace professional medical advice
- Give advice on serious medical procedures";

/// Supported response languages. `English` is the fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Swahili,
    Kikuyu,
    Luo,
}

struct LanguageProfile {
    language: Language,
    code: &'static str,
    name: &'static str,
    suffix: &'static str,
}

// Indexed by `Language as usize`.
const PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        language: Language::English,
        code: "english",
        name: "English",
        suffix: "Respond in clear, simple English that is easily understood by Kenyans.",
    },
    LanguageProfile {
        language: Language::Swahili,
        code: "swahili",
        name: "Kiswahili",
        suffix: "Respond in Kiswahili. Use simple, clear Kiswahili that most Kenyans can understand. You can mix with some English words that are commonly used in Kenya.",
    },
    LanguageProfile {
        language: Language::Kikuyu,
        code: "kikuyu",
        name: "Kikuyu",
        suffix: "Respond in Kikuyu language when possible, but fall back to Kiswahili or English for medical terms that don't have direct translations.",
    },
    LanguageProfile {
        language: Language::Luo,
        code: "luo",
        name: "Dholuo",
        suffix: "Respond in Dholuo when possible, but use Kiswahili or English for complex medical terms.",
    },
];

impl Language {
    /// Resolve a caller-supplied tag. Missing or unknown tags yield the default.
    pub fn resolve(tag: Option<&str>) -> Self {
        tag.and_then(Self::from_code).unwrap_or_default()
    }

    /// Exact lookup by wire code.
    pub fn from_code(code: &str) -> Option<Self> {
        PROFILES.iter().find(|p| p.code == code).map(|p| p.language)
    }

    pub fn all() -> impl Iterator<Item = Language> {
        PROFILES.iter().map(|p| p.language)
    }

    fn profile(self) -> &'static LanguageProfile {
        &PROFILES[self as usize]
    }

    pub fn code(self) -> &'static str {
        self.profile().code
    }

    /// Human-readable name shown in language pickers.
    pub fn display_name(self) -> &'static str {
        self.profile().name
    }

    /// Full system instruction: base policy plus the language suffix.
    pub fn system_instruction(self) -> String {
        format!("{}\n\n{}", BASE_POLICY, self.profile().suffix)
    }

    pub fn info(self) -> LanguageInfo {
        LanguageInfo {
            code: self.code(),
            name: self.display_name(),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// All supported languages in display order.
pub fn supported_languages() -> Vec<LanguageInfo> {
    Language::all().map(Language::info).collect()
}
