/// Supported narration languages: (code, display name). The code is what the
/// API accepts; the display name is what narration prompts are written with.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("zh", "Simplified Chinese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("it", "Italian"),
    ("nl", "Dutch"),
    ("sv", "Swedish"),
    ("id", "Indonesian"),
    ("pl", "Polish"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("vi", "Vietnamese"),
    ("ro", "Romanian"),
    ("uk", "Ukrainian"),
    ("bn", "Bengali"),
    ("mr", "Marathi"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
];

pub fn is_supported_language(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code)
}

/// Display name for a language code, defaulting to English for unknown codes.
pub fn language_name(code: &str) -> &'static str {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or("English")
}

pub fn supported_language_codes() -> Vec<&'static str> {
    SUPPORTED_LANGUAGES.iter().map(|(code, _)| *code).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve() {
        assert!(is_supported_language("en"));
        assert!(is_supported_language("th"));
        assert_eq!(language_name("zh"), "Simplified Chinese");
    }

    #[test]
    fn unknown_codes_are_rejected_but_name_falls_back() {
        assert!(!is_supported_language("xx"));
        assert!(!is_supported_language(""));
        assert_eq!(language_name("xx"), "English");
    }
}
