//! Language detection and the language codes the speech service understands.

use anyhow::Result;
use whatlang::Lang;

/// Two-letter codes the translation service accepts.
pub const SUPPORTED_LANGUAGES: [&str; 12] = [
    "en", "hi", "ta", "te", "kn", "ml", "gu", "mr", "bn", "pa", "or", "es",
];

/// Detect the language of `text`.
///
/// Returns an ISO 639-1 code for the supported languages and the detector's
/// ISO 639-3 code for anything else, which callers treat as unsupported.
pub fn detect_language(text: &str) -> Result<String> {
    if text.trim().is_empty() {
        anyhow::bail!("Cannot detect language: Input text is empty");
    }

    let info = whatlang::detect(text)
        .ok_or_else(|| anyhow::anyhow!("Language detection failed for input"))?;

    // Short Latin-script messages are often ambiguous; treat them as English.
    if !info.is_reliable() && info.script() == whatlang::Script::Latin {
        tracing::debug!(guess = info.lang().code(), "Unreliable detection, assuming English");
        return Ok("en".to_string());
    }

    let code = match info.lang() {
        Lang::Eng => "en",
        Lang::Hin => "hi",
        Lang::Tam => "ta",
        Lang::Tel => "te",
        Lang::Kan => "kn",
        Lang::Mal => "ml",
        Lang::Guj => "gu",
        Lang::Mar => "mr",
        Lang::Ben => "bn",
        Lang::Pan => "pa",
        Lang::Ori => "or",
        Lang::Spa => "es",
        other => other.code(),
    };
    tracing::debug!(lang = code, confidence = info.confidence(), "Detected language");
    Ok(code.to_string())
}

pub fn is_supported(lang: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&lang)
}

/// Map a two-letter code to the regional code used by the speech service.
pub fn sarvam_code(lang: &str) -> String {
    match lang {
        "or" => "od-IN".to_string(),
        "es" => "es".to_string(),
        other => format!("{other}-IN"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_error() {
        assert!(detect_language("").is_err());
        assert!(detect_language("   \n").is_err());
    }

    #[test]
    fn test_detects_english() {
        let lang =
            detect_language("What are the eligibility criteria for a car loan from the bank?")
                .unwrap();
        assert_eq!(lang, "en");
    }

    #[test]
    fn test_detects_tamil() {
        let lang = detect_language("எனக்கு கார் கடன் வேண்டும், தகுதி என்ன என்று சொல்லுங்கள்").unwrap();
        assert_eq!(lang, "ta");
    }

    #[test]
    fn test_sarvam_codes() {
        assert_eq!(sarvam_code("en"), "en-IN");
        assert_eq!(sarvam_code("ta"), "ta-IN");
        assert_eq!(sarvam_code("or"), "od-IN");
        assert_eq!(sarvam_code("es"), "es");
    }

    #[test]
    fn test_supported_set() {
        assert!(is_supported("ta"));
        assert!(is_supported("or"));
        assert!(!is_supported("fra"));
        assert!(!is_supported("fr"));
    }
}
