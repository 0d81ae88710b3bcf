//! Automatic translation of foreign-language chat.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::ScriptContext;
use crate::common::error::{ScriptError, ScriptResult};

const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Source languages trusted when the input is written in Latin script.
const TRUSTED_LATIN_LANGUAGES: &[&str] = &[
    "en", "es", "it", "pt", "de", "fr", "nl", "ro", "pl", "sv", "no", "da",
];

/// One-word messages the detector gets wrong, with their real language.
const KNOWN_SHORT_WORDS: &[(&str, &str)] = &[
    ("si", "es"),
    ("oui", "fr"),
    ("no", "es"),
    ("ciao", "it"),
    ("ja", "de"),
    ("non", "fr"),
];

/// "Translated from {}" in the target language.
const TEMPLATES: &[(&str, &str)] = &[
    ("en", "Translated from {}"),
    ("es", "Traducido del {}"),
    ("fr", "Traduit du {}"),
    ("de", "Übersetzt aus dem {}"),
    ("it", "Tradotto da {}"),
    ("pt", "Traduzido de {}"),
    ("ja", "{} からの翻訳"),
    ("ko", "{}에서 번역됨"),
    ("zh-cn", "翻译自{}"),
    ("zh-tw", "翻譯自{}"),
    ("ru", "Переведено с {}"),
];

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("iw", "Hebrew"),
    ("he", "Hebrew"),
    ("zh-cn", "Chinese (Simplified)"),
    ("zh-tw", "Chinese (Traditional)"),
    ("zh", "Chinese"),
    ("fil", "Filipino"),
    ("tl", "Filipino"),
    ("af", "Afrikaans"),
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("bn", "Bangla"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("cy", "Welsh"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("eo", "Esperanto"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("eu", "Basque"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("ga", "Irish"),
    ("gl", "Galician"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("la", "Latin"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("ms", "Malay"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sq", "Albanian"),
    ("sr", "Serbian"),
    ("sv", "Swedish"),
    ("sw", "Kiswahili"),
    ("ta", "Tamil"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("vi", "Vietnamese"),
];

/// A translated text and the detected (or forced) source language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub source_language: String,
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target`; `source` forces the input language.
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> ScriptResult<Translation>;
}

/// Unauthenticated Google Translate web endpoint.
pub struct GoogleTranslator {
    client: Client,
}

impl GoogleTranslator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source: Option<&str>,
        target: &str,
    ) -> ScriptResult<Translation> {
        let response = self
            .client
            .get(GOOGLE_TRANSLATE_URL)
            .header("User-Agent", "Mozilla/5.0")
            .query(&[
                ("client", "gtx"),
                ("sl", source.unwrap_or("auto")),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScriptError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        parse_translation(&body)
    }
}

/// Read `[[["text", ...], ...], _, "src", ...]`.
pub fn parse_translation(body: &Value) -> ScriptResult<Translation> {
    let parts = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ScriptError::Parse {
            message: "missing translation segments".to_string(),
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get(0).and_then(Value::as_str))
        .collect();

    let source_language = body
        .get(2)
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    Ok(Translation {
        text: text.trim().to_string(),
        source_language,
    })
}

/// Lowercase, keep letters and digits, collapse whitespace.
pub fn normalize_for_comparison(text: &str) -> String {
    let mut cleaned = String::new();
    let mut last_was_space = false;

    for c in text.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            cleaned.push(c);
            last_was_space = false;
        } else if c.is_whitespace() && !last_was_space {
            cleaned.push(' ');
            last_was_space = true;
        }
    }

    cleaned.trim().to_string()
}

/// Fewer than 20% of the letters fall outside basic and extended Latin.
pub fn is_latin_script(text: &str) -> bool {
    let (letters, non_latin) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(all, other), c| {
            let latin = c.is_ascii_alphabetic() || ('\u{00C0}'..='\u{024F}').contains(&c);
            (all + 1, other + usize::from(!latin))
        });

    letters == 0 || (non_latin as f64 / letters as f64) < 0.2
}

/// English display name of a language code; unknown codes are uppercased.
pub fn language_display_name(code: &str) -> String {
    if code.is_empty() {
        return "Unknown".to_string();
    }
    let lower = code.to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == lower)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_uppercase())
}

/// `[Translated from Spanish]`-style prefix for a target language.
pub fn translated_from(target: &str, source: &str) -> String {
    let target = target.to_lowercase();
    let template = TEMPLATES
        .iter()
        .find(|(lang, _)| *lang == target)
        .map(|(_, t)| *t)
        .unwrap_or(TEMPLATES[0].1);
    template.replace("{}", &language_display_name(source))
}

fn forced_source(message: &str) -> Option<&'static str> {
    let trimmed = message.trim().to_lowercase();
    if trimmed.chars().count() > 5 {
        return None;
    }
    KNOWN_SHORT_WORDS
        .iter()
        .find(|(word, _)| *word == trimmed)
        .map(|(_, lang)| *lang)
}

/// Passive script: posts a translation of non-target-language messages.
pub struct TranslateScript {
    translator: Arc<dyn Translator>,
    target_language: String,
}

impl TranslateScript {
    pub fn new(translator: Arc<dyn Translator>, target_language: impl Into<String>) -> Self {
        Self {
            translator,
            target_language: target_language.into().to_lowercase(),
        }
    }

    pub async fn try_handle(&self, ctx: &ScriptContext<'_>) -> Option<String> {
        if ctx.message.trim().is_empty() || ctx.username.trim().is_empty() {
            return None;
        }
        if ctx.message.trim_start().starts_with('!') {
            return None;
        }

        let forced = forced_source(ctx.message);
        if let Some(lang) = forced {
            debug!("Translate: short word, forcing source language '{}'", lang);
        }

        let translation = match self
            .translator
            .translate(ctx.message, forced, &self.target_language)
            .await
        {
            Ok(translation) => translation,
            Err(e) => {
                warn!("Translate: request failed: {}", e);
                return None;
            }
        };

        if translation.text.trim().is_empty() {
            debug!("Translate: empty result");
            return None;
        }

        let source = translation.source_language.to_lowercase();
        if forced.is_none() && source == self.target_language {
            debug!("Translate: source matches target '{}'", self.target_language);
            return None;
        }

        if normalize_for_comparison(ctx.message) == normalize_for_comparison(&translation.text) {
            debug!("Translate: translation equals input");
            return None;
        }

        if is_latin_script(ctx.message) && !TRUSTED_LATIN_LANGUAGES.contains(&source.as_str()) {
            debug!("Translate: untrusted Latin-script source '{}'", source);
            return None;
        }

        Some(format!(
            "[{}] {}: {}",
            translated_from(&self.target_language, &source),
            ctx.username,
            translation.text
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    /// Returns a canned translation and records the forced source.
    struct FakeTranslator {
        text: String,
        source: String,
        forced: Mutex<Vec<Option<String>>>,
    }

    impl FakeTranslator {
        fn new(text: &str, source: &str) -> Arc<Self> {
            Arc::new(Self {
                text: text.to_string(),
                source: source.to_string(),
                forced: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate(
            &self,
            _text: &str,
            source: Option<&str>,
            _target: &str,
        ) -> ScriptResult<Translation> {
            self.forced.lock().unwrap().push(source.map(str::to_string));
            Ok(Translation {
                text: self.text.clone(),
                source_language: source.unwrap_or(&self.source).to_string(),
            })
        }
    }

    fn ctx(message: &str) -> ScriptContext<'_> {
        ScriptContext::new(message, "viewer", "chan", "minibot")
    }

    #[test]
    fn test_parse_translation() {
        let body = json!([[["Hello ", "Hola ", null], ["friend", "amigo", null]], null, "es"]);
        let t = parse_translation(&body).unwrap();
        assert_eq!(t.text, "Hello friend");
        assert_eq!(t.source_language, "es");
    }

    #[test]
    fn test_parse_translation_rejects_garbage() {
        assert!(parse_translation(&json!({"error": 1})).is_err());
        let t = parse_translation(&json!([[]])).unwrap();
        assert_eq!(t.source_language, "unknown");
    }

    #[test]
    fn test_normalize_for_comparison() {
        assert_eq!(normalize_for_comparison("  Hello,   World!! "), "hello world");
        assert_eq!(normalize_for_comparison("¡Hola!"), "hola");
    }

    #[test]
    fn test_latin_script() {
        assert!(is_latin_script("hola amigo"));
        assert!(is_latin_script("façade über"));
        assert!(is_latin_script("123"));
        assert!(!is_latin_script("привет"));
        assert!(!is_latin_script("こんにちは"));
    }

    #[test]
    fn test_templates() {
        assert_eq!(translated_from("en", "es"), "Translated from Spanish");
        assert_eq!(translated_from("de", "fr"), "Übersetzt aus dem French");
        assert_eq!(translated_from("xx", "iw"), "Translated from Hebrew");
        assert_eq!(translated_from("en", "qq"), "Translated from QQ");
    }

    #[tokio::test]
    async fn test_translates_foreign_message() {
        let script = TranslateScript::new(FakeTranslator::new("Hello friend", "es"), "en");
        assert_eq!(
            script.try_handle(&ctx("hola amigo")).await.as_deref(),
            Some("[Translated from Spanish] viewer: Hello friend")
        );
    }

    #[tokio::test]
    async fn test_same_language_skipped() {
        let script = TranslateScript::new(FakeTranslator::new("hello", "en"), "en");
        assert!(script.try_handle(&ctx("hello")).await.is_none());
    }

    #[tokio::test]
    async fn test_short_word_forces_source() {
        let translator = FakeTranslator::new("yes", "en");
        let script = TranslateScript::new(translator.clone(), "en");

        assert_eq!(
            script.try_handle(&ctx("Oui")).await.as_deref(),
            Some("[Translated from French] viewer: yes")
        );
        assert_eq!(
            translator.forced.lock().unwrap().as_slice(),
            &[Some("fr".to_string())]
        );
    }

    #[tokio::test]
    async fn test_unchanged_translation_skipped() {
        let script = TranslateScript::new(FakeTranslator::new("Pizza!", "it"), "en");
        assert!(script.try_handle(&ctx("pizza")).await.is_none());
    }

    #[tokio::test]
    async fn test_untrusted_latin_source_skipped() {
        let script = TranslateScript::new(FakeTranslator::new("good game", "tr"), "en");
        assert!(script.try_handle(&ctx("iyi oyun")).await.is_none());
    }

    #[tokio::test]
    async fn test_non_latin_untrusted_source_allowed() {
        let script = TranslateScript::new(FakeTranslator::new("hello", "ru"), "en");
        assert_eq!(
            script.try_handle(&ctx("привет")).await.as_deref(),
            Some("[Translated from Russian] viewer: hello")
        );
    }

    #[tokio::test]
    async fn test_commands_ignored() {
        let script = TranslateScript::new(FakeTranslator::new("x", "es"), "en");
        assert!(script.try_handle(&ctx("!hola")).await.is_none());
    }
}
