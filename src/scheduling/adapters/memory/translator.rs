//! Phrase-book translator.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::scheduling::{domain::LanguageCode, ports::Translator};

/// Translator backed by a fixed table of phrases.
///
/// Unknown phrases are returned unchanged, so an empty phrase book behaves
/// as the identity translator.
#[derive(Debug, Clone, Default)]
pub struct PhraseBookTranslator {
    phrases: HashMap<(LanguageCode, String), String>,
}

impl PhraseBookTranslator {
    /// Creates an empty phrase book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a translation of `source` into `language`.
    #[must_use]
    pub fn with_phrase(
        mut self,
        language: LanguageCode,
        source: impl Into<String>,
        translated: impl Into<String>,
    ) -> Self {
        self.phrases
            .insert((language, source.into()), translated.into());
        self
    }
}

#[async_trait]
impl Translator for PhraseBookTranslator {
    async fn translate(&self, text: &str, language: &LanguageCode) -> String {
        self.phrases
            .get(&(language.clone(), text.to_owned()))
            .cloned()
            .unwrap_or_else(|| text.to_owned())
    }
}
