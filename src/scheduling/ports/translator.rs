//! Localisation port for conflict explanations.

use crate::scheduling::domain::LanguageCode;
use async_trait::async_trait;

/// Translates reason and guidance text for recipients and operators.
///
/// Translation is best effort: implementations return the input unchanged
/// when they cannot translate it.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into `language`.
    async fn translate(&self, text: &str, language: &LanguageCode) -> String;
}
