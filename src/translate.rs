//! Best-effort translation of display names into the working language.

use std::collections::{BTreeSet, HashMap};

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tracing::{debug, warn};

const TRANSLATE_BASE: &str = "https://translate.googleapis.com";
const MAX_CONCURRENT_TRANSLATIONS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("translation failed: status {0}")]
    Status(u16),

    #[error("unexpected translation response: {0}")]
    Malformed(String),

    #[error("invalid translation URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

pub trait Translate {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError>;
}

/// Public Google Translate endpoint with automatic source-language detection.
#[derive(Clone)]
pub struct GoogleTranslate {
    http: Client,
    base_url: String,
}

impl GoogleTranslate {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: TRANSLATE_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }
}

impl Translate for GoogleTranslate {
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError> {
        let mut url = url::Url::parse(&format!("{}/translate_a/single", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("client", "gtx")
            .append_pair("sl", "auto")
            .append_pair("tl", target)
            .append_pair("dt", "t")
            .append_pair("q", text);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslateError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TranslateError::Malformed(e.to_string()))?;
        join_segments(&body)
    }
}

/// The response is `[[["translated", "source", ...], ...], ...]`; the
/// translation is the concatenation of each segment's first element.
fn join_segments(body: &serde_json::Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(|v| v.as_array())
        .ok_or_else(|| TranslateError::Malformed("missing segment list".into()))?;

    let joined: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(|t| t.as_str()))
        .collect();

    if joined.is_empty() {
        return Err(TranslateError::Malformed("no translated text".into()));
    }
    Ok(joined)
}

/// Translations computed ahead of normalization so that normalizing stays a
/// pure lookup. Unknown terms translate to themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glossary {
    entries: HashMap<String, String>,
}

impl Glossary {
    /// Translates each distinct non-blank term. Failures are logged and left
    /// out, which makes the term fall back to its original text.
    pub async fn build<'a>(
        translator: &impl Translate,
        terms: impl IntoIterator<Item = &'a str>,
        target: &str,
    ) -> Self {
        let unique: BTreeSet<&str> = terms
            .into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();
        let requested = unique.len();

        let entries: HashMap<String, String> = stream::iter(unique)
            .map(|term| async move {
                match translator.translate(term, target).await {
                    Ok(translated) => Some((term.to_string(), translated)),
                    Err(e) => {
                        warn!(error = %e, "translation failed, keeping original text");
                        None
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_TRANSLATIONS)
            .filter_map(|entry| async move { entry })
            .collect()
            .await;

        debug!(requested, translated = entries.len(), target, "glossary built");
        Self { entries }
    }

    pub fn translate(&self, text: &str) -> String {
        self.entries
            .get(text.trim())
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Glossary {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
