//! Embedding-based relevance ranking of enriched records against a prompt.
//!
//! Each record is scored by its single best-matching snippet. Records
//! scoring at least [`SELECTION_THRESHOLD`] are all recommended; when none
//! do, the top few are recommended anyway so a search never comes back with
//! nothing.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ai::retry::{RetryPolicy, with_backoff};
use crate::ai::{AiError, EmbeddingService};
use crate::enrich::{Tier, Tiers};
use crate::record::{PlaceRecord, Recommendation};

pub const SELECTION_THRESHOLD: f32 = 0.6;
const MEDIUM_FROM: f32 = 0.5;
const HIGH_FROM: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLabel {
    Low,
    Medium,
    High,
}

impl ConfidenceLabel {
    /// Half-open buckets: `[.., 0.5)`, `[0.5, 0.75)`, `[0.75, ..]`. NaN is low.
    pub fn from_score(score: f32) -> Self {
        if score.is_nan() || score < MEDIUM_FROM {
            ConfidenceLabel::Low
        } else if score < HIGH_FROM {
            ConfidenceLabel::Medium
        } else {
            ConfidenceLabel::High
        }
    }
}

/// One piece of enrichment text, tagged with the record it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snippet<'a> {
    pub record: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub score: f32,
    pub label: ConfidenceLabel,
}

/// Review texts (reviews tier) and real photo captions (photos tier), in
/// record order.
pub fn extract_snippets<'a>(records: &'a [PlaceRecord], tiers: &Tiers) -> Vec<Snippet<'a>> {
    let mut snippets = Vec::new();
    for (index, record) in records.iter().enumerate() {
        if tiers.contains(&Tier::Reviews)
            && let Some(reviews) = record.reviews.value()
        {
            snippets.extend(
                reviews
                    .iter()
                    .filter_map(|r| r.text.value())
                    .filter(|t| !t.trim().is_empty())
                    .map(|text| Snippet {
                        record: index,
                        text,
                    }),
            );
        }
        if tiers.contains(&Tier::Photos) {
            snippets.extend(
                record
                    .enrichment
                    .photo_insights
                    .iter()
                    .flatten()
                    .filter(|i| !i.degraded)
                    .map(|i| Snippet {
                        record: index,
                        text: &i.insight,
                    }),
            );
        }
    }
    snippets
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Highest similarity per record, sorted best first. Ties keep record order.
/// Non-finite similarities are ignored.
pub fn best_matches(snippets: &[Snippet<'_>], similarities: &[f32]) -> Vec<(usize, f32)> {
    let mut best: BTreeMap<usize, f32> = BTreeMap::new();
    for (snippet, &score) in snippets.iter().zip(similarities) {
        if !score.is_finite() {
            continue;
        }
        best.entry(snippet.record)
            .and_modify(|s| *s = s.max(score))
            .or_insert(score);
    }
    let mut scores: Vec<(usize, f32)> = best.into_iter().collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores
}

/// Threshold first, top-N fallback. `scores` must be sorted best first.
pub fn select(scores: &[(usize, f32)]) -> Vec<Ranked> {
    let above: Vec<(usize, f32)> = scores
        .iter()
        .copied()
        .filter(|&(_, s)| s >= SELECTION_THRESHOLD)
        .collect();

    let chosen = if above.is_empty() {
        let n = if scores.len() <= 3 { 1 } else { 3 };
        scores.iter().copied().take(n).collect()
    } else {
        above
    };

    chosen
        .into_iter()
        .map(|(index, score)| Ranked {
            index,
            score,
            label: ConfidenceLabel::from_score(score),
        })
        .collect()
}

/// Scores `records` against `prompt`. `Ok(None)` means ranking was not
/// possible: no snippets, a blank prompt, or an embedding call that did not
/// recover. Only fatal errors are returned as `Err`.
pub async fn rank(
    records: &[PlaceRecord],
    prompt: &str,
    tiers: &Tiers,
    embedder: &impl EmbeddingService,
    retry: &RetryPolicy,
) -> Result<Option<Vec<Ranked>>, AiError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        debug!("no relevance prompt, skipping ranking");
        return Ok(None);
    }

    let snippets = extract_snippets(records, tiers);
    if snippets.is_empty() {
        info!("no snippets to rank");
        return Ok(None);
    }

    let mut inputs = Vec::with_capacity(snippets.len() + 1);
    inputs.push(prompt.to_string());
    inputs.extend(snippets.iter().map(|s| s.text.to_string()));

    let vectors = match with_backoff(retry, "embeddings", || embedder.embed(&inputs)).await {
        Ok(vectors) => vectors,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            warn!(error = %e, "embedding failed, results left unranked");
            return Ok(None);
        }
    };

    if vectors.len() != inputs.len() {
        warn!(
            expected = inputs.len(),
            got = vectors.len(),
            "embedding count mismatch, results left unranked"
        );
        return Ok(None);
    }
    let Some((prompt_vec, snippet_vecs)) = vectors.split_first() else {
        return Ok(None);
    };
    if prompt_vec.is_empty() || snippet_vecs.iter().any(|v| v.len() != prompt_vec.len()) {
        warn!(
            dimensions = prompt_vec.len(),
            "embedding dimensions disagree, results left unranked"
        );
        return Ok(None);
    }
    let similarities: Vec<f32> = snippet_vecs
        .iter()
        .map(|v| cosine_similarity(prompt_vec, v))
        .collect();

    let scores = best_matches(&snippets, &similarities);
    let selected = select(&scores);
    info!(
        snippets = snippets.len(),
        candidates = scores.len(),
        selected = selected.len(),
        "ranking complete"
    );
    Ok(Some(selected))
}

/// Marks the selected records; the rest stay unannotated.
pub fn annotate(records: &mut [PlaceRecord], ranked: &[Ranked]) {
    for r in ranked {
        if let Some(record) = records.get_mut(r.index) {
            record.ranking = Some(Recommendation {
                recommended: true,
                confidence: r.label,
                score: r.score,
            });
        }
    }
}
