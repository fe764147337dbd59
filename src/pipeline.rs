//! The single entry point: search → normalize → enrich → rank.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::ai::{AiError, CompletionService, EmbeddingService};
use crate::enrich::{EnrichConfig, Enricher};
use crate::normalize::{normalize, translatable_terms};
use crate::places::paginate::collect_pages;
use crate::places::types::SearchQuery;
use crate::places::{ImageSource, PlacesError, SearchTransport};
use crate::rank::{annotate, rank};
use crate::record::PlaceRecord;
use crate::translate::{Glossary, Translate};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("search failed: {0}")]
    Search(#[from] PlacesError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error("search did not finish within {0:?}")]
    Timeout(Duration),
}

/// Collaborators for one batch. Borrowed, so the caller owns client
/// lifetimes and tests can substitute any of them.
pub struct Services<'a, S, A, I, T> {
    pub search: &'a S,
    pub ai: &'a A,
    pub images: &'a I,
    pub translator: &'a T,
}

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub query: SearchQuery,
    /// Free-text intent. Seeds the vision instruction and is the ranking query.
    pub prompt: String,
    pub enrich: EnrichConfig,
    /// Target language for names; `None` disables translation.
    pub translate_to: Option<String>,
    /// Overall budget. Pagination must finish inside it; enrichment returns
    /// partial results when it runs out; ranking is skipped.
    pub timeout: Option<Duration>,
}

impl PipelineRequest {
    pub fn new(query: SearchQuery, prompt: impl Into<String>) -> Self {
        Self {
            query,
            prompt: prompt.into(),
            enrich: EnrichConfig::default(),
            translate_to: Some("en".to_string()),
            timeout: None,
        }
    }
}

pub async fn run<S, A, I, T>(
    services: &Services<'_, S, A, I, T>,
    request: &PipelineRequest,
) -> Result<Vec<PlaceRecord>, PipelineError>
where
    S: SearchTransport,
    A: CompletionService + EmbeddingService,
    I: ImageSource,
    T: Translate,
{
    let started = Instant::now();
    let deadline = request.timeout.map(|t| started + t);

    let search = collect_pages(services.search, &request.query);
    let raw = match (deadline, request.timeout) {
        (Some(deadline), Some(budget)) => tokio::time::timeout_at(deadline, search)
            .await
            .map_err(|_| PipelineError::Timeout(budget))??,
        _ => search.await?,
    };
    info!(places = raw.len(), "search complete");

    let glossary = match &request.translate_to {
        Some(target) => {
            let build = Glossary::build(services.translator, translatable_terms(&raw), target);
            match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, build)
                    .await
                    .unwrap_or_else(|_| {
                        warn!("translation ran out of time, keeping original names");
                        Glossary::default()
                    }),
                None => build.await,
            }
        }
        None => Glossary::default(),
    };

    if !glossary.is_empty() {
        debug!(entries = glossary.len(), "names translated");
    }
    let mut records: Vec<PlaceRecord> = raw.iter().map(|p| normalize(p, &glossary)).collect();

    let enricher = Enricher::new(services.ai, services.images, request.enrich.clone());
    let report = enricher
        .enrich_batch(&mut records, &request.prompt, deadline)
        .await?;

    if report.timed_out {
        warn!("deadline reached during enrichment, skipping ranking");
        return Ok(records);
    }

    let ranking = rank(
        &records,
        &request.prompt,
        enricher.tiers(),
        services.ai,
        &request.enrich.retry,
    );
    let ranked = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, ranking).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("deadline reached during ranking, results left unranked");
                None
            }
        },
        None => ranking.await?,
    };

    if let Some(ranked) = ranked {
        annotate(&mut records, &ranked);
    }

    info!(
        places = records.len(),
        recommended = records.iter().filter(|r| r.ranking.is_some()).count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "pipeline complete"
    );
    Ok(records)
}
