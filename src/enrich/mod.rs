//! Per-record enrichment with AI summaries and image captions.
//!
//! Every AI call goes through one batch-wide semaphore, so the number of
//! requests in flight never exceeds `max_in_flight` no matter how many
//! records or photos a batch carries. A permit is held for the whole life of
//! a call, retries and backoff sleeps included.

pub mod prompts;
pub mod reviews;

use std::collections::BTreeSet;
use std::future::Future;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures::future::try_join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::ai::retry::{Reply, RetryPolicy, settle, with_backoff};
use crate::ai::{AiError, CompletionRequest, CompletionService};
use crate::places::{ImageSource, MediaError};
use crate::record::{Enrichment, Photo, PhotoInsight, PlaceRecord};

pub const STREET_VIEW_MISSING: &str = "Street view is not provided";

/// Optional enrichment categories. Basic identity fields are always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum Tier {
    Reviews,
    Photos,
}

pub type Tiers = BTreeSet<Tier>;

#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub tiers: Tiers,
    pub max_in_flight: usize,
    pub retry: RetryPolicy,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            tiers: Tiers::new(),
            max_in_flight: 25,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInsights {
    pub summary: String,
    pub rating: String,
    pub span: String,
}

/// Outcome of one batch. `completed < total` only when the deadline cut the
/// batch short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichReport {
    pub total: usize,
    pub completed: usize,
    pub timed_out: bool,
}

/// Enriches records under one shared concurrency limit. After a batch
/// fails with a fatal error the limit is closed, and every later call on the
/// same enricher fails with [`AiError::LimiterClosed`] without reaching the
/// service.
pub struct Enricher<'a, C, I> {
    completion: &'a C,
    images: &'a I,
    limiter: Semaphore,
    config: EnrichConfig,
}

impl<'a, C: CompletionService, I: ImageSource> Enricher<'a, C, I> {
    pub fn new(completion: &'a C, images: &'a I, config: EnrichConfig) -> Self {
        Self {
            completion,
            images,
            limiter: Semaphore::new(config.max_in_flight.max(1)),
            config,
        }
    }

    pub fn tiers(&self) -> &Tiers {
        &self.config.tiers
    }

    async fn permit(&self) -> Result<SemaphorePermit<'_>, AiError> {
        self.limiter.acquire().await.map_err(|_| AiError::LimiterClosed)
    }

    /// Retries and settles one call. The caller must already hold a permit.
    async fn attempt(&self, label: &str, request: &CompletionRequest) -> Result<Reply, AiError> {
        let completion = self.completion;
        let result =
            with_backoff(&self.config.retry, label, move || completion.complete(request)).await;
        if let Err(e) = &result
            && !e.is_fatal()
        {
            warn!(call = label, error = %e, "AI call degraded to placeholder");
        }
        settle(result)
    }

    async fn call(&self, label: &str, request: CompletionRequest) -> Result<Reply, AiError> {
        let _permit = self.permit().await?;
        self.attempt(label, &request).await
    }

    /// Rewrites free-text keywords into a neutral vision instruction. Blank
    /// keywords, or a call that only produced a placeholder, yield the
    /// default instruction.
    pub async fn build_safe_prompt(&self, keywords: &str) -> Result<String, AiError> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Ok(prompts::DEFAULT_VISION_PROMPT.to_string());
        }
        let reply = self.call("safe_prompt", prompts::safe_prompt(keywords)).await?;
        if reply.degraded {
            warn!("safe prompt unavailable, using default vision prompt");
            return Ok(prompts::DEFAULT_VISION_PROMPT.to_string());
        }
        Ok(reply.text)
    }

    pub async fn summarize_reviews(&self, record: &PlaceRecord) -> Result<ReviewInsights, AiError> {
        let reviews = record.reviews.value().map(Vec::as_slice).unwrap_or_default();
        let texts: Vec<&str> = reviews
            .iter()
            .filter_map(|r| r.text.value())
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty())
            .collect();

        let summary = if texts.is_empty() {
            prompts::NO_REVIEWS.to_string()
        } else {
            self.call("review_summary", prompts::review_summary(&texts))
                .await?
                .text
        };

        Ok(ReviewInsights {
            summary,
            rating: reviews::rating_summary(reviews),
            span: reviews::review_span(reviews),
        })
    }

    pub async fn caption_photo(&self, photo: &Photo, prompt: &str) -> Result<PhotoInsight, AiError> {
        let handle = photo.name.value().map(String::as_str);
        let fetch = async {
            match handle {
                Some(handle) => self.images.fetch_photo(handle).await,
                None => Err(MediaError::MissingHandle),
            }
        };
        let reply = self.caption_image("photo_caption", fetch, prompt).await?;
        Ok(PhotoInsight {
            insight: reply.text,
            url: photo.url.clone(),
            degraded: reply.degraded,
        })
    }

    /// Looks the place up by coordinate, falling back to its address.
    pub async fn caption_street_view(
        &self,
        record: &PlaceRecord,
        prompt: &str,
    ) -> Result<String, AiError> {
        let identity = &record.identity;
        let location = match (identity.latitude.value(), identity.longitude.value()) {
            (Some(lat), Some(lng)) => Some(format!("{lat},{lng}")),
            _ => identity.address.value().cloned(),
        };
        let Some(location) = location else {
            return Ok(STREET_VIEW_MISSING.to_string());
        };

        let fetch = self.images.fetch_street_view(&location);
        Ok(self.caption_image("street_view", fetch, prompt).await?.text)
    }

    async fn caption_image(
        &self,
        label: &str,
        fetch: impl Future<Output = Result<Vec<u8>, MediaError>>,
        prompt: &str,
    ) -> Result<Reply, AiError> {
        let _permit = self.permit().await?;
        let bytes = match fetch.await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(call = label, error = %e, "image fetch failed");
                return Ok(Reply::degraded(format!("Image could not be retrieved: {e}")));
            }
        };
        let request = prompts::caption(prompt, STANDARD.encode(bytes));
        self.attempt(label, &request).await
    }

    /// One paragraph over all real captions; placeholders are left out.
    pub async fn summarize_photos(&self, insights: &[PhotoInsight]) -> Result<String, AiError> {
        let captions: Vec<&str> = insights
            .iter()
            .filter(|i| !i.degraded)
            .map(|i| i.insight.as_str())
            .collect();
        if captions.is_empty() {
            return Ok(prompts::NO_IMAGES.to_string());
        }
        Ok(self
            .call("photo_summary", prompts::photo_summary(&captions))
            .await?
            .text)
    }

    /// Computes every requested tier for one record. Only fatal errors
    /// escape; everything else is folded into placeholder text.
    pub async fn enrich_record(
        &self,
        record: &PlaceRecord,
        vision_prompt: &str,
    ) -> Result<Enrichment, AiError> {
        let tiers = &self.config.tiers;

        let reviews = async {
            if tiers.contains(&Tier::Reviews) {
                self.summarize_reviews(record).await.map(Some)
            } else {
                Ok(None)
            }
        };

        let photos = async {
            if !tiers.contains(&Tier::Photos) {
                return Ok(None);
            }
            let photos = record.photos.value().map(Vec::as_slice).unwrap_or_default();
            let (insights, street_view) = futures::try_join!(
                try_join_all(photos.iter().map(|p| self.caption_photo(p, vision_prompt))),
                self.caption_street_view(record, vision_prompt),
            )?;
            let summary = self.summarize_photos(&insights).await?;
            Ok::<_, AiError>(Some((insights, summary, street_view)))
        };

        let (reviews, photos) = futures::try_join!(reviews, photos)?;

        let mut enrichment = Enrichment::default();
        if let Some(r) = reviews {
            enrichment.review_summary = Some(r.summary);
            enrichment.rating_summary = Some(r.rating);
            enrichment.review_span = Some(r.span);
        }
        if let Some((insights, summary, street_view)) = photos {
            enrichment.photo_insights = Some(insights);
            enrichment.photo_summary = Some(summary);
            enrichment.street_view_insight = Some(street_view);
            enrichment.prompt_used = Some(vision_prompt.to_string());
        }
        Ok(enrichment)
    }

    /// Enriches every record concurrently and writes results back by index,
    /// so output order is input order regardless of completion order.
    ///
    /// When `deadline` passes, in-flight work is dropped and the records
    /// finished so far keep their results. A fatal error aborts the batch.
    pub async fn enrich_batch(
        &self,
        records: &mut [PlaceRecord],
        keywords: &str,
        deadline: Option<Instant>,
    ) -> Result<EnrichReport, AiError> {
        let total = records.len();
        if self.config.tiers.is_empty() {
            debug!(total, "no enrichment tiers requested");
            return Ok(EnrichReport {
                total,
                completed: total,
                timed_out: false,
            });
        }

        info!(total, tiers = ?self.config.tiers, max_in_flight = self.config.max_in_flight, "enriching records");

        let mut slots: Vec<Option<Enrichment>> = vec![None; total];
        let shared: &[PlaceRecord] = records;
        let work = async {
            let vision_prompt = if self.config.tiers.contains(&Tier::Photos) {
                self.build_safe_prompt(keywords).await?
            } else {
                String::new()
            };
            let prompt = vision_prompt.as_str();

            let mut pending: FuturesUnordered<_> = shared
                .iter()
                .enumerate()
                .map(|(index, record)| async move {
                    (index, self.enrich_record(record, prompt).await)
                })
                .collect();

            while let Some((index, result)) = pending.next().await {
                match result {
                    Ok(enrichment) => {
                        debug!(index, place = shared[index].label(), "record enriched");
                        slots[index] = Some(enrichment);
                    }
                    Err(e) => {
                        warn!(index, error = %e, "fatal error, aborting batch");
                        return Err(e);
                    }
                }
            }
            Ok(())
        };

        let outcome = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, work).await {
                Ok(result) => result.map(|()| false),
                Err(_) => Ok(true),
            },
            None => work.await.map(|()| false),
        };
        let timed_out = match outcome {
            Ok(timed_out) => timed_out,
            Err(e) => {
                if e.is_fatal() {
                    self.limiter.close();
                }
                return Err(e);
            }
        };

        let mut completed = 0;
        for (record, slot) in records.iter_mut().zip(slots) {
            if let Some(enrichment) = slot {
                record.enrichment = enrichment;
                completed += 1;
            }
        }

        if timed_out {
            warn!(total, completed, "enrichment deadline reached, returning partial results");
        } else {
            info!(total, "enrichment complete");
        }
        Ok(EnrichReport {
            total,
            completed,
            timed_out,
        })
    }
}
