//! Fixtures and mock collaborators shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::ai::{AiError, CompletionRequest, CompletionService};
use crate::normalize::normalize;
use crate::places::types::{AuthorAttribution, LatLng, LocalizedText, RawPhoto, RawPlace, RawReview};
use crate::places::{ImageSource, MediaError};
use crate::record::PlaceRecord;
use crate::translate::Glossary;

fn text(value: &str) -> Option<LocalizedText> {
    Some(LocalizedText {
        text: Some(value.to_string()),
        language_code: Some("en".to_string()),
    })
}

/// A place named `name` with one review per entry of `reviews` and one photo
/// handle per entry of `photos`.
pub fn raw_place(name: &str, reviews: &[&str], photos: &[&str]) -> RawPlace {
    RawPlace {
        id: Some(format!("id-{name}")),
        display_name: text(name),
        formatted_address: Some(format!("{name} street 1")),
        location: Some(LatLng {
            latitude: Some(44.97),
            longitude: Some(-93.26),
        }),
        reviews: Some(
            reviews
                .iter()
                .enumerate()
                .map(|(i, r)| RawReview {
                    text: text(r),
                    original_text: text(r),
                    rating: Some(4),
                    publish_time: Some(format!("2024-01-{:02}T10:00:00Z", i + 1)),
                    author_attribution: Some(AuthorAttribution {
                        display_name: Some(format!("author {i}")),
                        uri: None,
                    }),
                    ..RawReview::default()
                })
                .collect(),
        ),
        photos: Some(
            photos
                .iter()
                .map(|p| RawPhoto {
                    name: Some(p.to_string()),
                    google_maps_uri: Some(format!("https://maps.example/{p}")),
                })
                .collect(),
        ),
        ..RawPlace::default()
    }
}

pub fn record(name: &str, reviews: &[&str], photos: &[&str]) -> PlaceRecord {
    normalize(&raw_place(name, reviews, photos), &Glossary::default())
}

type Behavior = fn(&CompletionRequest) -> Result<String, AiError>;
type Latency = fn(&CompletionRequest) -> Duration;

/// Completion service driven by a response function. Tracks call count and
/// the peak number of concurrent calls.
pub struct ScriptedAi {
    behavior: Behavior,
    latency: Latency,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl ScriptedAi {
    pub fn new(behavior: Behavior) -> Self {
        Self::with_latency(behavior, |_| Duration::ZERO)
    }

    pub fn with_latency(behavior: Behavior, latency: Latency) -> Self {
        Self {
            behavior,
            latency,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Echoes the user content back, so callers can tell which record a
    /// result came from.
    pub fn echo() -> Self {
        Self::new(|req| Ok(format!("echo: {}", req.user)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionService for ScriptedAi {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let latency = (self.latency)(request);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.behavior)(request)
    }
}

/// Serves fixed bytes for every handle; handles starting with `broken` fail.
pub struct StaticImages;

impl ImageSource for StaticImages {
    async fn fetch_photo(&self, handle: &str) -> Result<Vec<u8>, MediaError> {
        if handle.starts_with("broken") {
            return Err(MediaError::Status(404));
        }
        Ok(b"jpeg".to_vec())
    }

    async fn fetch_street_view(&self, _location: &str) -> Result<Vec<u8>, MediaError> {
        Ok(b"street".to_vec())
    }
}
