//! Place-search transport: text search pages, photo media and Street View images.

pub mod paginate;
pub mod types;

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{self, ApiKey};
use types::{LocationRestriction, RawPage, SearchQuery, TextSearchBody, TextSearchResponse};

const PLACES_API_BASE: &str = "https://places.googleapis.com/v1";
const STREET_VIEW_URL: &str = "https://maps.googleapis.com/maps/api/streetview";
const PHOTO_MAX_WIDTH_PX: &str = "800";
const PHOTO_MAX_HEIGHT_PX: &str = "600";
const STREET_VIEW_SIZE: &str = "600x400";
const MAX_IMAGE_BYTES: usize = 10_000_000;

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("GOOGLE_MAPS_API_KEY not set")]
    ApiKeyNotSet,

    #[error("Places API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("malformed search page: {0}")]
    Malformed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("photo handle is empty")]
    MissingHandle,

    #[error("no location to fetch a street view for")]
    MissingLocation,

    #[error("invalid image URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("image fetch failed: status {0}")]
    Status(u16),

    #[error("image too large (>{} bytes)", MAX_IMAGE_BYTES)]
    TooLarge,

    #[error("image fetch failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// One round trip to the search API. Errors are returned verbatim; the
/// paginator does not retry.
pub trait SearchTransport {
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        cursor: Option<&str>,
    ) -> Result<RawPage, PlacesError>;
}

/// Raw image bytes used as captioning input. Nothing is retained.
pub trait ImageSource {
    async fn fetch_photo(&self, handle: &str) -> Result<Vec<u8>, MediaError>;

    /// `location` is `"lat,lng"` or a free-form address.
    async fn fetch_street_view(&self, location: &str) -> Result<Vec<u8>, MediaError>;
}

/// Client for the Places API (New) and the Street View static API.
#[derive(Clone)]
pub struct PlacesClient {
    http: Client,
    api_key: ApiKey,
    places_base: String,
    street_view_url: String,
}

impl PlacesClient {
    pub fn from_env(http: Client) -> Result<Self, PlacesError> {
        let api_key = config::read_key("GOOGLE_MAPS_API_KEY").ok_or(PlacesError::ApiKeyNotSet)?;
        Ok(Self::new(http, api_key))
    }

    pub fn new(http: Client, api_key: ApiKey) -> Self {
        Self {
            http,
            api_key,
            places_base: PLACES_API_BASE.to_string(),
            street_view_url: STREET_VIEW_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            places_base: base_url.to_string(),
            street_view_url: format!("{base_url}/streetview"),
        }
    }
}

impl SearchTransport for PlacesClient {
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        cursor: Option<&str>,
    ) -> Result<RawPage, PlacesError> {
        let url = format!("{}/places:searchText", self.places_base);
        let body = TextSearchBody {
            text_query: &query.text,
            location_restriction: LocationRestriction {
                rectangle: query.bounds,
            },
            page_token: cursor,
        };

        let response = self
            .http
            .post(&url)
            .header("X-Goog-Api-Key", self.api_key.expose())
            .header("X-Goog-FieldMask", &query.field_mask)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let snippet = if text.len() > 200 {
                &text[..text.floor_char_boundary(200)]
            } else {
                &text
            };
            warn!(status = %status, "Places search error");
            return Err(PlacesError::Api {
                code: status.as_u16(),
                message: format!("HTTP {status}: {snippet}"),
            });
        }

        let page: TextSearchResponse =
            serde_json::from_str(&text).map_err(|e| PlacesError::Malformed(e.to_string()))?;
        debug!(
            places = page.places.len(),
            has_next = page.next_page_token.is_some(),
            "search page received"
        );

        Ok(RawPage {
            items: page.places,
            next_cursor: page.next_page_token,
        })
    }
}

impl ImageSource for PlacesClient {
    async fn fetch_photo(&self, handle: &str) -> Result<Vec<u8>, MediaError> {
        let handle = handle.trim_matches('/');
        if handle.is_empty() {
            return Err(MediaError::MissingHandle);
        }
        let mut url = url::Url::parse(&format!("{}/{handle}/media", self.places_base))?;
        url.query_pairs_mut()
            .append_pair("key", self.api_key.expose())
            .append_pair("maxWidthPx", PHOTO_MAX_WIDTH_PX)
            .append_pair("maxHeightPx", PHOTO_MAX_HEIGHT_PX);
        download(&self.http, url).await
    }

    async fn fetch_street_view(&self, location: &str) -> Result<Vec<u8>, MediaError> {
        if location.trim().is_empty() {
            return Err(MediaError::MissingLocation);
        }
        let mut url = url::Url::parse(&self.street_view_url)?;
        url.query_pairs_mut()
            .append_pair("size", STREET_VIEW_SIZE)
            .append_pair("location", location)
            .append_pair("key", self.api_key.expose());
        download(&self.http, url).await
    }
}

// URLs carry the API key, so only the status is ever logged.
async fn download(client: &Client, url: url::Url) -> Result<Vec<u8>, MediaError> {
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        debug!(status = %status, "image fetch rejected");
        return Err(MediaError::Status(status.as_u16()));
    }

    if let Some(len) = response.content_length()
        && len as usize > MAX_IMAGE_BYTES
    {
        return Err(MediaError::TooLarge);
    }

    let mut body = Vec::new();
    let mut stream = response;
    while let Some(chunk) = stream.chunk().await? {
        body.extend_from_slice(&chunk);
        if body.len() > MAX_IMAGE_BYTES {
            return Err(MediaError::TooLarge);
        }
    }
    Ok(body)
}
