//! The enriched place record handed back to callers.
//!
//! Every attribute is either a value or an explicit "not provided" sentinel,
//! so consumers (spreadsheet and KML writers, HTTP handlers) can read any key
//! without checking for absence.

use serde::Serialize;

use crate::rank::ConfidenceLabel;

/// A value, or the sentinel string substituted when the source lacked it.
/// Serializes untagged: consumers see either the value or the sentinel text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field<T> {
    Value(T),
    NotProvided(&'static str),
}

impl<T> Field<T> {
    pub fn from_option(value: Option<T>, sentinel: &'static str) -> Self {
        match value {
            Some(v) => Field::Value(v),
            None => Field::NotProvided(sentinel),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Value(v) => Some(v),
            Field::NotProvided(_) => None,
        }
    }

    pub fn is_provided(&self) -> bool {
        matches!(self, Field::Value(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayName {
    pub original_name: String,
    pub translated_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub name: Field<DisplayName>,
    #[serde(rename = "type")]
    pub category: Field<String>,
    pub website: Field<String>,
    pub google_maps_url: Field<String>,
    pub phone_number: Field<String>,
    pub address: Field<String>,
    pub latitude: Field<f64>,
    pub longitude: Field<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub author_name: Field<DisplayName>,
    pub author_url: Field<String>,
    pub text: Field<String>,
    pub original_text: Field<String>,
    pub original_language: Field<String>,
    pub rating: Field<u8>,
    pub publish_time: Field<String>,
    pub publish_date: Field<String>,
    pub review_url: Field<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photo {
    /// Resource handle used to fetch the image bytes.
    pub name: Field<String>,
    pub url: Field<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoInsight {
    #[serde(rename = "vlm_insight")]
    pub insight: String,
    pub url: Field<String>,
    /// Placeholder text rather than a real caption. Excluded from photo
    /// summaries and ranking.
    #[serde(skip)]
    pub degraded: bool,
}

/// Results attached by the enrichment stage. Fields stay `None` when their
/// tier was not requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Enrichment {
    #[serde(rename = "reviews_summary", skip_serializing_if = "Option::is_none")]
    pub review_summary: Option<String>,
    #[serde(rename = "rating", skip_serializing_if = "Option::is_none")]
    pub rating_summary: Option<String>,
    #[serde(rename = "reviews_span", skip_serializing_if = "Option::is_none")]
    pub review_span: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_insights: Option<Vec<PhotoInsight>>,
    #[serde(rename = "photos_summary", skip_serializing_if = "Option::is_none")]
    pub photo_summary: Option<String>,
    #[serde(rename = "street_view", skip_serializing_if = "Option::is_none")]
    pub street_view_insight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_used: Option<String>,
}

/// Present only on recommended records; absence is the negative case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub recommended: bool,
    #[serde(rename = "similarity_label")]
    pub confidence: ConfidenceLabel,
    #[serde(rename = "similarity_score")]
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceRecord {
    #[serde(flatten)]
    pub identity: Identity,
    pub working_hours: Field<Vec<String>>,
    pub reviews: Field<Vec<Review>>,
    pub photos: Field<Vec<Photo>>,
    #[serde(rename = "url_to_all_photos")]
    pub photos_url: Field<String>,
    #[serde(flatten)]
    pub enrichment: Enrichment,
    #[serde(flatten)]
    pub ranking: Option<Recommendation>,
}

impl PlaceRecord {
    /// Display name for logs.
    pub fn label(&self) -> &str {
        self.identity
            .name
            .value()
            .map(|n| n.original_name.as_str())
            .unwrap_or("<unnamed>")
    }
}
