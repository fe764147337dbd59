use serde::{Deserialize, Serialize};

/// Fields requested from `places:searchText` for a full enrichment run.
pub const DEFAULT_FIELD_MASK: &str = "places.id,places.displayName,places.types,places.websiteUri,\
places.nationalPhoneNumber,places.formattedAddress,places.location,places.reviews,places.photos,\
places.regularOpeningHours,places.googleMapsUri,nextPageToken";

/// Minimal mask used when only the number of places matters.
pub const COUNT_FIELD_MASK: &str = "places.id,nextPageToken";

/// A text search restricted to a bounding rectangle.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub bounds: Rectangle,
    pub field_mask: String,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, bounds: Rectangle) -> Self {
        Self {
            text: text.into(),
            bounds,
            field_mask: DEFAULT_FIELD_MASK.to_string(),
        }
    }

    pub fn with_field_mask(mut self, mask: impl Into<String>) -> Self {
        self.field_mask = mask.into();
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Rectangle {
    pub low: LatLngLiteral,
    pub high: LatLngLiteral,
}

impl Rectangle {
    /// South-west and north-east corners.
    pub fn from_corners(sw: (f64, f64), ne: (f64, f64)) -> Self {
        Self {
            low: LatLngLiteral {
                latitude: sw.0,
                longitude: sw.1,
            },
            high: LatLngLiteral {
                latitude: ne.0,
                longitude: ne.1,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LatLngLiteral {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextSearchBody<'a> {
    pub text_query: &'a str,
    pub location_restriction: LocationRestriction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LocationRestriction {
    pub rectangle: Rectangle,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextSearchResponse {
    #[serde(default)]
    pub places: Vec<RawPlace>,
    pub next_page_token: Option<String>,
}

/// One page of upstream results. `next_cursor` is `None` on the last page.
#[derive(Debug, Default)]
pub struct RawPage {
    pub items: Vec<RawPlace>,
    pub next_cursor: Option<String>,
}

/// A place exactly as the search API returned it. Every attribute is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlace {
    pub id: Option<String>,
    pub display_name: Option<LocalizedText>,
    pub types: Option<Vec<String>>,
    pub website_uri: Option<String>,
    pub google_maps_uri: Option<String>,
    pub national_phone_number: Option<String>,
    pub formatted_address: Option<String>,
    pub location: Option<LatLng>,
    pub regular_opening_hours: Option<OpeningHours>,
    pub reviews: Option<Vec<RawReview>>,
    pub photos: Option<Vec<RawPhoto>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    pub text: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LatLng {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    pub weekday_descriptions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    pub google_maps_uri: Option<String>,
    pub relative_publish_time_description: Option<String>,
    pub rating: Option<u8>,
    pub text: Option<LocalizedText>,
    pub original_text: Option<LocalizedText>,
    pub author_attribution: Option<AuthorAttribution>,
    pub publish_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorAttribution {
    pub display_name: Option<String>,
    pub uri: Option<String>,
}

/// Photo reference. `name` is the resource handle (`places/{id}/photos/{ref}`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPhoto {
    pub name: Option<String>,
    pub google_maps_uri: Option<String>,
}
