//! Raw search result → [`PlaceRecord`] mapping.
//!
//! Each attribute is extracted on its own; a missing attribute becomes its
//! sentinel instead of failing the record.

use crate::places::types::{LocalizedText, RawPhoto, RawPlace, RawReview};
use crate::record::{DisplayName, Enrichment, Field, Identity, Photo, PlaceRecord, Review};
use crate::translate::Glossary;

pub const NAME_MISSING: &str = "Name is not provided";
pub const TYPE_MISSING: &str = "Type is not provided";
pub const WEBSITE_MISSING: &str = "Website is not provided";
pub const MAPS_URL_MISSING: &str = "Google maps url is not provided";
pub const PHONE_MISSING: &str = "Phone number is not provided";
pub const ADDRESS_MISSING: &str = "Address is not provided";
pub const LATITUDE_MISSING: &str = "Latitude is not provided";
pub const LONGITUDE_MISSING: &str = "Longitude is not provided";
pub const HOURS_MISSING: &str = "Working hours are not provided";
pub const REVIEWS_MISSING: &str = "Reviews are not provided";
pub const PHOTOS_MISSING: &str = "Photos are not provided";
pub const PHOTOS_URL_MISSING: &str = "Photos url is not provided";

const AUTHOR_MISSING: &str = "Author is not provided";
const AUTHOR_URL_MISSING: &str = "Author url is not provided";
const TEXT_MISSING: &str = "Review text is not provided";
const ORIGINAL_TEXT_MISSING: &str = "Original text is not provided";
const LANGUAGE_MISSING: &str = "Original language is not provided";
const RATING_MISSING: &str = "Rating is not provided";
const PUBLISH_TIME_MISSING: &str = "Publish time is not provided";
const PUBLISH_DATE_MISSING: &str = "Publish date is not provided";
const REVIEW_URL_MISSING: &str = "Review url is not provided";
const PHOTO_NAME_MISSING: &str = "Photo name is not provided";
const PHOTO_URL_MISSING: &str = "Photo url is not provided";

pub fn normalize(raw: &RawPlace, glossary: &Glossary) -> PlaceRecord {
    let location = raw.location.as_ref();

    let identity = Identity {
        name: Field::from_option(
            localized(raw.display_name.as_ref()).map(|n| display_name(n, glossary)),
            NAME_MISSING,
        ),
        category: Field::from_option(
            raw.types.as_ref().and_then(|t| t.first()).cloned(),
            TYPE_MISSING,
        ),
        website: Field::from_option(raw.website_uri.clone(), WEBSITE_MISSING),
        google_maps_url: Field::from_option(raw.google_maps_uri.clone(), MAPS_URL_MISSING),
        phone_number: Field::from_option(raw.national_phone_number.clone(), PHONE_MISSING),
        address: Field::from_option(raw.formatted_address.clone(), ADDRESS_MISSING),
        latitude: Field::from_option(location.and_then(|l| l.latitude), LATITUDE_MISSING),
        longitude: Field::from_option(location.and_then(|l| l.longitude), LONGITUDE_MISSING),
    };

    let working_hours = Field::from_option(
        raw.regular_opening_hours
            .as_ref()
            .and_then(|h| h.weekday_descriptions.clone()),
        HOURS_MISSING,
    );

    let reviews: Field<Vec<Review>> = Field::from_option(
        non_empty(raw.reviews.as_deref())
            .map(|reviews| reviews.iter().map(|r| review(r, glossary)).collect()),
        REVIEWS_MISSING,
    );

    let photos_list = non_empty(raw.photos.as_deref());
    let photos_url = Field::from_option(
        photos_list
            .and_then(|p| p.first())
            .and_then(|p| p.google_maps_uri.clone()),
        PHOTOS_URL_MISSING,
    );
    let photos: Field<Vec<Photo>> = Field::from_option(
        photos_list.map(|photos| photos.iter().map(photo).collect()),
        PHOTOS_MISSING,
    );

    PlaceRecord {
        identity,
        working_hours,
        reviews,
        photos,
        photos_url,
        enrichment: Enrichment::default(),
        ranking: None,
    }
}

/// Every string the normalizer would translate, in source order.
pub fn translatable_terms(places: &[RawPlace]) -> Vec<&str> {
    let mut terms = Vec::new();
    for place in places {
        if let Some(name) = localized(place.display_name.as_ref()) {
            terms.push(name);
        }
        for review in place.reviews.iter().flatten() {
            if let Some(author) = author_name(review) {
                terms.push(author);
            }
        }
    }
    terms
}

fn review(raw: &RawReview, glossary: &Glossary) -> Review {
    Review {
        author_name: Field::from_option(
            author_name(raw).map(|a| display_name(a, glossary)),
            AUTHOR_MISSING,
        ),
        author_url: Field::from_option(
            raw.author_attribution.as_ref().and_then(|a| a.uri.clone()),
            AUTHOR_URL_MISSING,
        ),
        text: Field::from_option(localized(raw.text.as_ref()).map(str::to_string), TEXT_MISSING),
        original_text: Field::from_option(
            localized(raw.original_text.as_ref()).map(str::to_string),
            ORIGINAL_TEXT_MISSING,
        ),
        original_language: Field::from_option(
            raw.original_text
                .as_ref()
                .and_then(|t| t.language_code.clone()),
            LANGUAGE_MISSING,
        ),
        rating: Field::from_option(raw.rating, RATING_MISSING),
        publish_time: Field::from_option(raw.publish_time.clone(), PUBLISH_TIME_MISSING),
        publish_date: Field::from_option(
            raw.relative_publish_time_description.clone(),
            PUBLISH_DATE_MISSING,
        ),
        review_url: Field::from_option(raw.google_maps_uri.clone(), REVIEW_URL_MISSING),
    }
}

fn photo(raw: &RawPhoto) -> Photo {
    Photo {
        name: Field::from_option(raw.name.clone(), PHOTO_NAME_MISSING),
        url: Field::from_option(raw.google_maps_uri.clone(), PHOTO_URL_MISSING),
    }
}

fn display_name(original: &str, glossary: &Glossary) -> DisplayName {
    DisplayName {
        original_name: original.to_string(),
        translated_name: glossary.translate(original),
    }
}

fn author_name(review: &RawReview) -> Option<&str> {
    review
        .author_attribution
        .as_ref()
        .and_then(|a| a.display_name.as_deref())
}

fn localized(text: Option<&LocalizedText>) -> Option<&str> {
    text.and_then(|t| t.text.as_deref())
}

fn non_empty<T>(items: Option<&[T]>) -> Option<&[T]> {
    items.filter(|i| !i.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_place() -> RawPlace {
        serde_json::from_value(serde_json::json!({
            "id": "p1",
            "displayName": {"text": "Café Lola", "languageCode": "es"},
            "types": ["cafe", "restaurant"],
            "websiteUri": "https://lola.example",
            "googleMapsUri": "https://maps.example/p1",
            "nationalPhoneNumber": "(612) 555-0100",
            "formattedAddress": "1 Main St",
            "location": {"latitude": 44.97, "longitude": -93.26},
            "regularOpeningHours": {"weekdayDescriptions": ["Monday: 8 AM – 5 PM"]},
            "reviews": [{
                "googleMapsUri": "https://maps.example/r1",
                "relativePublishTimeDescription": "a month ago",
                "rating": 5,
                "text": {"text": "Great espresso", "languageCode": "en"},
                "originalText": {"text": "Excelente espresso", "languageCode": "es"},
                "authorAttribution": {"displayName": "José", "uri": "https://maps.example/u1"},
                "publishTime": "2024-05-01T10:00:00Z"
            }],
            "photos": [
                {"name": "places/p1/photos/a", "googleMapsUri": "https://maps.example/ph1"},
                {"name": "places/p1/photos/b"}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn normalizes_full_record() {
        let glossary: Glossary = [("Café Lola".to_string(), "Cafe Lola".to_string())]
            .into_iter()
            .collect();
        let record = normalize(&full_place(), &glossary);

        let name = record.identity.name.value().unwrap();
        assert_eq!(name.original_name, "Café Lola");
        assert_eq!(name.translated_name, "Cafe Lola");
        assert_eq!(record.identity.category, Field::Value("cafe".to_string()));
        assert_eq!(record.identity.latitude, Field::Value(44.97));
        assert_eq!(record.photos_url, Field::Value("https://maps.example/ph1".into()));

        let reviews = record.reviews.value().unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].text, Field::Value("Great espresso".into()));
        assert_eq!(reviews[0].original_language, Field::Value("es".into()));
        assert_eq!(reviews[0].rating, Field::Value(5));
        // Author not in glossary: translation falls back to the original.
        assert_eq!(
            reviews[0].author_name.value().unwrap().translated_name,
            "José"
        );

        let photos = record.photos.value().unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[1].url, Field::NotProvided(PHOTO_URL_MISSING));
    }

    #[test]
    fn empty_place_gets_every_sentinel() {
        let record = normalize(&RawPlace::default(), &Glossary::default());

        assert_eq!(record.identity.name, Field::NotProvided(NAME_MISSING));
        assert_eq!(record.identity.category, Field::NotProvided(TYPE_MISSING));
        assert_eq!(record.identity.website, Field::NotProvided(WEBSITE_MISSING));
        assert_eq!(record.identity.google_maps_url, Field::NotProvided(MAPS_URL_MISSING));
        assert_eq!(record.identity.phone_number, Field::NotProvided(PHONE_MISSING));
        assert_eq!(record.identity.address, Field::NotProvided(ADDRESS_MISSING));
        assert_eq!(record.identity.latitude, Field::NotProvided(LATITUDE_MISSING));
        assert_eq!(record.identity.longitude, Field::NotProvided(LONGITUDE_MISSING));
        assert_eq!(record.working_hours, Field::NotProvided(HOURS_MISSING));
        assert_eq!(record.reviews, Field::NotProvided(REVIEWS_MISSING));
        assert_eq!(record.photos, Field::NotProvided(PHOTOS_MISSING));
        assert_eq!(record.photos_url, Field::NotProvided(PHOTOS_URL_MISSING));
        assert!(record.ranking.is_none());
    }

    #[test]
    fn each_missing_field_is_independent() {
        let mut place = full_place();
        place.location = Some(crate::places::types::LatLng {
            latitude: Some(1.5),
            longitude: None,
        });
        place.website_uri = None;
        place.types = Some(vec![]);

        let record = normalize(&place, &Glossary::default());

        assert_eq!(record.identity.latitude, Field::Value(1.5));
        assert_eq!(record.identity.longitude, Field::NotProvided(LONGITUDE_MISSING));
        assert_eq!(record.identity.website, Field::NotProvided(WEBSITE_MISSING));
        assert_eq!(record.identity.category, Field::NotProvided(TYPE_MISSING));
        assert!(record.identity.name.is_provided());
        assert!(record.reviews.is_provided());
    }

    #[test]
    fn display_name_without_text_is_missing() {
        let mut place = full_place();
        place.display_name = Some(LocalizedText {
            text: None,
            language_code: Some("en".into()),
        });
        let record = normalize(&place, &Glossary::default());
        assert_eq!(record.identity.name, Field::NotProvided(NAME_MISSING));
    }

    #[test]
    fn empty_review_and_photo_lists_are_missing() {
        let mut place = full_place();
        place.reviews = Some(vec![]);
        place.photos = Some(vec![]);
        let record = normalize(&place, &Glossary::default());
        assert_eq!(record.reviews, Field::NotProvided(REVIEWS_MISSING));
        assert_eq!(record.photos, Field::NotProvided(PHOTOS_MISSING));
    }

    #[test]
    fn review_with_no_fields_gets_sentinels() {
        let mut place = full_place();
        place.reviews = Some(vec![RawReview::default()]);
        let record = normalize(&place, &Glossary::default());

        let review = &record.reviews.value().unwrap()[0];
        assert_eq!(review.text, Field::NotProvided(TEXT_MISSING));
        assert_eq!(review.rating, Field::NotProvided(RATING_MISSING));
        assert_eq!(review.author_name, Field::NotProvided(AUTHOR_MISSING));
    }

    #[test]
    fn normalize_is_idempotent() {
        let glossary: Glossary = [("José".to_string(), "Jose".to_string())]
            .into_iter()
            .collect();
        for place in [full_place(), RawPlace::default()] {
            let first = normalize(&place, &glossary);
            let second = normalize(&place, &glossary);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn missing_fields_serialize_as_sentinel_strings() {
        let record = normalize(&RawPlace::default(), &Glossary::default());
        let json = serde_json::to_value(&record).unwrap();

        for (key, sentinel) in [
            ("name", NAME_MISSING),
            ("type", TYPE_MISSING),
            ("latitude", LATITUDE_MISSING),
            ("working_hours", HOURS_MISSING),
            ("reviews", REVIEWS_MISSING),
            ("photos", PHOTOS_MISSING),
        ] {
            assert_eq!(json[key], sentinel, "key {key}");
        }
        assert!(json.get("recommended").is_none());
    }

    #[test]
    fn translatable_terms_cover_names_and_authors() {
        let places = vec![full_place(), RawPlace::default()];
        assert_eq!(translatable_terms(&places), vec!["Café Lola", "José"]);
    }
}
