//! Review statistics computed locally, without any AI call.

use chrono::{DateTime, NaiveDate};

use crate::record::Review;

pub const NO_RATINGS: &str = "No ratings available";
pub const NO_REVIEW_DATES: &str = "No review dates available";
pub const TIMESTAMP_ERROR: &str = "Error retrieving timestamp";

/// `"average: {mean} out of {n} reviews"` over the reviews that carry a rating.
/// The mean is printed unrounded, always with a fractional part.
pub fn rating_summary(reviews: &[Review]) -> String {
    let ratings: Vec<u8> = reviews
        .iter()
        .filter_map(|r| r.rating.value().copied())
        .collect();
    if ratings.is_empty() {
        return NO_RATINGS.to_string();
    }
    let total: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    let mean = f64::from(total) / ratings.len() as f64;
    format!("average: {mean:?} out of {} reviews", ratings.len())
}

/// Days between the newest and oldest review. Any unparseable timestamp
/// spoils the whole span.
pub fn review_span(reviews: &[Review]) -> String {
    let stamps: Vec<&String> = reviews
        .iter()
        .filter_map(|r| r.publish_time.value())
        .collect();
    if stamps.is_empty() {
        return NO_REVIEW_DATES.to_string();
    }

    let dates: Result<Vec<NaiveDate>, _> = stamps
        .iter()
        .map(|s| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
        .collect();
    let Ok(dates) = dates else {
        return TIMESTAMP_ERROR.to_string();
    };

    // Non-empty, checked above.
    let (Some(latest), Some(earliest)) = (dates.iter().max(), dates.iter().min()) else {
        return NO_REVIEW_DATES.to_string();
    };
    let days = (*latest - *earliest).num_days();
    format!("latest date: {latest}, earliest date: {earliest}, date difference: {days} days")
}
