//! Rough time and cost forecast for enriching a result set, per tier.

use serde::Serialize;

const BASIC_SECS: u64 = 5;
const REVIEW_SECS_PER_PLACE: u64 = 2;
const PHOTO_SECS_PER_PLACE: u64 = 34;
const REVIEW_CENTS_PER_PLACE: u64 = 2;
const PHOTO_CENTS_PER_PLACE: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub places: usize,
    pub basic_time: u64,
    pub basic_cost: f64,
    pub reviews_time: u64,
    pub reviews_cost: f64,
    pub photos_time: u64,
    pub photos_cost: f64,
    pub time_everything: u64,
    pub cost_everything: f64,
}

/// Times are seconds, costs dollars. Costs are computed in whole cents so
/// they never carry float noise.
pub fn estimate(places: usize) -> Estimate {
    let n = places as u64;
    let dollars = |cents: u64| cents as f64 / 100.0;

    Estimate {
        places,
        basic_time: BASIC_SECS,
        basic_cost: 0.0,
        reviews_time: REVIEW_SECS_PER_PLACE * n,
        reviews_cost: dollars(REVIEW_CENTS_PER_PLACE * n),
        photos_time: PHOTO_SECS_PER_PLACE * n,
        photos_cost: dollars(PHOTO_CENTS_PER_PLACE * n),
        time_everything: BASIC_SECS + (REVIEW_SECS_PER_PLACE + PHOTO_SECS_PER_PLACE) * n,
        cost_everything: dollars((REVIEW_CENTS_PER_PLACE + PHOTO_CENTS_PER_PLACE) * n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_with_place_count() {
        let e = estimate(60);
        assert_eq!(e.basic_time, 5);
        assert_eq!(e.reviews_time, 120);
        assert_eq!(e.photos_time, 2040);
        assert_eq!(e.time_everything, 5 + 36 * 60);
        assert_eq!(e.reviews_cost, 1.2);
        assert_eq!(e.photos_cost, 12.0);
        assert_eq!(e.cost_everything, 13.2);
    }

    #[test]
    fn empty_search_costs_only_basic_time() {
        let e = estimate(0);
        assert_eq!(e.time_everything, 5);
        assert_eq!(e.cost_everything, 0.0);
    }

    #[test]
    fn serializes_flat() {
        let json = serde_json::to_value(estimate(3)).unwrap();
        assert_eq!(json["places"], 3);
        assert_eq!(json["cost_everything"], 0.66);
    }
}
