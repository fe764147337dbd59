use tracing::debug;

use super::types::{RawPlace, SearchQuery};
use super::{PlacesError, SearchTransport};

/// Follows continuation cursors until the transport reports none and returns
/// every item in page-arrival order. The first failing page aborts the whole
/// collection: a broken cursor invalidates everything after it.
pub async fn collect_pages(
    transport: &impl SearchTransport,
    query: &SearchQuery,
) -> Result<Vec<RawPlace>, PlacesError> {
    let mut places = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = transport.fetch_page(query, cursor.as_deref()).await?;
        pages += 1;
        places.extend(page.items);

        // An empty token is how some proxies spell "no more pages".
        match page.next_cursor.filter(|c| !c.is_empty()) {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!(pages, places = places.len(), "pagination complete");
    Ok(places)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::places::types::{RawPage, Rectangle};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct MockTransport {
        pages: Mutex<VecDeque<Result<RawPage, PlacesError>>>,
        cursors: Mutex<Vec<Option<String>>>,
    }

    impl MockTransport {
        fn new(pages: Vec<Result<RawPage, PlacesError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn seen_cursors(&self) -> Vec<Option<String>> {
            self.cursors.lock().unwrap().clone()
        }
    }

    impl SearchTransport for MockTransport {
        async fn fetch_page(
            &self,
            _query: &SearchQuery,
            cursor: Option<&str>,
        ) -> Result<RawPage, PlacesError> {
            self.cursors.lock().unwrap().push(cursor.map(str::to_string));
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PlacesError::Malformed("no more mock pages".into())))
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> RawPage {
        RawPage {
            items: ids
                .iter()
                .map(|id| RawPlace {
                    id: Some((*id).to_string()),
                    ..Default::default()
                })
                .collect(),
            next_cursor: next.map(str::to_string),
        }
    }

    fn query() -> SearchQuery {
        SearchQuery::new("tacos", Rectangle::from_corners((0.0, 0.0), (1.0, 1.0)))
    }

    fn ids(places: &[RawPlace]) -> Vec<&str> {
        places.iter().filter_map(|p| p.id.as_deref()).collect()
    }

    #[tokio::test]
    async fn concatenates_all_pages_in_order() {
        let transport = MockTransport::new(vec![
            Ok(page(&["a", "b"], Some("t1"))),
            Ok(page(&["c"], Some("t2"))),
            Ok(page(&["d", "e", "f"], None)),
        ]);

        let places = collect_pages(&transport, &query()).await.unwrap();

        assert_eq!(places.len(), 6);
        assert_eq!(ids(&places), vec!["a", "b", "c", "d", "e", "f"]);
        assert_eq!(
            transport.seen_cursors(),
            vec![None, Some("t1".into()), Some("t2".into())]
        );
    }

    #[tokio::test]
    async fn single_page_without_cursor() {
        let transport = MockTransport::new(vec![Ok(page(&["a"], None))]);
        let places = collect_pages(&transport, &query()).await.unwrap();
        assert_eq!(ids(&places), vec!["a"]);
        assert_eq!(transport.seen_cursors().len(), 1);
    }

    #[tokio::test]
    async fn empty_cursor_ends_pagination() {
        let transport = MockTransport::new(vec![Ok(page(&["a"], Some("")))]);
        let places = collect_pages(&transport, &query()).await.unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(transport.seen_cursors().len(), 1);
    }

    #[tokio::test]
    async fn does_not_deduplicate() {
        let transport = MockTransport::new(vec![
            Ok(page(&["a"], Some("t1"))),
            Ok(page(&["a"], None)),
        ]);
        let places = collect_pages(&transport, &query()).await.unwrap();
        assert_eq!(ids(&places), vec!["a", "a"]);
    }

    #[tokio::test]
    async fn mid_pagination_failure_returns_error_not_partial() {
        let transport = MockTransport::new(vec![
            Ok(page(&["a", "b"], Some("t1"))),
            Err(PlacesError::Api {
                code: 400,
                message: "invalid page token".into(),
            }),
            Ok(page(&["never"], None)),
        ]);

        let result = collect_pages(&transport, &query()).await;

        match result {
            Err(PlacesError::Api { code: 400, message }) => {
                assert!(message.contains("page token"));
            }
            other => panic!("expected Api(400), got: {other:?}"),
        }
        assert_eq!(transport.seen_cursors().len(), 2);
    }

    #[tokio::test]
    async fn many_pages_do_not_grow_the_stack() {
        let mut pages: Vec<_> = (0..2_000)
            .map(|i| Ok(page(&["x"], Some(format!("t{i}").as_str()))))
            .collect();
        pages.push(Ok(page(&["x"], None)));
        let transport = MockTransport::new(pages);

        let places = collect_pages(&transport, &query()).await.unwrap();
        assert_eq!(places.len(), 2_001);
    }
}
