use estate_cache::EstateCache;
use estate_config::SearchConfig;
use estate_core::{Estate, EstateId};
use estate_geo::{Coordinate, Polygon};
use estate_observability::{CACHE_HITS, CACHE_MISSES, NAZOTTE_SEARCHES};
use estate_storage::EstateRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::SearchError;
use crate::request::{decode_document_request, CoordinatesRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstateSearchResponse {
    pub count: usize,
    pub estates: Vec<Estate>,
}

impl EstateSearchResponse {
    pub fn empty() -> Self {
        Self {
            count: 0,
            estates: Vec::new(),
        }
    }
}

/// Polygon search and id lookups over one store.
///
/// The cache is handed in rather than created here so that several searchers
/// (or several services) can share one.
#[derive(Debug)]
pub struct EstateSearch<S> {
    store: S,
    cache: Arc<EstateCache>,
    config: SearchConfig,
}

impl<S: EstateRepository> EstateSearch<S> {
    pub fn new(store: S, cache: Arc<EstateCache>, config: SearchConfig) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &Arc<EstateCache> {
        &self.cache
    }

    /// Polygon search capped at the configured nazotte limit.
    pub async fn nazotte(
        &self,
        request: CoordinatesRequest,
    ) -> Result<EstateSearchResponse, SearchError> {
        let polygon = request.into_polygon().inspect_err(|err| {
            info!(error = %err, "nazotte search rejected");
        })?;
        self.search_within_polygon(&polygon, self.config.nazotte_limit)
            .await
    }

    /// Estates inside `polygon`, most popular first, at most `limit` of them.
    ///
    /// The store returns bounding-box candidates already in final order, so
    /// the scan stops as soon as `limit` matches are collected.
    pub async fn search_within_polygon(
        &self,
        polygon: &Polygon,
        limit: usize,
    ) -> Result<EstateSearchResponse, SearchError> {
        metrics::counter!(NAZOTTE_SEARCHES).increment(1);
        let bbox = polygon.bounding_box();
        let candidates = self
            .store
            .list_in_bounding_box(&bbox)
            .await
            .inspect_err(|err| warn!(error = %err, "bounding box query failed"))?;

        if candidates.is_empty() {
            debug!("no estates in bounding box");
            return Ok(EstateSearchResponse::empty());
        }

        let candidate_count = candidates.len();
        let estates: Vec<Estate> = candidates
            .into_iter()
            .filter(|estate| polygon.contains(Coordinate::new(estate.latitude, estate.longitude)))
            .take(limit)
            .collect();

        debug!(
            candidates = candidate_count,
            matches = estates.len(),
            limit,
            "nazotte search finished"
        );
        Ok(EstateSearchResponse {
            count: estates.len(),
            estates,
        })
    }

    /// Read-through lookup. Two concurrent misses on one id may both reach
    /// the store; the second `set` writes an identical value.
    pub async fn cached_lookup(&self, id: EstateId) -> Result<Estate, SearchError> {
        if let Some(estate) = self.cache.get(&id) {
            metrics::counter!(CACHE_HITS).increment(1);
            return Ok(estate);
        }
        metrics::counter!(CACHE_MISSES).increment(1);

        let estate = self
            .store
            .get(id)
            .await
            .inspect_err(|err| warn!(estate_id = %id, error = %err, "estate lookup failed"))?
            .ok_or_else(|| {
                info!(estate_id = %id, "estate not found");
                SearchError::NotFound(id)
            })?;

        self.cache.set(id, estate.clone());
        Ok(estate)
    }

    pub async fn estate_detail(&self, raw_id: &str) -> Result<Estate, SearchError> {
        let id = parse_estate_id(raw_id)?;
        self.cached_lookup(id).await
    }

    /// Accepts a document request for an existing estate.
    pub async fn request_document(&self, raw_id: &str, body: &[u8]) -> Result<(), SearchError> {
        // The address is only validated; it is never stored or logged.
        decode_document_request(body)?;
        let id = parse_estate_id(raw_id)?;
        self.cached_lookup(id).await?;
        info!(estate_id = %id, "document requested");
        Ok(())
    }
}

fn parse_estate_id(raw: &str) -> Result<EstateId, SearchError> {
    raw.parse::<EstateId>().map_err(|err| {
        info!(error = %err, "estate id parse error");
        SearchError::InvalidInput(err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use estate_geo::BoundingBox;
    use estate_storage::{MemoryStore, StorageError};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn estate(id: i64, latitude: f64, longitude: f64, popularity: i64) -> Estate {
        Estate {
            id: EstateId::new(id),
            name: format!("estate {id}"),
            description: String::new(),
            thumbnail: format!("/images/estate/{id}.png"),
            address: String::new(),
            latitude,
            longitude,
            rent: 60000,
            door_height: 200,
            door_width: 100,
            features: String::new(),
            popularity,
        }
    }

    fn square() -> Polygon {
        Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 10.0),
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.0, 0.0),
        ])
        .unwrap()
    }

    fn ids(response: &EstateSearchResponse) -> Vec<i64> {
        response.estates.iter().map(|e| e.id.as_i64()).collect()
    }

    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        gets: AtomicUsize,
        range_queries: AtomicUsize,
    }

    impl CountingStore {
        fn with_estates(estates: impl IntoIterator<Item = Estate>) -> Self {
            Self {
                inner: MemoryStore::with_estates(estates),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl EstateRepository for CountingStore {
        async fn get(&self, id: EstateId) -> Result<Option<Estate>, StorageError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(id).await
        }

        async fn list_in_bounding_box(
            &self,
            bbox: &BoundingBox,
        ) -> Result<Vec<Estate>, StorageError> {
            self.range_queries.fetch_add(1, Ordering::SeqCst);
            self.inner.list_in_bounding_box(bbox).await
        }
    }

    struct FailingStore;

    #[async_trait]
    impl EstateRepository for FailingStore {
        async fn get(&self, _id: EstateId) -> Result<Option<Estate>, StorageError> {
            Err(StorageError::new("database is down"))
        }

        async fn list_in_bounding_box(
            &self,
            _bbox: &BoundingBox,
        ) -> Result<Vec<Estate>, StorageError> {
            Err(StorageError::new("database is down"))
        }
    }

    fn searcher<S: EstateRepository>(store: S) -> EstateSearch<S> {
        EstateSearch::new(store, Arc::new(EstateCache::new()), SearchConfig::default())
    }

    #[tokio::test]
    async fn square_includes_center_and_prefilter_drops_far_points() {
        let search = searcher(MemoryStore::with_estates([
            estate(1, 5.0, 5.0, 10),
            estate(2, 20.0, 20.0, 99),
        ]));
        let response = search.search_within_polygon(&square(), 50).await.unwrap();
        assert_eq!(ids(&response), vec![1]);
        assert_eq!(response.count, 1);
    }

    #[tokio::test]
    async fn notch_inside_bounding_box_is_excluded() {
        let notched = Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 10.0),
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.0, 6.0),
            Coordinate::new(4.0, 6.0),
            Coordinate::new(4.0, 4.0),
            Coordinate::new(10.0, 4.0),
            Coordinate::new(10.0, 0.0),
        ])
        .unwrap();
        let search = searcher(MemoryStore::with_estates([
            estate(1, 8.0, 5.0, 50),
            estate(2, 2.0, 5.0, 40),
        ]));
        let response = search.search_within_polygon(&notched, 50).await.unwrap();
        assert_eq!(ids(&response), vec![2]);
    }

    #[tokio::test]
    async fn cap_keeps_first_matches_in_store_order() {
        let search = searcher(MemoryStore::with_estates([
            estate(10, 1.0, 1.0, 100),
            estate(11, 2.0, 2.0, 90),
            estate(12, 3.0, 3.0, 80),
            estate(13, 4.0, 4.0, 70),
            estate(14, 5.0, 5.0, 60),
        ]));
        let response = search.search_within_polygon(&square(), 3).await.unwrap();
        assert_eq!(ids(&response), vec![10, 11, 12]);
        assert_eq!(response.count, 3);
    }

    #[tokio::test]
    async fn equal_popularity_ties_break_on_id() {
        let search = searcher(MemoryStore::with_estates([
            estate(7, 1.0, 1.0, 5),
            estate(3, 2.0, 2.0, 5),
            estate(5, 3.0, 3.0, 5),
        ]));
        let response = search.search_within_polygon(&square(), 50).await.unwrap();
        assert_eq!(ids(&response), vec![3, 5, 7]);
    }

    #[tokio::test]
    async fn zero_cap_returns_nothing() {
        let search = searcher(MemoryStore::with_estates([estate(1, 5.0, 5.0, 1)]));
        let response = search.search_within_polygon(&square(), 0).await.unwrap();
        assert_eq!(response, EstateSearchResponse::empty());
    }

    #[tokio::test]
    async fn empty_bounding_box_is_an_empty_success() {
        let search = searcher(MemoryStore::with_estates([estate(1, 50.0, 50.0, 1)]));
        let response = search.search_within_polygon(&square(), 50).await.unwrap();
        assert_eq!(response.count, 0);
        assert!(response.estates.is_empty());
    }

    #[tokio::test]
    async fn repeated_searches_are_identical() {
        let search = searcher(MemoryStore::with_estates(
            (0..20).map(|i| estate(i, f64::from(i as i32) * 0.5, 5.0, i % 4)),
        ));
        let first = search.search_within_polygon(&square(), 7).await.unwrap();
        let second = search.search_within_polygon(&square(), 7).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.count, first.estates.len());
        assert!(first.count <= 7);
    }

    #[tokio::test]
    async fn nazotte_rejects_empty_polygon_without_store_access() {
        let search = searcher(CountingStore::default());
        let err = search
            .nazotte(CoordinatesRequest {
                coordinates: Vec::new(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
        assert_eq!(search.store().range_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn nazotte_applies_configured_limit() {
        let store = MemoryStore::with_estates((1..=10).map(|i| estate(i, 5.0, 5.0, 0)));
        let config = SearchConfig { nazotte_limit: 4 };
        let search = EstateSearch::new(store, Arc::new(EstateCache::new()), config);
        let response = search
            .nazotte(CoordinatesRequest {
                coordinates: square().into(),
            })
            .await
            .unwrap();
        assert_eq!(ids(&response), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn storage_failure_is_surfaced() {
        let search = searcher(FailingStore);
        let err = search
            .search_within_polygon(&square(), 50)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Storage(_)));
        let err = search.cached_lookup(EstateId::new(1)).await.unwrap_err();
        assert!(matches!(err, SearchError::Storage(_)));
        assert!(search.cache().get(&EstateId::new(1)).is_none());
    }

    #[tokio::test]
    async fn cached_lookup_fetches_once() {
        let search = searcher(CountingStore::with_estates([estate(1, 1.0, 1.0, 1)]));
        let first = search.cached_lookup(EstateId::new(1)).await.unwrap();
        let second = search.cached_lookup(EstateId::new(1)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(search.store().gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_estate_is_not_cached() {
        let search = searcher(CountingStore::default());
        for _ in 0..2 {
            let err = search.cached_lookup(EstateId::new(404)).await.unwrap_err();
            assert!(matches!(err, SearchError::NotFound(id) if id == EstateId::new(404)));
        }
        assert_eq!(search.store().gets.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn shared_cache_serves_other_searchers() {
        let cache = Arc::new(EstateCache::new());
        let warm = EstateSearch::new(
            MemoryStore::with_estates([estate(8, 1.0, 1.0, 1)]),
            Arc::clone(&cache),
            SearchConfig::default(),
        );
        warm.cached_lookup(EstateId::new(8)).await.unwrap();

        let cold = EstateSearch::new(FailingStore, cache, SearchConfig::default());
        let estate = cold.cached_lookup(EstateId::new(8)).await.unwrap();
        assert_eq!(estate.id, EstateId::new(8));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_lookups_all_succeed() {
        let search = Arc::new(searcher(CountingStore::with_estates(
            (1..=5).map(|i| estate(i, 1.0, 1.0, 1)),
        )));
        let mut handles = Vec::new();
        for n in 0..40i64 {
            let search = Arc::clone(&search);
            handles.push(tokio::spawn(async move {
                let id = EstateId::new(n % 5 + 1);
                search.cached_lookup(id).await.map(|estate| estate.id == id)
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }
        let gets = search.store().gets.load(Ordering::SeqCst);
        assert!((5..=40).contains(&gets));
    }

    #[tokio::test]
    async fn estate_detail_parses_id() {
        let search = searcher(MemoryStore::with_estates([estate(3, 1.0, 1.0, 1)]));
        assert_eq!(
            search.estate_detail("3").await.unwrap().id,
            EstateId::new(3)
        );
        assert!(matches!(
            search.estate_detail("three").await,
            Err(SearchError::InvalidInput(_))
        ));
        assert!(matches!(
            search.estate_detail("4").await,
            Err(SearchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn request_document_validates_body_then_estate() {
        let search = searcher(CountingStore::with_estates([estate(3, 1.0, 1.0, 1)]));
        search
            .request_document("3", br#"{"email":"tenant@example.com"}"#)
            .await
            .unwrap();
        assert!(search.cache().get(&EstateId::new(3)).is_some());

        assert!(matches!(
            search.request_document("3", br#"{"mail":"x"}"#).await,
            Err(SearchError::InvalidInput(_))
        ));
        assert!(matches!(
            search
                .request_document("9", br#"{"email":"tenant@example.com"}"#)
                .await,
            Err(SearchError::NotFound(_))
        ));
        assert_eq!(search.store().gets.load(Ordering::SeqCst), 2);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn request_document_does_not_log_the_email() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let search = searcher(MemoryStore::with_estates([estate(3, 1.0, 1.0, 1)]));
        search
            .request_document("3", br#"{"email":"tenant@example.com"}"#)
            .await
            .unwrap();

        let output = logs.contents();
        assert!(output.contains("document requested"), "log line missing: {output}");
        assert!(output.contains("estate_id=3"), "estate id missing: {output}");
        assert!(!output.contains("tenant@example.com"), "email leaked: {output}");
    }
}
