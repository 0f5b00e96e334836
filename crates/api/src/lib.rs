//! Read API over the indexed lock records and TVL entries.

pub mod routes;
pub mod state;
pub mod validation;

use api_types::*;
use utoipa::OpenApi;

pub use routes::router;
pub use state::{ApiState, DEFAULT_MAX_REQUESTS, DEFAULT_RATE_PERIOD, LISTING_PAGE_SIZE};

/// `OpenAPI` documentation structure
#[derive(Debug, OpenApi)]
#[openapi(
    paths(routes::tvl::pinklock, routes::tvl::dextools),
    components(schemas(
        validation::TvlQuery,
        validation::ListingQuery,
        TvlResponse,
        LockListingItem,
        LockListingPage,
        HealthResponse,
        ErrorResponse
    )),
    tags(
        (name = "pinklock", description = "PinkLock TVL endpoints")
    ),
    info(
        title = "PinkLock TVL API",
        description = "Value locked in PinkLock contracts across chains",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use axum::{
        Router,
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use primitives::{LockRecord, LockVersion, TvlEntry};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use store::{LockRecordStore, MemoryStore, TvlStore};
    use tower::ServiceExt;

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response =
            app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn app(store: Arc<MemoryStore>) -> Router {
        router(ApiState::new(store, DEFAULT_MAX_REQUESTS, DEFAULT_RATE_PERIOD))
    }

    fn entry(chain_id: u64, byte: u8, tvl: f64, is_stable_coin: bool) -> TvlEntry {
        TvlEntry {
            chain_id,
            address: Address::repeat_byte(byte),
            tvl,
            is_liquidity: false,
            is_stable_coin,
            pool: None,
        }
    }

    fn record(lock_id: u64) -> LockRecord {
        LockRecord {
            chain_id: 56,
            lock_id: U256::from(lock_id),
            token: Address::repeat_byte(0x11),
            factory: Address::ZERO,
            owner: Address::repeat_byte(0x22),
            amount: U256::from(1000),
            unlocked_amount: U256::ZERO,
            lock_date: lock_id,
            unlock_date: 2_000_000_000,
            version: LockVersion::V2,
            is_liquidity: false,
            token_decimals: Some(18),
        }
    }

    #[tokio::test]
    async fn pinklock_sums_both_families() {
        let store = Arc::new(MemoryStore::new());
        store.upsert_tvl(LockVersion::V1, &entry(56, 1, 1.5, false)).await.unwrap();
        store.upsert_tvl(LockVersion::V2, &entry(56, 2, 2.0, false)).await.unwrap();
        store.upsert_tvl(LockVersion::V1, &entry(56, 3, 10.0, true)).await.unwrap();
        store.upsert_tvl(LockVersion::V1, &entry(1, 4, 99.0, false)).await.unwrap();

        let (status, body) = get(app(store), "/tvl/pinklock?chain_id=56").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "tvl": 3.5, "stableCoinTvl": 10.0 }));
    }

    #[tokio::test]
    async fn pinklock_without_chain_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let (status, _) = get(app(store.clone()), "/tvl/pinklock").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get(app(store), "/tvl/pinklock?chain_id=bsc").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dextools_pages_records() {
        let store = Arc::new(MemoryStore::new());
        let records: Vec<_> = (1..=150).map(record).collect();
        store.upsert_records(&records).await.unwrap();

        let (status, body) = get(app(store.clone()), "/tvl/dextools?chain_id=56").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["docs"].as_array().unwrap().len(), 100);
        assert_eq!(body["totalDocs"], 150);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["hasNextPage"], true);
        assert_eq!(body["docs"][0]["expired"], 2_000_000_000u64);

        let (_, body) = get(app(store), "/tvl/dextools?chain_id=56&page=2").await;
        assert_eq!(body["docs"].as_array().unwrap().len(), 50);
        assert_eq!(body["page"], 2);
        assert_eq!(body["nextPage"], Value::Null);
        assert_eq!(body["pagingCounter"], 101);
    }

    #[tokio::test]
    async fn dextools_rejects_bad_params() {
        let store = Arc::new(MemoryStore::new());
        for uri in ["/tvl/dextools", "/tvl/dextools?chain_id=x", "/tvl/dextools?chain_id=56&page=x"]
        {
            let (status, _) = get(app(store.clone()), uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[test]
    fn openapi_lists_both_endpoints() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/tvl/pinklock"));
        assert!(doc.paths.paths.contains_key("/tvl/dextools"));
    }
}
