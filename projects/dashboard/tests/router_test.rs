use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use projects_dashboard::cache::{CacheEntry, CacheStore};
use projects_dashboard::endpoints::router;
use projects_dashboard::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

const OUT_A: &str = "COutPoint(1000000000000000000000000000000000000000000000000000000000000000, 0)";
const OUT_B: &str = "COutPoint(2000000000000000000000000000000000000000000000000000000000000000, 1)";

fn state(cache: CacheStore) -> AppState {
    AppState {
        cache,
        max_age: Duration::minutes(60),
        public_couchdb: "https://couch.example/znodes".to_string(),
        debug: false,
    }
}

async fn seeded_cache() -> CacheStore {
    let cache = CacheStore::new();
    cache.put("xzc_price", json!("8.0779853")).await;
    cache.put("znode_count", json!({"total": 2, "enabled": 2})).await;
    cache.put("blocktemplate", json!({"height": 150000})).await;
    cache
        .put(
            "evoznodelist",
            json!({
                OUT_A: {
                    "proTxHash": "pa", "status": "ENABLED", "payee": "aPayee",
                    "owneraddress": "aOwner", "votingaddress": "aVoter",
                    "collateraladdress": "aCollateral", "lastpaidblock": 149000
                },
                OUT_B: {
                    "proTxHash": "pb", "status": "ENABLED", "payee": "bPayee",
                    "owneraddress": "bOwner", "votingaddress": "bVoter",
                    "collateraladdress": "bCollateral", "lastpaidblock": 148000
                }
            }),
        )
        .await;
    cache
        .put(
            "protxlist",
            json!([
                {"proTxHash": "pa", "state": {"registeredHeight": 100, "PoSeRevivedHeight": -1}},
                {"proTxHash": "pb", "state": {"registeredHeight": 200, "PoSeRevivedHeight": -1}}
            ]),
        )
        .await;
    cache.put("winners", json!({"150002": "aPayee", "150001": "bPayee"})).await;
    cache.put("queue", json!([OUT_B, OUT_A])).await;
    cache
}

async fn get(cache: CacheStore, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router(state(cache))
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get_json(cache: CacheStore, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(cache, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(CacheStore::new(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_price_is_plain_text() {
    let (status, body) = get(seeded_cache().await, "/api/xzc_price").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(body).unwrap(), "8.0779853");
}

#[tokio::test]
async fn test_cached_values_pass_through() {
    let cache = seeded_cache().await;

    let (status, count) = get_json(cache.clone(), "/api/znode/count").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(count, json!({"total": 2, "enabled": 2}));

    let (_, template) = get_json(cache.clone(), "/api/getblocktemplate").await;
    assert_eq!(template["height"], 150000);

    let (_, list) = get_json(cache.clone(), "/api/getznodelist").await;
    assert_eq!(list[OUT_A]["payee"], "aPayee");

    let (_, protx) = get_json(cache, "/api/getprotxlist").await;
    assert_eq!(protx.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_uncached_value_is_unavailable() {
    let (status, _) = get(CacheStore::new(), "/api/getblocktemplate").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = get(CacheStore::new(), "/api/xzc_price").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_expired_value_is_unavailable() {
    let cache = CacheStore::new();
    cache
        .put_entry(
            "znode_count",
            CacheEntry {
                last_update: Utc::now() - Duration::minutes(61),
                data: Some(json!(5)),
            },
        )
        .await;

    let (status, _) = get(cache, "/api/znode/count").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_winners_are_enriched_and_ordered() {
    let (status, winners) = get_json(seeded_cache().await, "/api/evoznode/winners").await;
    assert_eq!(status, StatusCode::OK);

    let winners = winners.as_array().unwrap();
    assert_eq!(winners.len(), 2);
    assert_eq!(winners[0]["payee"], "bPayee");
    assert_eq!(winners[0]["nextPaidBlock"], "150001");
    assert_eq!(winners[0]["queuePos"], 0);
    assert_eq!(winners[0]["dmnState"]["registeredHeight"], 200);
    assert_eq!(winners[1]["payee"], "aPayee");
    assert_eq!(winners[1]["queuePos"], 1);
}

#[tokio::test]
async fn test_winners_need_their_inputs() {
    let cache = CacheStore::new();
    cache.put("winners", json!({"1": "aPayee"})).await;

    let (status, _) = get(cache, "/api/evoznode/winners").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_znode_lookup_by_owner_address() {
    let (status, znode) = get_json(seeded_cache().await, "/api2/znode/aOwner").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(znode["payee"], "aPayee");
    assert_eq!(
        znode["txid"],
        "1000000000000000000000000000000000000000000000000000000000000000"
    );
    assert_eq!(znode["queue_pos"], 1);
    assert_eq!(znode["dmnstate"]["registeredHeight"], 100);
}

#[tokio::test]
async fn test_znode_lookup_unknown_address() {
    let (status, _) = get(seeded_cache().await, "/api2/znode/nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_znode_lookup_without_lists_is_bad_gateway() {
    let (status, _) = get(CacheStore::new(), "/api2/znode/aOwner").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_index_page_renders() {
    let (status, body) = get(CacheStore::new(), "/").await;
    assert_eq!(status, StatusCode::OK);

    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("Znode Dashboard"));
    assert!(html.contains(r#"data-couchdb="https://couch.example/znodes""#));
    assert!(html.contains(r#"data-debug="false""#));
}
