//! Integration tests for the ingest routes
//!
//! These verify the idempotency contract end to end: duplicate-safe commits,
//! out-of-order delivery convergence, and resume status reporting.

#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use crate::config::LimitsConfig;
    use crate::db::store::count_records;
    use crate::features::{router, FeatureState};

    const IDEM_KEY: &str = "11111111-1111-1111-1111-111111111111";

    /// Helper to create a test router with the full feature surface
    fn create_test_router(pool: PgPool) -> Router {
        create_test_router_with_limits(pool, LimitsConfig::default())
    }

    fn create_test_router_with_limits(pool: PgPool, limits: LimitsConfig) -> Router {
        router(FeatureState { db: pool, limits })
    }

    fn batch_request(idem_key: &str, seq: i64, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/submit/batch")
            .header("Authorization", "Bearer test-token")
            .header("X-Publisher", "publisher@example.org")
            .header("Content-Type", "application/json")
            .header("Idempotency-Key", idem_key)
            .header("X-Batch-Seq", seq.to_string())
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_batch_submit_then_identical_retry(pool: PgPool) {
        let app = create_test_router(pool.clone());
        let records = json!([{"metric": "cpu", "value": 0.1}, {"metric": "mem", "value": 2}]);

        let response = app
            .clone()
            .oneshot(batch_request(IDEM_KEY, 0, records.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ack = body_json(response).await;
        assert_eq!(ack, json!({"ok": true, "inserted": 2, "next_expected_seq": 1}));

        // Identical retry: converges to the same state, reported as duplicate.
        let response = app.oneshot(batch_request(IDEM_KEY, 0, records)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ack = body_json(response).await;
        assert_eq!(
            ack,
            json!({"ok": true, "inserted": 0, "duplicate": true, "next_expected_seq": 1})
        );

        let stored = count_records(&pool, "publisher@example.org", IDEM_KEY)
            .await
            .unwrap();
        assert_eq!(stored, 2);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_out_of_order_delivery_converges(pool: PgPool) {
        let app = create_test_router(pool.clone());

        // Seq 5 arrives before 0..=4; dedup keys on (seq, offset), not order.
        for seq in [5i64, 0, 1, 2, 3, 4] {
            let response = app
                .clone()
                .oneshot(batch_request(IDEM_KEY, seq, json!([{"seq": seq}])))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let stored = count_records(&pool, "publisher@example.org", IDEM_KEY)
            .await
            .unwrap();
        assert_eq!(stored, 6);

        // Max-seen semantics: the high-water mark reflects seq 5.
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/ingest/status?idempotency_key={}", IDEM_KEY))
                    .header("Authorization", "Bearer test-token")
                    .header("X-Publisher", "publisher@example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let status = body_json(response).await;
        assert_eq!(status["next_expected_seq"], 6);
        assert_eq!(status["status"], "in_progress");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_partial_chunk_retry_is_not_duplicate(pool: PgPool) {
        let app = create_test_router(pool.clone());

        let first = json!([{"metric": "cpu", "value": 0.1}]);
        let response = app.clone().oneshot(batch_request(IDEM_KEY, 0, first)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Retry the chunk with one extra record: only the new one inserts,
        // and the chunk is not reported as a full duplicate.
        let extended = json!([{"metric": "cpu", "value": 0.1}, {"metric": "mem", "value": 2}]);
        let response = app.oneshot(batch_request(IDEM_KEY, 0, extended)).await.unwrap();
        let ack = body_json(response).await;
        assert_eq!(ack["inserted"], 1);
        assert_eq!(ack.get("duplicate"), None);

        let stored = count_records(&pool, "publisher@example.org", IDEM_KEY)
            .await
            .unwrap();
        assert_eq!(stored, 2);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_batch_missing_headers_has_no_side_effect(pool: PgPool) {
        let app = create_test_router(pool.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/submit/batch")
                    .header("Authorization", "Bearer test-token")
                    .header("X-Publisher", "publisher@example.org")
                    .header("Content-Type", "application/json")
                    .body(Body::from(json!([{"metric": "cpu"}]).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM metric_records")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_batch_seq_at_i64_max_is_rejected(pool: PgPool) {
        let app = create_test_router(pool.clone());

        let response = app
            .oneshot(batch_request(IDEM_KEY, i64::MAX, json!([{"metric": "cpu"}])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM metric_records")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_batch_rejects_unauthenticated(pool: PgPool) {
        let app = create_test_router(pool);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/submit/batch")
                    .header("Content-Type", "application/json")
                    .header("Idempotency-Key", IDEM_KEY)
                    .header("X-Batch-Seq", "0")
                    .body(Body::from("[]"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_oversized_chunk_rejected_whole(pool: PgPool) {
        let limits = LimitsConfig {
            max_batch_records: 2,
            max_body_bytes: 1024 * 1024,
        };
        let app = create_test_router_with_limits(pool.clone(), limits);

        let records = json!([{"i": 1}, {"i": 2}, {"i": 3}]);
        let response = app.oneshot(batch_request(IDEM_KEY, 0, records)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        // Never partially accepted.
        let stored = count_records(&pool, "publisher@example.org", IDEM_KEY)
            .await
            .unwrap();
        assert_eq!(stored, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_ndjson_submit_with_session(pool: PgPool) {
        let app = create_test_router(pool.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/submit/ndjson")
                    .header("Authorization", "Bearer test-token")
                    .header("X-Publisher", "publisher@example.org")
                    .header("Content-Type", "application/x-ndjson")
                    .header("Idempotency-Key", IDEM_KEY)
                    .header("X-Batch-Seq", "0")
                    .body(Body::from("{\"metric\":\"cpu\"}\n{\"metric\":\"mem\"}\n"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ack = body_json(response).await;
        assert_eq!(ack["inserted"], 2);
        assert_eq!(ack["next_expected_seq"], 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_ndjson_malformed_line_aborts_whole_request(pool: PgPool) {
        let app = create_test_router(pool.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/submit/ndjson")
                    .header("Authorization", "Bearer test-token")
                    .header("X-Publisher", "publisher@example.org")
                    .header("Content-Type", "application/x-ndjson")
                    .header("Idempotency-Key", IDEM_KEY)
                    .header("X-Batch-Seq", "0")
                    .body(Body::from("{\"metric\":\"cpu\"}\nbroken{\n"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Nothing stored: a decode failure must not mask partial loss.
        let stored = count_records(&pool, "publisher@example.org", IDEM_KEY)
            .await
            .unwrap();
        assert_eq!(stored, 0);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_single_submit_stores_record(pool: PgPool) {
        let app = create_test_router(pool.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/submit")
                    .header("Authorization", "Bearer test-token")
                    .header("X-Publisher", "publisher@example.org")
                    .header("Content-Type", "application/json")
                    .body(Body::from(json!({"cpu_watts": 11.2}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let ack = body_json(response).await;
        assert_eq!(ack["ok"], true);
        assert_eq!(ack["inserted"], 1);

        let stored: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM metric_records WHERE publisher = $1",
        )
        .bind("publisher@example.org")
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(stored, 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_status_for_unknown_session_is_fresh(pool: PgPool) {
        let app = create_test_router(pool);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ingest/status?idempotency_key=never-seen")
                    .header("Authorization", "Bearer test-token")
                    .header("X-Publisher", "publisher@example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let status = body_json(response).await;
        assert_eq!(status, json!({"status": "in_progress", "next_expected_seq": 0}));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_status_is_scoped_to_publisher(pool: PgPool) {
        let app = create_test_router(pool);

        let response = app
            .clone()
            .oneshot(batch_request(IDEM_KEY, 0, json!([{"metric": "cpu"}])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // A different publisher with the same key sees no progress.
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/ingest/status?idempotency_key={}", IDEM_KEY))
                    .header("Authorization", "Bearer test-token")
                    .header("X-Publisher", "other@example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = body_json(response).await;
        assert_eq!(status["next_expected_seq"], 0);
    }

    fn metrics_request(publisher: &str, query: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/metrics/me{}", query))
            .header("Authorization", "Bearer test-token")
            .header("X-Publisher", publisher)
            .body(Body::empty())
            .unwrap()
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_metrics_listing_returns_stored_records(pool: PgPool) {
        let app = create_test_router(pool);

        let response = app
            .clone()
            .oneshot(batch_request(
                IDEM_KEY,
                0,
                json!([{"metric": "cpu", "value": 0.5}, {"metric": "mem", "value": 912.0}]),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(metrics_request("publisher@example.org", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let page = body_json(response).await;
        assert_eq!(page["ok"], true);
        assert_eq!(page["total"], 2);
        let records = page["records"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["idempotency_key"], IDEM_KEY);
        assert!(records.iter().any(|r| r["body"]["metric"] == "cpu"));
        assert!(records.iter().any(|r| r["body"]["metric"] == "mem"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_metrics_listing_is_scoped_to_publisher(pool: PgPool) {
        let app = create_test_router(pool);

        let response = app
            .clone()
            .oneshot(batch_request(IDEM_KEY, 0, json!([{"metric": "cpu"}])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(metrics_request("other@example.org", ""))
            .await
            .unwrap();
        let page = body_json(response).await;
        assert_eq!(page["total"], 0);
        assert!(page["records"].as_array().unwrap().is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_metrics_listing_filters_and_paginates(pool: PgPool) {
        let app = create_test_router(pool);

        for (key, seq) in [(IDEM_KEY, 0), (IDEM_KEY, 1), ("other-key", 0)] {
            let response = app
                .clone()
                .oneshot(batch_request(key, seq, json!([{"seq": seq}])))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(metrics_request(
                "publisher@example.org",
                &format!("?idempotency_key={}", IDEM_KEY),
            ))
            .await
            .unwrap();
        let page = body_json(response).await;
        assert_eq!(page["total"], 2);
        assert!(page["records"]
            .as_array()
            .unwrap()
            .iter()
            .all(|r| r["idempotency_key"] == IDEM_KEY));

        let response = app
            .oneshot(metrics_request(
                "publisher@example.org",
                &format!("?idempotency_key={}&limit=1", IDEM_KEY),
            ))
            .await
            .unwrap();
        let page = body_json(response).await;
        assert_eq!(page["total"], 2);
        assert_eq!(page["records"].as_array().unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_metrics_listing_rejects_unauthenticated(pool: PgPool) {
        let app = create_test_router(pool);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
