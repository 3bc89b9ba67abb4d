//! Tests for pagination module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::StringMap;
use futures::{StreamExt, TryStreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(data: Value, more: bool, next_start: Option<u64>) -> Value {
    let mut pagination = json!({ "more_items_in_collection": more });
    if let Some(next) = next_start {
        pagination["next_start"] = json!(next);
    }
    json!({
        "success": true,
        "data": data,
        "additional_data": { "pagination": pagination }
    })
}

fn client_for(server: &MockServer) -> HttpClient {
    HttpClient::with_config(HttpClientConfig::builder().base_url(server.uri()).build()).unwrap()
}

fn fetch(server: &MockServer, entity: &str) -> PageStream {
    paginated_get(
        client_for(server),
        format!("{}/{entity}", server.uri()),
        StringMap::new(),
        StringMap::new(),
        StartLimitPaginator::default(),
    )
}

// ============================================================================
// Response Envelope Tests
// ============================================================================

#[test]
fn test_page_body_pagination_present() {
    let body: PageBody = serde_json::from_value(page(json!([{"id": 1}]), true, Some(500))).unwrap();
    let meta = body.pagination();
    assert!(meta.has_more());
    assert_eq!(meta.next_start, Some(500));
    assert_eq!(body.into_records(), vec![json!({"id": 1})]);
}

#[test]
fn test_page_body_pagination_absent_defaults_to_done() {
    // Missing more_items_in_collection is read as false
    let body: PageBody = serde_json::from_value(json!({"data": [{"id": 1}]})).unwrap();
    assert_eq!(body.pagination(), PaginationMeta::default());
    assert!(!body.pagination().has_more());

    let body: PageBody =
        serde_json::from_value(json!({"data": [], "additional_data": {}})).unwrap();
    assert!(!body.pagination().has_more());
}

#[test]
fn test_page_body_null_flag_is_done() {
    let body: PageBody = serde_json::from_value(json!({
        "data": [{"id": 1}],
        "additional_data": {"pagination": {"more_items_in_collection": null, "next_start": 500}}
    }))
    .unwrap();
    assert_eq!(body.pagination().more_items_in_collection, None);
    assert!(!body.pagination().has_more());
}

#[test]
fn test_page_body_records() {
    let body: PageBody = serde_json::from_value(json!({"data": null})).unwrap();
    assert!(body.into_records().is_empty());

    // A body without `data` is not a list response
    let err = serde_json::from_value::<PageBody>(json!({"success": false})).unwrap_err();
    assert!(err.to_string().contains("missing field `data`"));

    let body: PageBody = serde_json::from_value(json!({"data": {"id": 9}})).unwrap();
    assert_eq!(body.into_records(), vec![json!({"id": 9})]);

    let body: PageBody =
        serde_json::from_value(json!({"data": [{"id": 3}, {"id": 1}, {"id": 2}]})).unwrap();
    let ids: Vec<_> = body.into_records().iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(3), json!(1), json!(2)]);
}

// ============================================================================
// StartLimitPaginator Tests
// ============================================================================

#[test]
fn test_paginator_request_params() {
    let paginator = StartLimitPaginator::default();
    let mut state = PaginationState::new();

    let params = paginator.request_params(&state);
    assert_eq!(params.get("start"), Some(&"0".to_string()));
    assert_eq!(params.get("limit"), Some(&"500".to_string()));

    state.start = 1000;
    let params = paginator.request_params(&state);
    assert_eq!(params.get("start"), Some(&"1000".to_string()));
}

#[test]
fn test_paginator_continues_with_next_start() {
    let paginator = StartLimitPaginator::new(100);
    let mut state = PaginationState::new();
    let meta = PaginationMeta {
        more_items_in_collection: Some(true),
        next_start: Some(100),
        ..Default::default()
    };

    let next = paginator.process_response(&meta, &mut state).unwrap();

    assert_eq!(next, NextPage::Continue { start: 100 });
    assert_eq!(state.start, 100);
    assert_eq!(state.pages_fetched, 1);
    assert!(!state.done);
}

#[test]
fn test_paginator_done() {
    let paginator = StartLimitPaginator::default();
    let mut state = PaginationState::new();

    let next = paginator
        .process_response(&PaginationMeta::default(), &mut state)
        .unwrap();

    assert!(next.is_done());
    assert!(state.done);
}

#[test]
fn test_paginator_missing_next_start_is_error() {
    let paginator = StartLimitPaginator::default();
    let mut state = PaginationState::new();
    let meta = PaginationMeta {
        more_items_in_collection: Some(true),
        ..Default::default()
    };

    let err = paginator.process_response(&meta, &mut state).unwrap_err();
    assert!(matches!(err, Error::Pagination { .. }));
}

// ============================================================================
// Fetch Loop Tests
// ============================================================================

#[tokio::test]
async fn test_single_page_makes_one_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stages"))
        .and(query_param("start", "0"))
        .and(query_param("limit", "500"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(json!([{"id": 1}, {"id": 2}]), false, None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let batches: Vec<Vec<Value>> = fetch(&server, "stages").try_collect().await.unwrap();

    assert_eq!(batches, vec![vec![json!({"id": 1}), json!({"id": 2})]]);
}

#[tokio::test]
async fn test_missing_pagination_flag_makes_one_call() {
    // Known edge case: an absent flag is treated as "no more pages"
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 1}]})))
        .expect(1)
        .mount(&server)
        .await;

    let batches: Vec<Vec<Value>> = fetch(&server, "users").try_collect().await.unwrap();
    assert_eq!(batches.len(), 1);
}

#[tokio::test]
async fn test_null_pagination_flag_makes_one_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1}],
            "additional_data": {"pagination": {"more_items_in_collection": null}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let batches: Vec<Vec<Value>> = fetch(&server, "users").try_collect().await.unwrap();
    assert_eq!(batches, vec![vec![json!({"id": 1})]]);
}

#[tokio::test]
async fn test_body_without_data_is_parse_error() {
    // Pipedrive reports some failures with status 200 and no `data`
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/deals"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "error": "oops"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let results: Vec<_> = fetch(&server, "deals").collect().await;
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(Error::JsonParse(_))));
}

#[tokio::test]
async fn test_three_pages_follow_next_start() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/deals"))
        .and(query_param("start", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(json!([{"id": 1}]), true, Some(500))),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/deals"))
        .and(query_param("start", "500"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(json!([{"id": 2}]), true, Some(1000))),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/deals"))
        .and(query_param("start", "1000"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(json!([{"id": 3}]), false, None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let batches: Vec<Vec<Value>> = fetch(&server, "deals").try_collect().await.unwrap();

    assert_eq!(
        batches,
        vec![
            vec![json!({"id": 1})],
            vec![json!({"id": 2})],
            vec![json!({"id": 3})]
        ]
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_empty_intermediate_page_does_not_terminate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("start", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), true, Some(500))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("start", "500"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(json!([{"id": 42}]), false, None)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let batches: Vec<Vec<Value>> = fetch(&server, "products").try_collect().await.unwrap();

    assert_eq!(batches, vec![vec![json!({"id": 42})]]);
}

#[tokio::test]
async fn test_all_empty_pages_yield_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pipelines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!(null), false, None)))
        .expect(1)
        .mount(&server)
        .await;

    let batches: Vec<Vec<Value>> = fetch(&server, "pipelines").try_collect().await.unwrap();
    assert!(batches.is_empty());
}

#[tokio::test]
async fn test_http_error_aborts_stream() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/persons"))
        .and(query_param("start", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(json!([{"id": 1}]), true, Some(500))),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/persons"))
        .and(query_param("start", "500"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/persons"))
        .and(query_param("start", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), false, None)))
        .expect(0)
        .mount(&server)
        .await;

    let mut stream = fetch(&server, "persons");

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first, vec![json!({"id": 1})]);

    let err = stream.next().await.unwrap().unwrap_err();
    assert_eq!(err.status(), Some(500));

    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn test_first_page_error_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/organizations"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .expect(1)
        .mount(&server)
        .await;

    let result: crate::error::Result<Vec<Vec<Value>>> =
        fetch(&server, "organizations").try_collect().await;

    assert!(matches!(result, Err(Error::HttpStatus { status: 401, .. })));
}

#[tokio::test]
async fn test_stream_is_lazy() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([]), false, None)))
        .expect(0)
        .mount(&server)
        .await;

    let stream = fetch(&server, "users");
    drop(stream);
}

#[tokio::test]
async fn test_caller_params_kept_and_paging_params_override() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/activities"))
        .and(query_param("user_id", "0"))
        .and(query_param("start", "0"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(json!([{"id": 1}]), false, None)))
        .expect(1)
        .mount(&server)
        .await;

    let mut params = StringMap::new();
    params.insert("user_id".to_string(), "0".to_string());
    params.insert("start".to_string(), "999".to_string());

    let stream = paginated_get(
        client_for(&server),
        format!("{}/activities", server.uri()),
        StringMap::new(),
        params,
        StartLimitPaginator::new(50),
    );
    let batches: Vec<Vec<Value>> = stream.try_collect().await.unwrap();

    assert_eq!(batches.len(), 1);
}
