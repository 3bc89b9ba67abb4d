//! Tests for output module

use super::*;
use crate::engine::Message;
use crate::types::WriteDisposition;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

fn lines(bytes: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_record_line() {
    let line = record_line("deals", &json!({"id": 1}), 1_700_000_000_000);
    assert_eq!(
        line,
        json!({
            "type": "RECORD",
            "record": {"stream": "deals", "data": {"id": 1}, "emitted_at": 1_700_000_000_000_i64}
        })
    );
}

#[tokio::test]
async fn test_json_lines_destination() {
    let mut dest = JsonLinesDestination::new(Vec::new(), false);

    dest.begin_stream("persons", WriteDisposition::Replace)
        .await
        .unwrap();
    dest.write(&Message::info("Starting")).await.unwrap();
    dest.write(&Message::record("persons", vec![json!({"id": 1}), json!({"id": 2})]))
        .await
        .unwrap();
    dest.end_stream("persons", true).await.unwrap();
    dest.finish().await.unwrap();

    let out = lines(&dest.into_inner());
    assert_eq!(out.len(), 3);
    assert_eq!(out[0]["type"], "LOG");
    assert_eq!(out[0]["log"]["level"], "INFO");
    assert_eq!(out[1]["record"]["stream"], "persons");
    assert_eq!(out[1]["record"]["data"], json!({"id": 1}));
    assert_eq!(out[2]["record"]["data"], json!({"id": 2}));
    assert_eq!(out[1]["record"]["emitted_at"], out[2]["record"]["emitted_at"]);
}

#[tokio::test]
async fn test_json_lines_destination_pretty() {
    let mut dest = JsonLinesDestination::new(Vec::new(), true);
    dest.write(&Message::record("users", vec![json!({"id": 1})]))
        .await
        .unwrap();

    let text = String::from_utf8(dest.into_inner()).unwrap();
    assert!(text.contains("\n  \"record\""));
}

#[tokio::test]
async fn test_vec_destination_collects() {
    let mut dest: Vec<Message> = Vec::new();
    dest.write(&Message::record("stages", vec![json!({"id": 3})]))
        .await
        .unwrap();
    dest.write(&Message::error("careful")).await.unwrap();

    assert_eq!(dest.len(), 2);
    assert!(dest[0].is_record());
    assert_eq!(dest[0].stream(), Some("stages"));
    assert!(!dest[1].is_record());
    assert_eq!(dest[1].stream(), None);
}

#[tokio::test]
async fn test_dir_destination_replace_overwrites_on_success() {
    let tmp = TempDir::new().unwrap();
    let mut dest = JsonlDirDestination::new(tmp.path()).unwrap();
    let path = dest.stream_path("deals");
    fs::write(&path, "{\"id\":\"old\"}\n").unwrap();

    dest.begin_stream("deals", WriteDisposition::Replace)
        .await
        .unwrap();
    dest.write(&Message::record("deals", vec![json!({"id": 1})]))
        .await
        .unwrap();
    dest.write(&Message::info("ignored")).await.unwrap();
    dest.write(&Message::record("deals", vec![json!({"id": 2})]))
        .await
        .unwrap();
    dest.end_stream("deals", true).await.unwrap();
    dest.finish().await.unwrap();

    let out = lines(&fs::read(&path).unwrap());
    assert_eq!(out, vec![json!({"id": 1}), json!({"id": 2})]);
    assert!(!tmp.path().join("deals.jsonl.tmp").exists());
}

#[tokio::test]
async fn test_dir_destination_replace_keeps_previous_on_failure() {
    let tmp = TempDir::new().unwrap();
    let mut dest = JsonlDirDestination::new(tmp.path()).unwrap();
    let path = dest.stream_path("deals_flow");
    fs::write(&path, "{\"id\":\"old\"}\n").unwrap();

    dest.begin_stream("deals_flow", WriteDisposition::Replace)
        .await
        .unwrap();
    dest.write(&Message::record("deals_flow", vec![json!({"id": "partial"})]))
        .await
        .unwrap();
    dest.end_stream("deals_flow", false).await.unwrap();

    let out = lines(&fs::read(&path).unwrap());
    assert_eq!(out, vec![json!({"id": "old"})]);
    assert!(!tmp.path().join("deals_flow.jsonl.tmp").exists());
}

#[tokio::test]
async fn test_dir_destination_append() {
    let tmp = TempDir::new().unwrap();
    let mut dest = JsonlDirDestination::new(tmp.path()).unwrap();
    let path = dest.stream_path("activities");
    fs::write(&path, "{\"id\":0}\n").unwrap();

    dest.begin_stream("activities", WriteDisposition::Append)
        .await
        .unwrap();
    dest.write(&Message::record("activities", vec![json!({"id": 1})]))
        .await
        .unwrap();
    dest.end_stream("activities", true).await.unwrap();

    let out = lines(&fs::read(&path).unwrap());
    assert_eq!(out, vec![json!({"id": 0}), json!({"id": 1})]);
}

#[tokio::test]
async fn test_dir_destination_requires_begin() {
    let tmp = TempDir::new().unwrap();
    let mut dest = JsonlDirDestination::new(tmp.path().join("nested/out")).unwrap();

    let result = dest
        .write(&Message::record("users", vec![json!({"id": 1})]))
        .await;
    assert!(result.is_err());
    assert!(tmp.path().join("nested/out").is_dir());
}
