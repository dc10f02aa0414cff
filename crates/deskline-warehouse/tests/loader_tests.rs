// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the warehouse loader against the in-memory warehouse.

use std::sync::Arc;

use deskline_core::{Batch, TableRef, WriteDisposition};
use deskline_test_utils::{MemoryWarehouse, WarehouseCall};
use deskline_warehouse::{LoadOutcome, LocalWarehouse, WarehouseLoader, infer_schema};
use serde_json::{Value, json};

fn batch(rows: Vec<Value>) -> Batch {
    rows.into_iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
}

fn table() -> TableRef {
    TableRef::new("proj", "support", "tags")
}

fn loader(warehouse: &MemoryWarehouse) -> WarehouseLoader {
    WarehouseLoader::new(Arc::new(warehouse.clone()), "asia-southeast1")
}

#[tokio::test]
async fn first_load_creates_dataset_and_table() {
    let wh = MemoryWarehouse::new();
    let b = batch(vec![json!({"id": "1", "name": "vip"})]);

    let outcome = loader(&wh)
        .load(&b, &table(), WriteDisposition::Replace, infer_schema(&b))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        LoadOutcome::Loaded {
            table: table(),
            rows: 1
        }
    );
    let calls = wh.calls().await;
    assert!(calls.contains(&WarehouseCall::CreateDataset("proj.support".into())));
    assert!(calls.contains(&WarehouseCall::CreateTable {
        table: "proj.support.tags".into(),
        with_schema: true
    }));
    assert_eq!(wh.rows(&table()).await.len(), 1);
}

#[tokio::test]
async fn repeated_append_adds_only_the_new_batch() {
    let wh = MemoryWarehouse::new();
    let l = loader(&wh);
    let first = batch(vec![json!({"id": "1"}), json!({"id": "2"})]);
    let second = batch(vec![json!({"id": "3"})]);

    l.load(&first, &table(), WriteDisposition::Append, infer_schema(&first))
        .await
        .unwrap();
    let outcome = l
        .load(&second, &table(), WriteDisposition::Append, infer_schema(&second))
        .await
        .unwrap();

    assert!(outcome.is_loaded());
    let ids: Vec<Value> = wh.rows(&table()).await.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!("1"), json!("2"), json!("3")]);

    let creates = wh
        .calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, WarehouseCall::CreateTable { .. }))
        .count();
    assert_eq!(creates, 1);
}

#[tokio::test]
async fn repeated_replace_keeps_only_the_latest_batch() {
    let wh = MemoryWarehouse::new();
    let l = loader(&wh);
    let first = batch(vec![json!({"id": "1"}), json!({"id": "2"})]);
    let second = batch(vec![json!({"id": "9"})]);

    l.load(&first, &table(), WriteDisposition::Replace, infer_schema(&first))
        .await
        .unwrap();
    l.load(&second, &table(), WriteDisposition::Replace, infer_schema(&second))
        .await
        .unwrap();

    let rows = wh.rows(&table()).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!("9"));
}

#[tokio::test]
async fn create_races_count_as_success() {
    let wh = MemoryWarehouse::new();
    wh.seed_table(&table(), None, vec![]).await;
    wh.simulate_create_race().await;

    let l = loader(&wh);
    l.ensure_dataset("proj", "support").await.unwrap();
    l.ensure_table(&table(), None).await.unwrap();

    let b = batch(vec![json!({"id": "1"})]);
    let outcome = l
        .load(&b, &table(), WriteDisposition::Append, None)
        .await
        .unwrap();
    assert!(outcome.is_loaded());
}

#[tokio::test]
async fn rejected_load_becomes_failed_outcome() {
    let wh = MemoryWarehouse::new();
    wh.fail_loads(Some("quota exceeded")).await;
    let b = batch(vec![json!({"id": "1"})]);

    let outcome = loader(&wh)
        .load(&b, &table(), WriteDisposition::Replace, infer_schema(&b))
        .await
        .unwrap();

    match &outcome {
        LoadOutcome::Failed { table: t, message } => {
            assert_eq!(t, &table());
            assert!(message.contains("quota exceeded"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    let err = outcome.into_result().unwrap_err();
    assert!(err.to_string().contains("proj.support.tags"));
    // Ensure steps still ran and are safe to repeat.
    assert!(wh.has_table(&table()).await);
}

#[tokio::test]
async fn expiration_is_cleared_after_load() {
    let wh = MemoryWarehouse::new().with_default_table_expiration(chrono::Duration::days(60));
    let l = loader(&wh);
    l.ensure_dataset("proj", "support").await.unwrap();
    l.ensure_table(&table(), None).await.unwrap();
    assert!(wh.expiration(&table()).await.is_some());

    let b = batch(vec![json!({"id": "1"})]);
    l.load(&b, &table(), WriteDisposition::Append, None)
        .await
        .unwrap();

    assert!(wh.expiration(&table()).await.is_none());
    assert!(wh.calls().await.contains(&WarehouseCall::SetExpiration {
        table: "proj.support.tags".into(),
        cleared: true
    }));
}

#[tokio::test]
async fn schema_mismatch_fails_without_writing() {
    let wh = MemoryWarehouse::new();
    let l = loader(&wh);
    let first = batch(vec![json!({"id": "1"})]);
    l.load(&first, &table(), WriteDisposition::Append, infer_schema(&first))
        .await
        .unwrap();

    let wider = batch(vec![json!({"id": "2", "color": "red"})]);
    let outcome = l
        .load(&wider, &table(), WriteDisposition::Append, infer_schema(&wider))
        .await
        .unwrap();

    assert!(!outcome.is_loaded());
    assert_eq!(wh.rows(&table()).await.len(), 1);
}

#[tokio::test]
async fn local_warehouse_round_trip_through_loader() {
    let dir = tempfile::tempdir().unwrap();
    let wh = Arc::new(LocalWarehouse::new(dir.path()));
    let l = WarehouseLoader::new(wh.clone(), "asia-southeast1");

    let first = batch(vec![json!({"id": "1", "meta": {"color": "red"}})]);
    let second = batch(vec![json!({"id": "2", "meta": {"color": "blue"}})]);
    l.load(&first, &table(), WriteDisposition::Append, infer_schema(&first))
        .await
        .unwrap();
    l.load(&second, &table(), WriteDisposition::Append, infer_schema(&second))
        .await
        .unwrap();

    let rows = wh.read_rows(&table()).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["meta"]["color"], json!("blue"));
}
