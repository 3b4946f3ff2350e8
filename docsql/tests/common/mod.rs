#![allow(dead_code)]

use docsql::{
    SqliteDatabase,
    prelude::*,
    sqlite::SqliteEngine,
};
use serde_json::{Value, json};

pub async fn database() -> SqliteDatabase {
    docsql::open_in_memory().await.unwrap()
}

pub fn database_with_array_paths(collection: &str, paths: &[&str]) -> SqliteDatabase {
    Database::builder(SqliteEngine::open_in_memory().unwrap())
        .array_paths(collection, paths.iter().copied())
        .build()
}

pub fn inventory() -> Vec<Value> {
    vec![
        json!({ "item": "journal", "qty": 25, "size": { "h": 14, "w": 21, "uom": "cm" }, "status": "A" }),
        json!({ "item": "notebook", "qty": 50, "size": { "h": 8.5, "w": 11, "uom": "in" }, "status": "A" }),
        json!({ "item": "paper", "qty": 100, "size": { "h": 8.5, "w": 11, "uom": "in" }, "status": "D" }),
        json!({ "item": "planner", "qty": 75, "size": { "h": 22.85, "w": 30, "uom": "cm" }, "status": "D" }),
        json!({ "item": "postcard", "qty": 45, "size": { "h": 10, "w": 15.25, "uom": "cm" }, "status": "A" }),
    ]
}

pub fn tagged_inventory() -> Vec<Value> {
    vec![
        json!({ "item": "journal", "qty": 25, "tags": ["blank", "red"], "dim_cm": [14, 21] }),
        json!({ "item": "notebook", "qty": 50, "tags": ["red", "blank"], "dim_cm": [14, 21] }),
        json!({ "item": "paper", "qty": 100, "tags": ["red", "blank", "plain"], "dim_cm": [14, 21] }),
        json!({ "item": "planner", "qty": 75, "tags": ["blank", "red"], "dim_cm": [22.85, 30] }),
        json!({ "item": "postcard", "qty": 45, "tags": ["blue"], "dim_cm": [10, 15.25] }),
    ]
}

pub fn stocked_inventory() -> Vec<Value> {
    vec![
        json!({ "item": "journal", "instock": [{ "warehouse": "A", "qty": 5 }, { "warehouse": "C", "qty": 15 }] }),
        json!({ "item": "notebook", "instock": [{ "warehouse": "C", "qty": 5 }] }),
        json!({ "item": "paper", "instock": [{ "warehouse": "A", "qty": 60 }, { "warehouse": "B", "qty": 15 }] }),
        json!({ "item": "planner", "instock": [{ "warehouse": "A", "qty": 40 }, { "warehouse": "B", "qty": 5 }] }),
        json!({ "item": "postcard", "instock": [{ "warehouse": "B", "qty": 15 }, { "warehouse": "C", "qty": 35 }] }),
    ]
}

/// Inserts `documents` into a fresh collection named `name`.
pub async fn seeded(db: &SqliteDatabase, name: &str, documents: &[Value]) -> Collection<SqliteEngine> {
    let collection = db.collection(name).unwrap();
    collection.insert_many(documents).await.unwrap();
    collection
}

/// Returns the `item` of every match, in cursor order.
pub async fn items(collection: &Collection<SqliteEngine>, filter: Value) -> Vec<String> {
    collection
        .find(&filter)
        .unwrap()
        .to_array()
        .await
        .unwrap()
        .into_iter()
        .map(|document| document["item"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Returns the `_id` of every match, in cursor order.
pub async fn ids(collection: &Collection<SqliteEngine>, filter: Value) -> Vec<String> {
    collection
        .find(&filter)
        .unwrap()
        .to_array()
        .await
        .unwrap()
        .into_iter()
        .map(|document| document.id().unwrap_or_default().to_string())
        .collect()
}
