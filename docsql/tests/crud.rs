mod common;

use common::{database, inventory, seeded};
use docsql::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Item {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    item: String,
    qty: u32,
}

#[tokio::test]
async fn insert_one_generates_an_object_id_as_the_first_key() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();

    let result = inventory
        .insert_one(&json!({ "item": "canvas", "qty": 100 }))
        .await
        .unwrap();
    assert_eq!(result.inserted_id.len(), 24);
    assert!(result.inserted_id.chars().all(|c| c.is_ascii_hexdigit()));

    let stored = inventory.find_one(&result.inserted_id).await.unwrap().unwrap();
    assert_eq!(stored.keys().next().map(String::as_str), Some(ID_FIELD));
    assert_eq!(stored.id(), Some(result.inserted_id.as_str()));
    assert_eq!(stored["item"], "canvas");
}

#[tokio::test]
async fn insert_one_keeps_a_supplied_id() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();

    let result = inventory
        .insert_one(&json!({ "item": "canvas", "_id": "canvas-1" }))
        .await
        .unwrap();
    assert_eq!(result.inserted_id, "canvas-1");

    let stored = inventory.find_one("canvas-1").await.unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&stored).unwrap().to_string(),
        r#"{"_id":"canvas-1","item":"canvas"}"#
    );
}

#[tokio::test]
async fn duplicate_ids_are_rejected() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();
    inventory.insert_one(&json!({ "_id": "a", "item": "journal" })).await.unwrap();

    let err = inventory
        .insert_one(&json!({ "_id": "a", "item": "paper" }))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DocumentStoreError::DocumentAlreadyExists(ref id, ref collection) if id == "a" && collection == "inventory"),
        "{err:?}"
    );
    assert_eq!(inventory.count_documents(&json!({})).await.unwrap(), 1);
}

#[tokio::test]
async fn insert_many_reports_ids_by_position() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();

    let result = inventory
        .insert_many(&[json!({ "item": "journal" }), json!({ "_id": "second", "item": "notebook" })])
        .await
        .unwrap();
    assert_eq!(result.inserted_count, 2);
    assert_eq!(result.inserted_ids.len(), 2);
    assert_eq!(result.inserted_ids[&1], "second");
    assert_eq!(result.inserted_ids[&0].len(), 24);
}

#[tokio::test]
async fn insert_many_keeps_the_prefix_committed_before_a_failure() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();

    let err = inventory
        .insert_many(&[
            json!({ "_id": "a", "item": "journal" }),
            json!({ "_id": "b", "item": "notebook" }),
            json!({ "_id": "a", "item": "paper" }),
            json!({ "_id": "c", "item": "planner" }),
        ])
        .await
        .unwrap_err();

    let DocumentStoreError::PartialInsert { result, source } = err else {
        panic!("expected a partial insert, got {err:?}");
    };
    assert_eq!(result.inserted_count, 2);
    assert_eq!(result.inserted_ids.values().collect::<Vec<_>>(), ["a", "b"]);
    assert!(matches!(*source, DocumentStoreError::DocumentAlreadyExists(ref id, _) if id == "a"));

    assert_eq!(inventory.count_documents(&json!({})).await.unwrap(), 2);
    assert!(inventory.find_one("c").await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_documents_are_rejected_before_anything_is_written() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();

    let err = inventory
        .insert_many(&[json!({ "item": "journal" }), json!(["not", "an", "object"])])
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidDocument(_)), "{err:?}");

    let err = inventory.insert_one(&json!({ "_id": 7, "item": "paper" })).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidDocument(_)), "{err:?}");
    assert!(err.is_validation());

    // validation runs before the table is created
    assert!(db.list_collections().await.unwrap().is_empty());
}

#[tokio::test]
async fn typed_documents_round_trip() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();

    let canvas = Item {
        id: None,
        item: "canvas".to_string(),
        qty: 100,
    };
    let id = inventory.insert_one(&canvas).await.unwrap().inserted_id;

    let stored: Item = inventory.find_one_as(Filter::eq("item", "canvas")).await.unwrap().unwrap();
    assert_eq!(stored, Item { id: Some(id), ..canvas });
}

#[tokio::test]
async fn find_one_returns_the_first_match_in_insertion_order() {
    let db = database().await;
    let inventory = seeded(&db, "inventory", &inventory()).await;

    let first = inventory.find_one(json!({ "status": "A" })).await.unwrap().unwrap();
    assert_eq!(first["item"], "journal");

    let none = inventory.find_one(json!({ "status": "X" })).await.unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn delete_one_removes_a_single_match() {
    let db = database().await;
    let inventory = seeded(&db, "inventory", &inventory()).await;

    let result = inventory.delete_one(json!({ "status": "D" })).await.unwrap();
    assert_eq!(result.deleted_count, 1);
    assert_eq!(common::items(&inventory, json!({ "status": "D" })).await, ["planner"]);

    let result = inventory.delete_one("no-such-id").await.unwrap();
    assert_eq!(result.deleted_count, 0);
}

#[tokio::test]
async fn delete_many_removes_every_match() {
    let db = database().await;
    let inventory = seeded(&db, "inventory", &inventory()).await;

    let result = inventory.delete_many(&json!({ "status": "A" })).await.unwrap();
    assert_eq!(result.deleted_count, 3);
    assert_eq!(inventory.count_documents(&json!({})).await.unwrap(), 2);

    let result = inventory.delete_many(&serde_json::Value::Null).await.unwrap();
    assert_eq!(result.deleted_count, 2);
    assert_eq!(inventory.count_documents(&json!({})).await.unwrap(), 0);
}

#[tokio::test]
async fn replace_one_keeps_the_stored_id_and_position() {
    let db = database().await;
    let inventory = seeded(&db, "inventory", &inventory()).await;
    let paper = inventory.find_one(json!({ "item": "paper" })).await.unwrap().unwrap();
    let id = paper.id().unwrap().to_string();

    let result = inventory
        .replace_one(&id, &json!({ "item": "paper", "qty": 10, "status": "A" }))
        .await
        .unwrap();
    assert_eq!(result.modified_count, 1);

    let replaced = inventory.find_one(&id).await.unwrap().unwrap();
    assert_eq!(replaced.id(), Some(id.as_str()));
    assert_eq!(replaced["qty"], 10);
    assert!(replaced.get("size").is_none());

    // still third in insertion order
    assert_eq!(
        common::items(&inventory, json!({ "status": "A" })).await,
        ["journal", "notebook", "paper", "postcard"]
    );
}

#[tokio::test]
async fn replace_one_refuses_to_change_the_id() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();
    inventory.insert_one(&json!({ "_id": "a", "item": "journal" })).await.unwrap();

    let err = inventory
        .replace_one("a", &json!({ "_id": "b", "item": "journal" }))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DocumentStoreError::ImmutableId { ref current, ref attempted } if current == "a" && attempted == "b"),
        "{err:?}"
    );

    let result = inventory
        .replace_one("a", &json!({ "_id": "a", "item": "diary" }))
        .await
        .unwrap();
    assert_eq!(result.modified_count, 1);
}

#[tokio::test]
async fn replace_one_without_a_match_inserts_nothing() {
    let db = database().await;
    let inventory = seeded(&db, "inventory", &inventory()).await;

    let result = inventory
        .replace_one(json!({ "item": "canvas" }), &json!({ "item": "canvas" }))
        .await
        .unwrap();
    assert_eq!(result.modified_count, 0);
    assert_eq!(inventory.count_documents(&json!({})).await.unwrap(), 5);
}

#[tokio::test]
async fn collection_names_are_validated_and_case_insensitive() {
    let db = database().await;

    let err = db.collection("bad-name").unwrap_err();
    assert!(matches!(err, DocumentStoreError::InvalidCollectionName(_)));

    let upper = db.collection("Inventory").unwrap();
    upper.insert_one(&json!({ "_id": "a" })).await.unwrap();

    let lower = db.collection("inventory").unwrap();
    assert_eq!(lower.name(), "inventory");
    assert_eq!(lower.table_name(), "collection_inventory");
    assert!(lower.find_one("a").await.unwrap().is_some());
}

#[tokio::test]
async fn collections_are_independent_and_listed() {
    let db = database().await;
    seeded(&db, "inventory", &inventory()).await;
    let orders = db.collection("orders").unwrap();
    orders.insert_one(&json!({ "item": "journal" })).await.unwrap();

    assert_eq!(db.list_collections().await.unwrap(), ["inventory", "orders"]);
    assert_eq!(orders.count_documents(&json!({})).await.unwrap(), 1);
}

#[tokio::test]
async fn suffixed_names_do_not_collide_with_id_indexes() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();
    inventory.insert_one(&json!({ "_id": "a", "item": "journal" })).await.unwrap();

    let suffixed = db.collection("inventory_id").unwrap();
    suffixed.insert_one(&json!({ "_id": "a", "item": "notebook" })).await.unwrap();

    let reversed = db.collection("orders_id").unwrap();
    reversed.insert_one(&json!({ "item": "paper" })).await.unwrap();
    let orders = db.collection("orders").unwrap();
    orders.insert_one(&json!({ "item": "planner" })).await.unwrap();

    assert_eq!(
        db.list_collections().await.unwrap(),
        ["inventory", "inventory_id", "orders", "orders_id"]
    );
    assert_eq!(inventory.find_one("a").await.unwrap().unwrap()["item"], "journal");
    assert_eq!(suffixed.find_one("a").await.unwrap().unwrap()["item"], "notebook");
    let err = suffixed.insert_one(&json!({ "_id": "a" })).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::DocumentAlreadyExists(..)), "{err:?}");
}

#[tokio::test]
async fn uuid_generator_can_replace_object_ids() {
    let db = Database::builder(docsql::sqlite::SqliteEngine::open_in_memory().unwrap())
        .id_generator(UuidGenerator)
        .build();
    let inventory = db.collection("inventory").unwrap();

    let id = inventory.insert_one(&json!({ "item": "canvas" })).await.unwrap().inserted_id;
    assert_eq!(id.len(), 32);
}

#[tokio::test]
async fn operations_fail_after_close() {
    let db = database().await;
    let inventory = seeded(&db, "inventory", &inventory()).await;
    let untouched = db.collection("orders").unwrap();

    db.close().await.unwrap();

    let err = inventory.count_documents(&json!({})).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::Closed), "{err:?}");
    let err = untouched.insert_one(&json!({ "item": "journal" })).await.unwrap_err();
    assert!(matches!(err, DocumentStoreError::Closed), "{err:?}");
}

#[tokio::test]
async fn results_serialize_in_camel_case() {
    let db = database().await;
    let inventory = db.collection("inventory").unwrap();

    let inserted = inventory
        .insert_many(&[json!({ "_id": "a" }), json!({ "_id": "b" })])
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&inserted).unwrap(),
        json!({ "insertedCount": 2, "insertedIds": { "0": "a", "1": "b" } })
    );

    let deleted = inventory.delete_many(&json!({})).await.unwrap();
    assert_eq!(serde_json::to_value(deleted).unwrap(), json!({ "deletedCount": 2 }));
}
