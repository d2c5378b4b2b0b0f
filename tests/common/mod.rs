//! Shared fixture: a small commerce-and-household schema over the
//! in-memory database, seeded through the placeholder helper.
//!
//! Tables: accounts (with a spouse self-join), members, invoices, items
//! (many-to-many via invoice_items) and a todo-list tree for recursion
//! tests.

#![allow(dead_code)]

use pullsql::seed::{seed, SeedOp, SeedRow, SeedValue};
use pullsql::testing::MemDb;
use pullsql::{JoinArity, Schema};
use serde_json::{json, Value};
use std::collections::HashMap;

pub fn ph(name: &str) -> SeedValue {
    SeedValue::placeholder(name)
}

pub fn lit(value: Value) -> SeedValue {
    SeedValue::from(value)
}

pub fn row(pairs: Vec<(&str, SeedValue)>) -> SeedRow {
    pairs
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}

pub fn fixture_schema() -> Schema {
    Schema::builder()
        .graph_to_sql("person/name", "member/name")
        .pk("account", "id")
        .pk("member", "id")
        .pk("invoice", "id")
        .pk("item", "id")
        .pk("todo_list", "id")
        .pk("todo_list_item", "id")
        .join(
            "account/members",
            &["account/id", "member/account_id"],
            JoinArity::ToMany,
        )
        .join(
            "member/account",
            &["member/account_id", "account/id"],
            JoinArity::ToOne,
        )
        .join(
            "account/invoices",
            &["account/id", "invoice/account_id"],
            JoinArity::ToMany,
        )
        .join(
            "invoice/items",
            &[
                "invoice/id",
                "invoice-items/invoice-id",
                "invoice-items/item-id",
                "item/id",
            ],
            JoinArity::ToMany,
        )
        .join(
            "account/spouse",
            &["account/spouse_id", "account/id"],
            JoinArity::ToOne,
        )
        .join(
            "todo-list/items",
            &["todo-list/id", "todo-list-item/list-id"],
            JoinArity::ToMany,
        )
        .join(
            "todo-list-item/subitems",
            &["todo-list-item/id", "todo-list-item/parent-id"],
            JoinArity::ToMany,
        )
        .build()
        .unwrap()
}

/// Seed the full fixture and return the database plus the placeholder map.
pub fn seeded_db(schema: &Schema) -> (MemDb, HashMap<String, i64>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut db = MemDb::new();
    let ops = vec![
        SeedOp::insert(
            "account",
            row(vec![
                ("id", ph("joe")),
                ("name", lit(json!("joe"))),
                ("spouse_id", ph("mary")),
            ]),
        ),
        SeedOp::insert(
            "account",
            row(vec![
                ("id", ph("mary")),
                ("name", lit(json!("mary"))),
                ("spouse_id", ph("joe")),
            ]),
        ),
        SeedOp::insert(
            "member",
            row(vec![
                ("id", ph("alice")),
                ("name", lit(json!("alice"))),
                ("account_id", ph("joe")),
            ]),
        ),
        SeedOp::insert(
            "member",
            row(vec![
                ("id", ph("bob")),
                ("name", lit(json!("bob"))),
                ("account_id", ph("joe")),
            ]),
        ),
        SeedOp::insert(
            "member",
            row(vec![
                ("id", ph("carol")),
                ("name", lit(json!("carol"))),
                ("account_id", ph("mary")),
            ]),
        ),
        SeedOp::insert(
            "invoice",
            row(vec![("id", ph("inv1")), ("account_id", ph("joe"))]),
        ),
        SeedOp::insert(
            "invoice",
            row(vec![("id", ph("inv2")), ("account_id", ph("joe"))]),
        ),
        SeedOp::insert(
            "item",
            row(vec![("id", ph("widget")), ("name", lit(json!("widget")))]),
        ),
        SeedOp::insert(
            "item",
            row(vec![("id", ph("spanner")), ("name", lit(json!("spanner")))]),
        ),
        SeedOp::insert(
            "item",
            row(vec![("id", ph("gadget")), ("name", lit(json!("gadget")))]),
        ),
        SeedOp::insert(
            "invoice_items",
            row(vec![("invoice_id", ph("inv1")), ("item_id", ph("gadget"))]),
        ),
        SeedOp::insert(
            "invoice_items",
            row(vec![("invoice_id", ph("inv2")), ("item_id", ph("widget"))]),
        ),
        SeedOp::insert(
            "invoice_items",
            row(vec![("invoice_id", ph("inv2")), ("item_id", ph("spanner"))]),
        ),
        SeedOp::insert(
            "invoice_items",
            row(vec![("invoice_id", ph("inv2")), ("item_id", ph("gadget"))]),
        ),
        SeedOp::insert(
            "todo_list",
            row(vec![("id", ph("chores")), ("name", lit(json!("chores")))]),
        ),
        SeedOp::insert(
            "todo_list_item",
            row(vec![
                ("id", ph("item-a")),
                ("label", lit(json!("sweep"))),
                ("list_id", ph("chores")),
                ("parent_id", lit(Value::Null)),
            ]),
        ),
        SeedOp::insert(
            "todo_list_item",
            row(vec![
                ("id", ph("item-a1")),
                ("label", lit(json!("sweep kitchen"))),
                ("list_id", lit(Value::Null)),
                ("parent_id", ph("item-a")),
            ]),
        ),
        SeedOp::insert(
            "todo_list_item",
            row(vec![
                ("id", ph("item-a1a")),
                ("label", lit(json!("sweep under the kitchen table"))),
                ("list_id", lit(Value::Null)),
                ("parent_id", ph("item-a1")),
            ]),
        ),
    ];
    let ids = seed(&mut db, schema, &ops).unwrap();
    (db, ids)
}
