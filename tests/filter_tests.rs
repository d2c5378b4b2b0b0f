//! Depth-scoped filter behavior through the whole engine.

mod common;

use common::{fixture_schema, seeded_db};
use pullsql::{filter_params_to_filters, run_query, FilterRule, Filters, Prop, QueryNode};
use serde_json::json;

fn invoices_query() -> Vec<QueryNode> {
    vec![
        QueryNode::prop("db/id"),
        QueryNode::prop("account/name"),
        QueryNode::join(
            "account/invoices",
            vec![
                QueryNode::prop("db/id"),
                QueryNode::join(
                    "invoice/items",
                    vec![QueryNode::prop("db/id"), QueryNode::prop("item/name")],
                ),
            ],
        ),
    ]
}

fn item_names(result: &[serde_json::Value]) -> Vec<Vec<String>> {
    result[0]["account/invoices"]
        .as_array()
        .unwrap()
        .iter()
        .map(|invoice| {
            invoice["invoice/items"]
                .as_array()
                .unwrap()
                .iter()
                .map(|item| item["item/name"].as_str().unwrap().to_string())
                .collect()
        })
        .collect()
}

#[test]
fn test_filter_below_its_min_depth_has_no_effect() {
    let schema = fixture_schema();
    let (mut db, ids) = seeded_db(&schema);
    // Items are fetched at depth 3; a rule starting at depth 4 never fires.
    let filters = filter_params_to_filters(
        &schema,
        &[(
            Prop::from("item/name"),
            FilterRule::eq(json!("gadget")).min_depth(4),
        )],
    )
    .unwrap();
    let result = run_query(
        &mut db,
        &schema,
        &Prop::from("account/id"),
        &invoices_query(),
        &[ids["joe"]],
        &filters,
    )
    .unwrap();
    assert_eq!(
        item_names(&result),
        vec![
            vec!["gadget".to_string()],
            vec![
                "widget".to_string(),
                "spanner".to_string(),
                "gadget".to_string()
            ],
        ]
    );
}

#[test]
fn test_filter_at_its_min_depth_restricts_rows() {
    let schema = fixture_schema();
    let (mut db, ids) = seeded_db(&schema);
    let filters = filter_params_to_filters(
        &schema,
        &[(
            Prop::from("item/name"),
            FilterRule::eq(json!("gadget")).min_depth(3),
        )],
    )
    .unwrap();
    let result = run_query(
        &mut db,
        &schema,
        &Prop::from("account/id"),
        &invoices_query(),
        &[ids["joe"]],
        &filters,
    )
    .unwrap();
    assert_eq!(
        item_names(&result),
        vec![vec!["gadget".to_string()], vec!["gadget".to_string()]]
    );
}

#[test]
fn test_filter_past_its_max_depth_is_excluded() {
    let schema = fixture_schema();
    let (mut db, ids) = seeded_db(&schema);
    // max_depth 2 means the rule is gone by the time items are fetched.
    let filters = filter_params_to_filters(
        &schema,
        &[(
            Prop::from("item/name"),
            FilterRule::eq(json!("gadget")).max_depth(2),
        )],
    )
    .unwrap();
    let result = run_query(
        &mut db,
        &schema,
        &Prop::from("account/id"),
        &invoices_query(),
        &[ids["joe"]],
        &filters,
    )
    .unwrap();
    assert_eq!(item_names(&result)[1].len(), 3);
}

#[test]
fn test_filters_apply_at_the_root_level() {
    let schema = fixture_schema();
    let (mut db, ids) = seeded_db(&schema);
    let filters = filter_params_to_filters(
        &schema,
        &[(Prop::from("account/name"), FilterRule::eq(json!("joe")))],
    )
    .unwrap();
    let query = vec![QueryNode::prop("db/id"), QueryNode::prop("account/name")];
    let result = run_query(
        &mut db,
        &schema,
        &Prop::from("account/id"),
        &query,
        &[ids["joe"], ids["mary"]],
        &filters,
    )
    .unwrap();
    assert_eq!(
        result,
        vec![json!({"db/id": ids["joe"], "account/name": "joe"})]
    );
}

#[test]
fn test_null_comparator_end_to_end() {
    let schema = fixture_schema();
    let (mut db, ids) = seeded_db(&schema);
    // Only the top-level todo item has a list id; its children carry NULL.
    let filters = filter_params_to_filters(
        &schema,
        &[(
            Prop::from("todo-list-item/list-id"),
            FilterRule::null(false),
        )],
    )
    .unwrap();
    let query = vec![
        QueryNode::prop("db/id"),
        QueryNode::prop("todo-list-item/label"),
    ];
    let result = run_query(
        &mut db,
        &schema,
        &Prop::from("todo-list-item/id"),
        &query,
        &[ids["item-a"], ids["item-a1"], ids["item-a1a"]],
        &filters,
    )
    .unwrap();
    assert_eq!(
        result,
        vec![json!({
            "db/id": ids["item-a"],
            "todo-list-item/label": "sweep",
        })]
    );
}

#[test]
fn test_running_without_filters_is_the_default_behavior() {
    let schema = fixture_schema();
    let (mut db, ids) = seeded_db(&schema);
    let query = vec![QueryNode::prop("db/id"), QueryNode::prop("account/name")];
    let unfiltered = run_query(
        &mut db,
        &schema,
        &Prop::from("account/id"),
        &query,
        &[ids["joe"], ids["mary"]],
        &Filters::empty(),
    )
    .unwrap();
    assert_eq!(unfiltered.len(), 2);
}
