use serde_json::{Value, json};

use crate::resources::{Cart, CartItem, ResourceRecord};

use super::expectation::Expectation;
use super::family::{FieldProbe, ProbeValue, RequiredField, ResourceFamily};

fn rejection() -> Expectation {
    Expectation::codes([400, 422]).tolerate([403, 200])
}

fn items(pairs: &[(i64, i64)]) -> Vec<CartItem> {
    pairs
        .iter()
        .map(|&(product_id, quantity)| CartItem::new(product_id, quantity))
        .collect()
}

fn single_item(product_id: Value, quantity: Value) -> ProbeValue {
    ProbeValue::value(json!([{"productId": product_id, "quantity": quantity}]))
}

pub fn family() -> ResourceFamily {
    let template = Cart::new(1, items(&[(1, 2)]), "2024-01-01");

    let update = |id: i64, pairs: &[(i64, i64)], date: &str| {
        (
            id,
            ResourceRecord::from(Cart::new(id, items(pairs), date).with_id(id)),
        )
    };

    let int_min = i64::from(i32::MIN);
    let int_max = i64::from(i32::MAX);

    ResourceFamily {
        name: "carts",
        endpoint: "/carts".to_string(),
        table: "carts",
        sql_columns: "id,userId",
        primary_text_field: "date",
        template: template.into(),
        valid_records: vec![
            Cart::new(1, items(&[(1, 2), (2, 1)]), "2024-01-01").into(),
            Cart::new(2, items(&[(3, 1), (4, 3), (5, 2)]), "2024-01-02").into(),
            Cart::new(3, items(&[(1, 5)]), "2024-01-03").into(),
            Cart::new(4, items(&[(2, 2), (6, 1)]), "2024-01-04").into(),
            Cart::new(5, items(&[(7, 1), (8, 2), (9, 1), (10, 1)]), "2024-01-05").into(),
        ],
        update_records: vec![
            update(1, &[(1, 5), (3, 2)], "2024-02-01"),
            update(2, &[(4, 1)], "2024-02-02"),
            update(3, &[(1, 3), (2, 3), (5, 1)], "2024-02-03"),
        ],
        required_fields: vec![
            RequiredField::number("userId"),
            RequiredField::list("products"),
            RequiredField::text("date"),
        ],
        valid_ids: vec![1, 2, 3, 4, 5],
        invalid_ids: vec![-1, 0, 999, 1000, 9999, int_max],
        boundary_ids: vec![1, 5, 0, 6, -1, int_min, int_max],
        malformed_bodies: vec![
            "{userId: 1, products: [], date: '2024-01-01'}",
            r#"{"userId": 1, "products": }"#,
            r#"{"userId": 1, "products": []"#,
            "userId: 1, products: [], date: '2024-01-01'",
            r#"{"userId": 1, "products": [], "date": "2024-01-01", }"#,
        ],
        partial_updates: vec![
            (1, r#"{"date": "2024-03-01"}"#),
            (2, r#"{"products": [{"productId": 1, "quantity": 9}]}"#),
            (3, r#"{"userId": 2}"#),
        ],
        create_rejection: rejection(),
        probes: vec![
            FieldProbe::new("invalid_user_id", "userId", rejection())
                .values([
                    ProbeValue::value(-1),
                    ProbeValue::value(0),
                    ProbeValue::null(),
                    ProbeValue::value(999),
                    ProbeValue::value(1000),
                    ProbeValue::value(int_max),
                    ProbeValue::value(int_min),
                ])
                .tags(&["negative", "field:userId"]),
            FieldProbe::new("invalid_product_id", "products", rejection())
                .values([
                    single_item(json!(-1), json!(1)),
                    single_item(json!(0), json!(1)),
                    single_item(Value::Null, json!(1)),
                    single_item(json!(999), json!(1)),
                    single_item(json!(1000), json!(1)),
                    single_item(json!(int_max), json!(1)),
                ])
                .tags(&["negative", "field:products"]),
            FieldProbe::new("invalid_quantity", "products", rejection())
                .values([
                    single_item(json!(1), json!(-5)),
                    single_item(json!(1), json!(-1)),
                    single_item(json!(1), json!(-50)),
                    single_item(json!(1), json!(0)),
                    single_item(json!(1), Value::Null),
                    single_item(json!(1), json!(int_max)),
                    single_item(json!(1), json!(int_min)),
                ])
                .tags(&["negative", "field:products"]),
            FieldProbe::new(
                "extreme_quantity",
                "products",
                Expectation::codes([200, 201, 400, 422]).tolerate([403]),
            )
            .values([
                single_item(json!(1), json!(1_000_000)),
                single_item(json!(1), json!(-999_999)),
                single_item(json!(1), json!(0)),
                single_item(json!(1), json!(1)),
                single_item(json!(1), json!(999)),
            ])
            .tags(&["boundary", "field:products"]),
            FieldProbe::new("invalid_date", "date", rejection())
                .values([
                    ProbeValue::value("invalid-date"),
                    ProbeValue::value("2024/01/01"),
                    ProbeValue::value("01-01-2024"),
                    ProbeValue::value("2024-13-01"),
                    ProbeValue::value("2024-01-32"),
                    ProbeValue::value(""),
                    ProbeValue::null(),
                    ProbeValue::value("not-a-date"),
                    ProbeValue::value("2024-01-01T25:00:00"),
                ])
                .tags(&["negative", "field:date"]),
            FieldProbe::new("empty_products", "products", rejection())
                .values([ProbeValue::value(json!([]))])
                .tags(&["negative", "field:products"]),
            FieldProbe::new("duplicate_product_ids", "products", rejection())
                .values([
                    ProbeValue::value(json!([
                        {"productId": 1, "quantity": 2},
                        {"productId": 1, "quantity": 3},
                        {"productId": 1, "quantity": 1}
                    ])),
                    ProbeValue::value(json!([
                        {"productId": 1, "quantity": 2},
                        {"productId": 2, "quantity": 1},
                        {"productId": 1, "quantity": 5}
                    ])),
                ])
                .tags(&["negative", "field:products"]),
        ],
    }
}
