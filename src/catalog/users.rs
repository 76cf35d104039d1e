use crate::resources::{ResourceRecord, User};

use super::expectation::Expectation;
use super::family::{FieldProbe, ProbeValue, RequiredField, ResourceFamily};

pub fn family() -> ResourceFamily {
    let template = User::new("testuser", "test@example.com", "password123");

    let update = |id: i64, suffix: &str, password: &str| {
        (
            id,
            ResourceRecord::from(
                User::new(
                    &format!("updated_user{suffix}"),
                    &format!("updated{suffix}@example.com"),
                    password,
                )
                .with_id(id),
            ),
        )
    };

    ResourceFamily {
        name: "users",
        endpoint: "/users".to_string(),
        table: "users",
        sql_columns: "id,username,email",
        primary_text_field: "username",
        template: template.into(),
        valid_records: vec![
            User::new("testuser1", "test1@example.com", "password123").into(),
            User::new("testuser2", "test2@example.com", "securePass456").into(),
            User::new("john_doe", "john@test.com", "myPassword789").into(),
        ],
        update_records: vec![
            update(1, "1", "newPassword123"),
            update(2, "2", "newPassword456"),
            update(3, "3", "newPassword789"),
        ],
        required_fields: vec![
            RequiredField::text("username"),
            RequiredField::text("email"),
            RequiredField::text("password"),
        ],
        valid_ids: vec![1, 2, 3, 4, 5],
        invalid_ids: vec![-1, 0, 9999, i64::from(i32::MAX)],
        boundary_ids: vec![1, 10, 0, 11, -1, i64::from(i32::MIN), i64::from(i32::MAX)],
        malformed_bodies: vec![
            "{username: 'test', email: 'test@example.com', password: 'invalid-json'}",
            r#"{"username": "test", "email": }"#,
            r#"{"username": "test", "email": "test@example.com""#,
            "username: 'test', email: 'test@example.com', password: 'test'",
            r#"{"username": "test", "email": "test@example.com", "password": "test", }"#,
        ],
        partial_updates: vec![
            (1, r#"{"email": "partial@example.com"}"#),
            (2, r#"{"username": "partial_user"}"#),
            (3, r#"{"password": "partialPassword"}"#),
            (1, r#"{"username": "new_name", "email": "new@example.com"}"#),
        ],
        create_rejection: Expectation::codes([400, 422]).tolerate([403]),
        probes: vec![
            FieldProbe::new(
                "invalid_email",
                "email",
                Expectation::codes([400, 422]).tolerate([403]),
            )
            .values([
                ProbeValue::value("invalid-email"),
                ProbeValue::value("plainaddress"),
                ProbeValue::value("@missing-local.com"),
                ProbeValue::value("user@"),
            ])
            .tags(&["negative", "field:email"]),
        ],
    }
}
