//! Payload lists shared by every resource family.

/// Non-numeric path identifiers.
pub const MALFORMED_IDS: &[&str] = &["abc", "@#$", "1.5"];

pub const NONEXISTENT_ID: i64 = 9999;
pub const INVALID_ID: &str = "invalid";
pub const NEGATIVE_ID: &str = "-1";

pub const LONG_STRING_LENGTHS: &[usize] = &[1_000, 10_000, 50_000];

pub const XSS_PAYLOADS: &[&str] = &[
    "<script>alert('xss')</script>",
    "<img src=x onerror=alert('xss')>",
    "javascript:alert('xss')",
    "<svg onload=alert('xss')>",
    "<iframe src=javascript:alert('xss')>",
    "<body onload=alert('xss')>",
    "';alert('xss');//",
];

/// Path-segment SQL payloads aimed at one table. `columns` is the projection
/// used by the column-guessing UNION payload.
pub fn sql_injection_payloads(table: &str, columns: &str) -> Vec<String> {
    vec![
        "1' OR '1'='1".to_string(),
        format!("1; DROP TABLE {table};"),
        format!("1' UNION SELECT * FROM {table}--"),
        "1' OR 1=1--".to_string(),
        "admin'--".to_string(),
        format!("'; DELETE FROM {table}; --"),
        format!("1' UNION SELECT {columns} FROM {table}--"),
    ]
}

pub fn long_string(length: usize) -> String {
    "A".repeat(length)
}

pub mod auth {
    pub const VALID_LOGINS: &[(&str, &str)] = &[
        ("mor_2314", "83r5^_"),
        ("kevinryan", "kev02937@"),
        ("donero", "ewedon"),
        ("derek", "jklg*_56"),
        ("david_r", "3478*#54"),
    ];

    pub const MALFORMED_BODIES: &[&str] = &[
        "{username: 'mor_2314', password: '83r5^_'}",
        r#"{"username": "mor_2314", "password": }"#,
        r#"{"username": "mor_2314", "password": "83r5^_""#,
        "username: 'mor_2314', password: '83r5^_'",
        r#"{"username": "mor_2314", "password": "83r5^_", }"#,
        r#"{"username": "mor_2314" "password": "83r5^_"}"#,
        "{'username': 'mor_2314', 'password': '83r5^_'}",
    ];

    pub const SQL_INJECTION: &[&str] = &[
        "' OR '1'='1",
        "admin'--",
        "' OR 1=1--",
        "'; DROP TABLE users; --",
        "' UNION SELECT * FROM users--",
        "admin'; DELETE FROM users; --",
        "' OR 'x'='x",
        "1' OR '1'='1' /*",
        "admin'/*",
        "' OR 1=1#",
    ];

    pub const EXTRA_XSS: &[&str] = &[
        "<script>document.cookie</script>",
        "<img src=x onerror=document.location='http://evil.com'>",
    ];

    pub const SPECIAL_CHARACTERS: &[(&str, &str)] = &[
        ("user@domain.com", "password123"),
        ("user.name", "password123"),
        ("user_name", "password123"),
        ("user-name", "password123"),
        ("user+name", "password123"),
        ("user name", "password123"),
        ("user#name", "password123"),
        ("user$name", "password123"),
        ("user%name", "password123"),
        ("user&name", "password123"),
        ("user*name", "password123"),
        ("testuser", "pass@word"),
        ("testuser", "pass#word"),
        ("testuser", "pass$word"),
        ("testuser", "pass%word"),
        ("testuser", "pass&word"),
        ("testuser", "pass*word"),
        ("testuser", "pass+word"),
        ("testuser", "pass=word"),
        ("testuser", "pass word"),
        ("testuser", "pass\tword"),
        ("testuser", "pass\nword"),
    ];

    pub const BOUNDARY_LENGTHS: &[usize] = &[1, 2, 3, 50, 100, 255];

    pub const ENCODINGS: &[(&str, &str)] = &[
        ("usér", "passwörd"),
        ("用户", "密码"),
        ("пользователь", "пароль"),
        ("مستخدم", "كلمة مرور"),
        ("ユーザー", "パスワード"),
        ("user😀", "pass🔒"),
        ("👤user", "🔑password"),
        ("user%20name", "pass%40word"),
        ("user%2Bname", "pass%26word"),
    ];

    pub const CASE_VARIATIONS: &[(&str, &str)] = &[
        ("MOR_2314", "83r5^_"),
        ("mor_2314", "83R5^_"),
        ("MOR_2314", "83R5^_"),
        ("Mor_2314", "83r5^_"),
        ("mor_2314", "83r5^_"),
        ("KeViNrYaN", "kev02937@"),
        ("kevinryan", "KEV02937@"),
        ("KEVINRYAN", "kev02937@"),
    ];

    pub const NUMERIC: &[(&str, &str)] = &[
        ("12345", "67890"),
        ("123", "456"),
        ("1", "1"),
        ("user123", "pass456"),
        ("123user", "456pass"),
        ("user1", "pass1"),
    ];

    pub const WHITESPACE: &[(&str, &str)] = &[
        (" mor_2314", "83r5^_"),
        ("mor_2314 ", "83r5^_"),
        (" mor_2314 ", "83r5^_"),
        ("mor_2314", " 83r5^_"),
        ("mor_2314", "83r5^_ "),
        ("mor_2314", " 83r5^_ "),
        ("\tmor_2314", "83r5^_"),
        ("mor_2314\n", "83r5^_"),
        ("mor_2314", "\t83r5^_"),
        ("mor_2314", "83r5^_\n"),
    ];
}
