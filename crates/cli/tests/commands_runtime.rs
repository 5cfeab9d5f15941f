use std::env;
use std::sync::{mpsc, Mutex, OnceLock};

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use shopfront_cli::commands::{config, doctor, reviews};

const RED_MUG_ID: &str = "9b2e7c1a-5d4f-4e3b-a6c8-1f0e2d3c0001";
const GREEN_LAMP_ID: &str = "9b2e7c1a-5d4f-4e3b-a6c8-1f0e2d3c0002";
const NO_VARS: [(&str, &str); 0] = [];

#[test]
fn reviews_returns_external_reviews_as_json() {
    let base = fake_upstreams();
    with_env(&upstream_env(&base), || {
        let result = reviews::run(RED_MUG_ID, false);
        assert_eq!(result.exit_code, 0, "expected reviews to resolve: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "reviews");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["source"], "external");
        assert_eq!(payload["data"]["productInfo"]["productId"], 2);
        assert_eq!(payload["data"]["reviews"][0]["reviewId"], 71);
    });
}

#[test]
fn reviews_random_returns_a_single_review() {
    let base = fake_upstreams();
    with_env(&upstream_env(&base), || {
        let result = reviews::run(RED_MUG_ID, true);
        assert_eq!(result.exit_code, 0, "expected a random review: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["reviewerName"], "Lee");
        assert_eq!(payload["data"]["productInfo"]["name"], "Red Mug");
    });
}

#[test]
fn reviews_fall_back_to_mock_tier_when_unmatched() {
    let base = fake_upstreams();
    with_env(&upstream_env(&base), || {
        let result = reviews::run(GREEN_LAMP_ID, false);
        assert_eq!(result.exit_code, 0, "expected mock tier to answer: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["source"], "fallback");
        assert_eq!(payload["data"]["productInfo"]["name"], "Green Lamp");
        assert_eq!(payload["data"]["reviews"][0]["reviewerName"], "Anonymous");
    });
}

#[test]
fn match_reports_no_external_match_for_unknown_product() {
    let base = fake_upstreams();
    with_env(&upstream_env(&base), || {
        let result = reviews::run_match("00000000-0000-0000-0000-000000000000");
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "match");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "no_external_match");
    });
}

#[test]
fn reviews_returns_config_failure_without_api_key() {
    with_env(&NO_VARS, || {
        let result = reviews::run(RED_MUG_ID, false);
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "reviews");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_redacts_secrets_and_reports_env_sources() {
    with_env(
        &[
            ("SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL", "https://reviews.example.test"),
            ("SHOPFRONT_REVIEWS_EXTERNAL_API_KEY", "extkey-0123456789abcdef"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);
            let output = result.output;

            assert!(output.contains(
                "- reviews.external_api_key = extk*** (source: env (SHOPFRONT_REVIEWS_EXTERNAL_API_KEY))"
            ));
            assert!(output.contains("- reviews.mock_functions_key = <unset> (source: default)"));
            assert!(output.contains("- reviews.request_timeout_ms = 5000 (source: default)"));
            assert!(!output.contains("0123456789abcdef"));
        },
    );
}

#[test]
fn config_returns_validation_failure_code_without_api_key() {
    with_env(&[("SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL", "https://reviews.example.test")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "config");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn doctor_fails_when_an_upstream_is_unreachable() {
    let base = fake_upstreams();
    let mut vars = upstream_env(&base);
    vars.retain(|(key, _)| *key != "SHOPFRONT_REVIEWS_MOCK_BASE_URL");
    vars.push(("SHOPFRONT_REVIEWS_MOCK_BASE_URL", "http://127.0.0.1:9".to_string()));

    with_env(&vars, || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        let checks = payload["checks"].as_array().expect("checks should be an array");
        assert_eq!(checks.len(), 4);
        assert_eq!(checks[1]["name"], "catalog");
        assert_eq!(checks[1]["status"], "pass");
        assert_eq!(checks[3]["name"], "mock_reviews");
        assert_eq!(checks[3]["status"], "fail");
    });
}

#[test]
fn doctor_skips_upstreams_when_config_is_invalid() {
    with_env(&NO_VARS, || {
        let result = doctor::run(false);
        assert_eq!(result.exit_code, 1);
        assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
        assert!(result.output.contains("- [skip] external_reviews:"));
    });
}

fn upstream_env(base: &str) -> Vec<(&'static str, String)> {
    vec![
        ("SHOPFRONT_CATALOG_BASE_URL", format!("{base}/catalog")),
        ("SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL", format!("{base}/external")),
        ("SHOPFRONT_REVIEWS_EXTERNAL_API_KEY", "cli-test-key".to_string()),
        ("SHOPFRONT_REVIEWS_MOCK_BASE_URL", format!("{base}/mock")),
    ]
}

/// Serves catalog, external and mock endpoints from a background runtime so
/// the synchronous commands can call them.
fn fake_upstreams() -> String {
    let app = Router::new()
        .route(
            "/external/product",
            get(|| async {
                Json(json!([
                    { "productId": 1, "name": "Blue Kettle", "category": "Kitchen" },
                    { "productId": 2, "name": "Red Mug", "category": "Drinkware" }
                ]))
            }),
        )
        .route(
            "/external/product/{id}",
            get(|Path(id): Path<i64>| async move {
                Json(json!({
                    "productId": id,
                    "name": "Red Mug",
                    "category": "Drinkware",
                    "rating": 4.0,
                    "reviews": [{
                        "reviewerName": "Lee",
                        "text": "Solid",
                        "rating": 4,
                        "reviewDate": "2024-05-05T10:00:00Z",
                        "reviewId": 71
                    }]
                }))
            }),
        )
        .route(
            "/catalog/api/products/{id}",
            get(|Path(id): Path<String>| async move {
                let name = match id.as_str() {
                    RED_MUG_ID => "Red Mug",
                    GREEN_LAMP_ID => "Green Lamp",
                    _ => return (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))),
                };
                (StatusCode::OK, Json(json!({ "id": id, "name": name, "price": 20 })))
            }),
        )
        .route(
            "/mock/api/products/{id}/reviews",
            get(|| async { Json(json!({ "reviews": [{ "text": "Bright enough", "rating": 4 }] })) }),
        );

    let (sender, receiver) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime should build");
        runtime.block_on(async move {
            let listener =
                tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("listener should bind");
            let address = listener.local_addr().expect("listener should have an address");
            sender.send(address).expect("address should be sent");
            axum::serve(listener, app).await.expect("upstream server should run");
        });
    });

    let address = receiver.recv().expect("upstream should start");
    format!("http://{address}")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env<V: AsRef<str>>(vars: &[(&str, V)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SHOPFRONT_CATALOG_BASE_URL",
        "SHOPFRONT_REVIEWS_EXTERNAL_BASE_URL",
        "SHOPFRONT_REVIEWS_EXTERNAL_API_KEY",
        "SHOPFRONT_REVIEWS_MOCK_BASE_URL",
        "SHOPFRONT_REVIEWS_MOCK_FUNCTIONS_KEY",
        "SHOPFRONT_REVIEWS_REQUEST_TIMEOUT_MS",
        "SHOPFRONT_SERVER_BIND_ADDRESS",
        "SHOPFRONT_SERVER_PORT",
        "SHOPFRONT_LOGGING_LEVEL",
        "SHOPFRONT_LOGGING_FORMAT",
        "SHOPFRONT_LOG_LEVEL",
        "SHOPFRONT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value.as_ref());
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
