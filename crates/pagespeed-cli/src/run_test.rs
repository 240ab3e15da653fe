use std::env::VarError;
use std::path::Path;

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use pagespeed_core::DeviceType;
use serde_json::{json, Map, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn config(dir: &Path, extra: &Value) -> RunConfig {
    let mut doc = json!({
        "url_file": dir.join("urls.csv"),
        "output_dir": dir.join("out"),
        "max_attempts": 2,
        "server_error_backoff_secs": 1,
        "other_error_backoff_secs": 1,
    });
    if let (Some(doc), Some(extra)) = (doc.as_object_mut(), extra.as_object()) {
        doc.extend(extra.clone());
    }
    pagespeed_core::parse_run_config(&doc.to_string(), "run.json", |_| Err(VarError::NotPresent))
        .expect("valid run config")
}

fn write_url_list(dir: &Path, urls: &[&str]) {
    let mut csv = String::from("URL,device_type,page_type\n");
    for device in ["mobile", "desktop"] {
        for url in urls {
            csv.push_str(&format!("{url},{device},home\n"));
        }
    }
    std::fs::write(dir.join("urls.csv"), csv).unwrap();
}

fn report_body(url: &str) -> Value {
    let metric = json!({
        "percentile": 1200,
        "category": "FAST",
        "distributions": [
            { "proportion": 0.8 },
            { "proportion": 0.15 },
            { "proportion": 0.05 }
        ]
    });
    json!({
        "lighthouseResult": {
            "requestedUrl": url,
            "finalUrl": url,
            "categories": { "performance": { "score": 0.9 } },
            "audits": {
                "first-contentful-paint": { "score": 0.9 },
                "first-meaningful-paint": { "score": 0.9 },
                "speed-index": { "score": 0.8 },
                "first-cpu-idle": { "score": 0.7 },
                "interactive": { "score": 0.6 },
                "estimated-input-latency": { "score": null }
            }
        },
        "loadingExperience": {
            "metrics": {
                "FIRST_CONTENTFUL_PAINT_MS": metric,
                "FIRST_INPUT_DELAY_MS": metric
            },
            "overall_category": "FAST"
        }
    })
}

/// Output files whose name ends with `suffix`, sorted.
fn artifacts(dir: &Path, suffix: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(suffix))
        .collect();
    names.sort();
    names
}

fn line_count(path: &Path) -> usize {
    std::fs::read_to_string(path).unwrap().lines().count()
}

fn name_timestamp(name: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&name[..19], "%Y-%m-%d_%H:%M:%S").unwrap()
}

#[tokio::test]
async fn fetch_run_writes_response_and_both_tables() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/runPagespeed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_body("https://a.test/")))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    write_url_list(dir.path(), &["https://a.test/"]);
    let cfg = config(dir.path(), &json!({ "base_url": server.uri() }));

    run_pipeline(&cfg, &RunOptions::default()).await.unwrap();

    let out = dir.path().join("out");
    let responses = artifacts(&out, "-response.json");
    let fields = artifacts(&out, "-field.csv");
    let labs = artifacts(&out, "-lab.csv");
    assert_eq!(responses.len(), 1);
    assert_eq!(fields.len(), 1);
    assert_eq!(labs.len(), 1);

    // Every artifact of one run carries the same timestamp prefix.
    let prefix = responses[0].trim_end_matches("-response.json");
    assert_eq!(fields[0], format!("{prefix}-field.csv"));
    assert_eq!(labs[0], format!("{prefix}-lab.csv"));

    assert_eq!(line_count(&out.join(&fields[0])), 3);
    assert_eq!(line_count(&out.join(&labs[0])), 3);

    let store = ReportStore::load(&out.join(&responses[0])).unwrap();
    assert_eq!(store.len(DeviceType::Mobile), 1);
    assert_eq!(store.len(DeviceType::Desktop), 1);
}

#[tokio::test]
async fn dropped_entries_still_complete_and_name_files_after_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    write_url_list(dir.path(), &["https://down.test/"]);
    let cfg = config(dir.path(), &json!({ "base_url": server.uri() }));

    let before = Local::now();
    run_pipeline(&cfg, &RunOptions::default()).await.unwrap();

    let out = dir.path().join("out");
    let responses = artifacts(&out, "-response.json");
    assert_eq!(responses.len(), 1);

    // Two entries, each waiting one 1 s backoff before its final attempt.
    let earliest = (before + TimeDelta::seconds(2))
        .naive_local()
        .with_nanosecond(0)
        .unwrap();
    let named = name_timestamp(&responses[0]);
    assert!(
        named >= earliest,
        "response file {} named before the fetch finished ({earliest})",
        responses[0]
    );

    let store = ReportStore::load(&out.join(&responses[0])).unwrap();
    assert!(store.is_empty());

    let fields = artifacts(&out, "-field.csv");
    assert_eq!(fields.len(), 1);
    assert_eq!(line_count(&out.join(&fields[0])), 1, "header only");
}

#[tokio::test]
async fn failed_persist_still_writes_tables() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(report_body("https://a.test/")))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    write_url_list(dir.path(), &["https://a.test/"]);
    let cfg = config(dir.path(), &json!({ "base_url": server.uri() }));

    // Occupy every response file name the run could pick with a directory.
    let out = dir.path().join("out");
    let now = Local::now();
    for offset in -2..60 {
        let at = now + TimeDelta::seconds(offset);
        std::fs::create_dir_all(out.join(pagespeed_client::store::response_file_name(&at)))
            .unwrap();
    }

    run_pipeline(&cfg, &RunOptions::default()).await.unwrap();

    let fields = artifacts(&out, "-field.csv");
    let labs = artifacts(&out, "-lab.csv");
    assert_eq!(fields.len(), 1);
    assert_eq!(labs.len(), 1);
    assert_eq!(line_count(&out.join(&fields[0])), 3);
}

fn saved_store(dir: &Path) -> PathBuf {
    let mut store = ReportStore::new();
    for device in DeviceType::ALL {
        for url in ["https://a.test/", "https://b.test/"] {
            let report: Map<String, Value> = match report_body(url) {
                Value::Object(map) => map,
                other => panic!("expected object, got {other}"),
            };
            store.insert(device, url, report, "home");
        }
    }
    let saved = dir.join("saved");
    std::fs::create_dir_all(&saved).unwrap();
    let at = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    store.persist(&saved, &at).unwrap()
}

#[tokio::test]
async fn from_response_reflattens_without_fetching() {
    let dir = tempfile::tempdir().expect("tempdir");
    let saved = saved_store(dir.path());
    // No url list on disk and no reachable endpoint: only the saved store is read.
    let cfg = config(dir.path(), &json!({ "base_url": "http://127.0.0.1:9" }));
    let options = RunOptions {
        from_response: Some(saved),
        strict: false,
    };

    run_pipeline(&cfg, &options).await.unwrap();

    let out = dir.path().join("out");
    assert!(artifacts(&out, "-response.json").is_empty());
    let fields = artifacts(&out, "-field.csv");
    assert_eq!(fields.len(), 1);
    let text = std::fs::read_to_string(out.join(&fields[0])).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows.len(), 5);
    assert!(rows[1].starts_with("https://a.test/,https://a.test/,mobile,"));
    assert!(rows[3].starts_with("https://a.test/,https://a.test/,desktop,"));
}

#[tokio::test]
async fn strict_run_fails_on_unreadable_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = ReportStore::new();
    let mut broken = Map::new();
    broken.insert("lighthouseResult".to_string(), json!({}));
    store.insert(DeviceType::Mobile, "https://a.test/", broken, "home");
    let at = chrono::Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
    let saved = store.persist(dir.path(), &at).unwrap();

    let cfg = config(dir.path(), &json!({}));
    let strict = RunOptions {
        from_response: Some(saved.clone()),
        strict: true,
    };
    assert!(run_pipeline(&cfg, &strict).await.is_err());

    let lenient = RunOptions {
        from_response: Some(saved),
        strict: false,
    };
    run_pipeline(&cfg, &lenient).await.unwrap();
    let out = dir.path().join("out");
    let fields = artifacts(&out, "-field.csv");
    let text = std::fs::read_to_string(out.join(&fields[0])).unwrap();
    assert!(text.lines().nth(1).unwrap().split(',').all(|c| c == "Error"));
}
