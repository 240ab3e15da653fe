//! Report documents shared by the unit tests.

use serde_json::{json, Value};

/// A well-formed report as stored by the fetcher, `page_type` included.
pub(crate) fn report(url: &str, page_type: &str) -> Value {
    json!({
        "lighthouseResult": {
            "requestedUrl": url,
            "finalUrl": format!("{url}final"),
            "categories": { "performance": { "score": 0.91 } },
            "audits": {
                "first-contentful-paint": { "score": 0.98 },
                "first-meaningful-paint": { "score": 0.97 },
                "speed-index": { "score": 0.88 },
                "first-cpu-idle": { "score": 0.9 },
                "interactive": { "score": 0.85 },
                "estimated-input-latency": { "score": null }
            }
        },
        "loadingExperience": {
            "metrics": {
                "FIRST_CONTENTFUL_PAINT_MS": {
                    "percentile": 1450,
                    "category": "FAST",
                    "distributions": [
                        { "min": 0, "max": 1800, "proportion": 0.81 },
                        { "min": 1800, "max": 3000, "proportion": 0.12 },
                        { "min": 3000, "proportion": 0.07 }
                    ]
                },
                "FIRST_INPUT_DELAY_MS": {
                    "percentile": 32,
                    "category": "AVERAGE",
                    "distributions": [
                        { "min": 0, "max": 100, "proportion": 0.7 },
                        { "min": 100, "max": 300, "proportion": 0.2 },
                        { "min": 300, "proportion": 0.1 }
                    ]
                }
            },
            "overall_category": "AVERAGE"
        },
        "page_type": page_type
    })
}

/// Removes the value at `pointer` (JSON pointer syntax) from `report`.
pub(crate) fn without(mut report: Value, pointer: &str) -> Value {
    let (parent, key) = pointer.rsplit_once('/').expect("pointer has a parent");
    match report.pointer_mut(parent) {
        Some(Value::Object(map)) => {
            map.remove(key);
        }
        Some(Value::Array(items)) => {
            let idx: usize = key.parse().expect("array index");
            items.remove(idx);
        }
        _ => panic!("no container at {parent}"),
    }
    report
}
