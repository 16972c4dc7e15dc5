use salarium_stats_lib::{
    category_summary_query, contributions_cumulative_query, cumulative_insurance_query,
    dashboard_overview_query, dataset_from_value, deductions_breakdown_query,
    family_summary_query, income_composition_query, load_dataset_from_path, monthly_stats_query,
    salary_csv_preview, yearly_stats_query, ContributionsCumulativeQueryRequest,
    FamilySummaryQueryRequest, PayrollDataset, SalaryCsvPreviewRequest, StatsFilterRequest,
    YearlyStatsQueryRequest,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::env;
use std::io::{self, Read};
use std::path::Path;

const STATS_ENDPOINTS: &[&str] = &[
    "monthly",
    "yearly",
    "family",
    "cumulative-insurance",
    "income-composition",
    "deductions/breakdown",
    "contributions/cumulative",
    "category-summary",
    "dashboard",
];

#[derive(Debug, Deserialize)]
struct AdapterRequest {
    schema_version: u64,
    case: Option<AdapterCaseMeta>,
    endpoint: AdapterEndpoint,
    #[serde(default)]
    query: Value,
    dataset: Option<AdapterDataset>,
}

#[derive(Debug, Deserialize)]
struct AdapterCaseMeta {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdapterEndpoint {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AdapterDataset {
    path: Option<String>,
    inline: Option<Value>,
}

#[derive(Debug, Serialize)]
struct AdapterErrorBody {
    category: String,
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status")]
enum AdapterResponse {
    #[serde(rename = "success")]
    Success { payload: Value },
    #[serde(rename = "error")]
    Error { error: AdapterErrorBody },
}

fn classify_error_message(message: &str) -> String {
    let validation_keywords = ["必填", "必须是", "不支持", "未找到必要表头"];
    if validation_keywords.iter().any(|k| message.contains(k)) {
        return "VALIDATION_ERROR".to_string();
    }

    let invalid_range_keywords = ["超出支持范围"];
    if invalid_range_keywords.iter().any(|k| message.contains(k)) {
        return "INVALID_RANGE_ERROR".to_string();
    }

    let no_data_keywords = ["人员不存在", "文件不存在"];
    if no_data_keywords.iter().any(|k| message.contains(k)) {
        return "NO_DATA_ERROR".to_string();
    }

    "UNKNOWN_ERROR".to_string()
}

fn error_response(
    category: impl Into<String>,
    message: impl Into<String>,
    error_type: impl Into<String>,
) -> AdapterResponse {
    AdapterResponse::Error {
        error: AdapterErrorBody {
            category: category.into(),
            message: message.into(),
            error_type: error_type.into(),
        },
    }
}

fn parse_bool_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn read_stdin_json() -> Result<Value, String> {
    let mut raw = String::new();
    io::stdin()
        .read_to_string(&mut raw)
        .map_err(|e| format!("读取 stdin 失败: {e}"))?;
    if raw.trim().is_empty() {
        return Err("empty stdin request".to_string());
    }
    serde_json::from_str::<Value>(&raw).map_err(|e| format!("invalid JSON request: {e}"))
}

fn parse_query<T: DeserializeOwned>(query: Value, endpoint: &str) -> Result<T, String> {
    let query = match query {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(query)
        .map_err(|e| format!("request.query invalid for {endpoint}: {e}"))
}

fn resolve_dataset(dataset: Option<AdapterDataset>) -> Result<PayrollDataset, String> {
    let dataset = dataset.ok_or_else(|| "request.dataset missing".to_string())?;
    if let Some(inline) = dataset.inline {
        return dataset_from_value(&inline);
    }
    let path = dataset
        .path
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "request.dataset.path or request.dataset.inline missing".to_string())?;
    load_dataset_from_path(Path::new(path))
}

fn dispatch(req: AdapterRequest) -> Result<Value, String> {
    if req.schema_version != 1 {
        return Err(format!(
            "unsupported schema_version: {}",
            req.schema_version
        ));
    }

    let path = req
        .endpoint
        .path
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "request.endpoint.path missing".to_string())?;

    if path == "/api/import/salary-csv/preview" {
        let query_req: SalaryCsvPreviewRequest = parse_query(req.query, "salary-csv/preview")?;
        return salary_csv_preview(query_req);
    }

    let Some(endpoint) = path.strip_prefix("/api/stats/") else {
        return Err(format!("unsupported endpoint path: {path}"));
    };
    if !STATS_ENDPOINTS.contains(&endpoint) {
        return Err(format!("unsupported endpoint path: {path}"));
    }
    let dataset = resolve_dataset(req.dataset)?;

    match endpoint {
        "monthly" => monthly_stats_query(&dataset, parse_query(req.query, endpoint)?),
        "yearly" => {
            let query_req: YearlyStatsQueryRequest = parse_query(req.query, endpoint)?;
            yearly_stats_query(&dataset, query_req)
        }
        "family" => {
            let query_req: FamilySummaryQueryRequest = parse_query(req.query, endpoint)?;
            family_summary_query(&dataset, query_req)
        }
        "cumulative-insurance" => cumulative_insurance_query(&dataset),
        "income-composition" => {
            let query_req: StatsFilterRequest = parse_query(req.query, endpoint)?;
            income_composition_query(&dataset, query_req)
        }
        "deductions/breakdown" => {
            let query_req: StatsFilterRequest = parse_query(req.query, endpoint)?;
            deductions_breakdown_query(&dataset, query_req)
        }
        "contributions/cumulative" => {
            let query_req: ContributionsCumulativeQueryRequest =
                parse_query(req.query, endpoint)?;
            contributions_cumulative_query(&dataset, query_req)
        }
        "category-summary" => {
            let query_req: StatsFilterRequest = parse_query(req.query, endpoint)?;
            category_summary_query(&dataset, query_req)
        }
        "dashboard" => {
            let query_req: StatsFilterRequest = parse_query(req.query, endpoint)?;
            dashboard_overview_query(&dataset, query_req)
        }
        _ => Err(format!("unsupported endpoint path: {path}")),
    }
}

fn main() {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let pretty = parse_bool_flag(&args, "--pretty");
    init_logging(parse_bool_flag(&args, "--verbose"));

    let resp = match read_stdin_json()
        .and_then(|v| {
            serde_json::from_value::<AdapterRequest>(v)
                .map_err(|e| format!("request root invalid: {e}"))
        })
        .and_then(|req| {
            if let Some(case_id) = req.case.as_ref().and_then(|c| c.id.as_deref()) {
                log::debug!("case={case_id}");
            }
            if let Some(path) = req.endpoint.path.as_deref() {
                log::debug!("endpoint={path}");
            }
            if let Some(path) = req.dataset.as_ref().and_then(|d| d.path.as_deref()) {
                log::debug!("dataset={path}");
            }
            dispatch(req)
        }) {
        Ok(payload) => AdapterResponse::Success { payload },
        Err(message) => {
            let category = if message.starts_with("unsupported endpoint path:") {
                "UNSUPPORTED_ENDPOINT".to_string()
            } else if message.starts_with("unsupported schema_version:")
                || message.starts_with("request")
                || message.starts_with("invalid JSON request:")
                || message == "empty stdin request"
            {
                "ADAPTER_PROTOCOL_ERROR".to_string()
            } else {
                classify_error_message(&message)
            };
            log::warn!("request failed [{category}]: {message}");
            error_response(category, message, "AdapterError")
        }
    };

    let out = if pretty {
        serde_json::to_string_pretty(&resp)
    } else {
        serde_json::to_string(&resp)
    }
    .unwrap_or_else(|e| {
        json!({
            "status": "error",
            "error": {
                "category": "ADAPTER_PROTOCOL_ERROR",
                "message": format!("serialize response failed: {e}"),
                "type": "SerializeError",
            }
        })
        .to_string()
    });

    print!("{out}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str, query: Value) -> AdapterRequest {
        serde_json::from_value(json!({
            "schema_version": 1,
            "endpoint": {"path": path},
            "query": query,
            "dataset": {"inline": {
                "persons": [{"id": 1, "name": "A", "pension_history": 100}],
                "salary_records": [
                    {"id": 1, "person_id": 1, "year": 2024, "month": 1, "base_salary": 6000, "pension_insurance": 480},
                    {"id": 2, "person_id": 1, "year": 2024, "month": 2, "base_salary": 6000, "pension_insurance": 480}
                ]
            }}
        }))
        .expect("adapter request")
    }

    #[test]
    fn dispatches_stats_endpoints_with_inline_dataset() {
        let payload = dispatch(request("/api/stats/monthly", json!({"person_id": 1})))
            .expect("monthly");
        assert_eq!(payload["rows"].as_array().map(Vec::len), Some(2));

        let payload = dispatch(request("/api/stats/dashboard", Value::Null)).expect("dashboard");
        assert_eq!(payload["record_count"].as_u64(), Some(2));

        let payload = dispatch(request(
            "/api/stats/contributions/cumulative",
            json!({"person_id": "1"}),
        ))
        .expect("contributions");
        assert_eq!(payload["pension_total"].as_f64(), Some(1060.0));
        assert_eq!(payload["points"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn errors_are_categorized() {
        let err = dispatch(request("/api/stats/unknown", json!({}))).expect_err("unsupported");
        assert!(err.starts_with("unsupported endpoint path:"));

        let err = dispatch(request("/api/stats/monthly", json!({"month": "13"})))
            .expect_err("bad month");
        assert_eq!(classify_error_message(&err), "VALIDATION_ERROR");

        let err = dispatch(request("/api/stats/yearly", json!({"year": 1990})))
            .expect_err("bad year");
        assert_eq!(classify_error_message(&err), "INVALID_RANGE_ERROR");

        let err = dispatch(request(
            "/api/stats/contributions/cumulative",
            json!({"person_id": 7}),
        ))
        .expect_err("missing person");
        assert_eq!(classify_error_message(&err), "NO_DATA_ERROR");

        let mut req = request("/api/stats/monthly", json!({}));
        req.dataset = None;
        let err = dispatch(req).expect_err("missing dataset");
        assert!(err.starts_with("request.dataset"));
    }

    #[test]
    fn unsupported_dataset_format_is_a_validation_error() {
        let txt = std::env::temp_dir().join(format!(
            "salarium_adapter_{}_{}.txt",
            std::process::id(),
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&txt, "x").expect("write txt");
        let mut req = request("/api/stats/monthly", json!({}));
        req.dataset = Some(AdapterDataset {
            path: Some(txt.to_string_lossy().to_string()),
            inline: None,
        });
        let err = dispatch(req).expect_err("unsupported format");
        let _ = std::fs::remove_file(&txt);
        assert!(err.contains("不支持的数据集格式"));
        assert_eq!(classify_error_message(&err), "VALIDATION_ERROR");
        assert_eq!(
            classify_error_message("不支持的文件格式: .txt（仅支持 .csv/.xlsx）"),
            "VALIDATION_ERROR"
        );
    }
}
