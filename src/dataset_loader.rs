use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::payroll_records::{records_from_value, CustomFieldAmount, PayrollDataset};
use crate::salary_csv_import::parse_salary_file;

/// Builds a dataset from either `{persons, salary_records, custom_values}` or a
/// bare array of salary records. Missing collections are empty.
pub fn dataset_from_value(value: &Value) -> Result<PayrollDataset, String> {
    match value {
        Value::Array(_) => Ok(PayrollDataset {
            persons: Vec::new(),
            salary_records: records_from_value(value),
        }),
        Value::Object(obj) => {
            let mut dataset = PayrollDataset {
                persons: obj.get("persons").map(records_from_value).unwrap_or_default(),
                salary_records: obj
                    .get("salary_records")
                    .or_else(|| obj.get("records"))
                    .map(records_from_value)
                    .unwrap_or_default(),
            };
            if let Some(custom_values) = obj.get("custom_values") {
                attach_custom_values(&mut dataset, custom_values);
            }
            Ok(dataset)
        }
        _ => Err("数据集必须是 JSON 对象或数组".to_string()),
    }
}

/// Custom values stored apart from their records are joined by `salary_record_id`.
fn attach_custom_values(dataset: &mut PayrollDataset, custom_values: &Value) {
    let Some(items) = custom_values.as_array() else {
        return;
    };
    for item in items {
        let record_id = item.get("salary_record_id").and_then(Value::as_i64);
        let Some(record) = record_id.and_then(|id| {
            dataset
                .salary_records
                .iter_mut()
                .find(|r| r.id == Some(id))
        }) else {
            log::warn!("custom value without matching salary record: {item}");
            continue;
        };
        match CustomFieldAmount::deserialize(item) {
            Ok(field) => record.custom_fields.push(field),
            Err(e) => log::warn!("skipped malformed custom value: {e}"),
        }
    }
}

pub fn load_dataset_from_path(path: &Path) -> Result<PayrollDataset, String> {
    if !path.is_file() {
        return Err(format!("数据集文件不存在: {}", path.display()));
    }
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    let dataset = match ext.as_str() {
        "json" => {
            let text = fs::read_to_string(path).map_err(|e| format!("读取数据集失败: {e}"))?;
            let value: Value =
                serde_json::from_str(&text).map_err(|e| format!("数据集 JSON 解析失败: {e}"))?;
            dataset_from_value(&value)?
        }
        "csv" | "xlsx" | "xls" => {
            let parsed = parse_salary_file(path, &[])?;
            PayrollDataset {
                persons: parsed.persons,
                salary_records: parsed.records,
            }
        }
        other => return Err(format!("不支持的数据集格式: {other}")),
    };

    log::info!(
        "loaded dataset {}: {} persons, {} salary records",
        path.display(),
        dataset.persons.len(),
        dataset.salary_records.len()
    );
    Ok(dataset)
}
