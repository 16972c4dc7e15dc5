use calamine::{open_workbook_auto, Reader};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::payroll_records::{
    lenient_flag, lenient_param, lenient_text, parse_amount_text, CustomFieldAmount, Person,
    SalaryRecord,
};

#[derive(Debug, Deserialize)]
pub struct SalaryCsvPreviewRequest {
    #[serde(default, deserialize_with = "lenient_param")]
    pub source_path: Option<String>,
    #[serde(default)]
    pub salary_fields: Vec<SalaryFieldSpec>,
}

/// User-defined salary column. Matched against headers by key or label.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SalaryFieldSpec {
    #[serde(deserialize_with = "lenient_text")]
    pub field_key: String,
    #[serde(deserialize_with = "lenient_text")]
    pub label: String,
    #[serde(deserialize_with = "lenient_text")]
    pub field_type: String,
    #[serde(deserialize_with = "lenient_flag")]
    pub is_non_cash: bool,
}

#[derive(Debug)]
struct CustomColumn {
    idx: usize,
    template: CustomFieldAmount,
}

#[derive(Debug, Default)]
pub struct ParsedSalaryCsv {
    pub records: Vec<SalaryRecord>,
    pub persons: Vec<Person>,
    pub errors: Vec<String>,
    pub mapping: BTreeMap<String, String>,
    pub custom_columns: Vec<String>,
}

#[derive(Debug)]
struct AliasSpec {
    field: &'static str,
    aliases: &'static [&'static str],
}

const SALARY_ALIAS_SPECS: &[AliasSpec] = &[
    AliasSpec {
        field: "person_id",
        aliases: &["人员ID", "人员编号", "成员ID", "person_id", "personid"],
    },
    AliasSpec {
        field: "person_name",
        aliases: &["姓名", "人员", "成员", "name", "person_name"],
    },
    AliasSpec {
        field: "year",
        aliases: &["年份", "年", "year"],
    },
    AliasSpec {
        field: "month",
        aliases: &["月份", "月", "month"],
    },
    AliasSpec {
        field: "period",
        aliases: &["工资月份", "发放月份", "期间", "period"],
    },
    AliasSpec {
        field: "base_salary",
        aliases: &["基本工资", "基础工资", "base_salary"],
    },
    AliasSpec {
        field: "performance_salary",
        aliases: &["绩效工资", "绩效", "performance_salary"],
    },
    AliasSpec {
        field: "high_temp_allowance",
        aliases: &["高温津贴", "高温补贴", "high_temp_allowance"],
    },
    AliasSpec {
        field: "low_temp_allowance",
        aliases: &["低温津贴", "低温补贴", "low_temp_allowance"],
    },
    AliasSpec {
        field: "meal_allowance",
        aliases: &["餐补", "餐费补贴", "伙食补贴", "meal_allowance"],
    },
    AliasSpec {
        field: "computer_allowance",
        aliases: &["电脑补贴", "computer_allowance"],
    },
    AliasSpec {
        field: "communication_allowance",
        aliases: &["通讯补贴", "话费补贴", "communication_allowance"],
    },
    AliasSpec {
        field: "comprehensive_allowance",
        aliases: &["综合补贴", "comprehensive_allowance"],
    },
    AliasSpec {
        field: "mid_autumn_benefit",
        aliases: &["中秋福利", "中秋节福利", "mid_autumn_benefit"],
    },
    AliasSpec {
        field: "dragon_boat_benefit",
        aliases: &["端午福利", "端午节福利", "dragon_boat_benefit"],
    },
    AliasSpec {
        field: "spring_festival_benefit",
        aliases: &["春节福利", "spring_festival_benefit"],
    },
    AliasSpec {
        field: "other_income",
        aliases: &["其他收入", "other_income"],
    },
    AliasSpec {
        field: "pension_insurance",
        aliases: &["养老保险", "pension_insurance"],
    },
    AliasSpec {
        field: "medical_insurance",
        aliases: &["医疗保险", "medical_insurance"],
    },
    AliasSpec {
        field: "unemployment_insurance",
        aliases: &["失业保险", "unemployment_insurance"],
    },
    AliasSpec {
        field: "critical_illness_insurance",
        aliases: &["大病保险", "大病医疗", "critical_illness_insurance"],
    },
    AliasSpec {
        field: "enterprise_annuity",
        aliases: &["企业年金", "年金", "enterprise_annuity"],
    },
    AliasSpec {
        field: "housing_fund",
        aliases: &["住房公积金", "公积金", "housing_fund"],
    },
    AliasSpec {
        field: "other_deductions",
        aliases: &["其他扣款", "其他扣除", "other_deductions"],
    },
    AliasSpec {
        field: "labor_union_fee",
        aliases: &["工会费", "labor_union_fee"],
    },
    AliasSpec {
        field: "performance_deduction",
        aliases: &["绩效扣款", "绩效扣除", "performance_deduction"],
    },
    AliasSpec {
        field: "tax",
        aliases: &["个人所得税", "个税", "tax"],
    },
];

fn trim_cell(text: &str) -> String {
    text.trim()
        .trim_start_matches('\u{feff}')
        .trim()
        .to_string()
}

fn normalize_key(key: &str) -> String {
    trim_cell(key)
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn row_get(row: &[String], idx: Option<usize>) -> String {
    idx.and_then(|i| row.get(i))
        .map(|s| trim_cell(s))
        .unwrap_or_default()
}

fn resolve_alias_mapping_from_row(row: &[String]) -> HashMap<&'static str, usize> {
    let mut normalized: HashMap<String, usize> = HashMap::new();
    for (idx, cell) in row.iter().enumerate() {
        let key = normalize_key(cell);
        if !key.is_empty() {
            normalized.entry(key).or_insert(idx);
        }
    }

    let mut mapping = HashMap::new();
    for spec in SALARY_ALIAS_SPECS {
        if let Some(idx) = spec
            .aliases
            .iter()
            .find_map(|alias| normalized.get(&normalize_key(alias)))
        {
            mapping.insert(spec.field, *idx);
        }
    }
    mapping
}

fn has_period_columns(mapping: &HashMap<&'static str, usize>) -> bool {
    mapping.contains_key("period")
        || (mapping.contains_key("year") && mapping.contains_key("month"))
}

fn find_header_row(rows: &[Vec<String>]) -> Result<(usize, HashMap<&'static str, usize>), String> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| (idx, resolve_alias_mapping_from_row(row)))
        .find(|(_, mapping)| mapping.contains_key("person_id") && has_period_columns(mapping))
        .ok_or_else(|| "未找到必要表头: 人员ID, 年份/月份 (或 工资月份)".to_string())
}

fn mapping_headers(
    header_row: &[String],
    mapping_idx: &HashMap<&'static str, usize>,
) -> BTreeMap<String, String> {
    mapping_idx
        .iter()
        .filter_map(|(field, idx)| {
            header_row
                .get(*idx)
                .map(|header| (field.to_string(), trim_cell(header)))
        })
        .collect()
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("读取 CSV 失败: {e}"))?;

    let mut rows = Vec::new();
    for rec in reader.records() {
        let rec = rec.map_err(|e| format!("读取 CSV 行失败: {e}"))?;
        rows.push(rec.iter().map(trim_cell).collect());
    }
    Ok(rows)
}

fn read_xlsx_rows(path: &Path) -> Result<Vec<Vec<String>>, String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| format!("打开 xlsx 失败: {e}"))?;
    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| "xlsx 中未找到工作表".to_string())?;
    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| format!("读取 xlsx 工作表失败: {e}"))?;

    Ok(range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| trim_cell(&cell.to_string()))
                .collect::<Vec<_>>()
        })
        .collect())
}

fn read_salary_rows(path: &Path) -> Result<Vec<Vec<String>>, String> {
    let suffix = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    match suffix.as_str() {
        "csv" => read_csv_rows(path),
        "xlsx" | "xls" => read_xlsx_rows(path),
        _ => Err(format!(
            "不支持的文件格式: .{suffix}（仅支持 .csv/.xlsx）"
        )),
    }
}

/// Headers outside the alias table become custom fields. Columns without a
/// matching `SalaryFieldSpec` keep type `other`, which stays out of the payroll totals.
fn resolve_custom_columns(
    header_row: &[String],
    mapping_idx: &HashMap<&'static str, usize>,
    fields: &[SalaryFieldSpec],
) -> Vec<CustomColumn> {
    header_row
        .iter()
        .enumerate()
        .filter(|(idx, _)| !mapping_idx.values().any(|mapped| mapped == idx))
        .filter_map(|(idx, header)| {
            let header = trim_cell(header);
            let key = normalize_key(&header);
            if key.is_empty() {
                return None;
            }
            let spec = fields.iter().find(|f| {
                normalize_key(&f.field_key) == key || normalize_key(&f.label) == key
            });
            let template = match spec {
                Some(f) => CustomFieldAmount {
                    field_key: f.field_key.clone(),
                    label: if f.label.is_empty() { header } else { f.label.clone() },
                    field_type: f.field_type.clone(),
                    is_non_cash: f.is_non_cash,
                    amount: 0.0,
                },
                None => CustomFieldAmount {
                    field_key: header.clone(),
                    label: header,
                    field_type: "other".to_string(),
                    is_non_cash: false,
                    amount: 0.0,
                },
            };
            Some(CustomColumn { idx, template })
        })
        .collect()
}

/// Accepts `2024-03`, `2024/03`, `2024.03` and `202403`.
fn parse_period_text(raw: &str) -> Option<(i32, u32)> {
    let text = trim_cell(raw).replace(['/', '.'], "-");
    let (year, month) = match text.split_once('-') {
        Some((y, m)) => (y.parse::<i32>().ok()?, m.parse::<u32>().ok()?),
        None if text.len() == 6 && text.is_ascii() => (
            text[..4].parse::<i32>().ok()?,
            text[4..].parse::<u32>().ok()?,
        ),
        None => return None,
    };
    ((1..=9999).contains(&year) && (1..=12).contains(&month)).then_some((year, month))
}

fn parse_int_cell(raw: &str) -> Option<i64> {
    let text = trim_cell(raw);
    text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

fn amount_slot<'a>(record: &'a mut SalaryRecord, field: &str) -> Option<&'a mut f64> {
    let slot = match field {
        "base_salary" => &mut record.base_salary,
        "performance_salary" => &mut record.performance_salary,
        "high_temp_allowance" => &mut record.high_temp_allowance,
        "low_temp_allowance" => &mut record.low_temp_allowance,
        "meal_allowance" => &mut record.meal_allowance,
        "computer_allowance" => &mut record.computer_allowance,
        "communication_allowance" => &mut record.communication_allowance,
        "comprehensive_allowance" => &mut record.comprehensive_allowance,
        "mid_autumn_benefit" => &mut record.mid_autumn_benefit,
        "dragon_boat_benefit" => &mut record.dragon_boat_benefit,
        "spring_festival_benefit" => &mut record.spring_festival_benefit,
        "other_income" => &mut record.other_income,
        "pension_insurance" => &mut record.pension_insurance,
        "medical_insurance" => &mut record.medical_insurance,
        "unemployment_insurance" => &mut record.unemployment_insurance,
        "critical_illness_insurance" => &mut record.critical_illness_insurance,
        "enterprise_annuity" => &mut record.enterprise_annuity,
        "housing_fund" => &mut record.housing_fund,
        "other_deductions" => &mut record.other_deductions,
        "labor_union_fee" => &mut record.labor_union_fee,
        "performance_deduction" => &mut record.performance_deduction,
        "tax" => &mut record.tax,
        _ => return None,
    };
    Some(slot)
}

fn parse_salary_row(
    row: &[String],
    mapping_idx: &HashMap<&'static str, usize>,
    custom_columns: &[CustomColumn],
) -> Result<SalaryRecord, String> {
    let person_text = row_get(row, mapping_idx.get("person_id").copied());
    if person_text.is_empty() {
        return Err("缺少人员ID".to_string());
    }
    let person_id =
        parse_int_cell(&person_text).ok_or_else(|| format!("人员ID 无效: {person_text}"))?;

    let period_text = row_get(row, mapping_idx.get("period").copied());
    let (year, month) = if !period_text.is_empty() {
        parse_period_text(&period_text).ok_or_else(|| format!("工资月份格式不支持: {period_text}"))?
    } else {
        let year_text = row_get(row, mapping_idx.get("year").copied());
        let month_text = row_get(row, mapping_idx.get("month").copied());
        let year = parse_int_cell(&year_text)
            .and_then(|v| i32::try_from(v).ok())
            .filter(|y| (1..=9999).contains(y))
            .ok_or_else(|| format!("年份无效: {year_text}"))?;
        let month = parse_int_cell(&month_text)
            .and_then(|v| u32::try_from(v).ok())
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| format!("月份无效: {month_text}"))?;
        (year, month)
    };

    let mut record = SalaryRecord {
        person_id: Some(person_id),
        year: Some(year),
        month: Some(month),
        ..Default::default()
    };
    for (field, idx) in mapping_idx {
        let Some(slot) = amount_slot(&mut record, field) else {
            continue;
        };
        let text = row_get(row, Some(*idx));
        *slot = parse_amount_text(&text).unwrap_or_else(|| {
            log::debug!("ignored malformed {field} cell: {text}");
            0.0
        });
    }
    for column in custom_columns {
        let text = row_get(row, Some(column.idx));
        if text.is_empty() {
            continue;
        }
        match parse_amount_text(&text) {
            Some(amount) => record.custom_fields.push(CustomFieldAmount {
                amount,
                ..column.template.clone()
            }),
            None => log::debug!(
                "ignored malformed {} cell: {text}",
                column.template.field_key
            ),
        }
    }
    Ok(record)
}

pub fn parse_salary_rows(
    rows: &[Vec<String>],
    fields: &[SalaryFieldSpec],
) -> Result<ParsedSalaryCsv, String> {
    let (header_idx, mapping_idx) = find_header_row(rows)?;
    let custom_columns = resolve_custom_columns(&rows[header_idx], &mapping_idx, fields);
    let mut parsed = ParsedSalaryCsv {
        mapping: mapping_headers(&rows[header_idx], &mapping_idx),
        custom_columns: custom_columns
            .iter()
            .map(|c| c.template.label.clone())
            .collect(),
        ..Default::default()
    };

    for (offset, row) in rows[(header_idx + 1)..].iter().enumerate() {
        let line_no = header_idx + 2 + offset;
        if row.iter().all(|c| trim_cell(c).is_empty()) {
            continue;
        }
        match parse_salary_row(row, &mapping_idx, &custom_columns) {
            Ok(mut record) => {
                record.id = Some(parsed.records.len() as i64 + 1);
                let name = row_get(row, mapping_idx.get("person_name").copied());
                if !name.is_empty() && !parsed.persons.iter().any(|p| p.id == record.person_id) {
                    parsed.persons.push(Person {
                        id: record.person_id,
                        name,
                        ..Default::default()
                    });
                }
                parsed.records.push(record);
            }
            Err(err) => parsed.errors.push(format!("第{line_no}行: {err}")),
        }
    }
    Ok(parsed)
}

/// Reads a `.csv` or `.xlsx` salary sheet.
pub fn parse_salary_file(
    path: &Path,
    fields: &[SalaryFieldSpec],
) -> Result<ParsedSalaryCsv, String> {
    let rows = read_salary_rows(path)?;
    let parsed = parse_salary_rows(&rows, fields)?;
    if !parsed.errors.is_empty() {
        log::warn!(
            "{} salary rows skipped in {}",
            parsed.errors.len(),
            path.display()
        );
    }
    Ok(parsed)
}

pub fn salary_csv_preview_at_path(
    file_path: &Path,
    fields: &[SalaryFieldSpec],
) -> Result<Value, String> {
    if !file_path.is_file() {
        return Err(format!("文件不存在: {}", file_path.display()));
    }
    let parsed = parse_salary_file(file_path, fields)?;
    let preview_rows = parsed
        .records
        .iter()
        .take(10)
        .map(|r| {
            json!({
                "person_id": r.person_id,
                "year": r.year,
                "month": r.month,
                "base_salary": r.base_salary,
                "performance_salary": r.performance_salary,
                "tax": r.tax,
                "custom_fields": r.custom_fields,
            })
        })
        .collect::<Vec<_>>();

    Ok(json!({
        "file": file_path.to_string_lossy().to_string(),
        "mapping": parsed.mapping,
        "custom_columns": parsed.custom_columns,
        "person_count": parsed.persons.len(),
        "parsed_count": parsed.records.len(),
        "error_count": parsed.errors.len(),
        "errors": parsed.errors.into_iter().take(20).collect::<Vec<_>>(),
        "preview_rows": preview_rows,
    }))
}

fn resolve_source_path_text(source_path: Option<String>) -> Result<String, String> {
    let path = source_path.unwrap_or_default();
    let path = path.trim().to_string();
    if path.is_empty() {
        return Err("source_path 必填".to_string());
    }
    Ok(path)
}

pub fn salary_csv_preview(req: SalaryCsvPreviewRequest) -> Result<Value, String> {
    let path = resolve_source_path_text(req.source_path)?;
    salary_csv_preview_at_path(Path::new(&path), &req.salary_fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn create_temp_path(prefix: &str, ext: &str) -> PathBuf {
        let unique = format!("{prefix}_{}_{}.{}", std::process::id(), Uuid::new_v4(), ext);
        std::env::temp_dir().join(unique)
    }

    fn rows(text: &str) -> Vec<Vec<String>> {
        text.lines()
            .map(|line| line.split(',').map(trim_cell).collect())
            .collect()
    }

    #[test]
    fn chinese_headers_after_title_row() {
        let parsed = parse_salary_rows(
            &rows(
                "2024年工资表,,,,\n\
                 人员ID,姓名,工资月份,基本工资,个税\n\
                 1,张三,2024-01,8000,120\n\
                 1,张三,2024/02,8000,bad\n",
            ),
            &[],
        )
        .expect("parse rows");
        assert_eq!(parsed.records.len(), 2);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.records[1].month, Some(2));
        assert_eq!(parsed.records[1].tax, 0.0);
        assert_eq!(parsed.persons.len(), 1);
        assert_eq!(parsed.persons[0].name, "张三");
        assert_eq!(
            parsed.mapping.get("base_salary").map(String::as_str),
            Some("基本工资")
        );
    }

    #[test]
    fn rows_without_identity_are_reported() {
        let parsed = parse_salary_rows(
            &rows(
                "person_id,year,month,base_salary\n\
                 1,2024,3,9000\n\
                 ,2024,4,9000\n\
                 2,2024,13,9000\n\
                 3,30000000,1,9000\n\
                 ,,,\n",
            ),
            &[],
        )
        .expect("parse rows");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.errors.len(), 3);
        assert!(parsed.errors[0].starts_with("第3行"));
        assert!(parsed.errors[1].contains("月份无效"));
        assert!(parsed.errors[2].contains("年份无效"));
    }

    #[test]
    fn missing_period_columns_is_an_error() {
        let err = parse_salary_rows(&rows("人员ID,基本工资\n1,8000\n"), &[])
            .expect_err("no header");
        assert!(err.contains("未找到必要表头"));
    }

    #[test]
    fn period_text_forms() {
        assert_eq!(parse_period_text("2024-03"), Some((2024, 3)));
        assert_eq!(parse_period_text("2024.11"), Some((2024, 11)));
        assert_eq!(parse_period_text("202407"), Some((2024, 7)));
        assert_eq!(parse_period_text("2024-00"), None);
        assert_eq!(parse_period_text("soon"), None);
        assert_eq!(parse_period_text("30000000-01"), None);
    }

    #[test]
    fn preview_reads_csv_file() {
        let path = create_temp_path("salarium_salary_csv", "csv");
        fs::write(
            &path,
            "\u{feff}人员ID,年份,月份,基本工资,绩效工资,住房公积金\n\
             1,2024,1,\"8,000\",2000,1200\n\
             2,2024,1,6000,1000,900\n",
        )
        .expect("write temp csv");

        let preview = salary_csv_preview(SalaryCsvPreviewRequest {
            source_path: Some(path.to_string_lossy().to_string()),
            salary_fields: Vec::new(),
        })
        .expect("preview csv");
        assert_eq!(preview.get("parsed_count").and_then(Value::as_i64), Some(2));
        assert_eq!(preview.get("error_count").and_then(Value::as_i64), Some(0));
        assert_eq!(
            preview["preview_rows"][0]["base_salary"].as_f64(),
            Some(8000.0)
        );
        let _ = fs::remove_file(&path);

        let err = salary_csv_preview(SalaryCsvPreviewRequest {
            source_path: None,
            salary_fields: Vec::new(),
        })
        .expect_err("missing path");
        assert_eq!(err, "source_path 必填");
    }

    #[test]
    fn unknown_headers_become_custom_fields() {
        let fields = vec![SalaryFieldSpec {
            field_key: "project_bonus".to_string(),
            label: "项目奖金".to_string(),
            field_type: "income".to_string(),
            is_non_cash: false,
        }];
        let parsed = parse_salary_rows(
            &rows(
                "人员ID,年份,月份,基本工资,项目奖金,备注金额\n\
                 1,2024,5,8000,1500,30\n\
                 1,2024,6,8000,,abc\n",
            ),
            &fields,
        )
        .expect("parse rows");
        assert_eq!(parsed.custom_columns, vec!["项目奖金", "备注金额"]);

        let may = &parsed.records[0].custom_fields;
        assert_eq!(may.len(), 2);
        assert_eq!(may[0].field_key, "project_bonus");
        assert_eq!(may[0].field_type, "income");
        assert_eq!(may[0].amount, 1500.0);
        assert_eq!(may[1].field_key, "备注金额");
        assert_eq!(may[1].field_type, "other");
        assert!(parsed.records[1].custom_fields.is_empty());

        let take_home = crate::payroll_calc::compute_payroll(&parsed.records[0]).actual_take_home;
        assert_eq!(take_home, 9500.0);
    }

    #[test]
    fn preview_reads_xlsx_file() {
        let path = create_temp_path("salarium_salary_xlsx", "xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["人员ID", "年份", "月份", "基本工资", "项目奖金"]
            .iter()
            .enumerate()
        {
            sheet
                .write_string(0, col as u16, *header)
                .expect("write header");
        }
        for (col, value) in [1.0, 2024.0, 7.0, 8800.0, 600.0].iter().enumerate() {
            sheet
                .write_number(1, col as u16, *value)
                .expect("write cell");
        }
        workbook.save(&path).expect("save temp xlsx");

        let preview = salary_csv_preview_at_path(&path, &[]).expect("preview xlsx");
        assert_eq!(preview.get("parsed_count").and_then(Value::as_i64), Some(1));
        assert_eq!(preview["preview_rows"][0]["month"].as_i64(), Some(7));
        assert_eq!(
            preview["preview_rows"][0]["base_salary"].as_f64(),
            Some(8800.0)
        );
        assert_eq!(
            preview["preview_rows"][0]["custom_fields"][0]["amount"].as_f64(),
            Some(600.0)
        );
        let _ = fs::remove_file(&path);

        let txt = create_temp_path("salarium_salary_txt", "txt");
        fs::write(&txt, "x").expect("write txt");
        let err = salary_csv_preview_at_path(&txt, &[]).expect_err("unsupported");
        assert!(err.contains("不支持的文件格式"));
        let _ = fs::remove_file(&txt);
    }
}
