use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthlyRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub person_id: Option<i64>,
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(deserialize_with = "lenient_month")]
    pub month: Option<u32>,
    #[serde(deserialize_with = "lenient_amount")]
    pub gross_income: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub net_income: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub actual_take_home: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub tax: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub insurance_total: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub allowances_total: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub non_cash_benefits: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetIncomePoint {
    #[serde(deserialize_with = "lenient_id")]
    pub person_id: Option<i64>,
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(deserialize_with = "lenient_month")]
    pub month: Option<u32>,
    #[serde(deserialize_with = "lenient_amount")]
    pub net_income: f64,
}

impl NetIncomePoint {
    pub fn period_key(&self) -> (i32, u32) {
        (self.year.unwrap_or(0), self.month.unwrap_or(0))
    }
}

impl From<&MonthlyRecord> for NetIncomePoint {
    fn from(record: &MonthlyRecord) -> Self {
        Self {
            person_id: record.person_id,
            year: record.year,
            month: record.month,
            net_income: record.net_income,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakdownItem {
    #[serde(deserialize_with = "lenient_text")]
    pub key: String,
    #[serde(deserialize_with = "lenient_text")]
    pub label: String,
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub person_id: Option<i64>,
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(deserialize_with = "lenient_month")]
    pub month: Option<u32>,
    #[serde(deserialize_with = "lenient_amount")]
    pub base_salary: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub performance_salary: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub high_temp_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub low_temp_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub meal_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub computer_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub communication_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub comprehensive_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub non_cash_benefits: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub other_income: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub mid_autumn_benefit: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub dragon_boat_benefit: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub spring_festival_benefit: f64,
    #[serde(deserialize_with = "lenient_items")]
    pub custom_non_cash_items: Vec<BreakdownItem>,
}

/// One `{category, amount}` input row for [`crate::payroll_aggregator::categorize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryAmount {
    #[serde(deserialize_with = "lenient_text")]
    pub category: String,
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: f64,
}

impl CategoryAmount {
    pub fn new(category: impl Into<String>, amount: f64) -> Self {
        Self {
            category: category.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeductionSummaryItem {
    pub category: String,
    pub label: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorySummary {
    pub income: Vec<DeductionSummaryItem>,
    pub deduction: Vec<DeductionSummaryItem>,
    pub total_income: f64,
    pub total_deduction: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomFieldType {
    Income,
    Deduction,
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomFieldAmount {
    #[serde(deserialize_with = "lenient_text")]
    pub field_key: String,
    #[serde(deserialize_with = "lenient_text")]
    pub label: String,
    #[serde(deserialize_with = "lenient_text")]
    pub field_type: String,
    #[serde(deserialize_with = "lenient_flag")]
    pub is_non_cash: bool,
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: f64,
}

impl CustomFieldAmount {
    pub fn kind(&self) -> CustomFieldType {
        match self.field_type.trim().to_lowercase().as_str() {
            "income" => CustomFieldType::Income,
            "deduction" => CustomFieldType::Deduction,
            _ => CustomFieldType::Other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalaryRecord {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient_id")]
    pub person_id: Option<i64>,
    #[serde(deserialize_with = "lenient_year")]
    pub year: Option<i32>,
    #[serde(deserialize_with = "lenient_month")]
    pub month: Option<u32>,
    #[serde(deserialize_with = "lenient_amount")]
    pub base_salary: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub performance_salary: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub high_temp_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub low_temp_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub meal_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub computer_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub communication_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub comprehensive_allowance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub mid_autumn_benefit: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub dragon_boat_benefit: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub spring_festival_benefit: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub other_income: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub pension_insurance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub medical_insurance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub unemployment_insurance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub critical_illness_insurance: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub enterprise_annuity: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub housing_fund: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub other_deductions: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub labor_union_fee: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub performance_deduction: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub tax: f64,
    #[serde(deserialize_with = "lenient_items")]
    pub custom_fields: Vec<CustomFieldAmount>,
}

impl SalaryRecord {
    pub fn period_num(&self) -> Option<i32> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => year.checked_mul(100)?.checked_add(month as i32),
            _ => None,
        }
    }

    /// Reads a deduction column by its category key. Unknown keys read as 0.
    pub fn deduction_amount(&self, key: &str) -> f64 {
        match key {
            "pension_insurance" => self.pension_insurance,
            "medical_insurance" => self.medical_insurance,
            "unemployment_insurance" => self.unemployment_insurance,
            "critical_illness_insurance" => self.critical_illness_insurance,
            "enterprise_annuity" => self.enterprise_annuity,
            "housing_fund" => self.housing_fund,
            "other_deductions" => self.other_deductions,
            "labor_union_fee" => self.labor_union_fee,
            "performance_deduction" => self.performance_deduction,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    #[serde(deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_amount")]
    pub pension_history: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub medical_history: f64,
    #[serde(deserialize_with = "lenient_amount")]
    pub housing_fund_history: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayrollDataset {
    pub persons: Vec<Person>,
    pub salary_records: Vec<SalaryRecord>,
}

impl PayrollDataset {
    pub fn person(&self, person_id: i64) -> Option<&Person> {
        self.persons.iter().find(|p| p.id == Some(person_id))
    }

    pub fn person_ids(&self) -> Vec<i64> {
        let mut ids = self.persons.iter().filter_map(|p| p.id).collect::<Vec<_>>();
        if ids.is_empty() {
            // Datasets without a persons table still group by the ids seen on records.
            for record in &self.salary_records {
                if let Some(pid) = record.person_id {
                    if !ids.contains(&pid) {
                        ids.push(pid);
                    }
                }
            }
        }
        ids
    }
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10_f64.powi(digits);
    (value * factor).round() / factor
}

/// Parses amount text such as `"1,234.50"`, `"¥800"` or `"3200元"`.
pub fn parse_amount_text(raw: &str) -> Option<f64> {
    let cleaned = raw
        .trim()
        .replace(',', "")
        .replace('￥', "")
        .replace('¥', "")
        .replace('元', "")
        .replace(' ', "");
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn amount_from_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Null => Some(0.0),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_amount_text(s),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.unwrap_or_else(|| {
        log::debug!("ignored malformed amount: {value}");
        0.0
    })
}

fn int_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub(crate) fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().map(amount_from_value).unwrap_or(0.0))
}

pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(int_from_value))
}

pub(crate) fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let year = raw
        .as_ref()
        .and_then(int_from_value)
        .filter(|y| (1..=9999).contains(y))
        .map(|y| y as i32);
    if year.is_none() && raw.as_ref().is_some_and(|v| !v.is_null()) {
        log::debug!("ignored malformed year: {raw:?}");
    }
    Ok(year)
}

pub(crate) fn lenient_month<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let month = raw
        .as_ref()
        .and_then(int_from_value)
        .filter(|m| (1..=12).contains(m))
        .map(|m| m as u32);
    if month.is_none() && raw.as_ref().is_some_and(|v| !v.is_null()) {
        log::debug!("ignored malformed month: {raw:?}");
    }
    Ok(month)
}

pub(crate) fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

pub(crate) fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => {
            ["1", "true", "yes", "y", "on"].contains(&s.trim().to_lowercase().as_str())
        }
        _ => false,
    })
}

/// Query parameters arrive as text but callers often send bare numbers.
pub(crate) fn lenient_param<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().map(records_from_value).unwrap_or_default())
}

/// Decodes every element of a JSON array that forms a valid record and skips
/// the rest. Non-array input decodes to an empty collection.
pub fn records_from_value<T>(value: &Value) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    let Some(items) = value.as_array() else {
        if !value.is_null() {
            log::warn!("expected a JSON array of records, got {}", json_kind(value));
        }
        return Vec::new();
    };
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match T::deserialize(item) {
            Ok(record) => out.push(record),
            Err(e) => log::warn!("skipped malformed record #{idx}: {e}"),
        }
    }
    out
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
