use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};

use crate::month_range::{parse_month_range, MonthRange, StatsFilter};
use crate::payroll_aggregator::{
    aggregate_totals, average_net, best_month, categorize, categorize_with, compose_income_mix,
    format_percent, merge_series_by_month, month_over_month_delta, net_income_series, order_series, ratio,
    top_contributors, worst_month, CategorizedRow, Contributor, IncomeMix, MonthDelta, Ratio,
    Totals, ZeroRows, DEDUCTION_CATEGORY_LABELS, INCOME_CATEGORY_LABELS,
};
use crate::payroll_calc::{
    compute_payroll, deduction_category_items, income_category_items, income_composition,
    monthly_record,
};
use crate::payroll_records::{
    round_to, CategorySummary, CompositionRecord, DeductionSummaryItem, NetIncomePoint,
    PayrollDataset, SalaryRecord,
};

const TOP_CONTRIBUTOR_COUNT: usize = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsFilterRequest {
    #[serde(default, deserialize_with = "crate::payroll_records::lenient_param")]
    pub person_id: Option<String>,
    #[serde(default, deserialize_with = "crate::payroll_records::lenient_param")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "crate::payroll_records::lenient_param")]
    pub month: Option<String>,
    #[serde(default, deserialize_with = "crate::payroll_records::lenient_param")]
    pub range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct YearlyStatsQueryRequest {
    #[serde(default, deserialize_with = "crate::payroll_records::lenient_param")]
    pub person_id: Option<String>,
    #[serde(default, deserialize_with = "crate::payroll_records::lenient_param")]
    pub year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FamilySummaryQueryRequest {
    #[serde(default, deserialize_with = "crate::payroll_records::lenient_param")]
    pub year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContributionsCumulativeQueryRequest {
    #[serde(default, deserialize_with = "crate::payroll_records::lenient_param")]
    pub person_id: Option<String>,
    #[serde(default, deserialize_with = "crate::payroll_records::lenient_param")]
    pub range: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    #[serde(flatten)]
    pub point: NetIncomePoint,
    pub total_income: f64,
    pub take_home_ratio: Ratio,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub record_count: usize,
    pub totals: Totals,
    pub average_net: Ratio,
    pub take_home_rate: Ratio,
    pub tax_rate: Ratio,
    pub series: Vec<TrendPoint>,
    pub best_month: Option<NetIncomePoint>,
    pub worst_month: Option<NetIncomePoint>,
    pub month_delta: Option<MonthDelta>,
    pub income_mix: IncomeMix,
    pub income_total: f64,
    pub top_contributors: Vec<Contributor>,
    pub deductions: Vec<CategorizedRow>,
}

#[derive(Debug, Default)]
struct YearAccumulator {
    months: i64,
    gross: f64,
    net: f64,
    insurance: f64,
    tax: f64,
    allowances: f64,
    bonuses: f64,
    non_cash: f64,
}

type MonthKey = (Option<i64>, Option<i32>, Option<u32>);

fn money(value: f64) -> f64 {
    round_to(value, 2)
}

fn parse_year_param(raw: Option<&str>, default_year: i32) -> Result<i32, String> {
    let text = raw.unwrap_or("").trim();
    if text.is_empty() {
        return Ok(default_year);
    }
    let value = text
        .parse::<i32>()
        .map_err(|_| "year 必须是整数年份".to_string())?;
    if !(2000..=2100).contains(&value) {
        return Err("year 超出支持范围（2000-2100）".to_string());
    }
    Ok(value)
}

fn parse_optional_year(raw: Option<&str>) -> Result<Option<i32>, String> {
    let text = raw.unwrap_or("").trim();
    if text.is_empty() {
        return Ok(None);
    }
    parse_year_param(Some(text), 0).map(Some)
}

fn parse_month_param(raw: Option<&str>) -> Result<Option<u32>, String> {
    let text = raw.unwrap_or("").trim();
    if text.is_empty() {
        return Ok(None);
    }
    let value = text
        .parse::<u32>()
        .map_err(|_| "month 必须是 1-12 的整数".to_string())?;
    if !(1..=12).contains(&value) {
        return Err("month 必须是 1-12 的整数".to_string());
    }
    Ok(Some(value))
}

fn parse_person_id_param(raw: Option<&str>) -> Result<Option<i64>, String> {
    let text = raw.unwrap_or("").trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<i64>()
        .map(Some)
        .map_err(|_| "person_id 必须是整数".to_string())
}

pub fn parse_stats_filter(req: &StatsFilterRequest) -> Result<StatsFilter, String> {
    let range = req
        .range
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_month_range);
    Ok(StatsFilter {
        person_id: parse_person_id_param(req.person_id.as_deref())?,
        year: parse_optional_year(req.year.as_deref())?,
        month: parse_month_param(req.month.as_deref())?,
        range,
    })
}

fn sort_by_period(records: &mut [&SalaryRecord]) {
    records.sort_by_key(|r| {
        (
            r.year.unwrap_or(0),
            r.month.unwrap_or(0),
            r.person_id.unwrap_or(0),
        )
    });
}

fn totals_to_json(totals: &Totals) -> Value {
    json!({
        "gross": money(totals.gross),
        "net": money(totals.net),
        "take_home": money(totals.take_home),
        "tax": money(totals.tax),
        "insurance": money(totals.insurance),
        "allowances": money(totals.allowances),
        "non_cash": money(totals.non_cash),
        "months": totals.months,
    })
}

pub fn monthly_stats_query(
    dataset: &PayrollDataset,
    req: StatsFilterRequest,
) -> Result<Value, String> {
    let filter = parse_stats_filter(&req)?;
    let mut records = filter.apply(&dataset.salary_records);
    sort_by_period(&mut records);

    let monthly = records.iter().map(|r| monthly_record(r)).collect::<Vec<_>>();
    let rows = records
        .iter()
        .map(|r| {
            let calc = compute_payroll(r);
            json!({
                "person_id": r.person_id,
                "year": r.year,
                "month": r.month,
                "base_salary": money(r.base_salary),
                "performance": money(r.performance_salary),
                "allowances_total": money(calc.allowances_total),
                "bonuses_total": money(calc.bonuses_total),
                "insurance_total": money(calc.insurance_total),
                "tax": money(calc.tax),
                "gross_income": money(calc.cash_income),
                "net_income": money(calc.actual_take_home),
                "actual_take_home": money(calc.actual_take_home),
                "non_cash_benefits": money(calc.benefits_total),
            })
        })
        .collect::<Vec<_>>();

    Ok(json!({
        "summary": totals_to_json(&aggregate_totals(&monthly)),
        "rows": rows,
    }))
}

pub fn yearly_stats_query(
    dataset: &PayrollDataset,
    req: YearlyStatsQueryRequest,
) -> Result<Value, String> {
    let today = Local::now().date_naive();
    let year = parse_year_param(req.year.as_deref(), today.year())?;
    let person_filter = parse_person_id_param(req.person_id.as_deref())?;

    let mut person_ids = dataset.person_ids();
    if let Some(pid) = person_filter {
        if !person_ids.contains(&pid) {
            return Err("人员不存在".to_string());
        }
        person_ids = vec![pid];
    }

    let mut stats = BTreeMap::<i64, YearAccumulator>::new();
    for r in dataset.salary_records.iter().filter(|r| r.year == Some(year)) {
        let Some(pid) = r.person_id.filter(|pid| person_ids.contains(pid)) else {
            continue;
        };
        let calc = compute_payroll(r);
        let s = stats.entry(pid).or_default();
        s.months += 1;
        s.gross += calc.cash_income;
        s.net += calc.actual_take_home;
        s.insurance += calc.insurance_total;
        s.tax += calc.tax;
        s.allowances += calc.allowances_total;
        s.bonuses += calc.bonuses_total;
        s.non_cash += calc.benefits_total;
    }

    let rows = stats
        .iter()
        .map(|(pid, s)| {
            let avg_net = ratio(s.net, s.months as f64).value().unwrap_or(0.0);
            json!({
                "person_id": pid,
                "year": year,
                "months": s.months,
                "total_gross": money(s.gross),
                "total_net": money(s.net),
                "avg_net": money(avg_net),
                "insurance_total": money(s.insurance),
                "tax_total": money(s.tax),
                "allowances_total": money(s.allowances),
                "bonuses_total": money(s.bonuses),
                "total_actual_take_home": money(s.net),
                "total_non_cash_benefits": money(s.non_cash),
            })
        })
        .collect::<Vec<_>>();

    Ok(json!({
        "year": year,
        "rows": rows,
    }))
}

pub fn family_summary_query(
    dataset: &PayrollDataset,
    req: FamilySummaryQueryRequest,
) -> Result<Value, String> {
    let today = Local::now().date_naive();
    let year = parse_year_param(req.year.as_deref(), today.year())?;
    let person_ids = dataset.person_ids();

    let mut by_person = person_ids
        .iter()
        .map(|pid| (*pid, 0.0_f64))
        .collect::<BTreeMap<_, _>>();
    let mut total_gross = 0.0;
    let mut total_net = 0.0;
    let mut insurance_total = 0.0;
    let mut tax_total = 0.0;
    for r in dataset.salary_records.iter().filter(|r| r.year == Some(year)) {
        let Some(net) = r.person_id.and_then(|pid| by_person.get_mut(&pid)) else {
            continue;
        };
        let calc = compute_payroll(r);
        *net += calc.actual_take_home;
        total_gross += calc.cash_income;
        total_net += calc.actual_take_home;
        insurance_total += calc.insurance_total;
        tax_total += calc.tax;
    }

    let by_person_json = by_person
        .iter()
        .map(|(pid, net)| (pid.to_string(), json!(money(*net))))
        .collect::<Map<_, _>>();

    Ok(json!({
        "year": year,
        "persons": person_ids,
        "total_gross": money(total_gross),
        "total_net": money(total_net),
        "insurance_total": money(insurance_total),
        "tax_total": money(tax_total),
        "by_person": by_person_json,
    }))
}

pub fn cumulative_insurance_query(dataset: &PayrollDataset) -> Result<Value, String> {
    let rows = dataset
        .persons
        .iter()
        .filter_map(|person| person.id.map(|pid| (pid, person)))
        .map(|(pid, person)| {
            let recs = dataset
                .salary_records
                .iter()
                .filter(|r| r.person_id == Some(pid))
                .collect::<Vec<_>>();
            let pension_system = recs.iter().map(|r| r.pension_insurance).sum::<f64>();
            let medical_system = recs.iter().map(|r| r.medical_insurance).sum::<f64>();
            let housing_fund_system = recs.iter().map(|r| r.housing_fund).sum::<f64>();
            json!({
                "person_id": pid,
                "person_name": person.name,
                "pension_history": money(person.pension_history),
                "medical_history": money(person.medical_history),
                "housing_fund_history": money(person.housing_fund_history),
                "pension_system": money(pension_system),
                "medical_system": money(medical_system),
                "housing_fund_system": money(housing_fund_system),
                "pension_total": money(person.pension_history + pension_system),
                "medical_total": money(person.medical_history + medical_system),
                "housing_fund_total": money(person.housing_fund_history + housing_fund_system),
            })
        })
        .collect::<Vec<_>>();
    Ok(json!({ "rows": rows }))
}

pub fn income_composition_query(
    dataset: &PayrollDataset,
    req: StatsFilterRequest,
) -> Result<Value, String> {
    let filter = parse_stats_filter(&req)?;
    let mut records = filter.apply(&dataset.salary_records);
    sort_by_period(&mut records);

    let compositions = records
        .iter()
        .map(|r| income_composition(r))
        .collect::<Vec<_>>();
    let mix = compose_income_mix(
        &compositions
            .iter()
            .map(|c| c.record.clone())
            .collect::<Vec<_>>(),
    );
    let top = top_contributors(&mix, TOP_CONTRIBUTOR_COUNT);

    Ok(json!({
        "rows": serde_json::to_value(&compositions)
            .map_err(|e| format!("序列化收入构成失败: {e}"))?,
        "mix": serde_json::to_value(mix).map_err(|e| format!("序列化收入构成失败: {e}"))?,
        "income_total": money(mix.total()),
        "top_contributors": serde_json::to_value(&top)
            .map_err(|e| format!("序列化收入构成失败: {e}"))?,
    }))
}

pub fn deductions_breakdown_query(
    dataset: &PayrollDataset,
    req: StatsFilterRequest,
) -> Result<Value, String> {
    let filter = parse_stats_filter(&req)?;
    let records = filter.apply(&dataset.salary_records);

    let items = records
        .iter()
        .flat_map(|r| deduction_category_items(r))
        .collect::<Vec<_>>();
    // Every deduction column is listed, including those that sum to zero.
    let summary = categorize_with(&items, DEDUCTION_CATEGORY_LABELS, ZeroRows::Keep)
        .into_iter()
        .map(|row| {
            json!({
                "category": row.label,
                "key": row.category,
                "amount": row.amount,
                "percent": row.percent,
            })
        })
        .collect::<Vec<_>>();

    let mut monthly_map = BTreeMap::<(i32, u32), Vec<f64>>::new();
    for r in &records {
        let (Some(year), Some(month)) = (r.year, r.month) else {
            continue;
        };
        let sums = monthly_map
            .entry((year, month))
            .or_insert_with(|| vec![0.0; DEDUCTION_CATEGORY_LABELS.len()]);
        for (idx, item) in deduction_category_items(r).into_iter().enumerate() {
            sums[idx] += item.amount;
        }
    }

    let monthly = monthly_map
        .into_iter()
        .map(|((year, month), sums)| {
            let mut row = Map::new();
            row.insert("year".to_string(), json!(year));
            row.insert("month".to_string(), json!(month));
            for ((key, _), amount) in DEDUCTION_CATEGORY_LABELS.iter().zip(&sums) {
                row.insert(key.to_string(), json!(money(*amount)));
            }
            row.insert("total".to_string(), json!(money(sums.iter().sum())));
            Value::Object(row)
        })
        .collect::<Vec<_>>();

    Ok(json!({
        "summary": summary,
        "monthly": monthly,
    }))
}

pub fn contributions_cumulative_query(
    dataset: &PayrollDataset,
    req: ContributionsCumulativeQueryRequest,
) -> Result<Value, String> {
    let person_id = parse_person_id_param(req.person_id.as_deref())?
        .ok_or_else(|| "person_id 必填".to_string())?;
    let person = dataset
        .person(person_id)
        .ok_or_else(|| "人员不存在".to_string())?;
    let range = req
        .range
        .as_deref()
        .map(parse_month_range)
        .unwrap_or(MonthRange::UNBOUNDED);

    let mut recs = dataset
        .salary_records
        .iter()
        .filter(|r| r.person_id == Some(person_id))
        .collect::<Vec<_>>();
    recs.sort_by_key(|r| r.period_num().unwrap_or(0));

    let mut pension = person.pension_history;
    let mut medical = person.medical_history;
    let mut housing = person.housing_fund_history;
    for r in &recs {
        if r.period_num().is_some_and(|ym| ym < range.start) {
            pension += r.pension_insurance;
            medical += r.medical_insurance;
            housing += r.housing_fund;
        }
    }

    let mut points = Vec::new();
    for r in &recs {
        let Some(ym) = r.period_num() else {
            continue;
        };
        if !range.contains(ym) {
            continue;
        }
        pension += r.pension_insurance;
        medical += r.medical_insurance;
        housing += r.housing_fund;
        points.push(json!({
            "year": r.year,
            "month": r.month,
            "pension_cumulative": money(pension),
            "medical_cumulative": money(medical),
            "housing_fund_cumulative": money(housing),
        }));
    }

    let pension_system = recs.iter().map(|r| r.pension_insurance).sum::<f64>();
    let medical_system = recs.iter().map(|r| r.medical_insurance).sum::<f64>();
    let housing_system = recs.iter().map(|r| r.housing_fund).sum::<f64>();

    Ok(json!({
        "person_id": person_id,
        "person_name": person.name,
        "pension_history": money(person.pension_history),
        "medical_history": money(person.medical_history),
        "housing_fund_history": money(person.housing_fund_history),
        "points": points,
        "pension_system_total": money(pension_system),
        "medical_system_total": money(medical_system),
        "housing_fund_system_total": money(housing_system),
        "pension_total": money(person.pension_history + pension_system),
        "medical_total": money(person.medical_history + medical_system),
        "housing_fund_total": money(person.housing_fund_history + housing_system),
    }))
}

fn summary_items(rows: Vec<CategorizedRow>) -> Vec<DeductionSummaryItem> {
    rows.into_iter()
        .map(|row| DeductionSummaryItem {
            category: row.category,
            label: row.label,
            amount: row.amount,
        })
        .collect()
}

pub fn category_summary(records: &[&SalaryRecord]) -> CategorySummary {
    let income_items = records
        .iter()
        .flat_map(|r| income_category_items(r))
        .collect::<Vec<_>>();
    let deduction_items = records
        .iter()
        .flat_map(|r| deduction_category_items(r))
        .collect::<Vec<_>>();
    let income = summary_items(categorize(&income_items, INCOME_CATEGORY_LABELS));
    let deduction = summary_items(categorize(&deduction_items, DEDUCTION_CATEGORY_LABELS));
    let total_income = money(income.iter().map(|i| i.amount).sum());
    let total_deduction = money(deduction.iter().map(|i| i.amount).sum());
    CategorySummary {
        income,
        deduction,
        total_income,
        total_deduction,
    }
}

pub fn category_summary_query(
    dataset: &PayrollDataset,
    req: StatsFilterRequest,
) -> Result<Value, String> {
    let filter = parse_stats_filter(&req)?;
    let records = filter.apply(&dataset.salary_records);
    serde_json::to_value(category_summary(&records))
        .map_err(|e| format!("序列化分类汇总失败: {e}"))
}

fn composition_total(record: &CompositionRecord) -> f64 {
    compose_income_mix(std::slice::from_ref(record)).total()
}

pub fn build_dashboard_snapshot(
    dataset: &PayrollDataset,
    filter: &StatsFilter,
) -> DashboardSnapshot {
    let records = filter.apply(&dataset.salary_records);
    let monthly = records.iter().map(|r| monthly_record(r)).collect::<Vec<_>>();
    let compositions = records
        .iter()
        .map(|r| income_composition(r).record)
        .collect::<Vec<_>>();

    let totals = aggregate_totals(&monthly);
    // Without a pinned person every point is a household month.
    let per_person = filter.person_id.is_some();
    let series = if per_person {
        order_series(&net_income_series(&monthly))
    } else {
        merge_series_by_month(&net_income_series(&monthly))
    };

    let mut income_by_month = HashMap::<MonthKey, f64>::new();
    for c in &compositions {
        let person_id = if per_person { c.person_id } else { None };
        *income_by_month
            .entry((person_id, c.year, c.month))
            .or_insert(0.0) += composition_total(c);
    }
    let trend = series
        .iter()
        .map(|p| {
            let total_income = income_by_month
                .get(&(p.person_id, p.year, p.month))
                .copied()
                .unwrap_or(0.0);
            TrendPoint {
                point: p.clone(),
                total_income: money(total_income),
                take_home_ratio: ratio(p.net_income, total_income),
            }
        })
        .collect::<Vec<_>>();

    let income_mix = compose_income_mix(&compositions);
    let deduction_items = records
        .iter()
        .flat_map(|r| deduction_category_items(r))
        .collect::<Vec<_>>();

    DashboardSnapshot {
        record_count: records.len(),
        totals,
        average_net: average_net(&totals),
        take_home_rate: ratio(totals.take_home, totals.gross),
        tax_rate: ratio(totals.tax, totals.gross),
        best_month: best_month(&series).cloned(),
        worst_month: worst_month(&series).cloned(),
        month_delta: month_over_month_delta(&series),
        series: trend,
        income_total: money(income_mix.total()),
        income_mix,
        top_contributors: top_contributors(&income_mix, TOP_CONTRIBUTOR_COUNT),
        deductions: categorize(&deduction_items, DEDUCTION_CATEGORY_LABELS),
    }
}

pub fn dashboard_snapshot_to_json(snapshot: &DashboardSnapshot) -> Result<Value, String> {
    let mut payload =
        serde_json::to_value(snapshot).map_err(|e| format!("序列化仪表盘数据失败: {e}"))?;
    if let Some(obj) = payload.as_object_mut() {
        obj.insert(
            "take_home_rate_pct_text".to_string(),
            json!(format_percent(snapshot.take_home_rate)),
        );
        obj.insert(
            "tax_rate_pct_text".to_string(),
            json!(format_percent(snapshot.tax_rate)),
        );
    }
    Ok(payload)
}

pub fn dashboard_overview_query(
    dataset: &PayrollDataset,
    req: StatsFilterRequest,
) -> Result<Value, String> {
    let filter = parse_stats_filter(&req)?;
    dashboard_snapshot_to_json(&build_dashboard_snapshot(dataset, &filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset_loader::dataset_from_value;
    use crate::payroll_records::{CustomFieldAmount, Person};

    fn v_f64(v: &Value, path: &[&str]) -> f64 {
        let mut cur = v;
        for key in path {
            cur = cur
                .get(*key)
                .unwrap_or_else(|| panic!("missing key: {}", key));
        }
        cur.as_f64()
            .unwrap_or_else(|| panic!("expected f64 at path {:?}", path))
    }

    fn v_i64(v: &Value, path: &[&str]) -> i64 {
        let mut cur = v;
        for key in path {
            cur = cur
                .get(*key)
                .unwrap_or_else(|| panic!("missing key: {}", key));
        }
        cur.as_i64()
            .unwrap_or_else(|| panic!("expected i64 at path {:?}", path))
    }

    fn v_str<'a>(v: &'a Value, path: &[&str]) -> &'a str {
        let mut cur = v;
        for key in path {
            cur = cur
                .get(*key)
                .unwrap_or_else(|| panic!("missing key: {}", key));
        }
        cur.as_str()
            .unwrap_or_else(|| panic!("expected str at path {:?}", path))
    }

    fn approx_eq(a: f64, b: f64, eps: f64) {
        assert!(
            (a - b).abs() <= eps,
            "approx not equal: left={a} right={b} eps={eps}"
        );
    }

    fn salary(person_id: i64, year: i32, month: u32, base: f64, perf: f64) -> SalaryRecord {
        SalaryRecord {
            person_id: Some(person_id),
            year: Some(year),
            month: Some(month),
            base_salary: base,
            performance_salary: perf,
            pension_insurance: 400.0,
            medical_insurance: 100.0,
            housing_fund: 500.0,
            tax: 200.0,
            ..Default::default()
        }
    }

    fn fixture() -> PayrollDataset {
        let mut feb = salary(1, 2024, 2, 8000.0, 1000.0);
        feb.meal_allowance = 300.0;
        feb.custom_fields = vec![CustomFieldAmount {
            field_key: "fine".to_string(),
            label: "罚款".to_string(),
            field_type: "deduction".to_string(),
            is_non_cash: false,
            amount: 50.0,
        }];
        let mut spring = salary(2, 2024, 2, 6000.0, 0.0);
        spring.spring_festival_benefit = 600.0;
        PayrollDataset {
            persons: vec![
                Person {
                    id: Some(1),
                    name: "张三".to_string(),
                    pension_history: 10000.0,
                    medical_history: 2000.0,
                    housing_fund_history: 30000.0,
                },
                Person {
                    id: Some(2),
                    name: "李四".to_string(),
                    ..Default::default()
                },
            ],
            salary_records: vec![
                salary(1, 2024, 3, 8000.0, 1500.0),
                feb,
                salary(1, 2024, 1, 8000.0, 500.0),
                spring,
                salary(1, 2023, 12, 7500.0, 0.0),
            ],
        }
    }

    fn filter_req(person_id: Option<&str>, year: Option<&str>) -> StatsFilterRequest {
        StatsFilterRequest {
            person_id: person_id.map(str::to_string),
            year: year.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn filter_params_are_validated() {
        let bad_month = StatsFilterRequest {
            month: Some("13".to_string()),
            ..Default::default()
        };
        assert_eq!(
            parse_stats_filter(&bad_month).unwrap_err(),
            "month 必须是 1-12 的整数"
        );
        let bad_year = filter_req(None, Some("1999"));
        assert!(parse_stats_filter(&bad_year)
            .unwrap_err()
            .contains("超出支持范围"));
        let bad_person = filter_req(Some("abc"), None);
        assert_eq!(
            parse_stats_filter(&bad_person).unwrap_err(),
            "person_id 必须是整数"
        );
        let numeric: StatsFilterRequest =
            serde_json::from_value(json!({"person_id": 1, "year": 2024})).expect("numeric params");
        let filter = parse_stats_filter(&numeric).expect("filter");
        assert_eq!(filter.person_id, Some(1));
        assert_eq!(filter.year, Some(2024));
    }

    #[test]
    fn monthly_stats_are_sorted_and_summed() {
        let payload = monthly_stats_query(&fixture(), filter_req(Some("1"), Some("2024")))
            .expect("monthly stats");
        let rows = payload
            .get("rows")
            .and_then(Value::as_array)
            .expect("rows array");
        assert_eq!(rows.len(), 3);
        let months = rows
            .iter()
            .map(|r| r.get("month").and_then(Value::as_i64).unwrap_or(0))
            .collect::<Vec<_>>();
        assert_eq!(months, vec![1, 2, 3]);
        // feb: 8000 + 1000 + 300 meal - (1000 insurance + 50 fine) - 200 tax
        approx_eq(v_f64(&rows[1], &["net_income"]), 8050.0, 1e-9);
        assert_eq!(v_i64(&payload, &["summary", "months"]), 3);
        approx_eq(v_f64(&payload, &["summary", "tax"]), 600.0, 1e-9);
    }

    #[test]
    fn yearly_stats_group_per_person_and_reject_unknown_person() {
        let payload = yearly_stats_query(
            &fixture(),
            YearlyStatsQueryRequest {
                person_id: None,
                year: Some("2024".to_string()),
            },
        )
        .expect("yearly stats");
        let rows = payload
            .get("rows")
            .and_then(Value::as_array)
            .expect("rows array");
        assert_eq!(rows.len(), 2);
        assert_eq!(v_i64(&rows[0], &["person_id"]), 1);
        assert_eq!(v_i64(&rows[0], &["months"]), 3);
        approx_eq(v_f64(&rows[0], &["total_gross"]), 27300.0, 1e-9);
        approx_eq(v_f64(&rows[1], &["total_non_cash_benefits"]), 600.0, 1e-9);
        approx_eq(v_f64(&rows[1], &["bonuses_total"]), 600.0, 1e-9);

        let err = yearly_stats_query(
            &fixture(),
            YearlyStatsQueryRequest {
                person_id: Some("99".to_string()),
                year: Some("2024".to_string()),
            },
        )
        .unwrap_err();
        assert_eq!(err, "人员不存在");
    }

    #[test]
    fn family_summary_totals_every_person() {
        let payload = family_summary_query(
            &fixture(),
            FamilySummaryQueryRequest {
                year: Some("2024".to_string()),
            },
        )
        .expect("family summary");
        approx_eq(v_f64(&payload, &["total_gross"]), 27300.0 + 6000.0, 1e-9);
        approx_eq(v_f64(&payload, &["tax_total"]), 800.0, 1e-9);
        approx_eq(v_f64(&payload, &["by_person", "2"]), 6000.0 - 1000.0 - 200.0, 1e-9);
        assert_eq!(
            payload
                .get("persons")
                .and_then(Value::as_array)
                .map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn cumulative_insurance_adds_history() {
        let payload = cumulative_insurance_query(&fixture()).expect("cumulative insurance");
        let first = &payload["rows"][0];
        assert_eq!(v_str(first, &["person_name"]), "张三");
        approx_eq(v_f64(first, &["pension_system"]), 1600.0, 1e-9);
        approx_eq(v_f64(first, &["pension_total"]), 11600.0, 1e-9);
        approx_eq(v_f64(first, &["housing_fund_total"]), 32000.0, 1e-9);
    }

    #[test]
    fn deductions_breakdown_keeps_every_category() {
        let payload = deductions_breakdown_query(&fixture(), filter_req(Some("1"), Some("2024")))
            .expect("deductions breakdown");
        let summary = payload
            .get("summary")
            .and_then(Value::as_array)
            .expect("summary array");
        assert_eq!(summary.len(), DEDUCTION_CATEGORY_LABELS.len());
        assert_eq!(v_str(&summary[0], &["category"]), "养老保险");
        approx_eq(v_f64(&summary[0], &["amount"]), 1200.0, 1e-9);
        // 3 months * 1000 insurance + 50 fine
        approx_eq(v_f64(&summary[0], &["percent"]), 1200.0 / 3050.0 * 100.0, 1e-9);
        let other = summary
            .iter()
            .find(|row| row.get("key").and_then(Value::as_str) == Some("other_deductions"))
            .expect("other deductions row");
        approx_eq(v_f64(other, &["amount"]), 50.0, 1e-9);
        let zero = summary
            .iter()
            .find(|row| row.get("key").and_then(Value::as_str) == Some("enterprise_annuity"))
            .expect("enterprise annuity row");
        approx_eq(v_f64(zero, &["percent"]), 0.0, 1e-12);

        let monthly = payload
            .get("monthly")
            .and_then(Value::as_array)
            .expect("monthly array");
        assert_eq!(monthly.len(), 3);
        assert_eq!(v_i64(&monthly[0], &["month"]), 1);
        approx_eq(v_f64(&monthly[1], &["total"]), 1050.0, 1e-9);
    }

    #[test]
    fn contributions_cumulative_offsets_by_range_start() {
        let payload = contributions_cumulative_query(
            &fixture(),
            ContributionsCumulativeQueryRequest {
                person_id: Some("1".to_string()),
                range: Some("2024-02..2024-03".to_string()),
            },
        )
        .expect("contributions");
        let points = payload
            .get("points")
            .and_then(Value::as_array)
            .expect("points array");
        assert_eq!(points.len(), 2);
        // history 10000 + 2023-12 and 2024-01 (2 * 400) + 2024-02 (400)
        approx_eq(v_f64(&points[0], &["pension_cumulative"]), 11200.0, 1e-9);
        approx_eq(v_f64(&points[1], &["pension_cumulative"]), 11600.0, 1e-9);
        approx_eq(v_f64(&payload, &["pension_total"]), 11600.0, 1e-9);

        let missing = contributions_cumulative_query(
            &fixture(),
            ContributionsCumulativeQueryRequest::default(),
        )
        .unwrap_err();
        assert_eq!(missing, "person_id 必填");
    }

    #[test]
    fn category_summary_drops_empty_rows() {
        let payload = category_summary_query(&fixture(), filter_req(None, Some("2024")))
            .expect("category summary");
        let income = payload
            .get("income")
            .and_then(Value::as_array)
            .expect("income array");
        let keys = income
            .iter()
            .filter_map(|row| row.get("category").and_then(Value::as_str))
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                "base_salary",
                "performance_salary",
                "meal_allowance",
                "spring_festival_benefit"
            ]
        );
        approx_eq(v_f64(&payload, &["total_income"]), 27300.0 + 6600.0, 1e-9);
        approx_eq(v_f64(&payload, &["total_deduction"]), 4050.0, 1e-9);
    }

    #[test]
    fn income_composition_reports_mix_and_top_contributors() {
        let payload = income_composition_query(&fixture(), filter_req(Some("2"), None))
            .expect("income composition");
        approx_eq(v_f64(&payload, &["mix", "benefits"]), 600.0, 1e-9);
        approx_eq(v_f64(&payload, &["income_total"]), 6600.0, 1e-9);
        let top = payload
            .get("top_contributors")
            .and_then(Value::as_array)
            .expect("top array");
        assert_eq!(top.len(), 3);
        assert_eq!(v_str(&top[0], &["key"]), "base");
        assert_eq!(v_str(&top[1], &["key"]), "benefits");
        let rows = payload.get("rows").and_then(Value::as_array).expect("rows");
        approx_eq(v_f64(&rows[0], &["total_income"]), 6600.0, 1e-9);
    }

    #[test]
    fn dashboard_overview_combines_kpis() {
        let payload = dashboard_overview_query(&fixture(), filter_req(Some("1"), Some("2024")))
            .expect("dashboard");
        assert_eq!(v_i64(&payload, &["record_count"]), 3);
        assert_eq!(v_i64(&payload, &["totals", "months"]), 3);
        assert_eq!(v_i64(&payload, &["best_month", "month"]), 3);
        assert_eq!(v_i64(&payload, &["worst_month", "month"]), 1);
        // mar net 8300, feb net 8050
        approx_eq(v_f64(&payload, &["month_delta", "amount"]), 250.0, 1e-9);
        let series = payload
            .get("series")
            .and_then(Value::as_array)
            .expect("series array");
        assert_eq!(series.len(), 3);
        approx_eq(v_f64(&series[1], &["total_income"]), 9300.0, 1e-9);
        assert_eq!(payload["top_contributors"][0]["key"].as_str(), Some("base"));

        let empty = dashboard_overview_query(&fixture(), filter_req(Some("1"), Some("2030")))
            .expect("empty dashboard");
        assert!(empty["average_net"].is_null());
        assert!(empty["best_month"].is_null());
        assert_eq!(v_str(&empty, &["tax_rate_pct_text"]), "--");
    }

    #[test]
    fn household_dashboard_merges_people_per_month() {
        let record = |person_id: i64, month: u32, base: f64| SalaryRecord {
            person_id: Some(person_id),
            year: Some(2024),
            month: Some(month),
            base_salary: base,
            ..Default::default()
        };
        let dataset = PayrollDataset {
            persons: Vec::new(),
            salary_records: vec![
                record(1, 1, 9000.0),
                record(2, 1, 3000.0),
                record(1, 2, 9000.0),
                record(2, 2, 4000.0),
            ],
        };
        let payload = dashboard_overview_query(&dataset, StatsFilterRequest::default())
            .expect("household dashboard");
        let series = payload
            .get("series")
            .and_then(Value::as_array)
            .expect("series array");
        assert_eq!(series.len(), 2);
        assert!(series[0]["person_id"].is_null());
        approx_eq(v_f64(&series[0], &["net_income"]), 12000.0, 1e-9);
        approx_eq(v_f64(&series[1], &["total_income"]), 13000.0, 1e-9);
        approx_eq(v_f64(&payload, &["month_delta", "amount"]), 1000.0, 1e-9);
        assert_eq!(v_i64(&payload, &["best_month", "month"]), 2);
        assert!(payload["best_month"]["person_id"].is_null());
        assert_eq!(v_i64(&payload, &["worst_month", "month"]), 1);

        let single = dashboard_overview_query(&dataset, filter_req(Some("2"), None))
            .expect("single person dashboard");
        approx_eq(v_f64(&single, &["month_delta", "amount"]), 1000.0, 1e-9);
        assert_eq!(v_i64(&single["series"][0], &["person_id"]), 2);
    }

    #[test]
    fn huge_year_records_do_not_break_queries() {
        let mut dataset = fixture();
        dataset
            .salary_records
            .push(salary(1, 30_000_000, 1, 9000.0, 0.0));
        let payload = contributions_cumulative_query(
            &dataset,
            ContributionsCumulativeQueryRequest {
                person_id: Some("1".to_string()),
                range: Some("2024".to_string()),
            },
        )
        .expect("contributions with huge year");
        assert_eq!(
            payload
                .get("points")
                .and_then(Value::as_array)
                .map(Vec::len),
            Some(3)
        );

        let inline = dataset_from_value(&json!([
            {"person_id": 1, "year": 30000000, "month": 1, "base_salary": 9000},
            {"person_id": 1, "year": 2024, "month": 1, "base_salary": 9000}
        ]))
        .expect("inline dataset");
        assert_eq!(inline.salary_records[0].year, None);
        let monthly = monthly_stats_query(
            &inline,
            StatsFilterRequest {
                range: Some("2024".to_string()),
                ..Default::default()
            },
        )
        .expect("monthly with huge year");
        assert_eq!(
            monthly.get("rows").and_then(Value::as_array).map(Vec::len),
            Some(1)
        );
    }
}
