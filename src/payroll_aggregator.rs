//! Pure derivations over fetched payroll collections: totals, the ordered
//! net-income series and its extremes, categorized breakdowns and the income
//! mix. Nothing in here performs I/O or fails; missing numbers are already 0
//! by the time records reach these functions.

use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

use crate::payroll_records::{
    round_to, CategoryAmount, CompositionRecord, MonthlyRecord, NetIncomePoint,
};

pub const PERCENT_PLACEHOLDER: &str = "--";

pub const DEDUCTION_CATEGORY_LABELS: &[(&str, &str)] = &[
    ("pension_insurance", "养老保险"),
    ("medical_insurance", "医疗保险"),
    ("unemployment_insurance", "失业保险"),
    ("critical_illness_insurance", "大病互助保险"),
    ("enterprise_annuity", "企业年金"),
    ("housing_fund", "住房公积金"),
    ("other_deductions", "其他扣除"),
    ("labor_union_fee", "工会"),
    ("performance_deduction", "绩效扣除"),
];

pub const INCOME_CATEGORY_LABELS: &[(&str, &str)] = &[
    ("base_salary", "基本工资"),
    ("performance_salary", "绩效工资"),
    ("high_temp_allowance", "高温补贴"),
    ("low_temp_allowance", "低温补贴"),
    ("meal_allowance", "餐补"),
    ("computer_allowance", "电脑补贴"),
    ("communication_allowance", "通讯补贴"),
    ("comprehensive_allowance", "综合补贴"),
    ("mid_autumn_benefit", "中秋福利"),
    ("dragon_boat_benefit", "端午福利"),
    ("spring_festival_benefit", "春节福利"),
    ("other_income", "其他收入"),
];

/// Division result that keeps "undefined" apart from zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Defined(f64),
    Undefined,
}

impl Ratio {
    pub fn value(self) -> Option<f64> {
        match self {
            Ratio::Defined(v) => Some(v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Ratio::Undefined)
    }

    pub fn as_percent(self) -> Ratio {
        match self {
            Ratio::Defined(v) => Ratio::Defined(v * 100.0),
            Ratio::Undefined => Ratio::Undefined,
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Ratio::Defined(v) => serializer.serialize_f64(*v),
            Ratio::Undefined => serializer.serialize_none(),
        }
    }
}

pub fn ratio(numerator: f64, denominator: f64) -> Ratio {
    if denominator == 0.0 || !denominator.is_finite() {
        return Ratio::Undefined;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        Ratio::Defined(value)
    } else {
        Ratio::Undefined
    }
}

/// Renders a 0..1 ratio as a percentage text with two decimals.
pub fn format_percent(value: Ratio) -> String {
    match value {
        Ratio::Defined(v) => format!("{:.2}%", v * 100.0),
        Ratio::Undefined => PERCENT_PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub gross: f64,
    pub net: f64,
    pub take_home: f64,
    pub tax: f64,
    pub insurance: f64,
    pub allowances: f64,
    pub non_cash: f64,
    pub months: usize,
}

pub fn aggregate_totals(records: &[MonthlyRecord]) -> Totals {
    let mut totals = Totals::default();
    let mut periods = HashSet::<(i32, u32)>::new();
    for r in records {
        totals.gross += r.gross_income;
        totals.net += r.net_income;
        totals.take_home += r.actual_take_home;
        totals.tax += r.tax;
        totals.insurance += r.insurance_total;
        totals.allowances += r.allowances_total;
        totals.non_cash += r.non_cash_benefits;
        if let (Some(year), Some(month)) = (r.year, r.month) {
            periods.insert((year, month));
        }
    }
    totals.months = periods.len();
    totals
}

pub fn average_net(totals: &Totals) -> Ratio {
    ratio(totals.net, totals.months as f64)
}

pub fn net_income_series(records: &[MonthlyRecord]) -> Vec<NetIncomePoint> {
    records.iter().map(NetIncomePoint::from).collect()
}

pub fn order_series(points: &[NetIncomePoint]) -> Vec<NetIncomePoint> {
    let mut ordered = points.to_vec();
    // `sort_by_key` is stable, so equal periods keep their input order.
    ordered.sort_by_key(NetIncomePoint::period_key);
    ordered
}

/// Sums every person's net income per calendar month. The merged points carry
/// no `person_id` and come back in period order.
pub fn merge_series_by_month(points: &[NetIncomePoint]) -> Vec<NetIncomePoint> {
    let mut by_month = BTreeMap::<(Option<i32>, Option<u32>), f64>::new();
    for p in points {
        *by_month.entry((p.year, p.month)).or_insert(0.0) += p.net_income;
    }
    by_month
        .into_iter()
        .map(|((year, month), net_income)| NetIncomePoint {
            person_id: None,
            year,
            month,
            net_income,
        })
        .collect()
}

pub fn best_month(series: &[NetIncomePoint]) -> Option<&NetIncomePoint> {
    series.iter().fold(None, |best, point| match best {
        Some(b) if point.net_income <= b.net_income => Some(b),
        _ => Some(point),
    })
}

pub fn worst_month(series: &[NetIncomePoint]) -> Option<&NetIncomePoint> {
    series.iter().fold(None, |worst, point| match worst {
        Some(w) if point.net_income >= w.net_income => Some(w),
        _ => Some(point),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthDelta {
    pub amount: f64,
    pub latest: NetIncomePoint,
    pub previous: NetIncomePoint,
}

pub fn month_over_month_delta(series: &[NetIncomePoint]) -> Option<MonthDelta> {
    let [.., previous, latest] = series else {
        return None;
    };
    Some(MonthDelta {
        amount: latest.net_income - previous.net_income,
        latest: latest.clone(),
        previous: previous.clone(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroRows {
    Keep,
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedRow {
    pub category: String,
    pub label: String,
    pub amount: f64,
    pub percent: f64,
}

pub fn categorize(items: &[CategoryAmount], key_map: &[(&str, &str)]) -> Vec<CategorizedRow> {
    categorize_with(items, key_map, ZeroRows::Drop)
}

/// Groups amounts by the keys of `key_map`, in map order. Keys outside the
/// map are dropped. Percent is on a 0..100 scale and falls back to 0 when
/// the category total is 0.
pub fn categorize_with(
    items: &[CategoryAmount],
    key_map: &[(&str, &str)],
    zero_rows: ZeroRows,
) -> Vec<CategorizedRow> {
    let mut sums = vec![0.0_f64; key_map.len()];
    for item in items {
        match key_map.iter().position(|(key, _)| *key == item.category) {
            Some(idx) => sums[idx] += item.amount,
            None => log::debug!("dropped uncategorized amount: {}", item.category),
        }
    }
    let total = sums.iter().sum::<f64>();

    key_map
        .iter()
        .zip(sums)
        .filter(|(_, amount)| zero_rows == ZeroRows::Keep || *amount != 0.0)
        .map(|((key, label), amount)| CategorizedRow {
            category: key.to_string(),
            label: label.to_string(),
            amount: round_to(amount, 2),
            percent: share_percent(amount, total),
        })
        .collect()
}

/// Percentage share for always-printable columns: 0 instead of the sentinel.
pub fn share_percent(amount: f64, total: f64) -> f64 {
    ratio(amount, total)
        .as_percent()
        .value()
        .filter(|_| total > 0.0)
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct IncomeMix {
    pub base: f64,
    pub perf: f64,
    pub allow: f64,
    pub benefits: f64,
    pub other: f64,
}

impl IncomeMix {
    pub fn total(&self) -> f64 {
        self.base + self.perf + self.allow + self.benefits + self.other
    }

    /// Buckets in declaration order, which is also the tie-break order.
    pub fn buckets(&self) -> [(&'static str, &'static str, f64); 5] {
        [
            ("base", "基本工资", self.base),
            ("perf", "绩效工资", self.perf),
            ("allow", "补贴", self.allow),
            ("benefits", "福利", self.benefits),
            ("other", "其他收入", self.other),
        ]
    }
}

pub fn composition_allowances(r: &CompositionRecord) -> f64 {
    r.high_temp_allowance
        + r.low_temp_allowance
        + r.meal_allowance
        + r.computer_allowance
        + r.communication_allowance
        + r.comprehensive_allowance
}

pub fn compose_income_mix(records: &[CompositionRecord]) -> IncomeMix {
    records.iter().fold(IncomeMix::default(), |mut mix, r| {
        mix.base += r.base_salary;
        mix.perf += r.performance_salary;
        mix.allow += composition_allowances(r);
        mix.benefits += r.non_cash_benefits;
        mix.other += r.other_income;
        mix
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributor {
    pub key: &'static str,
    pub label: &'static str,
    pub value: f64,
    pub share: Ratio,
}

pub fn top_contributors(mix: &IncomeMix, n: usize) -> Vec<Contributor> {
    let total = mix.total();
    let mut ranked = mix.buckets().to_vec();
    // Stable sort keeps declaration order for equal values.
    ranked.sort_by(|a, b| b.2.total_cmp(&a.2));
    ranked
        .into_iter()
        .take(n)
        .map(|(key, label, value)| Contributor {
            key,
            label,
            value,
            share: ratio(value, total),
        })
        .collect()
}
