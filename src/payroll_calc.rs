use serde::Serialize;

use crate::payroll_aggregator::{share_percent, DEDUCTION_CATEGORY_LABELS};
use crate::payroll_records::{
    BreakdownItem, CategoryAmount, CompositionRecord, CustomFieldAmount, CustomFieldType,
    MonthlyRecord, SalaryRecord,
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CustomSums {
    pub cash: f64,
    pub non_cash: f64,
    pub deduction: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PayrollBreakdown {
    pub cash_income: f64,
    pub allowances_total: f64,
    pub bonuses_total: f64,
    pub insurance_total: f64,
    pub deductions_total: f64,
    pub benefits_total: f64,
    pub tax: f64,
    pub actual_take_home: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeComposition {
    #[serde(flatten)]
    pub record: CompositionRecord,
    pub other_income_base: f64,
    pub custom_income_items: Vec<BreakdownItem>,
    pub total_income: f64,
    pub allowances: f64,
    pub base_salary_percent: f64,
    pub performance_percent: f64,
    pub allowances_percent: f64,
    pub benefits_percent: f64,
    pub other_percent: f64,
}

// Meal allowance counts toward cash income but not the reported allowances line.
pub fn allowances_for_net(r: &SalaryRecord) -> f64 {
    r.high_temp_allowance
        + r.low_temp_allowance
        + r.computer_allowance
        + r.communication_allowance
        + r.comprehensive_allowance
}

pub fn allowances_full(r: &SalaryRecord) -> f64 {
    allowances_for_net(r) + r.meal_allowance
}

pub fn festival_benefits(r: &SalaryRecord) -> f64 {
    r.mid_autumn_benefit + r.dragon_boat_benefit + r.spring_festival_benefit
}

pub fn insurance_sum(r: &SalaryRecord) -> f64 {
    r.pension_insurance
        + r.medical_insurance
        + r.unemployment_insurance
        + r.critical_illness_insurance
        + r.enterprise_annuity
        + r.housing_fund
}

pub fn deductions_sum(r: &SalaryRecord) -> f64 {
    insurance_sum(r) + r.other_deductions + r.labor_union_fee + r.performance_deduction
}

pub fn custom_sums(items: &[CustomFieldAmount]) -> CustomSums {
    let mut sums = CustomSums::default();
    for cf in items {
        match cf.kind() {
            CustomFieldType::Income if cf.is_non_cash => sums.non_cash += cf.amount,
            CustomFieldType::Income => sums.cash += cf.amount,
            CustomFieldType::Deduction => sums.deduction += cf.amount,
            CustomFieldType::Other => {}
        }
    }
    sums
}

pub fn compute_payroll(r: &SalaryRecord) -> PayrollBreakdown {
    let custom = custom_sums(&r.custom_fields);
    let cash_income = r.base_salary
        + r.performance_salary
        + allowances_full(r)
        + r.other_income
        + custom.cash;
    let deductions_total = deductions_sum(r) + custom.deduction;
    PayrollBreakdown {
        cash_income,
        allowances_total: allowances_for_net(r),
        bonuses_total: festival_benefits(r) + r.other_income,
        insurance_total: insurance_sum(r),
        deductions_total,
        benefits_total: festival_benefits(r) + custom.non_cash,
        tax: r.tax,
        actual_take_home: cash_income - deductions_total - r.tax,
    }
}

pub fn monthly_record(r: &SalaryRecord) -> MonthlyRecord {
    let calc = compute_payroll(r);
    MonthlyRecord {
        person_id: r.person_id,
        year: r.year,
        month: r.month,
        gross_income: calc.cash_income,
        net_income: calc.actual_take_home,
        actual_take_home: calc.actual_take_home,
        tax: calc.tax,
        insurance_total: calc.insurance_total,
        allowances_total: calc.allowances_total,
        non_cash_benefits: calc.benefits_total,
    }
}

fn custom_item(cf: &CustomFieldAmount, fallback_label: &str) -> BreakdownItem {
    let label = [cf.label.as_str(), cf.field_key.as_str()]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or(fallback_label);
    BreakdownItem {
        key: cf.field_key.clone(),
        label: label.to_string(),
        amount: cf.amount,
    }
}

pub fn income_composition(r: &SalaryRecord) -> IncomeComposition {
    let mut custom_cash = 0.0;
    let mut custom_non_cash = 0.0;
    let mut custom_income_items = Vec::new();
    let mut custom_non_cash_items = Vec::new();
    for cf in r
        .custom_fields
        .iter()
        .filter(|cf| cf.kind() == CustomFieldType::Income)
    {
        if cf.is_non_cash {
            custom_non_cash += cf.amount;
            if cf.amount != 0.0 {
                custom_non_cash_items.push(custom_item(cf, "自定义福利"));
            }
        } else {
            custom_cash += cf.amount;
            if cf.amount != 0.0 {
                custom_income_items.push(custom_item(cf, "自定义收入"));
            }
        }
    }

    let allowances = allowances_full(r);
    let benefits = festival_benefits(r) + custom_non_cash;
    let other_income = r.other_income + custom_cash;
    let total_income = r.base_salary + r.performance_salary + allowances + benefits + other_income;

    IncomeComposition {
        record: CompositionRecord {
            person_id: r.person_id,
            year: r.year,
            month: r.month,
            base_salary: r.base_salary,
            performance_salary: r.performance_salary,
            high_temp_allowance: r.high_temp_allowance,
            low_temp_allowance: r.low_temp_allowance,
            meal_allowance: r.meal_allowance,
            computer_allowance: r.computer_allowance,
            communication_allowance: r.communication_allowance,
            comprehensive_allowance: r.comprehensive_allowance,
            non_cash_benefits: benefits,
            other_income,
            mid_autumn_benefit: r.mid_autumn_benefit,
            dragon_boat_benefit: r.dragon_boat_benefit,
            spring_festival_benefit: r.spring_festival_benefit,
            custom_non_cash_items,
        },
        other_income_base: r.other_income,
        custom_income_items,
        total_income,
        allowances,
        base_salary_percent: share_percent(r.base_salary, total_income),
        performance_percent: share_percent(r.performance_salary, total_income),
        allowances_percent: share_percent(allowances, total_income),
        benefits_percent: share_percent(benefits, total_income),
        other_percent: share_percent(other_income, total_income),
    }
}

/// One `{category, amount}` row per deduction column. Custom deductions are
/// folded into `other_deductions`.
pub fn deduction_category_items(r: &SalaryRecord) -> Vec<CategoryAmount> {
    let custom = custom_sums(&r.custom_fields);
    DEDUCTION_CATEGORY_LABELS
        .iter()
        .map(|(key, _)| {
            let mut amount = r.deduction_amount(key);
            if *key == "other_deductions" {
                amount += custom.deduction;
            }
            CategoryAmount::new(*key, amount)
        })
        .collect()
}

/// Income columns as category rows. Custom income, cash or not, lands in
/// `other_income`.
pub fn income_category_items(r: &SalaryRecord) -> Vec<CategoryAmount> {
    let custom = custom_sums(&r.custom_fields);
    vec![
        CategoryAmount::new("base_salary", r.base_salary),
        CategoryAmount::new("performance_salary", r.performance_salary),
        CategoryAmount::new("high_temp_allowance", r.high_temp_allowance),
        CategoryAmount::new("low_temp_allowance", r.low_temp_allowance),
        CategoryAmount::new("meal_allowance", r.meal_allowance),
        CategoryAmount::new("computer_allowance", r.computer_allowance),
        CategoryAmount::new("communication_allowance", r.communication_allowance),
        CategoryAmount::new("comprehensive_allowance", r.comprehensive_allowance),
        CategoryAmount::new("mid_autumn_benefit", r.mid_autumn_benefit),
        CategoryAmount::new("dragon_boat_benefit", r.dragon_boat_benefit),
        CategoryAmount::new("spring_festival_benefit", r.spring_festival_benefit),
        CategoryAmount::new("other_income", r.other_income + custom.cash + custom.non_cash),
    ]
}
