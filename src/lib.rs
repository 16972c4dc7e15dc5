pub mod dashboard_state;
pub mod dataset_loader;
pub mod month_range;
pub mod payroll_aggregator;
pub mod payroll_calc;
pub mod payroll_records;
pub mod salary_csv_import;
pub mod stats_queries;

pub use dashboard_state::{DashboardState, LoadOutcome, LoadTicket};
pub use dataset_loader::{dataset_from_value, load_dataset_from_path};
pub use month_range::{parse_month_range, MonthRange, StatsFilter};
pub use payroll_aggregator::{
    aggregate_totals, best_month, categorize, format_percent, merge_series_by_month,
    month_over_month_delta, order_series, ratio, top_contributors, worst_month, Ratio, Totals,
};
pub use payroll_records::{MonthlyRecord, NetIncomePoint, PayrollDataset, SalaryRecord};
pub use salary_csv_import::{
    parse_salary_file, salary_csv_preview, SalaryCsvPreviewRequest, SalaryFieldSpec,
};
pub use stats_queries::{
    category_summary_query, contributions_cumulative_query, cumulative_insurance_query,
    dashboard_overview_query, deductions_breakdown_query, family_summary_query,
    income_composition_query, monthly_stats_query, yearly_stats_query,
    ContributionsCumulativeQueryRequest, FamilySummaryQueryRequest, StatsFilterRequest,
    YearlyStatsQueryRequest,
};
