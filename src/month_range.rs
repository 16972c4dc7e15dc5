use regex::Regex;
use std::sync::OnceLock;

use crate::payroll_records::SalaryRecord;

const RANGE_SEPARATORS: [&str; 4] = ["..", ":", ",", "_"];
const OPEN_START: (i32, u32) = (0, 1);
const OPEN_END: (i32, u32) = (9999, 12);

fn year_only_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})$").expect("year regex"))
}

fn year_month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,4})-(\d{1,2})$").expect("year-month regex"))
}

pub fn ym_num(year: i32, month: u32) -> i32 {
    year.saturating_mul(100).saturating_add(month as i32)
}

/// Inclusive `yyyymm` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthRange {
    pub start: i32,
    pub end: i32,
}

impl MonthRange {
    pub const UNBOUNDED: MonthRange = MonthRange {
        start: 0,
        end: 999_999,
    };

    pub fn contains(&self, period_num: i32) -> bool {
        self.start <= period_num && period_num <= self.end
    }
}

fn parse_side(part: &str, is_start: bool) -> (i32, u32) {
    let text = part.trim();
    let open = if is_start { OPEN_START } else { OPEN_END };
    if text.is_empty() {
        return open;
    }
    if let Some(caps) = year_only_re().captures(text) {
        if let Ok(year) = caps[1].parse::<i32>() {
            return if is_start { (year, 1) } else { (year, 12) };
        }
    }
    if let Some(caps) = year_month_re().captures(text) {
        if let (Ok(year), Ok(month)) = (caps[1].parse::<i32>(), caps[2].parse::<u32>()) {
            return (year, month);
        }
    }
    log::debug!("unparsable range bound treated as open: {text}");
    open
}

/// Accepts `2024`, `2024-03` and two bounds joined by `..`, `:`, `,` or `_`.
/// A single year covers the whole year, a single month covers just that
/// month, and a blank or unparsable bound stays open.
pub fn parse_month_range(raw: &str) -> MonthRange {
    let text = raw.trim();
    if text.is_empty() {
        return MonthRange::UNBOUNDED;
    }

    let split = RANGE_SEPARATORS
        .iter()
        .find_map(|sep| text.split_once(*sep));
    match split {
        Some((left, right)) => {
            let (y1, m1) = parse_side(left, true);
            let (y2, m2) = parse_side(right, false);
            MonthRange {
                start: ym_num(y1, m1),
                end: ym_num(y2, m2),
            }
        }
        None => {
            let (y1, m1) = parse_side(text, true);
            let (y2, m2) = if year_only_re().is_match(text) {
                parse_side(text, false)
            } else {
                (y1, m1)
            };
            MonthRange {
                start: ym_num(y1, m1),
                end: ym_num(y2, m2),
            }
        }
    }
}

/// Query filter; every part is optional and absence means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsFilter {
    pub person_id: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub range: Option<MonthRange>,
}

impl StatsFilter {
    pub fn matches(&self, r: &SalaryRecord) -> bool {
        if self.person_id.is_some() && r.person_id != self.person_id {
            return false;
        }
        if self.year.is_some() && r.year != self.year {
            return false;
        }
        if self.month.is_some() && r.month != self.month {
            return false;
        }
        match self.range {
            Some(range) => r.period_num().is_some_and(|ym| range.contains(ym)),
            None => true,
        }
    }

    pub fn apply<'a>(&self, records: &'a [SalaryRecord]) -> Vec<&'a SalaryRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}
