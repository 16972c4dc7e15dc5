use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::month_range::StatsFilter;
use crate::payroll_records::PayrollDataset;
use crate::stats_queries::{
    build_dashboard_snapshot, dashboard_snapshot_to_json, DashboardSnapshot,
};

/// Handle for one dataset load. Only the most recently issued ticket may
/// publish its result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub filter: StatsFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Reused,
    Failed,
    Stale,
}

#[derive(Debug, Default)]
pub struct DashboardState {
    issued: u64,
    settled: u64,
    dataset: Option<Arc<PayrollDataset>>,
    filter: StatsFilter,
    snapshot: Option<DashboardSnapshot>,
    loaded_at: Option<String>,
    last_error: Option<String>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_load(&mut self, filter: StatsFilter) -> LoadTicket {
        self.issued += 1;
        log::debug!("dashboard load #{} started", self.issued);
        LoadTicket {
            generation: self.issued,
            filter,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.settled < self.issued
    }

    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Arc<PayrollDataset>, String>,
    ) -> LoadOutcome {
        if ticket.generation != self.issued {
            log::debug!(
                "dashboard load #{} superseded by #{}",
                ticket.generation,
                self.issued
            );
            return LoadOutcome::Stale;
        }
        self.settled = ticket.generation;

        let dataset = match result {
            Ok(dataset) => dataset,
            Err(err) => {
                log::warn!("dashboard load #{} failed: {err}", ticket.generation);
                self.last_error = Some(err);
                return LoadOutcome::Failed;
            }
        };
        self.last_error = None;

        let same_dataset = self
            .dataset
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &dataset));
        if same_dataset && self.filter == ticket.filter && self.snapshot.is_some() {
            return LoadOutcome::Reused;
        }

        let snapshot = build_dashboard_snapshot(&dataset, &ticket.filter);
        log::info!(
            "dashboard load #{} applied: {} records",
            ticket.generation,
            snapshot.record_count
        );
        self.snapshot = Some(snapshot);
        self.dataset = Some(dataset);
        self.filter = ticket.filter;
        self.loaded_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        LoadOutcome::Applied
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn status_json(&self) -> Result<Value, String> {
        let snapshot = match &self.snapshot {
            Some(s) => dashboard_snapshot_to_json(s)?,
            None => Value::Null,
        };
        Ok(json!({
            "generation": self.issued,
            "loading": self.is_loading(),
            "loaded_at": self.loaded_at,
            "last_error": self.last_error,
            "snapshot": snapshot,
        }))
    }
}
