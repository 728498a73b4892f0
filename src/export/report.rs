use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use uuid::Uuid;

use crate::domain::{DailyRecord, OptimizationRun, Scenario};

/// Page separator in the rendered report.
pub const PAGE_BREAK: char = '\u{0C}';

/// Run details printed in the report header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub run_id: Uuid,
    pub scenario: Scenario,
    pub horizon_days: u32,
    pub overall_satisfaction: f64,
}

impl From<&OptimizationRun> for ReportMeta {
    fn from(run: &OptimizationRun) -> Self {
        Self {
            run_id: run.id,
            scenario: run.params.scenario,
            horizon_days: run.params.horizon_days,
            overall_satisfaction: run.summary.overall_satisfaction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLayout {
    pub rows_per_page: usize,
    /// Records past this count are left out of the report.
    pub max_rows: usize,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            rows_per_page: 28,
            max_rows: 28,
        }
    }
}

fn table_header(out: &mut String) {
    let _ = writeln!(out, "{:<12}{:>10}{:>10}{:>8}", "Date", "Release", "Storage", "Risk");
}

/// Render the plan as a paginated text report.
pub fn render_report(meta: &ReportMeta, records: &[DailyRecord], layout: &ReportLayout) -> Vec<u8> {
    let mut out = String::new();
    let _ = writeln!(out, "Reservoir Release Plan Report (Run: {})", meta.run_id);
    let _ = writeln!(
        out,
        "Scenario: {} | Horizon: {} days",
        meta.scenario, meta.horizon_days
    );
    let _ = writeln!(out, "Overall satisfaction: {}", meta.overall_satisfaction);
    out.push('\n');

    let rows_per_page = layout.rows_per_page.max(1);
    let shown = &records[..records.len().min(layout.max_rows)];

    table_header(&mut out);
    for (page, chunk) in shown.chunks(rows_per_page).enumerate() {
        if page > 0 {
            out.push(PAGE_BREAK);
            table_header(&mut out);
        }
        for record in chunk {
            let _ = writeln!(
                out,
                "{:<12}{:>10.1}{:>10.1}{:>8.2}",
                record.ts.format("%Y-%m-%d").to_string(),
                record.release_value,
                record.storage_projection,
                record.risk_index
            );
        }
    }

    out.into_bytes()
}
