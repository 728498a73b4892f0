use chrono::SecondsFormat;
use itertools::Itertools;

use crate::domain::{DailyRecord, Sector};

pub const CSV_HEADER: &str =
    "ts,release_value,storage_projection,risk_index,drinking,environment,industry,agriculture";

/// Render records as CSV: one header row, then one row per record in the
/// order given. Rows are joined by `\n` without a trailing newline.
pub fn render_csv(records: &[DailyRecord]) -> String {
    std::iter::once(CSV_HEADER.to_string())
        .chain(records.iter().map(csv_row))
        .join("\n")
}

fn csv_row(record: &DailyRecord) -> String {
    let allocation = |sector: Sector| {
        record
            .sector_allocations
            .get(&sector)
            .copied()
            .unwrap_or(0.0)
    };

    [
        record.ts.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        format!("{:.3}", record.release_value),
        format!("{:.3}", record.storage_projection),
        format!("{:.3}", record.risk_index),
    ]
    .into_iter()
    .chain(Sector::ALL.iter().map(|s| format!("{:.3}", allocation(*s))))
    .join(",")
}
