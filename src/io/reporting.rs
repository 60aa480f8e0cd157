// src/io/reporting.rs

use crate::error::ReportError;
use crate::simulation::engine::PeriodRecord;

/// Renders period records as CSV text for human inspection.
///
/// Nothing is written to disk; callers decide where the text goes.
pub fn render_csv(records: &[PeriodRecord]) -> Result<String, ReportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());

    for record in records {
        wtr.serialize(record)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ReportError::Flush(e.error().to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

/// One line per node for a single period, e.g. for `info!` output.
pub fn period_summary(records: &[PeriodRecord], period: u32) -> String {
    records
        .iter()
        .filter(|r| r.period == period)
        .map(|r| {
            format!(
                "{}: demand {} fulfilled {} ordered {} inv {} backlog {}",
                r.name, r.demand, r.fulfilled, r.ordered, r.inventory, r.backorders
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}
