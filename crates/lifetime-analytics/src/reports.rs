//! CSV and text report generation.

use lifetime_core::error::Result;
use lifetime_core::CommitRecord;
use std::io::Write;
use std::path::Path;

use crate::aggregations::SummaryRow;

/// Column order of the per-commit CSV.
pub const CSV_HEADERS: [&str; 8] = [
    "Group",
    "Project",
    "Commit_ID",
    "Committed_date",
    "Created_at",
    "lifetime_hours",
    "Target_Branch",
    "Source_Branch",
];

/// Report generator for the commit CSV and the operator summary.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Write one CSV row per ingested commit to `path`. Returns the row count.
    pub fn write_csv(path: &Path, records: &[CommitRecord]) -> Result<usize> {
        let file = std::fs::File::create(path)?;
        let count = Self::write_csv_to(file, records)?;
        tracing::info!("Wrote {} commit rows to {}", count, path.display());
        Ok(count)
    }

    /// Write the CSV to any writer. The header row is always written.
    pub fn write_csv_to<W: Write>(writer: W, records: &[CommitRecord]) -> Result<usize> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        wtr.write_record(CSV_HEADERS)?;
        for record in records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;

        Ok(records.len())
    }

    /// Human-readable summary: a total line per period followed by indented
    /// group lines.
    pub fn text_summary(rows: &[SummaryRow]) -> String {
        let mut output = String::new();

        if rows.is_empty() {
            output.push_str("No merged commits in the report window.\n");
            return output;
        }

        for row in rows {
            if row.is_total() {
                output.push_str(&format!(
                    "{}\nTotal Median: {:.2} Average: {:.2} Commits: {}\n",
                    row.day, row.median_lifetime, row.mean_lifetime, row.samples
                ));
            } else {
                let mode = row
                    .mode_lifetime
                    .map(|m| format!("{:.2}", m))
                    .unwrap_or_else(|| "-".to_string());
                output.push_str(&format!(
                    "    {} Median: {:.2} Mode: {} Average: {:.2}\n",
                    row.group, row.median_lifetime, mode, row.mean_lifetime
                ));
            }
        }

        output
    }
}
