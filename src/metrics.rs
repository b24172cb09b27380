use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::client::Table;

#[derive(Default, Clone, Debug)]
pub struct TableStats {
    /// Rows acknowledged by the store
    pub written: usize,
    /// Rows whose write request failed
    pub failed: usize,
    /// Rows never sent because a reference could not be resolved
    pub skipped: usize,
    latencies: Vec<Duration>,
}

/// Outcome of one seeding run.
#[derive(Clone, Debug)]
pub struct LoadReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    tables: BTreeMap<Table, TableStats>,
}

impl Default for LoadReport {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            tables: BTreeMap::new(),
        }
    }
}

impl LoadReport {
    /// One request that wrote `rows` rows.
    pub fn record_write(&mut self, table: Table, rows: usize, duration: Duration) {
        let stats = self.tables.entry(table).or_default();
        stats.written += rows;
        stats.latencies.push(duration);
    }

    pub fn record_failure(&mut self, table: Table, rows: usize) {
        self.tables.entry(table).or_default().failed += rows;
    }

    pub fn record_skip(&mut self, table: Table) {
        self.tables.entry(table).or_default().skipped += 1;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn stats(&self, table: Table) -> TableStats {
        self.tables.get(&table).cloned().unwrap_or_default()
    }

    pub fn total_failed(&self) -> usize {
        self.tables.values().map(|s| s.failed).sum()
    }

    /// (min, max, median, p95) of the request latencies.
    fn calculate_stats(latencies: &[Duration]) -> (String, String, String, String) {
        if latencies.is_empty() {
            let na = || "N/A".to_string();
            return (na(), na(), na(), na());
        }

        let mut sorted: Vec<_> = latencies.to_vec();
        sorted.sort_unstable();

        let count = sorted.len();
        let p50_idx = (count - 1) * 50 / 100;
        let p95_idx = (count - 1) * 95 / 100;

        (
            readable(sorted[0]),
            readable(sorted[count - 1]),
            readable(sorted[p50_idx]),
            readable(sorted[p95_idx]),
        )
    }
}

const UNITS: [(u128, &str); 3] = [(1_000_000_000, "s"), (1_000_000, "ms"), (1_000, "µs")];

/// A latency in the largest unit it reaches; anything under a microsecond
/// stays in whole nanoseconds.
fn readable(latency: Duration) -> String {
    let nanos = latency.as_nanos();
    match UNITS.iter().find(|(scale, _)| nanos >= *scale) {
        Some((scale, unit)) => format!("{:.2} {unit}", nanos as f64 / *scale as f64),
        None => format!("{nanos} ns"),
    }
}

impl Display for LoadReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nSeeding Summary:")?;
        writeln!(
            f,
            "{:<18} {:<9} {:<9} {:<9} {:<12} {:<12} {:<12} {:<12}",
            "Table", "Written", "Failed", "Skipped", "Min", "Max", "Median", "P95"
        )?;
        writeln!(f, "{:-<99}", "")?;

        for (table, stats) in &self.tables {
            let (min, max, p50, p95) = Self::calculate_stats(&stats.latencies);
            writeln!(
                f,
                "{:<18} {:<9} {:<9} {:<9} {:<12} {:<12} {:<12} {:<12}",
                table.as_str(),
                stats.written,
                stats.failed,
                stats.skipped,
                min,
                max,
                p50,
                p95
            )?;
        }

        if let Some(finished) = self.finished_at {
            let elapsed = (finished - self.started_at).num_milliseconds() as f64 / 1_000.0;
            writeln!(
                f,
                "\nStarted {}, finished in {:.2} s",
                self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
                elapsed
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_table() {
        let mut report = LoadReport::default();
        report.record_write(Table::Materials, 100, Duration::from_millis(40));
        report.record_write(Table::Materials, 12, Duration::from_millis(10));
        report.record_failure(Table::Materials, 100);
        report.record_skip(Table::FlySpecies);

        let materials = report.stats(Table::Materials);
        assert_eq!(materials.written, 112);
        assert_eq!(materials.failed, 100);
        assert_eq!(report.stats(Table::FlySpecies).skipped, 1);
        assert_eq!(report.stats(Table::Flies).written, 0);
        assert_eq!(report.total_failed(), 100);
    }

    #[test]
    fn summary_lists_tables_in_dependency_order() {
        let mut report = LoadReport::default();
        report.record_write(Table::Tutorials, 1, Duration::from_micros(5));
        report.record_write(Table::MaterialTypes, 21, Duration::from_micros(900));
        report.finish();

        let rendered = report.to_string();
        let types = rendered.find("material_types").unwrap();
        let tutorials = rendered.find("tutorials").unwrap();
        assert!(types < tutorials);
        assert!(rendered.contains("finished in"));
    }

    #[test]
    fn failure_only_tables_render_without_latencies() {
        let mut report = LoadReport::default();
        report.record_failure(Table::HookEquivalents, 1);
        assert!(report.to_string().contains("N/A"));
    }

    #[test]
    fn durations_pick_a_readable_unit() {
        assert_eq!(readable(Duration::from_nanos(512)), "512 ns");
        assert_eq!(readable(Duration::from_nanos(1_500)), "1.50 µs");
        assert_eq!(readable(Duration::from_micros(2_500)), "2.50 ms");
        assert_eq!(readable(Duration::from_secs(3)), "3.00 s");
    }
}
