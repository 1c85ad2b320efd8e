use crate::models::{DailyAggregate, Variable};
use crate::utils::constants::{
    MAX_VALID_PRESSURE, MAX_VALID_TEMP, MAX_WIND_DIRECTION, MIN_VALID_PRESSURE, MIN_VALID_TEMP,
    TEMP_JUMP_THRESHOLD,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct QualityReport {
    pub total_records: usize,
    pub clean_records: usize,
    pub violations: Vec<QualityViolation>,
    pub station_statistics: BTreeMap<String, StationStatistics>,
}

impl QualityReport {
    pub fn flagged_records(&self) -> usize {
        self.total_records - self.clean_records
    }
}

#[derive(Debug, Clone)]
pub struct QualityViolation {
    pub station: String,
    pub date: NaiveDate,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    /// Daily mean lies outside its own min/max
    MeanOutsideRange,
    OutOfRange,
    InvalidWindDirection,
    SuspiciousJump,
}

#[derive(Debug, Clone, Default)]
pub struct StationStatistics {
    pub days: usize,
    pub flagged_days: usize,
    pub min_temp: Option<i32>,
    pub max_temp: Option<i32>,
}

/// Plausibility checks over the daily table; reports, never rejects
pub struct QualityChecker {
    temperature_jump_threshold: f64,
}

impl QualityChecker {
    pub fn new() -> Self {
        Self {
            temperature_jump_threshold: TEMP_JUMP_THRESHOLD,
        }
    }

    pub fn with_jump_threshold(threshold: f64) -> Self {
        Self {
            temperature_jump_threshold: threshold,
        }
    }

    pub fn check(&self, daily: &[DailyAggregate]) -> QualityReport {
        let mut report = QualityReport {
            total_records: daily.len(),
            ..Default::default()
        };

        let mut by_station: BTreeMap<&str, Vec<&DailyAggregate>> = BTreeMap::new();
        for record in daily {
            by_station.entry(record.station.as_str()).or_default().push(record);

            let before = report.violations.len();
            self.check_record(record, &mut report);
            let flagged = report.violations.len() > before;
            if !flagged {
                report.clean_records += 1;
            }

            let stats = report
                .station_statistics
                .entry(record.station.clone())
                .or_default();
            stats.days += 1;
            if flagged {
                stats.flagged_days += 1;
            }
            if let Some(min) = record.temperature_min {
                stats.min_temp = Some(stats.min_temp.map_or(min, |t| t.min(min)));
            }
            if let Some(max) = record.temperature_max {
                stats.max_temp = Some(stats.max_temp.map_or(max, |t| t.max(max)));
            }
        }

        for (station, mut records) in by_station {
            records.sort_by_key(|r| r.date);
            self.check_temperature_jumps(station, &records, &mut report);
        }

        report
    }

    fn check_record(&self, record: &DailyAggregate, report: &mut QualityReport) {
        for variable in Variable::ALL {
            let stats = record.stats(variable);
            let (Some(mean), Some(min), Some(max)) = (stats.mean, stats.min, stats.max) else {
                continue;
            };

            // Means are rounded to 0.1 and extremes to integers
            let outside = mean < f64::from(min) - 0.5 || mean > f64::from(max) + 0.5;
            if outside && !variable.is_direction() {
                Self::push(
                    report,
                    record,
                    ViolationType::MeanOutsideRange,
                    format!("{} mean {} outside [{}, {}]", variable, mean, min, max),
                );
            }
        }

        let ranges = [
            (record.temperature_min, "min temperature", MIN_VALID_TEMP, MAX_VALID_TEMP),
            (record.temperature_max, "max temperature", MIN_VALID_TEMP, MAX_VALID_TEMP),
            (record.pressure_min, "min pressure", MIN_VALID_PRESSURE, MAX_VALID_PRESSURE),
            (record.pressure_max, "max pressure", MIN_VALID_PRESSURE, MAX_VALID_PRESSURE),
            (record.humidity_min, "min humidity", 0.0, 100.0),
            (record.humidity_max, "max humidity", 0.0, 100.0),
        ];

        for (value, name, lo, hi) in ranges {
            if let Some(v) = value {
                if !(lo..=hi).contains(&f64::from(v)) {
                    Self::push(
                        report,
                        record,
                        ViolationType::OutOfRange,
                        format!("{} {} is outside valid range [{}, {}]", name, v, lo, hi),
                    );
                }
            }
        }

        if let Some(max_dir) = record.wind_dir_max {
            if f64::from(max_dir) > MAX_WIND_DIRECTION {
                Self::push(
                    report,
                    record,
                    ViolationType::InvalidWindDirection,
                    format!("wind direction {} exceeds {}", max_dir, MAX_WIND_DIRECTION),
                );
            }
        }
    }

    fn check_temperature_jumps(
        &self,
        station: &str,
        records: &[&DailyAggregate],
        report: &mut QualityReport,
    ) {
        for window in records.windows(2) {
            let (prev, curr) = (window[0], window[1]);
            let (Some(a), Some(b)) = (prev.temperature_mean, curr.temperature_mean) else {
                continue;
            };

            let jump = (b - a).abs();
            if jump > self.temperature_jump_threshold {
                report.violations.push(QualityViolation {
                    station: station.to_string(),
                    date: curr.date,
                    violation_type: ViolationType::SuspiciousJump,
                    details: format!(
                        "mean temperature jumped {:.1}°C from {} to {}",
                        jump, prev.date, curr.date
                    ),
                });
            }
        }
    }

    fn push(
        report: &mut QualityReport,
        record: &DailyAggregate,
        violation_type: ViolationType,
        details: String,
    ) {
        report.violations.push(QualityViolation {
            station: record.station.clone(),
            date: record.date,
            violation_type,
            details,
        });
    }

    pub fn generate_summary(&self, report: &QualityReport) -> String {
        let mut summary = String::new();
        let total = report.total_records.max(1) as f64;

        summary.push_str("=== Daily Quality Report ===\n");
        summary.push_str(&format!("Station-days: {}\n", report.total_records));
        summary.push_str(&format!(
            "Clean: {} ({:.1}%)\n",
            report.clean_records,
            100.0 * report.clean_records as f64 / total
        ));
        summary.push_str(&format!(
            "Flagged: {} ({:.1}%)\n",
            report.flagged_records(),
            100.0 * report.flagged_records() as f64 / total
        ));

        summary.push_str(&format!("\nViolations: {}\n", report.violations.len()));
        if !report.violations.is_empty() {
            summary.push_str("\nFirst 10 violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {} on {}: {}\n",
                    i + 1,
                    violation.station,
                    violation.date,
                    violation.details
                ));
            }
        }

        if !report.station_statistics.is_empty() {
            summary.push_str("\nPer station:\n");
            for (station, stats) in &report.station_statistics {
                summary.push_str(&format!(
                    "  {}: {} days, {} flagged\n",
                    station, stats.days, stats.flagged_days
                ));
            }
        }

        summary
    }
}

impl Default for QualityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VariableStats;

    fn day(d: u32, temp_mean: f64) -> DailyAggregate {
        let mut record = DailyAggregate::new(
            "USHUAIA AERO".to_string(),
            NaiveDate::from_ymd_opt(2024, 7, d).unwrap(),
        );
        record.set_stats(
            Variable::Temperature,
            VariableStats {
                mean: Some(temp_mean),
                min: Some(temp_mean.floor() as i32 - 2),
                max: Some(temp_mean.ceil() as i32 + 2),
            },
        );
        record
    }

    #[test]
    fn test_clean_days_pass() {
        let report = QualityChecker::new().check(&[day(1, 2.0), day(2, 3.5)]);
        assert_eq!(report.total_records, 2);
        assert_eq!(report.clean_records, 2);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_detects_direction_and_jump() {
        let mut bad = day(2, 25.0);
        bad.wind_dir_max = Some(990);

        let checker = QualityChecker::new();
        let report = checker.check(&[day(1, 2.0), bad]);

        let kinds: Vec<ViolationType> = report.violations.iter().map(|v| v.violation_type).collect();
        assert!(kinds.contains(&ViolationType::InvalidWindDirection));
        assert!(kinds.contains(&ViolationType::SuspiciousJump));
        assert_eq!(report.station_statistics["USHUAIA AERO"].flagged_days, 1);

        let summary = checker.generate_summary(&report);
        assert!(summary.contains("Station-days: 2"));
        assert!(summary.contains("USHUAIA AERO"));
    }

    #[test]
    fn test_out_of_range_pressure() {
        let mut record = day(1, 5.0);
        record.pressure_min = Some(700);
        let report = QualityChecker::new().check(&[record]);
        assert_eq!(report.violations[0].violation_type, ViolationType::OutOfRange);
    }
}
