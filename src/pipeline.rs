//! Pipeline orchestration
//!
//! This module provides the public API for Logbook Metrics.
//! It orchestrates loading logbook rows, classifying habits, and computing the
//! streak and balance figures the dashboard renders.

use crate::config::TrackerConfig;
use crate::error::ComputeError;
use crate::logbook::{Logbook, LogbookLoader};
use crate::streak::StreakEngine;
use crate::types::{ActivitySummary, BalanceSummary, DashboardReport, HabitState, HabitStreaks, LogbookRow};
use crate::window::{
    activity_totals, average_daily_total, balance_trend, filter_date_range, top_activity, top_days,
    total_hours, total_time_trend, weekday_averages, weekly_activity, weekly_balance, WEEK_DAYS,
};
use crate::{PRODUCER_NAME, VERSION};
use chrono::NaiveDate;
use log::debug;

/// Days listed in the report's top-days ranking
pub const TOP_DAYS: usize = 5;

/// Input encoding of logbook rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    /// JSON array of row objects
    Json,
    /// One row object per line
    Ndjson,
    /// Comma-separated values with a header row
    Csv,
}

/// Convert a JSON array of logbook rows into a dashboard report JSON string,
/// using the default tracker configuration.
///
/// # Arguments
/// * `rows_json` - JSON array of row objects keyed by column name
/// * `today` - The day the dashboard is rendered for
///
/// # Example
/// ```ignore
/// let report_json = logbook_to_dashboard(rows_json, today)?;
/// ```
pub fn logbook_to_dashboard(rows_json: String, today: NaiveDate) -> Result<String, ComputeError> {
    DashboardProcessor::default().process_str(&rows_json, RowFormat::Json, today)
}

/// Processor bound to one tracker configuration.
///
/// Holds no state between calls; every report is computed from its input alone.
pub struct DashboardProcessor {
    config: TrackerConfig,
}

impl Default for DashboardProcessor {
    fn default() -> Self {
        Self {
            config: TrackerConfig::default(),
        }
    }
}

impl DashboardProcessor {
    /// Create a processor with a validated configuration
    pub fn new(config: TrackerConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Parse rows and prepare a logbook as of `today`
    pub fn load(&self, input: &str, format: RowFormat, today: NaiveDate) -> Result<Logbook, ComputeError> {
        let loader = LogbookLoader::new(&self.config);
        let rows = match format {
            RowFormat::Json => loader.parse_array(input)?,
            RowFormat::Ndjson => loader.parse_ndjson(input)?,
            RowFormat::Csv => loader.parse_csv(input.as_bytes())?,
        };
        debug!("parsed {} logbook rows", rows.len());
        loader.check_columns(&rows)?;
        loader.prepare(rows, today)
    }

    /// Streak cards for every active habit
    pub fn streaks(&self, logbook: &Logbook) -> Result<Vec<HabitStreaks>, ComputeError> {
        self.config
            .active_habits()
            .map(|habit| {
                let series = logbook.habit_series(habit)?;
                let summary = StreakEngine::summarize(&series);
                debug!(
                    "{}: current {} longest {}",
                    habit.name, summary.current, summary.longest
                );

                Ok(HabitStreaks {
                    name: habit.name.clone(),
                    kind: habit.kind.as_str().to_string(),
                    emoji: habit.emoji.clone(),
                    current_streak: summary.current,
                    longest_streak: summary.longest,
                    record_breaking: summary.record_breaking,
                    observed_days: series.iter().filter(|s| **s != HabitState::Absent).count(),
                })
            })
            .collect()
    }

    /// Balance trend, weekly comparison, and current-week distribution
    pub fn balance(&self, logbook: &Logbook, today: NaiveDate) -> Result<BalanceSummary, ComputeError> {
        let activities = &self.config.activities;

        let trend = balance_trend(
            logbook,
            activities,
            today,
            self.config.trend_days,
            self.config.moving_average_window,
        )?;
        let weekly = weekly_balance(logbook, activities, today)?;

        let week_rows: &[LogbookRow] = filter_date_range(logbook.rows(), today, WEEK_DAYS, 0)?;
        let current_week_distribution = activity_totals(week_rows, activities)?;

        Ok(BalanceSummary {
            activities: activities.clone(),
            trend,
            weekly,
            current_week_distribution,
        })
    }

    /// Time analytics over the trend window, plus the week-over-week comparison
    pub fn activity(&self, logbook: &Logbook, today: NaiveDate) -> Result<ActivitySummary, ComputeError> {
        let activities = &self.config.activities;
        let rows = filter_date_range(logbook.rows(), today, self.config.trend_days, 0)?;

        Ok(ActivitySummary {
            average_daily_total: average_daily_total(rows, activities)?,
            total_hours: total_hours(rows, activities)?,
            top_days: top_days(rows, activities, TOP_DAYS)?,
            top_activity: top_activity(rows, activities)?,
            by_weekday: weekday_averages(rows, activities)?,
            weekly: weekly_activity(logbook, activities, today)?,
            trend: total_time_trend(
                logbook,
                activities,
                today,
                self.config.trend_days,
                self.config.moving_average_window,
            )?,
        })
    }

    /// Full dashboard report for a prepared logbook
    pub fn report(&self, logbook: &Logbook, today: NaiveDate) -> Result<DashboardReport, ComputeError> {
        Ok(DashboardReport {
            producer: PRODUCER_NAME.to_string(),
            version: VERSION.to_string(),
            today,
            first_date: logbook.first_date(),
            last_date: logbook.last_date(),
            days_logged: logbook.len(),
            habits: self.streaks(logbook)?,
            balance: self.balance(logbook, today)?,
            activity: self.activity(logbook, today)?,
        })
    }

    /// Parse, compute, and encode a report as JSON
    pub fn process_str(
        &self,
        input: &str,
        format: RowFormat,
        today: NaiveDate,
    ) -> Result<String, ComputeError> {
        let logbook = self.load(input, format, today)?;
        let report = self.report(&logbook, today)?;
        Ok(serde_json::to_string(&report)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BalanceScore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn week_json() -> String {
        // Anki: C, C, absent, C, N, C, C (last = today)
        r#"[
            { "Data": "09.01.2025", "Anki": 1, "YNAB": null, "Pamiętnik": null, "Gitara": 30, "Inne": 30, "Tech + Praca": 30, "YouTube": 30, "Czytanie": 30 },
            { "Data": "10.01.2025", "Anki": 1, "Gitara": 25, "Inne": 60 },
            { "Data": "11.01.2025", "Anki": "NA", "Gitara": "" },
            { "Data": "12.01.2025", "Anki": 1, "Gitara": 5 },
            { "Data": "13.01.2025", "Anki": 0, "Gitara": 40 },
            { "Data": "14.01.2025", "Anki": 1, "Gitara": 20 },
            { "Data": "15.01.2025", "Anki": 1, "Gitara": 0 }
        ]"#
        .to_string()
    }

    #[test]
    fn test_streaks_from_logbook() {
        let processor = DashboardProcessor::default();
        let logbook = processor
            .load(&week_json(), RowFormat::Json, date(2025, 1, 15))
            .unwrap();
        let streaks = processor.streaks(&logbook).unwrap();

        let anki = streaks.iter().find(|s| s.name == "Anki").unwrap();
        assert_eq!(anki.current_streak, 2);
        assert_eq!(anki.longest_streak, 3);
        assert_eq!(anki.observed_days, 6);
        assert!(!anki.record_breaking);

        // Gitara: C, C, absent, N, C, C, N(today, skipped)
        let gitara = streaks.iter().find(|s| s.name == "Gitara").unwrap();
        assert_eq!(gitara.kind, "duration");
        assert_eq!(gitara.current_streak, 2);
        assert_eq!(gitara.longest_streak, 2);
        assert!(gitara.record_breaking);

        let ynab = streaks.iter().find(|s| s.name == "YNAB").unwrap();
        assert_eq!(ynab.current_streak, 0);
        assert_eq!(ynab.observed_days, 0);
    }

    #[test]
    fn test_report_balance_section() {
        let processor = DashboardProcessor::default();
        let logbook = processor
            .load(&week_json(), RowFormat::Json, date(2025, 1, 15))
            .unwrap();
        let report = processor.report(&logbook, date(2025, 1, 15)).unwrap();

        assert_eq!(report.days_logged, 7);
        assert_eq!(report.first_date, Some(date(2025, 1, 9)));
        assert_eq!(report.balance.trend.len(), 7);

        // Every activity logged equally on the first day
        assert_eq!(report.balance.trend[0].score, BalanceScore::Score(100.0));
        // Nothing but blanks on the 11th
        assert_eq!(report.balance.trend[2].score, BalanceScore::NoData);

        assert_eq!(report.balance.current_week_distribution.get("Inne"), Some(&90.0));
        assert_eq!(report.balance.current_week_distribution.get("Gitara"), Some(&120.0));
    }

    #[test]
    fn test_future_rows_ignored() {
        let processor = DashboardProcessor::default();
        let logbook = processor
            .load(&week_json(), RowFormat::Json, date(2025, 1, 13))
            .unwrap();
        assert_eq!(logbook.len(), 5);

        // Anki ends with today's 0, which is skipped; then C, absent, C, C
        let streaks = processor.streaks(&logbook).unwrap();
        let anki = streaks.iter().find(|s| s.name == "Anki").unwrap();
        assert_eq!(anki.current_streak, 3);
    }

    #[test]
    fn test_csv_input() {
        let processor = DashboardProcessor::default();
        let csv = "Data,Anki,Pamiętnik,YNAB,YouTube,Gitara,Czytanie,Inne,Tech + Praca\n\
                   14.01.2025,1,,,,45,,,\n\
                   15.01.2025,1,,,,NA,,,\n";
        let logbook = processor
            .load(csv, RowFormat::Csv, date(2025, 1, 15))
            .unwrap();
        let streaks = processor.streaks(&logbook).unwrap();

        let gitara = streaks.iter().find(|s| s.name == "Gitara").unwrap();
        assert_eq!(gitara.current_streak, 1);
        let anki = streaks.iter().find(|s| s.name == "Anki").unwrap();
        assert_eq!(anki.current_streak, 2);
    }

    #[test]
    fn test_logbook_to_dashboard_json() {
        let json = logbook_to_dashboard(week_json(), date(2025, 1, 15)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["producer"], PRODUCER_NAME);
        assert_eq!(value["today"], "2025-01-15");
        assert!(value["balance"]["trend"][2]["score"].is_null());
        assert_eq!(value["habits"][0]["name"], "Anki");
    }

    #[test]
    fn test_out_of_domain_value_fails_loudly() {
        let json = r#"[{
            "Data": "15.01.2025", "Anki": 7, "Pamiętnik": null, "YNAB": null,
            "YouTube": null, "Gitara": null, "Czytanie": null, "Inne": null, "Tech + Praca": null
        }]"#
        .to_string();
        let result = logbook_to_dashboard(json, date(2025, 1, 15));
        assert!(matches!(result, Err(ComputeError::OutOfDomain(_))));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = TrackerConfig::default();
        config.activities.clear();
        assert!(DashboardProcessor::new(config).is_err());
    }

    #[test]
    fn test_misspelled_column_is_unknown_field() {
        let mut config = TrackerConfig::default();
        config.activities.push("Gitarra".to_string());
        let processor = DashboardProcessor::new(config).unwrap();

        let result = processor.load(&week_json(), RowFormat::Json, date(2025, 1, 15));
        assert!(
            matches!(&result, Err(ComputeError::UnknownField(name)) if name == "Gitarra"),
            "{:?}",
            result
        );
    }

    #[test]
    fn test_huge_trend_window_is_an_error() {
        let mut config = TrackerConfig::default();
        config.trend_days = 9_000_000_000_000;
        let processor = DashboardProcessor { config };

        let result = processor.process_str(&week_json(), RowFormat::Json, date(2025, 1, 15));
        assert!(matches!(result, Err(ComputeError::ConfigError(_))));
    }

    #[test]
    fn test_report_activity_section() {
        let processor = DashboardProcessor::default();
        let logbook = processor
            .load(&week_json(), RowFormat::Json, date(2025, 1, 15))
            .unwrap();
        let activity = processor.activity(&logbook, date(2025, 1, 15)).unwrap();

        // Totals: 150, 85, none, 5, 40, 20, 0 over six logged days
        assert_eq!(activity.total_hours, 5.0);
        assert_eq!(activity.average_daily_total, Some(50.0));
        assert_eq!(activity.top_days.len(), 5);
        assert_eq!(activity.top_days[0].date, date(2025, 1, 9));
        assert_eq!(activity.top_days[0].minutes, 150.0);

        let top = activity.top_activity.unwrap();
        assert_eq!(top.activity, "Inne");
        assert_eq!(top.average_minutes, 45.0);

        assert_eq!(activity.by_weekday.len(), 7);
        assert_eq!(activity.by_weekday[0].weekday, "Mon");
        assert_eq!(activity.trend.len(), 7);
        assert_eq!(activity.trend[2].total_minutes, None);
        assert_eq!(activity.weekly.previous.logged_days, 0);
    }
}
