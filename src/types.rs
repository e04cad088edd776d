//! Core types for Logbook Metrics
//!
//! This module defines the data structures that flow between the logbook provider,
//! the streak and balance computations, and the dashboard report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single logbook cell after NA normalization.
///
/// Every NA-like raw token (null, empty string, whitespace, "NA", ...) becomes
/// `Absent`, which is distinct from an explicit `Number(0.0)` or `Flag(false)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    Absent,
    Number(f64),
    Flag(bool),
    Text(String),
}

impl Cell {
    pub fn is_absent(&self) -> bool {
        matches!(self, Cell::Absent)
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Cell::Absent => "absent".to_string(),
            Cell::Number(n) => format!("number {}", n),
            Cell::Flag(b) => format!("flag {}", b),
            Cell::Text(s) => format!("text {:?}", s),
        }
    }
}

/// Tri-state completion value for one habit on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitState {
    /// Explicitly recorded as done
    Completed,
    /// Explicitly recorded as not done (zero/false)
    NotCompleted,
    /// Nothing recorded for that day
    Absent,
}

/// Ordered tri-state values for one habit, ascending by date (last = most recent)
pub type HabitSeries = Vec<HabitState>;

/// How a habit's raw value is turned into a [`HabitState`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HabitKind {
    /// 1/true is completed, 0/false is not completed
    Binary,
    /// Minute count, completed at or above the threshold
    Duration { threshold_minutes: f64 },
}

impl HabitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitKind::Binary => "binary",
            HabitKind::Duration { .. } => "duration",
        }
    }
}

/// One raw logbook row: a date plus its normalized cells keyed by column name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookRow {
    pub date: NaiveDate,
    pub cells: BTreeMap<String, Cell>,
}

impl LogbookRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            cells: BTreeMap::new(),
        }
    }

    /// Cell for a column; columns the row does not carry are absent
    pub fn cell(&self, column: &str) -> &Cell {
        self.cells.get(column).unwrap_or(&Cell::Absent)
    }
}

/// One calendar day's classified observations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    /// Minutes per activity; `None` means nothing was logged for it
    pub activity_minutes: BTreeMap<String, Option<f64>>,
    /// Tri-state completion per habit
    pub habit_completed: BTreeMap<String, HabitState>,
}

/// One named dimension of a balance vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceDimension {
    pub name: String,
    /// `None` when not observed, distinct from `Some(0.0)`
    pub minutes: Option<f64>,
}

/// Named minute values across a fixed set of activity categories
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceInput {
    pub dimensions: Vec<BalanceDimension>,
}

impl BalanceInput {
    /// Build an input from `(name, minutes)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
        S: Into<String>,
    {
        Self {
            dimensions: pairs
                .into_iter()
                .map(|(name, minutes)| BalanceDimension {
                    name: name.into(),
                    minutes,
                })
                .collect(),
        }
    }

    /// Build an unnamed input, useful when only the values matter
    pub fn from_values(values: &[Option<f64>]) -> Self {
        Self::from_pairs(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("dim_{}", i), *v)),
        )
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn all_absent(&self) -> bool {
        self.dimensions.iter().all(|d| d.minutes.is_none())
    }
}

/// Balance score for a day or period.
///
/// Serializes as a number, or `null` for `NoData`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BalanceScore {
    /// Score in [0, 100]
    Score(f64),
    /// Nothing was logged for any dimension
    NoData,
}

impl BalanceScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            BalanceScore::Score(s) => Some(*s),
            BalanceScore::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, BalanceScore::NoData)
    }
}

/// Streak figures for one habit series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakSummary {
    pub current: u32,
    pub longest: u32,
    /// Current streak has reached the longest one
    pub record_breaking: bool,
}

/// Streak card data for one configured habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStreaks {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub record_breaking: bool,
    /// Days in the series that carried any observation
    pub observed_days: usize,
}

/// One point of the daily balance trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceTrendPoint {
    pub date: NaiveDate,
    pub score: BalanceScore,
    /// Moving average over the preceding scored days
    pub moving_average: Option<f64>,
}

/// Week-over-week comparison of average daily balance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyBalance {
    pub current_week_average: f64,
    pub previous_week_average: f64,
    pub change: f64,
    pub current_week_scored_days: usize,
    pub previous_week_scored_days: usize,
}

/// Balance section of the dashboard report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSummary {
    pub activities: Vec<String>,
    pub trend: Vec<BalanceTrendPoint>,
    pub weekly: WeeklyBalance,
    /// Total minutes per activity over the current week
    pub current_week_distribution: BTreeMap<String, f64>,
}

/// Total logged minutes on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    /// Short weekday name, e.g. "Mon"
    pub weekday: String,
    pub minutes: f64,
}

/// Mean minutes per logged day for one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityAverage {
    pub activity: String,
    pub average_minutes: f64,
}

/// Mean minutes per activity on one weekday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayAverages {
    pub weekday: String,
    /// Rows that fell on this weekday
    pub days: usize,
    pub averages: BTreeMap<String, Option<f64>>,
}

/// Headline activity figures for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodActivity {
    pub average_daily_total: Option<f64>,
    pub best_day: Option<DayTotal>,
    pub total_hours: f64,
    pub logged_days: usize,
}

/// Current week vs previous week, changes in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyActivity {
    pub current: PeriodActivity,
    pub previous: PeriodActivity,
    pub average_daily_total_change: f64,
    pub best_day_change: f64,
    pub total_hours_change: f64,
}

/// One point of the daily total-time trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalTrendPoint {
    pub date: NaiveDate,
    /// `None` when nothing was logged that day
    pub total_minutes: Option<f64>,
    pub moving_average: Option<f64>,
}

/// Activity analytics section of the dashboard report, over the trend window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub average_daily_total: Option<f64>,
    pub total_hours: f64,
    pub top_days: Vec<DayTotal>,
    pub top_activity: Option<ActivityAverage>,
    pub by_weekday: Vec<WeekdayAverages>,
    pub weekly: WeeklyActivity,
    pub trend: Vec<TotalTrendPoint>,
}

/// Full dashboard payload handed to the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub producer: String,
    pub version: String,
    pub today: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<NaiveDate>,
    pub days_logged: usize,
    pub habits: Vec<HabitStreaks>,
    pub balance: BalanceSummary,
    pub activity: ActivitySummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_score_serializes_no_data_as_null() {
        let json = serde_json::to_string(&vec![BalanceScore::Score(42.5), BalanceScore::NoData])
            .unwrap();
        assert_eq!(json, "[42.5,null]");

        let back: Vec<BalanceScore> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![BalanceScore::Score(42.5), BalanceScore::NoData]);
    }

    #[test]
    fn test_habit_kind_tagged_json() {
        let kind: HabitKind =
            serde_json::from_str(r#"{"type":"duration","threshold_minutes":20.0}"#).unwrap();
        assert_eq!(
            kind,
            HabitKind::Duration {
                threshold_minutes: 20.0
            }
        );
        let binary: HabitKind = serde_json::from_str(r#"{"type":"binary"}"#).unwrap();
        assert_eq!(binary, HabitKind::Binary);
    }

    #[test]
    fn test_row_missing_column_is_absent() {
        let row = LogbookRow::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert!(row.cell("Anki").is_absent());
    }

    #[test]
    fn test_balance_input_all_absent() {
        assert!(BalanceInput::from_values(&[None, None]).all_absent());
        assert!(!BalanceInput::from_values(&[None, Some(0.0)]).all_absent());
    }
}
