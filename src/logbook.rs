//! Logbook loading
//!
//! Parses logbook rows (JSON array, NDJSON, or CSV with a header) into an
//! ascending, duplicate-free [`Logbook`], and extracts habit series and balance
//! inputs from it according to a [`TrackerConfig`].

use crate::config::{HabitConfig, TrackerConfig};
use crate::error::ComputeError;
use crate::normalizer::Normalizer;
use crate::types::{BalanceInput, Cell, DailyRecord, HabitSeries, LogbookRow};
use chrono::NaiveDate;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Read;

/// Anything that belongs to a calendar day
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for LogbookRow {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for DailyRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

/// Parser for raw logbook rows
pub struct LogbookLoader<'a> {
    config: &'a TrackerConfig,
}

impl<'a> LogbookLoader<'a> {
    pub fn new(config: &'a TrackerConfig) -> Self {
        Self { config }
    }

    /// Parse a JSON array of row objects
    pub fn parse_array(&self, json: &str) -> Result<Vec<LogbookRow>, ComputeError> {
        let objects: Vec<Map<String, Value>> = serde_json::from_str(json)?;
        objects
            .iter()
            .enumerate()
            .map(|(idx, obj)| {
                self.row_from_object(obj).map_err(|e| {
                    ComputeError::ParseError(format!("Failed to parse row {}: {}", idx + 1, e))
                })
            })
            .collect()
    }

    /// Parse NDJSON (one row object per line)
    pub fn parse_ndjson(&self, ndjson: &str) -> Result<Vec<LogbookRow>, ComputeError> {
        let mut rows = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let row = serde_json::from_str::<Map<String, Value>>(trimmed)
                .map_err(ComputeError::from)
                .and_then(|obj| self.row_from_object(&obj))
                .map_err(|e| {
                    ComputeError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    ))
                })?;
            rows.push(row);
        }
        Ok(rows)
    }

    /// Parse CSV with a header row
    pub fn parse_csv<R: Read>(&self, reader: R) -> Result<Vec<LogbookRow>, ComputeError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let date_idx = headers
            .iter()
            .position(|h| h == self.config.date_column)
            .ok_or_else(|| ComputeError::MissingField(self.config.date_column.clone()))?;

        let mut rows = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record?;
            let raw_date = record.get(date_idx).unwrap_or("").trim();

            // Trailing blank lines in exported sheets
            if raw_date.is_empty() && record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let date = self.parse_date(raw_date).map_err(|e| {
                ComputeError::ParseError(format!("Failed to parse row {}: {}", idx + 2, e))
            })?;

            let mut row = LogbookRow::new(date);
            for (col, field) in headers.iter().zip(record.iter()) {
                if col == self.config.date_column || col.is_empty() {
                    continue;
                }
                row.cells
                    .insert(col.to_string(), Normalizer::cell_from_str(field));
            }
            rows.push(row);
        }
        Ok(rows)
    }

    /// Parse a date using the configured formats in order
    pub fn parse_date(&self, raw: &str) -> Result<NaiveDate, ComputeError> {
        let trimmed = raw.trim();
        self.config
            .date_formats
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            .ok_or_else(|| {
                ComputeError::DateParseError(format!(
                    "'{}' does not match any of {:?}",
                    trimmed, self.config.date_formats
                ))
            })
    }

    fn row_from_object(&self, obj: &Map<String, Value>) -> Result<LogbookRow, ComputeError> {
        let date = match obj.get(&self.config.date_column) {
            Some(Value::String(s)) => self.parse_date(s)?,
            Some(other) => {
                return Err(ComputeError::DateParseError(format!(
                    "expected a date string, got {}",
                    other
                )))
            }
            None => return Err(ComputeError::MissingField(self.config.date_column.clone())),
        };

        let mut row = LogbookRow::new(date);
        for (col, value) in obj {
            if *col == self.config.date_column {
                continue;
            }
            row.cells.insert(col.clone(), Normalizer::cell_from_json(value));
        }
        Ok(row)
    }

    /// Every active habit and every activity must be a column of at least one row.
    ///
    /// Catches misspelled names in the configuration, which would otherwise read
    /// as a column that is never logged. An empty row set passes.
    pub fn check_columns(&self, rows: &[LogbookRow]) -> Result<(), ComputeError> {
        if rows.is_empty() {
            return Ok(());
        }

        let expected = self
            .config
            .active_habits()
            .map(|h| h.name.as_str())
            .chain(self.config.activities.iter().map(String::as_str));

        let missing: Vec<&str> = expected
            .filter(|column| !rows.iter().any(|row| row.cells.contains_key(*column)))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ComputeError::UnknownField(missing.join(", ")))
        }
    }

    /// Turn parsed rows into a logbook as of `today`.
    ///
    /// Rows dated after `today` are dropped, the rest are sorted ascending.
    /// Duplicate dates are rejected.
    pub fn prepare(
        &self,
        mut rows: Vec<LogbookRow>,
        today: NaiveDate,
    ) -> Result<Logbook, ComputeError> {
        let before = rows.len();
        rows.retain(|row| row.date <= today);
        if rows.len() < before {
            debug!(
                "dropped {} future-dated rows after {}",
                before - rows.len(),
                today
            );
        }

        rows.sort_by_key(|row| row.date);

        if self.config.fill_today_placeholder {
            if let Some(last) = rows.last_mut().filter(|row| row.date == today) {
                fill_placeholder(last, self.config);
            }
        }

        Logbook::from_rows(rows)
    }
}

/// Today's row may exist before anything was logged; treat its gaps as zeros
fn fill_placeholder(row: &mut LogbookRow, config: &TrackerConfig) {
    let columns = config
        .habits
        .iter()
        .map(|h| h.name.as_str())
        .chain(config.activities.iter().map(String::as_str));

    for column in columns {
        let cell = row
            .cells
            .entry(column.to_string())
            .or_insert(Cell::Absent);
        if cell.is_absent() {
            *cell = Cell::Number(0.0);
        }
    }
}

/// Validation problem for one row and column
#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    pub date: NaiveDate,
    pub column: String,
    pub message: String,
}

/// Ascending, duplicate-free logbook rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Logbook {
    rows: Vec<LogbookRow>,
}

impl Logbook {
    /// Wrap rows that must already be strictly ascending by date
    pub fn from_rows(rows: Vec<LogbookRow>) -> Result<Self, ComputeError> {
        for pair in rows.windows(2) {
            if pair[0].date == pair[1].date {
                return Err(ComputeError::DuplicateDate(pair[1].date.to_string()));
            }
            if pair[0].date > pair[1].date {
                return Err(ComputeError::UnsortedDates(pair[1].date.to_string()));
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[LogbookRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Tri-state series for one habit across every row
    pub fn habit_series(&self, habit: &HabitConfig) -> Result<HabitSeries, ComputeError> {
        Self::series_for(&self.rows, habit)
    }

    /// Tri-state series for one habit across the given rows
    pub fn series_for(rows: &[LogbookRow], habit: &HabitConfig) -> Result<HabitSeries, ComputeError> {
        rows.iter()
            .map(|row| {
                Normalizer::classify(row.cell(&habit.name), habit.kind).map_err(|e| {
                    ComputeError::OutOfDomain(format!("{} on {}: {}", habit.name, row.date, e))
                })
            })
            .collect()
    }

    /// Balance vector for one row across the given activities
    pub fn balance_input(row: &LogbookRow, activities: &[String]) -> Result<BalanceInput, ComputeError> {
        let pairs = activities
            .iter()
            .map(|name| {
                Normalizer::minutes(row.cell(name))
                    .map(|m| (name.clone(), m))
                    .map_err(|e| {
                        ComputeError::OutOfDomain(format!("{} on {}: {}", name, row.date, e))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BalanceInput::from_pairs(pairs))
    }

    /// Classify every row into a [`DailyRecord`]
    pub fn daily_records(&self, config: &TrackerConfig) -> Result<Vec<DailyRecord>, ComputeError> {
        self.rows
            .iter()
            .map(|row| {
                let activity_minutes = Self::balance_input(row, &config.activities)?
                    .dimensions
                    .into_iter()
                    .map(|d| (d.name, d.minutes))
                    .collect();

                let mut habit_completed = BTreeMap::new();
                for habit in config.active_habits() {
                    let state = Normalizer::classify(row.cell(&habit.name), habit.kind).map_err(|e| {
                        ComputeError::OutOfDomain(format!("{} on {}: {}", habit.name, row.date, e))
                    })?;
                    habit_completed.insert(habit.name.clone(), state);
                }

                Ok(DailyRecord {
                    date: row.date,
                    activity_minutes,
                    habit_completed,
                })
            })
            .collect()
    }

    /// Collect every cell that would fail classification, without stopping
    pub fn validate(&self, config: &TrackerConfig) -> Vec<RowIssue> {
        let mut issues = Vec::new();

        for row in &self.rows {
            for habit in config.active_habits() {
                if let Err(e) = Normalizer::classify(row.cell(&habit.name), habit.kind) {
                    issues.push(RowIssue {
                        date: row.date,
                        column: habit.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
            for activity in &config.activities {
                if let Err(e) = Normalizer::minutes(row.cell(activity)) {
                    issues.push(RowIssue {
                        date: row.date,
                        column: activity.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if !issues.is_empty() {
            warn!("{} logbook cells failed validation", issues.len());
        }
        issues
    }
}
