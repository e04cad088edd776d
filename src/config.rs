//! Tracker configuration
//!
//! Names the habits to track (and how each is classified), the activity
//! categories used for balance scoring, and how logbook dates are read.

use crate::error::ComputeError;
use crate::types::HabitKind;
use serde::{Deserialize, Serialize};

/// Minutes at or above which a duration habit counts as completed
pub const DEFAULT_DURATION_THRESHOLD_MINUTES: f64 = 20.0;

/// Default trend window for the balance view, in days
pub const DEFAULT_TREND_DAYS: i64 = 30;

/// Longest trend window accepted, about a century
pub const MAX_TREND_DAYS: i64 = 36_500;

/// Default moving-average window for trends, in scored days
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 7;

/// A tracked habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitConfig {
    /// Logbook column holding the habit's value
    pub name: String,
    pub kind: HabitKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl HabitConfig {
    pub fn binary(name: &str, emoji: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: HabitKind::Binary,
            emoji: Some(emoji.to_string()),
            active: true,
        }
    }

    pub fn duration(name: &str, emoji: &str, threshold_minutes: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: HabitKind::Duration { threshold_minutes },
            emoji: Some(emoji.to_string()),
            active: true,
        }
    }
}

fn default_active() -> bool {
    true
}

/// Configuration for loading a logbook and computing its metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Column holding the row date
    pub date_column: String,
    /// Accepted `chrono` date formats, tried in order
    pub date_formats: Vec<String>,
    pub habits: Vec<HabitConfig>,
    /// Activity columns that form the balance vector, in display order
    pub activities: Vec<String>,
    /// Turn absent values in today's row into explicit zeros
    pub fill_today_placeholder: bool,
    pub trend_days: i64,
    pub moving_average_window: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let threshold = DEFAULT_DURATION_THRESHOLD_MINUTES;
        Self {
            date_column: "Data".to_string(),
            date_formats: vec!["%d.%m.%Y".to_string(), "%Y-%m-%d".to_string()],
            habits: vec![
                HabitConfig::binary("Anki", "🧠"),
                HabitConfig::binary("Pamiętnik", "✒️"),
                HabitConfig::binary("YNAB", "💰"),
                HabitConfig::duration("YouTube", "🎥", threshold),
                HabitConfig::duration("Gitara", "🎸", threshold),
                HabitConfig::duration("Czytanie", "📚", threshold),
            ],
            activities: vec![
                "Inne".to_string(),
                "Tech + Praca".to_string(),
                "YouTube".to_string(),
                "Czytanie".to_string(),
                "Gitara".to_string(),
            ],
            fill_today_placeholder: false,
            trend_days: DEFAULT_TREND_DAYS,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
        }
    }
}

impl TrackerConfig {
    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: TrackerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Habits with `active = true`
    pub fn active_habits(&self) -> impl Iterator<Item = &HabitConfig> {
        self.habits.iter().filter(|h| h.active)
    }

    pub fn habit(&self, name: &str) -> Option<&HabitConfig> {
        self.habits.iter().find(|h| h.name == name)
    }

    /// Replace the threshold of every duration habit
    pub fn with_duration_threshold(mut self, threshold_minutes: f64) -> Self {
        for habit in &mut self.habits {
            if let HabitKind::Duration { .. } = habit.kind {
                habit.kind = HabitKind::Duration { threshold_minutes };
            }
        }
        self
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<(), ComputeError> {
        if self.date_column.trim().is_empty() {
            return Err(ComputeError::ConfigError("date_column is empty".to_string()));
        }
        if self.date_formats.is_empty() {
            return Err(ComputeError::ConfigError(
                "at least one date format is required".to_string(),
            ));
        }
        if self.activities.is_empty() {
            return Err(ComputeError::ConfigError(
                "at least one activity is required for balance scoring".to_string(),
            ));
        }
        if self.moving_average_window == 0 {
            return Err(ComputeError::ConfigError(
                "moving_average_window must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_TREND_DAYS).contains(&self.trend_days) {
            return Err(ComputeError::ConfigError(format!(
                "trend_days must be between 1 and {}, got {}",
                MAX_TREND_DAYS, self.trend_days
            )));
        }
        for habit in &self.habits {
            if let HabitKind::Duration { threshold_minutes } = habit.kind {
                if !threshold_minutes.is_finite() || threshold_minutes < 0.0 {
                    return Err(ComputeError::ConfigError(format!(
                        "habit '{}' has invalid threshold {}",
                        habit.name, threshold_minutes
                    )));
                }
            }
        }
        Ok(())
    }
}
