//! Logbook Metrics - Streak and time-balance metrics for a daily habit logbook
//!
//! A logbook records minutes spent on activities and completion of habits per
//! calendar day. This crate turns those rows into the figures a dashboard
//! renders: loading → NA normalization → habit classification → streaks and
//! balance scores → report.
//!
//! ## Modules
//!
//! - **Streaks**: current and longest streaks over a tri-state habit series
//! - **Balance**: 0-100 evenness score over per-activity minutes
//! - **Logbook**: row parsing, date handling, and series extraction
//! - **Window**: date windows, trends, and activity analytics

pub mod balance;
pub mod config;
pub mod error;
pub mod logbook;
pub mod normalizer;
pub mod pipeline;
pub mod streak;
pub mod types;
pub mod window;

pub use balance::BalanceScorer;
pub use config::{HabitConfig, TrackerConfig};
pub use error::ComputeError;
pub use logbook::{Logbook, LogbookLoader};
pub use pipeline::{logbook_to_dashboard, DashboardProcessor, RowFormat};
pub use streak::StreakEngine;
pub use types::{BalanceInput, BalanceScore, HabitKind, HabitSeries, HabitState};

/// Crate version embedded in every report
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "logbook-metrics";
