//! Date windows and trends
//!
//! Helpers the dashboard builds its views from:
//! - Date-range filtering over ascending rows
//! - Rolling means that skip missing values
//! - Daily balance trend with a moving average over scored days
//! - Week-over-week balance comparison
//! - Activity analytics over daily totals

use crate::balance::BalanceScorer;
use crate::error::ComputeError;
use crate::logbook::{Dated, Logbook};
use crate::normalizer::Normalizer;
use crate::types::{
    ActivityAverage, BalanceScore, BalanceTrendPoint, DayTotal, LogbookRow, PeriodActivity,
    TotalTrendPoint, WeekdayAverages, WeeklyActivity, WeeklyBalance,
};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::{BTreeMap, VecDeque};

/// Days in a dashboard week
pub const WEEK_DAYS: i64 = 7;

/// Weekday order used by the weekday breakdown
pub const WEEKDAY_ORDER: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// `date` moved back by `days`, or a config error when that leaves chrono's range
fn days_before(date: NaiveDate, days: i64) -> Result<NaiveDate, ComputeError> {
    if days < 0 {
        return Err(ComputeError::ConfigError(format!(
            "window length must not be negative, got {}",
            days
        )));
    }
    Duration::try_days(days)
        .and_then(|delta| date.checked_sub_signed(delta))
        .ok_or_else(|| {
            ComputeError::ConfigError(format!("{} days before {} is out of range", days, date))
        })
}

/// Rows in the half-open window `(end - delta_days, end]`, after shifting `end`
/// back by `offset_days`.
///
/// `items` must be ascending by date. Negative or out-of-range day counts are a
/// `ConfigError`.
pub fn filter_date_range<T: Dated>(
    items: &[T],
    end_date: NaiveDate,
    delta_days: i64,
    offset_days: i64,
) -> Result<&[T], ComputeError> {
    let end = days_before(end_date, offset_days)?;
    let start = days_before(end, delta_days)?;

    let lo = items.partition_point(|item| item.date() <= start);
    let hi = items.partition_point(|item| item.date() <= end);
    if lo >= hi {
        Ok(&[])
    } else {
        Ok(&items[lo..hi])
    }
}

/// Trailing mean over the last `window` entries, ignoring `None`.
///
/// A position yields `None` when fewer than `min_periods` values were present.
pub fn rolling_mean(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    let mut queue: VecDeque<Option<f64>> = VecDeque::with_capacity(window);
    let mut out = Vec::with_capacity(values.len());

    for value in values {
        queue.push_back(*value);
        while queue.len() > window {
            queue.pop_front();
        }

        let present: Vec<f64> = queue.iter().flatten().copied().collect();
        if present.is_empty() || present.len() < min_periods {
            out.push(None);
        } else {
            out.push(Some(present.iter().sum::<f64>() / present.len() as f64));
        }
    }
    out
}

/// Mean of the values present, `None` if there are none
fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Balance score for each row
pub fn daily_scores(rows: &[LogbookRow], activities: &[String]) -> Result<Vec<BalanceScore>, ComputeError> {
    rows.iter()
        .map(|row| {
            let input = Logbook::balance_input(row, activities)?;
            BalanceScorer::calculate_balance_score(&input)
        })
        .collect()
}

/// Daily balance trend over the last `days` days up to `today`.
///
/// Only days with a logbook row appear. No-data days stay in the trend but are
/// excluded from the moving average.
pub fn balance_trend(
    logbook: &Logbook,
    activities: &[String],
    today: NaiveDate,
    days: i64,
    moving_average_window: usize,
) -> Result<Vec<BalanceTrendPoint>, ComputeError> {
    let rows = filter_date_range(logbook.rows(), today, days, 0)?;
    let scores = daily_scores(rows, activities)?;

    let values: Vec<Option<f64>> = scores.iter().map(BalanceScore::value).collect();
    let averages = rolling_mean(&values, moving_average_window, 1);

    Ok(rows
        .iter()
        .zip(scores)
        .zip(averages)
        .map(|((row, score), moving_average)| BalanceTrendPoint {
            date: row.date,
            score,
            moving_average,
        })
        .collect())
}

/// Average daily balance of the last 7 days vs the 7 days before.
///
/// Only scored days count toward an average; a week without any averages 0.
pub fn weekly_balance(
    logbook: &Logbook,
    activities: &[String],
    today: NaiveDate,
) -> Result<WeeklyBalance, ComputeError> {
    let current = daily_scores(filter_date_range(logbook.rows(), today, WEEK_DAYS, 0)?, activities)?;
    let previous = daily_scores(
        filter_date_range(logbook.rows(), today, WEEK_DAYS, WEEK_DAYS)?,
        activities,
    )?;

    let current_scored: Vec<f64> = current.iter().filter_map(BalanceScore::value).collect();
    let previous_scored: Vec<f64> = previous.iter().filter_map(BalanceScore::value).collect();

    let current_week_average = mean(current_scored.iter().copied()).unwrap_or(0.0);
    let previous_week_average = mean(previous_scored.iter().copied()).unwrap_or(0.0);

    Ok(WeeklyBalance {
        current_week_average,
        previous_week_average,
        change: current_week_average - previous_week_average,
        current_week_scored_days: current_scored.len(),
        previous_week_scored_days: previous_scored.len(),
    })
}

/// Total minutes per activity over the given rows; absent counts as zero
pub fn activity_totals(
    rows: &[LogbookRow],
    activities: &[String],
) -> Result<BTreeMap<String, f64>, ComputeError> {
    let mut totals: BTreeMap<String, f64> =
        activities.iter().map(|a| (a.clone(), 0.0)).collect();

    for row in rows {
        for activity in activities {
            if let Some(minutes) = minutes_on(row, activity)? {
                *totals.entry(activity.clone()).or_insert(0.0) += minutes;
            }
        }
    }
    Ok(totals)
}

/// Minutes logged for one activity on one row, errors naming both
fn minutes_on(row: &LogbookRow, activity: &str) -> Result<Option<f64>, ComputeError> {
    Normalizer::minutes(row.cell(activity))
        .map_err(|e| ComputeError::OutOfDomain(format!("{} on {}: {}", activity, row.date, e)))
}

/// Total logged minutes per row, `None` for days where every activity is absent
pub fn daily_totals(rows: &[LogbookRow], activities: &[String]) -> Result<Vec<Option<f64>>, ComputeError> {
    rows.iter()
        .map(|row| {
            let mut total = None;
            for activity in activities {
                if let Some(minutes) = minutes_on(row, activity)? {
                    *total.get_or_insert(0.0) += minutes;
                }
            }
            Ok(total)
        })
        .collect()
}

/// Rows paired with their daily total, skipping days with nothing logged
fn logged_days(rows: &[LogbookRow], activities: &[String]) -> Result<Vec<DayTotal>, ComputeError> {
    Ok(rows
        .iter()
        .zip(daily_totals(rows, activities)?)
        .filter_map(|(row, total)| {
            total.map(|minutes| DayTotal {
                date: row.date,
                weekday: row.date.weekday().to_string(),
                minutes,
            })
        })
        .collect())
}

/// Mean daily total over days with anything logged
pub fn average_daily_total(rows: &[LogbookRow], activities: &[String]) -> Result<Option<f64>, ComputeError> {
    Ok(mean(daily_totals(rows, activities)?.into_iter().flatten()))
}

/// Sum of all logged minutes, in hours
pub fn total_hours(rows: &[LogbookRow], activities: &[String]) -> Result<f64, ComputeError> {
    let minutes: f64 = daily_totals(rows, activities)?.into_iter().flatten().sum();
    Ok(minutes / 60.0)
}

/// The `n` days with the highest total, largest first.
///
/// Ties keep date order, so the earlier day wins.
pub fn top_days(rows: &[LogbookRow], activities: &[String], n: usize) -> Result<Vec<DayTotal>, ComputeError> {
    let mut days = logged_days(rows, activities)?;
    days.sort_by(|a, b| b.minutes.total_cmp(&a.minutes));
    days.truncate(n);
    Ok(days)
}

/// Activity with the highest mean minutes over the days it was logged.
///
/// Ties go to the activity listed first; `None` when nothing was logged.
pub fn top_activity(rows: &[LogbookRow], activities: &[String]) -> Result<Option<ActivityAverage>, ComputeError> {
    let mut best: Option<ActivityAverage> = None;

    for activity in activities {
        let mut values = Vec::new();
        for row in rows {
            if let Some(minutes) = minutes_on(row, activity)? {
                values.push(minutes);
            }
        }
        let Some(average) = mean(values) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| average > b.average_minutes) {
            best = Some(ActivityAverage {
                activity: activity.clone(),
                average_minutes: average,
            });
        }
    }
    Ok(best)
}

/// Mean minutes per activity for each weekday, Monday first.
///
/// All seven weekdays are listed; a weekday without rows has no averages.
pub fn weekday_averages(rows: &[LogbookRow], activities: &[String]) -> Result<Vec<WeekdayAverages>, ComputeError> {
    let mut out = Vec::with_capacity(WEEKDAY_ORDER.len());

    for weekday in WEEKDAY_ORDER {
        let day_rows: Vec<&LogbookRow> = rows.iter().filter(|r| r.date.weekday() == weekday).collect();

        let mut averages = BTreeMap::new();
        for activity in activities {
            let mut values = Vec::new();
            for row in &day_rows {
                if let Some(minutes) = minutes_on(row, activity)? {
                    values.push(minutes);
                }
            }
            averages.insert(activity.clone(), mean(values));
        }

        out.push(WeekdayAverages {
            weekday: weekday.to_string(),
            days: day_rows.len(),
            averages,
        });
    }
    Ok(out)
}

/// Headline activity figures for one period
pub fn period_activity(rows: &[LogbookRow], activities: &[String]) -> Result<PeriodActivity, ComputeError> {
    let days = logged_days(rows, activities)?;
    let total_minutes: f64 = days.iter().map(|d| d.minutes).sum();

    Ok(PeriodActivity {
        average_daily_total: mean(days.iter().map(|d| d.minutes)),
        best_day: top_days(rows, activities, 1)?.into_iter().next(),
        total_hours: total_minutes / 60.0,
        logged_days: days.len(),
    })
}

/// Percentage change from `previous` to `current`; 0 when there is no baseline
fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Activity figures of the last 7 days vs the 7 days before, with percentage changes
pub fn weekly_activity(
    logbook: &Logbook,
    activities: &[String],
    today: NaiveDate,
) -> Result<WeeklyActivity, ComputeError> {
    let current = period_activity(filter_date_range(logbook.rows(), today, WEEK_DAYS, 0)?, activities)?;
    let previous = period_activity(
        filter_date_range(logbook.rows(), today, WEEK_DAYS, WEEK_DAYS)?,
        activities,
    )?;

    let best = |p: &PeriodActivity| p.best_day.as_ref().map_or(0.0, |d| d.minutes);

    Ok(WeeklyActivity {
        average_daily_total_change: percent_change(
            current.average_daily_total.unwrap_or(0.0),
            previous.average_daily_total.unwrap_or(0.0),
        ),
        best_day_change: percent_change(best(&current), best(&previous)),
        total_hours_change: percent_change(current.total_hours, previous.total_hours),
        current,
        previous,
    })
}

/// Daily total minutes over the last `days` days with a moving average.
///
/// Days with nothing logged stay in the trend and are skipped by the average.
pub fn total_time_trend(
    logbook: &Logbook,
    activities: &[String],
    today: NaiveDate,
    days: i64,
    moving_average_window: usize,
) -> Result<Vec<TotalTrendPoint>, ComputeError> {
    let rows = filter_date_range(logbook.rows(), today, days, 0)?;
    let totals = daily_totals(rows, activities)?;
    let averages = rolling_mean(&totals, moving_average_window, 1);

    Ok(rows
        .iter()
        .zip(totals)
        .zip(averages)
        .map(|((row, total_minutes), moving_average)| TotalTrendPoint {
            date: row.date,
            total_minutes,
            moving_average,
        })
        .collect())
}
