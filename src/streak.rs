//! Streak computation
//!
//! Current and longest streaks over a tri-state habit series. Absent days are
//! skipped without breaking a streak; an explicit not-completed day breaks it.
//!
//! The series must end exactly at "today" (or omit today when no row exists yet).
//! A trailing not-completed entry is treated as today's unfinished placeholder and
//! skipped once before the backward scan. The engine never reads the clock.

use crate::types::{HabitState, StreakSummary};

/// Stateless streak calculator
pub struct StreakEngine;

impl StreakEngine {
    /// Count consecutive completed days ending at the most recent finalized day.
    pub fn current_streak(series: &[HabitState]) -> u32 {
        let mut remaining = series;

        if let Some((HabitState::NotCompleted, earlier)) = remaining.split_last() {
            remaining = earlier;
        }

        let mut streak = 0;
        for state in remaining.iter().rev() {
            match state {
                HabitState::Completed => streak += 1,
                HabitState::Absent => continue,
                HabitState::NotCompleted => break,
            }
        }
        streak
    }

    /// Longest run of completed days anywhere in the series.
    pub fn longest_streak(series: &[HabitState]) -> u32 {
        let mut current = 0;
        let mut best = 0;

        for state in series {
            match state {
                HabitState::Completed => {
                    current += 1;
                    best = best.max(current);
                }
                HabitState::NotCompleted => current = 0,
                HabitState::Absent => {}
            }
        }
        best
    }

    /// Both streaks plus the record-breaking flag
    pub fn summarize(series: &[HabitState]) -> StreakSummary {
        let current = Self::current_streak(series);
        let longest = Self::longest_streak(series);

        StreakSummary {
            current,
            longest,
            record_breaking: current > 0 && current >= longest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HabitState::{Absent as A, Completed as C, NotCompleted as N};

    #[test]
    fn test_empty_series() {
        assert_eq!(StreakEngine::current_streak(&[]), 0);
        assert_eq!(StreakEngine::longest_streak(&[]), 0);
    }

    #[test]
    fn test_all_absent() {
        let series = vec![A; 5];
        assert_eq!(StreakEngine::current_streak(&series), 0);
        assert_eq!(StreakEngine::longest_streak(&series), 0);
    }

    #[test]
    fn test_all_completed() {
        for k in 1..=6 {
            let series = vec![C; k];
            assert_eq!(StreakEngine::current_streak(&series), k as u32);
            assert_eq!(StreakEngine::longest_streak(&series), k as u32);
        }
    }

    #[test]
    fn test_absent_gap_does_not_break() {
        let series = [C, A, C];
        assert_eq!(StreakEngine::current_streak(&series), 2);
        assert_eq!(StreakEngine::longest_streak(&series), 2);
    }

    #[test]
    fn test_trailing_not_completed_skipped_once() {
        let series = [C, C, C, N];
        assert_eq!(StreakEngine::current_streak(&series), 3);

        // Only one trailing zero is forgiven
        let series = [C, C, C, N, N];
        assert_eq!(StreakEngine::current_streak(&series), 0);
    }

    #[test]
    fn test_trailing_absent_is_not_the_placeholder_skip() {
        // Absent is skipped by the general rule, and the zero before it still breaks
        let series = [C, C, N, A];
        assert_eq!(StreakEngine::current_streak(&series), 0);
    }

    #[test]
    fn test_non_trailing_not_completed_resets() {
        let series = [C, N, C];
        assert_eq!(StreakEngine::current_streak(&series), 1);
        assert_eq!(StreakEngine::longest_streak(&series), 1);
    }

    #[test]
    fn test_single_not_completed() {
        assert_eq!(StreakEngine::current_streak(&[N]), 0);
        assert_eq!(StreakEngine::longest_streak(&[N]), 0);
    }

    #[test]
    fn test_week_scenario() {
        let series = [C, C, A, C, N, C, C];
        assert_eq!(StreakEngine::current_streak(&series), 2);
        assert_eq!(StreakEngine::longest_streak(&series), 3);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let series = [C, A, N, C, C, A, N];
        let first = StreakEngine::summarize(&series);
        let second = StreakEngine::summarize(&series);
        assert_eq!(first, second);
        assert_eq!(first.current, 2);
        assert_eq!(first.longest, 2);
    }

    #[test]
    fn test_record_breaking_flag() {
        let summary = StreakEngine::summarize(&[C, N, C, C]);
        assert!(summary.record_breaking);

        let summary = StreakEngine::summarize(&[C, C, C, N, C]);
        assert!(!summary.record_breaking);

        let summary = StreakEngine::summarize(&[A, N]);
        assert!(!summary.record_breaking);
    }
}
