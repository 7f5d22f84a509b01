//! Spaced-repetition scheduling: interval strategies and per-task revision plans.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// Computes the next due date from the last revision date and the current stage.
pub trait RevisionAlgorithm: Send + Sync {
    fn next_date(&self, last_revision: NaiveDate, stage: u32) -> NaiveDate;

    fn name(&self) -> &'static str;
}

/// Leitner-style doubling: 1, 2, 4, 8, 16, then 32 days from stage 6 on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialBackoff;

impl ExponentialBackoff {
    const MAX_EXPONENT: u32 = 5;

    pub fn interval_days(stage: u32) -> i64 {
        let exponent = stage.saturating_sub(1).min(Self::MAX_EXPONENT);
        1_i64 << exponent
    }
}

impl RevisionAlgorithm for ExponentialBackoff {
    fn next_date(&self, last_revision: NaiveDate, stage: u32) -> NaiveDate {
        last_revision + Duration::days(Self::interval_days(stage))
    }

    fn name(&self) -> &'static str {
        "leitner"
    }
}

/// SuperMemo-style fixed table, capped at one year.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraduatedIntervals;

impl GraduatedIntervals {
    pub const INTERVALS: [i64; 8] = [1, 6, 16, 35, 62, 90, 180, 365];

    pub fn interval_days(stage: u32) -> i64 {
        let idx = (stage.saturating_sub(1) as usize).min(Self::INTERVALS.len() - 1);
        Self::INTERVALS[idx]
    }
}

impl RevisionAlgorithm for GraduatedIntervals {
    fn next_date(&self, last_revision: NaiveDate, stage: u32) -> NaiveDate {
        last_revision + Duration::days(Self::interval_days(stage))
    }

    fn name(&self) -> &'static str {
        "supermemo"
    }
}

/// Configuration-facing selector for the built-in algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStrategy {
    #[default]
    Leitner,
    Supermemo,
}

impl RevisionStrategy {
    pub fn algorithm(self) -> Box<dyn RevisionAlgorithm> {
        match self {
            RevisionStrategy::Leitner => Box::new(ExponentialBackoff),
            RevisionStrategy::Supermemo => Box::new(GraduatedIntervals),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RevisionStrategy::Leitner => "leitner",
            RevisionStrategy::Supermemo => "supermemo",
        }
    }
}

impl fmt::Display for RevisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevisionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leitner" | "exponential" | "1" => Ok(RevisionStrategy::Leitner),
            "supermemo" | "graduated" | "2" => Ok(RevisionStrategy::Supermemo),
            other => Err(format!("unknown revision algorithm '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionPlan {
    pub task_id: TaskId,
    pub stage: u32,
    pub next_due: NaiveDate,
    #[serde(default)]
    pub last_revision: Option<NaiveDate>,
    #[serde(default)]
    pub completed_revisions: u32,
}

impl RevisionPlan {
    pub fn new(task_id: TaskId, created: NaiveDate) -> Self {
        Self {
            task_id,
            stage: 1,
            next_due: created + Duration::days(1),
            last_revision: None,
            completed_revisions: 0,
        }
    }

    /// The interval is taken from the stage being completed, then the stage advances.
    pub fn mark_revised(&mut self, algorithm: &dyn RevisionAlgorithm, today: NaiveDate) {
        self.last_revision = Some(today);
        self.next_due = algorithm.next_date(today, self.stage);
        self.stage += 1;
        self.completed_revisions += 1;
    }

    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.next_due <= date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn exponential_backoff_caps_at_32_days() {
        let days: Vec<i64> = (1..=8).map(ExponentialBackoff::interval_days).collect();
        assert_eq!(days, vec![1, 2, 4, 8, 16, 32, 32, 32]);
        assert_eq!(ExponentialBackoff::interval_days(0), 1);
    }

    #[test]
    fn graduated_table_caps_at_a_year() {
        let days: Vec<i64> = (1..=10).map(GraduatedIntervals::interval_days).collect();
        assert_eq!(days, vec![1, 6, 16, 35, 62, 90, 180, 365, 365, 365]);
    }

    #[test]
    fn new_plan_is_due_the_day_after_creation() {
        let plan = RevisionPlan::new(1, d(2025, 1, 31));
        assert_eq!(plan.stage, 1);
        assert_eq!(plan.next_due, d(2025, 2, 1));
        assert!(!plan.is_due_on(d(2025, 1, 31)));
        assert!(plan.is_due_on(d(2025, 2, 1)));
    }

    #[test]
    fn mark_revised_uses_completed_stage_interval() {
        let mut plan = RevisionPlan::new(1, d(2025, 1, 1));
        plan.mark_revised(&GraduatedIntervals, d(2025, 1, 2));
        assert_eq!(plan.next_due, d(2025, 1, 3));
        plan.mark_revised(&GraduatedIntervals, d(2025, 1, 3));
        assert_eq!(plan.next_due, d(2025, 1, 9));
        assert_eq!(plan.stage, 3);
        assert_eq!(plan.completed_revisions, 2);
        assert_eq!(plan.last_revision, Some(d(2025, 1, 3)));
    }

    #[test]
    fn strategy_parses_menu_choices() {
        assert_eq!("2".parse::<RevisionStrategy>(), Ok(RevisionStrategy::Supermemo));
        assert_eq!(
            "Leitner".parse::<RevisionStrategy>().map(|s| s.algorithm().name()),
            Ok("leitner")
        );
    }
}
