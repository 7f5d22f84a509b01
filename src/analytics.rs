//! Read-side aggregations over the planner's collections.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::revision::RevisionPlan;
use crate::session::{Session, SessionStatus};
use crate::task::{Difficulty, StudyTask, TaskId, TaskKind, TaskStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Percentage in `0.0..=100.0`.
    pub completion_rate: f64,
    pub difficulty_breakdown: BTreeMap<Difficulty, usize>,
    pub total_estimated_hours: f64,
    pub completed_hours: f64,
    pub total_sessions: usize,
    pub completed_sessions: usize,
}

impl ProgressReport {
    pub fn completion_rate_label(&self) -> String {
        format!("{:.1}%", self.completion_rate)
    }

    pub fn total_hours_label(&self) -> String {
        format_hours(self.total_estimated_hours)
    }

    pub fn completed_hours_label(&self) -> String {
        format_hours(self.completed_hours)
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Tasks: {}", self.total_tasks)?;
        writeln!(f, "Completed Tasks: {}", self.completed_tasks)?;
        writeln!(f, "Completion Rate: {}", self.completion_rate_label())?;
        writeln!(f, "Total Estimated Hours: {}", self.total_hours_label())?;
        writeln!(f, "Completed Hours: {}", self.completed_hours_label())?;
        writeln!(f, "Total Sessions: {}", self.total_sessions)?;
        write!(f, "Completed Sessions: {}", self.completed_sessions)?;
        for (difficulty, count) in &self.difficulty_breakdown {
            write!(f, "\n{difficulty}: {count} tasks")?;
        }
        Ok(())
    }
}

pub fn progress_report(tasks: &[StudyTask], sessions: &[Session]) -> ProgressReport {
    let total_tasks = tasks.len();
    let completed_tasks = tasks.iter().filter(|t| t.is_done()).count();
    let completion_rate = if total_tasks > 0 {
        completed_tasks as f64 / total_tasks as f64 * 100.0
    } else {
        0.0
    };

    let mut difficulty_breakdown = BTreeMap::new();
    for task in tasks {
        *difficulty_breakdown.entry(task.difficulty).or_insert(0) += 1;
    }

    ProgressReport {
        total_tasks,
        completed_tasks,
        completion_rate,
        difficulty_breakdown,
        total_estimated_hours: tasks.iter().map(|t| t.estimated_hours).sum(),
        completed_hours: tasks
            .iter()
            .filter(|t| t.is_done())
            .map(|t| t.estimated_hours)
            .sum(),
        total_sessions: sessions.len(),
        completed_sessions: sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .count(),
    }
}

/// `2.75` renders as `"2h 45m"`; both parts truncate.
pub fn format_hours(hours: f64) -> String {
    let h = hours.trunc() as i64;
    let m = ((hours - hours.trunc()) * 60.0) as i64;
    format!("{h}h {m}m")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub sessions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductivityHeatmap {
    /// Oldest first; the last entry is the reference day.
    pub days: Vec<HeatmapDay>,
    pub bar_width: usize,
}

impl ProductivityHeatmap {
    pub fn render_day(&self, day: &HeatmapDay) -> String {
        let filled = day.sessions.min(self.bar_width);
        format!(
            "{} |{}{}| {} sessions",
            day.date.format("%b %d"),
            "█".repeat(filled),
            " ".repeat(self.bar_width - filled),
            day.sessions
        )
    }

    pub fn render(&self) -> String {
        let mut out = format!("PRODUCTIVITY HEATMAP (Last {} Days)\n", self.days.len());
        out.push_str(&"=".repeat(50));
        out.push('\n');
        for day in &self.days {
            out.push_str(&self.render_day(day));
            out.push('\n');
        }
        out
    }

    pub fn total_sessions(&self) -> usize {
        self.days.iter().map(|d| d.sessions).sum()
    }
}

impl fmt::Display for ProductivityHeatmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Session counts per calendar day for the `days` days ending on `today`.
pub fn productivity_heatmap(
    sessions: &[Session],
    today: NaiveDate,
    days: u32,
    bar_width: usize,
) -> ProductivityHeatmap {
    let days = (0..days)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(i64::from(offset));
            let sessions = sessions
                .iter()
                .filter(|s| s.start.date() == date)
                .count();
            HeatmapDay { date, sessions }
        })
        .collect();
    ProductivityHeatmap { days, bar_width }
}

/// Tasks with a plan due on or before `date`, easiest first. Equal difficulties
/// keep insertion order.
pub fn due_revisions(
    tasks: &[StudyTask],
    plans: &[RevisionPlan],
    date: NaiveDate,
) -> Vec<StudyTask> {
    let mut due: Vec<StudyTask> = tasks
        .iter()
        .filter(|task| {
            plans
                .iter()
                .any(|plan| plan.task_id == task.id && plan.is_due_on(date))
        })
        .cloned()
        .collect();
    due.sort_by_key(|t| t.difficulty.level());
    due
}

pub fn status_breakdown(tasks: &[StudyTask]) -> BTreeMap<TaskStatus, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks {
        *counts.entry(task.status).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    StartMoreTasks { todo: usize, in_progress: usize },
    FocusOnChallenging { tasks: Vec<TaskId>, titles: Vec<String> },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::StartMoreTasks { .. } => {
                f.write_str("Consider starting more tasks to balance your workload")
            }
            Recommendation::FocusOnChallenging { titles, .. } => {
                write!(f, "Focus on these challenging tasks: {}", titles.join(", "))
            }
        }
    }
}

pub fn recommendations(tasks: &[StudyTask]) -> Vec<Recommendation> {
    let counts = status_breakdown(tasks);
    let todo = counts.get(&TaskStatus::Todo).copied().unwrap_or(0);
    let in_progress = counts.get(&TaskStatus::InProgress).copied().unwrap_or(0);

    let mut out = Vec::new();
    if todo > in_progress * 2 {
        out.push(Recommendation::StartMoreTasks { todo, in_progress });
    }

    let (ids, titles): (Vec<TaskId>, Vec<String>) = tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Todo)
        .filter(|t| matches!(t.difficulty, Difficulty::Hard | Difficulty::Expert))
        .map(|t| (t.id, t.title.clone()))
        .unzip();
    if !ids.is_empty() {
        out.push(Recommendation::FocusOnChallenging { tasks: ids, titles });
    }
    out
}

/// Assignments whose due date is strictly before `date`.
pub fn overdue_assignments(tasks: &[StudyTask], date: NaiveDate) -> Vec<StudyTask> {
    tasks
        .iter()
        .filter(|t| matches!(t.kind, TaskKind::Assignment { due_date, .. } if due_date < date))
        .cloned()
        .collect()
}

/// Case-insensitive substring match over title and description.
pub fn search_tasks(tasks: &[StudyTask], query: &str) -> Vec<StudyTask> {
    let needle = query.trim().to_lowercase();
    tasks
        .iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&needle)
                || t.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Splits on `,` or `;`, trims, drops empties.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split([',', ';'])
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::NewSession;
    use crate::task::NewTask;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn formats_fractional_hours() {
        assert_eq!(format_hours(2.75), "2h 45m");
        assert_eq!(format_hours(0.0), "0h 0m");
        assert_eq!(format_hours(12.0), "12h 0m");
    }

    #[test]
    fn parses_mixed_tag_separators() {
        assert_eq!(
            parse_tags(" exam; math,, calculus ;"),
            vec!["exam", "math", "calculus"]
        );
        assert!(parse_tags("   ").is_empty());
    }

    #[test]
    fn heatmap_caps_bar_and_keeps_window_order() {
        let day = d(2025, 3, 10).and_hms_opt(9, 0, 0).unwrap();
        let sessions: Vec<Session> = (1..=12)
            .map(|id| NewSession::study(1, day, day + Duration::hours(1), "Lib").into_session(id))
            .collect();
        let heatmap = productivity_heatmap(&sessions, d(2025, 3, 10), 7, 10);

        assert_eq!(heatmap.days.len(), 7);
        assert_eq!(heatmap.days[0].date, d(2025, 3, 4));
        assert_eq!(heatmap.days[6].sessions, 12);
        assert_eq!(
            heatmap.render_day(&heatmap.days[6]),
            format!("Mar 10 |{}| 12 sessions", "█".repeat(10))
        );
        assert_eq!(
            heatmap.render_day(&heatmap.days[0]),
            format!("Mar 04 |{}| 0 sessions", " ".repeat(10))
        );
    }

    #[test]
    fn recommends_starting_and_focus() {
        let tasks = vec![
            NewTask::topic("A", "", Difficulty::Hard, 1.0, "M").into_task(1),
            NewTask::topic("B", "", Difficulty::Easy, 1.0, "M").into_task(2),
            NewTask::topic("C", "", Difficulty::Expert, 1.0, "M")
                .with_status(TaskStatus::Done)
                .into_task(3),
        ];
        let recs = recommendations(&tasks);
        assert_eq!(recs.len(), 2);
        assert_eq!(
            recs[1],
            Recommendation::FocusOnChallenging {
                tasks: vec![1],
                titles: vec!["A".to_string()]
            }
        );
    }

    #[test]
    fn overdue_only_counts_past_due_assignments() {
        let tasks = vec![
            NewTask::assignment("Late", "", Difficulty::Easy, 1.0, d(2025, 1, 1)).into_task(1),
            NewTask::assignment("Today", "", Difficulty::Easy, 1.0, d(2025, 1, 5)).into_task(2),
            NewTask::topic("Topic", "", Difficulty::Easy, 1.0, "M").into_task(3),
        ];
        let overdue = overdue_assignments(&tasks, d(2025, 1, 5));
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, 1);
    }
}
