use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::member::MemberId;
use crate::resource::ResourceId;
use crate::task::TaskId;

pub type SessionId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "SCHEDULED",
            SessionStatus::InProgress => "IN_PROGRESS",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "SCHEDULED" => Ok(SessionStatus::Scheduled),
            "IN_PROGRESS" => Ok(SessionStatus::InProgress),
            "COMPLETED" => Ok(SessionStatus::Completed),
            "CANCELLED" | "CANCELED" => Ok(SessionStatus::Cancelled),
            other => Err(format!("unknown session status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionKind {
    Study {
        session_type: String,
        #[serde(default)]
        urgent: bool,
    },
}

impl SessionKind {
    pub fn is_urgent(&self) -> bool {
        match self {
            SessionKind::Study { urgent, .. } => *urgent,
        }
    }
}

impl Default for SessionKind {
    fn default() -> Self {
        SessionKind::Study {
            session_type: "STUDY".to_string(),
            urgent: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub task_id: TaskId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub kind: SessionKind,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub resources: BTreeSet<ResourceId>,
    #[serde(default)]
    pub members: BTreeSet<MemberId>,
}

impl NewSession {
    pub fn study(
        task_id: TaskId,
        start: NaiveDateTime,
        end: NaiveDateTime,
        location: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            start,
            end,
            location: location.into(),
            kind: SessionKind::default(),
            recurrence: None,
            resources: BTreeSet::new(),
            members: BTreeSet::new(),
        }
    }

    /// Session starting at `start` and lasting `hours` (fractions become minutes).
    /// Fails when the end time cannot be represented.
    pub fn study_for_hours(
        task_id: TaskId,
        start: NaiveDateTime,
        hours: f64,
        location: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let end = hours
            .is_finite()
            .then(|| (hours * 60.0) as i64)
            .and_then(Duration::try_minutes)
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| {
                ValidationError::new(
                    "session",
                    vec![format!("session duration out of range ({hours} hours)")],
                )
            })?;
        Ok(Self::study(task_id, start, end, location))
    }

    pub fn urgent(mut self) -> Self {
        if let SessionKind::Study { urgent, .. } = &mut self.kind {
            *urgent = true;
        }
        self
    }

    pub fn with_recurrence(mut self, label: impl Into<String>) -> Self {
        self.recurrence = Some(label.into());
        self
    }

    pub fn with_resource(mut self, resource: ResourceId) -> Self {
        self.resources.insert(resource);
        self
    }

    pub fn with_member(mut self, member: MemberId) -> Self {
        self.members.insert(member);
        self
    }

    pub(crate) fn into_session(self, id: SessionId) -> Session {
        Session {
            id,
            task_id: self.task_id,
            start: self.start,
            end: self.end,
            location: self.location,
            kind: self.kind,
            recurrence: self.recurrence,
            status: SessionStatus::Scheduled,
            resources: self.resources,
            members: self.members,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub task_id: TaskId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub location: String,
    pub kind: SessionKind,
    #[serde(default)]
    pub recurrence: Option<String>,
    pub status: SessionStatus,
    #[serde(default)]
    pub resources: BTreeSet<ResourceId>,
    #[serde(default)]
    pub members: BTreeSet<MemberId>,
}

impl Session {
    /// Half-open interval intersection: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Session) -> bool {
        self.overlaps_interval(other.start, other.end)
    }

    pub fn overlaps_interval(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && self.end > start
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} task {} {} -> {} @ {} ({})",
            self.id,
            self.task_id,
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%Y-%m-%d %H:%M"),
            self.location,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn fractional_hours_become_minutes() {
        let session = NewSession::study_for_hours(1, at(9, 0), 1.5, "Library")
            .unwrap()
            .into_session(1);
        assert_eq!(session.end, at(10, 30));
        assert_eq!(session.duration(), Duration::minutes(90));
    }

    #[test]
    fn unrepresentable_duration_is_an_error() {
        for hours in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN, 1e15] {
            let err = NewSession::study_for_hours(1, at(9, 0), hours, "Library").unwrap_err();
            assert_eq!(err.entity, "session");
            assert!(err.errors[0].starts_with("session duration out of range"));
        }
    }

    #[test]
    fn urgent_flag_is_serialized_with_the_kind() {
        let session = NewSession::study(1, at(9, 0), at(10, 0), "Library")
            .urgent()
            .into_session(1);
        assert!(session.kind.is_urgent());
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["kind"]["urgent"], true);

        let legacy = serde_json::json!({ "type": "study", "session_type": "STUDY" });
        let kind: SessionKind = serde_json::from_value(legacy).unwrap();
        assert!(!kind.is_urgent());
    }

    #[test]
    fn touching_sessions_do_not_overlap() {
        let a = NewSession::study(1, at(9, 0), at(10, 0), "A").into_session(1);
        let b = NewSession::study(1, at(10, 0), at(11, 0), "B").into_session(2);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps_interval(at(9, 59), at(12, 0)));
    }
}
