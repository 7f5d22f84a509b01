//! Pairwise interval-overlap scans over sessions and resource bookings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resource::{Resource, ResourceId};
use crate::session::{Session, SessionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    SessionOverlap {
        first: SessionId,
        second: SessionId,
    },
    ResourceDoubleBooked {
        resource_id: ResourceId,
        resource_name: String,
        first: SessionId,
        second: SessionId,
    },
}

impl Conflict {
    /// Stable identifier, e.g. `session:1:2` or `resource:3:1:2`.
    pub fn id(&self) -> String {
        match self {
            Conflict::SessionOverlap { first, second } => format!("session:{first}:{second}"),
            Conflict::ResourceDoubleBooked {
                resource_id,
                first,
                second,
                ..
            } => format!("resource:{resource_id}:{first}:{second}"),
        }
    }

    pub fn sessions(&self) -> (SessionId, SessionId) {
        match self {
            Conflict::SessionOverlap { first, second }
            | Conflict::ResourceDoubleBooked { first, second, .. } => (*first, *second),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::SessionOverlap { first, second } => {
                write!(f, "Time conflict between sessions {first} and {second}")
            }
            Conflict::ResourceDoubleBooked {
                resource_name,
                first,
                second,
                ..
            } => write!(
                f,
                "Resource '{resource_name}' double-booked for sessions {first} and {second}"
            ),
        }
    }
}

pub struct ConflictDetector<'a> {
    sessions: &'a [Session],
    resources: &'a [Resource],
}

impl<'a> ConflictDetector<'a> {
    pub fn new(sessions: &'a [Session], resources: &'a [Resource]) -> Self {
        Self {
            sessions,
            resources,
        }
    }

    /// Session overlaps first, then per-resource double bookings. A pair sharing
    /// a resource shows up in both passes.
    pub fn detect(&self) -> Vec<Conflict> {
        let mut conflicts = self.session_overlaps();
        conflicts.extend(self.resource_double_bookings());
        conflicts
    }

    pub fn session_overlaps(&self) -> Vec<Conflict> {
        overlapping_pairs(self.sessions.iter())
            .into_iter()
            .map(|(first, second)| Conflict::SessionOverlap { first, second })
            .collect()
    }

    pub fn resource_double_bookings(&self) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        for resource in self.resources {
            let bookings = self
                .sessions
                .iter()
                .filter(|s| s.resources.contains(&resource.id));
            for (first, second) in overlapping_pairs(bookings) {
                conflicts.push(Conflict::ResourceDoubleBooked {
                    resource_id: resource.id,
                    resource_name: resource.name.clone(),
                    first,
                    second,
                });
            }
        }
        conflicts
    }
}

fn overlapping_pairs<'s>(sessions: impl Iterator<Item = &'s Session>) -> Vec<(SessionId, SessionId)> {
    let sessions: Vec<&Session> = sessions.collect();
    let mut pairs = Vec::new();
    for (i, a) in sessions.iter().enumerate() {
        for b in &sessions[i + 1..] {
            if a.overlaps(b) {
                pairs.push((a.id, b.id));
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::NewResource;
    use crate::session::NewSession;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn shared_resource_is_reported_twice() {
        let room = NewResource::classroom("Room A101", 30, "Engineering Building").into_resource(1);
        let a = NewSession::study(1, at(9), at(11), "A101")
            .with_resource(1)
            .into_session(1);
        let b = NewSession::study(2, at(10), at(12), "A101")
            .with_resource(1)
            .into_session(2);
        let sessions = [a, b];
        let resources = [room];
        let conflicts = ConflictDetector::new(&sessions, &resources).detect();

        assert_eq!(conflicts.len(), 2);
        assert_eq!(
            conflicts[0].to_string(),
            "Time conflict between sessions 1 and 2"
        );
        assert_eq!(
            conflicts[1].to_string(),
            "Resource 'Room A101' double-booked for sessions 1 and 2"
        );
        assert_eq!(conflicts[1].id(), "resource:1:1:2");
    }

    #[test]
    fn three_way_overlap_yields_every_pair() {
        let sessions: Vec<Session> = (1..=3)
            .map(|id| NewSession::study(id, at(9), at(10), "Library").into_session(id))
            .collect();
        let conflicts = ConflictDetector::new(&sessions, &[]).detect();
        let pairs: Vec<_> = conflicts.iter().map(Conflict::sessions).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
    }
}
